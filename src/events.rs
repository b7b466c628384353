use std::{fmt, io::Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{button::ButtonEvent, rotary::Rotation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Event {
    Rotation(Rotation),
    Button(ButtonEvent),
}

impl Event {
    /// Wire token understood by downstream consumers
    pub fn token(&self) -> &'static str {
        match self {
            Event::Rotation(Rotation::Clockwise) => "ROTARY_CW",
            Event::Rotation(Rotation::CounterClockwise) => "ROTARY_CCW",
            Event::Button(ButtonEvent::Press) => "BTN_PRESS",
            Event::Button(ButtonEvent::Release) => "BTN_RELEASE",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl From<Rotation> for Event {
    fn from(rotation: Rotation) -> Self {
        Event::Rotation(rotation)
    }
}

impl From<ButtonEvent> for Event {
    fn from(button: ButtonEvent) -> Self {
        Event::Button(button)
    }
}

/// Receiver of decoded events.
pub trait EventSink {
    fn emit(&mut self, event: Event) -> Result<()>;
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

/// One token per line, flushed right away so readers on the other end
/// of a pipe see every event as it happens.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> EventSink for TextSink<W> {
    fn emit(&mut self, event: Event) -> Result<()> {
        writeln!(self.out, "{}", event)?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EventRecord {
    timestamp: DateTime<Utc>,
    event: Event,
}

/// One JSON object per line with the time the event was decoded
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn emit(&mut self, event: Event) -> Result<()> {
        let record = EventRecord {
            timestamp: Utc::now(),
            event,
        };
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: Event) -> Result<()> {
        (**self).emit(event)
    }
}
