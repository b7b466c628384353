//! Raspberry Pi GPIO via rppal. This is the only backend that can
//! program the pull-up the push-button needs.
//!
//! `open` only maps rppal errors to setup failures; claiming real pins
//! needs a Pi, so off-target tests can only see the failing side.
use anyhow::Result;
use log::debug;
use rppal::gpio::{Gpio, InputPin, Level};

use crate::{
    config::Pins,
    error::Error,
    line::{Line, LineSource, LineState},
};

/// CLK and DT as plain inputs, SW pulled up.
/// rppal puts the pins back in their previous mode when they are dropped.
pub struct RppalLines {
    clk: InputPin,
    dt: InputPin,
    sw: InputPin,
}

impl RppalLines {
    pub fn open(pins: &Pins) -> Result<RppalLines, Error> {
        let gpio = Gpio::new().map_err(|e| Error::setup("open GPIO peripheral", e))?;
        let claim = |pin: u8| {
            gpio.get(pin)
                .map_err(|e| Error::setup(format!("claim pin {}", pin), e))
        };

        let lines = RppalLines {
            clk: claim(pins.clk)?.into_input(),
            dt: claim(pins.dt)?.into_input(),
            sw: claim(pins.sw)?.into_input_pullup(),
        };
        debug!(
            "Claimed pins CLK={} DT={} SW={} (pull-up)",
            pins.clk, pins.dt, pins.sw
        );
        Ok(lines)
    }
}

impl From<Level> for LineState {
    fn from(level: Level) -> Self {
        match level {
            Level::High => LineState::High,
            Level::Low => LineState::Low,
        }
    }
}

impl LineSource for RppalLines {
    fn read(&mut self, line: Line) -> Result<LineState> {
        let pin = match line {
            Line::Clk => &self.clk,
            Line::Dt => &self.dt,
            Line::Sw => &self.sw,
        };
        Ok(pin.read().into())
    }
}
