use std::{convert::Infallible, thread, time::Duration};

use log::{debug, info};

use crate::{
    button::Button,
    error::Error,
    events::{Event, EventSink},
    line::{Line, LineSource, Sample},
    rotary::Rotary,
};

#[derive(Debug, Copy, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub inverted: bool,
}

/// Samples the encoder lines at a fixed interval and forwards the decoded
/// events. Owns the line source, so dropping the poller releases it.
pub struct Poller<S, K> {
    source: S,
    sink: K,
    rotary: Rotary,
    button: Button,
    interval: Duration,
    ticks: u64,
}

impl<S, K> Poller<S, K>
where
    S: LineSource,
    K: EventSink,
{
    /// Seed the decoders from a first read of all lines
    pub fn start(mut source: S, sink: K, config: PollerConfig) -> Result<Self, Error> {
        let seed = sample(&mut source)?;
        info!(
            "Initial state CLK={:?} DT={:?} SW={:?}",
            seed.clk, seed.dt, seed.sw
        );

        Ok(Poller {
            source,
            sink,
            rotary: Rotary::new(seed.clk).inverted(config.inverted),
            button: Button::new(seed.sw),
            interval: config.interval,
            ticks: 0,
        })
    }

    /// Read all lines once and emit whatever they decode to.
    /// A failed read leaves the decoders untouched.
    pub fn tick(&mut self) -> Result<(), Error> {
        let sample = sample(&mut self.source)?;
        self.ticks += 1;

        let rotation = self.rotary.update(sample.encoder()).map(Event::from);
        let button = self.button.update(sample.sw).map(Event::from);

        for event in rotation.into_iter().chain(button) {
            debug!("{} at tick {}", event, self.ticks);
            self.sink
                .emit(event)
                .map_err(|source| Error::Emit { source })?;
        }
        Ok(())
    }

    /// Poll until something fails. There is no other way out.
    pub fn run(mut self) -> Result<Infallible, Error> {
        loop {
            if let Err(e) = self.tick() {
                info!("Stopped after {} ticks", self.ticks);
                return Err(e);
            }
            thread::sleep(self.interval);
        }
    }
}

fn sample<S: LineSource>(source: &mut S) -> Result<Sample, Error> {
    let mut read = |line: Line| {
        source
            .read(line)
            .map_err(|e| Error::Read { line, source: e })
    };
    Ok(Sample {
        clk: read(Line::Clk)?,
        dt: read(Line::Dt)?,
        sw: read(Line::Sw)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        button::ButtonEvent,
        line::LineState::{self, High, Low},
        rotary::Rotation,
    };
    use anyhow::{anyhow, Result};
    use std::{cell::Cell, rc::Rc};

    // Replays scripted samples and fails on the nth read (counting from 1)
    struct FakeLines {
        samples: Vec<Sample>,
        reads: usize,
        fail_on: Option<usize>,
        released: Rc<Cell<u32>>,
    }

    impl FakeLines {
        fn new(samples: &[(LineState, LineState, LineState)]) -> Self {
            FakeLines {
                samples: samples
                    .iter()
                    .map(|&(clk, dt, sw)| Sample { clk, dt, sw })
                    .collect(),
                reads: 0,
                fail_on: None,
                released: Rc::new(Cell::new(0)),
            }
        }

        fn failing_on(mut self, read: usize) -> Self {
            self.fail_on = Some(read);
            self
        }
    }

    impl LineSource for FakeLines {
        fn read(&mut self, line: Line) -> Result<LineState> {
            self.reads += 1;
            if self.fail_on == Some(self.reads) {
                return Err(anyhow!("line request released"));
            }
            let sample = self
                .samples
                .get((self.reads - 1) / 3)
                .ok_or_else(|| anyhow!("script exhausted"))?;
            Ok(match line {
                Line::Clk => sample.clk,
                Line::Dt => sample.dt,
                Line::Sw => sample.sw,
            })
        }
    }

    impl Drop for FakeLines {
        fn drop(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    // Hands events to a list the test keeps a handle on
    #[derive(Clone, Default)]
    struct SharedSink(Rc<std::cell::RefCell<Vec<Event>>>);

    impl EventSink for SharedSink {
        fn emit(&mut self, event: Event) -> Result<()> {
            self.0.borrow_mut().push(event);
            Ok(())
        }
    }

    const CONFIG: PollerConfig = PollerConfig {
        interval: Duration::from_millis(0),
        inverted: false,
    };

    fn run_script(samples: &[(LineState, LineState, LineState)]) -> (Vec<Event>, Error, u32) {
        let source = FakeLines::new(samples);
        let released = source.released.clone();
        let sink = SharedSink::default();
        let poller = Poller::start(source, sink.clone(), CONFIG).unwrap();
        let err = poller.run().unwrap_err();
        let events = sink.0.borrow().clone();
        (events, err, released.get())
    }

    #[test]
    fn seeds_then_decodes_each_tick() {
        let source = FakeLines::new(&[
            (High, High, High),
            (Low, High, High),
            (Low, High, Low),
            (High, Low, Low),
            (Low, Low, High),
        ]);
        let mut poller = Poller::start(source, Vec::new(), CONFIG).unwrap();
        for _ in 0..4 {
            poller.tick().unwrap();
        }
        assert_eq!(poller.ticks, 4);
        assert_eq!(
            poller.sink,
            vec![
                Event::Rotation(Rotation::Clockwise),
                Event::Button(ButtonEvent::Press),
                Event::Rotation(Rotation::CounterClockwise),
                Event::Button(ButtonEvent::Release),
            ]
        );
    }

    #[test]
    fn read_failure_stops_the_loop_and_releases_once() {
        // seed + 2 ticks, then the DT read of the 4th sample fails
        let source = FakeLines::new(&[
            (High, High, High),
            (Low, High, High),
            (High, High, Low),
            (Low, Low, Low),
        ])
        .failing_on(11);
        let released = source.released.clone();
        let sink = SharedSink::default();

        let poller = Poller::start(source, sink.clone(), CONFIG).unwrap();
        let err = poller.run().unwrap_err();

        match err {
            Error::Read { line, .. } => assert_eq!(line, Line::Dt),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(released.get(), 1);
        // Nothing from the failed tick, even though CLK was already read
        assert_eq!(
            *sink.0.borrow(),
            vec![
                Event::Rotation(Rotation::Clockwise),
                Event::Button(ButtonEvent::Press),
            ]
        );
    }

    #[test]
    fn failed_seed_read_releases_the_source() {
        let source = FakeLines::new(&[(High, High, High)]).failing_on(3);
        let released = source.released.clone();

        let err = Poller::start(source, Vec::new(), CONFIG).err().unwrap();
        match err {
            Error::Read { line, .. } => assert_eq!(line, Line::Sw),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn button_held_at_startup_is_not_a_press() {
        let (events, _, released) = run_script(&[
            (High, High, Low),
            (High, High, Low),
            (High, High, Low),
            (High, High, Low),
        ]);
        assert!(events.is_empty());
        assert_eq!(released, 1);
    }

    #[test]
    fn button_sequence() {
        let sw = [High, Low, Low, Low, High, Low];
        let samples: Vec<_> = sw.iter().map(|&sw| (High, High, sw)).collect();
        let (events, _, _) = run_script(&samples);
        assert_eq!(
            events,
            vec![
                Event::Button(ButtonEvent::Press),
                Event::Button(ButtonEvent::Release),
                Event::Button(ButtonEvent::Press),
            ]
        );
    }

    #[test]
    fn same_script_same_events() {
        let samples = [
            (High, High, High),
            (Low, High, High),
            (High, Low, Low),
            (Low, Low, Low),
            (Low, High, High),
            (High, High, High),
            (Low, High, Low),
        ];
        let (first, _, _) = run_script(&samples);
        let (second, _, _) = run_script(&samples);
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    struct ClosedSink;

    impl EventSink for ClosedSink {
        fn emit(&mut self, _: Event) -> Result<()> {
            Err(anyhow!("broken pipe"))
        }
    }

    #[test]
    fn sink_failure_is_fatal() {
        let source = FakeLines::new(&[(High, High, High), (Low, High, High)]);
        let released = source.released.clone();
        let poller = Poller::start(source, ClosedSink, CONFIG).unwrap();
        assert!(matches!(poller.run(), Err(Error::Emit { .. })));
        assert_eq!(released.get(), 1);
    }
}
