use anyhow::{Context, Result};
use config::{Backend, Config, Format};
use events::{EventSink, JsonSink, TextSink};
use gpio::SysfsLines;
use line::LineSource;
use log::info;
use poll::{Poller, PollerConfig};
use rpi::RppalLines;
use std::io;

mod button;
mod config;
mod error;
mod events;
mod gpio;
mod line;
mod poll;
mod rotary;
mod rpi;

fn main() -> Result<()> {
    // Logs go to stderr, stdout only carries events
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        "Reading encoder CLK={} DT={} SW={} every {:?} via {:?}",
        config.pins.clk, config.pins.dt, config.pins.sw, config.interval, config.backend
    );

    let sink: Box<dyn EventSink> = match config.format {
        Format::Text => Box::new(TextSink::new(io::stdout())),
        Format::Json => Box::new(JsonSink::new(io::stdout())),
    };

    match config.backend {
        Backend::Rppal => {
            let lines =
                RppalLines::open(&config.pins).context("could not request encoder lines")?;
            poll(lines, sink, &config)
        }
        Backend::Sysfs => {
            let lines = SysfsLines::open(&config.pins, config.external_pullup)
                .context("could not request encoder lines")?;
            poll(lines, sink, &config)
        }
    }
}

fn poll<S: LineSource>(lines: S, sink: Box<dyn EventSink>, config: &Config) -> Result<()> {
    let poller = Poller::start(
        lines,
        sink,
        PollerConfig {
            interval: config.interval,
            inverted: config.inverted,
        },
    )
    .context("could not read initial line state")?;

    // Lines are released before we get here, whatever went wrong
    match poller.run() {
        Ok(never) => match never {},
        Err(e) => Err(e).context("polling stopped"),
    }
}
