use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};

/// BCM numbers of the encoder lines
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pins {
    pub clk: u8,
    pub dt: u8,
    pub sw: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Backend {
    Rppal,
    Sysfs,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rppal" => Ok(Backend::Rppal),
            "sysfs" => Ok(Backend::Sysfs),
            other => bail!("unknown backend {:?}, expected rppal or sysfs", other),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => bail!("unknown format {:?}, expected text or json", other),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub pins: Pins,
    pub interval: Duration,
    pub backend: Backend,
    pub format: Format,
    pub inverted: bool,
    /// SW is pulled up by the board, needed by backends that cannot bias it
    pub external_pullup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pins: Pins {
                clk: 23,
                dt: 17,
                sw: 27,
            },
            interval: Duration::from_millis(3),
            backend: Backend::Rppal,
            format: Format::Text,
            inverted: false,
            external_pullup: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let pins = Pins {
            clk: parse_or(get("ENCODER_CLK"), "ENCODER_CLK", defaults.pins.clk)?,
            dt: parse_or(get("ENCODER_DT"), "ENCODER_DT", defaults.pins.dt)?,
            sw: parse_or(get("ENCODER_SW"), "ENCODER_SW", defaults.pins.sw)?,
        };
        if pins.clk == pins.dt || pins.clk == pins.sw || pins.dt == pins.sw {
            bail!("encoder pins must be distinct, got {:?}", pins);
        }

        let interval_ms: u64 = parse_or(
            get("ENCODER_POLL_MS"),
            "ENCODER_POLL_MS",
            defaults.interval.as_millis() as u64,
        )?;
        if interval_ms == 0 {
            bail!("ENCODER_POLL_MS must be at least 1");
        }

        Ok(Config {
            pins,
            interval: Duration::from_millis(interval_ms),
            backend: parse_or(get("ENCODER_BACKEND"), "ENCODER_BACKEND", defaults.backend)?,
            format: parse_or(get("ENCODER_FORMAT"), "ENCODER_FORMAT", defaults.format)?,
            inverted: parse_or(get("ENCODER_INVERT"), "ENCODER_INVERT", defaults.inverted)?,
            external_pullup: parse_or(
                get("ENCODER_EXTERNAL_PULLUP"),
                "ENCODER_EXTERNAL_PULLUP",
                defaults.external_pullup,
            )?,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid {}={:?}", key, v)),
        None => Ok(default),
    }
}
