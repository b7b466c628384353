use std::fmt;

use anyhow::{bail, Result};

/// Logical level of a digital input line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineState {
    High,
    Low,
}

impl LineState {
    /// Convert a raw 0/1 value as reported by the kernel.
    /// Anything else is a failed read, not a level.
    pub fn from_raw(value: u8) -> Result<LineState> {
        match value {
            1 => Ok(LineState::High),
            0 => Ok(LineState::Low),
            other => bail!("unexpected line value {}", other),
        }
    }
}

/// The three lines of a rotary encoder with push-button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    Clk,
    Dt,
    Sw,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Line::Clk => "CLK",
            Line::Dt => "DT",
            Line::Sw => "SW",
        })
    }
}

/// Both encoder phases taken within the same poll tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderSample {
    pub clk: LineState,
    pub dt: LineState,
}

/// One poll tick's snapshot of all monitored lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub clk: LineState,
    pub dt: LineState,
    pub sw: LineState,
}

impl Sample {
    pub fn encoder(&self) -> EncoderSample {
        EncoderSample {
            clk: self.clk,
            dt: self.dt,
        }
    }
}

/// Synchronous access to the current value of the monitored lines.
///
/// Implementors release their hardware when dropped.
pub trait LineSource {
    fn read(&mut self, line: Line) -> Result<LineState>;
}
