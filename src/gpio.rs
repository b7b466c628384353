//! Read the encoder lines via the old deprecated sysfs GPIO interface.
//! This is a simple synchronous implementation that does not depend on
//! any GPIO library, so it works on any Linux board that still ships
//! `/sys/class/gpio`.
//!
//! sysfs has no way to set a pull-up; the SW line must be biased by the
//! board or the boot configuration (e.g. `gpio=27=ip,pu` on a Raspberry Pi),
//! and opening fails unless the caller says that is the case.
//!
//! Pins are only unexported when the lines are dropped. A process killed by a
//! signal leaves them exported; the next run finds them exported and reads
//! them as they are without touching their direction.
//!
//! Subset taken from: https://github.com/rust-embedded/rust-sysfs-gpio/
use anyhow::{anyhow, bail, Result};
use log::{debug, warn};
use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use crate::{
    config::Pins,
    error::Error,
    line::{Line, LineSource, LineState},
};

const SYSFS_ROOT: &str = "/sys/class/gpio";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pin {
    root: PathBuf,
    pin_num: u8,
}

impl Pin {
    /// Create a new Pin with the provided `pin_num` under `root`
    ///
    /// This function does not export the provided pin_num.
    pub fn new(root: &Path, pin_num: u8) -> Pin {
        Pin {
            root: root.to_path_buf(),
            pin_num,
        }
    }

    fn dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin_num))
    }

    pub fn is_exported(&self) -> bool {
        fs::metadata(self.dir()).is_ok()
    }

    /// Export the GPIO
    ///
    /// This is equivalent to `echo N > /sys/class/gpio/export` with
    /// the exception that the case where the GPIO is already exported
    /// is not an error.
    ///
    /// # Errors
    ///
    /// The main cases in which this function will fail and return an
    /// error are the following:
    /// 1. The system does not support the GPIO sysfs interface
    /// 2. The requested GPIO is out of range and cannot be exported
    /// 3. The requested GPIO is in use by the kernel and cannot
    ///    be exported by use in userspace
    pub fn export(&self) -> io::Result<()> {
        if !self.is_exported() {
            let mut export_file = File::create(self.root.join("export"))?;
            export_file.write_all(format!("{}", self.pin_num).as_bytes())?;
        }
        Ok(())
    }

    /// Unexport the GPIO
    ///
    /// This is equivalent to `echo N > /sys/class/gpio/unexport`.
    pub fn unexport(&self) -> io::Result<()> {
        if self.is_exported() {
            let mut unexport_file = File::create(self.root.join("unexport"))?;
            unexport_file.write_all(format!("{}", self.pin_num).as_bytes())?;
        }
        Ok(())
    }

    /// Configure this GPIO as an input
    pub fn set_input(&self) -> io::Result<()> {
        self.write_to_device_file("direction", "in")
    }

    /// Get the level of the Pin
    ///
    /// This may or may not match the signal level of the actual signal
    /// depending on the GPIO "active_low" entry.
    pub fn get_value(&self) -> Result<LineState> {
        let s = self.read_from_device_file("value")?;
        match s.trim().parse::<u8>() {
            Ok(value) => LineState::from_raw(value),
            Err(_) => bail!("value file contents {}", s.trim()),
        }
    }

    /// Write all of the provided contents to the specified devFile
    fn write_to_device_file(&self, dev_file_name: &str, value: &str) -> io::Result<()> {
        let mut dev_file = File::create(self.dir().join(dev_file_name))?;
        dev_file.write_all(value.as_bytes())?;
        Ok(())
    }

    fn read_from_device_file(&self, dev_file_name: &str) -> io::Result<String> {
        let mut dev_file = File::open(self.dir().join(dev_file_name))?;
        let mut s = String::new();
        dev_file.read_to_string(&mut s)?;
        Ok(s)
    }
}

/// The three encoder lines claimed through sysfs.
///
/// Pins exported by us are unexported again on drop.
pub struct SysfsLines {
    clk: Pin,
    dt: Pin,
    sw: Pin,
    exported: Vec<Pin>,
}

impl SysfsLines {
    /// `external_pullup` confirms that SW is pulled up outside of this process.
    pub fn open(pins: &Pins, external_pullup: bool) -> Result<SysfsLines, Error> {
        SysfsLines::open_at(Path::new(SYSFS_ROOT), pins, external_pullup)
    }

    fn open_at(root: &Path, pins: &Pins, external_pullup: bool) -> Result<SysfsLines, Error> {
        if !external_pullup {
            return Err(Error::setup(
                "pull-up bias on SW",
                anyhow!(
                    "sysfs cannot bias pin {}, set ENCODER_EXTERNAL_PULLUP=true if the board pulls it up",
                    pins.sw
                ),
            ));
        }

        let mut lines = SysfsLines {
            clk: Pin::new(root, pins.clk),
            dt: Pin::new(root, pins.dt),
            sw: Pin::new(root, pins.sw),
            exported: Vec::with_capacity(3),
        };

        // On failure `lines` drops here and gives back what was already exported.
        // Pins someone else exported keep their configuration.
        for pin in [lines.clk.clone(), lines.dt.clone(), lines.sw.clone()].iter() {
            if pin.is_exported() {
                debug!("Pin {} already exported, leaving it as is", pin.pin_num);
                continue;
            }
            pin.export()
                .map_err(|e| Error::setup(format!("export pin {}", pin.pin_num), e))?;
            lines.exported.push(pin.clone());
            pin.set_input()
                .map_err(|e| Error::setup(format!("set pin {} as input", pin.pin_num), e))?;
        }

        Ok(lines)
    }
}

impl LineSource for SysfsLines {
    fn read(&mut self, line: Line) -> Result<LineState> {
        match line {
            Line::Clk => self.clk.get_value(),
            Line::Dt => self.dt.get_value(),
            Line::Sw => self.sw.get_value(),
        }
    }
}

impl Drop for SysfsLines {
    fn drop(&mut self) {
        for pin in self.exported.drain(..) {
            match pin.unexport() {
                Ok(()) => debug!("Unexported pin {}", pin.pin_num),
                Err(e) => warn!("Could not unexport pin {}: {}", pin.pin_num, e),
            }
        }
    }
}
