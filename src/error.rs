//! Fatal failures of the reader. None of them are retried.

use std::{error, fmt};

use crate::line::Line;

#[derive(Debug)]
pub enum Error {
    /// The line source could not be opened or configured.
    Setup {
        what: String,
        source: anyhow::Error,
    },
    /// A line could not be read; nothing was decoded for that tick.
    Read { line: Line, source: anyhow::Error },
    /// The event sink refused an event.
    Emit { source: anyhow::Error },
}

impl Error {
    pub fn setup(what: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Error::Setup {
            what: what.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Setup { what, .. } => write!(f, "setup failed: {}", what),
            Error::Read { line, .. } => write!(f, "could not read {} line", line),
            Error::Emit { .. } => write!(f, "could not emit event"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        let source = match self {
            Error::Setup { source, .. } | Error::Read { source, .. } | Error::Emit { source } => {
                source
            }
        };
        Some(AsRef::<dyn error::Error + Send + Sync>::as_ref(source))
    }
}
