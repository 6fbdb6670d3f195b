//! Typed failures surfaced to the presentation boundary.
//!
//! Every operation in the mapping engine returns [`MapperResult`]. The CLI
//! wraps these in `anyhow` with file context; a GUI or other front end can
//! match on the variants directly (for example to show [`MapperError::NoHistory`]
//! as an informational message rather than an error dialog).

use std::{collections::BTreeSet, fmt, path::PathBuf};

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type MapperResult<T> = std::result::Result<T, MapperError>;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Error reading '{file}': {source}")]
    UnreadableFile {
        file: String,
        #[source]
        source: BoxError,
    },
    #[error("No column mappings configured. Map at least one column before transferring.")]
    EmptyMapping,
    #[error("No mapping history found. Perform some data transfers first.")]
    NoHistory,
    #[error("{0}")]
    IncompatibleSession(IncompatibleSession),
    #[error("Could not save mapping history to {path:?}: {source}")]
    HistoryWrite {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("Failed to read mapping history from {path:?}: {source}")]
    HistoryRead {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("Failed to write output file {path:?}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("Unknown destination column '{0}'")]
    UnknownDestination(String),
    #[error("Unknown source column '{0}'")]
    UnknownSource(String),
    #[error("Load both source and destination files first")]
    TablesNotLoaded,
    #[error("Invalid configuration in {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl MapperError {
    pub(crate) fn unreadable(file: impl Into<String>, source: impl Into<BoxError>) -> Self {
        MapperError::UnreadableFile {
            file: file.into(),
            source: source.into(),
        }
    }

    /// True for conditions a front end should report as information, not failure.
    pub fn is_informational(&self) -> bool {
        matches!(self, MapperError::NoHistory)
    }
}

/// Columns a historical session references that the loaded tables no longer have.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncompatibleSession {
    pub missing_source: BTreeSet<String>,
    pub missing_destination: BTreeSet<String>,
}

impl IncompatibleSession {
    pub fn is_empty(&self) -> bool {
        self.missing_source.is_empty() && self.missing_destination.is_empty()
    }
}

impl fmt::Display for IncompatibleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot load this mapping configuration")?;
        if !self.missing_source.is_empty() {
            let names = self.missing_source.iter().cloned().collect::<Vec<_>>();
            write!(f, "; missing source columns: {}", names.join(", "))?;
        }
        if !self.missing_destination.is_empty() {
            let names = self.missing_destination.iter().cloned().collect::<Vec<_>>();
            write!(f, "; missing destination columns: {}", names.join(", "))?;
        }
        Ok(())
    }
}
