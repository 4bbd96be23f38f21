//! Library-level errors for the operations that touch the outside world.
//!
//! The optimizer itself never fails; only reading sources and configuration
//! can.

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in '{}': {}", .path.display(), .source)]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{} error(s) in '{}'", .diagnostics.len(), .path.display())]
    Syntax {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
