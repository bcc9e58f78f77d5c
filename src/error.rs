// src/error.rs

//! Error types for rpmweave

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving, installing and composing a package
#[derive(Error, Debug)]
pub enum Error {
    /// The descriptor is incomplete or inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Something the surrounding build should have produced is missing
    #[error("Resolution error: {0}")]
    ResolutionError(String),

    /// Filesystem failure on a specific path
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external program exited unsuccessfully
    #[error("Command `{command}` failed with exit code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The descriptor could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a closure suitable for `map_err` that tags an I/O error with a path
    pub fn at(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
        move |source| Error::io(path, source)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}
