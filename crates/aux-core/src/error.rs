//! Scheduler-wide base error type.
//!
//! Sub-crates define their own error enums and wrap `AuxError` as one
//! variant where they need to surface configuration problems.

use thiserror::Error;

/// The base error type for `aux-core` and a common variant for sub-crates.
#[derive(Debug, Error)]
pub enum AuxError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `aux-*` crates.
pub type AuxResult<T> = Result<T, AuxError>;
