//! Error types for aux-save.

use aux_container::ContainerError;
use thiserror::Error;

/// Errors that can occur when reading or writing a save file.
///
/// Every decoding error is fatal for the whole load: nothing is restored
/// from a file that fails any check.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("not a scheduler save file (bad magic)")]
    BadMagic,

    #[error("save format version {found} is newer than supported version {supported}")]
    NewerVersion { found: u32, supported: u32 },

    #[error("save file corrupted: checksum {expected:#010X} in header, {computed:#010X} computed")]
    Checksum { expected: u32, computed: u32 },

    #[error("unexpected record tag {0}")]
    UnexpectedTag(u8),

    #[error("save data truncated at byte {0}")]
    Truncated(usize),

    #[error("{0} unread bytes after the last record")]
    TrailingBytes(usize),

    #[error("invalid {field} value {value}")]
    InvalidField { field: &'static str, value: i64 },

    #[error("broken delegate association: {0}")]
    BrokenAssociation(String),

    #[error("restore failed: {0}")]
    Container(#[from] ContainerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias for `Result<T, SaveError>`.
pub type SaveResult<T> = Result<T, SaveError>;
