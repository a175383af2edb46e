use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("invalid delay code {0}")]
    InvalidDelay(i32),

    #[error("unknown horn pattern {0:?}")]
    InvalidHornPattern(String),

    #[error("unknown action kind {0:?}")]
    InvalidKind(String),

    #[error("reference parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ActionResult<T> = Result<T, ActionError>;
