use aux_core::RefId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("unknown reference {0}")]
    UnknownReference(RefId),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid delegate association: {0}")]
    Association(String),
}

pub type ContainerResult<T> = Result<T, ContainerError>;
