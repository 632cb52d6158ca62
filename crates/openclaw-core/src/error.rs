//! Error taxonomy shared by the storage, KG, memory, and nudge layers.
//!
//! Every fallible core operation returns [`Result<T>`]; the dispatcher is the
//! only layer that flattens an [`Error`] down to the wire-level
//! `{success:false, error:<string>}` shape.

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    EntityNotFound(String),

    #[error("{0}")]
    ConfigInvalid(String),

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn entity_not_found(msg: impl Into<String>) -> Self {
        Error::EntityNotFound(msg.into())
    }

    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Error::ConfigInvalid(msg.into())
    }
}
