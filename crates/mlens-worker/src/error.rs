//! Worker error types.

use thiserror::Error;

use mlens_media::MediaError;

use crate::transport::TransportError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Rejected request; the message is shown to the user as-is.
    #[error("{0}")]
    UserInput(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Request cancelled")]
    Cancelled,
}

impl WorkerError {
    pub fn user_input(msg: impl Into<String>) -> Self {
        Self::UserInput(msg.into())
    }

    /// Text shown to the user for this error.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether the request itself was at fault.
    pub fn is_user_input(&self) -> bool {
        match self {
            WorkerError::UserInput(_) => true,
            WorkerError::Media(e) => e.is_user_input(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled)
    }
}
