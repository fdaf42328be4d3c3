//! Error taxonomy for the fetch, normalize, compare and persist pipeline.
//!
//! Every stage returns [`CompareError`]. The variants are deliberately narrow so
//! the caller can tell a topic that simply does not exist apart from an
//! upstream layout change, and both apart from a transient network failure.
//! [`CompareError::kind`] collapses the variants onto the coarse
//! [`ErrorKind`] buckets used for logging and HTTP status mapping.

use thiserror::Error;

/// Coarse classification of a [`CompareError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source has nothing for this topic. User-correctable.
    NotFound,
    /// Network or HTTP failure talking to a source or the generative service.
    UpstreamTransport,
    /// The scraped page no longer has the expected content container.
    StructuralMismatch,
    /// A required credential is missing.
    Configuration,
    /// A required field was empty.
    Validation,
    /// The local database failed.
    Storage,
    /// Another search or compare is still running.
    Busy,
}

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NoContent(String),

    #[error("Failed to fetch from {source_name}. Status: {status}")]
    UpstreamStatus { source_name: &'static str, status: u16 },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    StructuralMismatch(String),

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Gemini API request failed: {0}")]
    Service(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Database task failed: {0}")]
    StorageTask(#[from] tokio::task::JoinError),

    #[error("A search or comparison is already in progress")]
    Busy,
}

impl CompareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompareError::NotFound(_) | CompareError::NoContent(_) => ErrorKind::NotFound,
            CompareError::UpstreamStatus { .. }
            | CompareError::Transport(_)
            | CompareError::Service(_) => ErrorKind::UpstreamTransport,
            CompareError::StructuralMismatch(_) | CompareError::InvalidSelector(_) => {
                ErrorKind::StructuralMismatch
            }
            CompareError::Configuration(_) => ErrorKind::Configuration,
            CompareError::Validation(_) => ErrorKind::Validation,
            CompareError::Storage(_) | CompareError::StorageTask(_) => ErrorKind::Storage,
            CompareError::Busy => ErrorKind::Busy,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;
