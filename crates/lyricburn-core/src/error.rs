//! Shared error taxonomy for the lyric-burn pipeline.
//!
//! Every crate in the workspace either returns this type directly or defines
//! a crate-local error that converts into it losslessly, so a caller never
//! has to match on more than one error shape.

use thiserror::Error;

/// The closed set of failure categories a request can surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("render failed")]
    RenderFailed { stderr_tail: String },

    #[error("timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl Error {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_color(reason: impl Into<String>) -> Self {
        Self::InvalidColor(reason.into())
    }

    pub fn render_failed(stderr_tail: impl Into<String>) -> Self {
        Self::RenderFailed {
            stderr_tail: stderr_tail.into(),
        }
    }

    /// Whether a client may usefully retry the same request unchanged.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout | Self::RenderFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
