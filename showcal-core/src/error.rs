//! Error types for showcal.

use thiserror::Error;

/// Errors that can occur while fetching, mapping or storing events.
#[derive(Error, Debug)]
pub enum ShowcalError {
    #[error("Feed request failed: {0}")]
    Transport(String),

    #[error("Feed parse error: {0}")]
    FeedParse(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Event {event}: missing required field '{field}'")]
    MissingField { event: String, field: &'static str },

    #[error("Event {event}: invalid timestamp in '{field}': {value:?}")]
    InvalidTimestamp {
        event: String,
        field: &'static str,
        value: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShowcalError {
    /// True for errors that concern a single feed record rather than the whole run.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            ShowcalError::MissingField { .. } | ShowcalError::InvalidTimestamp { .. }
        )
    }
}

/// Result type alias for showcal operations.
pub type ShowcalResult<T> = Result<T, ShowcalError>;
