//! Error types for the statistics and query engine.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The database file could not be opened.
    #[error("store unavailable at {}: {source}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    /// A numeric filter field did not parse as an integer.
    #[error("invalid value for {field}: {value:?} is not an integer")]
    InvalidFilterValue { field: &'static str, value: String },

    /// A snapshot mapping column failed to decode. Recovered by the
    /// snapshot resolver, never returned to callers.
    #[error("malformed snapshot field {field}: {source}")]
    MalformedSnapshot {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("feedback must not be empty")]
    EmptyFeedback,

    #[error("store query failed: {0}")]
    Store(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error was caused by caller input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidFilterValue { .. } | Error::EmptyFeedback
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let invalid = Error::InvalidFilterValue {
            field: "min_pages",
            value: "ten".to_string(),
        };
        assert!(invalid.is_client_error());
        assert!(Error::EmptyFeedback.is_client_error());
        assert!(!Error::Store(sqlx::Error::RowNotFound).is_client_error());
    }

    #[test]
    fn test_invalid_filter_message_names_field() {
        let err = Error::InvalidFilterValue {
            field: "max_pages",
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for max_pages: \"abc\" is not an integer"
        );
    }
}
