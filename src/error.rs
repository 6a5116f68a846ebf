//! Error types for the sync engine

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, SyncError>;

/// Sync engine error type
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Device offline")]
    Offline,

    #[error("{}", partial_sync_message(.push_ok, .pull_ok))]
    PartialSync { push_ok: bool, pull_ok: bool },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn partial_sync_message(push_ok: &bool, pull_ok: &bool) -> &'static str {
    match (*push_ok, *pull_ok) {
        (false, true) => "Push failed; pull succeeded",
        (true, false) => "Pull failed; push succeeded",
        (false, false) => "Push and pull failed",
        (true, true) => "Sync succeeded",
    }
}

/// Remote store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Collection unavailable: {0}")]
    CollectionUnavailable(String),

    #[error("Write rejected for {path}/{key}: {reason}")]
    WriteRejected {
        path: String,
        key: String,
        reason: String,
    },

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Record-level decoding failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("document '{0}' carries no usable local id")]
    MissingId(String),

    #[error("required field '{0}' is missing or empty")]
    MissingField(String),

    #[error("field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },
}

impl DecodeError {
    /// Incomplete documents are skipped; malformed ones count as errors
    pub fn is_skip(&self) -> bool {
        matches!(self, DecodeError::MissingId(_) | DecodeError::MissingField(_))
    }
}

impl From<sqlx::Error> for RemoteError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                RemoteError::ConnectionFailed(err.to_string())
            }
            other => RemoteError::Backend(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sync_message_names_failed_side() {
        let push_failed = SyncError::PartialSync {
            push_ok: false,
            pull_ok: true,
        };
        assert_eq!(push_failed.to_string(), "Push failed; pull succeeded");

        let pull_failed = SyncError::PartialSync {
            push_ok: true,
            pull_ok: false,
        };
        assert_eq!(pull_failed.to_string(), "Pull failed; push succeeded");

        let both = SyncError::PartialSync {
            push_ok: false,
            pull_ok: false,
        };
        assert_eq!(both.to_string(), "Push and pull failed");
    }

    #[test]
    fn test_pool_errors_map_to_connection_failures() {
        assert!(matches!(
            RemoteError::from(sqlx::Error::PoolClosed),
            RemoteError::ConnectionFailed(_)
        ));
        assert!(matches!(
            RemoteError::from(sqlx::Error::RowNotFound),
            RemoteError::Backend(_)
        ));
    }

    #[test]
    fn test_decode_error_classification() {
        assert!(DecodeError::MissingField("name".to_string()).is_skip());
        assert!(DecodeError::MissingId("abc".to_string()).is_skip());
        let mismatch = DecodeError::TypeMismatch {
            field: "routeId".to_string(),
            expected: "integer",
            found: "bool".to_string(),
        };
        assert!(!mismatch.is_skip());
        assert_eq!(
            mismatch.to_string(),
            "field 'routeId' expected integer, found bool"
        );
    }
}
