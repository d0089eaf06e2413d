use thiserror::Error;

/// Errors surfaced by the resolution and settlement engine.
///
/// Unresolved names and low-confidence matches are not errors: they come back
/// as `None` or as a pending ingestion outcome. Missing settlement data is not
/// an error either, it settles as VOID.
#[derive(Error, Debug)]
pub enum CoreError {
    // Persistence / registry errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Timed out after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Record not found: {0}")]
    NotFound(String),

    // Payload errors
    #[error("Malformed payload {external_id}: {reason}")]
    MalformedPayload { external_id: String, reason: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn malformed(external_id: &str, reason: impl Into<String>) -> Self {
        CoreError::MalformedPayload {
            external_id: external_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether a retry of the same unit could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::Timeout { .. } => true,
            CoreError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message() {
        let err = CoreError::malformed("tip-1", "no team fields");
        assert_eq!(err.to_string(), "Malformed payload tip-1: no team fields");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        let err = CoreError::Timeout {
            operation: "live_matches_for_team".to_string(),
            timeout_ms: 5000,
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("live_matches_for_team"));
    }
}
