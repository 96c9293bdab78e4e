//! Error taxonomy shared by every component of the analyzer

use thiserror::Error;

/// Errors surfaced by the player cache, deck registry, catalog and analysis engine.
///
/// Callers at the boundary map these onto status codes, so each failure keeps
/// its specific kind instead of collapsing into a generic error.
#[derive(Error, Debug)]
pub enum Error {
    /// The upstream provider does not know the resource, or no local record exists.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Timeout, connection failure, 429 or 5xx from the upstream provider.
    #[error("upstream provider unavailable: {reason}")]
    TransientProvider { reason: String },

    /// Upstream rejected the request for a reason retrying will not fix.
    #[error("upstream provider rejected request{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Provider { status: Option<u16>, message: String },

    #[error("deck must contain exactly {expected} cards, got {actual}")]
    InvalidDeckSize { expected: usize, actual: usize },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid player tag: {tag:?}")]
    InvalidTag { tag: String },

    #[error("invalid pagination: {message}")]
    InvalidPagination { message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        Self::TransientProvider {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Only transient upstream failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientProvider { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(Error::transient("timed out").is_retryable());
        assert!(!Error::not_found("player #ABC").is_retryable());
        assert!(
            !Error::Provider {
                status: Some(403),
                message: "forbidden".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn provider_message_includes_status_when_known() {
        let err = Error::Provider {
            status: Some(403),
            message: "invalid API key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upstream provider rejected request (403): invalid API key"
        );

        let err = Error::Provider {
            status: None,
            message: "bad body".to_string(),
        };
        assert_eq!(err.to_string(), "upstream provider rejected request: bad body");
    }
}
