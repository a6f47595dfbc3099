//! Error types for collaborator clients.

use thiserror::Error;

/// Errors produced by the collaborator clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The collaborator could not be reached or answered with a server
    /// error. Transient; callers retry per their own policy.
    #[error("{service} unavailable: {reason}")]
    ServiceUnavailable {
        /// Which collaborator failed.
        service: &'static str,
        /// Short description of the failure.
        reason: String,
    },

    /// The collaborator rejected the call because the quota is exhausted.
    #[error("{service} rate limited")]
    RateLimited {
        /// Which collaborator rejected the call.
        service: &'static str,
    },

    /// The collaborator answered with a body the client cannot interpret.
    #[error("unexpected {service} response: {reason}")]
    InvalidResponse {
        /// Which collaborator answered.
        service: &'static str,
        /// What was wrong with the body.
        reason: String,
    },
}

impl ClientError {
    /// True for failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::ServiceUnavailable { .. } | ClientError::RateLimited { .. }
        )
    }

    /// Maps a non-success HTTP status to the matching error.
    pub(crate) fn from_status(service: &'static str, status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            ClientError::RateLimited { service }
        } else {
            ClientError::ServiceUnavailable {
                service,
                reason: format!("HTTP {status}"),
            }
        }
    }

    /// Maps a reqwest transport error (connect, timeout, TLS).
    pub(crate) fn from_request(service: &'static str, error: reqwest::Error) -> Self {
        ClientError::ServiceUnavailable {
            service,
            reason: error.to_string(),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ClientError::from_status("weather", reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert!(matches!(err, ClientError::RateLimited { service: "weather" }));

        let err = ClientError::from_status("weather", reqwest::StatusCode::BAD_GATEWAY);
        assert!(matches!(err, ClientError::ServiceUnavailable { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_invalid_response_is_not_transient() {
        let err = ClientError::InvalidResponse {
            service: "project",
            reason: "missing _embedded".to_string(),
        };
        assert!(!err.is_transient());
    }
}
