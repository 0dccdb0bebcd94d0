use crate::carelink::api::ApiError;
use thiserror::Error;
use tracing::error;

/// Failures surfaced to the user by the sign-in and recovery flows.
///
/// The `Display` text is the message shown to the user; transport details are
/// logged, never displayed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Rejected locally, no request was sent.
    #[error("{0}")]
    Validation(String),
    /// The backend or provider refused the request.
    #[error("{0}")]
    Rejected(String),
    /// The request never produced a usable answer.
    #[error("{message}")]
    Transport { message: String, detail: String },
    #[error("Invalid user role")]
    InvalidRole(String),
    #[error("{0}")]
    WrongStep(&'static str),
    #[error("Please wait {0} seconds before requesting a new code")]
    Throttled(u64),
    #[error("Failed to store session: {0}")]
    Storage(String),
}

impl FlowError {
    /// Maps an API failure to a user-facing error, preferring the server message
    /// and otherwise using `fallback`.
    #[must_use]
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        if err.is_transport() {
            error!("{fallback}: {err}");
            return Self::Transport {
                message: fallback.to_string(),
                detail: err.to_string(),
            };
        }

        Self::Rejected(
            err.server_message()
                .map_or_else(|| fallback.to_string(), str::to_string),
        )
    }

    /// True when the user can simply try the same step again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::WrongStep(_) | Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_shown_verbatim() {
        let err = ApiError::Rejected(Some("Identifier not registered".to_string()));
        assert_eq!(
            FlowError::from_api(&err, "Failed to send OTP").to_string(),
            "Identifier not registered"
        );
    }

    #[test]
    fn fallback_used_without_message() {
        let err = ApiError::Http {
            status: 500,
            message: None,
        };
        assert_eq!(
            FlowError::from_api(&err, "Failed to send OTP"),
            FlowError::Rejected("Failed to send OTP".to_string())
        );
    }

    #[test]
    fn transport_errors_hide_details() {
        let err = ApiError::Network("connection refused".to_string());
        let flow = FlowError::from_api(&err, "Login failed");
        assert_eq!(flow.to_string(), "Login failed");
        assert!(matches!(flow, FlowError::Transport { ref detail, .. } if detail.contains("refused")));
    }

    #[test]
    fn invalid_role_message() {
        assert_eq!(
            FlowError::InvalidRole("patient".to_string()).to_string(),
            "Invalid user role"
        );
    }
}
