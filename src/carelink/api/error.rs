use thiserror::Error;

/// Outcome of a failed backend call, normalized once at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    Url(String),
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("request timed out, please try again")]
    Timeout,
    #[error("request failed ({status}): {}", .message.as_deref().unwrap_or("request failed"))]
    Http {
        status: u16,
        message: Option<String>,
    },
    /// The backend answered 2xx but with `success: false`.
    #[error("{}", .0.as_deref().unwrap_or("request rejected"))]
    Rejected(Option<String>),
    #[error("session expired, please sign in again")]
    Unauthorized,
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message supplied by the backend or provider, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } | Self::Rejected(message) => message.as_deref(),
            _ => None,
        }
    }

    /// True when the request never produced a usable answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Url(_) | Self::Network(_) | Self::Timeout | Self::Decode(_)
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
