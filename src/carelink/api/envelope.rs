//! Response envelope shared by every backend endpoint.
//!
//! The backend is loose about where it puts things: a list of blogs may come
//! back as `data.blogs`, `data.data.blogs`, `data` or a bare array, and the
//! status flag may be missing entirely on success. `Envelope` absorbs those
//! variations once so feature clients only ask for what they need.

use super::ApiError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Maximum number of error body characters surfaced to the user.
pub const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub success: bool,
    pub message: Option<String>,
    raw: Value,
}

impl Envelope {
    /// Wraps a decoded JSON body. A missing `success` flag counts as success.
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        let success = raw
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let message = message_of(&raw);

        Self {
            success,
            message,
            raw,
        }
    }

    /// Converts `success: false` into `ApiError::Rejected`.
    ///
    /// # Errors
    /// Returns `ApiError::Rejected` carrying the backend message when present.
    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.success {
            Ok(self)
        } else {
            Err(ApiError::Rejected(self.message))
        }
    }

    /// The `data` member, unwrapping one level of `data.data` nesting.
    #[must_use]
    pub fn data(&self) -> &Value {
        match self.raw.get("data") {
            Some(data) => match data.get("data") {
                Some(inner) if !inner.is_null() => inner,
                _ => data,
            },
            None => &self.raw,
        }
    }

    /// Decodes the payload into `T`.
    ///
    /// # Errors
    /// Returns `ApiError::Decode` when the payload does not match `T`.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.data().clone())
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Finds a list named `key` wherever the backend decided to put it.
    #[must_use]
    pub fn collection(&self, key: &str) -> Vec<Value> {
        let candidates = [
            self.raw.get("data").and_then(|data| data.get(key)),
            self.raw
                .get("data")
                .and_then(|data| data.get("data"))
                .and_then(|data| data.get(key)),
            self.raw
                .get("data")
                .and_then(|data| data.get("data"))
                .filter(|value| value.is_array()),
            self.raw.get("data").filter(|value| value.is_array()),
            self.raw.get(key),
            Some(&self.raw).filter(|value| value.is_array()),
        ];

        candidates
            .into_iter()
            .flatten()
            .find_map(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Extracts a human-readable message from an error or status body.
#[must_use]
pub fn message_of(body: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(|message| message.chars().take(MAX_ERROR_CHARS).collect())
}

/// Trims and truncates a raw error body for logging.
#[must_use]
pub fn sanitize_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_CHARS).collect())
    }
}
