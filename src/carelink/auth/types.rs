//! Request and response payloads for the sign-in and recovery endpoints. These
//! carry one-time codes, passwords and session tokens, so they must never be
//! logged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Serialize)]
pub struct SendOtpRequest<'a> {
    pub identifier: &'a str,
}

#[derive(Clone, Serialize)]
pub struct VerifyOtpLoginRequest<'a> {
    pub identifier: &'a str,
    pub otp: &'a str,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordOtpRequest<'a> {
    pub identifier: &'a str,
    pub otp: &'a str,
    pub new_password: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProviderLoginRequest<'a> {
    pub identifier: &'a str,
}

/// Profile object returned alongside the token. The backend owns its shape, so
/// everything is kept and only a few fields are read.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Best label for greeting the user.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        ["name", "fullName", "username", "email", "phone"]
            .iter()
            .filter_map(|key| self.field(key))
            .find(|value| !value.trim().is_empty())
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Payload of a successful login: `data: { token, user }`.
#[derive(Clone, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user: UserProfile,
}

impl std::fmt::Debug for LoginData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginData")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}
