//! MSG91 OTP widget. When a widget id and token are configured, codes are
//! sent and verified by the provider and the backend only issues the session
//! (`/auth/login-msg91`). The provider correlates send, verify and retry with a
//! request id.

use super::{identifier::Identifier, otp::OtpCode};
use crate::carelink::api::{envelope::message_of, ApiClient, ApiError, RequestOptions};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_MSG91_URL: &str = "https://control.msg91.com/api/v5/widget";

/// Widget credentials. Both values must be present for the widget path.
#[derive(Clone, Debug)]
pub struct Msg91Config {
    pub base_url: String,
    pub widget_id: String,
    pub token_auth: SecretString,
}

impl Msg91Config {
    /// Builds a config when both the widget id and token are non-blank.
    #[must_use]
    pub fn from_parts(
        base_url: Option<String>,
        widget_id: Option<String>,
        token_auth: Option<SecretString>,
    ) -> Option<Self> {
        let widget_id = widget_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())?;
        let token_auth = token_auth.filter(|token| !token.expose_secret().trim().is_empty())?;
        let base_url = base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_MSG91_URL.to_string());

        Some(Self {
            base_url,
            widget_id,
            token_auth,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpBody<'a> {
    widget_id: &'a str,
    token_auth: &'a str,
    identifier: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpBody<'a> {
    widget_id: &'a str,
    token_auth: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    req_id: Option<&'a str>,
    otp: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetryOtpBody<'a> {
    widget_id: &'a str,
    token_auth: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    req_id: Option<&'a str>,
}

#[derive(Clone, Debug)]
pub struct Msg91Widget {
    api: ApiClient,
    config: Msg91Config,
}

impl Msg91Widget {
    /// # Errors
    /// Returns `ApiError::Url` if the widget base URL is invalid.
    pub fn new(config: Msg91Config, timeout: Duration) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.base_url, timeout)?;
        Ok(Self { api, config })
    }

    /// Sends a code and returns the provider request id, if one was issued.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or provider refusal.
    #[instrument(skip_all)]
    pub async fn send(&self, identifier: &Identifier) -> Result<Option<String>, ApiError> {
        let body = SendOtpBody {
            widget_id: &self.config.widget_id,
            token_auth: self.config.token_auth.expose_secret(),
            identifier: identifier.as_str(),
        };
        let response = self.call("/sendOtp", &body).await?;
        Ok(transaction_id(&response))
    }

    /// Confirms a code with the provider.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or provider refusal.
    #[instrument(skip_all)]
    pub async fn verify(&self, req_id: Option<&str>, code: &OtpCode) -> Result<(), ApiError> {
        let body = VerifyOtpBody {
            widget_id: &self.config.widget_id,
            token_auth: self.config.token_auth.expose_secret(),
            req_id,
            otp: code.as_str(),
        };
        self.call("/verifyOtp", &body).await.map(|_| ())
    }

    /// Re-delivers the code for an existing request id.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or provider refusal.
    #[instrument(skip_all)]
    pub async fn retry(&self, req_id: Option<&str>) -> Result<Option<String>, ApiError> {
        let body = RetryOtpBody {
            widget_id: &self.config.widget_id,
            token_auth: self.config.token_auth.expose_secret(),
            req_id,
        };
        let response = self.call("/retryOtp", &body).await?;
        Ok(transaction_id(&response))
    }

    async fn call<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let envelope = self
            .api
            .post(path, body, RequestOptions::default())
            .await?
            .into_result()?;
        let raw = envelope.raw().clone();

        if is_provider_error(&raw) {
            return Err(ApiError::Rejected(message_of(&raw)));
        }

        debug!(path, "widget call succeeded");
        Ok(raw)
    }
}

/// MSG91 signals failure with `type: "error"` on a 200.
fn is_provider_error(body: &Value) -> bool {
    body.get("type")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.eq_ignore_ascii_case("error"))
}

/// Pulls the provider request id out of whichever shape the response uses.
#[must_use]
pub fn transaction_id(body: &Value) -> Option<String> {
    const KEYS: [&str; 4] = ["reqId", "req_id", "requestId", "request_id"];

    let direct = KEYS
        .iter()
        .filter_map(|key| body.get(*key).or_else(|| body.get("data")?.get(*key)))
        .find_map(Value::as_str);

    let from_message = || {
        let succeeded = body
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|kind| kind.eq_ignore_ascii_case("success"));
        body.get("message")
            .and_then(Value::as_str)
            .filter(|message| succeeded && !message.contains(char::is_whitespace))
    };

    direct
        .or_else(from_message)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn widget(uri: &str) -> Msg91Widget {
        let config = Msg91Config::from_parts(
            Some(uri.to_string()),
            Some("widget-1".to_string()),
            Some(SecretString::from("token-1".to_string())),
        )
        .unwrap();
        Msg91Widget::new(config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn config_requires_both_values() {
        let token = || Some(SecretString::from("token".to_string()));
        assert!(Msg91Config::from_parts(None, Some("id".to_string()), token()).is_some());
        assert!(Msg91Config::from_parts(None, None, token()).is_none());
        assert!(Msg91Config::from_parts(None, Some("  ".to_string()), token()).is_none());
        assert!(Msg91Config::from_parts(None, Some("id".to_string()), None).is_none());
        assert!(Msg91Config::from_parts(
            None,
            Some("id".to_string()),
            Some(SecretString::from(" ".to_string()))
        )
        .is_none());
    }

    #[test]
    fn config_defaults_base_url() {
        let config = Msg91Config::from_parts(
            Some(String::new()),
            Some("id".to_string()),
            Some(SecretString::from("token".to_string())),
        )
        .unwrap();
        assert_eq!(config.base_url, DEFAULT_MSG91_URL);
    }

    #[test]
    fn transaction_id_shapes() {
        assert_eq!(
            transaction_id(&json!({ "reqId": "r-1" })),
            Some("r-1".to_string())
        );
        assert_eq!(
            transaction_id(&json!({ "data": { "request_id": "r-2" } })),
            Some("r-2".to_string())
        );
        assert_eq!(
            transaction_id(&json!({ "type": "success", "message": "3763646c3058" })),
            Some("3763646c3058".to_string())
        );
        assert_eq!(
            transaction_id(&json!({ "type": "success", "message": "OTP sent successfully" })),
            None
        );
        assert_eq!(
            transaction_id(&json!({ "type": "error", "message": "abc123" })),
            None
        );
        assert_eq!(transaction_id(&json!({})), None);
    }

    #[tokio::test]
    async fn send_returns_request_id() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sendOtp"))
            .and(body_json(json!({
                "widgetId": "widget-1",
                "tokenAuth": "token-1",
                "identifier": "919876543210"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "type": "success", "message": "req-77" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let identifier = Identifier::parse("919876543210").unwrap();
        let req_id = widget(&server.uri()).send(&identifier).await.unwrap();
        assert_eq!(req_id.as_deref(), Some("req-77"));
    }

    #[tokio::test]
    async fn verify_maps_provider_error() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verifyOtp"))
            .and(body_json(json!({
                "widgetId": "widget-1",
                "tokenAuth": "token-1",
                "reqId": "req-77",
                "otp": "1234"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "type": "error", "message": "OTP not match" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let code = OtpCode::parse("1234").unwrap();
        let result = widget(&server.uri()).verify(Some("req-77"), &code).await;
        assert_eq!(result, Err(ApiError::Rejected(Some("OTP not match".to_string()))));
    }

    #[tokio::test]
    async fn retry_omits_missing_request_id() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/retryOtp"))
            .and(body_json(json!({ "widgetId": "widget-1", "tokenAuth": "token-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "type": "success" })))
            .expect(1)
            .mount(&server)
            .await;

        let req_id = widget(&server.uri()).retry(None).await.unwrap();
        assert_eq!(req_id, None);
    }
}
