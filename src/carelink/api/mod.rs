//! HTTP plumbing for the directory backend with a single timeout policy and a
//! single response envelope. Feature clients build on `ApiClient` instead of
//! talking to `reqwest` directly, so error mapping and the unauthenticated
//! redirect rule live in one place.

pub mod envelope;
pub mod error;

pub use self::envelope::Envelope;
pub use self::error::ApiError;

use crate::APP_USER_AGENT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Default request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header that tells the backend client not to treat a 401 as "session expired".
pub const SKIP_UNAUTH_REDIRECT_HEADER: &str = "X-Skip-Unauth-Redirect";

/// Per-request options.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestOptions<'a> {
    pub bearer: Option<&'a str>,
    pub skip_unauth_redirect: bool,
}

impl<'a> RequestOptions<'a> {
    #[must_use]
    pub const fn authenticated(token: &'a str) -> Self {
        Self {
            bearer: Some(token),
            skip_unauth_redirect: false,
        }
    }

    #[must_use]
    pub const fn skip_unauth_redirect() -> Self {
        Self {
            bearer: None,
            skip_unauth_redirect: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for the given API base URL.
    ///
    /// # Errors
    /// Returns `ApiError::Url` if the base URL is not an absolute http(s) URL, or
    /// `ApiError::Network` if the HTTP client cannot be created.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url.trim()).map_err(|err| ApiError::Url(err.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(ApiError::Url(format!("unsupported scheme {scheme}"))),
        }

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins the base URL and a path without dropping base path segments.
    ///
    /// # Errors
    /// Returns `ApiError::Url` if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!("{}/{}", self.base_url, path.trim().trim_start_matches('/'));
        Url::parse(&joined).map_err(|err| ApiError::Url(err.to_string()))
    }

    /// POSTs a JSON body and returns the decoded envelope.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions<'_>,
    ) -> Result<Envelope, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.http.post(url).json(body), options).await
    }

    /// GETs a resource with query parameters.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        options: RequestOptions<'_>,
    ) -> Result<Envelope, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.http.get(url).query(query), options).await
    }

    /// Sends an arbitrary method with an optional JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: RequestOptions<'_>,
    ) -> Result<Envelope, ApiError> {
        let url = self.endpoint(path)?;
        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, options).await
    }

    /// Attaches auth headers, sends, and normalizes the response.
    ///
    /// # Errors
    /// Returns `ApiError::Unauthorized` on a 401 for an authenticated request
    /// (unless the redirect is skipped), `ApiError::Http` for any other non-2xx
    /// status, and transport errors for network, timeout or decode failures.
    #[instrument(skip(self, builder, options), fields(authenticated = options.bearer.is_some()))]
    async fn send(
        &self,
        mut builder: RequestBuilder,
        options: RequestOptions<'_>,
    ) -> Result<Envelope, ApiError> {
        if let Some(token) = options.bearer {
            builder = builder.bearer_auth(token);
        }
        if options.skip_unauth_redirect {
            builder = builder.header(SKIP_UNAUTH_REDIRECT_HEADER, "1");
        }

        let response = builder.send().await.map_err(|err| {
            warn!("request failed: {err}");
            ApiError::from(err)
        })?;

        handle_response(response, options).await
    }
}

async fn handle_response(
    response: Response,
    options: RequestOptions<'_>,
) -> Result<Envelope, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    debug!(status = status.as_u16(), "response received");

    let body: Option<Value> = if text.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str(&text).ok()
    };

    if status == StatusCode::UNAUTHORIZED
        && options.bearer.is_some()
        && !options.skip_unauth_redirect
    {
        return Err(ApiError::Unauthorized);
    }

    if !status.is_success() {
        let message = match &body {
            Some(value) => envelope::message_of(value),
            None => {
                warn!(
                    status = status.as_u16(),
                    body = envelope::sanitize_body(&text).as_deref().unwrap_or_default(),
                    "error response is not JSON"
                );
                None
            }
        };
        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
        });
    }

    body.map(Envelope::from_value)
        .ok_or_else(|| ApiError::Decode("response is not valid JSON".to_string()))
}
