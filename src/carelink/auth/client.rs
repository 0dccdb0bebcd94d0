//! Client wrappers for the first-party auth endpoints. Payloads carry codes and
//! passwords, so nothing here logs request bodies.

use super::{
    identifier::Identifier,
    otp::OtpCode,
    types::{
        LoginData, ProviderLoginRequest, ResetPasswordOtpRequest, SendOtpRequest,
        VerifyOtpLoginRequest,
    },
};
use crate::carelink::api::{ApiClient, ApiError, Envelope, RequestOptions};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

pub const SEND_LOGIN_OTP: &str = "/auth/send-login-otp";
pub const VERIFY_OTP_LOGIN: &str = "/auth/verify-otp-login";
pub const SEND_PASSWORD_RESET_OTP: &str = "/auth/send-password-reset-otp";
pub const RESET_PASSWORD_OTP: &str = "/auth/reset-password-otp";
pub const LOGIN_MSG91: &str = "/auth/login-msg91";

#[derive(Clone, Debug)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Asks the backend to deliver a login code.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or when the backend refuses.
    #[instrument(skip(self, identifier), fields(kind = ?identifier.kind()))]
    pub async fn send_login_otp(&self, identifier: &Identifier) -> Result<Envelope, ApiError> {
        let body = SendOtpRequest {
            identifier: identifier.as_str(),
        };
        self.api
            .post(SEND_LOGIN_OTP, &body, RequestOptions::default())
            .await?
            .into_result()
    }

    /// Confirms a login code and returns the session payload.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure, refusal, or a malformed payload.
    #[instrument(skip_all)]
    pub async fn verify_otp_login(
        &self,
        identifier: &Identifier,
        code: &OtpCode,
    ) -> Result<LoginData, ApiError> {
        let body = VerifyOtpLoginRequest {
            identifier: identifier.as_str(),
            otp: code.as_str(),
        };
        self.api
            .post(VERIFY_OTP_LOGIN, &body, RequestOptions::default())
            .await?
            .into_result()?
            .payload()
    }

    /// Asks the backend to deliver a password reset code.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or when the backend refuses.
    #[instrument(skip(self, identifier), fields(kind = ?identifier.kind()))]
    pub async fn send_password_reset_otp(
        &self,
        identifier: &Identifier,
    ) -> Result<Envelope, ApiError> {
        let body = SendOtpRequest {
            identifier: identifier.as_str(),
        };
        self.api
            .post(SEND_PASSWORD_RESET_OTP, &body, RequestOptions::default())
            .await?
            .into_result()
    }

    /// Submits a reset code together with a password.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or when the backend refuses.
    #[instrument(skip_all)]
    pub async fn reset_password_otp(
        &self,
        identifier: &Identifier,
        code: &OtpCode,
        new_password: &SecretString,
    ) -> Result<Envelope, ApiError> {
        let body = ResetPasswordOtpRequest {
            identifier: identifier.as_str(),
            otp: code.as_str(),
            new_password: new_password.expose_secret(),
        };
        self.api
            .post(RESET_PASSWORD_OTP, &body, RequestOptions::default())
            .await?
            .into_result()
    }

    /// Exchanges a provider-verified identifier for a session. The provider has
    /// already confirmed the code out-of-band, so a 401 here is a plain failure
    /// and must not be treated as an expired session.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure, refusal, or a malformed payload.
    #[instrument(skip(self, identifier), fields(kind = ?identifier.kind()))]
    pub async fn login_msg91(&self, identifier: &Identifier) -> Result<LoginData, ApiError> {
        let body = ProviderLoginRequest {
            identifier: identifier.as_str(),
        };
        self.api
            .post(LOGIN_MSG91, &body, RequestOptions::skip_unauth_redirect())
            .await?
            .into_result()?
            .payload()
    }
}
