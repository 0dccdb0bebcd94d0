//! Sign-in and password recovery flows.
//!
//! Each flow is a short sequence of steps driven by the caller:
//!
//! ```text
//! Identifier --send_code--> Code --verify--> Done              (login)
//! Identifier --send_code--> Code --verify_code--> NewPassword
//!                                    --set_password--> Done    (reset)
//! ```
//!
//! A failed step leaves the flow where it was. Every method takes `&mut self`,
//! so a flow can never have two requests in flight. The OTP transaction lives
//! only inside the flow value and is dropped on completion or `abandon`.

use super::{
    client::AuthClient,
    dispatcher::{self, Route},
    identifier::Identifier,
    otp::OtpCode,
    session::{SessionContext, SessionStore},
    throttle::ResendThrottle,
    widget::Msg91Widget,
    FlowError,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

pub const SEND_FAILED: &str = "Failed to send OTP";
pub const INVALID_OTP: &str = "Invalid OTP";
pub const LOGIN_FAILED: &str = "Login failed";
pub const RESET_FAILED: &str = "Failed to reset password";

/// Password submitted when a reset code is only being checked.
pub const PROBE_PASSWORD: &str = "__otp_probe__";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Identifier,
    Code,
    NewPassword,
    Done,
}

/// Where login codes come from.
#[derive(Clone, Debug)]
pub enum OtpChannel {
    /// First-party `send-login-otp` / `verify-otp-login` endpoints.
    Backend,
    /// MSG91 widget sends and verifies; the backend issues the session.
    Widget(Msg91Widget),
}

impl OtpChannel {
    #[must_use]
    pub fn from_widget(widget: Option<Msg91Widget>) -> Self {
        widget.map_or(Self::Backend, Self::Widget)
    }
}

/// How the reset flow checks a code before asking for the new password.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResetVerification {
    /// Validate the code format only; the backend checks it on commit.
    #[default]
    Deferred,
    /// Call `reset-password-otp` with [`PROBE_PASSWORD`] to check the code first.
    Probe,
}

/// The in-flight OTP transaction.
#[derive(Clone, Debug)]
struct OtpTransaction {
    identifier: Identifier,
    transaction_id: Option<String>,
}

#[derive(Debug)]
pub struct LoginFlow {
    auth: AuthClient,
    channel: OtpChannel,
    throttle: ResendThrottle,
    transaction: Option<OtpTransaction>,
    done: bool,
}

impl LoginFlow {
    #[must_use]
    pub fn new(auth: AuthClient, channel: OtpChannel) -> Self {
        Self::with_throttle(auth, channel, ResendThrottle::default())
    }

    #[must_use]
    pub fn with_throttle(auth: AuthClient, channel: OtpChannel, throttle: ResendThrottle) -> Self {
        Self {
            auth,
            channel,
            throttle,
            transaction: None,
            done: false,
        }
    }

    #[must_use]
    pub fn step(&self) -> Step {
        if self.done {
            Step::Done
        } else if self.transaction.is_some() {
            Step::Code
        } else {
            Step::Identifier
        }
    }

    #[must_use]
    pub const fn throttle(&self) -> &ResendThrottle {
        &self.throttle
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&Identifier> {
        self.transaction.as_ref().map(|tx| &tx.identifier)
    }

    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction.as_ref()?.transaction_id.as_deref()
    }

    /// Requests a login code for `raw_identifier` and moves to the code step.
    /// Once a code is pending this is only allowed after the countdown ends.
    ///
    /// # Errors
    /// `FlowError::Validation` for a blank identifier or `FlowError::Throttled`
    /// while a pending code's countdown runs (no request is sent in either
    /// case), or the mapped backend/provider failure.
    #[instrument(skip_all)]
    pub async fn send_code(&mut self, raw_identifier: &str) -> Result<(), FlowError> {
        if self.done {
            return Err(FlowError::WrongStep("Already signed in"));
        }
        if self.transaction.is_some() && !self.throttle.can_resend() {
            return Err(FlowError::Throttled(self.throttle.remaining()));
        }
        let identifier = Identifier::parse(raw_identifier)?;

        let transaction_id = match &self.channel {
            OtpChannel::Backend => {
                self.auth
                    .send_login_otp(&identifier)
                    .await
                    .map_err(|err| FlowError::from_api(&err, SEND_FAILED))?;
                None
            }
            OtpChannel::Widget(widget) => widget
                .send(&identifier)
                .await
                .map_err(|err| FlowError::from_api(&err, SEND_FAILED))?,
        };

        info!(kind = ?identifier.kind(), "login code sent");
        self.transaction = Some(OtpTransaction {
            identifier,
            transaction_id,
        });
        self.throttle.start();
        Ok(())
    }

    /// Re-sends the code once the countdown has finished.
    ///
    /// # Errors
    /// `FlowError::WrongStep` before a code was sent, `FlowError::Throttled`
    /// while the countdown runs (no request is sent), or the mapped failure.
    #[instrument(skip_all)]
    pub async fn resend(&mut self) -> Result<(), FlowError> {
        let Some(transaction) = self.transaction.as_mut() else {
            return Err(FlowError::WrongStep("Request a code first"));
        };
        if !self.throttle.can_resend() {
            return Err(FlowError::Throttled(self.throttle.remaining()));
        }

        match &self.channel {
            OtpChannel::Backend => {
                self.auth
                    .send_login_otp(&transaction.identifier)
                    .await
                    .map_err(|err| FlowError::from_api(&err, SEND_FAILED))?;
            }
            OtpChannel::Widget(widget) => {
                let retried = widget.retry(transaction.transaction_id.as_deref()).await;
                let req_id = match retried {
                    Ok(req_id) => req_id,
                    Err(err) => {
                        warn!("widget retry failed, sending a fresh code: {err}");
                        widget
                            .send(&transaction.identifier)
                            .await
                            .map_err(|err| FlowError::from_api(&err, SEND_FAILED))?
                    }
                };
                if req_id.is_some() {
                    transaction.transaction_id = req_id;
                }
            }
        }

        info!("login code re-sent");
        self.throttle.start();
        Ok(())
    }

    /// Verifies the code, persists the session and returns the landing route.
    ///
    /// # Errors
    /// `FlowError::Validation` unless the code has exactly four digits (no
    /// request is sent), `FlowError::InvalidRole` for an unknown role, or the
    /// mapped backend/provider failure. The flow stays at the code step.
    #[instrument(skip_all)]
    pub async fn verify<S: SessionStore + ?Sized>(
        &mut self,
        raw_code: &str,
        store: &S,
        context: &SessionContext,
    ) -> Result<(SessionContext, Route), FlowError> {
        let Some(transaction) = self.transaction.as_ref() else {
            return Err(FlowError::WrongStep("Request a code first"));
        };
        let code = OtpCode::parse(raw_code)?;

        let login = match &self.channel {
            OtpChannel::Backend => self
                .auth
                .verify_otp_login(&transaction.identifier, &code)
                .await
                .map_err(|err| FlowError::from_api(&err, INVALID_OTP))?,
            OtpChannel::Widget(widget) => {
                widget
                    .verify(transaction.transaction_id.as_deref(), &code)
                    .await
                    .map_err(|err| FlowError::from_api(&err, INVALID_OTP))?;
                self.auth
                    .login_msg91(&transaction.identifier)
                    .await
                    .map_err(|err| FlowError::from_api(&err, LOGIN_FAILED))?
            }
        };

        let outcome = dispatcher::dispatch(store, context, login)?;

        self.transaction = None;
        self.throttle.stop();
        self.done = true;
        Ok(outcome)
    }

    /// Drops the transaction and returns to the identifier step.
    pub fn abandon(&mut self) {
        self.transaction = None;
        self.throttle.stop();
        self.done = false;
    }
}

#[derive(Debug)]
pub struct ResetFlow {
    auth: AuthClient,
    verification: ResetVerification,
    throttle: ResendThrottle,
    transaction: Option<OtpTransaction>,
    code: Option<OtpCode>,
    done: bool,
}

impl ResetFlow {
    #[must_use]
    pub fn new(auth: AuthClient, verification: ResetVerification) -> Self {
        Self::with_throttle(auth, verification, ResendThrottle::default())
    }

    #[must_use]
    pub fn with_throttle(
        auth: AuthClient,
        verification: ResetVerification,
        throttle: ResendThrottle,
    ) -> Self {
        Self {
            auth,
            verification,
            throttle,
            transaction: None,
            code: None,
            done: false,
        }
    }

    #[must_use]
    pub fn step(&self) -> Step {
        if self.done {
            Step::Done
        } else if self.code.is_some() {
            Step::NewPassword
        } else if self.transaction.is_some() {
            Step::Code
        } else {
            Step::Identifier
        }
    }

    #[must_use]
    pub const fn throttle(&self) -> &ResendThrottle {
        &self.throttle
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&Identifier> {
        self.transaction.as_ref().map(|tx| &tx.identifier)
    }

    /// Requests a reset code and moves to the code step.
    ///
    /// # Errors
    /// `FlowError::Validation` for a blank identifier or `FlowError::Throttled`
    /// while a pending code's countdown runs (no request is sent in either
    /// case), or the mapped backend failure.
    #[instrument(skip_all)]
    pub async fn send_code(&mut self, raw_identifier: &str) -> Result<(), FlowError> {
        if self.done {
            return Err(FlowError::WrongStep("Password already reset"));
        }
        if self.transaction.is_some() && !self.throttle.can_resend() {
            return Err(FlowError::Throttled(self.throttle.remaining()));
        }
        let identifier = Identifier::parse(raw_identifier)?;

        self.auth
            .send_password_reset_otp(&identifier)
            .await
            .map_err(|err| FlowError::from_api(&err, SEND_FAILED))?;

        info!(kind = ?identifier.kind(), "reset code sent");
        self.transaction = Some(OtpTransaction {
            identifier,
            transaction_id: None,
        });
        self.code = None;
        self.throttle.start();
        Ok(())
    }

    /// Re-sends the reset code once the countdown has finished.
    ///
    /// # Errors
    /// `FlowError::WrongStep` before a code was sent, `FlowError::Throttled`
    /// while the countdown runs (no request is sent), or the mapped failure.
    #[instrument(skip_all)]
    pub async fn resend(&mut self) -> Result<(), FlowError> {
        let Some(transaction) = self.transaction.as_ref() else {
            return Err(FlowError::WrongStep("Request a code first"));
        };
        if !self.throttle.can_resend() {
            return Err(FlowError::Throttled(self.throttle.remaining()));
        }

        self.auth
            .send_password_reset_otp(&transaction.identifier)
            .await
            .map_err(|err| FlowError::from_api(&err, SEND_FAILED))?;

        info!("reset code re-sent");
        self.code = None;
        self.throttle.start();
        Ok(())
    }

    /// Accepts the code and moves to the new-password step.
    ///
    /// # Errors
    /// `FlowError::Validation` unless the code has exactly four digits, or, in
    /// probe mode, the mapped backend failure.
    #[instrument(skip_all)]
    pub async fn verify_code(&mut self, raw_code: &str) -> Result<(), FlowError> {
        let Some(transaction) = self.transaction.as_ref() else {
            return Err(FlowError::WrongStep("Request a code first"));
        };
        let code = OtpCode::parse(raw_code)?;

        if self.verification == ResetVerification::Probe {
            let probe = SecretString::from(PROBE_PASSWORD.to_string());
            self.auth
                .reset_password_otp(&transaction.identifier, &code, &probe)
                .await
                .map_err(|err| FlowError::from_api(&err, INVALID_OTP))?;
        }

        self.code = Some(code);
        Ok(())
    }

    /// Goes back to code entry, e.g. after the backend rejected the code on commit.
    pub fn back_to_code(&mut self) {
        self.code = None;
    }

    /// Commits the new password.
    ///
    /// # Errors
    /// `FlowError::Validation` for a blank or mismatched password (no request
    /// is sent), or the mapped backend failure. The flow stays at the
    /// new-password step.
    #[instrument(skip_all)]
    pub async fn set_password(
        &mut self,
        new_password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<(), FlowError> {
        let (Some(transaction), Some(code)) = (self.transaction.as_ref(), self.code.as_ref())
        else {
            return Err(FlowError::WrongStep("Verify the code first"));
        };

        if new_password.expose_secret().trim().is_empty() {
            return Err(FlowError::Validation(
                "Please enter a new password".to_string(),
            ));
        }
        if new_password.expose_secret() != confirmation.expose_secret() {
            return Err(FlowError::Validation("Passwords do not match".to_string()));
        }

        self.auth
            .reset_password_otp(&transaction.identifier, code, new_password)
            .await
            .map_err(|err| FlowError::from_api(&err, RESET_FAILED))?;

        info!("password reset");
        self.transaction = None;
        self.code = None;
        self.throttle.stop();
        self.done = true;
        Ok(())
    }

    /// Drops the transaction and returns to the identifier step.
    pub fn abandon(&mut self) {
        self.transaction = None;
        self.code = None;
        self.throttle.stop();
        self.done = false;
    }
}
