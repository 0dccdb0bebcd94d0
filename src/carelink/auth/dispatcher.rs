//! Outcome dispatch: persist the credential, then pick a landing route by role.

use super::{
    session::{Session, SessionContext, SessionStore},
    types::LoginData,
    FlowError,
};
use secrecy::SecretString;
use std::{fmt, str::FromStr};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
    Superuser,
    Masteruser,
    Doctor,
    Clinic,
}

impl Role {
    /// Staff roles land on the admin console.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        !matches!(self, Self::User)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Superuser => "superuser",
            Self::Masteruser => "masteruser",
            Self::Doctor => "doctor",
            Self::Clinic => "clinic",
        }
    }
}

impl FromStr for Role {
    type Err = FlowError;

    fn from_str(role: &str) -> Result<Self, Self::Err> {
        match role {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "superuser" => Ok(Self::Superuser),
            "masteruser" => Ok(Self::Masteruser),
            "doctor" => Ok(Self::Doctor),
            "clinic" => Ok(Self::Clinic),
            other => Err(FlowError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Admin,
}

impl Route {
    /// # Errors
    /// Returns `FlowError::InvalidRole` for roles outside the known set.
    pub fn for_role(role: &str) -> Result<Self, FlowError> {
        let role: Role = role.parse()?;
        Ok(if role.is_staff() {
            Self::Admin
        } else {
            Self::Home
        })
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Admin => "/admin",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Completes a successful verification. The role is checked before anything
/// is written; an unknown role leaves storage untouched and yields no route.
///
/// # Errors
/// Returns `FlowError::InvalidRole` for unknown roles, `FlowError::Rejected`
/// when the backend returned no token, and `FlowError::Storage` when the
/// session cannot be persisted.
pub fn dispatch<S: SessionStore + ?Sized>(
    store: &S,
    context: &SessionContext,
    login: LoginData,
) -> Result<(SessionContext, Route), FlowError> {
    let role = login.user.role().unwrap_or_default();
    let route = Route::for_role(role).map_err(|err| {
        warn!(role, "login returned an unknown role");
        err
    })?;

    if login.token.trim().is_empty() {
        return Err(FlowError::Rejected("Login failed".to_string()));
    }

    let session = Session::new(SecretString::from(login.token), login.user);
    let context = context
        .login(store, session)
        .map_err(|err| FlowError::Storage(err.to_string()))?;

    info!(%route, "signed in");

    Ok((context, route))
}
