use super::FlowError;
use regex::Regex;
use std::fmt;

/// What an identifier looks like. Informational only, the backend decides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierKind {
    Email,
    Phone,
    Username,
}

/// A user-supplied account identifier: email, username or phone number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    /// Trims the input and rejects empty values.
    ///
    /// # Errors
    /// Returns `FlowError::Validation` when the identifier is blank.
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FlowError::Validation(
                "Please enter your email, username or phone number".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn kind(&self) -> IdentifierKind {
        if valid_email(&self.0) {
            IdentifierKind::Email
        } else if valid_phone(&self.0) {
            IdentifierKind::Phone
        } else {
            IdentifierKind::Username
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

pub fn valid_phone(phone: &str) -> bool {
    Regex::new(r"^\+?[0-9][0-9 -]{6,16}[0-9]$").map_or(false, |re| re.is_match(phone))
}
