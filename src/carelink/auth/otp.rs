use super::FlowError;

/// Number of digits in a one-time code.
pub const OTP_LENGTH: usize = 4;

/// Keeps only ASCII digits and truncates to [`OTP_LENGTH`], the way the code
/// field behaves while the user types.
#[must_use]
pub fn sanitize_input(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(OTP_LENGTH)
        .collect()
}

/// A complete one-time code: exactly [`OTP_LENGTH`] digits.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Sanitizes the input and requires a complete code.
    ///
    /// # Errors
    /// Returns `FlowError::Validation` if fewer than [`OTP_LENGTH`] digits remain.
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        let digits = sanitize_input(raw);
        if digits.len() == OTP_LENGTH {
            Ok(Self(digits))
        } else {
            Err(FlowError::Validation(format!(
                "Please enter the {OTP_LENGTH}-digit code"
            )))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// codes are credentials
impl std::fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OtpCode(****)")
    }
}

/// Whether the verify action can be invoked for the current field value.
#[must_use]
pub fn can_verify(input: &str) -> bool {
    input.len() == OTP_LENGTH && input.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_non_digits() {
        assert_eq!(sanitize_input("1a2b"), "12");
        assert_eq!(sanitize_input("12-34"), "1234");
        assert_eq!(sanitize_input("abc"), "");
        assert_eq!(sanitize_input("١٢٣٤"), "");
    }

    #[test]
    fn sanitize_truncates() {
        assert_eq!(sanitize_input("123456"), "1234");
        assert_eq!(sanitize_input(" 9 8 7 6 5"), "9876");
    }

    #[test]
    fn parse_requires_four_digits() {
        assert!(OtpCode::parse("123").is_err());
        assert!(OtpCode::parse("").is_err());
        assert!(OtpCode::parse("12a").is_err());
        assert_eq!(OtpCode::parse("1234").map(|c| c.as_str().to_string()), Ok("1234".to_string()));
        assert_eq!(OtpCode::parse(" 0000 ").map(|c| c.as_str().to_string()), Ok("0000".to_string()));
    }

    #[test]
    fn verify_enabled_only_at_full_length() {
        assert!(!can_verify(""));
        assert!(!can_verify("123"));
        assert!(!can_verify("12345"));
        assert!(!can_verify("12a4"));
        assert!(can_verify("1234"));
    }

    #[test]
    fn debug_hides_code() {
        let code = OtpCode::parse("4321").unwrap();
        assert!(!format!("{code:?}").contains("4321"));
    }
}
