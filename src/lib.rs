//! # Carelink (healthcare directory client)
//!
//! `carelink` talks to the healthcare services directory backend: doctors,
//! pathology labs, ambulances, pharmacies and clinics, plus the administrative
//! back-office used by staff to manage listings, banners, blog posts, users and
//! access requests.
//!
//! ## Sign-in (`OTP`)
//!
//! Accounts sign in with a one-time code delivered out-of-band. The flow is a
//! short sequence of request/response steps:
//!
//! - **Identifier**: an email, username or phone number; the backend decides.
//! - **Send**: the backend (or the MSG91 widget, when configured) delivers a
//!   4-digit code. A 60 second countdown gates resending.
//! - **Verify**: the code is confirmed; login establishes a session, password
//!   recovery moves on to choosing a new password.
//! - **Dispatch**: the role returned by the backend picks the landing route.
//!
//! The session credential (token plus profile) is persisted under the `token`
//! and `user` keys and stays valid until the backend rejects it.

pub mod carelink;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
