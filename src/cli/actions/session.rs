use crate::carelink::auth::{SessionContext, SessionStore};
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Execute the logout action.
/// # Errors
/// Returns an error if the session file cannot be removed.
pub fn logout(args: &Args) -> Result<()> {
    logout_to(args, &mut std::io::stdout())
}

/// Execute the whoami action.
/// # Errors
/// Returns an error if the session file cannot be read.
pub fn whoami(args: &Args) -> Result<()> {
    whoami_to(args, &mut std::io::stdout())
}

fn logout_to<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    let store = args.globals.session_store();
    let context = SessionContext::load(&store).unwrap_or_default();
    context
        .logout(&store)
        .context("failed to clear session")?;

    if context.is_authenticated() {
        info!("signed out");
        writeln!(out, "Signed out")?;
    } else {
        writeln!(out, "Not signed in")?;
    }
    Ok(())
}

fn whoami_to<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    let store = args.globals.session_store();
    let context = SessionContext::load(&store).context("failed to read session")?;

    let Some(session) = context.session() else {
        writeln!(out, "Not signed in")?;
        return Ok(());
    };

    let user = session.user();
    writeln!(out, "Signed in as {}", user.display_name().unwrap_or("unknown"))?;
    if let Some(role) = user.role() {
        writeln!(out, "Role: {role}")?;
    }
    for key in ["email", "phone", "username"] {
        if let Some(value) = user.field(key) {
            writeln!(out, "{}: {value}", capitalize(key))?;
        }
    }
    if let Some(route) = context.route() {
        writeln!(out, "Home: {route}")?;
    }
    Ok(())
}

/// Clears the stored session after the backend rejected its token.
///
/// # Errors
/// Returns an error if the session file cannot be removed.
pub fn expire<S: SessionStore + ?Sized>(store: &S) -> Result<()> {
    store.clear().context("failed to clear expired session")?;
    info!("session expired, stored credential removed");
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::carelink::auth::FileSessionStore;
    use std::{fs, path::Path};
    use tempfile::tempdir;

    fn args(path: &Path) -> Args {
        Args {
            globals: GlobalArgs::new(None, path.to_path_buf()),
        }
    }

    #[test]
    fn whoami_reports_anonymous() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        whoami_to(&args(&dir.path().join("session.json")), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Not signed in\n");
    }

    #[test]
    fn whoami_prints_profile() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(
            &path,
            r#"{ "token": "abc", "user": { "role": "admin", "name": "Asha", "email": "asha@example.com" } }"#,
        )
        .unwrap();

        let mut out = Vec::new();
        whoami_to(&args(&path), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Signed in as Asha"));
        assert!(out.contains("Role: admin"));
        assert!(out.contains("Email: asha@example.com"));
        assert!(out.contains("Home: /admin"));
        assert!(!out.contains("abc"));
    }

    #[test]
    fn logout_removes_session_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{ "token": "abc", "user": { "role": "user" } }"#).unwrap();

        let mut out = Vec::new();
        logout_to(&args(&path), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Signed out\n");
        assert!(!path.exists());

        let mut out = Vec::new();
        logout_to(&args(&path), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Not signed in\n");
    }

    #[test]
    fn logout_recovers_from_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ broken").unwrap();

        logout_to(&args(&path), &mut Vec::new()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn expire_clears_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{ "token": "abc", "user": { "role": "user" } }"#).unwrap();

        expire(&FileSessionStore::new(&path)).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn capitalize_words() {
        assert_eq!(capitalize("email"), "Email");
        assert_eq!(capitalize(""), "");
    }
}
