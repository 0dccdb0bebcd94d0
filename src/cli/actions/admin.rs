use crate::carelink::{
    admin::{AdminClient, AdminError, Decision, Resource},
    api::{ApiError, Envelope},
    auth::SessionContext,
};
use crate::cli::{
    actions::prompt::{Console, Terminal},
    actions::session::expire,
    globals::GlobalArgs,
};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::{fs, io::Write};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    List(Resource),
    Get(Resource, String),
    Create(Resource, Value),
    Update(Resource, String, Value),
    Delete {
        resource: Resource,
        id: String,
        confirmed: bool,
    },
    Decide(String, Decision),
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub operation: Operation,
}

/// Reads `--data`: inline JSON, or `@path` to read the JSON from a file.
///
/// # Errors
/// Returns an error if the file cannot be read or the JSON is invalid.
pub fn parse_data(raw: &str) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
        }
        None => raw.to_string(),
    };
    let value: Value = serde_json::from_str(&text).context("--data is not valid JSON")?;
    if !value.is_object() {
        bail!("--data must be a JSON object");
    }
    Ok(value)
}

/// Execute an admin operation with the stored session.
/// # Errors
/// Returns an error if the session is missing or not staff, the backend
/// refuses the request, or the session has expired (the stored session is
/// then removed).
pub async fn execute(args: Args) -> Result<()> {
    let admin = AdminClient::new(args.globals.api_client()?);
    let store = args.globals.session_store();
    let context = SessionContext::load(&store).context("failed to read session")?;
    debug!(operation = ?args.operation, "admin");

    let mut out = std::io::stdout();
    let result = match args.operation {
        Operation::List(resource) => admin.list(&context, resource).await.map(|records| {
            print_json(&mut out, &Value::Array(records))
        }),
        Operation::Get(resource, id) => admin
            .get(&context, resource, &id)
            .await
            .map(|record| print_json(&mut out, &record)),
        Operation::Create(resource, data) => admin
            .create(&context, resource, &data)
            .await
            .map(|envelope| print_outcome(&mut out, &envelope, "Created")),
        Operation::Update(resource, id, data) => admin
            .update(&context, resource, &id, &data)
            .await
            .map(|envelope| print_outcome(&mut out, &envelope, "Updated")),
        Operation::Delete {
            resource,
            id,
            confirmed,
        } => {
            if !confirmed {
                let mut console = Console;
                if !console.confirm(&format!("Delete {resource} {id}?"))? {
                    return console.say("Nothing deleted");
                }
            }
            admin
                .delete(&context, resource, &id)
                .await
                .map(|envelope| print_outcome(&mut out, &envelope, "Deleted"))
        }
        Operation::Decide(id, decision) => admin
            .decide_access_request(&context, &id, decision)
            .await
            .map(|envelope| match decision {
                Decision::Approved => print_outcome(&mut out, &envelope, "Approved"),
                Decision::Rejected => print_outcome(&mut out, &envelope, "Rejected"),
            }),
    };

    match result {
        Ok(printed) => printed,
        Err(AdminError::Api(ApiError::Unauthorized)) => {
            expire(&store)?;
            Err(anyhow!("Session expired, please sign in again"))
        }
        Err(err) => Err(anyhow!(user_message(&err))),
    }
}

fn user_message(err: &AdminError) -> String {
    match err {
        AdminError::Api(api) => api
            .server_message()
            .map_or_else(|| api.to_string(), str::to_string),
        other => other.to_string(),
    }
}

fn print_json<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn print_outcome<W: Write>(out: &mut W, envelope: &Envelope, fallback: &str) -> Result<()> {
    writeln!(out, "{}", envelope.message.as_deref().unwrap_or(fallback))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn data_inline_and_from_file() {
        assert_eq!(
            parse_data(r#"{"name":"Apollo"}"#).unwrap(),
            json!({ "name": "Apollo" })
        );

        let dir = tempdir().unwrap();
        let path = dir.path().join("banner.json");
        fs::write(&path, r#"{ "title": "Monsoon camp" }"#).unwrap();
        assert_eq!(
            parse_data(&format!("@{}", path.display())).unwrap(),
            json!({ "title": "Monsoon camp" })
        );
    }

    #[test]
    fn data_must_be_object() {
        assert!(parse_data("[1,2]").is_err());
        assert!(parse_data("{ nope").is_err());
        assert!(parse_data("@/definitely/missing.json").is_err());
    }

    #[test]
    fn messages_prefer_server_text() {
        let err = AdminError::Api(ApiError::Http {
            status: 409,
            message: Some("Banner already exists".to_string()),
        });
        assert_eq!(user_message(&err), "Banner already exists");
        assert_eq!(
            user_message(&AdminError::Forbidden),
            "Your account does not have access to the admin console"
        );
    }

    #[test]
    fn outcome_uses_backend_message() {
        let mut out = Vec::new();
        let envelope = Envelope::from_value(json!({ "success": true, "message": "Blog saved" }));
        print_outcome(&mut out, &envelope, "Created").unwrap();
        let envelope = Envelope::from_value(json!({ "success": true }));
        print_outcome(&mut out, &envelope, "Created").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Blog saved\nCreated\n");
    }
}
