use crate::carelink::auth::{
    client::AuthClient,
    otp::{can_verify, sanitize_input, OTP_LENGTH},
    FlowError, LoginFlow, OtpChannel, Route, SessionContext,
};
use crate::cli::{
    actions::prompt::{Console, Terminal},
    globals::GlobalArgs,
};
use anyhow::{bail, Context, Result};
use tracing::{debug, info};

pub const RESEND: &str = "r";
pub const CANCEL: &str = "q";

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub identifier: Option<String>,
}

/// Execute the login action.
/// # Errors
/// Returns an error if configuration is invalid, input is closed, or the
/// session cannot be stored.
pub async fn execute(args: Args) -> Result<()> {
    run(&args, &mut Console).await?;
    Ok(())
}

/// Drives the sign-in flow interactively and returns the landing route.
///
/// Step failures are shown and the same step is asked again; only
/// configuration, storage and input errors end the action.
///
/// # Errors
/// See [`execute`].
pub async fn run<T: Terminal>(args: &Args, prompt: &mut T) -> Result<Route> {
    let globals = &args.globals;
    let auth = AuthClient::new(globals.api_client()?);
    let channel = OtpChannel::from_widget(globals.widget()?);
    debug!(?globals, widget = matches!(channel, OtpChannel::Widget(_)), "login");

    let store = globals.session_store();
    let context = SessionContext::load(&store).context("failed to read session")?;
    if let Some(session) = context.session() {
        prompt.say(format!(
            "Currently signed in as {}; signing in again replaces that session.",
            session.user().display_name().unwrap_or("unknown")
        ))?;
    }

    let mut flow = LoginFlow::new(auth, channel);

    let mut preset = args.identifier.clone();
    loop {
        let raw = match preset.take() {
            Some(identifier) => identifier,
            None => prompt.ask("Email, username or phone")?,
        };
        match flow.send_code(&raw).await {
            Ok(()) => break,
            Err(err) => report(prompt, &err)?,
        }
    }

    if let Some(identifier) = flow.identifier() {
        prompt.say(format!("Code sent to {identifier}"))?;
    }

    loop {
        let input = prompt.ask(&format!(
            "Enter the {OTP_LENGTH}-digit code ({RESEND} to resend, {CANCEL} to cancel)"
        ))?;

        match input.to_lowercase().as_str() {
            CANCEL => {
                flow.abandon();
                bail!("login cancelled");
            }
            RESEND => match flow.resend().await {
                Ok(()) => prompt.say("A new code was sent")?,
                Err(err) => report(prompt, &err)?,
            },
            _ => {
                let code = sanitize_input(&input);
                if !can_verify(&code) {
                    prompt.say(format!("Enter all {OTP_LENGTH} digits of the code"))?;
                    continue;
                }
                match flow.verify(&code, &store, &context).await {
                    Ok((context, route)) => {
                        let name = context
                            .session()
                            .and_then(|session| session.user().display_name())
                            .unwrap_or("there");
                        prompt.say(format!("Welcome, {name}! Continue at {route}"))?;
                        info!(%route, "login complete");
                        return Ok(route);
                    }
                    Err(err) => report(prompt, &err)?,
                }
            }
        }
    }
}

/// Shows a step failure, ending the action when the flow cannot continue.
pub(super) fn report<T: Terminal>(prompt: &mut T, err: &FlowError) -> Result<()> {
    if err.is_retryable() {
        prompt.say(err)
    } else {
        Err(err.clone().into())
    }
}
