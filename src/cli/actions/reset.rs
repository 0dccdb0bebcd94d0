use super::login::{report, CANCEL, RESEND};
use crate::carelink::auth::{
    client::AuthClient,
    otp::{can_verify, sanitize_input, OTP_LENGTH},
    FlowError, ResetFlow, ResetVerification, Step,
};
use crate::cli::{
    actions::prompt::{Console, Terminal},
    globals::GlobalArgs,
};
use anyhow::{bail, Result};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub identifier: Option<String>,
    pub verification: ResetVerification,
}

/// Execute the password reset action.
/// # Errors
/// Returns an error if configuration is invalid or input is closed.
pub async fn execute(args: Args) -> Result<()> {
    run(&args, &mut Console).await
}

/// Drives the recovery flow: identifier, code, new password.
///
/// # Errors
/// See [`execute`].
pub async fn run<T: Terminal>(args: &Args, prompt: &mut T) -> Result<()> {
    let auth = AuthClient::new(args.globals.api_client()?);
    let mut flow = ResetFlow::new(auth, args.verification);

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

    while flow.step() != Step::Done {
        if flow.step() == Step::Code {
            enter_code(&mut flow, prompt).await?;
        } else {
            enter_password(&mut flow, prompt).await?;
        }
    }

    prompt.say("Password updated. Sign in with your new password.")?;
    Ok(())
}

async fn enter_code<T: Terminal>(flow: &mut ResetFlow, prompt: &mut T) -> Result<()> {
    let input = prompt.ask(&format!(
        "Enter the {OTP_LENGTH}-digit code ({RESEND} to resend, {CANCEL} to cancel)"
    ))?;

    match input.to_lowercase().as_str() {
        CANCEL => {
            flow.abandon();
            bail!("password reset cancelled");
        }
        RESEND => match flow.resend().await {
            Ok(()) => prompt.say("A new code was sent"),
            Err(err) => report(prompt, &err),
        },
        _ => {
            let code = sanitize_input(&input);
            if !can_verify(&code) {
                return prompt.say(format!("Enter all {OTP_LENGTH} digits of the code"));
            }
            match flow.verify_code(&code).await {
                Ok(()) => Ok(()),
                Err(err) => report(prompt, &err),
            }
        }
    }
}

async fn enter_password<T: Terminal>(flow: &mut ResetFlow, prompt: &mut T) -> Result<()> {
    let password = prompt.ask_secret("New password")?;
    let confirmation = prompt.ask_secret("Confirm new password")?;

    match flow.set_password(&password, &confirmation).await {
        Ok(()) => Ok(()),
        Err(err @ FlowError::Rejected(_)) => {
            report(prompt, &err)?;
            if prompt.confirm("Enter the code again?")? {
                flow.back_to_code();
            }
            Ok(())
        }
        Err(err) => report(prompt, &err),
    }
}
