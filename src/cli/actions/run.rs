use crate::cli::actions::{admin, directory, login, reset, session, Action};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::ResetPassword(args) => reset::execute(args).await,
        Action::Logout(args) => session::logout(&args),
        Action::Whoami(args) => session::whoami(&args),
        Action::Search(args) => directory::search(args).await,
        Action::Suggest(args) => directory::suggest(args).await,
        Action::Locate(args) => directory::locate(args).await,
        Action::Admin(args) => admin::execute(args).await,
    }
}
