pub mod admin;
pub mod directory;
pub mod login;
pub mod prompt;
pub mod reset;
pub mod session;

// The single match over `Action` lives in `run`.
mod run;

#[derive(Debug)]
pub enum Action {
    Login(login::Args),
    ResetPassword(reset::Args),
    Logout(session::Args),
    Whoami(session::Args),
    Search(directory::SearchArgs),
    Suggest(directory::SuggestArgs),
    Locate(directory::LocateArgs),
    Admin(admin::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
