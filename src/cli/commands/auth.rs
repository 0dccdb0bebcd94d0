use clap::{Arg, ArgAction, Command};

pub const CMD_LOGIN: &str = "login";
pub const CMD_RESET_PASSWORD: &str = "reset-password";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";

pub const ARG_IDENTIFIER: &str = "identifier";
pub const ARG_PROBE_CODE: &str = "probe-code";

fn identifier_arg() -> Arg {
    Arg::new(ARG_IDENTIFIER)
        .short('i')
        .long(ARG_IDENTIFIER)
        .help("Email, username or phone number (prompted when omitted)")
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Sign in with a one-time code")
                .arg(identifier_arg()),
        )
        .subcommand(
            Command::new(CMD_RESET_PASSWORD)
                .about("Reset the account password with a one-time code")
                .arg(identifier_arg())
                .arg(
                    Arg::new(ARG_PROBE_CODE)
                        .long(ARG_PROBE_CODE)
                        .help("Check the code with the backend before asking for the new password")
                        .long_help(
                            "Check the code with the backend before asking for the new password. \
                             This submits a placeholder password to the reset endpoint, which some \
                             backends may commit; by default the code is only checked when the new \
                             password is submitted.",
                        )
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Forget the stored session"))
        .subcommand(Command::new(CMD_WHOAMI).about("Show the signed-in account"))
}
