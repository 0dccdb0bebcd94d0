use crate::carelink::auth::FileSessionStore;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_SESSION_FILE: &str = "session-file";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_SESSION_FILE)
            .long(ARG_SESSION_FILE)
            .help("Where the session token and profile are stored")
            .env("CARELINK_SESSION_FILE")
            .global(true)
            .value_parser(clap::value_parser!(PathBuf)),
    )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub path: PathBuf,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let path = matches
            .get_one::<PathBuf>(ARG_SESSION_FILE)
            .filter(|path| !path.as_os_str().is_empty())
            .cloned()
            .unwrap_or_else(FileSessionStore::default_path);

        Self { path }
    }
}
