use crate::carelink::auth::widget::{Msg91Config, DEFAULT_MSG91_URL};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_MSG91_WIDGET_ID: &str = "msg91-widget-id";
pub const ARG_MSG91_TOKEN: &str = "msg91-token";
pub const ARG_MSG91_URL: &str = "msg91-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MSG91_WIDGET_ID)
                .long(ARG_MSG91_WIDGET_ID)
                .help("MSG91 OTP widget id; with --msg91-token, codes are sent through MSG91")
                .env("CARELINK_MSG91_WIDGET_ID")
                .global(true),
        )
        .arg(
            Arg::new(ARG_MSG91_TOKEN)
                .long(ARG_MSG91_TOKEN)
                .help("MSG91 widget auth token")
                .env("CARELINK_MSG91_TOKEN")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_MSG91_URL)
                .long(ARG_MSG91_URL)
                .help("MSG91 widget API base URL")
                .env("CARELINK_MSG91_URL")
                .default_value(DEFAULT_MSG91_URL)
                .global(true),
        )
}

/// Widget configuration, `None` unless both the widget id and token are set.
#[must_use]
pub fn parse(matches: &ArgMatches) -> Option<Msg91Config> {
    Msg91Config::from_parts(
        matches.get_one::<String>(ARG_MSG91_URL).cloned(),
        matches.get_one::<String>(ARG_MSG91_WIDGET_ID).cloned(),
        matches
            .get_one::<String>(ARG_MSG91_TOKEN)
            .cloned()
            .map(SecretString::from),
    )
}
