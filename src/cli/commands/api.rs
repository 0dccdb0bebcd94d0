use crate::carelink::location::DEFAULT_GEOCODE_URL;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_GEOCODE_URL: &str = "geocode-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Directory backend base URL, example: https://api.carelink.health/api")
                .env("CARELINK_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds")
                .env("CARELINK_TIMEOUT_SECONDS")
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_GEOCODE_URL)
                .long(ARG_GEOCODE_URL)
                .help("Reverse geocoding service base URL")
                .env("CARELINK_GEOCODE_URL")
                .default_value(DEFAULT_GEOCODE_URL)
                .global(true),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub url: Option<String>,
    pub timeout: Duration,
    pub geocode_url: String,
}

impl Options {
    /// # Errors
    /// Returns an error if the timeout is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_API_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let timeout = matches
            .get_one::<u64>(ARG_TIMEOUT)
            .copied()
            .map(Duration::from_secs)
            .context("missing required argument: --timeout")?;

        let geocode_url = matches
            .get_one::<String>(ARG_GEOCODE_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_GEOCODE_URL.to_string());

        Ok(Self {
            url,
            timeout,
            geocode_url,
        })
    }
}
