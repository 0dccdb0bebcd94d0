use clap::{Arg, ArgAction, Command};

pub const CMD_SEARCH: &str = "search";
pub const CMD_SUGGEST: &str = "suggest";
pub const CMD_LOCATE: &str = "locate";

pub const ARG_CATEGORY: &str = "category";
pub const ARG_QUERY: &str = "query";
pub const ARG_CITY: &str = "city";
pub const ARG_NEAR: &str = "near";
pub const ARG_PAGE: &str = "page";
pub const ARG_LIMIT: &str = "limit";
pub const ARG_TERM: &str = "term";
pub const ARG_LAT: &str = "lat";
pub const ARG_LON: &str = "lon";
pub const ARG_JSON: &str = "json";

fn json_arg() -> Arg {
    Arg::new(ARG_JSON)
        .long(ARG_JSON)
        .help("Print raw JSON")
        .action(ArgAction::SetTrue)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_SEARCH)
                .about("Search doctors, labs, ambulances, pharmacies or clinics")
                .arg(
                    Arg::new(ARG_CATEGORY)
                        .help("doctors, labs, ambulances, pharmacies or clinics")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_QUERY)
                        .short('q')
                        .long(ARG_QUERY)
                        .help("Free-text search"),
                )
                .arg(
                    Arg::new(ARG_CITY)
                        .short('c')
                        .long(ARG_CITY)
                        .help("Only results in this city"),
                )
                .arg(
                    Arg::new(ARG_NEAR)
                        .long(ARG_NEAR)
                        .value_name("LAT,LON")
                        .help("Only results in the city at these coordinates")
                        .allow_hyphen_values(true)
                        .conflicts_with(ARG_CITY),
                )
                .arg(
                    Arg::new(ARG_PAGE)
                        .long(ARG_PAGE)
                        .help("Result page")
                        .value_parser(clap::value_parser!(u32).range(1..)),
                )
                .arg(
                    Arg::new(ARG_LIMIT)
                        .long(ARG_LIMIT)
                        .help("Results per page")
                        .value_parser(clap::value_parser!(u32).range(1..)),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new(CMD_SUGGEST)
                .about("Search suggestions for a partial term")
                .arg(Arg::new(ARG_TERM).required(true))
                .arg(json_arg()),
        )
        .subcommand(
            Command::new(CMD_LOCATE)
                .about("Find the city at the given coordinates")
                .arg(
                    Arg::new(ARG_LAT)
                        .long(ARG_LAT)
                        .help("Latitude")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new(ARG_LON)
                        .long(ARG_LON)
                        .help("Longitude")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(json_arg()),
        )
}
