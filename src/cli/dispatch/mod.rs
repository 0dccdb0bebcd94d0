//! Maps validated CLI matches to an [`Action`].

use crate::carelink::{
    admin::{Decision, Resource},
    auth::ResetVerification,
    directory::{Category, SearchFilters},
    location::Coordinates,
};
use crate::cli::{
    actions::{admin, directory, login, reset, session, Action},
    commands::{
        admin as admin_cmd, api, auth, directory as directory_cmd, msg91,
        session as session_cmd,
    },
    globals::GlobalArgs,
};
use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;

fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    let api_opts = api::Options::parse(matches)?;
    let session_opts = session_cmd::Options::parse(matches);

    let mut globals = GlobalArgs::new(api_opts.url, session_opts.path);
    globals.timeout = api_opts.timeout;
    globals.geocode_url = api_opts.geocode_url;
    globals.msg91 = msg91::parse(matches);
    Ok(globals)
}

fn text(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    text(matches, id).with_context(|| format!("missing required argument: <{id}>"))
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = globals(matches)?;

    let Some((name, sub)) = matches.subcommand() else {
        bail!("no command given, see --help");
    };

    match name {
        auth::CMD_LOGIN => Ok(Action::Login(login::Args {
            globals,
            identifier: text(sub, auth::ARG_IDENTIFIER),
        })),
        auth::CMD_RESET_PASSWORD => Ok(Action::ResetPassword(reset::Args {
            globals,
            identifier: text(sub, auth::ARG_IDENTIFIER),
            verification: if sub.get_flag(auth::ARG_PROBE_CODE) {
                ResetVerification::Probe
            } else {
                ResetVerification::Deferred
            },
        })),
        auth::CMD_LOGOUT => Ok(Action::Logout(session::Args { globals })),
        auth::CMD_WHOAMI => Ok(Action::Whoami(session::Args { globals })),
        directory_cmd::CMD_SEARCH => search(globals, sub),
        directory_cmd::CMD_SUGGEST => Ok(Action::Suggest(directory::SuggestArgs {
            globals,
            term: sub
                .get_one::<String>(directory_cmd::ARG_TERM)
                .cloned()
                .unwrap_or_default(),
            json: sub.get_flag(directory_cmd::ARG_JSON),
        })),
        directory_cmd::CMD_LOCATE => {
            let lat = sub
                .get_one::<f64>(directory_cmd::ARG_LAT)
                .copied()
                .context("missing required argument: --lat")?;
            let lon = sub
                .get_one::<f64>(directory_cmd::ARG_LON)
                .copied()
                .context("missing required argument: --lon")?;
            Ok(Action::Locate(directory::LocateArgs {
                globals,
                coordinates: Coordinates::new(lat, lon).map_err(|e| anyhow!(e))?,
                json: sub.get_flag(directory_cmd::ARG_JSON),
            }))
        }
        admin_cmd::CMD_ADMIN => Ok(Action::Admin(admin::Args {
            globals,
            operation: admin_operation(sub)?,
        })),
        other => bail!("unknown command: {other}"),
    }
}

fn search(globals: GlobalArgs, sub: &ArgMatches) -> Result<Action> {
    let category = required(sub, directory_cmd::ARG_CATEGORY)?
        .parse::<Category>()
        .map_err(|e| anyhow!(e))?;

    let near = text(sub, directory_cmd::ARG_NEAR)
        .map(|near| near.parse::<Coordinates>())
        .transpose()
        .map_err(|e| anyhow!(e))?;

    Ok(Action::Search(directory::SearchArgs {
        globals,
        category,
        filters: SearchFilters {
            search: text(sub, directory_cmd::ARG_QUERY),
            city: text(sub, directory_cmd::ARG_CITY),
            page: sub.get_one::<u32>(directory_cmd::ARG_PAGE).copied(),
            limit: sub.get_one::<u32>(directory_cmd::ARG_LIMIT).copied(),
        },
        near,
        json: sub.get_flag(directory_cmd::ARG_JSON),
    }))
}

fn admin_operation(matches: &ArgMatches) -> Result<admin::Operation> {
    let Some((name, sub)) = matches.subcommand() else {
        bail!("no admin operation given, see carelink admin --help");
    };

    let resource = || -> Result<Resource> {
        required(sub, admin_cmd::ARG_RESOURCE)?
            .parse::<Resource>()
            .map_err(|e| anyhow!(e))
    };
    let id = || required(sub, admin_cmd::ARG_ID);
    let data = || {
        sub.get_one::<String>(admin_cmd::ARG_DATA)
            .context("missing required argument: --data")
            .and_then(|raw| admin::parse_data(raw))
    };

    Ok(match name {
        admin_cmd::CMD_LIST => admin::Operation::List(resource()?),
        admin_cmd::CMD_GET => admin::Operation::Get(resource()?, id()?),
        admin_cmd::CMD_CREATE => admin::Operation::Create(resource()?, data()?),
        admin_cmd::CMD_UPDATE => admin::Operation::Update(resource()?, id()?, data()?),
        admin_cmd::CMD_DELETE => admin::Operation::Delete {
            resource: resource()?,
            id: id()?,
            confirmed: sub.get_flag(admin_cmd::ARG_YES),
        },
        admin_cmd::CMD_APPROVE => admin::Operation::Decide(id()?, Decision::Approved),
        admin_cmd::CMD_REJECT => admin::Operation::Decide(id()?, Decision::Rejected),
        other => bail!("unknown admin operation: {other}"),
    })
}
