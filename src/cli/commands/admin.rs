use clap::{Arg, ArgAction, Command};

pub const CMD_ADMIN: &str = "admin";

pub const CMD_LIST: &str = "list";
pub const CMD_GET: &str = "get";
pub const CMD_CREATE: &str = "create";
pub const CMD_UPDATE: &str = "update";
pub const CMD_DELETE: &str = "delete";
pub const CMD_APPROVE: &str = "approve";
pub const CMD_REJECT: &str = "reject";

pub const ARG_RESOURCE: &str = "resource";
pub const ARG_ID: &str = "id";
pub const ARG_DATA: &str = "data";
pub const ARG_YES: &str = "yes";

fn resource_arg() -> Arg {
    Arg::new(ARG_RESOURCE)
        .help("ambulances, pharmacies, banners, blogs, users or access-requests")
        .required(true)
}

fn id_arg() -> Arg {
    Arg::new(ARG_ID).help("Record id").required(true)
}

fn data_arg() -> Arg {
    Arg::new(ARG_DATA)
        .short('d')
        .long(ARG_DATA)
        .value_name("JSON|@FILE")
        .help("Record as a JSON object, or @path to read it from a file")
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command.subcommand(
        Command::new(CMD_ADMIN)
            .about("Manage directory content (staff accounts only)")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(
                Command::new(CMD_LIST)
                    .about("List records")
                    .arg(resource_arg()),
            )
            .subcommand(
                Command::new(CMD_GET)
                    .about("Show one record")
                    .arg(resource_arg())
                    .arg(id_arg()),
            )
            .subcommand(
                Command::new(CMD_CREATE)
                    .about("Create a record")
                    .arg(resource_arg())
                    .arg(data_arg()),
            )
            .subcommand(
                Command::new(CMD_UPDATE)
                    .about("Replace a record")
                    .arg(resource_arg())
                    .arg(id_arg())
                    .arg(data_arg()),
            )
            .subcommand(
                Command::new(CMD_DELETE)
                    .about("Delete a record")
                    .arg(resource_arg())
                    .arg(id_arg())
                    .arg(
                        Arg::new(ARG_YES)
                            .short('y')
                            .long(ARG_YES)
                            .help("Do not ask for confirmation")
                            .action(ArgAction::SetTrue),
                    ),
            )
            .subcommand(
                Command::new(CMD_APPROVE)
                    .about("Approve an access request")
                    .arg(id_arg()),
            )
            .subcommand(
                Command::new(CMD_REJECT)
                    .about("Reject an access request")
                    .arg(id_arg()),
            ),
    )
}
