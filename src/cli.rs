use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

pub struct Cli {
    pub config: PathBuf,
    pub host: String,
    pub command: BayCommand,
}

#[derive(Debug, PartialEq)]
pub enum BayCommand {
    Run {
        containers: Vec<String>,
        tail: bool,
    },
    Shell {
        containers: Vec<String>,
        command: Vec<String>,
    },
    Stop {
        containers: Vec<String>,
    },
    Restart {
        containers: Vec<String>,
    },
    Up,
    Tail {
        container: String,
        follow: bool,
    },
}

pub fn configure_cli() -> Cli {
    command().get_matches().into()
}

fn command() -> Command {
    Command::new("bay")
        .version("0.1.0")
        .about("reconcile container formations against a docker host")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("host")
                .long("host")
                .global(true)
                .value_name("HOST")
                .help("Target host to reconcile against")
                .default_value("default"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .help("Path to the container definitions")
                .default_value("bay.toml"),
        )
        .subcommand(
            Command::new("run")
                .about("start containers and their linked dependencies")
                .arg(
                    Arg::new("tail")
                        .long("tail")
                        .action(ArgAction::SetTrue)
                        .overrides_with("notail")
                        .help("Follow the container's logs after a successful boot"),
                )
                .arg(
                    Arg::new("notail")
                        .long("notail")
                        .action(ArgAction::SetTrue)
                        .help("Do not follow logs (default)"),
                )
                .arg(Arg::new("containers").num_args(1..).required(true)),
        )
        .subcommand(
            Command::new("shell")
                .about("run a container in the foreground with an interactive shell")
                .arg(Arg::new("containers").num_args(1..).required(true))
                .arg(Arg::new("command").num_args(0..).last(true)),
        )
        .subcommand(
            Command::new("stop")
                .about("stop named containers, or all non-system containers")
                .arg(Arg::new("containers").num_args(0..)),
        )
        .subcommand(
            Command::new("restart")
                .about("stop then run the named containers")
                .arg(Arg::new("containers").num_args(0..)),
        )
        .subcommand(Command::new("up").about("start every defined non-system container"))
        .subcommand(
            Command::new("tail")
                .about("print a container's logs")
                .arg(
                    Arg::new("follow")
                        .long("follow")
                        .short('f')
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("container").required(true)),
        )
}

fn string_values(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

impl From<ArgMatches> for Cli {
    fn from(matches: ArgMatches) -> Self {
        let (name, sub) = matches.subcommand().expect("subcommand is required");
        // global args land in the subcommand matches
        let host = sub
            .get_one::<String>("host")
            .cloned()
            .unwrap_or_else(|| "default".to_string());
        let config = PathBuf::from(
            sub.get_one::<String>("config")
                .cloned()
                .unwrap_or_else(|| "bay.toml".to_string()),
        );
        let command = match name {
            "run" => BayCommand::Run {
                containers: string_values(sub, "containers"),
                tail: sub.get_flag("tail"),
            },
            "shell" => BayCommand::Shell {
                containers: string_values(sub, "containers"),
                command: string_values(sub, "command"),
            },
            "stop" => BayCommand::Stop {
                containers: string_values(sub, "containers"),
            },
            "restart" => BayCommand::Restart {
                containers: string_values(sub, "containers"),
            },
            "up" => BayCommand::Up,
            "tail" => BayCommand::Tail {
                container: sub
                    .get_one::<String>("container")
                    .cloned()
                    .unwrap_or_default(),
                follow: sub.get_flag("follow"),
            },
            _ => unreachable!("unknown subcommand {name}"),
        };
        Cli {
            config,
            host,
            command,
        }
    }
}
