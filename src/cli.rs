// Command-line parsing and validation.
// `clap` only tokenises the flags; deciding which action to run (and whether
// the flag combination makes sense) happens in `Invocation::from_cli` so that
// help/version/setup can short-circuit before the command checks.

use std::ffi::OsString;

use clap::Parser;
use reqwest::Method;

use crate::api::Record;
use crate::error::{Error, Result};
use crate::VERSION;

/// Raw flag values as typed by the user.
#[derive(Parser, Debug, Default)]
#[command(
    name = "dnscli",
    disable_help_flag = true,
    disable_version_flag = true,
    args_override_self = true
)]
pub struct Cli {
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    #[arg(long = "version")]
    pub version: bool,

    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[arg(long = "setup")]
    pub setup: bool,

    #[arg(long = "list")]
    pub list: bool,

    #[arg(long = "add")]
    pub add: bool,

    #[arg(long = "update")]
    pub update: bool,

    #[arg(long = "delete")]
    pub delete: bool,

    #[arg(long = "domain", value_name = "name")]
    pub domain: Option<String>,

    #[arg(long = "ip", value_name = "addr")]
    pub ip: Option<String>,

    #[arg(long = "new-ip", value_name = "addr")]
    pub new_ip: Option<String>,
}

/// What a single process invocation should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Version,
    Setup,
    Run(Request),
}

/// A validated remote operation plus the output mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add {
        domain: String,
        ip: String,
    },
    Update {
        domain: String,
        ip: Option<String>,
        new_ip: String,
    },
    Delete {
        domain: String,
        ip: Option<String>,
    },
}

impl Command {
    pub fn method(&self) -> Method {
        match self {
            Command::List => Method::GET,
            Command::Add { .. } => Method::POST,
            Command::Update { .. } => Method::PUT,
            Command::Delete { .. } => Method::DELETE,
        }
    }

    pub fn path(&self) -> &'static str {
        "/dns"
    }

    /// Listing renders as a table, everything else as a one-line summary.
    pub fn is_list(&self) -> bool {
        matches!(self, Command::List)
    }

    /// JSON body for the request, `None` for `list`.
    pub fn payload(&self) -> Option<Record> {
        match self {
            Command::List => None,
            Command::Add { domain, ip } => Some(Record {
                domain: domain.clone(),
                ip: Some(ip.clone()),
                new_ip: None,
            }),
            Command::Update { domain, ip, new_ip } => Some(Record {
                domain: domain.clone(),
                ip: ip.clone(),
                new_ip: Some(new_ip.clone()),
            }),
            Command::Delete { domain, ip } => Some(Record {
                domain: domain.clone(),
                ip: ip.clone(),
                new_ip: None,
            }),
        }
    }
}

impl Invocation {
    /// Parse and validate a full argument vector (program name first).
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| Error::usage(clap_message(&e)))?;
        Self::from_cli(cli)
    }

    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.help {
            return Ok(Invocation::Help);
        }
        if cli.version {
            return Ok(Invocation::Version);
        }
        if cli.setup {
            return Ok(Invocation::Setup);
        }

        let selected = [cli.list, cli.add, cli.update, cli.delete]
            .iter()
            .filter(|on| **on)
            .count();
        match selected {
            0 => return Err(Error::usage("no command specified")),
            1 => {}
            _ => return Err(Error::usage("multiple commands specified")),
        }

        let domain = non_empty(cli.domain);
        let ip = non_empty(cli.ip);
        let new_ip = non_empty(cli.new_ip);

        let command = if cli.list {
            Command::List
        } else if cli.add {
            match (domain, ip) {
                (Some(domain), Some(ip)) => Command::Add { domain, ip },
                _ => return Err(Error::usage("add command requires --domain and --ip")),
            }
        } else if cli.update {
            match (domain, new_ip) {
                (Some(domain), Some(new_ip)) => Command::Update { domain, ip, new_ip },
                _ => return Err(Error::usage("update command requires --domain and --new-ip")),
            }
        } else {
            match domain {
                Some(domain) => Command::Delete { domain, ip },
                None => return Err(Error::usage("delete command requires --domain")),
            }
        };

        Ok(Invocation::Run(Request {
            command,
            verbose: cli.verbose,
        }))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// First line of a clap error without its `error: ` prefix.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

/// Help text printed by `-h`/`--help`.
pub fn usage() -> String {
    format!(
        "dnscli - DNS record management client {VERSION}

USAGE:
    dnscli [OPTIONS] COMMAND [ARGS]

OPTIONS:
    -h, --help      show this help message
    -v, --verbose   enable verbose output
    --version       show version information
    --setup         configure server endpoint and credentials

COMMANDS:
    --list                                  list all DNS records
    --add --domain <name> --ip <addr>       add new DNS record
    --update --domain <name> [--ip <old>] --new-ip <addr>
                                            update existing DNS record
    --delete --domain <name> [--ip <addr>]  delete DNS record

EXAMPLES:
    dnscli --setup
    dnscli --list
    dnscli --add --domain api.example.com --ip 192.168.1.100
    dnscli --update --domain api.example.com --new-ip 192.168.1.101
    dnscli --delete --domain api.example.com
"
    )
}
