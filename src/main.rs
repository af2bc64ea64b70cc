// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, then run exactly one action.
// - Every failure ends up as one `dnscli: <message>` line on stderr and
//   exit status 1.

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use crossterm::tty::IsTty;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use dnscli::api::ApiClient;
use dnscli::cli::{self, Invocation, Request};
use dnscli::config::ConfigStore;
use dnscli::format::Formatter;
use dnscli::setup::{self, TerminalPrompt};
use dnscli::{Error, VERSION};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("DNSCLI_LOG", "warn"))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dnscli: {}", err);
            if err.downcast_ref::<Error>().is_some_and(Error::is_usage) {
                eprintln!("Try 'dnscli --help' for more information.");
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    match Invocation::from_args(std::env::args_os())? {
        Invocation::Help => print!("{}", cli::usage()),
        Invocation::Version => println!("dnscli version {}", VERSION),
        Invocation::Setup => {
            let store = ConfigStore::new();
            setup::run(&store, &mut TerminalPrompt)?;
            println!("Configuration saved successfully");
        }
        Invocation::Run(request) => execute(&request)?,
    }
    Ok(())
}

/// Load credentials, send one request and print the formatted response.
fn execute(request: &Request) -> anyhow::Result<()> {
    let store = ConfigStore::new();
    let creds = store.load()?;
    debug!("using server {}", creds.server);

    let mut client = ApiClient::new(&creds)?;
    if request.verbose {
        client = client.with_trace(io::stderr());
    }

    let spinner = (!request.verbose).then(progress_spinner);
    let body = client.send(&request.command);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let body = body?;

    let stdout = io::stdout();
    let formatter = Formatter::new(request.verbose, stdout.is_tty());
    let mut out = stdout.lock();
    formatter
        .render(&mut out, &body, request.command.is_list())
        .and_then(|_| out.flush())
        .context("failed to write output")?;
    Ok(())
}

/// Spinner on stderr while the request is in flight; hidden when stderr is
/// not a terminal.
fn progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Contacting server...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
