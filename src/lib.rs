// Library root
// -----------
// The binary (`main.rs`) is a thin shell over these modules. One invocation
// runs a single linear pipeline:
//
//   cli (parse + validate) -> config (load) -> api (one request) -> format
//
// Module responsibilities:
// - `cli`: flag parsing and validation into an immutable `Invocation`.
// - `config`: the on-disk credential file and its load/save helpers.
// - `setup`: the interactive flow that writes the credential file.
// - `api`: the blocking HTTP client and the verbose request/response trace.
// - `format`: turning a response body into the text the user sees.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod setup;

pub use error::{Error, Result};

/// Client version reported by `--version` and in the user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("dnscli/", env!("CARGO_PKG_VERSION"));
