// Error taxonomy shared by the library.
// Each variant ends the invocation; `main` prints it as a single
// `dnscli: <message>` line.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a single invocation can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("configuration not found at {path}, run 'dnscli --setup' first")]
    ConfigNotFound { path: String },

    #[error("invalid configuration at {path} ({reason}), run 'dnscli --setup' first")]
    ConfigMalformed { path: String, reason: String },

    #[error("failed to save configuration: {0}")]
    ConfigWrite(String),

    #[error("{0}")]
    Validation(String),

    #[error("failed to read input: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("failed to encode request: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: String, body: String },
}

impl Error {
    pub(crate) fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Whether the user should be pointed at `--help`.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }
}
