// API client module: a small blocking HTTP client for the DNS record API.
// One `ApiClient` issues exactly one request per invocation; there are no
// retries. When a trace sink is attached, the outgoing request and incoming
// status/headers are dumped to it (the binary points it at stderr so the
// trace never mixes with the formatted output on stdout).

use std::io::Write;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Version};
use serde::{Deserialize, Serialize};

use crate::cli::Command;
use crate::config::{mask_secret, Credentials};
use crate::error::{Error, Result};
use crate::USER_AGENT;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One domain-to-IP mapping, as sent in request bodies and returned by
/// `GET /dns`. Unset optional fields are left out of the JSON.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    #[serde(default)]
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_ip: Option<String>,
}

/// Blocking client bound to one server and API key.
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    trace: Option<Box<dyn Write>>,
}

impl ApiClient {
    pub fn new(creds: &Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Transport)?;
        Ok(ApiClient {
            client,
            base_url: creds.base_url().to_string(),
            api_key: creds.api_key.clone(),
            trace: None,
        })
    }

    /// Dump request and response details to `sink`.
    pub fn with_trace(mut self, sink: impl Write + 'static) -> Self {
        self.trace = Some(Box::new(sink));
        self
    }

    /// Issue the request for a validated command and return the raw body.
    pub fn send(&mut self, command: &Command) -> Result<Vec<u8>> {
        let payload = command.payload();
        self.request(command.method(), command.path(), payload.as_ref())
    }

    /// Send `method` to `base_url + path`, with `payload` as JSON body if set.
    ///
    /// Any status outside 2xx becomes `Error::Server` carrying the status
    /// line and the body verbatim.
    pub fn request(&mut self, method: Method, path: &str, payload: Option<&Record>) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        let body = payload
            .map(serde_json::to_vec)
            .transpose()
            .map_err(Error::Encoding)?;

        self.trace_request(&method, &url, body.as_deref());
        debug!("{} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(body) = body {
            req = req.header(CONTENT_TYPE, "application/json").body(body);
        }

        let res = req.send().map_err(Error::Transport)?;
        let status = res.status();
        self.trace_response(res.version(), status, res.headers());
        debug!("response status {}", status);

        let data = res.bytes().map_err(Error::Transport)?.to_vec();
        if !status.is_success() {
            return Err(Error::Server {
                status: status_line(status),
                body: String::from_utf8_lossy(&data).into_owned(),
            });
        }
        Ok(data)
    }

    fn trace_request(&mut self, method: &Method, url: &str, body: Option<&[u8]>) {
        let masked = mask_secret(&self.api_key);
        let Some(out) = self.trace.as_mut() else {
            return;
        };
        // Trace output is best effort; a closed stderr must not fail the request.
        let _ = writeln!(out, "> {} {}", method, url);
        if body.is_some() {
            let _ = writeln!(out, "> Content-Type: application/json");
        }
        let _ = writeln!(out, "> {}: {}", API_KEY_HEADER, masked);
        if let Some(body) = body {
            let _ = writeln!(out, ">\n{}", String::from_utf8_lossy(body));
        }
        let _ = out.flush();
    }

    fn trace_response(&mut self, version: Version, status: StatusCode, headers: &HeaderMap) {
        let Some(out) = self.trace.as_mut() else {
            return;
        };
        let _ = writeln!(out, "< {:?} {}", version, status_line(status));
        for (name, value) in headers {
            let _ = writeln!(out, "< {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
        }
        let _ = writeln!(out, "<");
        let _ = out.flush();
    }
}

/// `"401 Unauthorized"`-style status line.
fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
