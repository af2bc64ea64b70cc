// Credential persistence.
// The whole local state of the client is one small JSON file under the
// user's home directory:
//
//   ~/.dnscli/config.json   {"server": "...", "apikey": "..."}
//
// Reading never fabricates defaults; a missing or broken file is reported
// and the user is sent to `dnscli --setup`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_DIR: &str = ".dnscli";
const CONFIG_FILE: &str = "config.json";

/// Number of leading characters of a secret that may be displayed.
const SECRET_PREFIX: usize = 8;

/// Server endpoint and API key used for every request.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default)]
    pub server: String,
    #[serde(default, rename = "apikey")]
    pub api_key: String,
}

impl Credentials {
    pub fn new(server: impl Into<String>, api_key: impl Into<String>) -> Self {
        Credentials {
            server: server.into(),
            api_key: api_key.into(),
        }
    }

    /// Both fields must be set before the client talks to the network.
    pub fn is_complete(&self) -> bool {
        !self.server.is_empty() && !self.api_key.is_empty()
    }

    /// Server URL with a single trailing slash removed, ready for `+ path`.
    pub fn base_url(&self) -> &str {
        self.server.strip_suffix('/').unwrap_or(&self.server)
    }
}

/// Short prefix of a secret followed by `...`, for prompts and traces.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(SECRET_PREFIX).collect();
    format!("{prefix}...")
}

/// Location of the credential file plus load/save helpers.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Store at `<home>/.dnscli/config.json`.
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::at(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load credentials for a request. Both fields must be present.
    pub fn load(&self) -> Result<Credentials> {
        let creds = self.read()?;
        if !creds.is_complete() {
            return Err(Error::ConfigMalformed {
                path: self.display(),
                reason: "server and apikey must both be set".into(),
            });
        }
        Ok(creds)
    }

    /// Decode the file as-is, without requiring both fields.
    pub(crate) fn read(&self) -> Result<Credentials> {
        debug!("reading configuration from {}", self.path.display());
        let data = fs::read(&self.path).map_err(|e| {
            debug!("cannot read {}: {}", self.path.display(), e);
            Error::ConfigNotFound {
                path: self.display(),
            }
        })?;
        serde_json::from_slice(&data).map_err(|e| Error::ConfigMalformed {
            path: self.display(),
            reason: e.to_string(),
        })
    }

    /// Persist credentials as pretty-printed JSON with owner-only access.
    ///
    /// The file is written next to its final location and renamed into
    /// place, so a failed write never leaves a truncated config behind.
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        create_private_dir(dir)
            .map_err(|e| Error::ConfigWrite(format!("{}: {}", dir.display(), e)))?;

        let mut json =
            serde_json::to_vec_pretty(creds).map_err(|e| Error::ConfigWrite(e.to_string()))?;
        json.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        let written = create_private_file(&tmp)
            .and_then(|mut file| {
                file.write_all(&json)?;
                file.sync_all()
            })
            .and_then(|_| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(Error::ConfigWrite(format!("{}: {}", self.path.display(), e)));
        }

        debug!("configuration written to {}", self.path.display());
        Ok(())
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn create_private_file(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
