//! Org session and output directory configuration.
//!
//! Sensitive fields are redacted in Debug output.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Environment variable overriding the default output directory.
pub const SOURCE_DIR_ENV: &str = "SF_FETCH_SOURCE_DIR";

/// Directory names recognized as a project's metadata root.
const SOURCE_DIR_NAMES: [&str; 2] = ["src", "metadata"];

/// An authenticated session against one org.
#[derive(Clone)]
pub struct OrgConfig {
    pub instance_url: String,
    pub access_token: String,
    pub api_version: String,
}

impl std::fmt::Debug for OrgConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgConfig")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl OrgConfig {
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
        }
    }

    /// Load the session from environment variables.
    ///
    /// Required:
    /// - `SF_INSTANCE_URL` or `SALESFORCE_INSTANCE_URL`
    /// - `SF_ACCESS_TOKEN` or `SALESFORCE_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `SF_API_VERSION` or `SALESFORCE_API_VERSION` (default: "62.0")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let first = |names: [&str; 2]| {
            names
                .into_iter()
                .find_map(|n| lookup(n).filter(|v| !v.trim().is_empty()))
        };

        let instance_url = first(["SF_INSTANCE_URL", "SALESFORCE_INSTANCE_URL"])
            .ok_or_else(|| missing("SF_INSTANCE_URL"))?;
        let access_token = first(["SF_ACCESS_TOKEN", "SALESFORCE_ACCESS_TOKEN"])
            .ok_or_else(|| missing("SF_ACCESS_TOKEN"))?;
        let api_version = first(["SF_API_VERSION", "SALESFORCE_API_VERSION"])
            .unwrap_or_else(|| busbar_sf_client::DEFAULT_API_VERSION.to_string());

        Ok(Self::new(instance_url, access_token, api_version))
    }

    /// Load the session of an org authenticated with the `sf` CLI.
    pub async fn from_sf_cli(alias_or_username: &str) -> Result<Self> {
        use tokio::process::Command;

        debug!(org = alias_or_username, "reading session from sf CLI");
        let output = Command::new("sf")
            .args(["org", "display", "--target-org", alias_or_username, "--json"])
            .output()
            .await
            .map_err(|e| {
                Error::with_source(
                    ErrorKind::Config(format!("Failed to run sf CLI: {}", e)),
                    e,
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::new(ErrorKind::Config(format!(
                "sf org display failed: {}",
                stderr.trim()
            ))));
        }

        Self::from_sf_display_json(&output.stdout)
    }

    /// Parse the output of `sf org display --json`.
    pub fn from_sf_display_json(stdout: &[u8]) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_slice(stdout)
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;
        let result = json
            .get("result")
            .ok_or_else(|| Error::new(ErrorKind::Config("Missing 'result' in output".into())))?;

        let field = |name: &str| result.get(name).and_then(|v| v.as_str());
        let instance_url = field("instanceUrl")
            .ok_or_else(|| Error::new(ErrorKind::Config("Missing instanceUrl".into())))?;
        let access_token = field("accessToken")
            .ok_or_else(|| Error::new(ErrorKind::Config("Missing accessToken".into())))?;
        let api_version = field("apiVersion").unwrap_or(busbar_sf_client::DEFAULT_API_VERSION);

        Ok(Self::new(instance_url, access_token, api_version))
    }
}

fn missing(var: &str) -> Error {
    Error::new(ErrorKind::Config(format!(
        "{} is not set (or pass --target-org)",
        var
    )))
}

/// Default output root.
///
/// `SF_FETCH_SOURCE_DIR` when set, else the nearest `src` or `metadata`
/// directory in `cwd` or one of its ancestors, else `cwd/src`.
pub fn source_dir(cwd: &Path) -> PathBuf {
    if let Some(dir) = std::env::var_os(SOURCE_DIR_ENV).filter(|v| !v.is_empty()) {
        return absolute(cwd, Path::new(&dir));
    }
    find_source_dir(cwd).unwrap_or_else(|| cwd.join(SOURCE_DIR_NAMES[0]))
}

/// Nearest `src`/`metadata` directory at or above `start`.
pub fn find_source_dir(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        SOURCE_DIR_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_dir())
    })
}

/// `path` made absolute against `cwd`.
pub fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
