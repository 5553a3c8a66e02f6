//! Application configuration.
//!
//! The top-level [`Config`] is deserialized from a TOML file and carries the
//! server, storage, and converter sections. Every section defaults sensibly
//! so a completely empty file is valid. The preferred-converter environment
//! override is applied exactly once, at load time, so no code path re-reads
//! the process environment per request.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the preferred converter tool.
pub const PREFERRED_TOOL_ENV: &str = "HEIFPRESS_CONVERTER";

/// Default config locations, tried in order when no path is given.
const DEFAULT_PATHS: &[&str] = &[
    "./heifpress.toml",
    "~/.config/heifpress/config.toml",
    "/etc/heifpress/config.toml",
];

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub converter: ConverterConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.server.max_upload_bytes == 0 {
            warnings.push("server.max_upload_bytes is 0; every upload will be rejected".into());
        }

        if self.storage.upload_dir == self.storage.converted_dir {
            warnings.push(
                "storage.upload_dir and storage.converted_dir are the same directory; \
                 upload cleanup may race with downloads"
                    .into(),
            );
        }

        if let Some(ref preferred) = self.converter.preferred {
            if preferred.is_empty() {
                warnings.push("converter.preferred is set but empty".into());
            }
        }

        warnings
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read config file {}: {e}", path.display())))?;
    Config::from_toml(&content)
}

/// Load config from a custom path or the default locations, falling back to
/// defaults when no file exists, then apply the environment override.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    let mut config = match custom_path {
        Some(path) => load_config(path)?,
        None => {
            let mut found = None;
            for path_str in DEFAULT_PATHS {
                let path = shellexpand::tilde(path_str);
                let path = Path::new(path.as_ref());
                if path.exists() {
                    found = Some(load_config(path)?);
                    break;
                }
            }
            found.unwrap_or_default()
        }
    };

    apply_env_override(&mut config, std::env::var(PREFERRED_TOOL_ENV).ok());
    Ok(config)
}

/// Fold the preferred-converter environment value into the config.
///
/// The environment wins over the file so an operator can pin a tool on a
/// host without editing the config.
fn apply_env_override(config: &mut Config, preferred: Option<String>) {
    if let Some(name) = preferred {
        tracing::debug!("Using preferred converter '{name}' from {PREFERRED_TOOL_ENV}");
        config.converter.preferred = Some(name);
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Optional directory with a static upload UI, served as a fallback.
    pub static_dir: Option<PathBuf>,
    /// Maximum accepted request body size for uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            static_dir: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

/// Upload and converted-output directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where uploaded source files land before conversion.
    pub upload_dir: PathBuf,
    /// Where converted JPEGs are written and served from.
    pub converted_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./data/uploads"),
            converted_dir: PathBuf::from("./data/converted"),
        }
    }
}

/// Converter selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Preferred tool invocation name; when unset, the catalog is scanned in
    /// priority order.
    pub preferred: Option<String>,
}
