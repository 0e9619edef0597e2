//! Application settings.
//!
//! Settings come from an optional TOML file with per-field defaults, then
//! environment variables override individual values. The bot token is a
//! secret and is normally supplied only via `VEIN_BOT_TOKEN`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use vein_core::config::MiningConfig;
use vein_core::error::{Result, VeinError};

use crate::paths::VeinPaths;

fn default_http_addr() -> String {
    // Same default port the web dashboard has always been served on.
    "0.0.0.0:3000".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Settings {
    /// Telegram bot token. Prefer the `VEIN_BOT_TOKEN` environment
    /// variable over putting this in the config file.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Directory holding account records. Defaults to the platform data
    /// dir (e.g. `~/.local/share/vein`).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Bind address of the HTTP API / dashboard.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    /// Directory of static dashboard files to serve, if any.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default)]
    pub mining: MiningConfig,
}

impl Settings {
    /// Loads settings from `path`, or from the default config file when
    /// `path` is `None`. A missing file yields pure defaults. Environment
    /// overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => VeinPaths::config_file().ok(),
        };

        let mut settings = match path {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path).map_err(|err| {
                    VeinError::config(format!(
                        "failed to read config file {}: {err}",
                        path.display()
                    ))
                })?;
                toml::from_str(&content)?
            }
            _ => Self {
                http_addr: default_http_addr(),
                ..Self::default()
            },
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("VEIN_BOT_TOKEN") {
            if !token.is_empty() {
                self.bot_token = Some(token);
            }
        }
        if let Ok(dir) = std::env::var("VEIN_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(addr) = std::env::var("VEIN_HTTP_ADDR") {
            if !addr.is_empty() {
                self.http_addr = addr;
            }
        }
    }

    /// Resolves the effective data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => VeinPaths::data_dir().map_err(|err| VeinError::config(err.to_string())),
        }
    }

    /// Returns the bot token or a configuration error naming the variable
    /// to set.
    pub fn bot_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| VeinError::config("bot token missing: set VEIN_BOT_TOKEN"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/vein.toml"))).unwrap();
        assert_eq!(settings.http_addr, "0.0.0.0:3000");
        assert_eq!(settings.mining, MiningConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_rest() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "http_addr = \"127.0.0.1:8080\"\n\n[mining]\nreconcile_interval_secs = 15"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.http_addr, "127.0.0.1:8080");
        assert_eq!(settings.mining.reconcile_interval_secs, 15);
        assert_eq!(settings.mining.base_rate_per_minute, 0.005);
        assert!(settings.bot_token.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "http_addr = [not toml").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_bot_token_is_a_config_error() {
        let settings = Settings::default();
        let err = settings.bot_token().unwrap_err();
        assert!(matches!(err, VeinError::Config(_)));
    }
}
