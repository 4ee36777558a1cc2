//! TOML configuration.
//!
//! The store location lives in `[db].path` and is threaded into every
//! operation through the [`Config`] value. [`Config::default`] is the one
//! place defaults come from; the CLI applies `--db` / `ECLI_DB_PATH`
//! overrides once at startup via [`Config::with_db_path`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ecli_test.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Row cap for the recent-documents panel when the caller gives none.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_recent_limit() -> u32 {
    10
}

impl Config {
    /// Default configuration pointed at a specific database file.
    pub fn for_db(path: impl Into<PathBuf>) -> Self {
        Config::default().with_db_path(path)
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db.path = path.into();
        self
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    if config.dashboard.recent_limit < 1 {
        anyhow::bail!("dashboard.recent_limit must be >= 1");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.db.path, PathBuf::from("ecli_test.db"));
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.dashboard.recent_limit, 10);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "/var/lib/ecli/index.db"

            [dashboard]
            recent_limit = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.db.path, PathBuf::from("/var/lib/ecli/index.db"));
        assert_eq!(config.dashboard.recent_limit, 25);
        assert_eq!(config.server.bind, "127.0.0.1:5000");
    }

    #[test]
    fn test_zero_recent_limit_rejected() {
        let config: Config = toml::from_str("[dashboard]\nrecent_limit = 0\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("recent_limit"));
    }

    #[test]
    fn test_db_override() {
        let config = Config::default().with_db_path("/tmp/other.db");
        assert_eq!(config.db.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.dashboard.recent_limit, 10);
    }
}
