use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MedcareConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// User the CLI and MCP server act as when no session is supplied.
    pub default_user: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Days of alarms projected ahead on every save.
    pub window_days: u32,
    /// Interval of the today-view refresh.
    pub tick_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    /// Prescription extraction endpoint. Empty disables scanning.
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_medcare_dir()
            .join("medcare.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            default_user: "local".into(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            tick_secs: 60,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Returns `~/.medcare/`
pub fn default_medcare_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".medcare")
}

/// Returns the default config file path: `~/.medcare/config.toml`
pub fn default_config_path() -> PathBuf {
    default_medcare_dir().join("config.toml")
}

impl MedcareConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MedcareConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (MEDCARE_DB, MEDCARE_USER, MEDCARE_LOG_LEVEL, MEDCARE_OCR_URL, MEDCARE_OCR_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEDCARE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEDCARE_USER") {
            self.storage.default_user = val;
        }
        if let Ok(val) = std::env::var("MEDCARE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MEDCARE_OCR_URL") {
            self.ocr.endpoint = val;
        }
        if let Ok(val) = std::env::var("MEDCARE_OCR_KEY") {
            self.ocr.api_key = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MedcareConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.storage.default_user, "local");
        assert_eq!(config.schedule.window_days, 7);
        assert_eq!(config.schedule.tick_secs, 60);
        assert!(config.ocr.endpoint.is_empty());
        assert!(config.storage.db_path.ends_with("medcare.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
port = 9000

[storage]
db_path = "/tmp/test.db"
default_user = "asha"

[schedule]
window_days = 3
"#;
        let config: MedcareConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.storage.default_user, "asha");
        assert_eq!(config.schedule.window_days, 3);
        // defaults still apply for unset fields
        assert_eq!(config.schedule.tick_secs, 60);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MedcareConfig::default();
        std::env::set_var("MEDCARE_DB", "/tmp/override.db");
        std::env::set_var("MEDCARE_USER", "env-user");
        std::env::set_var("MEDCARE_LOG_LEVEL", "trace");
        std::env::set_var("MEDCARE_OCR_URL", "http://localhost:9/extract");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.storage.default_user, "env-user");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.ocr.endpoint, "http://localhost:9/extract");

        // Clean up
        std::env::remove_var("MEDCARE_DB");
        std::env::remove_var("MEDCARE_USER");
        std::env::remove_var("MEDCARE_LOG_LEVEL");
        std::env::remove_var("MEDCARE_OCR_URL");
    }
}
