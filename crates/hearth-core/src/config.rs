use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8470;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Key of the watermark row in `app_state` — the Monday of the last week
/// for which recurring task instances were spawned.
pub const LAST_RECURRENCE_MONDAY: &str = "last_recurrence_monday";

/// Top-level config (hearth.toml + HEARTH_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HearthConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for HearthConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Background job cadence. The recurrence spawn additionally runs once at
/// every process start regardless of these values (downtime recovery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// UTC hour at which the daily recurrence spawn fires.
    #[serde(default)]
    pub spawn_hour: u8,
    /// UTC minute at which the daily recurrence spawn fires.
    #[serde(default = "default_spawn_minute")]
    pub spawn_minute: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            spawn_hour: 0,
            spawn_minute: default_spawn_minute(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.hearth/hearth.db", home)
}
fn default_spawn_minute() -> u8 {
    1
}

impl HearthConfig {
    /// Load config from a TOML file with HEARTH_* env var overrides.
    ///
    /// Checks the explicit path argument first, then ~/.hearth/hearth.toml.
    /// A missing file is fine — figment fills in the defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: HearthConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HEARTH_").split("_"))
            .extract()
            .map_err(|e| crate::error::HearthError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.hearth/hearth.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = HearthConfig::default();
        assert_eq!(cfg.server.port, DEFAULT_PORT);
        assert_eq!(cfg.scheduler.spawn_hour, 0);
        assert_eq!(cfg.scheduler.spawn_minute, 1);
        assert!(cfg.database.path.ends_with("hearth.db"));
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let cfg = HearthConfig::load(Some("/nonexistent/hearth.toml")).expect("load failed");
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
    }
}
