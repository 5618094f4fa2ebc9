use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variables read by [`Config::apply_env`], in the order they are documented.
pub const ENV_VARS: &[&str] = &[
    "KODI_DB_HOST",
    "KODI_DB_PORT",
    "KODI_DB_USER",
    "KODI_DB_PASSWORD",
    "KODI_DB_NAME",
    "JELLYFIN_DB_PATH",
    "JELLYFIN_USER_ID",
    "PLAYSYNC_MATCH_POLICY",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{field}' (set {env_var} or add it to the config file)")]
    Missing {
        field: &'static str,
        env_var: &'static str,
    },
    #[error("invalid value '{value}' for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceDbConfig,
    #[serde(default)]
    pub target: TargetDbConfig,
    #[serde(default)]
    pub sync: SyncOptions,
}

/// Connection settings for the source (Kodi) MySQL video database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDbConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_mysql_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
}

/// Location of the target (Jellyfin) SQLite library file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetDbConfig {
    #[serde(default)]
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Target user whose watch state is written
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

/// How to pick one target item when several paths contain the source path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// First row in the target store's default order (not guaranteed stable)
    StoreOrder,
    /// Shortest stored path, ties broken by path order
    #[default]
    ShortestPath,
}

impl MatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::StoreOrder => "store-order",
            MatchPolicy::ShortestPath => "shortest-path",
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "store-order" | "store_order" | "first" => Ok(MatchPolicy::StoreOrder),
            "shortest-path" | "shortest_path" | "shortest" => Ok(MatchPolicy::ShortestPath),
            other => Err(format!("unknown match policy '{}', use 'store-order' or 'shortest-path'", other)),
        }
    }
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_user_id() -> i64 {
    1
}

impl Default for SourceDbConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_mysql_port(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            match_policy: MatchPolicy::default(),
        }
    }
}

impl Config {
    /// Load the effective configuration: file (if present), then process
    /// environment on top, then validation.
    ///
    /// A missing file is only an error when `required` is set, i.e. the path
    /// was given explicitly on the command line.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let config = Self::resolve(path, required)?;
        config.validate()?;
        Ok(config)
    }

    /// Same layering as [`Config::load`] without the final validation, for display.
    pub fn resolve(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let mut config = if required || path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay values from an environment lookup. Unset or empty variables leave
    /// the current value alone.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("KODI_DB_HOST") {
            self.source.host = host;
        }
        if let Some(port) = get("KODI_DB_PORT") {
            self.source.port = port.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                field: "source.port",
                value: port.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(user) = get("KODI_DB_USER") {
            self.source.user = user;
        }
        if let Some(password) = lookup("KODI_DB_PASSWORD") {
            self.source.password = password;
        }
        if let Some(database) = get("KODI_DB_NAME") {
            self.source.database = database;
        }
        if let Some(path) = get("JELLYFIN_DB_PATH") {
            self.target.database_path = PathBuf::from(path);
        }
        if let Some(user_id) = get("JELLYFIN_USER_ID") {
            self.sync.user_id = user_id.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                field: "sync.user_id",
                value: user_id.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(policy) = get("PLAYSYNC_MATCH_POLICY") {
            self.sync.match_policy = policy.parse().map_err(|reason| ConfigError::Invalid {
                field: "sync.match_policy",
                value: policy.clone(),
                reason,
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.host.trim().is_empty() {
            return Err(ConfigError::Missing { field: "source.host", env_var: "KODI_DB_HOST" });
        }
        if self.source.port == 0 {
            return Err(ConfigError::Invalid {
                field: "source.port",
                value: "0".to_string(),
                reason: "port must be non-zero".to_string(),
            });
        }
        if self.source.user.trim().is_empty() {
            return Err(ConfigError::Missing { field: "source.user", env_var: "KODI_DB_USER" });
        }
        if self.source.database.trim().is_empty() {
            return Err(ConfigError::Missing { field: "source.database", env_var: "KODI_DB_NAME" });
        }
        if self.target.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing { field: "target.database_path", env_var: "JELLYFIN_DB_PATH" });
        }
        Ok(())
    }

}
