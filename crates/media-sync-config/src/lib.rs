pub mod config;
pub mod paths;

pub use config::{Config, ConfigError, MatchPolicy, SourceDbConfig, SyncOptions, TargetDbConfig, ENV_VARS};
pub use paths::{PathManager, container_base_path};
