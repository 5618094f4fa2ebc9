use crate::output::{Output, OutputFormat};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_sync_config::{Config, PathManager, ENV_VARS};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::{Path, PathBuf};

pub fn run_config(cmd: crate::ConfigCommands, config_path: Option<&Path>, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(config_path, full, output),
    }
}

/// Explicit `--config` paths must exist; the default location is optional.
fn config_location(config_path: Option<&Path>) -> (PathBuf, bool) {
    match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathManager::default().config_file(), false),
    }
}

/// Load and validate configuration before any connection is attempted.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let (path, required) = config_location(config_path);
    Config::load(&path, required).wrap_err("Invalid configuration")
}

fn show_config(config_path: Option<&Path>, full: bool, output: &Output) -> Result<()> {
    let (path, required) = config_location(config_path);
    let config = Config::resolve(&path, required)
        .wrap_err_with(|| format!("Failed to load config from {}", path.display()))?;
    let validation = config.validate();

    let password = if full {
        config.source.password.clone()
    } else {
        mask_string(&config.source.password)
    };

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            let file_note = if path.exists() {
                path.display().to_string()
            } else {
                format!("{} (not found, environment only)", path.display())
            };

            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            table.set_header(vec![
                Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
            ]);
            table.add_row(vec![Cell::new("Config File"), Cell::new(file_note)]);
            table.add_row(vec![Cell::new("Kodi Host"), Cell::new(format!("{}:{}", config.source.host, config.source.port))]);
            table.add_row(vec![Cell::new("Kodi User"), Cell::new(&config.source.user)]);
            table.add_row(vec![Cell::new("Kodi Password"), Cell::new(password)]);
            table.add_row(vec![Cell::new("Kodi Database"), Cell::new(&config.source.database)]);
            table.add_row(vec![Cell::new("Jellyfin Library"), Cell::new(config.target.database_path.display().to_string())]);
            table.add_row(vec![Cell::new("Jellyfin User Id"), Cell::new(config.sync.user_id)]);
            table.add_row(vec![Cell::new("Match Policy"), Cell::new(config.sync.match_policy.as_str())]);
            println!("{}", table);
            println!();
            println!("{} {}", "Environment:".bright_cyan(), ENV_VARS.join(", "));
            println!();

            match &validation {
                Ok(()) => output.success("Configuration is valid"),
                Err(e) => output.warn(format!("Configuration is incomplete: {}", e)),
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": path.display().to_string(),
                "config_file_exists": path.exists(),
                "source": {
                    "host": config.source.host,
                    "port": config.source.port,
                    "user": config.source.user,
                    "password": password,
                    "database": config.source.database,
                },
                "target": {
                    "database_path": config.target.database_path.display().to_string(),
                },
                "sync": {
                    "user_id": config.sync.user_id,
                    "match_policy": config.sync.match_policy.as_str(),
                },
                "valid": validation.is_ok(),
                "error": validation.as_ref().err().map(|e| e.to_string()),
            }));
        }
    }

    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        "*".repeat(chars.len())
    } else {
        let visible: String = chars[..2].iter().collect();
        format!("{}{}", visible, "*".repeat(chars.len() - 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "(not set)");
        assert_eq!(mask_string("abc"), "***");
        assert_eq!(mask_string("hunter22"), "hu******");
    }

    #[test]
    fn test_explicit_config_path_is_required() {
        let (path, required) = config_location(Some(Path::new("/etc/playsync.toml")));
        assert_eq!(path, PathBuf::from("/etc/playsync.toml"));
        assert!(required);
    }
}
