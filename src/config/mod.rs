mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::pipeline::INBOX_CAPACITY;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HORDEBROWSE_CONFIG";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from `HORDEBROWSE_CONFIG`, the default locations, or defaults
pub fn load_config_or_default() -> Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return load_config(&expand(&path));
    }

    let default_paths = [
        "./hordebrowse.toml",
        "~/.config/hordebrowse/config.toml",
        "/etc/hordebrowse/config.toml",
    ];

    for path_str in default_paths {
        let path = expand(path_str);
        if path.exists() {
            return load_config(&path);
        }
    }

    Ok(Config::default())
}

/// Expand a leading `~` in a configured path
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn validate_config(config: &Config) -> Result<()> {
    if config.bithorde.pressure == 0 {
        anyhow::bail!("bithorde.pressure must be at least 1");
    }

    if config.bithorde.pressure > INBOX_CAPACITY {
        anyhow::bail!(
            "bithorde.pressure must not exceed {} (got {})",
            INBOX_CAPACITY,
            config.bithorde.pressure
        );
    }

    if config.bithorde.socket.as_os_str().is_empty() {
        anyhow::bail!("bithorde.socket cannot be empty");
    }

    if config.browse.opener.trim().is_empty() {
        anyhow::bail!("browse.opener cannot be empty");
    }

    if !config.bithorde.fusedir.exists() {
        tracing::warn!("FUSE mount directory does not exist: {:?}", config.bithorde.fusedir);
    }

    Ok(())
}
