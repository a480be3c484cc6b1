use hordebrowse_common::SortKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub bithorde: BithordeConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub browse: BrowseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BithordeConfig {
    /// Unix socket of the local bithorde daemon
    #[serde(default = "default_socket")]
    pub socket: PathBuf,

    /// Mount point of the bithorde FUSE filesystem
    #[serde(default = "default_fusedir")]
    pub fusedir: PathBuf,

    /// Maximum number of concurrently outstanding lookups
    #[serde(default = "default_pressure")]
    pub pressure: usize,

    /// How long to wait for the daemon connection at startup
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_socket() -> PathBuf {
    PathBuf::from("/tmp/bithorde")
}

fn default_fusedir() -> PathBuf {
    PathBuf::from("/tmp/bhfuse")
}

fn default_pressure() -> usize {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for BithordeConfig {
    fn default() -> Self {
        Self {
            socket: default_socket(),
            fusedir: default_fusedir(),
            pressure: default_pressure(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite metadata database; `~` is expanded
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "~/.local/share/hordebrowse/metadata.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowseConfig {
    #[serde(default)]
    pub sort: SortKey,

    /// Program used to open assets from the mount
    #[serde(default = "default_opener")]
    pub opener: String,
}

fn default_opener() -> String {
    "xdg-open".to_string()
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            sort: SortKey::default(),
            opener: default_opener(),
        }
    }
}
