//! Serde data structures for the configgate settings file.
//!
//! Contains [`Settings`] (the root), [`StoreSettings`],
//! [`ReadinessConfig`] and [`ServerSettings`]. Structs use
//! `deny_unknown_fields` for strict parsing, and every field has a default
//! so an empty file is a valid starting point.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::configuration::ReadinessSettings;

fn default_name() -> String {
    "configgate".to_string()
}

fn default_root() -> String {
    "/".to_string()
}

const fn default_poll_interval() -> u64 {
    5
}

const fn default_max_wait() -> u64 {
    30
}

const fn default_readiness_poll() -> u64 {
    1
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("config")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub store: StoreSettings,

    /// Instance configuration path inside the store.
    #[serde(default = "default_root")]
    pub root: String,

    /// Seconds between store snapshots.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Paths (relative to `root`) that must exist before the service is
    /// considered configured.
    #[serde(default)]
    pub required_paths: Vec<String>,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: default_name(),
            store: StoreSettings::default(),
            root: default_root(),
            poll_interval_secs: default_poll_interval(),
            required_paths: Vec::new(),
            readiness: ReadinessConfig::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreSettings {
    Directory {
        #[serde(default = "default_store_dir")]
        path: PathBuf,
    },
    Memory,
    Redis {
        url: String,
    },
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::Directory {
            path: default_store_dir(),
        }
    }
}

impl StoreSettings {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Directory { .. } => "directory",
            Self::Memory => "memory",
            Self::Redis { .. } => "redis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessConfig {
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,

    #[serde(default = "default_readiness_poll")]
    pub poll_interval_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: default_max_wait(),
            poll_interval_secs: default_readiness_poll(),
        }
    }
}

impl From<ReadinessConfig> for ReadinessSettings {
    fn from(config: ReadinessConfig) -> Self {
        Self {
            max_wait: Duration::from_secs(config.max_wait_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
