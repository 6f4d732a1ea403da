//! Command-line configuration loaded from ~/.hedyc/config.yaml.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Lines printed ahead of generated code when `prelude` is enabled.
pub const PRELUDE: &[&str] = &[
    "import random",
    "import time",
    "import turtle",
    "t = turtle.Turtle()",
];

/// Wrapper configuration loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Level used when `--level` is not given.
    #[serde(default = "default_level")]
    pub default_level: u32,
    /// Print the import prelude before generated code.
    #[serde(default)]
    pub prelude: bool,
}

fn default_level() -> u32 {
    1
}

impl Config {
    /// The standard config path.
    pub fn path() -> Option<PathBuf> {
        Some(dirs::home_dir()?.join(".hedyc").join("config.yaml"))
    }

    /// Load config from the standard path.
    /// Returns None if the file doesn't exist or doesn't parse.
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_yaml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("ignoring {}: {err}", path.display());
                None
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_level: default_level(),
            prelude: false,
        }
    }
}
