//! Configuration management.
//!
//! Configuration is read from `~/.config/trawler/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod targets;

pub use targets::TargetsConfig;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;
use crate::providers::ProvidersConfig;
use crate::scraper::ScraperConfig;
use crate::suggest::SuggestConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub scraper: ScraperConfig,
    pub suggest: SuggestConfig,
    pub providers: ProvidersConfig,
    pub targets: TargetsConfig,
}

impl Config {
    /// Load configuration from the default path, creating it when missing.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Missing fields fall back to their defaults; an unreadable or invalid
    /// file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// `~/.config/trawler/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("trawler").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn default_config_content() -> String {
        r##"# Trawler Configuration
#
# Every key is optional; anything left out keeps the value shown here.

[engine]
# Batch tasks running at once within one improvement run
concurrency = 100

# Batch tasks submitted together; the next window waits for this one
window_size = 500

# Seeds read per batch
batch_size = 5

[scraper]
# Outbound page fetches in flight at once, shared by every strategy
max_concurrency = 200

# Per-request timeout in seconds
timeout_secs = 15

# Larger bodies are truncated (bytes)
max_body_bytes = 5242880

[suggest]
# Tokens longer than this are ignored when building n-grams
max_token_len = 16

# Top n-grams looked up per page
max_suggestions = 5

# Pages mined at once within one batch
concurrency = 5

[providers]
suggest_endpoint = "https://duckduckgo.com/ac/"
search_endpoint = "https://html.duckduckgo.com/html/"
max_results = 10

# Front pages used by the list and secure-provider strategies.
# Uncomment a list to replace its built-in default.
[targets]
# news = ["https://www.reuters.com/", "https://apnews.com/"]
# shopping = ["https://www.ebay.com/"]
# devs = ["https://news.ycombinator.com/"]
# wikipedia = ["https://en.wikipedia.org/wiki/Main_Page"]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
