//! Configuration management for feedfs.
//!
//! Configuration is read from `~/.config/feedfs/config.toml` unless another
//! path is given. If the file doesn't exist, a default configuration with
//! comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{Category, FeedSource, Sources};
use crate::fetcher::parallel::DEFAULT_WORKERS;
use crate::projection::RefreshPolicy;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSS placed at the top of every HTML item.
    pub style: Option<String>,
    pub refresh: RefreshPolicy,
    /// Feeds loaded concurrently during a build.
    pub workers: usize,
    pub rebuild_timeout_secs: Option<u64>,
    /// Feeds placed directly under the root.
    #[serde(rename = "feed")]
    pub feeds: Vec<Arc<FeedSource>>,
    #[serde(rename = "category")]
    pub categories: Vec<Category>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style: None,
            refresh: RefreshPolicy::default(),
            workers: DEFAULT_WORKERS,
            rebuild_timeout_secs: None,
            feeds: Vec::new(),
            categories: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.clone(),
            source: e,
        })?;
        config.validate(&config_path)?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/feedfs/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedfs").join("config.toml"))
    }

    /// Every feed URL must parse.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        for feed in self.sources().iter_feeds() {
            url::Url::parse(&feed.url).map_err(|e| ConfigError::InvalidFeedUrl {
                path: path.to_path_buf(),
                url: feed.url.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    pub fn sources(&self) -> Sources {
        Sources {
            categories: self.categories.clone(),
            feeds: self.feeds.clone(),
        }
    }

    pub fn rebuild_timeout(&self) -> Option<Duration> {
        self.rebuild_timeout_secs.map(Duration::from_secs)
    }

    /// Create a default config file with comments.
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
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# feedfs configuration
#
# Each [[feed]] becomes a directory under the root, each [[category]] a
# directory holding its own [[category.feed]] entries. Every item of a feed
# is a file named after its title.
#
# Per-feed options:
# - plaintext:  render items as .txt instead of .html
# - showlink:   include the link to the original article
# - cache:      keep the downloaded feed for cache_mins minutes (default 60)

# CSS placed at the top of every HTML item
# style = "body { font-family: sans-serif; }"

# When a directory listing rebuilds the tree:
# never | root-listing | every-listing
refresh = "root-listing"

# Feeds fetched concurrently
workers = 10

# Give up on a rebuild after this many seconds and keep the previous tree
# rebuild_timeout_secs = 120

# [[feed]]
# url = "https://blog.rust-lang.org/feed.xml"
# showlink = true
# cache = true
# cache_mins = 30

# [[category]]
# name = "News"
#
#   [[category.feed]]
#   url = "https://lwn.net/headlines/rss"
#   plaintext = true
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

    #[error("Invalid feed URL '{url}' in {path}: {source}")]
    InvalidFeedUrl {
        path: PathBuf,
        url: String,
        source: url::ParseError,
    },
}
