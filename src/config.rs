//! Site configuration.
//!
//! Loaded from an optional `site.toml` in the content root. Every field has
//! a stock default, so a content directory with no config file builds as-is;
//! a config file only needs the values it wants to override:
//!
//! ```toml
//! title = "Field Notes"          # Site title (default: content dir name)
//! owner = "The Expedition"       # Shown in the page footer
//! sort = "published-first"       # Homepage/listing order
//! preview_length = 200           # Preview budget in characters
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

pub const CONFIG_FILE: &str = "site.toml";

/// Order applied to article listings (homepage and `list`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Lexicographic by resolved title.
    #[default]
    Title,
    /// Pinned articles first, then by title.
    Pinned,
    /// Most recently published first.
    PublishedFirst,
    /// Oldest published first.
    PublishedLast,
    /// Least recently edited first.
    Edited,
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title. Falls back to root metadata, then the directory name.
    pub title: Option<String>,
    /// Owner line shown in the footer.
    pub owner: Option<String>,
    /// Default listing order; the CLI `--sort` flag overrides it.
    pub sort: SortOrder,
    /// Character budget for article previews on listing pages.
    pub preview_length: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: None,
            owner: None,
            sort: SortOrder::default(),
            preview_length: 200,
        }
    }
}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview_length == 0 {
            return Err(ConfigError::Validation(
                "preview_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Load `site.toml` from the content root, falling back to defaults when
/// the file does not exist.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    let config: SiteConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
