//! Configuration management.
//!
//! Every section has defaults, so an absent config file yields a working
//! setup. See [`file_config`] for the file format and lookup order.

pub mod file_config;

pub use file_config::{expand_home, find_config_file, load_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub acronyms: AcronymsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which metadata service resolves DOIs
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum ResolverBackend {
    /// CSL-JSON content negotiation at doi.org
    #[default]
    #[serde(rename = "doi-org")]
    #[value(name = "doi-org")]
    DoiOrg,

    /// CrossRef REST API
    #[serde(rename = "crossref")]
    #[value(name = "crossref")]
    CrossRef,
}

/// Metadata lookup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub backend: ResolverBackend,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Contact address sent in the user agent (CrossRef polite pool)
    #[serde(default)]
    pub mailto: Option<String>,

    /// Search CrossRef by title when no DOI could be used
    #[serde(default)]
    pub title_search: bool,

    /// Minimum title similarity (0..=1) for accepting a title-search hit
    #[serde(default = "default_title_match_threshold")]
    pub title_match_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            backend: ResolverBackend::default(),
            timeout_secs: default_timeout_secs(),
            mailto: None,
            title_search: false,
            title_match_threshold: default_title_match_threshold(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_title_match_threshold() -> f64 {
    0.85
}

/// PDF text extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Number of leading pages searched for a DOI
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

fn default_max_pages() -> usize {
    3
}

/// Directory scanning settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
}

/// Filename composition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Stand-in for an unknown year or venue
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Upper bound on a composed filename, extension included
    #[serde(default = "default_max_filename_len")]
    pub max_filename_len: usize,

    /// Highest `-N` disambiguator tried before giving up
    #[serde(default = "default_max_collision_attempts")]
    pub max_collision_attempts: u32,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            max_filename_len: default_max_filename_len(),
            max_collision_attempts: default_max_collision_attempts(),
        }
    }
}

fn default_placeholder() -> String {
    "Unknown".to_string()
}

fn default_max_filename_len() -> usize {
    200
}

fn default_max_collision_attempts() -> u32 {
    100
}

/// Acronym map location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcronymsConfig {
    #[serde(default = "default_acronyms_path")]
    pub path: PathBuf,
}

impl Default for AcronymsConfig {
    fn default() -> Self {
        Self {
            path: default_acronyms_path(),
        }
    }
}

fn default_acronyms_path() -> PathBuf {
    config_dir().join("acronym_map.json")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Per-user directory holding the config file and acronym map
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paper-rename")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.resolver.backend, ResolverBackend::DoiOrg);
        assert_eq!(config.resolver.timeout_secs, 10);
        assert!(!config.resolver.title_search);
        assert_eq!(config.extraction.max_pages, 3);
        assert!(!config.scan.recursive);
        assert_eq!(config.naming.placeholder, "Unknown");
        assert_eq!(config.naming.max_filename_len, 200);
        assert_eq!(config.naming.max_collision_attempts, 100);
        assert!(config.acronyms.path.ends_with("paper-rename/acronym_map.json"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_backend_names() {
        let config: ResolverConfig = toml::from_str(r#"backend = "crossref""#).unwrap();
        assert_eq!(config.backend, ResolverBackend::CrossRef);

        let config: ResolverConfig = toml::from_str(r#"backend = "doi-org""#).unwrap();
        assert_eq!(config.backend, ResolverBackend::DoiOrg);

        assert!(toml::from_str::<ResolverConfig>(r#"backend = "scholar""#).is_err());
    }
}
