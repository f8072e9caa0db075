//! Configuration file support for paper-rename.
//!
//! Settings are read from a TOML file, then overridden by environment
//! variables of the form `PAPER_RENAME__<SECTION>__<KEY>`
//! (e.g. `PAPER_RENAME__RESOLVER__BACKEND=crossref`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [resolver]
//! backend = "doi-org"          # or "crossref"
//! timeout_secs = 10
//! mailto = "you@example.org"
//! title_search = false
//! title_match_threshold = 0.85
//!
//! [extraction]
//! max_pages = 3
//!
//! [scan]
//! recursive = false
//!
//! [naming]
//! placeholder = "Unknown"
//! max_filename_len = 200
//! max_collision_attempts = 100
//!
//! [acronyms]
//! path = "~/.config/paper-rename/acronym_map.json"   # leading ~ expands to $HOME
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use super::{config_dir, Config};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "paper-rename.toml";

const ENV_PREFIX: &str = "PAPER_RENAME";

/// Locate a config file: `./paper-rename.toml`, then the per-user config dir.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    let user = config_dir().join("config.toml");
    user.is_file().then_some(user)
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, [`find_config_file`] is
/// consulted and defaults are used when nothing is found. Environment
/// overrides apply in both cases.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigFileError> {
    let file = match path {
        Some(p) if !p.is_file() => {
            return Err(ConfigFileError::Io(format!(
                "config file not found: {}",
                p.display()
            )));
        }
        Some(p) => Some(p.to_path_buf()),
        None => find_config_file(),
    };

    let mut builder = config::Config::builder();
    if let Some(file) = &file {
        tracing::debug!(path = %file.display(), "Loading config file");
        builder = builder.add_source(
            config::File::from(file.as_path()).format(config::FileFormat::Toml),
        );
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ConfigFileError::Parse(e.to_string()))?;

    let mut config: Config = settings
        .try_deserialize()
        .map_err(|e| ConfigFileError::Parse(e.to_string()))?;
    config.acronyms.path = expand_home(&config.acronyms.path);
    Ok(config)
}

/// Replace a leading `~` component with the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
