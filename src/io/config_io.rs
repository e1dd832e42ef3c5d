use std::fs;
use std::path::PathBuf;

use crate::io::store::Store;
use crate::model::config::Config;
use crate::model::path::CONFIG_FILE;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load the optional configuration file at the base directory root.
/// A missing file yields the defaults.
pub fn load_config(store: &Store) -> Result<Config, ConfigError> {
    let fp = store.base().join(CONFIG_FILE);
    if !fp.is_file() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&fp).map_err(|e| ConfigError::Read {
        path: fp.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse { path: fp, source: e })
}
