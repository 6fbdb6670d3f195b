use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

pub const DEFAULT_HISTORY_FILE: &str = "log/mapping_history.csv";
pub const DEFAULT_STATS_FILE: &str = "config.json";

/// Paths and display settings handed to [`MappingSession`](crate::session::MappingSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub history_file: PathBuf,
    pub stats_file: PathBuf,
    /// Distinct values shown next to each source column.
    pub sample_values: usize,
    /// Distinct values shown per mapping in the mapping preview.
    pub preview_samples: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            stats_file: PathBuf::from(DEFAULT_STATS_FILE),
            sample_values: crate::profile::DEFAULT_MAX_SAMPLES,
            preview_samples: 2,
        }
    }
}

impl AppConfig {
    /// Loads a YAML config file; unspecified keys keep their defaults.
    pub fn load(path: &Path) -> MapperResult<Self> {
        let raw = fs::read_to_string(path).map_err(|err| config_error(path, err))?;
        let config: AppConfig = serde_yaml::from_str(&raw).map_err(|err| config_error(path, err))?;
        debug!("Loaded configuration from {path:?}: {config:?}");
        Ok(config)
    }

    /// Rooted at `dir`: history and statistics files live beneath it.
    pub fn in_directory(dir: &Path) -> Self {
        Self {
            history_file: dir.join(DEFAULT_HISTORY_FILE),
            stats_file: dir.join(DEFAULT_STATS_FILE),
            ..Self::default()
        }
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if let Some(parent) = self.history_file.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn config_error(path: &Path, err: impl Into<crate::error::BoxError>) -> MapperError {
    MapperError::Config {
        path: path.to_path_buf(),
        source: err.into(),
    }
}
