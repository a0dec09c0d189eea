//! Engine configuration.
//!
//! Resolved from an optional TOML file with environment variable overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{InsightError, InsightResult};

/// Largest number of rows a query may produce.
pub const DEFAULT_MAX_RESULTS: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one durable file per dataset
    pub data_dir: PathBuf,
    /// Queries producing more rows than this fail with `ResultTooLarge`
    pub max_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Config {
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load config from a TOML file, with environment variable overrides.
    /// Falls back to defaults if the file is not found. INSIGHT_CONFIG overrides the path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> InsightResult<Self> {
        let cfg_path = env::var("INSIGHT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        let mut cfg = match fs::read_to_string(&cfg_path) {
            Ok(s) => Self::parse(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e.into()),
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn parse(contents: &str) -> InsightResult<Self> {
        let cfg: Config =
            toml::from_str(contents).map_err(|e| InsightError::Config(e.to_string()))?;
        if cfg.max_results == 0 {
            return Err(InsightError::Config("max_results must be positive".into()));
        }
        Ok(cfg)
    }

    /// Apply INSIGHT_* environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("INSIGHT_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }

        if let Ok(v) = env::var("INSIGHT_MAX_RESULTS")
            && let Ok(n) = v.parse::<usize>()
            && n > 0
        {
            self.max_results = n;
        }
    }
}
