//! YAML project configuration.
//!
//! Every field is optional; a missing file section falls back to the default
//! project layout (`data/`, `sql/`, `ecommerce.duckdb`) and the default
//! generation settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shop_data_gen::GenerateConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Default CSV directory, relative to the project root
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default query directory, relative to the project root
pub const DEFAULT_SQL_DIR: &str = "sql";
/// Default database file, relative to the project root
pub const DEFAULT_DATABASE: &str = "ecommerce.duckdb";

/// Artifact locations; relative paths are resolved against the project root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub sql_dir: PathBuf,
    pub database: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            sql_dir: PathBuf::from(DEFAULT_SQL_DIR),
            database: PathBuf::from(DEFAULT_DATABASE),
        }
    }
}

/// Complete YAML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Where CSVs, queries and the database live
    pub paths: PathsConfig,
    /// Dataset generation settings
    pub generate: GenerateConfig,
}

impl ProjectConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;
        let config: ProjectConfig = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Resolve artifact paths against `root`
    pub fn resolve_paths(&self, root: &Path) -> ProjectPaths {
        ProjectPaths {
            data_dir: root.join(&self.paths.data_dir),
            sql_dir: root.join(&self.paths.sql_dir),
            database: root.join(&self.paths.database),
        }
    }
}

/// Resolved artifact locations for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectPaths {
    pub data_dir: PathBuf,
    pub sql_dir: PathBuf,
    pub database: PathBuf,
}

impl ProjectPaths {
    /// Default layout under `root`
    pub fn under(root: &Path) -> Self {
        ProjectConfig::default().resolve_paths(root)
    }

    /// Replace any location given on the command line
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        sql_dir: Option<PathBuf>,
        database: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = sql_dir {
            self.sql_dir = dir;
        }
        if let Some(db) = database {
            self.database = db;
        }
        self
    }
}
