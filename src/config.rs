//! Connection options for catalog analysis.
//!
//! Options can be loaded from a YAML file and then overridden from the
//! command line:
//!
//! ```yaml
//! database: shop.duckdb
//! owner: main
//! catalog: shop
//! init_sql:
//!   - schema.sql
//! progress_interval_secs: 8
//! ```

use crate::catalog::CatalogQuery;
use crate::error::{AnalyzeError, Result};
use crate::progress::DEFAULT_PROGRESS_INTERVAL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where and what to introspect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// DuckDB database file, or `:memory:`
    pub database: Option<String>,
    /// Schema to introspect
    #[serde(alias = "schema")]
    pub owner: Option<String>,
    /// Catalog (database name) to introspect
    pub catalog: Option<String>,
    /// Fallback for both owner and catalog when they are not set
    pub user_name: Option<String>,
    /// SQL scripts executed before introspection, in order
    pub init_sql: Vec<PathBuf>,
    /// Seconds between "in progress" notifications
    pub progress_interval_secs: Option<u64>,
}

impl ConnectionOptions {
    /// Load options from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyzeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let options: ConnectionOptions = serde_yaml_ng::from_str(&content).map_err(|e| {
            AnalyzeError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Ok(options)
    }

    /// Schema parameter: owner, else user name
    pub fn schema(&self) -> Option<String> {
        self.owner.clone().or_else(|| self.user_name.clone())
    }

    /// Catalog parameter: catalog, else user name
    pub fn catalog_name(&self) -> Option<String> {
        self.catalog.clone().or_else(|| self.user_name.clone())
    }

    /// Catalog query parameters derived from these options
    pub fn query(&self) -> CatalogQuery {
        CatalogQuery::new(self.schema(), self.catalog_name())
    }

    pub fn progress_interval(&self) -> Duration {
        self.progress_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PROGRESS_INTERVAL)
    }

    /// Overlay values that are set in `other`.
    pub fn merge(mut self, other: ConnectionOptions) -> Self {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.owner.is_some() {
            self.owner = other.owner;
        }
        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }
        if other.user_name.is_some() {
            self.user_name = other.user_name;
        }
        if !other.init_sql.is_empty() {
            self.init_sql.extend(other.init_sql);
        }
        if other.progress_interval_secs.is_some() {
            self.progress_interval_secs = other.progress_interval_secs;
        }
        self
    }

    /// Name for the resulting model: the database file stem, or "memory".
    pub fn model_name(&self) -> String {
        match self.database.as_deref() {
            None | Some("") | Some(":memory:") => "memory".to_string(),
            Some(path) => Path::new(path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(path)
                .to_string(),
        }
    }
}
