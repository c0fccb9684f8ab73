//! Error taxonomy for catalog analysis.
//!
//! Data-quality problems (dangling foreign keys, incomplete FK metadata) are
//! not errors: the resolver absorbs them as warnings. Everything here aborts
//! the current run.

use thiserror::Error;

/// Errors that abort an analysis run.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The row source failed (query execution, connection, I/O, malformed rows).
    #[error("catalog row source failed: {message}")]
    Source {
        /// What the source was doing when it failed.
        message: String,
        /// Underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A relationship was constructed from a non-FK column or without a target.
    /// Indicates a resolver bug, never bad catalog data.
    #[error("invalid relationship '{name}': {reason}")]
    InvalidRelationship { name: String, reason: String },

    /// Any other internal precondition violation.
    #[error("internal error: {0}")]
    Internal(String),

    /// Rows for one table were not delivered contiguously.
    #[error(
        "rows for table '{table}' are not contiguous; the row source must order rows by table name then ordinal position"
    )]
    NonContiguousTable { table: String },

    /// The target model already has an entity with this name.
    #[error("entity '{name}' already exists in the target model")]
    EntityExists { name: String },

    /// The run observed its cancel flag.
    #[error("analysis cancelled")]
    Cancelled,

    /// Connection options could not be loaded or are inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnalyzeError {
    /// Wrap a transport-level failure.
    pub fn source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AnalyzeError::Source {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// True for errors caused by the row source rather than the resolver.
    pub fn is_transport(&self) -> bool {
        matches!(self, AnalyzeError::Source { .. })
    }
}

impl From<duckdb::Error> for AnalyzeError {
    fn from(e: duckdb::Error) -> Self {
        AnalyzeError::source("DuckDB query failed", e)
    }
}

pub type Result<T, E = AnalyzeError> = std::result::Result<T, E>;
