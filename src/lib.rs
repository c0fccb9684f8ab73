//! Build an entity-relationship model from a relational database catalog.
//!
//! Catalog rows (one per table column, with key and foreign key metadata)
//! are streamed through a two-phase resolver: phase 1 creates entities and
//! columns and records references whose target has not been seen yet,
//! phase 2 resolves them once every table is known.
//!
//! ```no_run
//! use sql_erd::{analyze, ConnectionOptions, ErModel, NoProgress};
//!
//! let options = ConnectionOptions {
//!     database: Some("shop.duckdb".into()),
//!     ..Default::default()
//! };
//! let mut model = ErModel::new(options.model_name());
//! analyze(&options, &mut model, &NoProgress)?;
//! println!("{}", sql_erd::writer::to_mermaid(&model));
//! # Ok::<(), sql_erd::AnalyzeError>(())
//! ```

// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod error;
pub mod json_schema;
pub mod model;
pub mod progress;
pub mod resolver;
pub mod writer;

pub use analyzer::{analyze, open_source, Analysis, Analyzer, CancelFlag};
pub use catalog::{CatalogQuery, CatalogRow, DuckDbSource, JsonRowSource, RowSource};
pub use config::ConnectionOptions;
pub use error::{AnalyzeError, Result};
pub use model::{Cardinality, ErModel};
pub use progress::{NoProgress, Notification, ProgressSink, Severity};
pub use resolver::{ResolveReport, SchemaResolver};
