//! Catalog row sources.
//!
//! A row source yields one [`CatalogRow`] per (table, column), ordered by
//! table name then ordinal position. The order is load-bearing: the resolver
//! detects entity boundaries from it.
//!
//! - [`DuckDbSource`]: introspects a live DuckDB database
//! - [`JsonRowSource`]: replays a JSON / NDJSON catalog snapshot

mod duckdb;
mod json;

pub use self::duckdb::{DuckDbSource, CATALOG_QUERY};
pub use self::json::JsonRowSource;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Parameters of a catalog query.
///
/// Unset fields mean "source default" for database-backed sources and
/// "no filter" for snapshot sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Schema (owner) to introspect
    pub schema: Option<String>,
    /// Catalog (database) to introspect
    pub catalog: Option<String>,
}

impl CatalogQuery {
    pub fn new(schema: Option<String>, catalog: Option<String>) -> Self {
        Self { schema, catalog }
    }

    /// Whether a row belongs to the schema/catalog this query asks for.
    /// Rows that do not carry schema or catalog metadata always match.
    pub fn matches(&self, row: &CatalogRow) -> bool {
        let schema_ok = match (&self.schema, &row.table_schema) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        };
        let catalog_ok = match (&self.catalog, &row.table_catalog) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        };
        schema_ok && catalog_ok
    }
}

/// One column descriptor row from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogRow {
    pub table_catalog: Option<String>,
    #[serde(alias = "owner")]
    pub table_schema: Option<String>,
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: i64,
    #[serde(alias = "default_setting")]
    pub default_value: Option<String>,
    pub data_type: String,
    pub max_length: Option<i64>,
    /// Numeric or datetime precision
    #[serde(alias = "date_precision", alias = "numeric_precision")]
    pub precision: Option<i64>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_foreign_key: bool,
    pub foreign_key_name: Option<String>,
    pub referenced_table_name: Option<String>,
    pub referenced_column_name: Option<String>,
}

impl CatalogRow {
    /// Create a nullable, keyless column row.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        ordinal_position: i64,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            ordinal_position,
            data_type: data_type.into(),
            is_nullable: true,
            ..Default::default()
        }
    }

    /// Mark the column as (part of) the primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_unique = true;
        self.is_nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Attach foreign key linkage metadata.
    pub fn foreign_key(
        mut self,
        name: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        self.is_foreign_key = true;
        self.foreign_key_name = Some(name.into());
        self.referenced_table_name = Some(referenced_table.into());
        self.referenced_column_name = Some(referenced_column.into());
        self
    }
}

/// A producer of catalog rows.
///
/// Sources push rows into `sink` strictly in delivery order. If `sink`
/// returns an error the source stops and returns that error.
pub trait RowSource {
    fn execute(
        &mut self,
        query: &CatalogQuery,
        sink: &mut dyn FnMut(CatalogRow) -> Result<()>,
    ) -> Result<()>;
}

/// In-memory rows, delivered in vector order.
impl RowSource for Vec<CatalogRow> {
    fn execute(
        &mut self,
        query: &CatalogQuery,
        sink: &mut dyn FnMut(CatalogRow) -> Result<()>,
    ) -> Result<()> {
        for row in self.iter().filter(|r| query.matches(r)) {
            sink(row.clone())?;
        }
        Ok(())
    }
}
