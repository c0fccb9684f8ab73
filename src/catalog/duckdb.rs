//! DuckDB-backed catalog row source.

use super::{CatalogQuery, CatalogRow, RowSource};
use crate::error::{AnalyzeError, Result};
use duckdb::{params, Connection};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Column descriptors joined with key and foreign key metadata.
///
/// Parameters: `$1` schema, `$2` catalog. Each FK column yields one row per
/// constraint it takes part in. A column counts as unique when it is part of
/// the primary key or is the only column of a UNIQUE constraint.
pub const CATALOG_QUERY: &str = r#"
WITH key_columns AS (
    SELECT table_name,
           column_name,
           bool_or(constraint_type = 'PRIMARY KEY') AS is_primary_key,
           bool_or(constraint_type = 'PRIMARY KEY' OR key_width = 1) AS is_unique
    FROM (
        SELECT table_name,
               constraint_type,
               len(constraint_column_names) AS key_width,
               UNNEST(constraint_column_names) AS column_name
        FROM duckdb_constraints()
        WHERE schema_name = $1
          AND database_name = $2
          AND constraint_type IN ('PRIMARY KEY', 'UNIQUE')
    )
    GROUP BY table_name, column_name
),
fk_columns AS (
    SELECT table_name,
           constraint_name AS foreign_key_name,
           referenced_table AS referenced_table_name,
           UNNEST(constraint_column_names) AS column_name,
           UNNEST(referenced_column_names) AS referenced_column_name
    FROM duckdb_constraints()
    WHERE schema_name = $1
      AND database_name = $2
      AND constraint_type = 'FOREIGN KEY'
)
SELECT col.table_catalog,
       col.table_schema,
       col.table_name,
       col.column_name,
       CAST(col.ordinal_position AS BIGINT) AS ordinal_position,
       col.column_default AS default_value,
       col.data_type,
       CAST(col.character_maximum_length AS BIGINT) AS max_length,
       CAST(COALESCE(col.numeric_precision, col.datetime_precision) AS BIGINT) AS precision,
       col.is_nullable = 'YES' AS is_nullable,
       COALESCE(k.is_primary_key, false) AS is_primary_key,
       COALESCE(k.is_unique, false) AS is_unique,
       fk.referenced_table_name IS NOT NULL AS is_foreign_key,
       fk.foreign_key_name,
       fk.referenced_table_name,
       fk.referenced_column_name
FROM information_schema.columns AS col
LEFT JOIN key_columns AS k
  ON k.table_name = col.table_name
 AND k.column_name = col.column_name
LEFT JOIN fk_columns AS fk
  ON fk.table_name = col.table_name
 AND fk.column_name = col.column_name
WHERE col.table_schema = $1
  AND col.table_catalog = $2
ORDER BY col.table_name, col.ordinal_position, fk.foreign_key_name
"#;

/// Reads catalog rows from a DuckDB database.
pub struct DuckDbSource {
    conn: Connection,
}

impl DuckDbSource {
    /// Open a database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            AnalyzeError::source(format!("failed to open database {}", path.display()), e)
        })?;
        Ok(Self { conn })
    }

    /// Open an empty in-memory database, typically followed by [`Self::run_script`].
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AnalyzeError::source("failed to create in-memory database", e))?;
        Ok(Self { conn })
    }

    /// Open `":memory:"` or a file path.
    pub fn open_target(target: &str) -> Result<Self> {
        if target.is_empty() || target == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(Path::new(target))
        }
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Execute a batch of SQL statements (e.g. DDL) before introspection.
    pub fn run_script(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| AnalyzeError::source("failed to execute init script", e))
    }

    pub fn run_script_file(&self, path: &Path) -> Result<()> {
        let sql = fs::read_to_string(path).map_err(|e| {
            AnalyzeError::source(format!("failed to read init script {}", path.display()), e)
        })?;
        debug!(script = %path.display(), "running init script");
        self.run_script(&sql)
    }

    /// Name of the connection's current catalog.
    pub fn current_database(&self) -> Result<String> {
        let name = self
            .conn
            .query_row("SELECT current_database()", [], |row| row.get(0))?;
        Ok(name)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RowSource for DuckDbSource {
    fn execute(
        &mut self,
        query: &CatalogQuery,
        sink: &mut dyn FnMut(CatalogRow) -> Result<()>,
    ) -> Result<()> {
        let schema = query.schema.clone().unwrap_or_else(|| "main".to_string());
        let catalog = match &query.catalog {
            Some(c) => c.clone(),
            None => self.current_database()?,
        };
        debug!(%schema, %catalog, "executing catalog query");

        let mut stmt = self.conn.prepare(CATALOG_QUERY)?;
        let mut rows = stmt.query(params![schema, catalog])?;

        while let Some(row) = rows.next()? {
            sink(read_row(row)?)?;
        }

        Ok(())
    }
}

fn read_row(row: &duckdb::Row<'_>) -> duckdb::Result<CatalogRow> {
    Ok(CatalogRow {
        table_catalog: row.get(0)?,
        table_schema: row.get(1)?,
        table_name: row.get(2)?,
        column_name: row.get(3)?,
        ordinal_position: row.get(4)?,
        default_value: row.get(5)?,
        data_type: row.get(6)?,
        max_length: row.get(7)?,
        precision: row.get(8)?,
        is_nullable: row.get(9)?,
        is_primary_key: row.get(10)?,
        is_unique: row.get(11)?,
        is_foreign_key: row.get(12)?,
        foreign_key_name: row.get(13)?,
        referenced_table_name: row.get(14)?,
        referenced_column_name: row.get(15)?,
    })
}
