//! JSON Schema generation for the model's JSON output.
//!
//! Schemas are generated with schemars and exported via the `schema` subcommand.

use schemars::{schema_for, Schema};
use std::collections::BTreeMap;

/// Returns all JSON schemas, keyed by name.
/// BTreeMap keeps the ordering deterministic for diffable output.
pub fn all_schemas() -> BTreeMap<&'static str, Schema> {
    let mut schemas = BTreeMap::new();

    // analyze --format json
    schemas.insert("erd", schema_for!(crate::writer::ErdJson));

    schemas
}

/// Generate a single schema by name.
pub fn get_schema(name: &str) -> Option<Schema> {
    all_schemas().remove(name)
}

/// List all available schema names.
pub fn schema_names() -> Vec<&'static str> {
    all_schemas().keys().copied().collect()
}
