//! Schema command: print the JSON Schema of the model output.

use crate::json_schema;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn run(output: Option<PathBuf>, list: bool) -> Result<()> {
    if list {
        for name in json_schema::schema_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let schema = json_schema::get_schema("erd").context("no schema registered for model output")?;
    let content = serde_json::to_string_pretty(&schema)?;

    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", content))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Schema written to: {}", path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}
