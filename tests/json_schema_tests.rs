//! Verifies that `analyze --format json` output matches the schema printed
//! by the `schema` subcommand.

use jsonschema::Validator;
use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn sql_erd_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sql-erd"))
}

fn load_schema() -> Validator {
    let output = sql_erd_bin().arg("schema").output().unwrap();
    assert!(output.status.success());
    let schema: Value = serde_json::from_slice(&output.stdout).expect("Invalid schema JSON");
    Validator::new(&schema).expect("Failed to compile schema")
}

fn validate(json: &Value) {
    let validator = load_schema();
    if let Err(error) = validator.validate(json) {
        panic!(
            "JSON output doesn't match schema: {}\n\nOutput was:\n{}",
            error,
            serde_json::to_string_pretty(json).unwrap()
        );
    }
}

fn analyze_json(dir: &TempDir, ddl: &str) -> Value {
    let script = dir.path().join("schema.sql");
    fs::write(&script, ddl).unwrap();

    let output = sql_erd_bin()
        .args(["analyze", "--init-sql"])
        .arg(&script)
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "Command failed with stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_schema_command_lists_names() {
    let output = sql_erd_bin().args(["schema", "--list"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "erd");
}

#[test]
fn test_schema_written_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("erd.schema.json");

    let output = sql_erd_bin()
        .args(["schema", "-o"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let schema: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(schema["title"], "ErdJson");
}

#[test]
fn test_analyze_output_matches_schema() {
    let dir = TempDir::new().unwrap();
    let json = analyze_json(
        &dir,
        r#"
CREATE TABLE customers (id INTEGER PRIMARY KEY, email VARCHAR(255) UNIQUE);
CREATE TABLE orders (
    id INTEGER PRIMARY KEY,
    customer_id INTEGER REFERENCES customers(id),
    total DECIMAL(10, 2) DEFAULT 0
);
"#,
    );

    validate(&json);
    assert_eq!(json["stats"]["entity_count"], 2);
    assert_eq!(json["stats"]["relationship_count"], 1);
}

#[test]
fn test_empty_model_matches_schema() {
    let dir = TempDir::new().unwrap();
    let json = analyze_json(&dir, "SELECT 1;");

    validate(&json);
    assert_eq!(json["entities"].as_array().unwrap().len(), 0);
}
