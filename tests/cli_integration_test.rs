//! Integration tests for the sql-erd binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn sql_erd_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sql-erd"))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// NDJSON catalog snapshot: accounts references users, which comes later.
fn write_rows(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("catalog.ndjson");
    fs::write(
        &path,
        r#"{"table_name":"accounts","column_name":"id","ordinal_position":1,"data_type":"INTEGER","is_primary_key":true,"is_unique":true}
{"table_name":"accounts","column_name":"user_id","ordinal_position":2,"data_type":"INTEGER","is_nullable":true,"is_foreign_key":true,"foreign_key_name":"fk_accounts_user","referenced_table_name":"users","referenced_column_name":"id"}

{"table_name":"users","column_name":"id","ordinal_position":1,"data_type":"INTEGER","is_primary_key":true,"is_unique":true}
{"table_name":"users","column_name":"email","ordinal_position":2,"data_type":"VARCHAR","max_length":255,"is_nullable":true}
"#,
    )
    .unwrap();
    path
}

fn write_ddl(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("schema.sql");
    fs::write(
        &path,
        r#"
CREATE TABLE users (id INTEGER PRIMARY KEY, email VARCHAR);
CREATE TABLE posts (
    id INTEGER PRIMARY KEY,
    author_id INTEGER REFERENCES users(id),
    title VARCHAR NOT NULL
);
"#,
    )
    .unwrap();
    path
}

mod rows_source {
    use super::*;

    #[test]
    fn test_rows_to_json() {
        let dir = TempDir::new().unwrap();
        let rows = write_rows(&dir);

        let output = sql_erd_bin().arg("analyze").arg("--rows").arg(&rows).output().unwrap();
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["name"], "catalog");
        assert_eq!(json["stats"]["entity_count"], 2);
        assert_eq!(json["stats"]["relationship_count"], 1);
        assert_eq!(json["relationships"][0]["name"], "fk_accounts_user");
        assert_eq!(json["relationships"][0]["to_entity"], "users");
    }

    #[test]
    fn test_rows_array_to_mermaid_file() {
        let dir = TempDir::new().unwrap();
        let rows = dir.path().join("catalog.json");
        fs::write(
            &rows,
            r#"[
  {"table_name": "a", "column_name": "id", "ordinal_position": 1, "data_type": "INTEGER", "is_primary_key": true},
  {"table_name": "b", "column_name": "a_id", "ordinal_position": 1, "data_type": "INTEGER",
   "is_foreign_key": true, "foreign_key_name": "fk_b_a", "referenced_table_name": "a", "referenced_column_name": "id"}
]"#,
        )
        .unwrap();
        let out = dir.path().join("erd.mmd");

        let output = sql_erd_bin()
            .arg("analyze")
            .arg("--rows")
            .arg(&rows)
            .arg("-o")
            .arg(&out)
            .output()
            .unwrap();
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let content = fs::read_to_string(&out).unwrap();
        assert!(content.contains("erDiagram"));
        assert!(content.contains("b }o--|| a : \"a_id\""));
        assert!(stderr(&output).contains("2 entities"));
        assert!(stderr(&output).contains("0 warnings"));
    }

    #[test]
    fn test_dangling_reference_warns() {
        let dir = TempDir::new().unwrap();
        let rows = dir.path().join("dangling.ndjson");
        fs::write(
            &rows,
            r#"{"table_name":"orders","column_name":"ghost_id","ordinal_position":1,"data_type":"INTEGER","is_foreign_key":true,"foreign_key_name":"fk_ghost","referenced_table_name":"ghosts","referenced_column_name":"id"}
"#,
        )
        .unwrap();

        let output = sql_erd_bin().arg("analyze").arg("--rows").arg(&rows).output().unwrap();
        assert!(output.status.success());
        assert!(stderr(&output).contains("warning: reference 'fk_ghost' cannot be resolved"));

        let summary = sql_erd_bin()
            .args(["analyze", "-f", "mermaid", "--rows"])
            .arg(&rows)
            .output()
            .unwrap();
        assert!(summary.status.success());
        assert!(stderr(&summary).contains("1 entities, 1 columns, 0 relationships, 1 warnings"));

        let strict = sql_erd_bin()
            .arg("analyze")
            .arg("--rows")
            .arg(&rows)
            .arg("--strict")
            .output()
            .unwrap();
        assert!(!strict.status.success());
        assert!(stderr(&strict).contains("could not be resolved"));
    }

    #[test]
    fn test_non_contiguous_rows_fail() {
        let dir = TempDir::new().unwrap();
        let rows = dir.path().join("unordered.ndjson");
        fs::write(
            &rows,
            r#"{"table_name":"a","column_name":"id","ordinal_position":1,"data_type":"INTEGER"}
{"table_name":"b","column_name":"id","ordinal_position":1,"data_type":"INTEGER"}
{"table_name":"a","column_name":"name","ordinal_position":2,"data_type":"VARCHAR"}
"#,
        )
        .unwrap();

        let output = sql_erd_bin().arg("analyze").arg("--rows").arg(&rows).output().unwrap();
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("not contiguous"));
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let dir = TempDir::new().unwrap();
        let rows = dir.path().join("bad.ndjson");
        fs::write(
            &rows,
            "{\"table_name\":\"a\",\"column_name\":\"id\",\"data_type\":\"INTEGER\"}\n{not json}\n",
        )
        .unwrap();

        let output = sql_erd_bin().arg("analyze").arg("--rows").arg(&rows).output().unwrap();
        assert!(!output.status.success());
        assert!(stderr(&output).contains("bad.ndjson:2"));
    }

    #[test]
    fn test_missing_rows_file() {
        let output = sql_erd_bin()
            .args(["analyze", "--rows", "/nonexistent/catalog.ndjson"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(stderr(&output).contains("does not exist"));
    }
}

mod duckdb_source {
    use super::*;

    #[test]
    fn test_init_sql_to_dot() {
        let dir = TempDir::new().unwrap();
        let ddl = write_ddl(&dir);

        let output = sql_erd_bin()
            .arg("analyze")
            .arg("--init-sql")
            .arg(&ddl)
            .args(["--format", "dot", "--layout", "tb"])
            .output()
            .unwrap();
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let dot = stdout(&output);
        assert!(dot.contains("digraph ERD"));
        assert!(dot.contains("rankdir=TB"));
        assert!(dot.contains("posts:p1 -> users:p0"));
    }

    #[test]
    fn test_config_file() {
        let dir = TempDir::new().unwrap();
        let ddl = write_ddl(&dir);
        let config = dir.path().join("erd.yaml");
        fs::write(
            &config,
            format!("database: \":memory:\"\nschema: main\ninit_sql:\n  - {}\n", ddl.display()),
        )
        .unwrap();

        let output = sql_erd_bin()
            .arg("analyze")
            .arg("--config")
            .arg(&config)
            .output()
            .unwrap();
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["name"], "memory");
        assert_eq!(json["stats"]["entity_count"], 2);
    }

    #[test]
    fn test_database_file_persists_between_runs() {
        let dir = TempDir::new().unwrap();
        let ddl = write_ddl(&dir);
        let db = dir.path().join("blog.duckdb");

        let first = sql_erd_bin()
            .arg("analyze")
            .arg(&db)
            .arg("--init-sql")
            .arg(&ddl)
            .output()
            .unwrap();
        assert!(first.status.success(), "stderr: {}", stderr(&first));

        let second = sql_erd_bin().arg("analyze").arg(&db).output().unwrap();
        assert!(second.status.success(), "stderr: {}", stderr(&second));

        let json: serde_json::Value = serde_json::from_str(&stdout(&second)).unwrap();
        assert_eq!(json["name"], "blog");
        assert_eq!(json["stats"]["relationship_count"], 1);
    }

    #[test]
    fn test_unknown_format() {
        let output = sql_erd_bin()
            .args(["analyze", "--format", "png"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(stderr(&output).contains("Unknown format"));
    }
}

#[test]
fn test_completions() {
    let output = sql_erd_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("sql-erd"));
}

#[test]
fn test_help_lists_commands() {
    let output = sql_erd_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.contains("analyze"));
    assert!(help.contains("schema"));
}
