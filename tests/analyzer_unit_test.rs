//! Tests for the caller-facing analyzer: progress, cancellation, target models.

use sql_erd::analyzer::{Analyzer, CancelFlag};
use sql_erd::catalog::{CatalogQuery, CatalogRow, RowSource};
use sql_erd::error::{AnalyzeError, Result};
use sql_erd::model::ErModel;
use sql_erd::progress::{Notification, Severity};
use std::cell::RefCell;
use std::time::Duration;

fn rows() -> Vec<CatalogRow> {
    vec![
        CatalogRow::new("accounts", "id", 1, "INTEGER").primary_key(),
        CatalogRow::new("accounts", "user_id", 2, "INTEGER")
            .foreign_key("fk_accounts_user", "users", "id"),
        CatalogRow::new("users", "id", 1, "INTEGER").primary_key(),
        CatalogRow::new("users", "name", 2, "VARCHAR"),
    ]
}

/// Delivers its rows, then fails.
struct FailingSource {
    rows: Vec<CatalogRow>,
}

impl RowSource for FailingSource {
    fn execute(
        &mut self,
        _query: &CatalogQuery,
        sink: &mut dyn FnMut(CatalogRow) -> Result<()>,
    ) -> Result<()> {
        for row in self.rows.drain(..) {
            sink(row)?;
        }
        Err(AnalyzeError::source(
            "connection reset",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer"),
        ))
    }
}

/// Cancels the run after delivering `after` rows.
struct CancellingSource {
    rows: Vec<CatalogRow>,
    after: usize,
    flag: CancelFlag,
}

impl RowSource for CancellingSource {
    fn execute(
        &mut self,
        _query: &CatalogQuery,
        sink: &mut dyn FnMut(CatalogRow) -> Result<()>,
    ) -> Result<()> {
        for (i, row) in self.rows.drain(..).enumerate() {
            if i == self.after {
                self.flag.cancel();
            }
            sink(row)?;
        }
        Ok(())
    }
}

#[test]
fn test_run_builds_model() {
    let analysis = Analyzer::new(rows())
        .with_model_name("shop")
        .run(&CatalogQuery::default())
        .unwrap();

    assert_eq!(analysis.model.name, "shop");
    assert_eq!(analysis.model.entity_count(), 2);
    assert_eq!(analysis.model.relationship_count(), 1);
    assert_eq!(analysis.report.rows, 4);
    assert_eq!(analysis.report.pending_resolved, 1);
}

#[test]
fn test_progress_notifications() {
    let seen = RefCell::new(Vec::new());
    let sink = |n: &Notification| seen.borrow_mut().push(n.clone());

    Analyzer::new(rows())
        .with_progress(&sink)
        .with_progress_interval(Duration::ZERO)
        .run(&CatalogQuery::default())
        .unwrap();

    let seen = seen.borrow();
    assert_eq!(
        seen.first().unwrap().message,
        "ER data model generation has been started. Please wait..."
    );
    assert_eq!(
        seen.last().unwrap().message,
        "ER data model generation has been finished."
    );
    let in_progress = seen
        .iter()
        .filter(|n| n.message.contains("in progress"))
        .count();
    assert_eq!(in_progress, 4);
    assert!(seen.iter().all(|n| n.severity == Severity::Info));
}

#[test]
fn test_quiet_with_long_interval() {
    let seen = RefCell::new(Vec::new());
    let sink = |n: &Notification| seen.borrow_mut().push(n.clone());

    Analyzer::new(rows())
        .with_progress(&sink)
        .with_progress_interval(Duration::from_secs(3600))
        .run(&CatalogQuery::default())
        .unwrap();

    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn test_source_failure_reports_error() {
    let seen = RefCell::new(Vec::new());
    let sink = |n: &Notification| seen.borrow_mut().push(n.clone());

    let err = Analyzer::new(FailingSource { rows: rows() })
        .with_progress(&sink)
        .run(&CatalogQuery::default())
        .unwrap_err();

    assert!(err.is_transport());
    let seen = seen.borrow();
    let last = seen.last().unwrap();
    assert_eq!(last.severity, Severity::Error);
    assert!(last.message.starts_with("Error occurred!"));
    assert!(last.message.contains("connection reset"));
}

#[test]
fn test_failed_run_keeps_partial_model() {
    let mut model = ErModel::new("partial");
    let mut analyzer = Analyzer::new(FailingSource { rows: rows() });

    let err = analyzer
        .run_into(&mut model, &CatalogQuery::default())
        .unwrap_err();

    assert!(err.is_transport());
    // Phase 1 ran; phase 2 did not
    assert_eq!(model.entity_count(), 2);
    assert_eq!(model.relationship_count(), 0);
}

#[test]
fn test_cancel_before_run() {
    let flag = CancelFlag::new();
    flag.cancel();

    let err = Analyzer::new(rows())
        .with_cancel_flag(flag)
        .run(&CatalogQuery::default())
        .unwrap_err();

    assert!(matches!(err, AnalyzeError::Cancelled));
}

#[test]
fn test_cancel_mid_run() {
    let flag = CancelFlag::new();
    let source = CancellingSource {
        rows: rows(),
        after: 2,
        flag: flag.clone(),
    };

    let mut model = ErModel::new("cancelled");
    let err = Analyzer::new(source)
        .with_cancel_flag(flag)
        .run_into(&mut model, &CatalogQuery::default())
        .unwrap_err();

    assert!(matches!(err, AnalyzeError::Cancelled));
    assert_eq!(model.entity_count(), 1);
    assert_eq!(model.relationship_count(), 0);
}

#[test]
fn test_analyze_into_existing_model() {
    let existing = Analyzer::new(vec![
        CatalogRow::new("users", "id", 1, "INTEGER").primary_key(),
    ])
    .run(&CatalogQuery::default())
    .unwrap()
    .model;

    let mut model = existing;
    let report = Analyzer::new(vec![
        CatalogRow::new("orders", "user_id", 1, "INTEGER")
            .foreign_key("fk_orders_user", "users", "id"),
    ])
    .run_into(&mut model, &CatalogQuery::default())
    .unwrap();

    assert_eq!(model.entity_count(), 2);
    assert_eq!(model.relationship_count(), 1);
    assert_eq!(report.entities_created, 1);
}

#[test]
fn test_existing_model_survives_failed_run() {
    let mut model = Analyzer::new(vec![
        CatalogRow::new("users", "id", 1, "INTEGER").primary_key(),
    ])
    .with_model_name("kept")
    .run(&CatalogQuery::default())
    .unwrap()
    .model;

    let err = Analyzer::new(vec![
        CatalogRow::new("a", "id", 1, "INTEGER"),
        CatalogRow::new("b", "id", 1, "INTEGER"),
        CatalogRow::new("a", "name", 2, "VARCHAR"),
    ])
    .run_into(&mut model, &CatalogQuery::default())
    .unwrap_err();

    assert!(matches!(err, AnalyzeError::NonContiguousTable { .. }));
    assert_eq!(model.name, "kept");
    assert!(model.get_entity("users").is_some());
    // Partial changes from the failed run stay in place
    assert_eq!(model.entity_count(), 3);
}

#[test]
fn test_query_filters_rows() {
    let mut sales = CatalogRow::new("orders", "id", 1, "INTEGER");
    sales.table_schema = Some("sales".to_string());
    let mut hr = CatalogRow::new("employees", "id", 1, "INTEGER");
    hr.table_schema = Some("hr".to_string());

    let analysis = Analyzer::new(vec![hr, sales])
        .run(&CatalogQuery::new(Some("sales".to_string()), None))
        .unwrap();

    assert_eq!(analysis.model.entity_count(), 1);
    assert!(analysis.model.get_entity("orders").is_some());
}
