//! Caller-facing analysis: row source in, populated [`ErModel`] out.
//!
//! One [`Analyzer`] run streams rows from its source through the resolver
//! (phase 1), reconciles deferred references (phase 2), and reports
//! progress along the way. A run has exactly one writer: the model is
//! borrowed mutably for its whole duration.
//!
//! Failed runs do not roll back. With [`Analyzer::run_into`] and [`analyze`]
//! the caller keeps its model, including whatever was added before the
//! failure.

use crate::catalog::{CatalogQuery, CatalogRow, DuckDbSource, RowSource};
use crate::config::ConnectionOptions;
use crate::error::{AnalyzeError, Result};
use crate::model::ErModel;
use crate::progress::{
    NoProgress, Notification, ProgressNotifier, ProgressSink, DEFAULT_PROGRESS_INTERVAL,
};
use crate::resolver::{ResolveReport, SchemaResolver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Cooperative cancellation shared between a run and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct Analysis {
    pub model: ErModel,
    pub report: ResolveReport,
    pub duration: Duration,
}

/// Configures and runs one analysis over a row source.
pub struct Analyzer<'p, S: RowSource> {
    source: S,
    model_name: String,
    progress: &'p dyn ProgressSink,
    interval: Duration,
    cancel: CancelFlag,
}

impl<S: RowSource> Analyzer<'static, S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            model_name: "model".to_string(),
            progress: &NoProgress,
            interval: DEFAULT_PROGRESS_INTERVAL,
            cancel: CancelFlag::new(),
        }
    }
}

impl<'p, S: RowSource> Analyzer<'p, S> {
    /// Name given to the model built by [`Analyzer::run`].
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_progress<'q>(self, progress: &'q dyn ProgressSink) -> Analyzer<'q, S> {
        Analyzer {
            source: self.source,
            model_name: self.model_name,
            progress,
            interval: self.interval,
            cancel: self.cancel,
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run the analysis into a fresh model and hand it back.
    pub fn run(mut self, query: &CatalogQuery) -> Result<Analysis> {
        let start = Instant::now();
        let mut model = ErModel::new(self.model_name.clone());
        let report = self.run_into(&mut model, query)?;

        Ok(Analysis {
            model,
            report,
            duration: start.elapsed(),
        })
    }

    /// Run the analysis against a caller-owned model, such as one built by
    /// an earlier run. On failure the model keeps its partial changes.
    pub fn run_into(&mut self, model: &mut ErModel, query: &CatalogQuery) -> Result<ResolveReport> {
        let mut notifier = ProgressNotifier::new(self.progress, self.interval);
        notifier.started();
        info!(model = %model.name, "starting catalog analysis");

        match run_phases(&mut self.source, model, query, &mut notifier, &self.cancel) {
            Ok(report) => {
                info!(
                    entities = report.entities_created,
                    relationships = report.relationships_created,
                    warnings = report.warnings.len(),
                    "catalog analysis finished"
                );
                notifier.finished();
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "catalog analysis failed");
                notifier.failed(&e.to_string());
                Err(e)
            }
        }
    }
}

fn run_phases<S: RowSource>(
    source: &mut S,
    model: &mut ErModel,
    query: &CatalogQuery,
    notifier: &mut ProgressNotifier<'_>,
    cancel: &CancelFlag,
) -> Result<ResolveReport> {
    let mut resolver = SchemaResolver::new(model);
    let mut active = None;

    source.execute(query, &mut |row: CatalogRow| {
        if cancel.is_cancelled() {
            return Err(AnalyzeError::Cancelled);
        }
        active = Some(resolver.ingest(active, &row)?);
        notifier.row();
        Ok(())
    })?;

    if cancel.is_cancelled() {
        return Err(AnalyzeError::Cancelled);
    }
    resolver.reconcile()?;
    Ok(resolver.finish())
}

/// Introspect the DuckDB database described by `options`.
///
/// Runs the configured init scripts, then analyzes into `model`. Pass
/// `ErModel::new(options.model_name())` for a fresh model. The model stays
/// with the caller whether or not the run succeeds.
pub fn analyze(
    options: &ConnectionOptions,
    model: &mut ErModel,
    progress: &dyn ProgressSink,
) -> Result<ResolveReport> {
    let source = match open_source(options) {
        Ok(source) => source,
        Err(e) => {
            progress.notify(&Notification::error(format!("Error occurred! {}", e)));
            return Err(e);
        }
    };

    Analyzer::new(source)
        .with_progress(progress)
        .with_progress_interval(options.progress_interval())
        .run_into(model, &options.query())
}

/// Open the database named in `options` and run its init scripts.
pub fn open_source(options: &ConnectionOptions) -> Result<DuckDbSource> {
    let source = DuckDbSource::open_target(options.database.as_deref().unwrap_or(":memory:"))?;
    for script in &options.init_sql {
        source.run_script_file(script)?;
    }
    Ok(source)
}
