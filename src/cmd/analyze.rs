//! Analyze command: introspect a catalog and write the ER model.

use crate::analyzer::{self, Analysis, Analyzer};
use crate::catalog::JsonRowSource;
use crate::config::ConnectionOptions;
use crate::model::ErModel;
use crate::progress::{Notification, ProgressSink, Severity};
use crate::writer::{FileModelWriter, Layout, ModelWriter, OutputFormat};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct AnalyzeArgs {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub catalog: Option<String>,
    pub user: Option<String>,
    pub init_sql: Vec<PathBuf>,
    pub rows: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub layout: Option<String>,
    pub progress: bool,
    pub strict: bool,
}

/// Run the analyze command
pub fn run(args: AnalyzeArgs) -> Result<()> {
    let format = OutputFormat::resolve(args.format.as_deref(), args.output.as_deref())
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let layout = args
        .layout
        .as_deref()
        .map(str::parse::<Layout>)
        .transpose()
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .unwrap_or_default();

    let options = build_options(&args)?;

    let pb = if args.progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let sink = |n: &Notification| {
        if let Some(pb) = &pb {
            match n.severity {
                Severity::Info => pb.set_message(n.message.clone()),
                Severity::Error => pb.println(&n.message),
            }
        }
    };

    let result = match &args.rows {
        Some(rows) => analyze_rows(rows, &options, &sink),
        None => analyze_database(&options, &sink),
    };

    if let Some(pb) = &pb {
        match &result {
            Ok(_) => pb.finish_with_message("done"),
            Err(_) => pb.abandon(),
        }
    }

    let analysis = result.context("catalog analysis failed")?;

    for warning in &analysis.report.warnings {
        eprintln!("warning: {}", warning);
    }
    if args.strict && analysis.report.unresolved > 0 {
        bail!(
            "{} foreign key reference(s) could not be resolved",
            analysis.report.unresolved
        );
    }

    let mut writer = FileModelWriter::new(format, args.output.clone()).with_layout(layout);
    writer.generate_model(&analysis.model)?;

    if let Some(path) = &args.output {
        eprintln!("ERD written to: {}", path.display());
    }

    if format != OutputFormat::Json || args.output.is_some() {
        eprintln!(
            "\nERD: {} entities, {} columns, {} relationships, {} warnings ({} rows in {:.2?})",
            analysis.model.entity_count(),
            analysis.model.column_count(),
            analysis.model.relationship_count(),
            analysis.report.warnings.len(),
            analysis.report.rows,
            analysis.duration
        );
    }

    Ok(())
}

/// Config file first, then flags on top
fn build_options(args: &AnalyzeArgs) -> Result<ConnectionOptions> {
    let base = match &args.config {
        Some(path) => ConnectionOptions::load(path)?,
        None => ConnectionOptions::default(),
    };

    let flags = ConnectionOptions {
        database: args.database.clone(),
        owner: args.schema.clone(),
        catalog: args.catalog.clone(),
        user_name: args.user.clone(),
        init_sql: args.init_sql.clone(),
        progress_interval_secs: None,
    };

    Ok(base.merge(flags))
}

fn analyze_database(options: &ConnectionOptions, sink: &dyn ProgressSink) -> Result<Analysis> {
    let start = Instant::now();
    let mut model = ErModel::new(options.model_name());
    let report = analyzer::analyze(options, &mut model, sink)?;

    Ok(Analysis {
        model,
        report,
        duration: start.elapsed(),
    })
}

fn analyze_rows(path: &Path, options: &ConnectionOptions, sink: &dyn ProgressSink) -> Result<Analysis> {
    if !path.exists() {
        bail!("rows file does not exist: {}", path.display());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string();

    let analysis = Analyzer::new(JsonRowSource::new(path))
        .with_model_name(name)
        .with_progress(sink)
        .with_progress_interval(options.progress_interval())
        .run(&options.query())?;

    Ok(analysis)
}
