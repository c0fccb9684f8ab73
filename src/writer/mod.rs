//! Model writers: render a finished [`ErModel`] and persist it.
//!
//! Formats:
//! - JSON for programmatic use (deterministic, schema available via `schema`)
//! - Mermaid `erDiagram`
//! - Graphviz DOT with ERD-style table nodes

mod dot;
mod json;
mod mermaid;

pub use dot::to_dot;
pub use json::{build_erd_json, to_json, ErdJson};
pub use mermaid::to_mermaid;

use crate::model::ErModel;
use anyhow::Context;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format for the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    /// Mermaid erDiagram format
    Mermaid,
    /// Graphviz DOT format (ERD style)
    Dot,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "mermaid" | "mmd" => Ok(OutputFormat::Mermaid),
            "dot" | "graphviz" => Ok(OutputFormat::Dot),
            _ => Err(format!(
                "Unknown format: {}. Valid options: json, mermaid, dot",
                s
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Mermaid => write!(f, "mermaid"),
            OutputFormat::Dot => write!(f, "dot"),
        }
    }
}

impl OutputFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Mermaid => "mmd",
            OutputFormat::Dot => "dot",
        }
    }

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "mmd" | "mermaid" => Some(OutputFormat::Mermaid),
            "dot" | "gv" => Some(OutputFormat::Dot),
            _ => None,
        }
    }

    /// Format from an explicit flag, else the output path's extension, else JSON.
    pub fn resolve(flag: Option<&str>, output: Option<&Path>) -> Result<Self, String> {
        if let Some(f) = flag {
            return f.parse();
        }
        Ok(output
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
            .unwrap_or_default())
    }
}

/// Layout direction for DOT diagrams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Left to right
    #[default]
    LR,
    /// Top to bottom
    TB,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lr" | "left-right" | "horizontal" => Ok(Layout::LR),
            "tb" | "td" | "top-bottom" | "top-down" | "vertical" => Ok(Layout::TB),
            _ => Err(format!("Unknown layout: {}. Valid options: lr, tb", s)),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::LR => write!(f, "lr"),
            Layout::TB => write!(f, "tb"),
        }
    }
}

/// Render a model in the given format
pub fn render(model: &ErModel, format: OutputFormat, layout: Layout) -> String {
    match format {
        OutputFormat::Json => to_json(model),
        OutputFormat::Mermaid => to_mermaid(model),
        OutputFormat::Dot => to_dot(model, layout),
    }
}

/// Consumes a finished model.
pub trait ModelWriter {
    fn generate_model(&mut self, model: &ErModel) -> anyhow::Result<()>;
}

/// Writes a rendered model to a file, or stdout when no path is set.
#[derive(Debug, Clone, Default)]
pub struct FileModelWriter {
    pub format: OutputFormat,
    pub layout: Layout,
    pub output: Option<PathBuf>,
}

impl FileModelWriter {
    pub fn new(format: OutputFormat, output: Option<PathBuf>) -> Self {
        Self {
            format,
            layout: Layout::default(),
            output,
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

impl ModelWriter for FileModelWriter {
    fn generate_model(&mut self, model: &ErModel) -> anyhow::Result<()> {
        let content = render(model, self.format, self.layout);

        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut writer = BufWriter::new(file);
                writer.write_all(content.as_bytes())?;
                if !content.ends_with('\n') {
                    writer.write_all(b"\n")?;
                }
                writer.flush()?;
            }
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                writeln!(handle, "{}", content.trim_end_matches('\n'))?;
            }
        }

        Ok(())
    }
}
