mod analyze;
mod schema;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sql-erd")]
#[command(version)]
#[command(about = "Build an entity-relationship model from a database catalog", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Introspect a database catalog and write its ER model
    Analyze {
        /// DuckDB database file (default: in-memory)
        database: Option<String>,

        /// Schema (owner) to introspect
        #[arg(short, long)]
        schema: Option<String>,

        /// Catalog (database name) to introspect
        #[arg(long)]
        catalog: Option<String>,

        /// Fallback for --schema and --catalog
        #[arg(short, long)]
        user: Option<String>,

        /// SQL script to run before introspection (repeatable)
        #[arg(long = "init-sql", value_name = "FILE")]
        init_sql: Vec<PathBuf>,

        /// Read catalog rows from a JSON array or NDJSON file instead of a database
        #[arg(long, value_name = "FILE", conflicts_with_all = ["database", "init_sql"])]
        rows: Option<PathBuf>,

        /// YAML file with connection options (flags override it)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: json, mermaid, dot (default: from extension, else json)
        #[arg(short, long)]
        format: Option<String>,

        /// DOT layout direction: lr, tb
        #[arg(long)]
        layout: Option<String>,

        /// Show progress during analysis
        #[arg(short, long)]
        progress: bool,

        /// Fail when any foreign key cannot be resolved
        #[arg(long)]
        strict: bool,
    },

    /// Print the JSON Schema of the model output
    Schema {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// List available schema names
        #[arg(long)]
        list: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze {
            database,
            schema,
            catalog,
            user,
            init_sql,
            rows,
            config,
            output,
            format,
            layout,
            progress,
            strict,
        } => analyze::run(analyze::AnalyzeArgs {
            database,
            schema,
            catalog,
            user,
            init_sql,
            rows,
            config,
            output,
            format,
            layout,
            progress,
            strict,
        }),
        Commands::Schema { output, list } => schema::run(output, list),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sql-erd", &mut io::stdout());
            Ok(())
        }
    }
}
