// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

mod analyzer;
mod catalog;
mod cmd;
mod config;
mod error;
mod json_schema;
mod model;
mod progress;
mod resolver;
mod writer;

use clap::Parser;
use cmd::Cli;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let directive: Directive = format!("sql_erd={}", level)
        .parse()
        .unwrap_or_else(|_| LevelFilter::WARN.into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = cmd::run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
