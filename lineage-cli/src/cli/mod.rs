//! Command-line interface for building lineage graphs.
//!
//! The `build` command reads a Parquet embedding, summarises its clusters
//! and prints the resulting graph as text or JSON.

mod commands;

pub use commands::{
    BuildCommand, BuildSource, Cli, CliError, Command, ExecutionSummary, OutputFormat,
    ParquetArgs, TreeArgs, render_summary, run_cli,
};

#[cfg(test)]
mod tests;
