//! Entry point for the `lineage` binary.
//!
//! Parses arguments, builds the lineage graph, writes it to stdout and maps
//! failures to a non-zero exit code. Logging is installed first so every
//! later step can emit diagnostics.

use std::{
    io::{self, BufWriter, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use lineage_cli::{
    cli::{Cli, CliError, render_summary, run_cli},
    logging::{self, LoggingError},
};
use tracing::{error, field};

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("failed to build lineage graph")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to render graph")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        let lineage = err
            .downcast_ref::<CliError>()
            .and_then(CliError::lineage_error);
        let code = lineage.map(|error| field::display(error.code().as_str()));
        let kind = lineage.map(|error| field::debug(error.kind()));
        error!(error = ?err, code, kind, "command execution failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "tracing is not available until logging is initialised"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialise logging: {err}");
}
