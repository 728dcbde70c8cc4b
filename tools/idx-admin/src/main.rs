//! idx-admin: indexer administration CLI.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use idx_admin::{commands, AdminContext, Cli, PrometheusMetrics};
use idx_telemetry::{encode_metrics, init_telemetry, TelemetryConfig, TelemetryGuard};

fn init_logging(cli: &Cli) -> Option<TelemetryGuard> {
    let mut config = TelemetryConfig::from_env();
    if cli.verbose {
        config = config.with_log_level("debug");
    }
    match init_telemetry(config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: telemetry disabled: {e}");
            None
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AdminContext::open(&cli.config, &cli.state, Arc::new(PrometheusMetrics))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::dispatch(&cli.command, &ctx, cli.json, &mut out)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _telemetry = init_logging(&cli);

    let result = run(&cli);

    if cli.metrics {
        match encode_metrics() {
            Ok(text) => print!("{text}"),
            Err(e) => eprintln!("warning: {e}"),
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
