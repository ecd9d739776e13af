//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `zone_audit` library that handles
//! command-line argument parsing, logger initialization, and user-facing
//! output formatting. All core functionality lives in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use zone_audit::initialization::{init_crypto_provider, init_logger_with};
use zone_audit::{run_audit, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    init_crypto_provider();

    match run_audit(config).await {
        Ok(report) => {
            println!(
                "Processed {} file{} in {:.1}s: {} violation{} ({} critical, {} warning, {} info)",
                report.files_processed,
                if report.files_processed == 1 { "" } else { "s" },
                report.elapsed_seconds,
                report.total_violations,
                if report.total_violations == 1 { "" } else { "s" },
                report.critical,
                report.warnings,
                report.infos
            );
            for outcome in &report.outcomes {
                match (&outcome.output_dir, &outcome.error) {
                    (Some(dir), _) => {
                        println!("  {} -> {}", outcome.input.display(), dir.display())
                    }
                    (None, Some(error)) => {
                        eprintln!("  {} FAILED: {error}", outcome.input.display())
                    }
                    (None, None) => {}
                }
            }
            if report.files_failed > 0 {
                eprintln!("{} file(s) failed", report.files_failed);
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("zone_audit error: {e:#}");
            process::exit(1);
        }
    }
}
