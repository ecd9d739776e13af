//! zone_audit library: DNS zone export validation.
//!
//! This library ingests CSV exports of DNS zones (optionally multi-view),
//! rebuilds the logical record graph (CNAME/MX/NS links, IP usage), checks
//! it against RFC-derived structural rules and optional email
//! authentication rules, and can probe the live TLS certificate and
//! HTTP/HTTPS status of every name using the addresses from the export
//! itself.
//!
//! # Example
//!
//! ```no_run
//! use zone_audit::{run_audit, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: Some(std::path::PathBuf::from("zones.csv")),
//!     email_validation: true,
//!     no_ssl_check: true,
//!     no_http_check: true,
//!     ..Default::default()
//! };
//!
//! let report = run_audit(config).await?;
//! println!("Processed {} file(s): {} violation(s) found",
//!          report.files_processed, report.total_violations);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! The probe functions require a Tokio runtime. Use `#[tokio::main]` or
//! call the library from an async context.

pub mod config;
pub mod error_handling;
pub mod export;
pub mod ingest;
pub mod initialization;
pub mod probe;
pub mod report;
pub mod store;
pub mod validate;
pub mod view;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use run::{run_audit, AuditReport, FileOutcome};

// Internal run module (batch orchestration)
mod run {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use chrono::Local;
    use log::{error, info, warn};

    use crate::config::Config;
    use crate::error_handling::ProbeStats;
    use crate::export::write_analysis_csv;
    use crate::probe::{run_certificate_checks, run_http_checks};
    use crate::report::{write_report, ReportContext};
    use crate::store::RecordStore;
    use crate::validate::{validate_dns, validate_email, RuleConfig, Severity, Violation};

    /// Outcome of one processed input file.
    #[derive(Debug, Clone)]
    pub struct FileOutcome {
        pub input: PathBuf,
        /// Output directory, present when processing got far enough to
        /// create one.
        pub output_dir: Option<PathBuf>,
        pub domains: usize,
        pub violations: usize,
        /// Failure message when the file could not be processed.
        pub error: Option<String>,
    }

    /// Results of an audit run across one or more input files.
    #[derive(Debug, Clone)]
    pub struct AuditReport {
        pub files_processed: usize,
        pub files_failed: usize,
        pub total_violations: usize,
        pub critical: usize,
        pub warnings: usize,
        pub infos: usize,
        pub elapsed_seconds: f64,
        pub outcomes: Vec<FileOutcome>,
    }

    /// Runs an audit with the provided configuration.
    ///
    /// In batch mode (`--folder`) every `*.csv` directly inside the folder
    /// is processed independently and strictly sequentially: one file's
    /// failure is recorded in its [`FileOutcome`] and never aborts the
    /// siblings. No state is shared between files; each store is built,
    /// validated, reported, and dropped.
    ///
    /// # Errors
    ///
    /// Returns an error only for run-level problems: no input given, an
    /// unreadable batch folder, or a folder without any CSV files.
    /// Per-file failures are reported through the outcomes instead.
    pub async fn run_audit(config: Config) -> Result<AuditReport> {
        let start = std::time::Instant::now();

        let inputs = gather_inputs(&config)?;
        info!("Processing {} input file(s)", inputs.len());

        let rule_config = RuleConfig {
            ignored_rules: RuleConfig::parse_ignore_rules(&config.ignore_rules),
            show_orphans: config.show_orphans,
            max_hops: config.max_hops,
        };

        let mut outcomes = Vec::new();
        let mut totals = (0usize, 0usize, 0usize); // critical, warning, info
        let mut total_violations = 0usize;
        let mut failed = 0usize;

        for input in &inputs {
            match process_file(input, &config, &rule_config).await {
                Ok((outcome, violations)) => {
                    total_violations += violations.len();
                    for violation in &violations {
                        match violation.severity {
                            Severity::Critical => totals.0 += 1,
                            Severity::Warning => totals.1 += 1,
                            Severity::Info => totals.2 += 1,
                        }
                    }
                    outcomes.push(outcome);
                }
                Err(e) => {
                    failed += 1;
                    error!("Failed to process {}: {e:#}", input.display());
                    outcomes.push(FileOutcome {
                        input: input.clone(),
                        output_dir: None,
                        domains: 0,
                        violations: 0,
                        error: Some(format!("{e:#}")),
                    });
                }
            }
        }

        Ok(AuditReport {
            files_processed: inputs.len(),
            files_failed: failed,
            total_violations,
            critical: totals.0,
            warnings: totals.1,
            infos: totals.2,
            elapsed_seconds: start.elapsed().as_secs_f64(),
            outcomes,
        })
    }

    /// Resolves the list of input files from the configuration.
    fn gather_inputs(config: &Config) -> Result<Vec<PathBuf>> {
        if let Some(folder) = &config.folder {
            let mut files: Vec<PathBuf> = std::fs::read_dir(folder)
                .with_context(|| format!("Failed to read folder {}", folder.display()))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file()
                        && path
                            .extension()
                            .map(|ext| ext.eq_ignore_ascii_case("csv"))
                            .unwrap_or(false)
                })
                .collect();
            files.sort();
            if files.is_empty() {
                anyhow::bail!("No CSV files found in {}", folder.display());
            }
            Ok(files)
        } else {
            let file = config
                .file
                .clone()
                .context("No input file given (expected a file argument or --folder)")?;
            Ok(vec![file])
        }
    }

    /// Computes the output directory for one input file and creates it.
    fn prepare_output_dir(input: &Path, config: &Config) -> Result<PathBuf> {
        let dir = if let Some(dir) = &config.output_dir {
            dir.clone()
        } else {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "output".to_string());
            let name = if config.no_timestamp {
                stem
            } else {
                format!("{stem}_{}", Local::now().format("%Y%m%d_%H%M%S"))
            };
            match input.parent() {
                Some(parent) if parent.as_os_str().is_empty() => PathBuf::from(name),
                Some(parent) => parent.join(name),
                None => PathBuf::from(name),
            }
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Processes one input file end to end.
    async fn process_file(
        input: &Path,
        config: &Config,
        rule_config: &RuleConfig,
    ) -> Result<(FileOutcome, Vec<Violation>)> {
        info!("Processing {}", input.display());

        let content = tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;

        let parsed = crate::ingest::parse_zone_csv(&content)
            .with_context(|| format!("Failed to parse {}", input.display()))?;
        let store = RecordStore::build(&parsed);
        info!(
            "{} domain(s) analyzed, {} unique IP address(es)",
            store.domain_count(),
            store.ips().len()
        );
        if store.is_empty() {
            warn!("{} holds no usable records", input.display());
        }

        let mut violations = Vec::new();
        if !config.no_validation {
            violations.extend(validate_dns(&store, rule_config));
            if config.email_validation {
                let email_violations = validate_email(&store, rule_config);
                info!("{} email violation(s) detected", email_violations.len());
                violations.extend(email_violations);
            }
        }

        let probe_stats = Arc::new(ProbeStats::new());
        let certificates = if config.no_ssl_check {
            Vec::new()
        } else {
            run_certificate_checks(&store, config.ssl_port, Arc::clone(&probe_stats)).await
        };
        let http_checks = if config.no_http_check {
            Vec::new()
        } else {
            run_http_checks(&store, config.http_timeout_ms, Arc::clone(&probe_stats)).await
        };
        if probe_stats.total() > 0 {
            probe_stats.log_summary();
        }

        let output_dir = prepare_output_dir(input, config)?;

        let ignored_labels: Vec<String> = {
            let mut labels: Vec<String> = rule_config
                .ignored_rules
                .iter()
                .map(|r| r.to_string())
                .collect();
            labels.sort();
            labels
        };
        let ctx = ReportContext {
            source: input,
            store: &store,
            violations: &violations,
            ignored_rules: &ignored_labels,
            certificates: &certificates,
            http_checks: &http_checks,
        };
        write_report(&output_dir.join(&config.report), &ctx)?;

        if !config.no_csv_report {
            write_analysis_csv(
                &output_dir.join(&config.csv_report),
                &store,
                &violations,
                &certificates,
                &http_checks,
            )?;
        }

        Ok((
            FileOutcome {
                input: input.to_path_buf(),
                output_dir: Some(output_dir),
                domains: store.domain_count(),
                violations: violations.len(),
                error: None,
            },
            violations,
        ))
    }
}
