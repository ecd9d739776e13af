use std::path::PathBuf;

use clap::{Parser, ValueEnum};

// constants (used as defaults)
/// TTL applied when the input has no TTL column.
pub const DEFAULT_TTL: &str = "3600";
/// View tag applied when the input has no View column.
pub const DEFAULT_VIEW: &str = "default";

// Validation thresholds
/// CNAME chain walk bound. Chains longer than this are treated as
/// non-looping; see `validate::dns::walk_cname_chain`.
pub const DEFAULT_MAX_HOPS: usize = 20;
/// TTLs under this many seconds trigger TTL_TOO_SHORT.
pub const TTL_MIN_SECS: u64 = 60;
/// TTLs over this many seconds trigger TTL_TOO_LONG.
pub const TTL_MAX_SECS: u64 = 86400;
/// RFC 7208 limit on DNS-lookup-incurring SPF mechanisms.
pub const SPF_LOOKUP_LIMIT: usize = 10;
/// DKIM keys estimated under this many bits trigger DKIM_WEAK_KEY.
pub const DKIM_MIN_KEY_BITS: usize = 1024;

// Probe tuning
/// Certificates expiring within this many days are CRITICAL.
pub const CERT_EXPIRY_CRITICAL_DAYS: i64 = 7;
/// Certificates expiring within this many days are WARNING.
pub const CERT_EXPIRY_WARNING_DAYS: i64 = 21;
/// Concurrent certificate probes per batch.
pub const CERT_PROBE_BATCH: usize = 20;
/// Concurrent HTTP probes per batch.
pub const HTTP_PROBE_BATCH: usize = 40;
/// TCP connect + TLS handshake budget for one certificate probe.
pub const CERT_PROBE_TIMEOUT_MS: u64 = 2000;

// Output defaults
pub const REPORT_FILE: &str = "validation_report.txt";
pub const CSV_REPORT_FILE: &str = "analysis_report.csv";

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Command-line options and configuration.
///
/// This struct is generated by `clap` from the field attributes. There is
/// no ambient state: the engines receive everything they need from here.
///
/// # Examples
///
/// ```bash
/// # Validate one zone export
/// zone_audit zones.csv
///
/// # Batch mode over a directory, email audit included
/// zone_audit --folder ./exports --email-validation
///
/// # Offline run with selected rules suppressed
/// zone_audit zones.csv --no-ssl-check --no-http-check \
///     --ignore-rules CNAME_CHAIN,TTL_TOO_SHORT
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "zone_audit",
    about = "Validates DNS zone CSV exports against RFC rules, audits email authentication, and checks live TLS/HTTP status."
)]
pub struct Config {
    /// Input CSV file (zone export). Not needed with --folder.
    #[arg(value_parser, required_unless_present = "folder")]
    pub file: Option<PathBuf>,

    /// Process every *.csv in this directory instead of a single file
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Fixed output directory (overrides the per-file default)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not suffix output directories with a datetime stamp
    #[arg(long)]
    pub no_timestamp: bool,

    /// Validation report filename
    #[arg(long, default_value = REPORT_FILE)]
    pub report: String,

    /// Analysis CSV filename
    #[arg(long, default_value = CSV_REPORT_FILE)]
    pub csv_report: String,

    /// Disable the analysis CSV
    #[arg(long)]
    pub no_csv_report: bool,

    /// Skip the DNS rule engine
    #[arg(long)]
    pub no_validation: bool,

    /// Enable the email authentication rules (SPF/DKIM/DMARC/MX)
    #[arg(long)]
    pub email_validation: bool,

    /// Rule codes to suppress, comma-separated (e.g. CNAME_CHAIN,TTL_TOO_SHORT)
    #[arg(long, value_delimiter = ',')]
    pub ignore_rules: Vec<String>,

    /// Evaluate CNAME_ORPHAN for CNAME targets absent from the export
    #[arg(long)]
    pub show_orphans: bool,

    /// Skip TLS certificate checks
    #[arg(long)]
    pub no_ssl_check: bool,

    /// Port for TLS certificate checks
    #[arg(long, default_value_t = 443)]
    pub ssl_port: u16,

    /// Skip HTTP/HTTPS availability checks
    #[arg(long)]
    pub no_http_check: bool,

    /// Timeout per HTTP/HTTPS probe in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub http_timeout_ms: u64,

    /// CNAME chain walk bound for loop detection
    ///
    /// Chains longer than this are treated as non-looping. The bound is a
    /// documented policy limit, not a proof of acyclicity.
    #[arg(long, default_value_t = DEFAULT_MAX_HOPS)]
    pub max_hops: usize,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file: None,
            folder: None,
            output_dir: None,
            no_timestamp: false,
            report: REPORT_FILE.to_string(),
            csv_report: CSV_REPORT_FILE.to_string(),
            no_csv_report: false,
            no_validation: false,
            email_validation: false,
            ignore_rules: Vec::new(),
            show_orphans: false,
            no_ssl_check: false,
            ssl_port: 443,
            no_http_check: false,
            http_timeout_ms: 5000,
            max_hops: DEFAULT_MAX_HOPS,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}
