use log::SetLoggerError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Errors that make a CSV input unusable.
///
/// These are fatal for the affected file only: batch mode logs them and
/// continues with the remaining files. Row-level defects are not errors;
/// defective rows are silently skipped during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The file contains no header line (only comments or blank lines).
    #[error("no header line found in input")]
    NoHeader,

    /// The header lacks one of the required columns.
    #[error("missing required columns (need Name, Type, Value); found: {found}")]
    MissingColumns {
        /// Column names that were present in the header.
        found: String,
    },

    /// Low-level CSV parse failure.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure modes of the live network probes.
///
/// Probe failures never abort validation; they are counted here and
/// surfaced in the report summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ProbeErrorKind {
    TcpConnectError,
    TcpConnectTimeout,
    TlsHandshakeError,
    TlsHandshakeTimeout,
    CertificateParseError,
    HttpConnectError,
    HttpTimeout,
}

impl ProbeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeErrorKind::TcpConnectError => "TCP connect error",
            ProbeErrorKind::TcpConnectTimeout => "TCP connect timeout",
            ProbeErrorKind::TlsHandshakeError => "TLS handshake error",
            ProbeErrorKind::TlsHandshakeTimeout => "TLS handshake timeout",
            ProbeErrorKind::CertificateParseError => "Certificate parse error",
            ProbeErrorKind::HttpConnectError => "HTTP connect error",
            ProbeErrorKind::HttpTimeout => "HTTP timeout",
        }
    }
}

/// Thread-safe probe failure counters.
///
/// Probes run concurrently in bounded batches, so the counters are atomic
/// and the struct is shared behind an `Arc`.
pub struct ProbeStats {
    errors: HashMap<ProbeErrorKind, AtomicUsize>,
}

impl ProbeStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for kind in ProbeErrorKind::iter() {
            errors.insert(kind, AtomicUsize::new(0));
        }
        ProbeStats { errors }
    }

    pub fn increment(&self, kind: ProbeErrorKind) {
        // All kinds are initialized in new(), so the lookup cannot fail
        self.errors
            .get(&kind)
            .unwrap()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_count(&self, kind: ProbeErrorKind) -> usize {
        self.errors.get(&kind).unwrap().load(Ordering::SeqCst)
    }

    /// Total failures across all kinds.
    pub fn total(&self) -> usize {
        ProbeErrorKind::iter().map(|k| self.get_count(k)).sum()
    }

    /// Logs a one-line-per-kind summary of non-zero counters.
    pub fn log_summary(&self) {
        for kind in ProbeErrorKind::iter() {
            let count = self.get_count(kind);
            if count > 0 {
                log::info!("{}: {}", kind.as_str(), count);
            }
        }
    }
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_stats_initialization() {
        let stats = ProbeStats::new();
        for kind in ProbeErrorKind::iter() {
            assert_eq!(stats.get_count(kind), 0);
        }
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_probe_stats_increment() {
        let stats = ProbeStats::new();
        stats.increment(ProbeErrorKind::HttpTimeout);
        stats.increment(ProbeErrorKind::HttpTimeout);
        stats.increment(ProbeErrorKind::TlsHandshakeError);
        assert_eq!(stats.get_count(ProbeErrorKind::HttpTimeout), 2);
        assert_eq!(stats.get_count(ProbeErrorKind::TlsHandshakeError), 1);
        assert_eq!(stats.get_count(ProbeErrorKind::TcpConnectError), 0);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_ingest_error_messages() {
        let err = IngestError::MissingColumns {
            found: "ttl, owner".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("missing required columns"));
        assert!(msg.contains("ttl, owner"));
    }
}
