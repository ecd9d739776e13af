//! Live network probes: TLS certificate status and HTTP/HTTPS availability.
//!
//! Both probes are strictly time-boxed and always resolve to a structured
//! result; no failure mode ever propagates as an error, so report
//! generation can never be blocked by a dead host. HTTP probes force
//! resolution to the addresses found in the zone export (the `Host` header
//! and SNI carry the FQDN, the connection goes to the CSV's IP), so a view
//! can be tested exactly as its resolvers would answer.

mod certificate;
mod http;

pub use certificate::{check_certificate, CertStatus, CertificateCheck};
pub use http::{check_http, HttpCheck, Protocol};

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::info;

use crate::config::{CERT_PROBE_BATCH, HTTP_PROBE_BATCH};
use crate::error_handling::ProbeStats;
use crate::store::RecordStore;

/// Probe-result severity: validation severities plus an error bucket for
/// hosts that could not be checked at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ProbeSeverity {
    Ok,
    Warning,
    Critical,
    Error,
}

impl ProbeSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            ProbeSeverity::Ok => "OK",
            ProbeSeverity::Warning => "WARNING",
            ProbeSeverity::Critical => "CRITICAL",
            ProbeSeverity::Error => "ERROR",
        }
    }
}

/// Owners worth probing: skips wildcards, underscore-prefixed technical
/// names, DKIM selectors, and reverse zones.
pub fn probe_targets(store: &RecordStore) -> Vec<&str> {
    store
        .domains()
        .keys()
        .map(|owner| owner.as_str())
        .filter(|owner| {
            !owner.starts_with('*')
                && !owner.starts_with('_')
                && !owner.contains("._domainkey.")
                && !owner.ends_with(".in-addr.arpa")
                && !owner.ends_with(".ip6.arpa")
        })
        .collect()
}

/// Checks the TLS certificate of every probe target, in bounded batches.
///
/// Results come back sorted by hostname so downstream output is
/// deterministic regardless of completion order.
pub async fn run_certificate_checks(
    store: &RecordStore,
    port: u16,
    stats: Arc<ProbeStats>,
) -> Vec<CertificateCheck> {
    let targets = probe_targets(store);
    info!("Checking TLS certificates for {} domain(s) on port {port}", targets.len());

    let mut results: Vec<CertificateCheck> = stream::iter(targets)
        .map(|host| {
            let stats = Arc::clone(&stats);
            async move { check_certificate(host, port, stats).await }
        })
        .buffer_unordered(CERT_PROBE_BATCH)
        .collect()
        .await;

    results.sort_by(|a, b| a.hostname.cmp(&b.hostname));
    results
}

/// Checks HTTP/HTTPS availability of every probe target against each of
/// its CSV-resolved addresses, in bounded batches.
pub async fn run_http_checks(
    store: &RecordStore,
    timeout_ms: u64,
    stats: Arc<ProbeStats>,
) -> Vec<HttpCheck> {
    let mut checks = Vec::new();
    for host in probe_targets(store) {
        for resolved in store.resolve_to_ips(host) {
            let view = resolved
                .views
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(",");
            checks.push((host.to_string(), resolved.ip, view));
        }
    }
    info!("Running {} HTTP/HTTPS check(s) (HTTPS-first strategy)", checks.len());

    let mut results: Vec<HttpCheck> = stream::iter(checks)
        .map(|(host, ip, view)| {
            let stats = Arc::clone(&stats);
            async move { check_http(&host, &ip, &view, timeout_ms, stats).await }
        })
        .buffer_unordered(HTTP_PROBE_BATCH)
        .collect()
        .await;

    results.sort_by(|a, b| (a.fqdn.as_str(), a.ip.as_str()).cmp(&(b.fqdn.as_str(), b.ip.as_str())));
    results
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
