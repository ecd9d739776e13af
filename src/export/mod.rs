//! Analysis CSV export.
//!
//! One flattened row per stored record: identity, views, classification,
//! the violation codes touching the record, and probe results where they
//! apply. Consumers are spreadsheets and downstream tooling, so everything
//! is stringly-typed and the header comes first.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;

use crate::probe::{CertificateCheck, HttpCheck};
use crate::store::RecordStore;
use crate::validate::{Severity, Violation};
use crate::view::{is_private_ip, ViewClass};

/// Writes the analysis CSV. Returns the number of record rows written.
pub fn write_analysis_csv(
    path: &Path,
    store: &RecordStore,
    violations: &[Violation],
    certificates: &[CertificateCheck],
    http_checks: &[HttpCheck],
) -> Result<usize> {
    // record id -> (codes, worst severity)
    let mut by_record: BTreeMap<&str, (Vec<String>, Option<Severity>)> = BTreeMap::new();
    for violation in violations {
        for record in &violation.affected {
            let entry = by_record.entry(record.id.as_str()).or_default();
            let code = violation.rule.to_string();
            if !entry.0.contains(&code) {
                entry.0.push(code);
            }
            let worse = match entry.1 {
                Some(current) if current.rank() <= violation.severity.rank() => current,
                _ => violation.severity,
            };
            entry.1 = Some(worse);
        }
    }

    let certs_by_host: BTreeMap<&str, &CertificateCheck> = certificates
        .iter()
        .map(|c| (c.hostname.as_str(), c))
        .collect();
    // First HTTP result per owner is representative: results are sorted by
    // (fqdn, ip) and HTTPS wins over HTTP within one check already
    let mut http_by_host: BTreeMap<&str, &HttpCheck> = BTreeMap::new();
    for check in http_checks {
        http_by_host.entry(check.fqdn.as_str()).or_insert(check);
    }

    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create analysis CSV at {}", path.display()))?;

    writer.write_record([
        "domain",
        "record_id",
        "type",
        "value",
        "ttl",
        "views",
        "view_class",
        "private_ip",
        "violation_codes",
        "max_severity",
        "cert_status",
        "cert_days_until_expiry",
        "http_protocol",
        "http_status",
    ])?;

    let mut count = 0;
    for (owner, records) in store.domains() {
        let cert = certs_by_host.get(owner.as_str());
        let http = http_by_host.get(owner.as_str());
        for record in records {
            let (codes, severity) = by_record
                .get(record.id.as_str())
                .map(|(codes, severity)| (codes.join(";"), *severity))
                .unwrap_or_default();
            let private = record.rtype.is_address() && is_private_ip(&record.value);

            writer.write_record(&[
                owner.clone(),
                record.id.clone(),
                record.rtype.to_string(),
                record.value.clone(),
                record.ttl.clone(),
                record.views_label(),
                ViewClass::of(&record.views).label().to_string(),
                if private { "true" } else { "false" }.to_string(),
                codes,
                severity.map(|s| s.to_string()).unwrap_or_default(),
                cert.map(|c| c.status.label().to_string()).unwrap_or_default(),
                cert.and_then(|c| c.days_until_expiry)
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                http.map(|h| h.protocol.label().to_string()).unwrap_or_default(),
                http.and_then(|h| h.status_code)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
            ])?;
            count += 1;
        }
    }

    writer.flush()?;
    log::info!("Analysis CSV written to {} ({count} records)", path.display());
    Ok(count)
}
