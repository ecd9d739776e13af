//! Plain-text validation report.
//!
//! Renders the violation list, the certificate summary, and the HTTP
//! availability summary into a single human-readable file. Violations are
//! grouped CRITICAL first, then WARNING, then INFO, with per-rule tallies
//! at the end; identical certificates served from several hosts are
//! grouped by serial so one wildcard certificate appears once with its
//! covered domains.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::probe::{CertificateCheck, HttpCheck, ProbeSeverity, Protocol};
use crate::store::RecordStore;
use crate::validate::{RuleCode, Severity, Violation};

const RULE_LINE: &str =
    "================================================================================";

/// Everything the report renders from; all borrowed, nothing recomputed.
pub struct ReportContext<'a> {
    pub source: &'a Path,
    pub store: &'a RecordStore,
    pub violations: &'a [Violation],
    pub ignored_rules: &'a [String],
    pub certificates: &'a [CertificateCheck],
    pub http_checks: &'a [HttpCheck],
}

/// Renders the full report as a string.
pub fn render_report(ctx: &ReportContext) -> String {
    let mut out = String::new();

    header(&mut out, ctx);
    if !ctx.certificates.is_empty() {
        certificate_section(&mut out, ctx.certificates);
    }
    if !ctx.http_checks.is_empty() {
        http_section(&mut out, ctx.http_checks);
    }
    violation_sections(&mut out, ctx.violations);
    rule_summary(&mut out, ctx.violations);

    out
}

/// Renders and writes the report to `path`.
pub fn write_report(path: &Path, ctx: &ReportContext) -> Result<()> {
    std::fs::write(path, render_report(ctx))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    log::info!("Validation report written to {}", path.display());
    Ok(())
}

fn header(out: &mut String, ctx: &ReportContext) {
    let title = if ctx.certificates.is_empty() {
        "DNS RFC VALIDATION REPORT"
    } else {
        "DNS RFC VALIDATION REPORT & SSL/TLS CERTIFICATES"
    };
    out.push_str(RULE_LINE);
    out.push('\n');
    out.push_str(&format!("              {title}\n"));
    out.push_str(RULE_LINE);
    out.push_str("\n\n");
    out.push_str(&format!("Date: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("Source file: {}\n", ctx.source.display()));
    out.push_str(&format!("Domains analyzed: {}\n", ctx.store.domain_count()));
    out.push_str(&format!("Violations detected: {}\n", ctx.violations.len()));
    if !ctx.ignored_rules.is_empty() {
        out.push_str(&format!(
            "Ignored rules (--ignore-rules): {}\n",
            ctx.ignored_rules.join(", ")
        ));
    }
    out.push('\n');
}

/// Groups certificate results by certificate identity.
fn group_certificates<'a>(
    certificates: &'a [CertificateCheck],
) -> BTreeMap<String, (&'a CertificateCheck, Vec<&'a str>)> {
    let mut groups: BTreeMap<String, (&CertificateCheck, Vec<&str>)> = BTreeMap::new();
    for cert in certificates {
        let key = match &cert.cert_id {
            Some(id) => id.clone(),
            // Failures stay separate, one entry per host
            None => format!("error_{}", cert.hostname),
        };
        groups
            .entry(key)
            .or_insert((cert, Vec::new()))
            .1
            .push(cert.hostname.as_str());
    }
    groups
}

fn certificate_section(out: &mut String, certificates: &[CertificateCheck]) {
    let groups = group_certificates(certificates);
    let ok = groups.values().filter(|(c, _)| c.severity == ProbeSeverity::Ok).count();
    let warning = groups.values().filter(|(c, _)| c.severity == ProbeSeverity::Warning).count();
    let critical = groups.values().filter(|(c, _)| c.severity == ProbeSeverity::Critical).count();
    let errors = groups.values().filter(|(c, _)| c.severity == ProbeSeverity::Error).count();

    out.push_str(&format!("SSL/TLS CERTIFICATES VERIFIED: {}\n", groups.len()));
    out.push_str(&format!("  OK (>21d): {ok}\n"));
    out.push_str(&format!("  WARNING (7-21d): {warning}\n"));
    out.push_str(&format!("  CRITICAL (<7d): {critical}\n"));
    out.push_str(&format!("  ERRORS: {errors}\n\n"));

    if critical > 0 {
        out.push_str("CERTIFICATES EXPIRED OR EXPIRING UNDER 7 DAYS:\n");
        for (cert, hosts) in groups.values().filter(|(c, _)| c.severity == ProbeSeverity::Critical)
        {
            render_cert_group(out, cert, hosts);
        }
        out.push('\n');
    }
    if warning > 0 {
        out.push_str("CERTIFICATES EXPIRING IN 7-21 DAYS:\n");
        for (cert, hosts) in groups.values().filter(|(c, _)| c.severity == ProbeSeverity::Warning)
        {
            render_cert_group(out, cert, hosts);
        }
        out.push('\n');
    }
    if errors > 0 {
        out.push_str("SSL CONNECTION ERRORS:\n");
        for (cert, _) in groups.values().filter(|(c, _)| c.severity == ProbeSeverity::Error) {
            out.push_str(&format!(
                "  {} - {}\n",
                cert.hostname,
                cert.error.as_deref().unwrap_or("unknown error")
            ));
        }
        out.push('\n');
    }
}

fn render_cert_group(out: &mut String, cert: &CertificateCheck, hosts: &[&str]) {
    match cert.days_until_expiry {
        Some(days) if days < 0 => {
            out.push_str(&format!("  {} - EXPIRED for {} day(s)\n", cert.hostname, -days));
        }
        Some(days) => {
            out.push_str(&format!("  {} - expires in {} day(s)\n", cert.hostname, days));
        }
        None => out.push_str(&format!("  {}\n", cert.hostname)),
    }
    if let Some(issuer) = &cert.issuer {
        out.push_str(&format!("    Issuer: {issuer}\n"));
    }
    if let Some(valid_to) = cert.valid_to {
        out.push_str(&format!("    Valid until: {}\n", valid_to.format("%Y-%m-%d")));
    }
    if hosts.len() > 1 {
        out.push_str(&format!(
            "    Covered domains ({}): {}\n",
            hosts.len(),
            hosts.join(", ")
        ));
    }
}

fn http_section(out: &mut String, checks: &[HttpCheck]) {
    let in_class = |check: &HttpCheck, lo: u16, hi: u16| {
        check.status_code.map(|c| c >= lo && c < hi).unwrap_or(false)
    };
    let ok = checks.iter().filter(|c| in_class(c, 200, 300)).count();
    let redirects = checks.iter().filter(|c| in_class(c, 300, 400)).count();
    let client_errors = checks.iter().filter(|c| in_class(c, 400, 500)).count();
    let server_errors = checks.iter().filter(|c| in_class(c, 500, 600)).count();
    let connection_errors = checks.iter().filter(|c| c.protocol == Protocol::None).count();

    out.push_str(&format!("HTTP/HTTPS AVAILABILITY: {} check(s) (HTTPS-FIRST strategy)\n", checks.len()));
    out.push_str("Note: DNS resolution forced from the zone export, not the system resolver\n");
    out.push_str(&format!("  Accessible (2xx): {ok}\n"));
    out.push_str(&format!("  Redirects (3xx): {redirects}\n"));
    out.push_str(&format!("  Client errors (4xx): {client_errors}\n"));
    out.push_str(&format!("  Server errors (5xx): {server_errors}\n"));
    out.push_str(&format!("  Connection errors: {connection_errors}\n\n"));

    out.push_str("Test results:\n");
    for check in checks {
        match check.status_code {
            Some(code) => out.push_str(&format!(
                "  {} [{}] via {} -> {} {} ({} ms)\n",
                check.fqdn,
                check.view,
                check.ip,
                check.protocol.label(),
                code,
                check.response_time_ms
            )),
            None => out.push_str(&format!(
                "  {} [{}] via {} -> unreachable ({})\n",
                check.fqdn,
                check.view,
                check.ip,
                check.error.as_deref().unwrap_or("unknown error")
            )),
        }
    }
    out.push('\n');
}

fn violation_sections(out: &mut String, violations: &[Violation]) {
    if violations.is_empty() {
        out.push_str("No DNS violations detected. Configuration complies with RFC standards.\n\n");
        return;
    }

    let critical = violations.iter().filter(|v| v.severity == Severity::Critical).count();
    let warning = violations.iter().filter(|v| v.severity == Severity::Warning).count();
    let info = violations.iter().filter(|v| v.severity == Severity::Info).count();
    out.push_str(&format!("BLOCKING VIOLATIONS (CRITICAL): {critical}\n"));
    out.push_str(&format!("ISSUES TO FIX (WARNING): {warning}\n"));
    out.push_str(&format!("BEST PRACTICES (INFO): {info}\n\n"));

    let sections = [
        (Severity::Critical, "BLOCKING VIOLATIONS (TO FIX IMMEDIATELY):"),
        (Severity::Warning, "ISSUES TO FIX QUICKLY:"),
        (Severity::Info, "RECOMMENDATIONS (BEST PRACTICES):"),
    ];
    for (severity, heading) in sections {
        let mut selected: Vec<&Violation> =
            violations.iter().filter(|v| v.severity == severity).collect();
        if selected.is_empty() {
            continue;
        }
        selected.sort_by(|a, b| (a.domain.as_str(), a.rule.to_string())
            .cmp(&(b.domain.as_str(), b.rule.to_string())));

        out.push_str(heading);
        out.push('\n');
        let index = violations_by_domain_filtered(&selected);
        for (domain, domain_violations) in index {
            out.push_str(&format!("  {domain}\n"));
            for violation in domain_violations {
                out.push_str(&format!(
                    "    [{}] {}\n      Reference: {}\n",
                    violation.rule, violation.message, violation.reference
                ));
            }
        }
        out.push('\n');
    }
}

fn violations_by_domain_filtered<'a>(
    selected: &[&'a Violation],
) -> BTreeMap<&'a str, Vec<&'a Violation>> {
    let mut index: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
    for violation in selected {
        index.entry(violation.domain.as_str()).or_default().push(violation);
    }
    index
}

fn rule_summary(out: &mut String, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    let mut counts: BTreeMap<RuleCode, usize> = BTreeMap::new();
    for violation in violations {
        *counts.entry(violation.rule).or_default() += 1;
    }
    out.push_str("RULE SUMMARY:\n");
    let mut ordered: Vec<(RuleCode, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
    for (rule, count) in ordered {
        out.push_str(&format!("  {rule}: {count}\n"));
    }
}
