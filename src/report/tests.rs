use super::*;
use crate::ingest::{ParsedInput, RawRow};
use crate::probe::CertStatus;
use crate::validate::{validate_dns, RuleConfig};
use std::path::PathBuf;

fn fixture_store() -> RecordStore {
    let rows = vec![
        ("3600", "example.com", "TXT", "v=spf1 +all", "ext"),
        ("3600", "www.example.com", "CNAME", "web.example.com", "ext"),
        ("3600", "www.example.com", "A", "10.0.0.1", "ext"),
        ("30", "api.example.com", "A", "203.0.113.1", "ext"),
    ]
    .into_iter()
    .map(|(ttl, name, rtype, value, view)| RawRow {
        ttl: Some(ttl.to_string()),
        name: name.to_string(),
        rtype: rtype.to_string(),
        value: value.to_string(),
        view: Some(view.to_string()),
    })
    .collect();
    RecordStore::build(&ParsedInput {
        rows,
        has_ttl: true,
        has_view: true,
    })
}

#[test]
fn test_report_contains_counts_and_sections() {
    let store = fixture_store();
    let violations = validate_dns(&store, &RuleConfig::default());
    assert!(!violations.is_empty());

    let source = PathBuf::from("zones.csv");
    let ctx = ReportContext {
        source: &source,
        store: &store,
        violations: &violations,
        ignored_rules: &[],
        certificates: &[],
        http_checks: &[],
    };
    let report = render_report(&ctx);

    assert!(report.contains("DNS RFC VALIDATION REPORT"));
    assert!(report.contains("Source file: zones.csv"));
    assert!(report.contains("Domains analyzed: 3"));
    assert!(report.contains(&format!("Violations detected: {}", violations.len())));
    assert!(report.contains("BLOCKING VIOLATIONS (TO FIX IMMEDIATELY):"));
    assert!(report.contains("CNAME_COEXISTENCE"));
    assert!(report.contains("SPF_TOO_PERMISSIVE"));
    assert!(report.contains("TTL_TOO_SHORT"));
    assert!(report.contains("RULE SUMMARY:"));
    assert!(report.contains("RFC 1034 Section 3.6.2"));
}

#[test]
fn test_report_clean_configuration() {
    let store = RecordStore::build(&ParsedInput {
        rows: vec![RawRow {
            ttl: Some("3600".to_string()),
            name: "www.example.com".to_string(),
            rtype: "AAAA".to_string(),
            value: "2001:db8::1".to_string(),
            view: Some("ext".to_string()),
        }],
        has_ttl: true,
        has_view: true,
    });
    let violations = validate_dns(&store, &RuleConfig::default());
    assert!(violations.is_empty());

    let source = PathBuf::from("clean.csv");
    let ctx = ReportContext {
        source: &source,
        store: &store,
        violations: &violations,
        ignored_rules: &[],
        certificates: &[],
        http_checks: &[],
    };
    let report = render_report(&ctx);
    assert!(report.contains("No DNS violations detected"));
    assert!(!report.contains("RULE SUMMARY"));
}

#[test]
fn test_report_lists_ignored_rules() {
    let store = fixture_store();
    let source = PathBuf::from("zones.csv");
    let ignored = vec!["CNAME_CHAIN".to_string(), "TTL_TOO_SHORT".to_string()];
    let ctx = ReportContext {
        source: &source,
        store: &store,
        violations: &[],
        ignored_rules: &ignored,
        certificates: &[],
        http_checks: &[],
    };
    let report = render_report(&ctx);
    assert!(report.contains("Ignored rules (--ignore-rules): CNAME_CHAIN, TTL_TOO_SHORT"));
}

#[test]
fn test_certificate_grouping_by_serial() {
    let mut cert = CertificateCheck {
        hostname: "www.example.com".to_string(),
        status: CertStatus::Valid,
        severity: ProbeSeverity::Ok,
        days_until_expiry: Some(90),
        issuer: Some("Example CA".to_string()),
        names: vec!["*.example.com".to_string()],
        valid_from: None,
        valid_to: None,
        cert_id: Some("ab:cd".to_string()),
        error: None,
    };
    let mut certs = vec![cert.clone()];
    cert.hostname = "api.example.com".to_string();
    certs.push(cert);

    let groups = group_certificates(&certs);
    assert_eq!(groups.len(), 1);
    let (_, hosts) = groups.values().next().unwrap();
    assert_eq!(hosts.len(), 2);
}

#[test]
fn test_http_section_counts() {
    let check = |code: Option<u16>, protocol: Protocol| HttpCheck {
        fqdn: "www.example.com".to_string(),
        ip: "203.0.113.1".to_string(),
        view: "ext".to_string(),
        protocol,
        status_code: code,
        error: if code.is_none() {
            Some("timeout".to_string())
        } else {
            None
        },
        response_time_ms: 12,
    };
    let checks = vec![
        check(Some(200), Protocol::Https),
        check(Some(301), Protocol::Https),
        check(Some(404), Protocol::Http),
        check(Some(503), Protocol::Https),
        check(None, Protocol::None),
    ];
    let store = fixture_store();
    let source = PathBuf::from("zones.csv");
    let ctx = ReportContext {
        source: &source,
        store: &store,
        violations: &[],
        ignored_rules: &[],
        certificates: &[],
        http_checks: &checks,
    };
    let report = render_report(&ctx);
    assert!(report.contains("Accessible (2xx): 1"));
    assert!(report.contains("Redirects (3xx): 1"));
    assert!(report.contains("Client errors (4xx): 1"));
    assert!(report.contains("Server errors (5xx): 1"));
    assert!(report.contains("Connection errors: 1"));
    assert!(report.contains("unreachable (timeout)"));
}
