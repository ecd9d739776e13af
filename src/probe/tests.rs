use super::*;
use crate::ingest::{ParsedInput, RawRow};

fn store_with_owners(owners: &[&str]) -> RecordStore {
    let rows = owners
        .iter()
        .map(|owner| RawRow {
            ttl: Some("3600".to_string()),
            name: owner.to_string(),
            rtype: "A".to_string(),
            value: "192.0.2.1".to_string(),
            view: Some("ext".to_string()),
        })
        .collect();
    RecordStore::build(&ParsedInput {
        rows,
        has_ttl: true,
        has_view: true,
    })
}

#[test]
fn test_classify_expiry_thresholds() {
    assert_eq!(
        certificate::classify_expiry(-1),
        (CertStatus::Expired, ProbeSeverity::Critical)
    );
    assert_eq!(
        certificate::classify_expiry(0),
        (CertStatus::ExpiringSoon, ProbeSeverity::Critical)
    );
    assert_eq!(
        certificate::classify_expiry(7),
        (CertStatus::ExpiringSoon, ProbeSeverity::Critical)
    );
    assert_eq!(
        certificate::classify_expiry(8),
        (CertStatus::ExpiringWarning, ProbeSeverity::Warning)
    );
    assert_eq!(
        certificate::classify_expiry(21),
        (CertStatus::ExpiringWarning, ProbeSeverity::Warning)
    );
    assert_eq!(
        certificate::classify_expiry(22),
        (CertStatus::Valid, ProbeSeverity::Ok)
    );
    assert_eq!(
        certificate::classify_expiry(365),
        (CertStatus::Valid, ProbeSeverity::Ok)
    );
}

#[test]
fn test_probe_targets_exclusions() {
    let store = store_with_owners(&[
        "www.example.com",
        "*.example.com",
        "_dmarc.example.com",
        "sel1._domainkey.example.com",
        "autodiscover.example.com",
        "5.2.0.192.in-addr.arpa",
        "1.0.0.8.b.d.0.1.0.0.2.ip6.arpa",
    ]);
    let targets = probe_targets(&store);
    assert_eq!(targets, vec!["autodiscover.example.com", "www.example.com"]);
}

#[tokio::test]
async fn test_check_http_unroutable_ip_resolves_to_error() {
    let stats = Arc::new(ProbeStats::new());
    // TEST-NET-1 address: nothing answers, both protocols must fail fast
    let result = check_http("unreachable.example.com", "192.0.2.1", "ext", 200, Arc::clone(&stats)).await;
    assert_eq!(result.protocol, Protocol::None);
    assert_eq!(result.status_code, None);
    assert!(result.error.is_some());
    assert!(stats.total() >= 1);
}

#[tokio::test]
async fn test_check_http_invalid_ip_resolves_to_error() {
    let stats = Arc::new(ProbeStats::new());
    let result = check_http("www.example.com", "not-an-ip", "ext", 200, stats).await;
    assert_eq!(result.protocol, Protocol::None);
    assert!(result.error.unwrap().contains("Invalid address"));
}

#[tokio::test]
async fn test_check_certificate_unroutable_resolves_to_error() {
    let stats = Arc::new(ProbeStats::new());
    let result = check_certificate("unreachable.example.com", 443, stats).await;
    // TEST-NET is not routable, but whatever the failure mode, the probe
    // must resolve to a structured error rather than panic or hang
    assert_eq!(result.status, CertStatus::Error);
    assert_eq!(result.severity, ProbeSeverity::Error);
    assert!(result.error.is_some());
}

#[test]
fn test_probe_severity_labels() {
    assert_eq!(ProbeSeverity::Ok.label(), "OK");
    assert_eq!(ProbeSeverity::Critical.label(), "CRITICAL");
    assert_eq!(CertStatus::Expired.label(), "expired");
    assert_eq!(Protocol::Https.label(), "https");
}
