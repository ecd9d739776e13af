//! Tests for command-line argument parsing.

use clap::Parser;
use zone_audit::Config;

#[test]
fn test_minimal_invocation() {
    let config = Config::try_parse_from(["zone_audit", "zones.csv"]).unwrap();
    assert_eq!(config.file.unwrap().to_str().unwrap(), "zones.csv");
    assert!(config.folder.is_none());
    assert_eq!(config.ssl_port, 443);
    assert_eq!(config.http_timeout_ms, 5000);
    assert_eq!(config.max_hops, 20);
    assert_eq!(config.report, "validation_report.txt");
    assert_eq!(config.csv_report, "analysis_report.csv");
    assert!(!config.email_validation);
    assert!(!config.no_validation);
    assert!(!config.show_orphans);
    assert!(!config.no_timestamp);
    assert!(config.ignore_rules.is_empty());
}

#[test]
fn test_file_required_unless_folder() {
    assert!(Config::try_parse_from(["zone_audit"]).is_err());

    let config = Config::try_parse_from(["zone_audit", "--folder", "./zones"]).unwrap();
    assert!(config.file.is_none());
    assert_eq!(config.folder.unwrap().to_str().unwrap(), "./zones");
}

#[test]
fn test_ignore_rules_comma_separated() {
    let config = Config::try_parse_from([
        "zone_audit",
        "zones.csv",
        "--ignore-rules",
        "CNAME_CHAIN,TTL_TOO_SHORT",
    ])
    .unwrap();
    assert_eq!(config.ignore_rules, vec!["CNAME_CHAIN", "TTL_TOO_SHORT"]);
}

#[test]
fn test_probe_flags() {
    let config = Config::try_parse_from([
        "zone_audit",
        "zones.csv",
        "--no-ssl-check",
        "--no-http-check",
        "--ssl-port",
        "8443",
        "--http-timeout-ms",
        "1000",
    ])
    .unwrap();
    assert!(config.no_ssl_check);
    assert!(config.no_http_check);
    assert_eq!(config.ssl_port, 8443);
    assert_eq!(config.http_timeout_ms, 1000);
}

#[test]
fn test_output_options() {
    let config = Config::try_parse_from([
        "zone_audit",
        "zones.csv",
        "--output-dir",
        "./out",
        "--no-timestamp",
        "--report",
        "report.txt",
        "--no-csv-report",
    ])
    .unwrap();
    assert_eq!(config.output_dir.unwrap().to_str().unwrap(), "./out");
    assert!(config.no_timestamp);
    assert_eq!(config.report, "report.txt");
    assert!(config.no_csv_report);
}

#[test]
fn test_validation_toggles() {
    let config = Config::try_parse_from([
        "zone_audit",
        "zones.csv",
        "--no-validation",
        "--email-validation",
        "--show-orphans",
        "--max-hops",
        "40",
    ])
    .unwrap();
    assert!(config.no_validation);
    assert!(config.email_validation);
    assert!(config.show_orphans);
    assert_eq!(config.max_hops, 40);
}

#[test]
fn test_invalid_log_level_rejected() {
    assert!(Config::try_parse_from(["zone_audit", "zones.csv", "--log-level", "loud"]).is_err());
}
