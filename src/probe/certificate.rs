//! TLS certificate probe.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use rustls::pki_types::ServerName;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::FromDer;

use crate::config::{CERT_EXPIRY_CRITICAL_DAYS, CERT_EXPIRY_WARNING_DAYS, CERT_PROBE_TIMEOUT_MS};
use crate::error_handling::{ProbeErrorKind, ProbeStats};

use super::ProbeSeverity;

/// Certificate lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CertStatus {
    Valid,
    /// Expires within the warning window (8-21 days).
    ExpiringWarning,
    /// Expires within the critical window (0-7 days).
    ExpiringSoon,
    Expired,
    /// The certificate could not be retrieved.
    Error,
}

impl CertStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CertStatus::Valid => "valid",
            CertStatus::ExpiringWarning => "expiring_warning",
            CertStatus::ExpiringSoon => "expiring_soon",
            CertStatus::Expired => "expired",
            CertStatus::Error => "error",
        }
    }
}

/// Result of one certificate probe. Always produced, never an error.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateCheck {
    pub hostname: String,
    pub status: CertStatus,
    pub severity: ProbeSeverity,
    pub days_until_expiry: Option<i64>,
    pub issuer: Option<String>,
    /// Subject CN plus DNS SANs, deduplicated in order of appearance.
    pub names: Vec<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    /// Serial number; identical certificates served from several hosts
    /// group on this in the report.
    pub cert_id: Option<String>,
    pub error: Option<String>,
}

impl CertificateCheck {
    fn failed(hostname: &str, message: String) -> Self {
        CertificateCheck {
            hostname: hostname.to_string(),
            status: CertStatus::Error,
            severity: ProbeSeverity::Error,
            days_until_expiry: None,
            issuer: None,
            names: Vec::new(),
            valid_from: None,
            valid_to: None,
            cert_id: None,
            error: Some(message),
        }
    }
}

/// Maps days-until-expiry onto status and severity.
///
/// Expired or expiring within 7 days is CRITICAL, 8-21 days is WARNING,
/// beyond that OK.
pub fn classify_expiry(days_until_expiry: i64) -> (CertStatus, ProbeSeverity) {
    if days_until_expiry < 0 {
        (CertStatus::Expired, ProbeSeverity::Critical)
    } else if days_until_expiry <= CERT_EXPIRY_CRITICAL_DAYS {
        (CertStatus::ExpiringSoon, ProbeSeverity::Critical)
    } else if days_until_expiry <= CERT_EXPIRY_WARNING_DAYS {
        (CertStatus::ExpiringWarning, ProbeSeverity::Warning)
    } else {
        (CertStatus::Valid, ProbeSeverity::Ok)
    }
}

/// Retrieves and classifies the TLS certificate served at `host:port`.
///
/// The whole probe (TCP connect + handshake) is time-boxed; every failure
/// mode resolves to a [`CertificateCheck`] carrying the error message.
pub async fn check_certificate(host: &str, port: u16, stats: Arc<ProbeStats>) -> CertificateCheck {
    debug!("Checking TLS certificate for {host}:{port}");

    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let server_name = match ServerName::try_from(host.to_string()) {
        Ok(name) => name,
        Err(e) => {
            stats.increment(ProbeErrorKind::TlsHandshakeError);
            return CertificateCheck::failed(host, format!("Invalid server name: {e}"));
        }
    };

    let timeout = Duration::from_millis(CERT_PROBE_TIMEOUT_MS);
    let sock = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(sock)) => sock,
        Ok(Err(e)) => {
            stats.increment(ProbeErrorKind::TcpConnectError);
            return CertificateCheck::failed(host, format!("Failed to connect to {host}:{port} - {e}"));
        }
        Err(_) => {
            stats.increment(ProbeErrorKind::TcpConnectTimeout);
            return CertificateCheck::failed(host, format!("Connection timeout for {host}:{port}"));
        }
    };

    let connector = TlsConnector::from(Arc::new(config));
    let tls_stream = match tokio::time::timeout(timeout, connector.connect(server_name, sock)).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            stats.increment(ProbeErrorKind::TlsHandshakeError);
            return CertificateCheck::failed(host, format!("TLS handshake failed: {e}"));
        }
        Err(_) => {
            stats.increment(ProbeErrorKind::TlsHandshakeTimeout);
            return CertificateCheck::failed(host, format!("TLS handshake timeout for {host}"));
        }
    };

    let (_, session) = tls_stream.get_ref();
    let Some(der) = session.peer_certificates().and_then(|certs| certs.first()) else {
        stats.increment(ProbeErrorKind::CertificateParseError);
        return CertificateCheck::failed(host, "No certificate presented".to_string());
    };

    let cert = match x509_parser::certificate::X509Certificate::from_der(der.as_ref()) {
        Ok((_, cert)) => cert,
        Err(e) => {
            stats.increment(ProbeErrorKind::CertificateParseError);
            return CertificateCheck::failed(host, format!("Certificate parse error: {e}"));
        }
    };

    let tbs = &cert.tbs_certificate;
    let not_before = tbs.validity.not_before.timestamp();
    let not_after = tbs.validity.not_after.timestamp();
    let now = Utc::now().timestamp();
    let days_until_expiry = (not_after - now).div_euclid(86400);
    let (status, severity) = classify_expiry(days_until_expiry);

    let issuer = tbs
        .issuer
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(|s| s.to_string())
        .or_else(|| {
            tbs.issuer
                .iter_organization()
                .next()
                .and_then(|o| o.as_str().ok())
                .map(|s| s.to_string())
        });

    let mut names: Vec<String> = Vec::new();
    if let Some(cn) = tbs
        .subject
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
    {
        names.push(cn.to_string());
    }
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for general_name in &san.value.general_names {
            if let GeneralName::DNSName(dns) = general_name {
                if !names.iter().any(|n| n == dns) {
                    names.push(dns.to_string());
                }
            }
        }
    }

    CertificateCheck {
        hostname: host.to_string(),
        status,
        severity,
        days_until_expiry: Some(days_until_expiry),
        issuer,
        names,
        valid_from: DateTime::from_timestamp(not_before, 0),
        valid_to: DateTime::from_timestamp(not_after, 0),
        cert_id: Some(cert.raw_serial_as_string()),
        error: None,
    }
}
