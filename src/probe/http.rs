//! HTTP/HTTPS availability probe with forced DNS resolution.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use serde::Serialize;

use crate::error_handling::{ProbeErrorKind, ProbeStats};

/// Protocol that ultimately answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Protocol {
    Https,
    Http,
    /// Neither protocol produced a status code.
    None,
}

impl Protocol {
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Http => "http",
            Protocol::None => "none",
        }
    }
}

/// Result of one availability probe. Always produced, never an error.
///
/// `status_code` is present whenever a server answered, including 4xx/5xx;
/// `error` describes why no answer was obtained (timeout, refused, bad IP).
#[derive(Debug, Clone, Serialize)]
pub struct HttpCheck {
    pub fqdn: String,
    pub ip: String,
    /// View label(s) the probed address was resolved under.
    pub view: String,
    pub protocol: Protocol,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub response_time_ms: u64,
}

/// Tests availability of `fqdn` at `ip`, HTTPS first.
///
/// The connection goes to the zone export's address rather than whatever
/// the system resolver would return: the client pins `fqdn` to `ip`, while
/// SNI and the `Host` header carry the FQDN. HTTPS is authoritative when it
/// answers with any status code; HTTP is only consulted as a fallback.
/// Self-signed certificates are accepted: this probe measures
/// reachability, not trust (the certificate probe handles that).
pub async fn check_http(
    fqdn: &str,
    ip: &str,
    view: &str,
    timeout_ms: u64,
    stats: Arc<ProbeStats>,
) -> HttpCheck {
    debug!("Checking HTTP/HTTPS availability for {fqdn} via {ip} (view: {view})");

    let mut result = HttpCheck {
        fqdn: fqdn.to_string(),
        ip: ip.to_string(),
        view: view.to_string(),
        protocol: Protocol::None,
        status_code: None,
        error: None,
        response_time_ms: 0,
    };

    let addr: IpAddr = match ip.parse() {
        Ok(addr) => addr,
        Err(e) => {
            result.error = Some(format!("Invalid address {ip}: {e}"));
            return result;
        }
    };

    let client = match reqwest::Client::builder()
        .resolve(fqdn, SocketAddr::new(addr, 0))
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_millis(timeout_ms))
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!("zone_audit/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            result.error = Some(format!("Client build error: {e}"));
            return result;
        }
    };

    let start = Instant::now();
    match client.head(format!("https://{fqdn}/")).send().await {
        Ok(response) => {
            // Any HTTPS status code, including 4xx/5xx, is the answer
            result.protocol = Protocol::Https;
            result.status_code = Some(response.status().as_u16());
            result.response_time_ms = start.elapsed().as_millis() as u64;
            return result;
        }
        Err(e) => {
            if e.is_timeout() {
                stats.increment(ProbeErrorKind::HttpTimeout);
            } else {
                stats.increment(ProbeErrorKind::HttpConnectError);
            }
            result.error = Some(format!("HTTPS: {e}"));
        }
    }

    // HTTPS failed entirely: fall back to plain HTTP
    let start = Instant::now();
    match client.head(format!("http://{fqdn}/")).send().await {
        Ok(response) => {
            result.protocol = Protocol::Http;
            result.status_code = Some(response.status().as_u16());
            result.error = None;
            result.response_time_ms = start.elapsed().as_millis() as u64;
        }
        Err(e) => {
            if e.is_timeout() {
                stats.increment(ProbeErrorKind::HttpTimeout);
            } else {
                stats.increment(ProbeErrorKind::HttpConnectError);
            }
            result.error = Some(format!("{}; HTTP: {e}", result.error.take().unwrap_or_default()));
            result.response_time_ms = start.elapsed().as_millis() as u64;
        }
    }
    result
}
