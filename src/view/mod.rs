//! View-tag and IP-address classification.
//!
//! Split-horizon DNS exports tag each record with one or more "views"
//! (network vantage points). This module classifies those tags as internal
//! or external and classifies IP addresses as private or public, which the
//! validation rules combine to avoid false positives across views.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Visibility class of a record's view-tag set.
///
/// A tag containing `int` or `priv` (case-insensitive) counts as internal;
/// a tag containing `ext` or `pub` counts as external. A set with tags on
/// both sides classifies as `Both`; a set with neither (e.g. the implicit
/// `default` view) classifies as `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewClass {
    Internal,
    External,
    Both,
    Default,
}

impl ViewClass {
    /// Classifies a set of raw view tags.
    pub fn of(views: &BTreeSet<String>) -> Self {
        let mut internal = false;
        let mut external = false;
        for view in views {
            let v = view.to_lowercase();
            if v.contains("int") || v.contains("priv") {
                internal = true;
            }
            if v.contains("ext") || v.contains("pub") {
                external = true;
            }
        }
        match (internal, external) {
            (true, true) => ViewClass::Both,
            (true, false) => ViewClass::Internal,
            (false, true) => ViewClass::External,
            (false, false) => ViewClass::Default,
        }
    }

    /// Short label used in reports and the analysis CSV.
    pub fn label(&self) -> &'static str {
        match self {
            ViewClass::Internal => "internal",
            ViewClass::External => "external",
            ViewClass::Both => "both",
            ViewClass::Default => "default",
        }
    }
}

/// Returns true when the view set contains at least one externally
/// classified tag (`External` or `Both`).
///
/// Rules that only apply to records visible from the public internet
/// (SPF permissiveness, private-IP leaks, public MX detection) gate on this.
pub fn is_externally_visible(views: &BTreeSet<String>) -> bool {
    matches!(ViewClass::of(views), ViewClass::External | ViewClass::Both)
}

/// Returns true when two view-tag sets intersect.
///
/// Records are considered to share visibility when at least one raw tag is
/// common to both sets; coexistence and glue rules only fire on shared
/// visibility.
pub fn views_intersect(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    a.intersection(b).next().is_some()
}

/// Collapses IPv4-mapped and IPv4-embedded IPv6 textual forms to plain IPv4.
///
/// `::ffff:192.168.1.1` and `::192.168.1.1` both become `192.168.1.1`.
/// Anything else (including canonical IPv6) is returned unchanged; only the
/// dotted-quad textual forms are rewritten, so `::1` stays `::1`.
pub fn normalize_mapped_ipv4(ip: &str) -> String {
    let lower = ip.to_lowercase();
    if let Some(rest) = lower.strip_prefix("::ffff:") {
        if rest.parse::<Ipv4Addr>().is_ok() {
            return rest.to_string();
        }
    }
    if let Some(rest) = lower.strip_prefix("::") {
        if rest.parse::<Ipv4Addr>().is_ok() {
            return rest.to_string();
        }
    }
    ip.to_string()
}

/// Classifies an IP address as private/special-use.
///
/// Covers RFC 1918 ranges, IPv4 loopback and link-local, IPv6 ULA
/// (`fc00::/7`), IPv6 link-local (`fe80::/10`), the IPv6 loopback, and
/// IPv4-mapped forms of any of the above. Unparsable input classifies as
/// public (false).
pub fn is_private_ip(ip: &str) -> bool {
    match normalize_mapped_ipv4(ip).parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_private_v4(v4),
        Ok(IpAddr::V6(v6)) => is_private_v6(v6),
        Err(_) => false,
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() {
        return true;
    }
    // fc00::/7 unique local addresses
    if (ip.segments()[0] & 0xfe00) == 0xfc00 {
        return true;
    }
    // fe80::/10 link-local
    if (ip.segments()[0] & 0xffc0) == 0xfe80 {
        return true;
    }
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_v4(v4);
    }
    false
}
