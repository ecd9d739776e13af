//! Record and graph node types.

use std::collections::BTreeSet;

use serde::Serialize;
use strum_macros::{Display as DisplayMacro, EnumString as EnumStringMacro};

/// DNS record type.
///
/// Unknown types survive ingestion as `Other` so they still appear in the
/// graph data and the analysis CSV; the validation rules simply have
/// nothing to say about them.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, DisplayMacro, EnumStringMacro,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Txt,
    Soa,
    Srv,
    Ptr,
    #[strum(default, to_string = "{0}")]
    Other(String),
}

impl RecordType {
    /// True for the address types that feed the IP node map.
    pub fn is_address(&self) -> bool {
        matches!(self, RecordType::A | RecordType::Aaaa)
    }
}

/// One logical DNS record, possibly visible in several views.
///
/// Two input rows that agree on (owner, type, value, ttl) merge into a
/// single record whose `views` is the union of the rows' view tags; any
/// differing field yields a distinct record with its own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    /// Stable, per-source-row identifier used for diagram back-references.
    pub id: String,
    /// Normalized owner FQDN (lowercase, no trailing dot).
    pub owner: String,
    pub rtype: RecordType,
    /// Normalized record data. MX values keep their priority prefix here;
    /// use [`ResourceRecord::mx_target`] for the bare exchange name.
    pub value: String,
    /// TTL in seconds, preserved as the source string.
    pub ttl: String,
    /// MX preference, parsed from the leading digits of `value`.
    pub priority: Option<u16>,
    /// Raw view tags this record is visible in.
    pub views: BTreeSet<String>,
}

impl ResourceRecord {
    /// The record value with any MX priority prefix stripped.
    pub fn mx_target(&self) -> &str {
        strip_mx_priority(&self.value)
    }

    /// TTL parsed as seconds; `None` when the source string is not numeric.
    pub fn ttl_secs(&self) -> Option<u64> {
        self.ttl.parse().ok()
    }

    /// True when this record and `other` are visible in at least one
    /// common view.
    pub fn shares_view_with(&self, other: &ResourceRecord) -> bool {
        crate::view::views_intersect(&self.views, &other.views)
    }

    /// Comma-joined raw view tags, for reports.
    pub fn views_label(&self) -> String {
        self.views.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

/// Strips a leading `<digits><space>` MX priority prefix from a value.
pub fn strip_mx_priority(value: &str) -> &str {
    let digits = value.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return value;
    }
    let rest = &value[digits..];
    let stripped = rest.trim_start();
    if stripped.len() == rest.len() {
        // No whitespace after the digits: not a priority prefix
        value
    } else {
        stripped
    }
}

/// Parses the MX preference from a value, defaulting to 100.
pub fn mx_priority(value: &str) -> u16 {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || !value[digits.len()..].starts_with(char::is_whitespace) {
        return 100;
    }
    digits.parse().unwrap_or(100)
}

/// One IP address referenced by A/AAAA records, with back-references.
///
/// Derived from the record set and rebuilt on every run; IPv4-mapped IPv6
/// forms collapse onto their IPv4 node.
#[derive(Debug, Clone, Serialize)]
pub struct IpNode {
    /// Normalized address (mapped IPv6 forms collapsed).
    pub ip: String,
    /// Textual forms the address appeared under in the source.
    pub original_ips: BTreeSet<String>,
    pub is_private: bool,
    /// (owner, record id) pairs of every A/AAAA row using this address.
    pub used_by: Vec<(String, String)>,
}

impl IpNode {
    pub fn use_count(&self) -> usize {
        self.used_by.len()
    }
}

/// Kind of a directed record-to-name edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, DisplayMacro)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LinkKind {
    Cname,
    Mx,
    Ns,
}

/// Directed edge from a record to the owner name it points at.
///
/// Consumed by the external diagram emitter; MX targets are stored with
/// their priority prefix already stripped.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub from: String,
    pub target_owner: String,
    pub kind: LinkKind,
}
