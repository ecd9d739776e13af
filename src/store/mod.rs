//! Record store builder.
//!
//! Turns the flat rows of a zone export into the domain-indexed structures
//! the validation engines and the diagram emitter work from: an owner →
//! records map, an IP → node map with back-references, and the directed
//! CNAME/MX/NS link list. Building is a pure, single-pass computation; the
//! result is immutable for the duration of a run and rebuilt per file.

mod record;

pub use record::{
    mx_priority, strip_mx_priority, IpNode, Link, LinkKind, RecordType, ResourceRecord,
};

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::config::{DEFAULT_TTL, DEFAULT_VIEW};
use crate::ingest::ParsedInput;
use crate::view::{is_private_ip, normalize_mapped_ipv4};

/// Domain-indexed record store plus the structures derived from it.
///
/// Owners are kept in a `BTreeMap` so every traversal (validation, reports,
/// probes) is deterministic; records within an owner keep file order.
#[derive(Debug, Default)]
pub struct RecordStore {
    domains: BTreeMap<String, Vec<ResourceRecord>>,
    ips: BTreeMap<String, IpNode>,
    links: Vec<Link>,
}

/// An address reached by following CNAMEs from an owner, with the views it
/// was found under. Drives the forced-resolution HTTP probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIp {
    pub ip: String,
    pub rtype: RecordType,
    pub views: BTreeSet<String>,
    /// Owner of the A/AAAA record the walk ended on.
    pub owner: String,
}

impl RecordStore {
    /// Builds the store from parsed input rows.
    ///
    /// Rows identical in (owner, type, value, ttl) merge by unioning view
    /// tags; every other difference creates a distinct record. IP usage is
    /// accumulated for merged rows too, so `use_count` reflects source rows
    /// rather than merged records.
    pub fn build(input: &ParsedInput) -> RecordStore {
        let mut store = RecordStore::default();

        for (row_index, row) in input.rows.iter().enumerate() {
            let ttl = match row.ttl.as_deref() {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => DEFAULT_TTL.to_string(),
            };
            let view = match row.view.as_deref() {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => DEFAULT_VIEW.to_string(),
            };
            // Ingest guarantees uppercase; unknown types land in Other
            let rtype = RecordType::from_str(&row.rtype).unwrap_or_else(|_| {
                RecordType::Other(row.rtype.clone())
            });

            let records = store.domains.entry(row.name.clone()).or_default();

            if let Some(existing) = records
                .iter_mut()
                .find(|r| r.rtype == rtype && r.value == row.value && r.ttl == ttl)
            {
                // Same logical record seen from another view
                existing.views.insert(view);
                if existing.rtype.is_address() {
                    let id = existing.id.clone();
                    store.ips.entry(normalize_mapped_ipv4(&row.value)).and_modify(|node| {
                        node.original_ips.insert(row.value.clone());
                        node.used_by.push((row.name.clone(), id));
                    });
                }
                continue;
            }

            let id = synthesize_id(&row.name, &row.rtype, &row.value, &ttl, row_index);

            if rtype.is_address() {
                let normalized = normalize_mapped_ipv4(&row.value);
                let node = store.ips.entry(normalized.clone()).or_insert_with(|| IpNode {
                    is_private: is_private_ip(&normalized),
                    ip: normalized,
                    original_ips: BTreeSet::new(),
                    used_by: Vec::new(),
                });
                node.original_ips.insert(row.value.clone());
                node.used_by.push((row.name.clone(), id.clone()));
            }

            match rtype {
                RecordType::Cname => store.links.push(Link {
                    from: id.clone(),
                    target_owner: row.value.clone(),
                    kind: LinkKind::Cname,
                }),
                RecordType::Mx => store.links.push(Link {
                    from: id.clone(),
                    target_owner: strip_mx_priority(&row.value).to_string(),
                    kind: LinkKind::Mx,
                }),
                RecordType::Ns => store.links.push(Link {
                    from: id.clone(),
                    target_owner: row.value.clone(),
                    kind: LinkKind::Ns,
                }),
                _ => {}
            }

            let priority = match rtype {
                RecordType::Mx => Some(mx_priority(&row.value)),
                _ => None,
            };

            records.push(ResourceRecord {
                id,
                owner: row.name.clone(),
                rtype,
                value: row.value.clone(),
                ttl,
                priority,
                views: BTreeSet::from([view]),
            });
        }

        store
    }

    /// Owner → records map, sorted by owner name.
    pub fn domains(&self) -> &BTreeMap<String, Vec<ResourceRecord>> {
        &self.domains
    }

    /// Records for one owner, if present.
    pub fn records(&self, owner: &str) -> Option<&[ResourceRecord]> {
        self.domains.get(owner).map(|v| v.as_slice())
    }

    /// Normalized IP → node map.
    pub fn ips(&self) -> &BTreeMap<String, IpNode> {
        &self.ips
    }

    /// Directed CNAME/MX/NS edges, in source order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of distinct owner names.
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Resolves an owner to its final A/AAAA addresses, following CNAME
    /// records through the store.
    ///
    /// The walk carries a visited set, so chains that loop terminate with
    /// whatever addresses were collected before the repeat. Names absent
    /// from the store resolve to nothing.
    pub fn resolve_to_ips(&self, owner: &str) -> Vec<ResolvedIp> {
        let mut visited = BTreeSet::new();
        let mut out = Vec::new();
        self.resolve_walk(owner, &mut visited, &mut out);
        out
    }

    fn resolve_walk(&self, owner: &str, visited: &mut BTreeSet<String>, out: &mut Vec<ResolvedIp>) {
        if !visited.insert(owner.to_string()) {
            return;
        }
        let Some(records) = self.domains.get(owner) else {
            return;
        };
        for record in records {
            if record.rtype.is_address() {
                out.push(ResolvedIp {
                    ip: record.value.clone(),
                    rtype: record.rtype.clone(),
                    views: record.views.clone(),
                    owner: owner.to_string(),
                });
            } else if record.rtype == RecordType::Cname {
                self.resolve_walk(&record.value, visited, out);
            }
        }
    }
}

/// Builds the stable per-row node identifier.
///
/// The row index keeps ids unique even for owners with many near-identical
/// records; the value prefix keeps them readable in diagram sources.
fn synthesize_id(owner: &str, rtype: &str, value: &str, ttl: &str, row_index: usize) -> String {
    let prefix: String = value.chars().take(5).collect();
    sanitize_id(&format!("{owner}_{rtype}_{prefix}_{ttl}_{row_index}"))
}

/// Replaces everything outside `[A-Za-z0-9]` with `_` and prefixes `node_`,
/// producing identifiers safe for diagram tooling.
fn sanitize_id(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("node_{cleaned}")
}
