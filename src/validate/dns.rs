//! DNS structural rules.
//!
//! Eighteen rules over the record store, spanning CRITICAL RFC violations
//! (CNAME coexistence, apex CNAMEs, loops, MX/NS pointing at CNAMEs,
//! missing glue), WARNING-level operational problems (chained CNAMEs,
//! inconsistent or extreme TTLs, orphan targets, private IPs leaked into
//! external views) and INFO-level best practices. Rules that depend on
//! record pairs only fire when the records' view-tag sets intersect, so a
//! valid split-horizon setup (CNAME in `ext`, A in `int`) produces no
//! false positives.

use std::collections::{BTreeMap, BTreeSet};

use crate::store::{RecordStore, RecordType, ResourceRecord};
use crate::view::{is_externally_visible, is_private_ip, views_intersect};

use super::{Collector, RuleCode, RuleConfig, Severity, Violation};

/// Runs the DNS rule engine over the store.
///
/// Pure and deterministic: domains are visited in sorted order and each
/// rule appends in a fixed sequence, so two runs over the same store with
/// the same config produce identical lists.
pub fn validate_dns(store: &RecordStore, config: &RuleConfig) -> Vec<Violation> {
    let mut out = Collector::new(&config.ignored_rules);

    // Owner -> CNAME target values, for chain and loop walks. A domain can
    // carry several CNAME records (differing TTL or view), hence the Vec.
    let mut cname_targets: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (owner, records) in store.domains() {
        for record in records {
            if record.rtype == RecordType::Cname {
                cname_targets
                    .entry(owner.as_str())
                    .or_default()
                    .push(record.value.as_str());
            }
        }
    }

    for (owner, records) in store.domains() {
        check_cname_coexistence(owner, records, &mut out);
        check_cname_on_apex(owner, records, &mut out);
        check_cname_chains_and_loops(owner, records, &cname_targets, config.max_hops, &mut out);
        check_view_segregation(owner, records, &mut out);
        check_missing_ipv6(owner, records, &mut out);
        check_mx_ns_targets(owner, records, store, &mut out);
        if config.show_orphans {
            check_cname_orphans(owner, records, store, &mut out);
        }
        let address_ttls_flagged = check_inconsistent_ttl(owner, records, &mut out);
        check_inconsistent_ttl_multiview(owner, records, address_ttls_flagged, &mut out);
        check_ttl_bounds(owner, records, &mut out);
        check_spf_qualifiers(owner, records, &mut out);
        check_duplicates(owner, records, &mut out);
        check_wildcard_restrictions(owner, records, &mut out);
    }

    out.into_violations()
}

/// Apex here means a bare two-label name (`example.com`); anything with
/// three labels or more is a subdomain.
fn is_apex(owner: &str) -> bool {
    owner.split('.').count() == 2
}

fn is_reverse_zone(name: &str) -> bool {
    name.ends_with(".in-addr.arpa") || name.ends_with(".ip6.arpa")
}

/// CNAME_COEXISTENCE (CRITICAL): a CNAME and any other type on the same
/// owner, but only when at least one CNAME/other pair shares a view.
fn check_cname_coexistence(owner: &str, records: &[ResourceRecord], out: &mut Collector) {
    let cnames: Vec<&ResourceRecord> = records
        .iter()
        .filter(|r| r.rtype == RecordType::Cname)
        .collect();
    let others: Vec<&ResourceRecord> = records
        .iter()
        .filter(|r| r.rtype != RecordType::Cname)
        .collect();
    if cnames.is_empty() || others.is_empty() {
        return;
    }

    let conflict = cnames
        .iter()
        .any(|c| others.iter().any(|o| c.shares_view_with(o)));
    if !conflict {
        // All pairs are in disjoint views: a valid split-horizon setup
        return;
    }

    let other_types: BTreeSet<String> = others.iter().map(|r| r.rtype.to_string()).collect();
    out.push(
        owner,
        RuleCode::CnameCoexistence,
        Severity::Critical,
        format!(
            "CNAME cannot coexist with other record types in the same view ({})",
            other_types.into_iter().collect::<Vec<_>>().join(", ")
        ),
        records.to_vec(),
        "RFC 1034 Section 3.6.2",
    );
}

/// CNAME_ON_APEX (CRITICAL): CNAME on a zone apex.
fn check_cname_on_apex(owner: &str, records: &[ResourceRecord], out: &mut Collector) {
    if !is_apex(owner) {
        return;
    }
    if let Some(cname) = records.iter().find(|r| r.rtype == RecordType::Cname) {
        out.push(
            owner,
            RuleCode::CnameOnApex,
            Severity::Critical,
            "CNAME forbidden on zone apex (root domain)".to_string(),
            vec![cname.clone()],
            "RFC 1912 Section 2.4",
        );
    }
}

/// Follows a CNAME chain from `first_target`, bounded by `max_hops`.
///
/// Returns the visited path when the walk revisits the origin or any node
/// already seen in this walk. Chains longer than the bound are treated as
/// non-looping; the bound is a policy limit, not a proof of acyclicity.
/// Each hop follows the first CNAME target recorded for the current name.
fn walk_cname_chain<'a>(
    origin: &str,
    first_target: &'a str,
    cname_targets: &BTreeMap<&'a str, Vec<&'a str>>,
    max_hops: usize,
) -> Option<Vec<String>> {
    let mut visited: BTreeSet<&'a str> = BTreeSet::new();
    let mut path = vec![origin.to_string()];
    let mut current = first_target;

    while visited.len() < max_hops {
        if current == origin || visited.contains(current) {
            path.push(current.to_string());
            return Some(path);
        }
        visited.insert(current);
        path.push(current.to_string());

        match cname_targets.get(current).and_then(|t| t.first().copied()) {
            Some(next) => current = next,
            None => break, // end of chain: current is not a CNAME source
        }
    }
    None
}

/// CNAME_CHAIN (WARNING) per CNAME whose target is itself a CNAME source,
/// and CNAME_LOOP (CRITICAL) when the chain walk returns to a visited name.
fn check_cname_chains_and_loops<'a>(
    owner: &str,
    records: &'a [ResourceRecord],
    cname_targets: &BTreeMap<&'a str, Vec<&'a str>>,
    max_hops: usize,
    out: &mut Collector,
) {
    for record in records.iter().filter(|r| r.rtype == RecordType::Cname) {
        if let Some(targets) = cname_targets.get(record.value.as_str()) {
            let chain_target = targets.first().copied().unwrap_or_default();
            out.push(
                owner,
                RuleCode::CnameChain,
                Severity::Warning,
                format!(
                    "CNAME points to another CNAME ({} -> {})",
                    record.value, chain_target
                ),
                vec![record.clone()],
                "RFC 2181 Section 10.1 (Performance)",
            );
        }

        if let Some(path) = walk_cname_chain(owner, &record.value, cname_targets, max_hops) {
            out.push(
                owner,
                RuleCode::CnameLoop,
                Severity::Critical,
                format!("CNAME creates a DNS loop: {}", path.join(" -> ")),
                vec![record.clone()],
                "RFC 1034 Section 3.6.2",
            );
        }
    }
}

/// VIEW_SEGREGATION_PRIVATE_EXTERNAL (WARNING): a private-range address
/// exposed in an externally classified view. Public addresses are fine in
/// any view.
fn check_view_segregation(owner: &str, records: &[ResourceRecord], out: &mut Collector) {
    for record in records.iter().filter(|r| r.rtype.is_address()) {
        if is_private_ip(&record.value) && is_externally_visible(&record.views) {
            out.push(
                owner,
                RuleCode::ViewSegregationPrivateExternal,
                Severity::Warning,
                format!(
                    "Private RFC 1918 address ({}) exposed in an external view - network information leak",
                    record.value
                ),
                vec![record.clone()],
                "RFC 1918 Section 3",
            );
        }
    }
}

/// MISSING_IPV6 (INFO): owner has A records but neither AAAA nor CNAME.
fn check_missing_ipv6(owner: &str, records: &[ResourceRecord], out: &mut Collector) {
    let has_a = records.iter().any(|r| r.rtype == RecordType::A);
    let has_aaaa = records.iter().any(|r| r.rtype == RecordType::Aaaa);
    let has_cname = records.iter().any(|r| r.rtype == RecordType::Cname);
    if has_a && !has_aaaa && !has_cname {
        let a_records: Vec<ResourceRecord> = records
            .iter()
            .filter(|r| r.rtype == RecordType::A)
            .cloned()
            .collect();
        out.push(
            owner,
            RuleCode::MissingIpv6,
            Severity::Info,
            "A record without a matching AAAA".to_string(),
            a_records,
            "RFC 8200 (IPv6 Specification)",
        );
    }
}

/// MX_TO_CNAME / NS_TO_CNAME (CRITICAL), MX_NO_GLUE / NS_NO_GLUE
/// (CRITICAL) and MX_ORPHAN / NS_ORPHAN (WARNING).
///
/// The CNAME and glue checks only count records sharing a view with the
/// MX/NS record; reverse-zone targets are exempt from the orphan check.
fn check_mx_ns_targets(
    owner: &str,
    records: &[ResourceRecord],
    store: &RecordStore,
    out: &mut Collector,
) {
    for record in records
        .iter()
        .filter(|r| matches!(r.rtype, RecordType::Mx | RecordType::Ns))
    {
        let is_mx = record.rtype == RecordType::Mx;
        let target = if is_mx {
            record.mx_target()
        } else {
            record.value.as_str()
        };

        if let Some(target_records) = store.records(target) {
            let cname_in_same_view = target_records.iter().any(|t| {
                t.rtype == RecordType::Cname && views_intersect(&t.views, &record.views)
            });
            if cname_in_same_view {
                let (rule, label) = if is_mx {
                    (RuleCode::MxToCname, "MX")
                } else {
                    (RuleCode::NsToCname, "NS")
                };
                out.push(
                    owner,
                    rule,
                    Severity::Critical,
                    format!("{label} points to a CNAME ({target}) in a shared view"),
                    vec![record.clone()],
                    "RFC 2181 Section 10.3",
                );
            }

            let glue_in_same_view = target_records.iter().any(|t| {
                t.rtype.is_address() && views_intersect(&t.views, &record.views)
            });
            if !glue_in_same_view {
                let (rule, label) = if is_mx {
                    (RuleCode::MxNoGlue, "MX")
                } else {
                    (RuleCode::NsNoGlue, "NS")
                };
                out.push(
                    owner,
                    rule,
                    Severity::Critical,
                    format!("{label} points to {target} which has no A/AAAA record in a shared view"),
                    vec![record.clone()],
                    "RFC 1035 Section 3.3.9 (Glue Records)",
                );
            }
        } else if !is_reverse_zone(target) {
            let (rule, label) = if is_mx {
                (RuleCode::MxOrphan, "MX")
            } else {
                (RuleCode::NsOrphan, "NS")
            };
            out.push(
                owner,
                rule,
                Severity::Warning,
                format!("{label} points to a name not resolved in this dataset ({target})"),
                vec![record.clone()],
                "RFC 1035 Section 3.3.9",
            );
        }
    }
}

/// CNAME_ORPHAN (INFO): only evaluated with `--show-orphans`.
fn check_cname_orphans(
    owner: &str,
    records: &[ResourceRecord],
    store: &RecordStore,
    out: &mut Collector,
) {
    for record in records.iter().filter(|r| r.rtype == RecordType::Cname) {
        if store.records(&record.value).is_none() {
            out.push(
                owner,
                RuleCode::CnameOrphan,
                Severity::Info,
                format!(
                    "CNAME points to a name absent from this dataset ({}) - may be external",
                    record.value
                ),
                vec![record.clone()],
                "Check external resolution",
            );
        }
    }
}

/// INCONSISTENT_TTL (WARNING): two or more address records on the same
/// owner with differing TTL strings. Returns whether it fired, so the
/// multi-view variant can skip what this already covered.
fn check_inconsistent_ttl(owner: &str, records: &[ResourceRecord], out: &mut Collector) -> bool {
    let address_records: Vec<&ResourceRecord> =
        records.iter().filter(|r| r.rtype.is_address()).collect();
    if address_records.len() < 2 {
        return false;
    }
    let ttls: BTreeSet<&str> = address_records.iter().map(|r| r.ttl.as_str()).collect();
    if ttls.len() > 1 {
        out.push(
            owner,
            RuleCode::InconsistentTtl,
            Severity::Warning,
            format!(
                "Inconsistent TTLs for A/AAAA records ({})",
                ttls.into_iter().collect::<Vec<_>>().join(", ")
            ),
            address_records.into_iter().cloned().collect(),
            "RFC 1035 Section 3.2.1 (DNS caching)",
        );
        return true;
    }
    false
}

/// INCONSISTENT_TTL_MULTIVIEW (INFO): the same (type, value) stored under
/// distinct view-tag sets with differing TTLs, which usually means one view
/// was updated and the other forgotten. Address groups already reported by
/// INCONSISTENT_TTL are not reported a second time.
fn check_inconsistent_ttl_multiview(
    owner: &str,
    records: &[ResourceRecord],
    address_ttls_flagged: bool,
    out: &mut Collector,
) {
    let mut by_type_value: BTreeMap<(String, &str), Vec<&ResourceRecord>> = BTreeMap::new();
    for record in records {
        by_type_value
            .entry((record.rtype.to_string(), record.value.as_str()))
            .or_default()
            .push(record);
    }

    for ((rtype, value), group) in by_type_value {
        if group.len() < 2 {
            continue;
        }
        if address_ttls_flagged && group.iter().any(|r| r.rtype.is_address()) {
            continue;
        }
        let ttls: BTreeSet<&str> = group.iter().map(|r| r.ttl.as_str()).collect();
        let view_sets: BTreeSet<String> = group.iter().map(|r| r.views_label()).collect();
        if view_sets.len() > 1 && ttls.len() > 1 {
            let ttl_by_view = group
                .iter()
                .map(|r| format!("{}:{}s", r.views_label(), r.ttl))
                .collect::<Vec<_>>()
                .join(", ");
            out.push(
                owner,
                RuleCode::InconsistentTtlMultiview,
                Severity::Info,
                format!("{rtype} {value} has different TTLs across views ({ttl_by_view})"),
                group.into_iter().cloned().collect(),
                "Keep TTLs identical across views",
            );
        }
    }
}

/// TTL_TOO_SHORT (WARNING, < 60s, SOA exempt) and TTL_TOO_LONG (INFO,
/// > 86400s, NS/SOA exempt). Non-numeric TTLs are skipped.
fn check_ttl_bounds(owner: &str, records: &[ResourceRecord], out: &mut Collector) {
    for record in records {
        let Some(ttl) = record.ttl_secs() else {
            continue;
        };
        if ttl < crate::config::TTL_MIN_SECS && record.rtype != RecordType::Soa {
            out.push(
                owner,
                RuleCode::TtlTooShort,
                Severity::Warning,
                format!("Very short TTL ({ttl}s) for {} - high DNS query load", record.rtype),
                vec![record.clone()],
                "Recommended minimum 300s",
            );
        }
        if ttl > crate::config::TTL_MAX_SECS
            && !matches!(record.rtype, RecordType::Ns | RecordType::Soa)
        {
            out.push(
                owner,
                RuleCode::TtlTooLong,
                Severity::Info,
                format!("Very long TTL ({ttl}s) for {}", record.rtype),
                vec![record.clone()],
                "Recommended maximum 24h for flexibility",
            );
        }
    }
}

/// SPF_TOO_PERMISSIVE (CRITICAL, `+all` in an externally visible record)
/// and SPF_NEUTRAL (WARNING, `?all`). An internal-only `+all` is not
/// flagged: it cannot be abused from the internet.
fn check_spf_qualifiers(owner: &str, records: &[ResourceRecord], out: &mut Collector) {
    for record in records.iter().filter(|r| r.rtype == RecordType::Txt) {
        if !record.value.contains("v=spf1") {
            continue;
        }
        if record.value.contains("+all") && is_externally_visible(&record.views) {
            out.push(
                owner,
                RuleCode::SpfTooPermissive,
                Severity::Critical,
                "SPF too permissive (+all) in a public view - anyone can send mail as this domain"
                    .to_string(),
                vec![record.clone()],
                "RFC 7208 Section 5.1 (all mechanism)",
            );
        }
        if record.value.contains("?all") {
            out.push(
                owner,
                RuleCode::SpfNeutral,
                Severity::Warning,
                "Neutral SPF (?all) - little protection against spoofing".to_string(),
                vec![record.clone()],
                "RFC 7208 Section 2.6.1 (neutral qualifier)",
            );
        }
    }
}

/// DUPLICATE_RECORD (INFO): identical (type, value, ttl) appearing twice
/// within a single view tag. Exact duplicates merge at build time, so this
/// only fires for records that reached the store through distinct merge
/// keys yet overlap inside one view.
fn check_duplicates(owner: &str, records: &[ResourceRecord], out: &mut Collector) {
    let mut seen: BTreeMap<(String, String), &ResourceRecord> = BTreeMap::new();
    for record in records {
        for view in &record.views {
            let key = (
                view.clone(),
                format!("{}|{}|{}", record.rtype, record.value, record.ttl),
            );
            if let Some(first) = seen.get(&key) {
                out.push(
                    owner,
                    RuleCode::DuplicateRecord,
                    Severity::Info,
                    format!(
                        "Duplicate record in view '{view}': {} {} TTL:{}",
                        record.rtype, record.value, record.ttl
                    ),
                    vec![record.clone(), (*first).clone()],
                    "Remove redundant records",
                );
            } else {
                seen.insert(key, record);
            }
        }
    }
}

/// WILDCARD_RESTRICTION (INFO): wildcard owners carrying NS, SOA, or MX.
fn check_wildcard_restrictions(owner: &str, records: &[ResourceRecord], out: &mut Collector) {
    if !owner.starts_with("*.") {
        return;
    }
    let restricted: Vec<&ResourceRecord> = records
        .iter()
        .filter(|r| matches!(r.rtype, RecordType::Ns | RecordType::Soa | RecordType::Mx))
        .collect();
    if restricted.is_empty() {
        return;
    }
    let types: BTreeSet<String> = restricted.iter().map(|r| r.rtype.to_string()).collect();
    out.push(
        owner,
        RuleCode::WildcardRestriction,
        Severity::Info,
        format!(
            "Wildcard with restricted types ({})",
            types.into_iter().collect::<Vec<_>>().join(", ")
        ),
        restricted.into_iter().cloned().collect(),
        "RFC 4592 Section 2.1.1 (Wildcard Synthesis)",
    );
}
