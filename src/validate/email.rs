//! Email authentication rules (SPF/DKIM/DMARC/MX).
//!
//! Ten rules over the same record store, driven by auxiliary indices:
//! SPF TXT records per domain, DKIM records keyed by the base domain behind
//! the `<selector>._domainkey.` prefix, DMARC records keyed by the domain
//! behind `_dmarc.`, MX records per domain, and the set of
//! autodiscover/autoconfig owners. A domain "has public MX" when any of its
//! MX records is visible in an externally classified view.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{DKIM_MIN_KEY_BITS, SPF_LOOKUP_LIMIT};
use crate::store::{RecordStore, RecordType, ResourceRecord};
use crate::view::is_externally_visible;

use super::{Collector, RuleCode, RuleConfig, Severity, Violation};

/// Indices derived from the store for the email rules.
struct EmailIndices<'a> {
    /// Domain -> SPF TXT records (`v=spf1` somewhere in the value).
    spf: BTreeMap<&'a str, Vec<&'a ResourceRecord>>,
    /// Base domain -> DKIM TXT records found at `*._domainkey.<base>`.
    dkim: BTreeMap<&'a str, Vec<&'a ResourceRecord>>,
    /// Base domain -> DMARC TXT records found at `_dmarc.<base>`.
    dmarc: BTreeMap<&'a str, Vec<&'a ResourceRecord>>,
    /// Domain -> MX records.
    mx: BTreeMap<&'a str, Vec<&'a ResourceRecord>>,
    /// Owners containing `autodiscover` or `autoconfig`.
    autodiscover: BTreeSet<&'a str>,
    /// Domains with at least one externally visible MX record.
    public_mx: BTreeSet<&'a str>,
}

fn build_indices(store: &RecordStore) -> EmailIndices<'_> {
    let mut indices = EmailIndices {
        spf: BTreeMap::new(),
        dkim: BTreeMap::new(),
        dmarc: BTreeMap::new(),
        mx: BTreeMap::new(),
        autodiscover: BTreeSet::new(),
        public_mx: BTreeSet::new(),
    };

    for (owner, records) in store.domains() {
        for record in records {
            match record.rtype {
                RecordType::Txt => {
                    if record.value.contains("v=spf1") {
                        indices.spf.entry(owner.as_str()).or_default().push(record);
                    }
                    if let Some((_, base)) = owner.split_once("._domainkey.") {
                        indices.dkim.entry(base).or_default().push(record);
                    }
                    if let Some(base) = owner.strip_prefix("_dmarc.") {
                        indices.dmarc.entry(base).or_default().push(record);
                    }
                }
                RecordType::Mx => {
                    indices.mx.entry(owner.as_str()).or_default().push(record);
                }
                _ => {}
            }
            if owner.contains("autodiscover") || owner.contains("autoconfig") {
                indices.autodiscover.insert(owner.as_str());
            }
        }
    }

    for (domain, mxs) in &indices.mx {
        if mxs.iter().any(|mx| is_externally_visible(&mx.views)) {
            indices.public_mx.insert(domain);
        }
    }

    indices
}

/// Runs the email rule engine over the store.
///
/// Same determinism and suppression contract as
/// [`validate_dns`](super::validate_dns).
pub fn validate_email(store: &RecordStore, config: &RuleConfig) -> Vec<Violation> {
    let mut out = Collector::new(&config.ignored_rules);
    let idx = build_indices(store);

    check_spf_all_permissive(&idx, &mut out);
    check_dmarc_missing(&idx, &mut out);
    check_spf_lookup_count(&idx, &mut out);
    check_mx_in_spf(&idx, &mut out);
    check_dkim_format(&idx, &mut out);
    check_dkim_key_strength(&idx, &mut out);
    check_dmarc_reporting(&idx, &mut out);
    check_dmarc_policy(&idx, &mut out);
    check_dkim_presence(&idx, &mut out);
    check_autodiscover_presence(&idx, &mut out);

    out.into_violations()
}

/// SPF_ALL_PERMISSIVE (CRITICAL): `+all` in an externally visible SPF.
fn check_spf_all_permissive(idx: &EmailIndices, out: &mut Collector) {
    for (domain, spfs) in &idx.spf {
        for spf in spfs {
            if spf.value.contains("+all") && is_externally_visible(&spf.views) {
                out.push(
                    domain,
                    RuleCode::SpfAllPermissive,
                    Severity::Critical,
                    "SPF with +all in a public view lets anyone send mail as this domain"
                        .to_string(),
                    vec![(*spf).clone()],
                    "RFC 7208 Section 5.1",
                );
            }
        }
    }
}

/// DMARC_MISSING_WITH_PUBLIC_MX (CRITICAL): public MX without a DMARC
/// record visible in an external view.
fn check_dmarc_missing(idx: &EmailIndices, out: &mut Collector) {
    for domain in &idx.public_mx {
        let dmarc_public = idx
            .dmarc
            .get(domain)
            .is_some_and(|records| records.iter().any(|r| is_externally_visible(&r.views)));
        if !dmarc_public {
            let affected = affected_mx(idx, domain);
            out.push(
                domain,
                RuleCode::DmarcMissingWithPublicMx,
                Severity::Critical,
                "Domain has public MX but no DMARC in public views - phishing/spoofing risk"
                    .to_string(),
                affected,
                "RFC 7489 Section 6.3",
            );
        }
    }
}

/// Counts the DNS-lookup-incurring terms of an SPF record.
///
/// Substring occurrences of `include:`, `a:`, `mx:`, `ptr:`, `exists:` and
/// `redirect=`, plus one each for a bare `a` or `mx` mechanism token.
fn spf_lookup_count(value: &str) -> usize {
    const MECHANISMS: &[&str] = &["include:", "a:", "mx:", "ptr:", "exists:", "redirect="];
    let mut count = MECHANISMS
        .iter()
        .map(|m| value.matches(m).count())
        .sum::<usize>();
    if value.split_whitespace().any(|t| t == "a") {
        count += 1;
    }
    if value.split_whitespace().any(|t| t == "mx") {
        count += 1;
    }
    count
}

/// SPF_TOO_MANY_LOOKUPS (WARNING): more than 10 lookup-incurring terms.
fn check_spf_lookup_count(idx: &EmailIndices, out: &mut Collector) {
    for (domain, spfs) in &idx.spf {
        for spf in spfs {
            let count = spf_lookup_count(&spf.value);
            if count > SPF_LOOKUP_LIMIT {
                out.push(
                    domain,
                    RuleCode::SpfTooManyLookups,
                    Severity::Warning,
                    format!(
                        "SPF with {count} DNS lookups (RFC 7208 limit: {SPF_LOOKUP_LIMIT}) - PermError risk"
                    ),
                    vec![(*spf).clone()],
                    "RFC 7208 Section 4.6.4",
                );
            }
        }
    }
}

/// MX_NOT_IN_SPF (WARNING), evaluated per view: the view's SPF record has
/// no `mx` mechanism and does not explicitly list every MX target.
fn check_mx_in_spf(idx: &EmailIndices, out: &mut Collector) {
    for (domain, mxs) in &idx.mx {
        let Some(spfs) = idx.spf.get(domain) else {
            continue;
        };

        let mut mxs_by_view: BTreeMap<&str, Vec<&ResourceRecord>> = BTreeMap::new();
        for mx in mxs {
            for view in &mx.views {
                mxs_by_view.entry(view.as_str()).or_default().push(*mx);
            }
        }

        for (view, view_mxs) in mxs_by_view {
            let Some(spf) = spfs.iter().find(|s| s.views.contains(view)) else {
                continue; // no SPF for this view
            };

            let has_mx_mechanism = spf
                .value
                .split_whitespace()
                .any(|t| t == "mx" || t.starts_with("mx:"));
            if has_mx_mechanism {
                continue;
            }

            let targets: Vec<&str> = view_mxs.iter().map(|mx| mx.mx_target()).collect();
            let all_listed = targets
                .iter()
                .all(|t| spf.value.contains(t) || spf.value.contains(&format!("a:{t}")));
            if !all_listed {
                out.push(
                    domain,
                    RuleCode::MxNotInSpf,
                    Severity::Warning,
                    format!(
                        "MX servers ({}) missing from SPF in view '{view}' - mail may be rejected",
                        targets.join(", ")
                    ),
                    view_mxs.into_iter().cloned().collect(),
                    "RFC 7208 Section 5.4 (mx mechanism)",
                );
            }
        }
    }
}

/// Extracts the base64 key material after `p=`, up to the next `;`.
fn dkim_key_material(value: &str) -> Option<String> {
    let start = value.find("p=")? + 2;
    let rest = &value[start..];
    let end = rest.find(';').unwrap_or(rest.len());
    let material: String = rest[..end]
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+' || *c == '/' || *c == '=')
        .collect();
    Some(material)
}

/// DKIM_INVALID_FORMAT (WARNING): missing `v=DKIM1` or missing/empty `p=`
/// key material. Both defects can fire for the same record.
fn check_dkim_format(idx: &EmailIndices, out: &mut Collector) {
    for (domain, dkims) in &idx.dkim {
        for dkim in dkims {
            // Record values are lowercased at ingest, so match the tag
            // case-insensitively.
            if !dkim.value.to_lowercase().contains("v=dkim1") {
                out.push(
                    domain,
                    RuleCode::DkimInvalidFormat,
                    Severity::Warning,
                    format!("DKIM without version tag (v=DKIM1) for {}", dkim.owner),
                    vec![(*dkim).clone()],
                    "RFC 6376 Section 3.6.1",
                );
            }
            let empty_key = match dkim_key_material(&dkim.value) {
                Some(material) => material.is_empty(),
                None => true,
            };
            if empty_key {
                out.push(
                    domain,
                    RuleCode::DkimInvalidFormat,
                    Severity::Warning,
                    format!("DKIM without public key (p=) for {}", dkim.owner),
                    vec![(*dkim).clone()],
                    "RFC 6376 Section 3.6.1",
                );
            }
        }
    }
}

/// DKIM_WEAK_KEY (WARNING): estimated key size under 1024 bits.
///
/// The estimate is base64 payload length x 6 bits. This is deliberately
/// approximate: no ASN.1 parsing, just a cheap length heuristic, so
/// borderline keys may be misjudged by a few bits.
fn check_dkim_key_strength(idx: &EmailIndices, out: &mut Collector) {
    for (domain, dkims) in &idx.dkim {
        for dkim in dkims {
            let Some(material) = dkim_key_material(&dkim.value) else {
                continue;
            };
            if material.is_empty() {
                continue; // already flagged as invalid format
            }
            let estimated_bits = material.len() * 6;
            if estimated_bits < DKIM_MIN_KEY_BITS {
                out.push(
                    domain,
                    RuleCode::DkimWeakKey,
                    Severity::Warning,
                    format!(
                        "Potentially weak DKIM key (~{estimated_bits} bits estimated, < {DKIM_MIN_KEY_BITS}) for {}",
                        dkim.owner
                    ),
                    vec![(*dkim).clone()],
                    "RFC 6376 Section 3.3.3",
                );
            }
        }
    }
}

/// DMARC_NO_REPORTING (WARNING): neither `rua=` nor `ruf=` present.
fn check_dmarc_reporting(idx: &EmailIndices, out: &mut Collector) {
    for (domain, dmarcs) in &idx.dmarc {
        for dmarc in dmarcs {
            if !dmarc.value.contains("rua=") && !dmarc.value.contains("ruf=") {
                out.push(
                    domain,
                    RuleCode::DmarcNoReporting,
                    Severity::Warning,
                    "DMARC without reporting addresses (rua/ruf) - no visibility on failures"
                        .to_string(),
                    vec![(*dmarc).clone()],
                    "RFC 7489 Section 6.2 (Reporting)",
                );
            }
        }
    }
}

/// DMARC_POLICY_NONE (INFO): monitoring-only policy.
fn check_dmarc_policy(idx: &EmailIndices, out: &mut Collector) {
    for (domain, dmarcs) in &idx.dmarc {
        for dmarc in dmarcs {
            if dmarc.value.contains("p=none") {
                out.push(
                    domain,
                    RuleCode::DmarcPolicyNone,
                    Severity::Info,
                    "DMARC in monitoring mode only (p=none) - consider p=quarantine or p=reject"
                        .to_string(),
                    vec![(*dmarc).clone()],
                    "RFC 7489 Section 6.3 (Policy)",
                );
            }
        }
    }
}

/// DKIM_MISSING (INFO): public MX but no DKIM record found.
fn check_dkim_presence(idx: &EmailIndices, out: &mut Collector) {
    for domain in &idx.public_mx {
        if !idx.dkim.contains_key(domain) {
            out.push(
                domain,
                RuleCode::DkimMissing,
                Severity::Info,
                "No DKIM detected - recommended for email authentication".to_string(),
                affected_mx(idx, domain),
                "RFC 6376",
            );
        }
    }
}

/// AUTODISCOVER_MISSING (INFO): public MX but no matching
/// autodiscover/autoconfig record.
fn check_autodiscover_presence(idx: &EmailIndices, out: &mut Collector) {
    for domain in &idx.public_mx {
        let autodiscover = format!("autodiscover.{domain}");
        let autoconfig = format!("autoconfig.{domain}");
        let has_autodiscover = idx.autodiscover.iter().any(|ad| {
            *ad == autodiscover
                || *ad == autoconfig
                || ad.starts_with(&format!("{autodiscover}."))
                || ad.starts_with(&format!("{autoconfig}."))
        });
        if !has_autodiscover {
            out.push(
                domain,
                RuleCode::AutodiscoverMissing,
                Severity::Info,
                "No autodiscover/autoconfig - mail clients need manual configuration".to_string(),
                affected_mx(idx, domain),
                "Exchange/Office365/Thunderbird best practice",
            );
        }
    }
}

fn affected_mx(idx: &EmailIndices, domain: &str) -> Vec<ResourceRecord> {
    idx.mx
        .get(domain)
        .map(|mxs| mxs.iter().map(|mx| (*mx).clone()).collect())
        .unwrap_or_default()
}
