//! RFC validation engines.
//!
//! Two state-free passes over the record store: the DNS structural rules
//! ([`validate_dns`]) and the email authentication rules
//! ([`validate_email`]). Both are pure, synchronous, and deterministic:
//! running either twice over the same store with the same [`RuleConfig`]
//! yields identical violation lists. Rule evaluation never fails; missing
//! data is a condition some rules test for, not an error.

mod dns;
mod email;

pub use dns::validate_dns;
pub use email::validate_email;

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use log::warn;
use serde::Serialize;
use strum_macros::{Display as DisplayMacro, EnumString as EnumStringMacro};

use crate::config::DEFAULT_MAX_HOPS;
use crate::store::ResourceRecord;

/// Violation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, DisplayMacro)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Lower rank = more severe; used to pick the worst severity per record.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }
}

/// Stable rule identifiers.
///
/// The `Display`/`FromStr` forms are the SCREAMING_SNAKE_CASE codes users
/// pass to `--ignore-rules` and that appear in reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, DisplayMacro, EnumStringMacro,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleCode {
    // DNS structural rules
    CnameCoexistence,
    CnameOnApex,
    CnameLoop,
    MxToCname,
    NsToCname,
    MxNoGlue,
    NsNoGlue,
    MxOrphan,
    NsOrphan,
    SpfTooPermissive,
    CnameChain,
    InconsistentTtl,
    InconsistentTtlMultiview,
    TtlTooShort,
    TtlTooLong,
    SpfNeutral,
    ViewSegregationPrivateExternal,
    MissingIpv6,
    DuplicateRecord,
    WildcardRestriction,
    CnameOrphan,
    // Email authentication rules
    SpfAllPermissive,
    DmarcMissingWithPublicMx,
    SpfTooManyLookups,
    MxNotInSpf,
    DkimInvalidFormat,
    DkimWeakKey,
    DmarcNoReporting,
    DmarcPolicyNone,
    DkimMissing,
    AutodiscoverMissing,
}

/// One detected violation.
///
/// Self-describing: the affected records are embedded as clones so emitters
/// need no further store lookups. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub domain: String,
    pub rule: RuleCode,
    pub severity: Severity,
    pub message: String,
    pub affected: Vec<ResourceRecord>,
    pub reference: &'static str,
}

/// Configuration for one validation run.
///
/// Passed explicitly into the engines; the crate holds no ambient state.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Rules in this set are fully suppressed: they never reach the
    /// violation list.
    pub ignored_rules: HashSet<RuleCode>,
    /// Evaluate CNAME_ORPHAN (off by default: CNAME targets outside the
    /// export are usually legitimate external names).
    pub show_orphans: bool,
    /// CNAME walk bound for loop detection.
    pub max_hops: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            ignored_rules: HashSet::new(),
            show_orphans: false,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

impl RuleConfig {
    /// Parses `--ignore-rules` codes, warning about (and dropping) codes
    /// that match no known rule.
    pub fn parse_ignore_rules(codes: &[String]) -> HashSet<RuleCode> {
        let mut ignored = HashSet::new();
        for code in codes {
            let trimmed = code.trim().to_uppercase();
            if trimmed.is_empty() {
                continue;
            }
            match RuleCode::from_str(&trimmed) {
                Ok(rule) => {
                    ignored.insert(rule);
                }
                Err(_) => warn!("Unknown rule code in --ignore-rules: {trimmed}"),
            }
        }
        ignored
    }
}

/// Groups violations by domain for per-node annotation.
pub fn violations_by_domain(violations: &[Violation]) -> BTreeMap<&str, Vec<&Violation>> {
    let mut index: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
    for violation in violations {
        index.entry(violation.domain.as_str()).or_default().push(violation);
    }
    index
}

/// Accumulates violations, applying ignore-set suppression at append time.
pub(crate) struct Collector<'a> {
    violations: Vec<Violation>,
    ignored: &'a HashSet<RuleCode>,
}

impl<'a> Collector<'a> {
    pub(crate) fn new(ignored: &'a HashSet<RuleCode>) -> Self {
        Collector {
            violations: Vec::new(),
            ignored,
        }
    }

    pub(crate) fn push(
        &mut self,
        domain: &str,
        rule: RuleCode,
        severity: Severity,
        message: String,
        affected: Vec<ResourceRecord>,
        reference: &'static str,
    ) {
        if self.ignored.contains(&rule) {
            return;
        }
        self.violations.push(Violation {
            domain: domain.to_string(),
            rule,
            severity,
            message,
            affected,
            reference,
        });
    }

    pub(crate) fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}
