//! Agent identity classification.
//!
//! Peers self-report a free-form identity string during the crawl
//! handshake. This module maps those strings onto canonical client
//! families and structured release versions. The input is untrusted,
//! so every classifier degrades to a sentinel instead of failing.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AgentVersionRow, DistributionRow};

/// Agent version fingerprint of the storm scraper fleet, which reports
/// itself as a stock go-ipfs 0.8.0 node
const STORM_FINGERPRINT: &str = "go-ipfs/0.8.0/48f94e2";

/// Family label assigned to peers matching [`STORM_FINGERPRINT`]
const STORM_DISGUISED: &str = "storm*";

/// Sentinel family for identities matching no known prefix
pub const OTHER_FAMILY: &str = "other";

/// A single prefix-to-family mapping.
///
/// Rules are checked in order and the first matching prefix decides
/// the family, so more specific prefixes must come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRule {
    /// Prefix the raw identity must start with, case-sensitive
    pub prefix: String,
    /// Canonical family name reported on a match
    pub family: String,
}

impl FamilyRule {
    pub fn new(prefix: &str, family: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            family: family.to_string(),
        }
    }
}

/// Rule table for the IPFS DHT crawl. go-ipfs was renamed to kubo
/// upstream, so both prefixes collapse into the same family.
fn default_rules() -> Vec<FamilyRule> {
    vec![
        FamilyRule::new("go-ipfs", "kubo"),
        FamilyRule::new("kubo", "kubo"),
        FamilyRule::new("hydra-booster", "hydra-booster"),
        FamilyRule::new("storm", "storm"),
        FamilyRule::new("ioi", "ioi"),
        FamilyRule::new("iroh", "iroh"),
    ]
}

/// A classified agent identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalAgent {
    /// Client name, taken verbatim from the identity string
    pub family: String,
    /// Structured release, where the identity carried one
    pub version: Option<SemanticVersion>,
}

/// A dotted numeric release triple.
///
/// Ordering is lexicographic over (major, minor, patch), so
/// `0.9.2 < 0.9.13 < 0.10.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error parsing a dotted release triple
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("expected <major>.<minor>.<patch>, got {0:?}")]
    Shape(String),
    #[error("invalid version component {0:?}")]
    Component(String),
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let triple = (parts.next(), parts.next(), parts.next(), parts.next());
        let (major, minor, patch) = match triple {
            (Some(major), Some(minor), Some(patch), None) => (major, minor, patch),
            _ => return Err(VersionError::Shape(s.to_string())),
        };
        Ok(Self {
            major: parse_component(major)?,
            minor: parse_component(minor)?,
            patch: parse_component(patch)?,
        })
    }
}

/// Parse one version component. Leading zeros are rejected ("01" is
/// not a valid component, "0" is).
fn parse_component(part: &str) -> Result<u64, VersionError> {
    let malformed = part.is_empty()
        || (part.len() > 1 && part.starts_with('0'))
        || !part.bytes().all(|b| b.is_ascii_digit());
    if malformed {
        return Err(VersionError::Component(part.to_string()));
    }
    part.parse::<u64>()
        .map_err(|_| VersionError::Component(part.to_string()))
}

/// Identity classifier holding the ordered family rule table and the
/// compiled version patterns.
pub struct AgentClassifier {
    rules: Vec<FamilyRule>,
    /// Match: "kubo/0.18.0<qualifier>/..." with a required trailing slash
    kubo_version: Regex,
    /// Match: "<client>/v<major>.<minor>.<patch><anything>"
    structured_version: Regex,
}

impl AgentClassifier {
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Build a classifier with a custom rule table. Rule order is
    /// significant: earlier rules win when several prefixes match.
    pub fn with_rules(rules: Vec<FamilyRule>) -> Self {
        Self {
            rules,
            kubo_version: Regex::new(r"^(go-ipfs|kubo)/(\d+\.+\d+\.\d+)(.*)?/")
                .expect("Invalid kubo_version regex"),
            structured_version: Regex::new(
                r"^(?P<client>.*)/v(?P<major>0|[1-9]\d*)\.(?P<minor>0|[1-9]\d*)\.(?P<patch>0|[1-9]\d*).*",
            )
            .expect("Invalid structured_version regex"),
        }
    }

    /// Map a raw identity string to its canonical family name.
    ///
    /// Total over arbitrary input: unknown identities come back as
    /// [`OTHER_FAMILY`], never as an error. The storm fingerprint is
    /// checked before the prefix table so those peers are not counted
    /// as kubo.
    pub fn classify_family(&self, raw: &str) -> &str {
        if raw == STORM_FINGERPRINT {
            return STORM_DISGUISED;
        }
        for rule in &self.rules {
            if raw.starts_with(rule.prefix.as_str()) {
                return &rule.family;
            }
        }
        OTHER_FAMILY
    }

    /// Extract the dotted release from a kubo or go-ipfs identity.
    ///
    /// The identity must carry a slash after the version and optional
    /// qualifier ("kubo/0.18.0/abc123/"); without it the string is
    /// treated as malformed and `None` is returned. The storm
    /// fingerprint is excluded so the scraper fleet does not show up
    /// in the version distribution.
    pub fn extract_kubo_version<'a>(&self, raw: &'a str) -> Option<&'a str> {
        if raw == STORM_FINGERPRINT {
            return None;
        }
        let caps = self.kubo_version.captures(raw)?;
        caps.get(2).map(|m| m.as_str())
    }

    /// Parse identities of the shape `<client>/v<major>.<minor>.<patch>...`.
    ///
    /// The client prefix matches greedily, so the last `/v` followed by
    /// a plain semantic version wins. Components with leading zeros do
    /// not match, and components too large for u64 degrade to `None`.
    pub fn parse_structured_version(&self, raw: &str) -> Option<CanonicalAgent> {
        let caps = self.structured_version.captures(raw)?;
        let version = SemanticVersion {
            major: caps["major"].parse().ok()?,
            minor: caps["minor"].parse().ok()?,
            patch: caps["patch"].parse().ok()?,
        };
        Some(CanonicalAgent {
            family: caps["client"].to_string(),
            version: Some(version),
        })
    }

    /// Collapse raw visit-store rows into per-family counts.
    ///
    /// Families keep their first-encounter order and duplicate families
    /// are summed, so the result can go straight into
    /// [`top_n_with_rest`](crate::distribution::top_n_with_rest).
    pub fn family_distribution(&self, rows: &[AgentVersionRow]) -> Vec<DistributionRow> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut unmatched = 0u64;

        for row in rows {
            let family = self.classify_family(&row.agent_version);
            if family == OTHER_FAMILY {
                unmatched += row.count;
            }
            match counts.entry(family.to_string()) {
                Entry::Occupied(mut entry) => *entry.get_mut() += row.count,
                Entry::Vacant(entry) => {
                    order.push(family.to_string());
                    entry.insert(row.count);
                }
            }
        }

        log::debug!(
            "Classified {} agent version rows into {} families ({} peers unmatched)",
            rows.len(),
            order.len(),
            unmatched
        );

        order
            .into_iter()
            .map(|key| {
                let count = counts[&key];
                DistributionRow { key, count }
            })
            .collect()
    }
}

impl Default for AgentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
