//! Core data types for crawl report aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Crawl timestamp, i.e. when a crawl of the network started
pub type CrawlTime = DateTime<Utc>;

/// A single category count in a ranked distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRow {
    pub key: String,
    pub count: u64,
}

impl DistributionRow {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Raw agent version count as returned by the visit store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentVersionRow {
    /// Self-reported identity string, untrusted free text
    pub agent_version: String,
    /// Peers that reported this exact string
    pub count: u64,
}

impl AgentVersionRow {
    pub fn new(agent_version: impl Into<String>, count: u64) -> Self {
        Self {
            agent_version: agent_version.into(),
            count,
        }
    }
}

/// One point of an empirical cumulative distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CdfPoint {
    pub value: f64,
    /// Fraction of observations at or below `value`, in (0, 1]
    pub fraction: f64,
}

/// A per-crawl observation of a category count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow<C> {
    pub bucket: CrawlTime,
    pub category: C,
    pub count: u64,
}

impl<C> TimeSeriesRow<C> {
    pub fn new(bucket: CrawlTime, category: C, count: u64) -> Self {
        Self {
            bucket,
            category,
            count,
        }
    }
}

/// Peer liveness classification over a measurement window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeClassification {
    /// Seen in every crawl of the window
    Online,
    /// Known from earlier windows but never seen in this one
    Offline,
    /// Intermittently reachable, joined and left repeatedly
    Dangling,
    /// Appeared in exactly one crawl
    Oneoff,
    /// First seen during the window and still present at its end
    Entered,
    /// Present at the start of the window and gone by its end
    Left,
}

impl std::fmt::Display for NodeClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeClassification::Online => write!(f, "online"),
            NodeClassification::Offline => write!(f, "offline"),
            NodeClassification::Dangling => write!(f, "dangling"),
            NodeClassification::Oneoff => write!(f, "oneoff"),
            NodeClassification::Entered => write!(f, "entered"),
            NodeClassification::Left => write!(f, "left"),
        }
    }
}
