//! # PeerCensus - analytics core for periodic peer-to-peer crawl reports
//!
//! This library turns raw peer-to-peer crawl data into the aggregates a
//! periodic network report is built from: canonical client families
//! parsed out of untrusted agent identity strings, ranked
//! top-N-plus-"Rest" distributions, empirical CDFs of uptime and
//! inter-arrival samples, and per-category time series across crawls.
//!
//! ## Overview
//!
//! The crawler visits every reachable peer of a network and records the
//! identity string each peer reports during the handshake, together
//! with visit timestamps and counts. Downstream, a report renderer
//! wants bounded, human-presentable tables. This crate is the pure
//! computation between the two: it performs no I/O and holds no state
//! across calls, so it is safe to use from any context.
//!
//! ## Architecture
//!
//! - `agent`: identity classification, family prefix matching and
//!   structured version parsing
//! - `distribution`: top-N bucketing, empirical CDFs, time-bucketed
//!   series
//! - `types`: record types shared with the query and rendering layers
//! - `fmt`: number formatting for report labels
//!
//! ## Example Usage
//!
//! ```rust
//! use peer_census::{AgentClassifier, AgentVersionRow, top_n_with_rest};
//!
//! let classifier = AgentClassifier::new();
//! assert_eq!(classifier.classify_family("kubo/0.20.0/xyz/"), "kubo");
//!
//! // Rows as they come back from the visit store
//! let rows = vec![
//!     AgentVersionRow::new("kubo/0.18.0/abc123/", 1200),
//!     AgentVersionRow::new("iroh/0.4.1", 40),
//!     AgentVersionRow::new("some-unknown-client", 7),
//! ];
//! let ranked = top_n_with_rest(&classifier.family_distribution(&rows), 2);
//! assert_eq!(ranked.last().unwrap().key, "Rest");
//! ```
//!
//! ## Error Handling
//!
//! Identity strings are adversarial input, so the classifiers never
//! fail: anything unparseable degrades to `"other"` or `None`.
//! Aggregation inputs, by contrast, are already-validated query
//! results; their invariants (non-negative counts, finite samples) are
//! documented preconditions rather than runtime checks.

pub mod agent;
pub mod distribution;
pub mod fmt;
pub mod types;

pub use agent::{
    AgentClassifier, CanonicalAgent, FamilyRule, SemanticVersion, VersionError, OTHER_FAMILY,
};
pub use distribution::{
    bucket_over_time, empirical_cdf, top_categories_by_mean, top_n_with_rest, REST_KEY,
};
pub use types::*;
