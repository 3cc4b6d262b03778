//! Ranked distributions, empirical CDFs, and time-bucketed series.
//!
//! Inputs are already-validated query results: counts are non-negative
//! and samples contain only finite numbers. That contract is a
//! precondition of this module, not something it checks at runtime.

use std::collections::{BTreeMap, HashMap};
use std::collections::hash_map::Entry;
use std::hash::Hash;

use crate::types::{CdfPoint, CrawlTime, DistributionRow, TimeSeriesRow};

/// Key of the synthetic overflow row appended by [`top_n_with_rest`]
pub const REST_KEY: &str = "Rest";

/// Reduce category counts to the `n` largest plus a "Rest" row.
///
/// Duplicate keys are summed first. The sort is stable and descending,
/// so equal counts keep their first-encounter order. The "Rest" row is
/// appended only when something actually falls outside the top `n`;
/// the total count is preserved either way.
pub fn top_n_with_rest(rows: &[DistributionRow], n: usize) -> Vec<DistributionRow> {
    let mut grouped: Vec<DistributionRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        match index.get(row.key.as_str()) {
            Some(&i) => grouped[i].count += row.count,
            None => {
                index.insert(row.key.as_str(), grouped.len());
                grouped.push(row.clone());
            }
        }
    }

    grouped.sort_by(|a, b| b.count.cmp(&a.count));

    if grouped.len() <= n {
        return grouped;
    }

    let rest: u64 = grouped[n..].iter().map(|row| row.count).sum();
    grouped.truncate(n);
    if rest > 0 {
        grouped.push(DistributionRow::new(REST_KEY, rest));
    }
    grouped
}

/// Empirical cumulative distribution of a numeric sample.
///
/// Returns one point per observation in ascending order, with
/// `fraction` the 1-based rank divided by the sample size. Duplicate
/// values keep their own points. The empty sample yields an empty
/// sequence.
pub fn empirical_cdf(sample: &[f64]) -> Vec<CdfPoint> {
    if sample.is_empty() {
        return Vec::new();
    }

    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let total = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &value)| CdfPoint {
            value,
            fraction: (i + 1) as f64 / total,
        })
        .collect()
}

/// Group per-crawl observations into one ordered series per category.
///
/// Counts of duplicate (bucket, category) pairs are summed. Each
/// category's series is sorted ascending by bucket. Categories without
/// a single observation do not appear in the result.
pub fn bucket_over_time<C>(rows: &[TimeSeriesRow<C>]) -> HashMap<C, Vec<(CrawlTime, u64)>>
where
    C: Eq + Hash + Clone,
{
    let mut series: HashMap<C, BTreeMap<CrawlTime, u64>> = HashMap::new();

    for row in rows {
        *series
            .entry(row.category.clone())
            .or_default()
            .entry(row.bucket)
            .or_insert(0) += row.count;
    }

    log::debug!(
        "Bucketed {} observations into {} category series",
        rows.len(),
        series.len()
    );

    series
        .into_iter()
        .map(|(category, buckets)| (category, buckets.into_iter().collect()))
        .collect()
}

/// Rank categories by their mean per-bucket count and keep the `n`
/// most widely used.
///
/// Used to bound version-over-time views to the releases that matter:
/// a release that briefly spiked ranks below one that held a steady
/// population. Ties keep first-encounter order.
pub fn top_categories_by_mean<C>(rows: &[TimeSeriesRow<C>], n: usize) -> Vec<C>
where
    C: Eq + Hash + Clone,
{
    let mut order: Vec<C> = Vec::new();
    let mut totals: HashMap<C, (u64, u64)> = HashMap::new();

    for row in rows {
        match totals.entry(row.category.clone()) {
            Entry::Occupied(mut entry) => {
                let (sum, buckets) = entry.get_mut();
                *sum += row.count;
                *buckets += 1;
            }
            Entry::Vacant(entry) => {
                order.push(row.category.clone());
                entry.insert((row.count, 1));
            }
        }
    }

    let mean = |category: &C| -> f64 {
        let (sum, buckets) = totals[category];
        sum as f64 / buckets as f64
    };
    order.sort_by(|a, b| mean(b).partial_cmp(&mean(a)).unwrap_or(std::cmp::Ordering::Equal));
    order.truncate(n);
    order
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::NodeClassification;

    fn crawl(hour: u32) -> CrawlTime {
        Utc.with_ymd_and_hms(2023, 3, 6, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_top_n_groups_duplicate_keys() {
        let rows = vec![
            DistributionRow::new("kubo", 5),
            DistributionRow::new("iroh", 2),
            DistributionRow::new("kubo", 4),
        ];
        let result = top_n_with_rest(&rows, 10);
        assert_eq!(
            result,
            vec![
                DistributionRow::new("kubo", 9),
                DistributionRow::new("iroh", 2),
            ]
        );
    }

    #[test]
    fn test_top_n_appends_rest() {
        let rows = vec![
            DistributionRow::new("kubo", 100),
            DistributionRow::new("hydra-booster", 30),
            DistributionRow::new("iroh", 8),
            DistributionRow::new("storm", 5),
        ];
        let result = top_n_with_rest(&rows, 2);
        assert_eq!(
            result,
            vec![
                DistributionRow::new("kubo", 100),
                DistributionRow::new("hydra-booster", 30),
                DistributionRow::new(REST_KEY, 13),
            ]
        );

        let input_total: u64 = rows.iter().map(|r| r.count).sum();
        let output_total: u64 = result.iter().map(|r| r.count).sum();
        assert_eq!(input_total, output_total);
    }

    #[test]
    fn test_top_n_no_rest_when_everything_fits() {
        let rows = vec![
            DistributionRow::new("kubo", 100),
            DistributionRow::new("iroh", 8),
        ];
        assert_eq!(top_n_with_rest(&rows, 2).len(), 2);
        assert_eq!(top_n_with_rest(&rows, 5).len(), 2);
        assert_eq!(top_n_with_rest(&[], 5), vec![]);
    }

    #[test]
    fn test_top_n_no_rest_when_remainder_is_zero() {
        let rows = vec![
            DistributionRow::new("kubo", 100),
            DistributionRow::new("iroh", 8),
            DistributionRow::new("ghost", 0),
        ];
        let result = top_n_with_rest(&rows, 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result.last().unwrap().key, "iroh");
    }

    #[test]
    fn test_top_n_ties_keep_encounter_order() {
        let rows = vec![
            DistributionRow::new("b", 5),
            DistributionRow::new("a", 5),
            DistributionRow::new("c", 9),
        ];
        let result = top_n_with_rest(&rows, 3);
        assert_eq!(
            result,
            vec![
                DistributionRow::new("c", 9),
                DistributionRow::new("b", 5),
                DistributionRow::new("a", 5),
            ]
        );
    }

    #[test]
    fn test_cdf_empty_sample() {
        assert_eq!(empirical_cdf(&[]), vec![]);
    }

    #[test]
    fn test_cdf_single_observation() {
        let result = empirical_cdf(&[4.2]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].value, 4.2);
        assert_eq!(result[0].fraction, 1.0);
    }

    #[test]
    fn test_cdf_sorts_and_is_monotone() {
        let result = empirical_cdf(&[3.0, 1.0, 2.0, 2.0]);
        let values: Vec<f64> = result.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 2.0, 3.0]);
        let fractions: Vec<f64> = result.iter().map(|p| p.fraction).collect();
        assert_eq!(fractions, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_bucket_over_time_sums_and_sorts() {
        let rows = vec![
            TimeSeriesRow::new(crawl(12), "kubo", 10),
            TimeSeriesRow::new(crawl(0), "kubo", 8),
            TimeSeriesRow::new(crawl(12), "kubo", 2),
            TimeSeriesRow::new(crawl(0), "iroh", 1),
        ];
        let series = bucket_over_time(&rows);
        assert_eq!(series.len(), 2);
        assert_eq!(
            series["kubo"],
            vec![(crawl(0), 8), (crawl(12), 12)]
        );
        assert_eq!(series["iroh"], vec![(crawl(0), 1)]);
    }

    #[test]
    fn test_bucket_over_time_omits_absent_categories() {
        let rows: Vec<TimeSeriesRow<&str>> = vec![];
        assert!(bucket_over_time(&rows).is_empty());
    }

    #[test]
    fn test_bucket_over_time_by_classification() {
        let rows = vec![
            TimeSeriesRow::new(crawl(0), NodeClassification::Online, 120),
            TimeSeriesRow::new(crawl(12), NodeClassification::Online, 118),
            TimeSeriesRow::new(crawl(0), NodeClassification::Oneoff, 4),
        ];
        let series = bucket_over_time(&rows);
        assert_eq!(
            series[&NodeClassification::Online],
            vec![(crawl(0), 120), (crawl(12), 118)]
        );
        assert!(!series.contains_key(&NodeClassification::Left));
    }

    #[test]
    fn test_top_categories_by_mean() {
        let rows = vec![
            TimeSeriesRow::new(crawl(0), "0.18.0", 100),
            TimeSeriesRow::new(crawl(12), "0.18.0", 100),
            TimeSeriesRow::new(crawl(0), "0.17.0", 310),
            TimeSeriesRow::new(crawl(12), "0.17.0", 2),
            TimeSeriesRow::new(crawl(0), "0.16.0", 1),
        ];
        // 0.17.0 averages 156, 0.18.0 averages 100, 0.16.0 averages 1
        assert_eq!(
            top_categories_by_mean(&rows, 2),
            vec!["0.17.0", "0.18.0"]
        );
        assert_eq!(top_categories_by_mean(&rows, 10).len(), 3);
    }
}
