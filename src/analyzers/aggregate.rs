use crate::analyzers::types::{GroupKey, GroupStats, Observation, Pivot};
use crate::analyzers::utility::{fraction, quantile_sorted, sorted};
use std::collections::BTreeMap;

/// Observations at or above this count towards `top10_frac`.
pub const TOP_THRESHOLD: f64 = 0.90;
/// Observations at or below this count towards `below50_frac`.
pub const BELOW_THRESHOLD: f64 = 0.50;

/// Summary statistics of a group's percentiles, without the group labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub top10_frac: f64,
    pub below50_frac: f64,
}

/// Median, quartiles, IQR and threshold shares of `values`.
///
/// Returns `None` for an empty group.
pub fn agg_stats(values: &[f64]) -> Option<Summary> {
    let sorted = sorted(values);
    let q1 = quantile_sorted(&sorted, 0.25)?;
    let median = quantile_sorted(&sorted, 0.50)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;

    Some(Summary {
        count: values.len(),
        median,
        q1,
        q3,
        iqr: q3 - q1,
        top10_frac: fraction(values, |v| v >= TOP_THRESHOLD),
        below50_frac: fraction(values, |v| v <= BELOW_THRESHOLD),
    })
}

/// Collects percentiles per (model, task type, language), sorted by key.
pub fn group_observations(observations: &[Observation]) -> BTreeMap<GroupKey, Vec<f64>> {
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.model.clone(), obs.task_type.clone(), obs.language.clone()))
            .or_default()
            .push(obs.percentile);
    }
    groups
}

/// Aggregates long-form observations into one [`GroupStats`] per group.
pub fn aggregate(observations: &[Observation]) -> Vec<GroupStats> {
    group_observations(observations)
        .into_iter()
        .filter_map(|((model, task_type, language), values)| {
            let s = agg_stats(&values)?;
            Some(GroupStats {
                model,
                task_type,
                language,
                count: s.count,
                median: s.median,
                q1: s.q1,
                q3: s.q3,
                iqr: s.iqr,
                top10_frac: s.top10_frac,
                below50_frac: s.below50_frac,
            })
        })
        .collect()
}

fn pivot_by(stats: &[GroupStats], pick: impl Fn(&GroupStats) -> f64) -> Pivot {
    let values = stats
        .iter()
        .map(|s| {
            (
                (s.model.clone(), s.task_type.clone(), s.language.clone()),
                pick(s),
            )
        })
        .collect();
    Pivot::from_values(values)
}

/// Medians with languages as columns.
pub fn median_pivot(stats: &[GroupStats]) -> Pivot {
    pivot_by(stats, |s| s.median)
}

/// Interquartile ranges with languages as columns.
pub fn iqr_pivot(stats: &[GroupStats]) -> Pivot {
    pivot_by(stats, |s| s.iqr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(model: &str, task_type: &str, language: &str, percentile: f64) -> Observation {
        Observation {
            language: language.to_string(),
            model: model.to_string(),
            task_type: task_type.to_string(),
            percentile,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_agg_stats_three_values() {
        let s = agg_stats(&[0.95, 0.40, 0.60]).unwrap();
        assert_eq!(s.count, 3);
        assert!(close(s.median, 0.60));
        assert!(close(s.q1, 0.50));
        assert!(close(s.q3, 0.775));
        assert!(close(s.iqr, 0.275));
        assert!(close(s.top10_frac, 1.0 / 3.0));
        assert!(close(s.below50_frac, 1.0 / 3.0));
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let s = agg_stats(&[0.90, 0.50]).unwrap();
        assert!(close(s.top10_frac, 0.5));
        assert!(close(s.below50_frac, 0.5));
    }

    #[test]
    fn test_agg_stats_empty() {
        assert_eq!(agg_stats(&[]), None);
    }

    #[test]
    fn test_aggregate_groups_and_pivots() {
        let observations = vec![
            obs("m", "t", "L", 0.95),
            obs("m", "t", "L", 0.40),
            obs("m", "t", "L", 0.60),
            obs("m", "t", "K", 0.20),
            obs("a", "t", "L", 1.00),
        ];

        let stats = aggregate(&observations);
        let keys: Vec<_> = stats
            .iter()
            .map(|s| format!("{}/{}/{}", s.model, s.task_type, s.language))
            .collect();
        assert_eq!(keys, vec!["a/t/L", "m/t/K", "m/t/L"]);
        assert_eq!(stats[2].count, 3);

        let medians = median_pivot(&stats);
        assert_eq!(medians.languages, vec!["K", "L"]);
        assert_eq!(medians.get("m", "t", "L"), Some(0.60));
        assert_eq!(medians.get("a", "t", "K"), None);

        let iqrs = iqr_pivot(&stats);
        assert_eq!(iqrs.get("m", "t", "K"), Some(0.0));
    }
}
