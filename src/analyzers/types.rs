//! Data types used by the aggregation stage.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One percentile in long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub language: String,
    pub model: String,
    pub task_type: String,
    pub percentile: f64,
}

/// Summary statistics of one (model, task type, language) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub model: String,
    pub task_type: String,
    pub language: String,
    pub count: usize,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// Share of observations at or above 0.90.
    pub top10_frac: f64,
    /// Share of observations at or below 0.50.
    pub below50_frac: f64,
}

/// (model, task type, language)
pub type GroupKey = (String, String, String);

/// A statistic laid out with (model, task type) rows and language columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pivot {
    /// Column labels, sorted.
    pub languages: Vec<String>,
    values: BTreeMap<GroupKey, f64>,
}

impl Pivot {
    pub fn from_values(values: BTreeMap<GroupKey, f64>) -> Self {
        let languages: BTreeSet<&String> = values.keys().map(|(_, _, lang)| lang).collect();
        Self {
            languages: languages.into_iter().cloned().collect(),
            values,
        }
    }

    /// Distinct (model, task type) pairs in sorted order.
    pub fn row_keys(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values
            .keys()
            .map(|(model, task_type, _)| (model, task_type))
            .collect::<BTreeSet<_>>()
            .into_iter()
    }

    pub fn get(&self, model: &str, task_type: &str, language: &str) -> Option<f64> {
        self.values
            .get(&(model.to_string(), task_type.to_string(), language.to_string()))
            .copied()
    }
}
