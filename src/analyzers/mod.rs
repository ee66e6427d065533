//! Percentile aggregation.
//!
//! This module reshapes the percentile sheet into long-form records, computes
//! median, quartiles and threshold shares per (model, task type, language)
//! group, and writes language pivots as CSV.

pub mod aggregate;
pub mod analyzer;
pub mod reshape;
pub mod types;
pub mod utility;
