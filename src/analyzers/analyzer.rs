use crate::analyzers::aggregate::{aggregate, iqr_pivot, median_pivot};
use crate::analyzers::reshape::reshape;
use crate::analyzers::types::{GroupStats, Observation};
use crate::layout::SheetLayout;
use crate::output::{write_group_stats, write_pivot};
use crate::sheet::{open_workbook, read_sheet};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MEDIAN_FILE: &str = "median_by_model_task_type_language.csv";
pub const IQR_FILE: &str = "iqr_by_model_task_type_language.csv";

#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Worksheet to read; the first one when `None`.
    pub sheet: Option<String>,
    pub output_dir: PathBuf,
    /// Also write the full per-group statistics table here.
    pub stats_file: Option<PathBuf>,
    /// Divide percentiles by 100 before aggregating.
    pub fraction: bool,
}

/// Files written by [`run_aggregation`].
#[derive(Debug, Clone)]
pub struct AggregateOutputs {
    pub median_path: PathBuf,
    pub iqr_path: PathBuf,
    pub stats_path: Option<PathBuf>,
    pub stats: Vec<GroupStats>,
}

/// Reads the percentile workbook into long-form observations.
pub fn read_observations(
    input: &Path,
    sheet: Option<&str>,
    layout: &SheetLayout,
) -> Result<Vec<Observation>> {
    let book = open_workbook(input)?;
    let sheet = read_sheet(&book, sheet)?;
    Ok(reshape(&sheet, layout))
}

fn distinct(observations: &[Observation], field: fn(&Observation) -> &str) -> String {
    observations
        .iter()
        .map(field)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(", ")
}

fn log_dimensions(observations: &[Observation]) {
    info!(
        total = observations.len(),
        languages = %distinct(observations, |o| o.language.as_str()),
        models = %distinct(observations, |o| o.model.as_str()),
        task_types = %distinct(observations, |o| o.task_type.as_str()),
        "Long-form records built"
    );
}

/// Runs stage two: reshape the percentile sheet, aggregate per group and
/// write the median and IQR pivots (plus the full table when asked).
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn run_aggregation(
    input: &Path,
    layout: &SheetLayout,
    options: &AggregateOptions,
) -> Result<AggregateOutputs> {
    let mut observations = read_observations(input, options.sheet.as_deref(), layout)?;
    if options.fraction {
        for obs in &mut observations {
            obs.percentile /= 100.0;
        }
    }
    log_dimensions(&observations);

    let stats = aggregate(&observations);
    info!(groups = stats.len(), "Aggregated statistics");

    fs::create_dir_all(&options.output_dir).with_context(|| {
        format!("Failed to create output dir {}", options.output_dir.display())
    })?;

    let median_path = options.output_dir.join(MEDIAN_FILE);
    let iqr_path = options.output_dir.join(IQR_FILE);
    write_pivot(&median_path, &median_pivot(&stats))?;
    write_pivot(&iqr_path, &iqr_pivot(&stats))?;

    if let Some(path) = &options.stats_file {
        write_group_stats(path, &stats)?;
    }

    info!(
        median = %median_path.display(),
        iqr = %iqr_path.display(),
        "Results saved"
    );

    Ok(AggregateOutputs {
        median_path,
        iqr_path,
        stats_path: options.stats_file.clone(),
        stats,
    })
}
