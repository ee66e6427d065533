//! Persistence for both stages.
//!
//! Stage one saves the percentile workbook; stage two writes language pivots
//! and the per-group statistics table as CSV.

use anyhow::{Context, Result, anyhow};
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};
use umya_spreadsheet::Spreadsheet;

use crate::analyzers::types::{GroupStats, Pivot};
use crate::sheet::{CellValue, Sheet};

/// Copies the swept cells of `sheet` back into its worksheet in `book` and
/// saves the workbook to `path`.
///
/// Only cells listed in `updated` are touched, so header rows, metadata
/// columns and anything left unparsed keep their original content and style.
pub fn write_percentile_workbook(
    book: &mut Spreadsheet,
    sheet: &Sheet,
    updated: &[(usize, usize)],
    path: &Path,
) -> Result<()> {
    let ws = book
        .get_sheet_by_name_mut(&sheet.name)
        .ok_or_else(|| anyhow!("worksheet '{}' not found", sheet.name))?;

    for &(row, col) in updated {
        if let CellValue::Number(v) = sheet.get(row, col) {
            let coordinate = (col as u32 + 1, row as u32 + 1);
            ws.get_cell_mut(coordinate).set_value_number(*v);
        }
    }
    debug!(cells = updated.len(), "Copied percentiles into worksheet");

    umya_spreadsheet::writer::xlsx::write(book, path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;
    info!(path = %path.display(), "Workbook saved");
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes a pivot as CSV: `model,task_type,<language>...`, one row per
/// (model, task type). Missing combinations are empty cells.
pub fn write_pivot(path: &Path, pivot: &Pivot) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    let mut header = vec!["model".to_string(), "task_type".to_string()];
    header.extend(pivot.languages.iter().cloned());
    writer.write_record(&header)?;

    for (model, task_type) in pivot.row_keys() {
        let mut record = vec![model.clone(), task_type.clone()];
        record.extend(
            pivot
                .languages
                .iter()
                .map(|lang| format_value(pivot.get(model, task_type, lang))),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    debug!(path = %path.display(), rows = pivot.row_keys().count(), "Pivot written");
    Ok(())
}

/// Writes one CSV row per group with every summary statistic.
pub fn write_group_stats(path: &Path, stats: &[GroupStats]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in stats {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;

    fn sample_pivot() -> Pivot {
        let mut values = BTreeMap::new();
        values.insert(("m".to_string(), "t".to_string(), "en".to_string()), 0.6);
        values.insert(("m".to_string(), "u".to_string(), "fr".to_string()), 0.25);
        Pivot::from_values(values)
    }

    #[test]
    fn test_write_pivot_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("median.csv");

        write_pivot(&path, &sample_pivot()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["model,task_type,en,fr", "m,t,0.6,", "m,u,,0.25"]);
    }

    #[test]
    fn test_write_group_stats_has_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let row = GroupStats {
            model: "m".into(),
            task_type: "t".into(),
            language: "en".into(),
            count: 3,
            median: 0.6,
            q1: 0.5,
            q3: 0.775,
            iqr: 0.275,
            top10_frac: 1.0 / 3.0,
            below50_frac: 1.0 / 3.0,
        };

        write_group_stats(&path, &[row.clone(), row]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("model,task_type,language,count,median"));
    }

    #[test]
    fn test_write_pivot_bad_path_fails() {
        let err = write_pivot(Path::new("/nonexistent/dir/x.csv"), &sample_pivot());
        assert!(err.is_err());
    }
}
