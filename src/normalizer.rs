//! Stage one: replace raw scores in the results sheet with percentiles.

use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::layout::SheetLayout;
use crate::leaderboard::{Leaderboard, load_leaderboards};
use crate::output::write_percentile_workbook;
use crate::parser::parse_score_value;
use crate::percentile::calculate_percentile;
use crate::sheet::{CellValue, Sheet, open_workbook, read_sheet};

/// How many unparseable cells get logged before going quiet.
pub const SKIPPED_LOG_LIMIT: usize = 5;

/// What a sweep did to the sheet.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    /// Zero-based `(row, col)` of every overwritten cell, in sweep order.
    pub updated: Vec<(usize, usize)>,
    pub rows_processed: usize,
    pub rows_skipped: usize,
    /// Competition ids referenced by the sheet with no loaded leaderboard.
    pub missing_competitions: BTreeSet<String>,
    /// Non-empty score cells that did not parse to a number.
    pub unparsed_cells: usize,
}

impl SweepReport {
    pub fn updates_count(&self) -> usize {
        self.updated.len()
    }
}

/// Normalizes a competition cell to the id leaderboard files are named by.
///
/// Dates become `YYYY-MM-DD`; blank cells have no id.
pub fn competition_label(cell: &CellValue) -> Option<String> {
    if cell.is_empty() {
        return None;
    }
    Some(cell.to_text().trim().to_string())
}

/// Rewrites every scorable cell of `sheet` with its percentile, in place.
///
/// Rows without a competition, or whose competition has no leaderboard, are
/// left alone (one warning per missing competition). Cells that do not parse
/// or produce no percentile keep their raw value.
pub fn sweep(
    sheet: &mut Sheet,
    leaderboards: &BTreeMap<String, Leaderboard>,
    layout: &SheetLayout,
) -> SweepReport {
    let mut report = SweepReport::default();

    let Some(columns) = layout.score_columns(sheet.width()) else {
        warn!(
            width = sheet.width(),
            first_score_col = layout.first_score_col,
            "Sheet has no score columns"
        );
        return report;
    };
    info!(
        start_col = columns.start(),
        end_col = columns.end(),
        "Processing score columns"
    );

    for row in layout.header_rows..sheet.height() {
        let Some(competition) = competition_label(sheet.get(row, layout.competition_col)) else {
            report.rows_skipped += 1;
            continue;
        };

        let Some(board) = leaderboards.get(&competition) else {
            if report.missing_competitions.insert(competition.clone()) {
                warn!(competition = %competition, "Leaderboard for competition not found");
            }
            report.rows_skipped += 1;
            continue;
        };

        let comp_name = match sheet.get(row, layout.comp_name_col) {
            CellValue::Empty => "Unknown".to_string(),
            other => other.to_text(),
        };
        debug!(
            row = row + 1,
            comp_name = %comp_name,
            competition = %competition,
            "Processing row"
        );
        report.rows_processed += 1;

        for col in columns.clone() {
            let raw = sheet.get(row, col);
            let Some(score) = parse_score_value(raw) else {
                if !raw.is_empty() {
                    if report.unparsed_cells < SKIPPED_LOG_LIMIT {
                        debug!(
                            row = row + 1,
                            col = col + 1,
                            value = %raw.to_text(),
                            kind = raw.kind(),
                            "Skipped value"
                        );
                    }
                    report.unparsed_cells += 1;
                }
                continue;
            };

            match calculate_percentile(score, board) {
                Some(p) => {
                    sheet.set(row, col, CellValue::Number(f64::from(p)));
                    report.updated.push((row, col));
                }
                None => {
                    warn!(score, competition = %competition, "Percentile calculation failed");
                }
            }
        }
    }

    info!(
        updated = report.updates_count(),
        rows_processed = report.rows_processed,
        rows_skipped = report.rows_skipped,
        unparsed = report.unparsed_cells,
        "Sweep finished"
    );
    report
}

/// Runs stage one end to end: read the workbook and leaderboards, sweep the
/// sheet and save the result to `output`.
#[tracing::instrument(skip_all, fields(input = %input.display(), sheet = sheet_name))]
pub fn convert_scores_to_percentiles(
    input: &Path,
    leaderboards_dir: &Path,
    output: &Path,
    sheet_name: &str,
    layout: &SheetLayout,
) -> Result<SweepReport> {
    info!("Reading results workbook");
    let mut book = open_workbook(input)?;
    let mut sheet = read_sheet(&book, Some(sheet_name))?;

    let leaderboards = load_leaderboards(leaderboards_dir)?;
    let report = sweep(&mut sheet, &leaderboards, layout);

    write_percentile_workbook(&mut book, &sheet, &report.updated, output)?;
    info!(updated = report.updates_count(), "Saved percentile workbook");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardEntry;
    use chrono::NaiveDate;

    fn layout() -> SheetLayout {
        SheetLayout {
            header_rows: 2,
            language_row: 1,
            comp_name_col: 0,
            competition_col: 1,
            task_type_col: 2,
            first_score_col: 3,
            last_score_col: 5,
            model_groups: vec![],
        }
    }

    fn boards() -> BTreeMap<String, Leaderboard> {
        let entries = (1..=20)
            .map(|r| LeaderboardEntry {
                rank: r as f64,
                score: 1.0 - r as f64 * 0.025,
            })
            .collect();
        let board = Leaderboard::new("2024-05-01", entries);
        BTreeMap::from([(board.competition.clone(), board)])
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn header() -> Vec<Vec<CellValue>> {
        vec![
            vec![text("comp_name"), text("competition"), text("task_type"), text("m")],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, text("en")],
        ]
    }

    #[test]
    fn test_competition_label() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            competition_label(&CellValue::Date(date)).as_deref(),
            Some("2024-05-01")
        );
        assert_eq!(competition_label(&text(" titanic ")).as_deref(), Some("titanic"));
        assert_eq!(competition_label(&CellValue::Number(42.0)).as_deref(), Some("42"));
        assert_eq!(competition_label(&CellValue::Empty), None);
        assert_eq!(competition_label(&text("  ")), None);
    }

    #[test]
    fn test_sweep_replaces_scorable_cells_only() {
        let mut rows = header();
        rows.push(vec![
            text("Comp"),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
            text("cls"),
            text("0.92"),
            text("https://example.com/run/17"),
            CellValue::Number(0.1),
        ]);
        let mut sheet = Sheet::from_rows("SCORES", rows);
        let before_headers = (sheet.row(0).to_vec(), sheet.row(1).to_vec());

        let report = sweep(&mut sheet, &boards(), &layout());

        assert_eq!(report.updated, vec![(2, 3), (2, 5)]);
        assert_eq!(sheet.get(2, 3), &CellValue::Number(84.0));
        assert_eq!(sheet.get(2, 4), &text("https://example.com/run/17"));
        assert_eq!(sheet.get(2, 5), &CellValue::Number(1.0));
        assert_eq!(sheet.get(2, 2), &text("cls"));
        assert_eq!((sheet.row(0).to_vec(), sheet.row(1).to_vec()), before_headers);
        assert_eq!(report.unparsed_cells, 1);
    }

    #[test]
    fn test_missing_competition_warns_once() {
        let mut rows = header();
        for _ in 0..3 {
            rows.push(vec![
                text("Other"),
                text("unknown-comp"),
                text("cls"),
                text("0.5"),
                text("0.6"),
                text("0.7"),
            ]);
        }
        rows.push(vec![text("No comp"), CellValue::Empty, text("cls"), text("0.5")]);
        let mut sheet = Sheet::from_rows("SCORES", rows);
        let untouched = sheet.clone();

        let report = sweep(&mut sheet, &boards(), &layout());

        assert_eq!(sheet, untouched);
        assert!(report.updated.is_empty());
        assert_eq!(report.rows_skipped, 4);
        assert_eq!(
            report.missing_competitions.into_iter().collect::<Vec<_>>(),
            vec!["unknown-comp".to_string()]
        );
    }

    #[test]
    fn test_sweep_is_rerunnable_on_its_output() {
        let mut rows = header();
        rows.push(vec![
            text("Comp"),
            text("2024-05-01"),
            text("cls"),
            text("0.92"),
            text("0.5, because"),
            text("n/a"),
        ]);
        let mut sheet = Sheet::from_rows("SCORES", rows);
        sweep(&mut sheet, &boards(), &layout());
        let second = sweep(&mut sheet, &boards(), &layout());

        assert_eq!(second.updates_count(), 2);
        for col in 3..=4 {
            let CellValue::Number(p) = sheet.get(2, col) else {
                panic!("expected a number in column {col}");
            };
            assert!((1.0..=100.0).contains(p));
        }
    }

    #[test]
    fn test_narrow_sheet_has_nothing_to_sweep() {
        let mut sheet = Sheet::from_rows("SCORES", vec![vec![text("a"), text("b")]]);
        let report = sweep(&mut sheet, &boards(), &layout());
        assert_eq!(report, SweepReport::default());
    }
}
