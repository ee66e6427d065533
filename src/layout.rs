//! Fixed column roles of the results sheet.
//!
//! Positions are zero-based column indices (column A is 0). The defaults
//! describe the SCORES sheet; a JSON file can override any field:
//! ```json
//! {
//!   "competition_col": 4,
//!   "model_groups": [
//!     { "label": "gpt-4.1-mini", "start": 37, "end": 50 }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// One model's block of per-language columns, `start..end` (end exclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelGroup {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl ModelGroup {
    fn new(label: &str, start: usize, end: usize) -> Self {
        Self {
            label: label.to_string(),
            start,
            end,
        }
    }

    pub fn columns(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Static model-group table: (label, first column, one past last column).
pub static MODEL_GROUPS: &[(&str, usize, usize)] = &[
    ("gpt-oss-120", 11, 24),
    ("gemini-2.5-flash", 24, 37),
    ("gpt-4.1-mini", 37, 50),
    ("qwen2.5-coder", 50, 63),
    ("gpt-4.1-mini + deepseek-r1 (ml-master)", 63, 76),
    ("gpt-oss:120b + qwen3-coder:30b (ml-master)", 76, 89),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Rows copied untouched before data starts.
    pub header_rows: usize,
    /// Header row holding the language label of each score column.
    pub language_row: usize,
    pub comp_name_col: usize,
    pub competition_col: usize,
    pub task_type_col: usize,
    pub first_score_col: usize,
    /// Last score column, inclusive. Clipped to the sheet width.
    pub last_score_col: usize,
    pub model_groups: Vec<ModelGroup>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_rows: 2,
            language_row: 1,
            comp_name_col: 1,
            competition_col: 4,
            task_type_col: 9,
            first_score_col: 11,
            last_score_col: 88,
            model_groups: MODEL_GROUPS
                .iter()
                .map(|&(label, start, end)| ModelGroup::new(label, start, end))
                .collect(),
        }
    }
}

impl SheetLayout {
    /// Loads a layout from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout {}", path.display()))?;
        let layout = serde_json::from_str(&content)
            .with_context(|| format!("Invalid layout JSON in {}", path.display()))?;
        Ok(layout)
    }

    /// Loads `path` if given, otherwise the built-in layout.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Score columns that exist in a sheet `width` columns wide.
    pub fn score_columns(&self, width: usize) -> Option<RangeInclusive<usize>> {
        let last = self.last_score_col.min(width.checked_sub(1)?);
        (self.first_score_col <= last).then_some(self.first_score_col..=last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_groups_are_contiguous() {
        let layout = SheetLayout::default();
        assert_eq!(layout.model_groups.len(), 6);
        for pair in layout.model_groups.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(layout.model_groups[0].start, layout.first_score_col);
        assert_eq!(
            layout.model_groups.last().unwrap().end,
            layout.last_score_col + 1
        );
    }

    #[test]
    fn test_score_columns_clip_to_width() {
        let layout = SheetLayout::default();
        assert_eq!(layout.score_columns(200), Some(11..=88));
        assert_eq!(layout.score_columns(20), Some(11..=19));
        assert_eq!(layout.score_columns(11), None);
        assert_eq!(layout.score_columns(0), None);
    }

    #[test]
    fn test_partial_json_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"competition_col": 2, "model_groups": [{{"label": "m", "start": 3, "end": 5}}]}}"#
        )
        .unwrap();

        let layout = SheetLayout::load(file.path()).unwrap();
        assert_eq!(layout.competition_col, 2);
        assert_eq!(layout.header_rows, 2);
        assert_eq!(layout.model_groups, vec![ModelGroup::new("m", 3, 5)]);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(SheetLayout::load(Path::new("/nonexistent/layout.json")).is_err());
    }
}
