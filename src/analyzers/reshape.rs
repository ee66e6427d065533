//! Wide-to-long reshaping of the percentile sheet.

use crate::analyzers::types::Observation;
use crate::layout::SheetLayout;
use crate::sheet::{CellValue, Sheet};

/// Coerces a cell to a number: numeric cells and numeric text only.
pub fn numeric_value(cell: &CellValue) -> Option<f64> {
    let v = match cell {
        CellValue::Number(v) => *v,
        CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Flattens every numeric score cell into an [`Observation`].
///
/// The language comes from the layout's language header row, the model from
/// the group the column belongs to and the task type from the row's task-type
/// column. Columns without a language and rows without a task type are left
/// out, as are cells that are not numeric.
pub fn reshape(sheet: &Sheet, layout: &SheetLayout) -> Vec<Observation> {
    let mut observations = Vec::new();

    for group in &layout.model_groups {
        for col in group.columns().filter(|&c| c < sheet.width()) {
            let language = sheet.get(layout.language_row, col);
            if language.is_empty() {
                continue;
            }
            let language = language.to_text().trim().to_string();

            for row in layout.header_rows..sheet.height() {
                let Some(percentile) = numeric_value(sheet.get(row, col)) else {
                    continue;
                };
                let task_type = sheet.get(row, layout.task_type_col);
                if task_type.is_empty() {
                    continue;
                }
                observations.push(Observation {
                    language: language.clone(),
                    model: group.label.clone(),
                    task_type: task_type.to_text().trim().to_string(),
                    percentile,
                });
            }
        }
    }

    observations
}
