//! In-memory view of one worksheet.
//!
//! The workbook is read once with `umya-spreadsheet` and flattened into a
//! dense grid of [`CellValue`]s indexed from zero, so the rest of the crate
//! never touches the xlsx model directly.

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDate};
use std::path::Path;
use tracing::debug;
use umya_spreadsheet::{Cell, Spreadsheet, Worksheet};

/// A single cell as the pipeline sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Renders the cell as text. Integral numbers drop their fractional part
    /// and dates use `YYYY-MM-DD`, which is how leaderboard files are named.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                format!("{}", *v as i64)
            }
            CellValue::Number(v) => v.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Short name of the variant, used in skip diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Bool(_) => "bool",
            CellValue::Date(_) => "date",
        }
    }
}

/// Dense, zero-indexed grid of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

impl Sheet {
    /// Builds a sheet from rows, padding short rows with [`CellValue::Empty`].
    pub fn from_rows(name: &str, mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        Sheet {
            name: name.to_string(),
            rows,
            width,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Empty)
    }

    /// Overwrites a cell. Out-of-range positions are ignored; the sweep never
    /// grows the sheet.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Opens an xlsx workbook.
pub fn open_workbook(path: &Path) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))
}

/// Finds a worksheet by name, or the first worksheet when `name` is `None`.
pub fn find_worksheet<'a>(book: &'a Spreadsheet, name: Option<&str>) -> Result<&'a Worksheet> {
    let sheets = book.get_sheet_collection();
    let found = match name {
        Some(name) => sheets.iter().find(|ws| ws.get_name() == name),
        None => sheets.first(),
    };
    found.ok_or_else(|| anyhow!("worksheet '{}' not found", name.unwrap_or("<first>")))
}

/// Reads a worksheet into a [`Sheet`].
pub fn read_sheet(book: &Spreadsheet, name: Option<&str>) -> Result<Sheet> {
    let ws = find_worksheet(book, name)?;
    let (max_col, max_row) = ws.get_highest_column_and_row();
    debug!(sheet = ws.get_name(), max_col, max_row, "Reading worksheet");

    let mut rows = Vec::with_capacity(max_row as usize);
    for row in 1..=max_row {
        let mut values = Vec::with_capacity(max_col as usize);
        for col in 1..=max_col {
            let value = ws.get_cell((col, row)).map(read_cell).unwrap_or(CellValue::Empty);
            values.push(value);
        }
        rows.push(values);
    }

    Ok(Sheet::from_rows(ws.get_name(), rows))
}

fn read_cell(cell: &Cell) -> CellValue {
    let raw = cell.get_value();
    match cell.get_data_type() {
        "n" => match cell.get_value_number() {
            Some(v) if cell_has_date_format(cell) => {
                excel_serial_to_date(v).map_or(CellValue::Number(v), CellValue::Date)
            }
            Some(v) => CellValue::Number(v),
            None if raw.trim().is_empty() => CellValue::Empty,
            None => CellValue::Text(raw.into_owned()),
        },
        "b" => CellValue::Bool(raw.eq_ignore_ascii_case("true") || raw == "1"),
        _ if raw.is_empty() => CellValue::Empty,
        _ => CellValue::Text(raw.into_owned()),
    }
}

fn cell_has_date_format(cell: &Cell) -> bool {
    cell.get_style()
        .get_number_format()
        .is_some_and(|nf| is_date_format(nf.get_format_code()))
}

/// Returns `true` for number format codes that contain day or year tokens
/// outside of quoted literals and bracketed sections. Built-in date formats
/// resolve to codes such as `mm-dd-yy`, so they match too.
pub fn is_date_format(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    for ch in code.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            'd' | 'D' | 'y' | 'Y' if !in_quotes && !in_brackets => return true,
            _ => {}
        }
    }
    false
}

/// Converts an Excel 1900-system serial number to a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}
