//! Score cell parser.
//!
//! Turns whatever a model wrote into a results cell into at most one number.

use crate::sheet::CellValue;

/// Cell texts that mean "no score", compared case-insensitively after trimming.
pub const NULL_SENTINELS: &[&str] = &["", "n/a", "na", "null", "none"];

/// Prefixes that mark a cell as a link (submission pages and the like).
pub const URL_PREFIXES: &[&str] = &["http://", "https://", "www."];

/// Returns `true` if `text` looks like a URL.
pub fn is_url(text: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
}

/// Parses a raw results cell into a finite score.
///
/// Numbers pass through. Text is trimmed; URLs and null sentinels give `None`,
/// and when the text holds a comma only the segment before the first comma is
/// parsed ("0.85, 0.90" and "0.85, explanation" both give `0.85`).
pub fn parse_score_value(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(v) => v.is_finite().then_some(*v),
        other => parse_score_text(&other.to_text()),
    }
}

/// Text half of [`parse_score_value`].
pub fn parse_score_text(raw: &str) -> Option<f64> {
    let text = raw.trim();

    if is_url(text) {
        return None;
    }

    let lowered = text.to_lowercase();
    if NULL_SENTINELS.contains(&lowered.as_str()) {
        return None;
    }

    let candidate = match text.split_once(',') {
        Some((first, _)) => first.trim(),
        None => text,
    };

    candidate.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sentinels_are_not_scores() {
        for raw in ["", "   ", "N/A", " na ", "NULL", "None", "nOnE", "n/a"] {
            assert_eq!(parse_score_text(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn test_urls_are_not_scores() {
        assert_eq!(parse_score_text("https://example.com/run/17"), None);
        assert_eq!(parse_score_text("http://kaggle.com/x"), None);
        assert_eq!(parse_score_text("  www.example.com"), None);
    }

    #[test]
    fn test_comma_keeps_first_segment() {
        assert_eq!(parse_score_text("0.85, ignore this"), Some(0.85));
        assert_eq!(parse_score_text("0.85,0.90"), Some(0.85));
        assert_eq!(parse_score_text("oops, 0.85"), None);
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_score_text("0.85"), Some(0.85));
        assert_eq!(parse_score_text(" 12 "), Some(12.0));
        assert_eq!(parse_score_text("-3.5e2"), Some(-350.0));
        assert_eq!(parse_score_text("abc"), None);
    }

    #[test]
    fn test_non_finite_text_is_rejected() {
        assert_eq!(parse_score_text("inf"), None);
        assert_eq!(parse_score_text("NaN"), None);
    }

    #[test]
    fn test_cell_shapes() {
        assert_eq!(parse_score_value(&CellValue::Empty), None);
        assert_eq!(parse_score_value(&CellValue::Number(42.0)), Some(42.0));
        assert_eq!(parse_score_value(&CellValue::Number(f64::NAN)), None);
        assert_eq!(
            parse_score_value(&CellValue::Text("0.5, 0.7".to_string())),
            Some(0.5)
        );
        assert_eq!(parse_score_value(&CellValue::Bool(true)), None);
    }
}
