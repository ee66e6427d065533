//! Direction-corrected percentile of a score against a leaderboard.

use crate::leaderboard::Leaderboard;

pub const MIN_PERCENTILE: u8 = 1;
pub const MAX_PERCENTILE: u8 = 100;

/// Rank-kind percentile of `score` within `scores`, in `[0, 100]`.
///
/// Averages the "strictly below" and "at or below" percentages, counting a
/// tie once at full weight. Returns `None` for an empty population.
pub fn percentile_of_score(scores: &[f64], score: f64) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let n = scores.len();
    let left = scores.iter().filter(|&&s| s < score).count();
    let right = scores.iter().filter(|&&s| s <= score).count();
    let plus1 = usize::from(left < right);
    Some((left + right + plus1) as f64 * (50.0 / n as f64))
}

/// Percentile of `score` on a board with the given direction, clamped to
/// `[1, 100]`.
///
/// Higher-is-better boards report `P - 1` (floored at zero), lower-is-better
/// boards report `100 - P`, where `P` is [`percentile_of_score`]. Halves round
/// to even. A score worse than the whole board still reports 1.
pub fn percentile_for(scores: &[f64], score: f64, higher_is_better: bool) -> Option<u8> {
    if !score.is_finite() {
        return None;
    }
    let p = percentile_of_score(scores, score)?;
    let raw = if higher_is_better {
        (p - 1.0).max(0.0)
    } else {
        100.0 - p
    };
    let rounded = raw.round_ties_even();
    Some(rounded.clamp(MIN_PERCENTILE as f64, MAX_PERCENTILE as f64) as u8)
}

/// [`percentile_for`] against a loaded leaderboard.
pub fn calculate_percentile(score: f64, board: &Leaderboard) -> Option<u8> {
    percentile_for(board.scores(), score, board.higher_is_better())
}
