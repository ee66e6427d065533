//! Competition leaderboards loaded from a directory of CSV files.
//!
//! Each `<competition>.csv` must have `Rank` and `Score` columns. Rows whose
//! rank or score does not coerce to a number are dropped, and a file with no
//! surviving rows is skipped with a warning.

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const RANK_COLUMN: &str = "Rank";
pub const SCORE_COLUMN: &str = "Score";

/// Number of best-ranked and worst-ranked rows compared by [`infer_higher_is_better`].
pub const DIRECTION_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: f64,
    pub score: f64,
}

/// One competition's leaderboard, sorted by rank and immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub competition: String,
    entries: Vec<LeaderboardEntry>,
    scores: Vec<f64>,
    higher_is_better: bool,
}

impl Leaderboard {
    /// Sorts `entries` by rank (stable, so tied ranks keep file order) and
    /// infers the score direction once.
    pub fn new(competition: &str, mut entries: Vec<LeaderboardEntry>) -> Self {
        entries.sort_by(|a, b| a.rank.total_cmp(&b.rank));
        let higher_is_better = infer_higher_is_better(&entries);
        let scores = entries.iter().map(|e| e.score).collect();
        Self {
            competition: competition.to_string(),
            entries,
            scores,
            higher_is_better,
        }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Scores in rank order.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn total_teams(&self) -> usize {
        self.entries.len()
    }

    pub fn higher_is_better(&self) -> bool {
        self.higher_is_better
    }
}

/// Guesses whether a higher score means a better rank.
///
/// `entries` must already be sorted by rank. Compares the mean score of the
/// first [`DIRECTION_WINDOW`] rows with that of the last ones; the windows
/// overlap on boards shorter than twice the window. An empty board defaults to
/// higher-is-better.
pub fn infer_higher_is_better(entries: &[LeaderboardEntry]) -> bool {
    if entries.is_empty() {
        return true;
    }
    let window = DIRECTION_WINDOW.min(entries.len());
    let top = &entries[..window];
    let bottom = &entries[entries.len() - window..];
    mean_score(top) > mean_score(bottom)
}

fn mean_score(entries: &[LeaderboardEntry]) -> f64 {
    entries.iter().map(|e| e.score).sum::<f64>() / entries.len() as f64
}

fn coerce_number(field: &str) -> Option<f64> {
    let v = field.trim().parse::<f64>().ok()?;
    (!v.is_nan()).then_some(v)
}

/// Parses one leaderboard from CSV text.
///
/// Fails if either required column is missing or no row survives coercion.
pub fn parse_leaderboard<R: Read>(competition: &str, reader: R) -> Result<Leaderboard> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let Some(rank_idx) = find(RANK_COLUMN) else {
        bail!("missing '{RANK_COLUMN}' column");
    };
    let Some(score_idx) = find(SCORE_COLUMN) else {
        bail!("missing '{SCORE_COLUMN}' column");
    };

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let rank = record.get(rank_idx).and_then(coerce_number);
        let score = record.get(score_idx).and_then(coerce_number);
        if let (Some(rank), Some(score)) = (rank, score) {
            entries.push(LeaderboardEntry { rank, score });
        }
    }

    if entries.is_empty() {
        bail!("no rows with a numeric rank and score");
    }

    Ok(Leaderboard::new(competition, entries))
}

/// Loads a single CSV file; the competition id is the file stem.
pub fn load_leaderboard(path: &Path) -> Result<Leaderboard> {
    let competition = competition_id(path)
        .with_context(|| format!("Unusable file name {}", path.display()))?;
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_leaderboard(&competition, file)
}

fn competition_id(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(str::to_string)
}

fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read leaderboard directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Loads every `*.csv` leaderboard in `dir`, keyed by competition id.
///
/// Only an unreadable directory is an error. Bad files are logged and left out.
pub fn load_leaderboards(dir: &Path) -> Result<BTreeMap<String, Leaderboard>> {
    let files = list_csv_files(dir)?;
    info!(count = files.len(), dir = %dir.display(), "Found leaderboard files");

    let mut leaderboards = BTreeMap::new();
    for path in files {
        match load_leaderboard(&path) {
            Ok(board) => {
                info!(
                    competition = %board.competition,
                    total_teams = board.total_teams(),
                    higher_is_better = board.higher_is_better(),
                    "Loaded leaderboard"
                );
                leaderboards.insert(board.competition.clone(), board);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping leaderboard");
            }
        }
    }

    info!(loaded = leaderboards.len(), "Leaderboards ready");
    Ok(leaderboards)
}
