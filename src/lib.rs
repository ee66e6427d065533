pub mod analyzers;
pub mod layout;
pub mod leaderboard;
pub mod normalizer;
pub mod output;
pub mod parser;
pub mod percentile;
pub mod sheet;
