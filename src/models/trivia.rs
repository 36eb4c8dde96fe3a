//! Trivia game API models.

use serde::{Deserialize, Serialize};

/// A trivia question with its answer options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriviaQuestion {
    pub id: u64,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer
    pub answer: usize,
}

/// One row of the public leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub played_at: String,
}
