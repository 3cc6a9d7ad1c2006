//! Error types for leaderboard operations.

use thiserror::Error;

/// Every way a leaderboard operation can fail.
///
/// Operations that fail leave the leaderboard exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    /// The player has never been scored (or was removed).
    #[error("player {player} not found in leaderboard")]
    NotFound { player: String },

    /// An argument is outside the accepted policy: an empty player id, a
    /// timestamp outside the encodable range, a delta that would take a
    /// score below zero, or an out-of-range configuration value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backing index could not answer, including a call that timed out.
    #[error("leaderboard index unavailable: {0}")]
    Unavailable(String),

    /// The score cannot be encoded without losing exactness.
    #[error("score {score} exceeds the maximum encodable score {max}")]
    PrecisionExceeded { score: u64, max: u64 },
}

impl LeaderboardError {
    pub(crate) fn not_found(player: &str) -> Self {
        Self::NotFound {
            player: player.to_owned(),
        }
    }
}

/// Result type alias for leaderboard operations.
pub type Result<T> = std::result::Result<T, LeaderboardError>;
