//! Combined-key encoding of `(score, timestamp)`.
//!
//! A player's standing is the single integer
//!
//! ```text
//! key = score * MULTIPLIER + (MAX_TIMESTAMP - timestamp)
//! ```
//!
//! Sorting keys in descending order sorts players by score descending and,
//! within one score, by timestamp ascending: whoever reached the score first
//! ranks higher. Because `MULTIPLIER > MAX_TIMESTAMP`, the timestamp term
//! never carries into the score term and `key / MULTIPLIER` recovers the
//! score exactly.
//!
//! # Precision
//!
//! Keys are exact unsigned integers, but a backing store may hold fewer exact
//! bits than a `u64` (a store that keeps sort keys as `f64` has 53). The
//! encoder is built for a given precision and rejects any score whose key
//! would not fit:
//!
//! | precision | maximum score |
//! |-----------|---------------|
//! | 64 bits   | 18 446 743    |
//! | 53 bits   | 9 006         |
//!
//! # Example
//!
//! ```
//! use wabi_rank::ScoreEncoder;
//!
//! let encoder = ScoreEncoder::new();
//! let early = encoder.encode(100, 1_700_000_000).unwrap();
//! let late = encoder.encode(100, 1_700_000_050).unwrap();
//! let better = encoder.encode(101, 1_800_000_000).unwrap();
//!
//! assert!(early > late);
//! assert!(better > early);
//! assert_eq!(encoder.decode_score(late), 100);
//! assert_eq!(encoder.decode_timestamp(late), 1_700_000_050);
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LeaderboardError, Result};

/// Weight of one score point in a [`CombinedKey`].
pub const MULTIPLIER: u64 = 1_000_000_000_000;

/// Largest accepted timestamp, in seconds.
pub const MAX_TIMESTAMP: i64 = 999_999_999_999;

/// Fewest exact integer bits a backing store may offer.
pub const MIN_PRECISION_BITS: u32 = 53;

/// Most exact integer bits a [`CombinedKey`] can use.
pub const MAX_PRECISION_BITS: u32 = u64::BITS;

/// A player's score and last-update time merged into one orderable value.
///
/// Larger keys rank higher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedKey(pub u64);

impl CombinedKey {
    /// The key of a player who has no score yet.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CombinedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encodes and decodes [`CombinedKey`]s under a fixed precision limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreEncoder {
    precision: u32,
    max_score: u64,
}

impl Default for ScoreEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreEncoder {
    /// An encoder using the full 64 bits of a [`CombinedKey`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            precision: MAX_PRECISION_BITS,
            max_score: max_score_for(MAX_PRECISION_BITS),
        }
    }

    /// An encoder whose keys all fit in `bits` exact integer bits.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::InvalidInput`] unless `bits` is in
    /// `MIN_PRECISION_BITS..=MAX_PRECISION_BITS`.
    pub fn with_precision(bits: u32) -> Result<Self> {
        if !(MIN_PRECISION_BITS..=MAX_PRECISION_BITS).contains(&bits) {
            return Err(LeaderboardError::InvalidInput(format!(
                "precision must be {MIN_PRECISION_BITS}..={MAX_PRECISION_BITS} bits, got {bits}"
            )));
        }
        Ok(Self {
            precision: bits,
            max_score: max_score_for(bits),
        })
    }

    #[must_use]
    pub const fn precision(&self) -> u32 {
        self.precision
    }

    /// The largest score this encoder accepts.
    #[must_use]
    pub const fn max_score(&self) -> u64 {
        self.max_score
    }

    /// Merges `score` and `timestamp` into one key.
    ///
    /// # Errors
    ///
    /// - [`LeaderboardError::InvalidInput`] if `timestamp` is outside
    ///   `0..=MAX_TIMESTAMP`.
    /// - [`LeaderboardError::PrecisionExceeded`] if `score > max_score()`.
    pub fn encode(&self, score: u64, timestamp: i64) -> Result<CombinedKey> {
        let recency = recency(timestamp)?;
        if score > self.max_score {
            return Err(LeaderboardError::PrecisionExceeded {
                score,
                max: self.max_score,
            });
        }
        Ok(CombinedKey(score * MULTIPLIER + recency))
    }

    /// Recovers the score a key was encoded from.
    #[must_use]
    pub const fn decode_score(&self, key: CombinedKey) -> u64 {
        key.0 / MULTIPLIER
    }

    /// Recovers the timestamp a key was encoded from.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn decode_timestamp(&self, key: CombinedKey) -> i64 {
        MAX_TIMESTAMP - (key.0 % MULTIPLIER) as i64
    }

    /// The largest key any player holding `score` can have.
    ///
    /// A key is strictly greater than `class_ceiling(score)` exactly when it
    /// encodes a higher score. Not limited by the encoder's precision.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn class_ceiling(&self, score: u64) -> CombinedKey {
        CombinedKey(score.saturating_mul(MULTIPLIER).saturating_add(MAX_TIMESTAMP as u64))
    }
}

#[allow(clippy::cast_sign_loss)]
const fn max_score_for(bits: u32) -> u64 {
    let max_key = if bits >= u64::BITS { u64::MAX } else { (1u64 << bits) - 1 };
    (max_key - MAX_TIMESTAMP as u64) / MULTIPLIER
}

#[allow(clippy::cast_sign_loss)]
fn recency(timestamp: i64) -> Result<u64> {
    if (0..=MAX_TIMESTAMP).contains(&timestamp) {
        Ok((MAX_TIMESTAMP - timestamp) as u64)
    } else {
        Err(LeaderboardError::InvalidInput(format!(
            "timestamp {timestamp} is outside 0..={MAX_TIMESTAMP}"
        )))
    }
}
