//! The ordered index behind a leaderboard.
//!
//! An [`OrderedIndex`] maps player ids to [`CombinedKey`]s and keeps the
//! players sorted by key, largest first. Position 0 is the leader.
//!
//! [`TreeIndex`] is the in-memory implementation. Other implementations can
//! put the same contract in front of an external sorted-set store; such an
//! adapter reports an unreachable store, or a call that ran out of time, as
//! [`LeaderboardError::Unavailable`](crate::LeaderboardError::Unavailable).

use crate::encoder::CombinedKey;
use crate::error::Result;

mod tree;

pub use tree::TreeIndex;

/// A player id and the key it is ranked by.
pub type IndexEntry = (String, CombinedKey);

/// Player ids kept in descending [`CombinedKey`] order.
///
/// Players holding the exact same key are ordered by id, ascending, so the
/// order is total and stable between calls.
///
/// Methods take `&mut self` to mutate; callers sharing an index across
/// threads wrap it in a lock, as [`RankEngine`](crate::RankEngine) does.
///
/// # Errors
///
/// Any method may fail with
/// [`LeaderboardError::Unavailable`](crate::LeaderboardError::Unavailable)
/// when the store behind the index cannot answer. A failed call must leave
/// the index unchanged.
pub trait OrderedIndex {
    /// Sets the key of `player`, adding the player if absent.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the store cannot answer.
    fn upsert(&mut self, player: &str, key: CombinedKey) -> Result<()>;

    /// The current key of `player`.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::NotFound`](crate::LeaderboardError::NotFound) if
    /// the player is absent, or `Unavailable` as for every method.
    fn lookup(&self, player: &str) -> Result<CombinedKey>;

    /// Zero-based position of `player`: how many players are ordered ahead.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::NotFound`](crate::LeaderboardError::NotFound) if
    /// the player is absent, or `Unavailable` as for every method.
    fn position_of(&self, player: &str) -> Result<usize>;

    /// How many players hold a key strictly greater than `key`.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the store cannot answer.
    fn count_greater(&self, key: CombinedKey) -> Result<usize>;

    /// Players at positions `start..=end`, in order. Clipped to the
    /// population; empty if `start > end` or `start` is past the last player.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the store cannot answer.
    fn range_by_position(&self, start: usize, end: usize) -> Result<Vec<IndexEntry>>;

    /// Deletes `player`, returning whether it was present.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the store cannot answer.
    fn remove(&mut self, player: &str) -> Result<bool>;

    /// Number of players.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the store cannot answer.
    fn len(&self) -> Result<usize>;

    /// Whether the index holds no players.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the store cannot answer.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
