//! Ranking queries and score updates over an [`OrderedIndex`].

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::LeaderboardConfig;
use crate::encoder::{CombinedKey, ScoreEncoder};
use crate::error::{LeaderboardError, Result};
use crate::index::{IndexEntry, OrderedIndex, TreeIndex};

/// One player's place on the leaderboard.
///
/// Serializes with the field names `playerId`, `score` and `rank`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankInfo {
    pub player_id: String,
    pub score: u64,
    /// 1-based. Standard or dense depending on the query that produced it.
    pub rank: usize,
}

/// A leaderboard: score updates and rank queries over one [`OrderedIndex`].
///
/// Every operation runs under a single lock around the index. Updates take it
/// exclusively for their whole read-modify-write, so concurrent deltas for
/// the same player are never lost. Queries share it, so each sees one
/// consistent snapshot even when it needs several index calls.
///
/// Two ranking schemes are offered:
///
/// - **standard** ranks follow the index order: ties on score are broken by
///   whoever reached the score first, so every rank is distinct.
/// - **dense** ranks ignore timestamps: equal scores share a rank, and the
///   next lower score gets the next rank, without gaps.
///
/// # Examples
///
/// ```
/// use wabi_rank::RankEngine;
///
/// let leaderboard = RankEngine::in_memory();
/// leaderboard.update_score("A", 100, 1).unwrap();
/// leaderboard.update_score("B", 100, 2).unwrap();
/// leaderboard.update_score("C", 90, 3).unwrap();
///
/// assert_eq!(leaderboard.get_player_rank("B").unwrap().rank, 2);
/// assert_eq!(leaderboard.get_player_rank_dense("B").unwrap().rank, 1);
/// assert_eq!(leaderboard.get_player_rank_dense("C").unwrap().rank, 2);
/// ```
#[derive(Debug)]
pub struct RankEngine<I = TreeIndex> {
    index: RwLock<I>,
    encoder: ScoreEncoder,
    config: LeaderboardConfig,
}

impl RankEngine<TreeIndex> {
    /// A leaderboard over an empty [`TreeIndex`] with the default
    /// configuration.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(TreeIndex::new())
    }
}

impl Default for RankEngine<TreeIndex> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<I: OrderedIndex> RankEngine<I> {
    /// A leaderboard over `index` with the default configuration.
    pub fn new(index: I) -> Self {
        Self::assemble(index, LeaderboardConfig::default(), ScoreEncoder::new())
    }

    /// A leaderboard over `index` configured by `config`.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::InvalidInput`] if `config` fails
    /// [`LeaderboardConfig::validate`].
    pub fn with_config(index: I, config: LeaderboardConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|err| LeaderboardError::InvalidInput(err.to_string()))?;
        let encoder = ScoreEncoder::with_precision(config.precision_bits)?;
        Ok(Self::assemble(index, config, encoder))
    }

    fn assemble(index: I, config: LeaderboardConfig, encoder: ScoreEncoder) -> Self {
        info!(
            leaderboard = %config.name,
            precision_bits = encoder.precision(),
            max_score = encoder.max_score(),
            scan_page_size = config.scan_page_size,
            "leaderboard ready"
        );
        Self {
            index: RwLock::new(index),
            encoder,
            config,
        }
    }

    /// The configuration this leaderboard was built with.
    #[must_use]
    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    /// The encoder turning scores into index keys.
    #[must_use]
    pub fn encoder(&self) -> &ScoreEncoder {
        &self.encoder
    }

    /// Consumes the engine, returning its index.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::Unavailable`] if the lock was poisoned.
    pub fn into_index(self) -> Result<I> {
        self.index.into_inner().map_err(|_| poisoned())
    }

    /// Adds `delta` to the score of `player` and records `timestamp` as the
    /// moment the new score was reached. A player seen for the first time
    /// starts from zero.
    ///
    /// Returns the new score and standard rank.
    ///
    /// # Errors
    ///
    /// - [`LeaderboardError::InvalidInput`] if `player` is empty, `timestamp`
    ///   is outside `0..=MAX_TIMESTAMP`, or the new score would be negative.
    /// - [`LeaderboardError::PrecisionExceeded`] if the new score is larger
    ///   than [`ScoreEncoder::max_score`].
    /// - [`LeaderboardError::Unavailable`] if the index fails.
    ///
    /// A failed update changes nothing: every index read happens before the
    /// single write.
    pub fn update_score(&self, player: &str, delta: i64, timestamp: i64) -> Result<RankInfo> {
        let mut index = self.write()?;
        self.apply(&mut *index, player, delta, timestamp).inspect_err(|err| {
            warn!(leaderboard = %self.config.name, player, delta, timestamp, %err, "score update rejected");
        })
    }

    fn apply(&self, index: &mut I, player: &str, delta: i64, timestamp: i64) -> Result<RankInfo> {
        check_player(player)?;
        let current = match index.lookup(player) {
            Ok(key) => Some(key),
            Err(LeaderboardError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        let old_score = self.encoder.decode_score(current.unwrap_or(CombinedKey::ZERO));
        let score = match old_score.checked_add_signed(delta) {
            Some(score) => score,
            None if delta < 0 => {
                return Err(LeaderboardError::InvalidInput(format!(
                    "delta {delta} would take the score of {player} below zero (currently {old_score})"
                )));
            }
            None => {
                return Err(LeaderboardError::PrecisionExceeded {
                    score: u64::MAX,
                    max: self.encoder.max_score(),
                });
            }
        };
        let key = self.encoder.encode(score, timestamp)?;
        let rank = position_after(index, player, current, key)? + 1;
        index.upsert(player, key)?;
        debug!(leaderboard = %self.config.name, player, old_score, score, timestamp, rank, "score updated");
        Ok(RankInfo {
            player_id: player.to_owned(),
            score,
            rank,
        })
    }

    /// The standard rank of `player`.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::NotFound`] if the player has no score.
    pub fn get_player_rank(&self, player: &str) -> Result<RankInfo> {
        let index = self.read()?;
        let key = index.lookup(player)?;
        let position = index.position_of(player)?;
        Ok(RankInfo {
            player_id: player.to_owned(),
            score: self.encoder.decode_score(key),
            rank: position + 1,
        })
    }

    /// The first `n` players with their standard ranks, leader first.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::Unavailable`] if the index fails.
    pub fn get_top_n(&self, n: usize) -> Result<Vec<RankInfo>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let index = self.read()?;
        let entries = index.range_by_position(0, n - 1)?;
        Ok(self.label(entries, 1))
    }

    /// The dense rank of `player`: one more than the number of distinct
    /// scores above theirs.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::NotFound`] if the player has no score.
    pub fn get_player_rank_dense(&self, player: &str) -> Result<RankInfo> {
        let index = self.read()?;
        let score = self.encoder.decode_score(index.lookup(player)?);
        let rank = self.classes_above(&*index, score)? + 1;
        Ok(RankInfo {
            player_id: player.to_owned(),
            score,
            rank,
        })
    }

    /// Counts the distinct scores strictly above `score`, one index lookup
    /// per score class.
    fn classes_above(&self, index: &I, score: u64) -> Result<usize> {
        let mut classes = 0;
        let mut position = 0;
        while let Some((_, key)) = index.range_by_position(position, position)?.pop() {
            let class = self.encoder.decode_score(key);
            if class <= score {
                break;
            }
            classes += 1;
            // Everyone at or above `class` sits before the next class.
            position = index.count_greater(self.encoder.class_ceiling(class - 1))?;
        }
        Ok(classes)
    }

    /// Players in the top `limit` dense ranks, leader first. Every player of
    /// the last included score is returned. `limit == 0` returns everyone.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::Unavailable`] if the index fails.
    pub fn get_top_n_dense(&self, limit: usize) -> Result<Vec<RankInfo>> {
        let index = self.read()?;
        let page = self.config.scan_page_size;
        let mut ranked = Vec::new();
        let mut rank = 0;
        let mut previous = None;
        let mut start = 0usize;
        'scan: loop {
            let entries = index.range_by_position(start, start.saturating_add(page - 1))?;
            trace!(leaderboard = %self.config.name, start, fetched = entries.len(), "dense scan page");
            let fetched = entries.len();
            for (player_id, key) in entries {
                let score = self.encoder.decode_score(key);
                if previous != Some(score) {
                    rank += 1;
                    previous = Some(score);
                }
                if limit != 0 && rank > limit {
                    break 'scan;
                }
                ranked.push(RankInfo { player_id, score, rank });
            }
            if fetched < page {
                break;
            }
            start += page;
        }
        Ok(ranked)
    }

    /// Up to `window` consecutive players around `player`, by standard rank.
    ///
    /// The window starts `window / 2` ranks above the player, or at the
    /// leader if that would go past the top, and is cut short at the bottom
    /// of the leaderboard.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::NotFound`] if the player has no score.
    pub fn get_player_rank_range(&self, player: &str, window: usize) -> Result<Vec<RankInfo>> {
        let index = self.read()?;
        let rank = index.position_of(player)? + 1;
        if window == 0 {
            return Ok(Vec::new());
        }
        let start = rank.saturating_sub(window / 2).max(1);
        let end = start.saturating_add(window - 1);
        let entries = index.range_by_position(start - 1, end - 1)?;
        Ok(self.label(entries, start))
    }

    /// Deletes `player`, returning whether they had a score.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::Unavailable`] if the index fails.
    pub fn remove_player(&self, player: &str) -> Result<bool> {
        let removed = self.write()?.remove(player)?;
        if removed {
            debug!(leaderboard = %self.config.name, player, "player removed");
        }
        Ok(removed)
    }

    /// Number of players holding a score.
    ///
    /// # Errors
    ///
    /// [`LeaderboardError::Unavailable`] if the index fails.
    pub fn player_count(&self) -> Result<usize> {
        self.read()?.len()
    }

    fn label(&self, entries: Vec<IndexEntry>, first_rank: usize) -> Vec<RankInfo> {
        entries
            .into_iter()
            .zip(first_rank..)
            .map(|((player_id, key), rank)| RankInfo {
                player_id,
                score: self.encoder.decode_score(key),
                rank,
            })
            .collect()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, I>> {
        self.index.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, I>> {
        self.index.write().map_err(|_| poisoned())
    }
}

/// The zero-based position `player` takes once stored under `key`, read from
/// the index before the write: players with a greater key, plus players
/// holding exactly `key` with a smaller id, minus `player` itself if its
/// current key is greater.
fn position_after<I: OrderedIndex>(
    index: &I,
    player: &str,
    current: Option<CombinedKey>,
    key: CombinedKey,
) -> Result<usize> {
    let above = index.count_greater(key)?;
    let at_or_above = match key.get().checked_sub(1) {
        Some(below) => index.count_greater(CombinedKey(below))?,
        None => index.len()?,
    };
    let tied_ahead = if at_or_above > above {
        index
            .range_by_position(above, at_or_above - 1)?
            .iter()
            .filter(|(other, _)| other.as_str() < player)
            .count()
    } else {
        0
    };
    let moving_down = usize::from(current.is_some_and(|old| old > key));
    Ok(above - moving_down + tied_ahead)
}

fn poisoned() -> LeaderboardError {
    LeaderboardError::Unavailable("index lock poisoned by a panicked writer".to_owned())
}

fn check_player(player: &str) -> Result<()> {
    if player.is_empty() {
        return Err(LeaderboardError::InvalidInput("player id must not be empty".to_owned()));
    }
    Ok(())
}
