use core::cmp::Reverse;
use core::fmt;
use std::collections::HashMap;

use super::{IndexEntry, OrderedIndex};
use crate::encoder::CombinedKey;
use crate::error::{LeaderboardError, Result};
use crate::raw::RankTree;

/// Sort entry of the rank tree. Ascending `Standing` order is descending key
/// order, with ties broken by player id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Standing {
    key: Reverse<CombinedKey>,
    player: String,
}

impl Standing {
    fn new(key: CombinedKey, player: &str) -> Self {
        Self {
            key: Reverse(key),
            player: player.to_owned(),
        }
    }

    /// Sorts before every real standing holding `key`, and after every
    /// standing with a greater key.
    fn first_at(key: CombinedKey) -> Self {
        Self {
            key: Reverse(key),
            player: String::new(),
        }
    }

    fn entry(&self) -> IndexEntry {
        (self.player.clone(), self.key.0)
    }
}

/// An in-memory [`OrderedIndex`].
///
/// Keys are found through a hash map and positions through an order-statistic
/// B+tree, so every operation is O(log n) except `range_by_position`, which
/// adds O(k) for the k players returned. It never fails with
/// [`LeaderboardError::Unavailable`].
///
/// # Examples
///
/// ```
/// use wabi_rank::{CombinedKey, OrderedIndex, TreeIndex};
///
/// let mut index = TreeIndex::new();
/// index.upsert("alice", CombinedKey(300)).unwrap();
/// index.upsert("bob", CombinedKey(500)).unwrap();
/// index.upsert("carol", CombinedKey(400)).unwrap();
///
/// assert_eq!(index.position_of("bob").unwrap(), 0);
/// assert_eq!(index.position_of("alice").unwrap(), 2);
/// assert_eq!(index.count_greater(CombinedKey(300)).unwrap(), 2);
///
/// let podium: Vec<_> = index.iter().map(|(player, _)| player).collect();
/// assert_eq!(podium, ["bob", "carol", "alice"]);
/// ```
pub struct TreeIndex {
    keys: HashMap<String, CombinedKey>,
    standings: RankTree<Standing>,
}

impl fmt::Debug for TreeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Default for TreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            standings: RankTree::new(),
        }
    }

    /// Creates an empty index with room for at least `capacity` players.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: HashMap::with_capacity(capacity),
            standings: RankTree::with_capacity(capacity),
        }
    }

    /// Iterates over every player, leader first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, CombinedKey)> + '_ {
        self.standings
            .iter()
            .map(|standing| (standing.player.as_str(), standing.key.0))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.standings.clear();
    }
}

impl OrderedIndex for TreeIndex {
    fn upsert(&mut self, player: &str, key: CombinedKey) -> Result<()> {
        match self.keys.get_mut(player) {
            Some(current) if *current == key => return Ok(()),
            Some(current) => {
                let removed = self.standings.remove(&Standing::new(*current, player));
                debug_assert!(removed, "standing missing for {player}");
                *current = key;
            }
            None => {
                self.keys.insert(player.to_owned(), key);
            }
        }
        self.standings.insert(Standing::new(key, player));
        debug_assert_eq!(self.keys.len(), self.standings.len());
        Ok(())
    }

    fn lookup(&self, player: &str) -> Result<CombinedKey> {
        self.keys
            .get(player)
            .copied()
            .ok_or_else(|| LeaderboardError::not_found(player))
    }

    fn position_of(&self, player: &str) -> Result<usize> {
        let key = self.lookup(player)?;
        Ok(self.standings.count_below(&Standing::new(key, player)))
    }

    fn count_greater(&self, key: CombinedKey) -> Result<usize> {
        Ok(self.standings.count_below(&Standing::first_at(key)))
    }

    fn range_by_position(&self, start: usize, end: usize) -> Result<Vec<IndexEntry>> {
        if start > end {
            return Ok(Vec::new());
        }
        if start == end {
            return Ok(self.standings.nth(start).map(Standing::entry).into_iter().collect());
        }
        Ok(self
            .standings
            .iter_from(start)
            .take((end - start).saturating_add(1))
            .map(Standing::entry)
            .collect())
    }

    fn remove(&mut self, player: &str) -> Result<bool> {
        let Some(key) = self.keys.remove(player) else {
            return Ok(false);
        };
        let removed = self.standings.remove(&Standing::new(key, player));
        debug_assert!(removed, "standing missing for {player}");
        Ok(true)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.keys.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.standings.is_empty())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(pairs: &[(&str, u64)]) -> Vec<IndexEntry> {
        pairs
            .iter()
            .map(|&(player, key)| (player.to_owned(), CombinedKey(key)))
            .collect()
    }

    #[test]
    fn equal_keys_are_ordered_by_player_id() {
        let mut index = TreeIndex::new();
        index.upsert("zed", CombinedKey(10)).unwrap();
        index.upsert("amy", CombinedKey(10)).unwrap();
        index.upsert("max", CombinedKey(11)).unwrap();

        assert_eq!(
            index.range_by_position(0, 2).unwrap(),
            entries(&[("max", 11), ("amy", 10), ("zed", 10)])
        );
        assert_eq!(index.position_of("zed").unwrap(), 2);
        // Ties are not strictly greater than each other.
        assert_eq!(index.count_greater(CombinedKey(10)).unwrap(), 1);
    }

    #[test]
    fn upsert_moves_an_existing_player() {
        let mut index = TreeIndex::with_capacity(4);
        index.upsert("a", CombinedKey(1)).unwrap();
        index.upsert("b", CombinedKey(2)).unwrap();
        assert_eq!(index.position_of("a").unwrap(), 1);

        index.upsert("a", CombinedKey(3)).unwrap();
        assert_eq!(index.position_of("a").unwrap(), 0);
        assert_eq!(index.len().unwrap(), 2);
        assert_eq!(index.lookup("a").unwrap(), CombinedKey(3));

        index.upsert("a", CombinedKey(3)).unwrap();
        assert_eq!(index.len().unwrap(), 2);
    }

    #[test]
    fn empty_player_id_still_counts_correctly() {
        let mut index = TreeIndex::new();
        index.upsert("", CombinedKey(5)).unwrap();
        index.upsert("x", CombinedKey(6)).unwrap();
        assert_eq!(index.count_greater(CombinedKey(5)).unwrap(), 1);
        assert_eq!(index.count_greater(CombinedKey(4)).unwrap(), 2);
        assert_eq!(index.position_of("").unwrap(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let mut index = TreeIndex::new();
        index.upsert("a", CombinedKey(1)).unwrap();
        index.upsert("b", CombinedKey(2)).unwrap();

        assert!(index.remove("a").unwrap());
        assert!(!index.remove("a").unwrap());
        assert!(matches!(index.lookup("a"), Err(LeaderboardError::NotFound { .. })));
        assert_eq!(index.iter().collect::<Vec<_>>(), [("b", CombinedKey(2))]);

        index.clear();
        assert!(index.is_empty().unwrap());
        assert_eq!(index.range_by_position(0, 10).unwrap(), Vec::new());
    }

    #[test]
    fn range_handles_degenerate_bounds() {
        let mut index = TreeIndex::new();
        for (i, player) in ["a", "b", "c"].into_iter().enumerate() {
            index.upsert(player, CombinedKey(i as u64)).unwrap();
        }
        assert_eq!(index.range_by_position(2, 1).unwrap(), Vec::new());
        assert_eq!(index.range_by_position(3, 9).unwrap(), Vec::new());
        assert_eq!(index.range_by_position(1, usize::MAX).unwrap(), entries(&[("b", 1), ("a", 0)]));
        assert_eq!(index.range_by_position(0, 0).unwrap(), entries(&[("c", 2)]));
    }
}
