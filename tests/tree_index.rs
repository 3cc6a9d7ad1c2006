use std::cmp::Reverse;
use std::collections::HashMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use wabi_rank::{CombinedKey, IndexEntry, LeaderboardError, OrderedIndex, TreeIndex};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Player ids from a small pool, so updates hit existing players often.
fn player_strategy() -> impl Strategy<Value = String> {
    (0u16..300).prop_map(|n| format!("player-{n}"))
}

/// Keys from a narrow range, so many players tie.
fn key_strategy() -> impl Strategy<Value = CombinedKey> {
    (0u64..64).prop_map(CombinedKey)
}

/// The index as a plain map, answering every query by sorting.
#[derive(Default)]
struct Model {
    keys: HashMap<String, CombinedKey>,
}

impl Model {
    fn sorted(&self) -> Vec<IndexEntry> {
        let mut entries: Vec<_> = self.keys.iter().map(|(player, key)| (player.clone(), *key)).collect();
        entries.sort_by_key(|(player, key)| (Reverse(*key), player.clone()));
        entries
    }

    fn position_of(&self, player: &str) -> Option<usize> {
        self.sorted().iter().position(|(p, _)| p == player)
    }

    fn count_greater(&self, key: CombinedKey) -> usize {
        self.keys.values().filter(|k| **k > key).count()
    }

    fn range(&self, start: usize, end: usize) -> Vec<IndexEntry> {
        if start > end {
            return Vec::new();
        }
        self.sorted().into_iter().skip(start).take(end - start + 1).collect()
    }
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum IndexOp {
    Upsert(String, CombinedKey),
    Remove(String),
    Lookup(String),
    PositionOf(String),
    CountGreater(CombinedKey),
    Range(usize, usize),
}

fn index_op_strategy() -> impl Strategy<Value = IndexOp> {
    prop_oneof![
        6 => (player_strategy(), key_strategy()).prop_map(|(p, k)| IndexOp::Upsert(p, k)),
        2 => player_strategy().prop_map(IndexOp::Remove),
        1 => player_strategy().prop_map(IndexOp::Lookup),
        2 => player_strategy().prop_map(IndexOp::PositionOf),
        1 => key_strategy().prop_map(IndexOp::CountGreater),
        1 => (0usize..320, 0usize..320).prop_map(|(s, e)| IndexOp::Range(s, e)),
    ]
}

// ─── Model comparison ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays random operations on both TreeIndex and the sorting model and
    /// asserts identical results at every step.
    #[test]
    fn index_ops_match_model(ops in proptest::collection::vec(index_op_strategy(), TEST_SIZE)) {
        let mut index = TreeIndex::new();
        let mut model = Model::default();

        for op in &ops {
            match op {
                IndexOp::Upsert(player, key) => {
                    index.upsert(player, *key).unwrap();
                    model.keys.insert(player.clone(), *key);
                }
                IndexOp::Remove(player) => {
                    let removed = index.remove(player).unwrap();
                    prop_assert_eq!(removed, model.keys.remove(player).is_some(), "remove({})", player);
                }
                IndexOp::Lookup(player) => {
                    let found = index.lookup(player).ok();
                    prop_assert_eq!(found, model.keys.get(player).copied(), "lookup({})", player);
                }
                IndexOp::PositionOf(player) => {
                    let found = index.position_of(player).ok();
                    prop_assert_eq!(found, model.position_of(player), "position_of({})", player);
                }
                IndexOp::CountGreater(key) => {
                    let count = index.count_greater(*key).unwrap();
                    prop_assert_eq!(count, model.count_greater(*key), "count_greater({})", key);
                }
                IndexOp::Range(start, end) => {
                    let range = index.range_by_position(*start, *end).unwrap();
                    prop_assert_eq!(range, model.range(*start, *end), "range_by_position({}, {})", start, end);
                }
            }
            prop_assert_eq!(index.len().unwrap(), model.keys.len(), "len mismatch after {:?}", op);
        }

        let ordered: Vec<_> = index.iter().map(|(player, key)| (player.to_owned(), key)).collect();
        prop_assert_eq!(ordered, model.sorted());
    }

    /// Every position maps back to the player found there.
    #[test]
    fn position_of_inverts_range(
        entries in proptest::collection::vec((player_strategy(), key_strategy()), 1..TEST_SIZE)
    ) {
        let mut index = TreeIndex::with_capacity(entries.len());
        for (player, key) in &entries {
            index.upsert(player, *key).unwrap();
        }
        let len = index.len().unwrap();
        for (position, (player, _)) in index.range_by_position(0, len - 1).unwrap().into_iter().enumerate() {
            prop_assert_eq!(index.position_of(&player).unwrap(), position);
        }
    }

    /// `count_greater` of a player's own key counts only players with larger keys,
    /// never tied ones.
    #[test]
    fn count_greater_skips_ties(
        entries in proptest::collection::vec((player_strategy(), key_strategy()), 1..TEST_SIZE)
    ) {
        let mut index = TreeIndex::new();
        for (player, key) in &entries {
            index.upsert(player, *key).unwrap();
        }
        for (player, key) in index.iter() {
            let position = index.position_of(player).unwrap();
            prop_assert!(index.count_greater(key).unwrap() <= position);
        }
    }
}

// ─── Edge cases ──────────────────────────────────────────────────────────────

#[test]
fn missing_player_is_not_found() {
    let index = TreeIndex::new();
    assert_eq!(
        index.position_of("ghost"),
        Err(LeaderboardError::NotFound {
            player: "ghost".to_owned()
        })
    );
    assert!(index.is_empty().unwrap());
    assert_eq!(index.count_greater(CombinedKey::ZERO).unwrap(), 0);
}

#[test]
fn large_population_stays_consistent() {
    let mut index = TreeIndex::new();
    for n in 0..20_000u64 {
        index.upsert(&format!("p{n}"), CombinedKey(n % 1_000)).unwrap();
    }
    for n in (0..20_000u64).step_by(3) {
        assert!(index.remove(&format!("p{n}")).unwrap());
    }
    let len = index.len().unwrap();
    assert_eq!(len, 20_000 - 6_667);

    let all = index.range_by_position(0, len - 1).unwrap();
    assert!(all.windows(2).all(|pair| (Reverse(pair[0].1), &pair[0].0) < (Reverse(pair[1].1), &pair[1].0)));
    assert_eq!(index.count_greater(CombinedKey(998)).unwrap(), all.iter().filter(|(_, k)| k.get() == 999).count());
}
