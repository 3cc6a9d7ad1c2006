//! Leaderboard ranking on an order-statistic B+tree.
//!
//! This crate keeps players ordered by score and answers rank queries in
//! O(log n):
//!
//! - [`update_score`](RankEngine::update_score) - Add a delta to a player's score
//! - [`get_player_rank`](RankEngine::get_player_rank) - Standard rank, ties broken by who got there first
//! - [`get_player_rank_dense`](RankEngine::get_player_rank_dense) - Dense rank, equal scores share a rank
//! - [`get_top_n`](RankEngine::get_top_n) and [`get_top_n_dense`](RankEngine::get_top_n_dense) - The head of the leaderboard
//! - [`get_player_rank_range`](RankEngine::get_player_rank_range) - The players around one player
//!
//! # Example
//!
//! ```
//! use wabi_rank::RankEngine;
//!
//! let leaderboard = RankEngine::in_memory();
//! leaderboard.update_score("Alice", 100, 1_700_000_000).unwrap();
//! leaderboard.update_score("Bob", 85, 1_700_000_010).unwrap();
//! leaderboard.update_score("Carol", 100, 1_700_000_020).unwrap();
//!
//! // Alice reached 100 before Carol did.
//! let top: Vec<_> = leaderboard
//!     .get_top_n(2)
//!     .unwrap()
//!     .into_iter()
//!     .map(|info| info.player_id)
//!     .collect();
//! assert_eq!(top, ["Alice", "Carol"]);
//!
//! assert_eq!(leaderboard.get_player_rank("Bob").unwrap().rank, 3);
//! assert_eq!(leaderboard.get_player_rank_dense("Bob").unwrap().rank, 2);
//! ```
//!
//! # Implementation
//!
//! Each player is stored under a [`CombinedKey`] that packs the score and the
//! time it was reached into one integer (see [`ScoreEncoder`]). The default
//! [`TreeIndex`] keeps those keys in a B+tree (all data in leaves, linked leaf
//! chain) where every internal node tracks the sizes of its subtrees, so the
//! position of any key is found without a full traversal.
//!
//! [`RankEngine`] is generic over [`OrderedIndex`], so the same ranking logic
//! can run over another sorted store.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod encoder;
mod engine;
mod error;
mod index;
mod raw;

pub use config::{ConfigError, LeaderboardConfig};
pub use encoder::{CombinedKey, MAX_PRECISION_BITS, MAX_TIMESTAMP, MIN_PRECISION_BITS, MULTIPLIER, ScoreEncoder};
pub use engine::{RankEngine, RankInfo};
pub use error::{LeaderboardError, Result};
pub use index::{IndexEntry, OrderedIndex, TreeIndex};
