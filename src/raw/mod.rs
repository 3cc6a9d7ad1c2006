mod arena;
mod handle;
mod node;
mod rank_tree;

pub(crate) use rank_tree::RankTree;
