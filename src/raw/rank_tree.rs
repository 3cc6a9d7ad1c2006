use core::iter::FusedIterator;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::NodeId;
use super::node::{Branch, Leaf, MAX_ITEMS, Node};

/// An ordered set of distinct items, stored as a B+tree whose branches record
/// the length of every child subtree. Positions are zero-based and follow
/// ascending `Ord` order.
pub(crate) struct RankTree<T> {
    nodes: Arena<Node<T>>,
    root: Option<NodeId>,
    len: usize,
}

/// One level of a root-to-leaf descent.
struct Step {
    node: NodeId,
    child: usize,
}

type Path = SmallVec<[Step; 16]>;

impl<T> RankTree<T> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity.div_ceil(MAX_ITEMS)),
            root: None,
            len: 0,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Returns the item at `position`, if the tree is that long.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub(crate) fn nth(&self, position: usize) -> Option<&T> {
        let (leaf, index) = self.locate(position)?;
        self.nodes.get(leaf).as_leaf().items().get(index)
    }

    /// Iterates in order, starting at `position`.
    ///
    /// # Complexity
    ///
    /// O(log n) to start, then amortized O(1) per item.
    pub(crate) fn iter_from(&self, position: usize) -> Iter<'_, T> {
        match self.locate(position) {
            Some((leaf, index)) => Iter {
                nodes: &self.nodes,
                leaf: Some(leaf),
                index,
                remaining: self.len - position,
            },
            None => Iter {
                nodes: &self.nodes,
                leaf: None,
                index: 0,
                remaining: 0,
            },
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        self.iter_from(0)
    }

    /// Finds the leaf and in-leaf index holding `position`.
    fn locate(&self, mut position: usize) -> Option<(NodeId, usize)> {
        if position >= self.len {
            return None;
        }

        let mut current = self.root?;
        loop {
            match self.nodes.get(current) {
                Node::Branch(branch) => {
                    let mut child = 0;
                    while position >= branch.child_len(child) {
                        position -= branch.child_len(child);
                        child += 1;
                    }
                    current = branch.child(child);
                }
                Node::Leaf(_) => return Some((current, position)),
            }
        }
    }
}

impl<T: Ord + Clone> RankTree<T> {
    #[cfg(test)]
    pub(crate) fn contains(&self, item: &T) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let (leaf, _) = self.descend(root, item);
        self.nodes.get(leaf).as_leaf().search(item).is_ok()
    }

    /// Counts the items strictly less than `target`. When `target` is present
    /// this is its position.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub(crate) fn count_below(&self, target: &T) -> usize {
        let Some(mut current) = self.root else {
            return 0;
        };

        let mut below = 0;
        loop {
            match self.nodes.get(current) {
                Node::Branch(branch) => {
                    let child = branch.route(target);
                    below += branch.child_lens()[..child].iter().sum::<usize>();
                    current = branch.child(child);
                }
                Node::Leaf(leaf) => {
                    let (Ok(index) | Err(index)) = leaf.search(target);
                    return below + index;
                }
            }
        }
    }

    /// Adds `item`, returning `false` if an equal item is already present.
    pub(crate) fn insert(&mut self, item: T) -> bool {
        let Some(root) = self.root else {
            let mut leaf = Leaf::new();
            leaf.push_back(item);
            self.root = Some(self.nodes.insert(Node::Leaf(leaf)));
            self.len = 1;
            return true;
        };

        let (leaf_id, mut path) = self.descend(root, &item);
        let leaf = self.nodes.get_mut(leaf_id).as_leaf_mut();
        let Err(index) = leaf.search(&item) else {
            return false;
        };
        leaf.insert(index, item);
        self.len += 1;

        // Walk back up, splitting whatever overflowed and recording the new
        // subtree lengths in each parent.
        let mut child = leaf_id;
        let mut split = self.split_if_overfull(child);
        while let Some(step) = path.pop() {
            let child_len = self.nodes.get(child).subtree_len();
            let promoted = split.take().map(|(separator, right)| (separator, right, self.nodes.get(right).subtree_len()));

            let parent = self.nodes.get_mut(step.node).as_branch_mut();
            parent.set_child_len(step.child, child_len);
            if let Some((separator, right, right_len)) = promoted {
                parent.insert_after(step.child, separator, right, right_len);
            }

            child = step.node;
            split = self.split_if_overfull(child);
        }

        if let Some((separator, right)) = split {
            let left_len = self.nodes.get(child).subtree_len();
            let right_len = self.nodes.get(right).subtree_len();
            let root = Branch::with_children(child, left_len, separator, right, right_len);
            self.root = Some(self.nodes.insert(Node::Branch(root)));
        }
        true
    }

    /// Removes `item`, returning `false` if it was not present.
    pub(crate) fn remove(&mut self, item: &T) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let (leaf_id, mut path) = self.descend(root, item);
        let leaf = self.nodes.get_mut(leaf_id).as_leaf_mut();
        let Ok(index) = leaf.search(item) else {
            return false;
        };
        leaf.remove(index);
        self.len -= 1;

        if self.len == 0 {
            self.clear();
            return true;
        }

        // Separators may now be larger than the true maximum of their child.
        // They still partition the items, so they are left alone.
        let mut child = leaf_id;
        while let Some(step) = path.pop() {
            if self.nodes.get(child).is_underfull() {
                self.rebalance(step.node, step.child);
            } else {
                self.refresh_child_lens(step.node, step.child, 1);
            }
            child = step.node;
        }

        self.collapse_root();
        true
    }

    fn descend(&self, root: NodeId, target: &T) -> (NodeId, Path) {
        let mut path = Path::new();
        let mut current = root;
        while let Node::Branch(branch) = self.nodes.get(current) {
            let child = branch.route(target);
            path.push(Step { node: current, child });
            current = branch.child(child);
        }
        (current, path)
    }

    /// Splits the node in two if it overflowed, returning the separator and
    /// the new right-hand sibling.
    fn split_if_overfull(&mut self, id: NodeId) -> Option<(T, NodeId)> {
        if !self.nodes.get(id).is_overfull() {
            return None;
        }

        let (separator, right) = match self.nodes.get_mut(id) {
            Node::Leaf(leaf) => {
                let (separator, mut right) = leaf.split();
                right.set_next(leaf.next());
                (separator, Node::Leaf(right))
            }
            Node::Branch(branch) => {
                let (median, right) = branch.split();
                (median, Node::Branch(right))
            }
        };

        let is_leaf = matches!(right, Node::Leaf(_));
        let right = self.nodes.insert(right);
        if is_leaf {
            self.nodes.get_mut(id).as_leaf_mut().set_next(Some(right));
        }
        Some((separator, right))
    }

    /// Restores the minimum fill of `children[index]` by borrowing from a
    /// sibling, or merging with one when neither can spare an entry.
    fn rebalance(&mut self, parent: NodeId, index: usize) {
        let branch = self.nodes.get(parent).as_branch();
        let left = index.checked_sub(1).map(|i| branch.child(i));
        let right = (index + 1 < branch.child_count()).then(|| branch.child(index + 1));

        if let Some(left) = left
            && self.nodes.get(left).can_lend()
        {
            self.shift_right(parent, index - 1);
        } else if let Some(right) = right
            && self.nodes.get(right).can_lend()
        {
            self.shift_left(parent, index);
        } else if left.is_some() {
            self.merge(parent, index - 1);
        } else {
            self.merge(parent, index);
        }
    }

    /// Moves the last entry of `children[left]` to the front of `children[left + 1]`.
    fn shift_right(&mut self, parent: NodeId, left: usize) {
        let branch = self.nodes.get(parent).as_branch();
        let (left_id, right_id) = (branch.child(left), branch.child(left + 1));

        let separator = if let Node::Leaf(lender) = self.nodes.get_mut(left_id) {
            let item = lender.pop_back();
            let separator = lender.last().expect("lending leaf keeps its minimum").clone();
            self.nodes.get_mut(right_id).as_leaf_mut().push_front(item);
            separator
        } else {
            let bound = self.nodes.get(parent).as_branch().separator(left).clone();
            let (separator, child, child_len) = self.nodes.get_mut(left_id).as_branch_mut().pop_back();
            self.nodes.get_mut(right_id).as_branch_mut().push_front(child, child_len, bound);
            separator
        };

        self.nodes.get_mut(parent).as_branch_mut().set_separator(left, separator);
        self.refresh_child_lens(parent, left, 2);
    }

    /// Moves the first entry of `children[left + 1]` to the back of `children[left]`.
    fn shift_left(&mut self, parent: NodeId, left: usize) {
        let branch = self.nodes.get(parent).as_branch();
        let (left_id, right_id) = (branch.child(left), branch.child(left + 1));

        let separator = if let Node::Leaf(lender) = self.nodes.get_mut(right_id) {
            let item = lender.pop_front();
            let separator = item.clone();
            self.nodes.get_mut(left_id).as_leaf_mut().push_back(item);
            separator
        } else {
            let bound = self.nodes.get(parent).as_branch().separator(left).clone();
            let (separator, child, child_len) = self.nodes.get_mut(right_id).as_branch_mut().pop_front();
            self.nodes.get_mut(left_id).as_branch_mut().push_back(bound, child, child_len);
            separator
        };

        self.nodes.get_mut(parent).as_branch_mut().set_separator(left, separator);
        self.refresh_child_lens(parent, left, 2);
    }

    /// Folds `children[left + 1]` into `children[left]` and drops it from the parent.
    fn merge(&mut self, parent: NodeId, left: usize) {
        let (separator, right_id) = self.nodes.get_mut(parent).as_branch_mut().remove_after(left);
        let left_id = self.nodes.get(parent).as_branch().child(left);

        match self.nodes.remove(right_id) {
            Node::Leaf(right) => self.nodes.get_mut(left_id).as_leaf_mut().absorb(right),
            Node::Branch(right) => self.nodes.get_mut(left_id).as_branch_mut().absorb(separator, right),
        }

        self.refresh_child_lens(parent, left, 1);
    }

    fn refresh_child_lens(&mut self, parent: NodeId, start: usize, count: usize) {
        for index in start..start + count {
            let child = self.nodes.get(parent).as_branch().child(index);
            let len = self.nodes.get(child).subtree_len();
            self.nodes.get_mut(parent).as_branch_mut().set_child_len(index, len);
        }
    }

    /// Replaces a branch root that is down to one child with that child.
    fn collapse_root(&mut self) {
        while let Some(root) = self.root
            && let Node::Branch(branch) = self.nodes.get(root)
            && branch.child_count() == 1
        {
            let only = branch.child(0);
            self.nodes.remove(root);
            self.root = Some(only);
        }
    }
}

/// In-order iterator over a [`RankTree`], following the leaf chain.
pub(crate) struct Iter<'a, T> {
    nodes: &'a Arena<Node<T>>,
    leaf: Option<NodeId>,
    index: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            let leaf = self.nodes.get(self.leaf?).as_leaf();
            if let Some(item) = leaf.items().get(self.index) {
                self.index += 1;
                self.remaining -= 1;
                return Some(item);
            }
            self.leaf = leaf.next();
            self.index = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
