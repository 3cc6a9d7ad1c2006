use smallvec::SmallVec;

use super::handle::NodeId;

#[cfg(test)]
pub(crate) const ORDER: usize = 16;
#[cfg(not(test))]
pub(crate) const ORDER: usize = 128;

pub(crate) const MAX_CHILDREN: usize = ORDER;
pub(crate) const MIN_CHILDREN: usize = ORDER.div_ceil(2);
pub(crate) const MAX_ITEMS: usize = MAX_CHILDREN - 1;
pub(crate) const MIN_BRANCH_SEPARATORS: usize = MIN_CHILDREN - 1;
pub(crate) const MIN_LEAF_ITEMS: usize = MAX_ITEMS.div_ceil(2);

// One spare slot so a node may overflow by one before it is split.
type Items<T> = SmallVec<[T; MAX_ITEMS + 1]>;
type Children = SmallVec<[NodeId; MAX_CHILDREN + 1]>;
type ChildLens = SmallVec<[usize; MAX_CHILDREN + 1]>;

#[allow(clippy::large_enum_variant)]
pub(crate) enum Node<T> {
    Branch(Branch<T>),
    Leaf(Leaf<T>),
}

// `separators[i]` is an upper bound for every item below `children[i]` and
// a strict lower bound for every item below `children[i + 1]`. The last
// child has no separator.
pub(crate) struct Branch<T> {
    len: usize,
    separators: Items<T>,
    children: Children,
    child_lens: ChildLens,
}

pub(crate) struct Leaf<T> {
    next: Option<NodeId>,
    items: Items<T>,
}

impl<T> Node<T> {
    /// Number of items stored in the subtree rooted here.
    pub(crate) fn subtree_len(&self) -> usize {
        match self {
            Node::Branch(branch) => branch.len(),
            Node::Leaf(leaf) => leaf.len(),
        }
    }

    /// Whether this node, as a non-root, has dropped below its minimum fill.
    pub(crate) fn is_underfull(&self) -> bool {
        match self {
            Node::Branch(branch) => branch.separators.len() < MIN_BRANCH_SEPARATORS,
            Node::Leaf(leaf) => leaf.items.len() < MIN_LEAF_ITEMS,
        }
    }

    /// Whether this node holds more than the order allows and must split.
    pub(crate) fn is_overfull(&self) -> bool {
        match self {
            Node::Branch(branch) => branch.separators.len() > MAX_ITEMS,
            Node::Leaf(leaf) => leaf.items.len() > MAX_ITEMS,
        }
    }

    /// Whether a sibling may take one entry from this node and leave it at
    /// or above its minimum fill.
    pub(crate) fn can_lend(&self) -> bool {
        match self {
            Node::Branch(branch) => branch.separators.len() > MIN_BRANCH_SEPARATORS,
            Node::Leaf(leaf) => leaf.items.len() > MIN_LEAF_ITEMS,
        }
    }

    pub(crate) fn as_branch(&self) -> &Branch<T> {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    pub(crate) fn as_branch_mut(&mut self) -> &mut Branch<T> {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    pub(crate) fn as_leaf(&self) -> &Leaf<T> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut Leaf<T> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }
}

impl<T> Branch<T> {
    /// Creates a branch over two children split by `separator`.
    pub(crate) fn with_children(left: NodeId, left_len: usize, separator: T, right: NodeId, right_len: usize) -> Self {
        let mut branch = Self {
            len: 0,
            separators: SmallVec::new(),
            children: SmallVec::new(),
            child_lens: SmallVec::new(),
        };
        branch.children.push(left);
        branch.child_lens.push(left_len);
        branch.push_back(separator, right, right_len);
        branch
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> NodeId {
        self.children[index]
    }

    #[inline]
    pub(crate) fn child_len(&self, index: usize) -> usize {
        self.child_lens[index]
    }

    pub(crate) fn child_lens(&self) -> &[usize] {
        &self.child_lens
    }

    #[inline]
    pub(crate) fn separator(&self, index: usize) -> &T {
        &self.separators[index]
    }

    #[cfg(test)]
    pub(crate) fn separators(&self) -> &[T] {
        &self.separators
    }

    pub(crate) fn set_separator(&mut self, index: usize, separator: T) {
        self.separators[index] = separator;
    }

    /// Records the subtree length of one child and refreshes the total.
    pub(crate) fn set_child_len(&mut self, index: usize, len: usize) {
        self.len = self.len - self.child_lens[index] + len;
        self.child_lens[index] = len;
    }

    /// Index of the child whose subtree could hold `target`.
    #[inline]
    pub(crate) fn route(&self, target: &T) -> usize
    where
        T: Ord,
    {
        match self.separators.binary_search(target) {
            Ok(index) | Err(index) => index,
        }
    }

    /// Inserts `child` directly after `children[index]`, bounded on the left
    /// by `separator`.
    pub(crate) fn insert_after(&mut self, index: usize, separator: T, child: NodeId, child_len: usize) {
        self.separators.insert(index, separator);
        self.children.insert(index + 1, child);
        self.child_lens.insert(index + 1, child_len);
        self.len += child_len;
    }

    /// Removes `children[index + 1]` together with the separator in front of it.
    pub(crate) fn remove_after(&mut self, index: usize) -> (T, NodeId) {
        let separator = self.separators.remove(index);
        let child = self.children.remove(index + 1);
        self.len -= self.child_lens.remove(index + 1);
        (separator, child)
    }

    pub(crate) fn push_back(&mut self, separator: T, child: NodeId, child_len: usize) {
        self.separators.push(separator);
        self.children.push(child);
        self.child_lens.push(child_len);
        self.len += child_len;
    }

    pub(crate) fn push_front(&mut self, child: NodeId, child_len: usize, separator: T) {
        self.separators.insert(0, separator);
        self.children.insert(0, child);
        self.child_lens.insert(0, child_len);
        self.len += child_len;
    }

    /// Removes the last child and the separator bounding its left sibling.
    pub(crate) fn pop_back(&mut self) -> (T, NodeId, usize) {
        let separator = self.separators.pop().expect("branch has no separators");
        let child = self.children.pop().expect("branch has no children");
        let child_len = self.child_lens.pop().expect("branch has no children");
        self.len -= child_len;
        (separator, child, child_len)
    }

    /// Removes the first child and the separator bounding it.
    pub(crate) fn pop_front(&mut self) -> (T, NodeId, usize) {
        let separator = self.separators.remove(0);
        let child = self.children.remove(0);
        let child_len = self.child_lens.remove(0);
        self.len -= child_len;
        (separator, child, child_len)
    }

    /// Moves the upper half of the children into a new branch and returns
    /// it with the separator that now divides the two halves.
    pub(crate) fn split(&mut self) -> (T, Branch<T>) {
        let mid = self.separators.len() / 2;
        let separators: Items<T> = self.separators.drain(mid + 1..).collect();
        let children: Children = self.children.drain(mid + 1..).collect();
        let child_lens: ChildLens = self.child_lens.drain(mid + 1..).collect();
        let median = self.separators.pop().expect("split of an empty branch");

        let right_len: usize = child_lens.iter().sum();
        self.len -= right_len;
        let right = Branch {
            len: right_len,
            separators,
            children,
            child_lens,
        };
        (median, right)
    }

    /// Appends every child of `right`, joined by `separator`.
    pub(crate) fn absorb(&mut self, separator: T, mut right: Branch<T>) {
        self.separators.push(separator);
        self.separators.append(&mut right.separators);
        self.children.append(&mut right.children);
        self.child_lens.append(&mut right.child_lens);
        self.len += right.len;
    }
}

impl<T> Leaf<T> {
    pub(crate) fn new() -> Self {
        Self {
            next: None,
            items: SmallVec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<NodeId>) {
        self.next = next;
    }

    pub(crate) fn items(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// `Ok` with the position of `target`, or `Err` with where it would go.
    /// Either way the index equals the number of items less than `target`.
    #[inline]
    pub(crate) fn search(&self, target: &T) -> Result<usize, usize>
    where
        T: Ord,
    {
        self.items.binary_search(target)
    }

    pub(crate) fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item);
    }

    pub(crate) fn remove(&mut self, index: usize) -> T {
        self.items.remove(index)
    }

    pub(crate) fn push_back(&mut self, item: T) {
        self.items.push(item);
    }

    pub(crate) fn push_front(&mut self, item: T) {
        self.items.insert(0, item);
    }

    pub(crate) fn pop_back(&mut self) -> T {
        self.items.pop().expect("leaf is empty")
    }

    pub(crate) fn pop_front(&mut self) -> T {
        self.items.remove(0)
    }

    /// Moves the upper half into a new leaf. The returned separator is the
    /// largest item left behind. Sibling links are the caller's job.
    pub(crate) fn split(&mut self) -> (T, Leaf<T>)
    where
        T: Clone,
    {
        let mid = self.items.len() / 2;
        let right = Leaf {
            next: None,
            items: self.items.drain(mid..).collect(),
        };
        let separator = self.items.last().expect("split of an empty leaf").clone();
        (separator, right)
    }

    /// Appends every item of `right` and takes over its successor link.
    pub(crate) fn absorb(&mut self, mut right: Leaf<T>) {
        self.items.append(&mut right.items);
        self.next = right.next;
    }
}
