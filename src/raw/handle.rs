use core::num::NonZero;

#[cfg(test)]
type RawNodeId = u16;
#[cfg(not(test))]
type RawNodeId = u32;

/// Index of a node slot in an [`Arena`](super::arena::Arena), stored off-by-one
/// so that `Option<NodeId>` costs nothing extra.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct NodeId(NonZero<RawNodeId>);

impl NodeId {
    pub(crate) const MAX: usize = (RawNodeId::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_slot(slot: usize) -> Self {
        assert!(slot <= Self::MAX, "`NodeId::from_slot()` - `slot` > `NodeId::MAX`!");
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((slot + 1) as RawNodeId) {
            Some(id) => Self(id),
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(NodeId, Option<NodeId>);
    assert_eq_size!(NodeId, RawNodeId);

    #[test]
    #[should_panic(expected = "`NodeId::from_slot()` - `slot` > `NodeId::MAX`!")]
    fn slot_past_max_panics() {
        let _ = NodeId::from_slot(NodeId::MAX + 1);
    }

    proptest! {
        #[test]
        fn slot_survives_conversion(slot in 0..=NodeId::MAX) {
            prop_assert_eq!(NodeId::from_slot(slot).slot(), slot);
        }
    }
}
