use super::handle::NodeId;

/// Slot storage for tree nodes. Freed slots are recycled before the backing
/// vector grows.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    vacant: Vec<NodeId>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            vacant: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.vacant.len())
    }

    pub(crate) fn insert(&mut self, element: T) -> NodeId {
        if let Some(id) = self.vacant.pop() {
            self.slots[id.slot()] = Some(element);
            return id;
        }
        assert!(
            self.slots.len() <= NodeId::MAX,
            "`Arena::insert()` - arena is full ({} slots)",
            NodeId::MAX + 1
        );
        self.slots.push(Some(element));
        NodeId::from_slot(self.slots.len() - 1)
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &T {
        self.slots[id.slot()].as_ref().expect("`Arena::get()` - `id` is vacant!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        self.slots[id.slot()].as_mut().expect("`Arena::get_mut()` - `id` is vacant!")
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> T {
        let element = self.slots[id.slot()].take().expect("`Arena::remove()` - `id` is vacant!");
        self.vacant.push(id);
        element
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.vacant.clear();
    }
}
