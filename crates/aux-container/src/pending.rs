//! `PendingQueue` — armed items ordered by trigger distance.
//!
//! Items arrive roughly in trigger order (the specific queue is consumed in
//! route order), so insertion is a binary search plus a short shift.  Ties
//! keep arrival order, which makes advancing deterministic.
//!
//! A train rarely has more than a handful of live items; a sorted `Vec`
//! beats any tree at that size.

use aux_action::ActionItem;
use aux_core::{ItemId, RefId};

/// Live items of one container, ascending by `trigger_m`.
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: Vec<ActionItem>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after every item whose trigger is not greater.
    pub fn insert(&mut self, item: ActionItem) {
        let key = item.trigger().trigger_m;
        let at = self.items.partition_point(|i| i.trigger().trigger_m <= key);
        self.items.insert(at, item);
    }

    pub fn get(&self, id: ItemId) -> Option<&ActionItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut ActionItem> {
        self.items.iter_mut().find(|i| i.id() == id)
    }

    /// Remove and return the item, keeping the order of the rest.
    pub fn remove(&mut self, id: ItemId) -> Option<ActionItem> {
        let at = self.items.iter().position(|i| i.id() == id)?;
        Some(self.items.remove(at))
    }

    /// The first live item armed from `reference`.
    pub fn find_by_reference(&self, reference: RefId) -> Option<ItemId> {
        self.items.iter().find(|i| i.reference() == reference).map(ActionItem::id)
    }

    /// Ids of every item, in queue order.  A snapshot: safe to iterate while
    /// the queue is mutated.
    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(ActionItem::id).collect()
    }

    /// Restore trigger order after triggers were moved.  Stable.
    pub fn resort(&mut self) {
        self.items
            .sort_by(|a, b| a.trigger().trigger_m.total_cmp(&b.trigger().trigger_m));
    }

    /// Take every item out, in queue order.
    pub fn drain_all(&mut self) -> Vec<ActionItem> {
        std::mem::take(&mut self.items)
    }

    #[inline]
    pub fn as_slice(&self) -> &[ActionItem] {
        &self.items
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ActionItem> {
        self.items.iter_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
