//! Generic reference hooks keyed by event source.
//!
//! The same physical crossing is usually reported to a train on many
//! consecutive ticks.  Each hook remembers the last train and location it
//! armed for, so one crossing arms one item.

use rustc_hash::FxHashMap;

use aux_action::EventSource;
use aux_core::{RefId, TrainId, WorldLocation};

#[derive(Debug, Default)]
pub struct GenericRegistry {
    hooks: FxHashMap<EventSource, Vec<RefId>>,
    /// Last `(train, location)` each hook armed for.
    asked: FxHashMap<RefId, (TrainId, WorldLocation)>,
}

impl GenericRegistry {
    pub fn register(&mut self, source: EventSource, reference: RefId) {
        self.hooks.entry(source).or_default().push(reference);
    }

    /// Hooks listening to `source`, in registration order.
    pub fn hooks(&self, source: EventSource) -> &[RefId] {
        self.hooks.get(&source).map_or(&[], Vec::as_slice)
    }

    /// `true` if `reference` already armed for this train at this place.
    pub fn already_asked(
        &self,
        reference:   RefId,
        train:       TrainId,
        location:    WorldLocation,
        tolerance_m: f32,
    ) -> bool {
        self.asked
            .get(&reference)
            .is_some_and(|&(t, at)| t == train && at.same_place(location, tolerance_m))
    }

    pub fn remember(&mut self, reference: RefId, train: TrainId, location: WorldLocation) {
        self.asked.insert(reference, (train, location));
    }

    /// Drop a hook and its memo.
    pub fn unregister(&mut self, reference: RefId) {
        for refs in self.hooks.values_mut() {
            refs.retain(|&r| r != reference);
        }
        self.asked.remove(&reference);
    }

    /// Total number of hooks across all sources.
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.hooks.clear();
        self.asked.clear();
    }
}
