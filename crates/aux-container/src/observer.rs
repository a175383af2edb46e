//! Container observer trait for logging, statistics and test probes.

use aux_action::{ActionItem, ItemState};
use aux_core::ItemId;

/// Callbacks invoked by a [`Container`][crate::Container] as items come and
/// go.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: departure counter
///
/// ```rust,ignore
/// struct Departures(u32);
///
/// impl ActionObserver for Departures {
///     fn on_removed(&mut self, item: &ActionItem) {
///         if item.is_waiting_point() {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait ActionObserver {
    /// Called after an item was armed and queued.
    fn on_armed(&mut self, _item: &ActionItem) {}

    /// Called when advancing an item changed its state.
    fn on_state_change(&mut self, _item: ItemId, _from: ItemState, _to: ItemState) {}

    /// Called after an item left its queue, whether it finished, was
    /// cancelled or was removed with its train.
    fn on_removed(&mut self, _item: &ActionItem) {}
}

/// An [`ActionObserver`] that does nothing.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ActionObserver for NoopObserver {}
