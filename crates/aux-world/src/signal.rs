//! Signal subsystem interface.

use aux_core::{SignalId, TrainId};

/// Aspect shown by a signal, most restrictive first.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum SignalAspect {
    #[default]
    Stop,
    StopAndProceed,
    Restricting,
    Approach,
    Clear,
}

impl SignalAspect {
    #[inline]
    pub fn is_stop(self) -> bool {
        matches!(self, SignalAspect::Stop)
    }
}

/// The scheduler's view of the signal and route-reservation subsystem.
pub trait SignalSystem {
    /// Ask `signal` to clear for `train`.  Returns `true` if it did.
    fn request_clearance(&mut self, train: TrainId, signal: SignalId) -> bool;

    /// Hold `signal` at stop on behalf of `train`.  Returns `false` if the
    /// signal no longer exists.
    fn lock_signal_for(&mut self, signal: SignalId, train: TrainId) -> bool;

    fn unlock_signal_for(&mut self, signal: SignalId, train: TrainId);

    /// The next signal ahead of `train`, if any.
    fn next_signal_of(&self, train: TrainId) -> Option<SignalId>;

    /// Current aspect, or `None` if the signal object no longer exists.
    fn signal_aspect(&self, signal: SignalId) -> Option<SignalAspect>;
}
