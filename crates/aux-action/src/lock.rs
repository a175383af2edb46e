//! `SignalLock` — a held signal lock as an owned token.
//!
//! The only way to obtain a token is to acquire the lock (or adopt one
//! restored from a save file); the only way to release is to consume the
//! token.  A delegate stores it as `Option<SignalLock>` and releases with
//! `take()`, so acquiring twice or releasing twice cannot be written.

use aux_core::{SignalId, TrainId};
use aux_world::SignalSystem;
use tracing::debug;

/// Proof that `train` holds `signal` locked.  Neither `Clone` nor `Copy`.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a SignalLock leaves the signal locked"]
pub struct SignalLock {
    signal: SignalId,
    train:  TrainId,
}

impl SignalLock {
    /// Lock `signal` for `train`.  `None` if the signal no longer exists.
    pub fn acquire<S: SignalSystem + ?Sized>(
        signals: &mut S,
        signal:  SignalId,
        train:   TrainId,
    ) -> Option<SignalLock> {
        if !signals.lock_signal_for(signal, train) {
            return None;
        }
        debug!(%signal, %train, "signal locked");
        Some(SignalLock { signal, train })
    }

    /// Take ownership of a lock the signal subsystem already holds for
    /// `train`, e.g. one restored together with a saved game.
    pub fn adopt(signal: SignalId, train: TrainId) -> SignalLock {
        SignalLock { signal, train }
    }

    #[inline]
    pub fn signal(&self) -> SignalId {
        self.signal
    }

    /// Unlock the signal, consuming the token.
    pub fn release<S: SignalSystem + ?Sized>(self, signals: &mut S) {
        signals.unlock_signal_for(self.signal, self.train);
        debug!(signal = %self.signal, train = %self.train, "signal unlocked");
    }
}
