//! Signal delegate: hold a signal at stop while the train waits, then ask for
//! it to clear and hand control back to the signal system.
//!
//! The signal is chosen and locked when the train arrives at the point: the
//! reference's end signal, or else whatever signal is next ahead of the train
//! there.  A lock restored from a save file is owned from the moment the item
//! is armed.  The lock is released once, when the delay has expired (or
//! earlier if the item is terminated).  The item completes when clearance is
//! granted, the signal shows anything other than stop, the train's next
//! signal is no longer the tracked one, or the train has reached the end of
//! its route.  A signal that no longer exists completes it immediately.

use aux_core::SignalId;
use aux_world::{ActionContext, SignalSystem};
use tracing::{debug, info, warn};

use crate::item::{ItemCore, ItemState, StepOutcome};
use crate::{ActionKind, ActionReference, Delay, SignalLock};

#[derive(Debug)]
pub(crate) struct DelegateState {
    tracked: Option<SignalId>,
    lock: Option<SignalLock>,
}

impl DelegateState {
    /// `restored` is a lock carried over from a save file.
    pub(crate) fn new(restored: Option<SignalLock>) -> Self {
        Self { tracked: restored.as_ref().map(SignalLock::signal), lock: restored }
    }

    #[inline]
    pub(crate) fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    pub(crate) fn locked_signal(&self) -> Option<SignalId> {
        self.lock.as_ref().map(SignalLock::signal)
    }

    /// Release the lock if one is held.  Safe to call any number of times.
    pub(crate) fn release_lock<S: SignalSystem + ?Sized>(&mut self, signals: &mut S) {
        if let Some(lock) = self.lock.take() {
            lock.release(signals);
        }
    }

    /// Pick the signal to track and lock it, unless a restored lock already
    /// names it.
    fn resolve(&mut self, reference: &ActionReference, ctx: &mut ActionContext<'_>) {
        let train = ctx.train.train_id();
        if let Some(signal) = self.tracked {
            debug!(%signal, %train, "keeping restored signal lock");
            return;
        }
        let end_signal = match reference.kind {
            ActionKind::SignalDelegate { end_signal, .. } => end_signal,
            _ => None,
        };
        self.tracked = end_signal.or_else(|| ctx.signals.next_signal_of(train));
        if let Some(signal) = self.tracked {
            self.lock = SignalLock::acquire(&mut *ctx.signals, signal, train);
        }
    }
}

pub(crate) fn step(
    core:      &mut ItemCore,
    d:         &mut DelegateState,
    reference: &ActionReference,
    ctx:       &mut ActionContext<'_>,
) -> StepOutcome {
    match core.state {
        ItemState::Stopped => StepOutcome::DONE,
        ItemState::Init | ItemState::Braking => {
            if !core.trigger.arrived(ctx.train.distance_travelled_m()) {
                return StepOutcome::Pending;
            }
            d.resolve(reference, ctx);
            let Some(signal) = d.tracked else {
                debug!(reference = %core.reference, "no signal ahead to delegate");
                core.state = ItemState::Stopped;
                return StepOutcome::DONE;
            };
            if ctx.signals.signal_aspect(signal).is_none() {
                return vanished(core, d, reference, signal, ctx);
            }
            core.actual_departure.get_or_insert(reference.delay.departure(ctx.now));
            if reference.delay == Delay::RequestPermission {
                ctx.train.request_signal_permission();
            }
            core.state = ItemState::Handle;
            debug!(reference = %core.reference, %signal, departure = ?core.actual_departure, "delegate waiting");
            StepOutcome::Pending
        }
        ItemState::Handle => {
            let Some(signal) = d.tracked else {
                core.state = ItemState::Stopped;
                return StepOutcome::DONE;
            };
            if ctx.signals.signal_aspect(signal).is_none() {
                return vanished(core, d, reference, signal, ctx);
            }
            let departure = core.actual_departure.unwrap_or(ctx.now);
            if ctx.now < departure {
                return StepOutcome::Pending;
            }
            d.release_lock(&mut *ctx.signals);

            let train = ctx.train.train_id();
            let cleared = ctx.signals.request_clearance(train, signal);
            let proceeding = ctx.signals.signal_aspect(signal).is_some_and(|a| !a.is_stop());
            let moved_on = ctx.signals.next_signal_of(train) != Some(signal);
            if cleared || proceeding || moved_on || ctx.train.at_route_end() {
                return finish(core, reference);
            }
            StepOutcome::Pending
        }
    }
}

/// The tracked signal is gone: count it as cleared.
fn vanished(
    core:      &mut ItemCore,
    d:         &mut DelegateState,
    reference: &ActionReference,
    signal:    SignalId,
    ctx:       &mut ActionContext<'_>,
) -> StepOutcome {
    warn!(reference = %core.reference, %signal, "delegated signal no longer exists");
    d.release_lock(&mut *ctx.signals);
    finish(core, reference)
}

fn finish(core: &mut ItemCore, reference: &ActionReference) -> StepOutcome {
    core.state = ItemState::Stopped;
    let cancel = reference.associated_wp();
    info!(reference = %core.reference, cancel = ?cancel, "signal delegation complete");
    StepOutcome::Finished { cancel }
}
