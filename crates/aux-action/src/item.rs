//! `ActionItem` — the live, stateful instance of an armed reference.
//!
//! # States
//!
//! ```text
//!             arm
//!              │
//!              ▼
//!   Braking ─► Init ──► Handle ──► Stopped
//!     ▲                              (terminal)
//!     └── recalculation re-entry
//! ```
//!
//! Every kind waits in `Init` until the train reaches its point, runs its
//! entry actions exactly once, and moves to `Handle`.  `Stopped` is never
//! left: re-triggering a reference means arming a new item.  The per-kind
//! step functions live in [`waiting_point`](crate::waiting_point),
//! [`horn`](crate::horn) and [`delegate`](crate::delegate).
//!
//! Items never own their reference; the container passes it into every
//! [`ActionItem::advance`] call.

use aux_core::{ItemId, RefId, SignalId, SimTime};
use aux_world::ActionContext;

use crate::delegate::{self, DelegateState};
use crate::horn::{self, HornState};
use crate::waiting_point::{self, StopState};
use crate::{ActionKind, ActionReference, SignalLock, TriggerPoint};

/// State tag of an item.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum ItemState {
    /// Armed; waiting for the train to reach the action point.
    #[default]
    Init,
    /// Entry actions done; waiting for the departure condition.
    Handle,
    /// Re-entered after a route recalculation; bringing the train to a stand.
    Braking,
    /// Terminal.
    Stopped,
}

/// Result of advancing an item by one tick.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    Pending,
    /// The item reached `Stopped`.  `cancel` names a waiting point whose
    /// pending item must be removed as part of this completion.
    Finished { cancel: Option<RefId> },
}

impl StepOutcome {
    pub(crate) const DONE: StepOutcome = StepOutcome::Finished { cancel: None };

    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(self, StepOutcome::Finished { .. })
    }
}

/// Fields shared by every kind.
#[derive(Debug)]
pub(crate) struct ItemCore {
    pub(crate) id:               ItemId,
    pub(crate) reference:        RefId,
    pub(crate) generic:          bool,
    pub(crate) state:            ItemState,
    pub(crate) trigger:          TriggerPoint,
    pub(crate) actual_departure: Option<SimTime>,
}

#[derive(Debug)]
pub(crate) enum ItemKind {
    WaitingPoint(StopState),
    SoundHorn(HornState),
    SignalDelegate(DelegateState),
}

/// A live action for one train.
#[derive(Debug)]
pub struct ActionItem {
    pub(crate) core: ItemCore,
    pub(crate) kind: ItemKind,
}

impl ActionItem {
    /// Arm an item from `reference`.  Called through
    /// [`ActionReference::handler`].
    pub(crate) fn new(
        id:         ItemId,
        reference:  RefId,
        template:   &ActionReference,
        trigger:    TriggerPoint,
        restored:   Option<SignalLock>,
    ) -> ActionItem {
        let kind = match template.kind {
            ActionKind::WaitingPoint => ItemKind::WaitingPoint(StopState::default()),
            ActionKind::SoundHorn { pattern } => ItemKind::SoundHorn(HornState::new(pattern)),
            ActionKind::SignalDelegate { .. } => {
                ItemKind::SignalDelegate(DelegateState::new(restored))
            }
        };
        ActionItem {
            core: ItemCore {
                id,
                reference,
                generic: template.is_generic(),
                state: ItemState::Init,
                trigger,
                actual_departure: None,
            },
            kind,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> ItemId {
        self.core.id
    }

    /// The reference this item was armed from.
    #[inline]
    pub fn reference(&self) -> RefId {
        self.core.reference
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.core.generic
    }

    #[inline]
    pub fn state(&self) -> ItemState {
        self.core.state
    }

    #[inline]
    pub fn trigger(&self) -> TriggerPoint {
        self.core.trigger
    }

    /// Clock reading at which the wait ends, once entry actions have run.
    #[inline]
    pub fn actual_departure(&self) -> Option<SimTime> {
        self.core.actual_departure
    }

    /// `true` while a delegate holds its signal locked.
    pub fn is_locked(&self) -> bool {
        match &self.kind {
            ItemKind::SignalDelegate(d) => d.is_locked(),
            _ => false,
        }
    }

    /// The signal a delegate holds locked.
    pub fn locked_signal(&self) -> Option<SignalId> {
        match &self.kind {
            ItemKind::SignalDelegate(d) => d.locked_signal(),
            _ => None,
        }
    }

    /// `true` while a horn item is sounding.
    pub fn is_horn_playing(&self) -> bool {
        match &self.kind {
            ItemKind::SoundHorn(h) => h.triggered,
            _ => false,
        }
    }

    #[inline]
    pub fn is_waiting_point(&self) -> bool {
        matches!(self.kind, ItemKind::WaitingPoint(_))
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Advance the state machine by one tick.
    ///
    /// Calling this on a `Stopped` item is a no-op returning
    /// `Finished { cancel: None }`, so a completion is reported with its
    /// cancellation exactly once.
    pub fn advance(&mut self, reference: &ActionReference, ctx: &mut ActionContext<'_>) -> StepOutcome {
        if self.core.state == ItemState::Stopped {
            return StepOutcome::DONE;
        }
        match &mut self.kind {
            ItemKind::WaitingPoint(s) => waiting_point::step(&mut self.core, s, reference, ctx),
            ItemKind::SoundHorn(s) => horn::step(&mut self.core, s, reference, ctx),
            ItemKind::SignalDelegate(s) => delegate::step(&mut self.core, s, reference, ctx),
        }
    }

    /// Replace the trigger point after the route was recalculated.
    pub fn retarget(&mut self, trigger: TriggerPoint) {
        self.core.trigger = trigger;
    }

    /// Send a waiting-point or horn item that has not yet run its entry
    /// actions back through `Braking`.  Returns `false` (and changes
    /// nothing) for any other item.
    pub fn reenter_braking(&mut self) -> bool {
        let stop_class = matches!(self.kind, ItemKind::WaitingPoint(_) | ItemKind::SoundHorn(_));
        if !stop_class || self.core.state != ItemState::Init {
            return false;
        }
        self.core.state = ItemState::Braking;
        true
    }

    /// Terminate the item immediately, undoing whatever it holds: a delegate
    /// releases its lock, a horn falls silent and hands the movement state
    /// back, a waiting point lets go of the train.
    pub fn force_terminate(&mut self, ctx: &mut ActionContext<'_>) {
        if self.core.state == ItemState::Stopped {
            return;
        }
        match &mut self.kind {
            ItemKind::WaitingPoint(_) => waiting_point::release(&self.core, ctx),
            ItemKind::SoundHorn(s) => horn::silence(s, ctx),
            ItemKind::SignalDelegate(s) => s.release_lock(&mut *ctx.signals),
        }
        self.core.state = ItemState::Stopped;
    }
}
