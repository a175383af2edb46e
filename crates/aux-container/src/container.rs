//! The `Container` struct and its per-tick operations.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use aux_action::{
    calculate_trigger, ActionItem, ActionKind, ActionReference, Delay, EventSource, ItemState,
    ReferenceEntry, SignalLock, SpeedPolicy, StepOutcome, TriggerPoint,
};
use aux_core::{ItemId, RefId, SignalId, SimTime, TrainId, WorldLocation};
use aux_world::{ActionContext, SignalSystem};

use crate::{ActionObserver, ContainerError, ContainerResult, GenericRegistry, NoopObserver, PendingQueue};

// ── Reference slots ───────────────────────────────────────────────────────────

/// A registered reference plus the container's bookkeeping for it.
#[derive(Debug)]
struct RefSlot {
    reference: ActionReference,

    /// An item armed from this (specific) reference is live.
    linked: bool,

    /// Lock restored from a save file, handed to the next delegate armed
    /// from this reference.
    pending_lock: Option<SignalId>,

    /// For the waiting point of a delegate pair: its delegate.
    paired_delegate: Option<RefId>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Queue {
    Specific,
    Generic,
}

// ── Container ─────────────────────────────────────────────────────────────────

/// Everything one train has scheduled.
///
/// `Container<O>` owns the train's references and live items and drives them
/// once per tick:
///
/// 1. **Arm**: walk the route-ordered specific queue from its head, dropping
///    references whose subroute is behind the train, and arm every reference
///    whose trigger has been reached.  The walk stops at the first reference
///    that is not yet due, so references arm strictly in route order.
/// 2. **Advance**: step every live item once.  Completions and the
///    cancellations they cause are collected first and applied afterwards.
///
/// Generic references (level-crossing horns) are armed separately, through
/// [`Container::check_event_source`], whenever the host reports an event.
///
/// `RefId`s index a slot arena that only grows; a retired reference leaves an
/// empty slot, so a stale id resolves to nothing instead of to another
/// reference.
///
/// Create via [`Container::new`] or [`ContainerBuilder`][crate::ContainerBuilder].
pub struct Container<O: ActionObserver = NoopObserver> {
    train: TrainId,

    refs: Vec<Option<RefSlot>>,

    /// Specific references in route order.
    specific: VecDeque<RefId>,

    generic: GenericRegistry,

    pending_specific: PendingQueue,
    pending_generic:  PendingQueue,

    next_item: u32,

    /// Receives arm / state-change / removal callbacks.
    pub observer: O,
}

impl Container<NoopObserver> {
    /// An empty container for `train`.
    pub fn new(train: TrainId) -> Self {
        Self::with_observer(train, NoopObserver)
    }
}

impl<O: ActionObserver> Container<O> {
    pub fn with_observer(train: TrainId, observer: O) -> Self {
        Self {
            train,
            refs: Vec::new(),
            specific: VecDeque::new(),
            generic: GenericRegistry::default(),
            pending_specific: PendingQueue::new(),
            pending_generic: PendingQueue::new(),
            next_item: 0,
            observer,
        }
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register one entry.  Specific references are appended to the route
    /// queue (the caller registers in route order); generic ones are hooked
    /// to their event source.
    ///
    /// For a delegate pair the waiting point is queued ahead of its
    /// delegate, since it has to start braking first, and the returned id is
    /// the delegate's.
    pub fn register(&mut self, entry: ReferenceEntry) -> ContainerResult<RefId> {
        match entry {
            ReferenceEntry::Single(reference) => self.register_single(reference),
            ReferenceEntry::DelegatePair { delegate, waiting_point } => {
                self.register_pair(delegate, waiting_point)
            }
        }
    }

    fn register_single(&mut self, mut reference: ActionReference) -> ContainerResult<RefId> {
        if let Some(source) = reference.generic {
            if !matches!(reference.kind, ActionKind::SoundHorn { .. }) {
                return Err(ContainerError::InvalidReference(format!(
                    "{} cannot be triggered by world events",
                    reference.kind.name()
                )));
            }
            let id = self.alloc(reference, None);
            self.generic.register(source, id);
            debug!(train = %self.train, reference = %id, ?source, "generic hook registered");
            return Ok(id);
        }
        // An unpaired delegate has nothing to cancel.
        if let ActionKind::SignalDelegate { associated_wp, .. } = &mut reference.kind {
            *associated_wp = None;
        }
        let id = self.alloc(reference, None);
        self.specific.push_back(id);
        Ok(id)
    }

    fn register_pair(
        &mut self,
        mut delegate:  ActionReference,
        waiting_point: ActionReference,
    ) -> ContainerResult<RefId> {
        let well_formed = matches!(delegate.kind, ActionKind::SignalDelegate { .. })
            && waiting_point.kind == ActionKind::WaitingPoint
            && !delegate.is_generic()
            && !waiting_point.is_generic();
        if !well_formed {
            return Err(ContainerError::Association(
                "a pair is one route-bound signal delegate and one route-bound waiting point".into(),
            ));
        }
        if delegate.placement.section != waiting_point.placement.section {
            return Err(ContainerError::Association(format!(
                "delegate in {} but waiting point in {}",
                delegate.placement.section, waiting_point.placement.section
            )));
        }

        let wp_id = RefId(self.refs.len() as u32);
        let delegate_id = RefId(wp_id.0 + 1);
        if let ActionKind::SignalDelegate { associated_wp, .. } = &mut delegate.kind {
            *associated_wp = Some(wp_id);
        }
        self.alloc(waiting_point, Some(delegate_id));
        self.alloc(delegate, None);
        self.specific.push_back(wp_id);
        self.specific.push_back(delegate_id);
        debug!(train = %self.train, delegate = %delegate_id, waiting_point = %wp_id, "delegate pair registered");
        Ok(delegate_id)
    }

    fn alloc(&mut self, reference: ActionReference, paired_delegate: Option<RefId>) -> RefId {
        let id = RefId(self.refs.len() as u32);
        let pending_lock = reference.locked_signal;
        self.refs.push(Some(RefSlot { reference, linked: false, pending_lock, paired_delegate }));
        id
    }

    // ── Per-tick operations ───────────────────────────────────────────────

    /// Arm newly reachable specific references, then advance every live
    /// item.  The host calls this once per tick for the train.
    pub fn update(&mut self, ctx: &mut ActionContext<'_>) {
        self.arm_reachable(ctx);
        self.advance_pending(ctx);
    }

    /// Arm every specific reference whose trigger the train has reached.
    /// Returns the number of items armed.
    ///
    /// References on subroutes the train has left are discarded.  The walk
    /// stops at the first reference on a later subroute, the first one whose
    /// section the planned route does not reach yet, and the first one whose
    /// trigger is still ahead.
    pub fn arm_reachable(&mut self, ctx: &mut ActionContext<'_>) -> usize {
        let active = ctx.train.active_subroute();
        let travelled = ctx.train.distance_travelled_m();

        let mut passed = Vec::new();
        let mut due = Vec::new();
        for &id in &self.specific {
            let Some(slot) = self.refs.get(id.index()).and_then(Option::as_ref) else {
                continue;
            };
            if slot.linked {
                continue;
            }
            let subroute = slot.reference.placement.subroute;
            if subroute < active {
                passed.push(id);
                continue;
            }
            if subroute > active {
                break;
            }
            let Some(trigger) =
                calculate_trigger(&slot.reference, &*ctx.train, SpeedPolicy::MaxAllowed, ctx.config)
            else {
                break;
            };
            if !trigger.reached(travelled) {
                break;
            }
            due.push((id, trigger));
        }

        for id in passed {
            debug!(train = %self.train, reference = %id, "reference passed; discarded");
            self.retire(id, &mut *ctx.signals);
        }
        due.into_iter()
            .filter(|&(id, trigger)| self.arm(id, trigger, Queue::Specific).is_some())
            .count()
    }

    /// The host reports an event source of kind `source` at `location`,
    /// `distance_to_event_m` ahead of the train front.  Arms a fresh item for
    /// each hook on that source that has not yet armed for this train and
    /// place, provided the event lies inside the hook's lookahead.
    ///
    /// Returns `true` if at least one item was armed.
    pub fn check_event_source(
        &mut self,
        source:              EventSource,
        location:            WorldLocation,
        distance_to_event_m: f32,
        ctx:                 &mut ActionContext<'_>,
    ) -> bool {
        let train = ctx.train.train_id();
        let travelled = ctx.train.distance_travelled_m();
        let tolerance = ctx.config.location_match_m;

        let mut armed = false;
        for id in self.generic.hooks(source).to_vec() {
            if self.generic.already_asked(id, train, location, tolerance) {
                continue;
            }
            let Some(slot) = self.slot(id) else { continue };
            let lookahead = slot.reference.trigger_margin_m.max(ctx.config.horn_lookahead_m);
            if !(0.0..=lookahead).contains(&distance_to_event_m) {
                continue;
            }
            let trigger = TriggerPoint {
                trigger_m:    travelled,
                activation_m: travelled,
                action_m:     travelled + distance_to_event_m,
            };
            if self.arm(id, trigger, Queue::Generic).is_some() {
                self.generic.remember(id, train, location);
                debug!(%train, reference = %id, %location, distance_to_event_m, "event armed");
                armed = true;
            }
        }
        armed
    }

    /// Advance every live item by one step.  Returns the number of items
    /// that completed.
    ///
    /// Items are stepped from a snapshot of ids; completions and the
    /// waiting-point cancellations they request are applied after the whole
    /// snapshot has been stepped.  A waiting point cancelled earlier in the
    /// same pass is not stepped.
    pub fn advance_pending(&mut self, ctx: &mut ActionContext<'_>) -> usize {
        let order: Vec<(Queue, ItemId)> = self
            .pending_specific
            .ids()
            .into_iter()
            .map(|id| (Queue::Specific, id))
            .chain(self.pending_generic.ids().into_iter().map(|id| (Queue::Generic, id)))
            .collect();

        let mut finished: Vec<(Queue, ItemId)> = Vec::new();
        let mut cancels: Vec<RefId> = Vec::new();

        for (queue, id) in order {
            let pending = match queue {
                Queue::Specific => &mut self.pending_specific,
                Queue::Generic => &mut self.pending_generic,
            };
            let Some(item) = pending.get_mut(id) else { continue };
            if cancels.contains(&item.reference()) {
                continue;
            }
            let Some(slot) = self.refs.get(item.reference().index()).and_then(Option::as_ref) else {
                // Reference retired under a live item; drop the item.
                finished.push((queue, id));
                continue;
            };

            let before = item.state();
            let outcome = item.advance(&slot.reference, ctx);
            let after = item.state();
            if after != before {
                self.observer.on_state_change(id, before, after);
            }
            if let StepOutcome::Finished { cancel } = outcome {
                finished.push((queue, id));
                cancels.extend(cancel);
            }
        }

        let count = finished.len();
        for (queue, id) in finished {
            self.sweep(queue, id, ctx);
        }
        for wp in cancels {
            self.cancel_waiting_point(wp, ctx);
        }
        count
    }

    /// Remove one live item and, for a specific item, its reference.  A
    /// delegate's lock is released.  Returns `false` if no such item is live.
    pub fn remove(&mut self, item: ItemId, ctx: &mut ActionContext<'_>) -> bool {
        let taken = match self.pending_specific.remove(item) {
            Some(i) => Some(i),
            None => self.pending_generic.remove(item),
        };
        let Some(mut item) = taken else { return false };
        item.force_terminate(ctx);
        if !item.is_generic() {
            self.retire(item.reference(), &mut *ctx.signals);
        }
        self.observer.on_removed(&item);
        true
    }

    /// Remove a reference together with every live item armed from it.
    pub fn remove_reference(&mut self, reference: RefId, ctx: &mut ActionContext<'_>) -> ContainerResult<()> {
        if self.slot(reference).is_none() {
            return Err(ContainerError::UnknownReference(reference));
        }
        for pending in [&mut self.pending_specific, &mut self.pending_generic] {
            while let Some(id) = pending.find_by_reference(reference) {
                if let Some(mut item) = pending.remove(id) {
                    item.force_terminate(ctx);
                    self.observer.on_removed(&item);
                }
            }
        }
        self.generic.unregister(reference);
        self.retire(reference, &mut *ctx.signals);
        Ok(())
    }

    /// The route was recalculated: recompute the triggers of live specific
    /// items that have not yet run their entry actions, using the train's
    /// current speed.  A waiting point or horn whose approach has already
    /// begun is re-entered through `Braking`.  Returns the number of items
    /// re-entered.
    pub fn recalculate(&mut self, ctx: &mut ActionContext<'_>) -> usize {
        let travelled = ctx.train.distance_travelled_m();
        let mut reentered = 0;
        for item in self.pending_specific.iter_mut() {
            if !matches!(item.state(), ItemState::Init | ItemState::Braking) {
                continue;
            }
            let Some(slot) = self.refs.get(item.reference().index()).and_then(Option::as_ref) else {
                continue;
            };
            let Some(trigger) =
                calculate_trigger(&slot.reference, &*ctx.train, SpeedPolicy::Current, ctx.config)
            else {
                continue;
            };
            item.retarget(trigger);
            let approaching = travelled >= trigger.activation_m && !trigger.arrived(travelled);
            if approaching && item.reenter_braking() {
                self.observer.on_state_change(item.id(), ItemState::Init, ItemState::Braking);
                reentered += 1;
            }
        }
        self.pending_specific.resort();
        debug!(train = %self.train, reentered, "triggers recalculated");
        reentered
    }

    /// The train leaves the simulation: terminate every item (releasing any
    /// held lock) and drop every reference.
    pub fn clear(&mut self, ctx: &mut ActionContext<'_>) {
        let items = self
            .pending_specific
            .drain_all()
            .into_iter()
            .chain(self.pending_generic.drain_all());
        for mut item in items {
            item.force_terminate(ctx);
            self.observer.on_removed(&item);
        }
        let train = self.train;
        for slot in self.refs.iter_mut().filter_map(Option::take) {
            if let Some(signal) = slot.pending_lock {
                SignalLock::adopt(signal, train).release(&mut *ctx.signals);
            }
        }
        self.specific.clear();
        self.generic.clear();
        info!(%train, "action container cleared");
    }

    // ── Persistence ───────────────────────────────────────────────────────

    /// The specific references as they must be written to a save file taken
    /// at clock `now`, in route order.
    ///
    /// A stop already waiting out its delay is written as the wait remaining
    /// (see [`Delay::remaining_until`]); a delegate holding a lock writes the locked
    /// signal.  Generic hooks are not included: they are rebuilt from static
    /// configuration when the train is restored.
    pub fn snapshot_for_save(&self, now: SimTime) -> Vec<ReferenceEntry> {
        let mut out = Vec::with_capacity(self.specific.len());
        for &id in &self.specific {
            let Some(slot) = self.slot(id) else { continue };
            // Written together with its delegate.
            if slot.paired_delegate.is_some_and(|d| self.slot(d).is_some()) {
                continue;
            }
            let reference = self.saved_reference(id, slot, now);
            let partner = slot
                .reference
                .associated_wp()
                .and_then(|wp| self.slot(wp).map(|s| (wp, s)));
            match partner {
                Some((wp, wp_slot)) => out.push(ReferenceEntry::DelegatePair {
                    delegate:      reference,
                    waiting_point: self.saved_reference(wp, wp_slot, now),
                }),
                None => out.push(ReferenceEntry::Single(reference)),
            }
        }
        out
    }

    fn saved_reference(&self, id: RefId, slot: &RefSlot, now: SimTime) -> ActionReference {
        let mut reference = slot.reference.clone();
        reference.locked_signal = slot.pending_lock;
        // Pairing is carried by record order, not by id.
        if let ActionKind::SignalDelegate { associated_wp, .. } = &mut reference.kind {
            *associated_wp = None;
        }
        let live = self
            .pending_specific
            .find_by_reference(id)
            .and_then(|item| self.pending_specific.get(item));
        if let Some(item) = live {
            if item.state() == ItemState::Handle {
                if let Some(departure) = item.actual_departure() {
                    reference.delay = Delay::remaining_until(departure, now);
                }
            }
            if let Some(signal) = item.locked_signal() {
                reference.locked_signal = Some(signal);
            }
        }
        reference
    }

    // ── Introspection ─────────────────────────────────────────────────────

    #[inline]
    pub fn train(&self) -> TrainId {
        self.train
    }

    /// Live items armed from specific references, in trigger order.
    pub fn pending_specific(&self) -> &[ActionItem] {
        self.pending_specific.as_slice()
    }

    /// Live items armed from generic hooks, in trigger order.
    pub fn pending_generic(&self) -> &[ActionItem] {
        self.pending_generic.as_slice()
    }

    /// `true` while an item armed from this specific reference is live.
    pub fn is_linked(&self, reference: RefId) -> bool {
        self.slot(reference).is_some_and(|s| s.linked)
    }

    /// Number of specific references still queued (armed or not).
    pub fn specific_len(&self) -> usize {
        self.specific.len()
    }

    /// Number of generic hooks.
    pub fn generic_len(&self) -> usize {
        self.generic.len()
    }

    pub fn reference(&self, id: RefId) -> Option<&ActionReference> {
        self.slot(id).map(|s| &s.reference)
    }

    /// Queued specific references, in route order.
    pub fn specific_references(&self) -> impl Iterator<Item = RefId> + '_ {
        self.specific.iter().copied()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn slot(&self, id: RefId) -> Option<&RefSlot> {
        self.refs.get(id.index()).and_then(Option::as_ref)
    }

    /// Produce an item from reference `id` and queue it.
    fn arm(&mut self, id: RefId, trigger: TriggerPoint, queue: Queue) -> Option<ItemId> {
        let item_id = ItemId(self.next_item);
        let train = self.train;
        let slot = self.refs.get_mut(id.index()).and_then(Option::as_mut)?;
        if slot.linked && !slot.reference.is_generic() {
            return None;
        }
        // Only a delegate can own a restored lock; any other kind keeps it in
        // the slot until the reference is retired.
        let restored = match slot.reference.kind {
            ActionKind::SignalDelegate { .. } => slot.pending_lock.take(),
            _ => None,
        }
        .map(|signal| SignalLock::adopt(signal, train));
        let item = slot.reference.handler(id, slot.linked, item_id, trigger, restored)?;
        if !slot.reference.is_generic() {
            slot.linked = true;
        }
        self.next_item += 1;

        self.observer.on_armed(&item);
        match queue {
            Queue::Specific => self.pending_specific.insert(item),
            Queue::Generic => self.pending_generic.insert(item),
        }
        Some(item_id)
    }

    /// Take a finished item out of its queue.
    fn sweep(&mut self, queue: Queue, id: ItemId, ctx: &mut ActionContext<'_>) {
        let pending = match queue {
            Queue::Specific => &mut self.pending_specific,
            Queue::Generic => &mut self.pending_generic,
        };
        let Some(mut item) = pending.remove(id) else { return };
        item.force_terminate(ctx);
        if !item.is_generic() {
            self.retire(item.reference(), &mut *ctx.signals);
        }
        self.observer.on_removed(&item);
    }

    /// A delegate completed: its waiting point must not fire (again).
    fn cancel_waiting_point(&mut self, wp: RefId, ctx: &mut ActionContext<'_>) {
        match self.slot(wp) {
            None => return,
            Some(slot) if slot.reference.kind != ActionKind::WaitingPoint => {
                warn!(train = %self.train, reference = %wp, "cancel target is not a waiting point");
                return;
            }
            Some(_) => {}
        }
        if let Some(id) = self.pending_specific.find_by_reference(wp) {
            if let Some(mut item) = self.pending_specific.remove(id) {
                item.force_terminate(ctx);
                self.observer.on_removed(&item);
            }
        }
        self.retire(wp, &mut *ctx.signals);
        info!(train = %self.train, reference = %wp, "waiting point cancelled by its delegate");
    }

    /// Drop a reference for good.  A lock restored for it but never taken
    /// over by an item is released.
    fn retire<S: SignalSystem + ?Sized>(&mut self, id: RefId, signals: &mut S) {
        self.specific.retain(|&r| r != id);
        let Some(slot) = self.refs.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        if let Some(signal) = slot.pending_lock {
            SignalLock::adopt(signal, self.train).release(signals);
        }
    }
}
