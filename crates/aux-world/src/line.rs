//! `LineWorld` — a deterministic single-line host.
//!
//! One train runs along an ordered list of track sections.  Kinematics are
//! the plain constant-acceleration kind: each step the train accelerates
//! toward its cruise speed, or brakes toward zero while any action holds it.
//! Signals sit at fixed route positions; the next one ahead of the train is
//! tracked automatically.  Every command the scheduler issues is recorded so
//! tests can assert on it.
//!
//! Only `visible` sections are part of the planned route.  Queries about
//! sections beyond it return `None`, which is how the route "not yet
//! extended this far" case is exercised.

use rustc_hash::FxHashMap;
use tracing::trace;

use aux_core::{RoutePosition, SchedulerConfig, SectionId, SignalId, SimTime, TrainId};

use crate::{
    ActionContext, BellState, MovementState, SignalAspect, SignalSystem, SoundFeedback,
    TrainControl, TrainView, UncoupleCars,
};

// ── Track ─────────────────────────────────────────────────────────────────────

/// One section of the line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineSection {
    pub id:        SectionId,
    pub length_m:  f32,
    pub subroute:  u32,
}

// ── Train ─────────────────────────────────────────────────────────────────────

/// The single train of a [`LineWorld`].
#[derive(Clone, Debug)]
pub struct LineTrain {
    pub id:              TrainId,
    pub length_m:        f32,
    pub max_accel_mpss:  f32,
    pub max_decel_mpss:  f32,
    pub max_speed_mps:   f32,
    /// Speed the train accelerates toward when nothing holds it.
    pub cruise_mps:      f32,
    pub ai_controlled:   bool,

    pub sections:        Vec<LineSection>,
    /// Number of leading sections that are part of the planned route.
    pub visible:         usize,

    /// Front position, in metres from the start of the first section.
    pub position_m:      f32,
    /// Odometer reading when `position_m` was 0.
    pub odometer_base_m: f32,
    pub speed_mps:       f32,
    pub movement:        MovementState,

    /// Set by `hold_speed_to_zero`; cleared after every step.
    pub hold:            bool,
    /// Set by `set_speed`; cleared after every step.
    pub speed_cap:       Option<f32>,

    pub uncouple_requests:   Vec<UncoupleCars>,
    pub attach_requests:     u32,
    pub attach_available:    bool,
    pub permission_requests: u32,
}

impl LineTrain {
    /// A train at the start of `sections`, standing still, all sections planned.
    pub fn new(id: TrainId, sections: Vec<LineSection>) -> Self {
        let visible = sections.len();
        Self {
            id,
            length_m:            100.0,
            max_accel_mpss:      0.5,
            max_decel_mpss:      0.5,
            max_speed_mps:       30.0,
            cruise_mps:          20.0,
            ai_controlled:       true,
            sections,
            visible,
            position_m:          0.0,
            odometer_base_m:     0.0,
            speed_mps:           0.0,
            movement:            MovementState::Running,
            hold:                false,
            speed_cap:           None,
            uncouple_requests:   Vec::new(),
            attach_requests:     0,
            attach_available:    true,
            permission_requests: 0,
        }
    }

    /// Total length of all sections (planned or not).
    pub fn line_length_m(&self) -> f32 {
        self.sections.iter().map(|s| s.length_m).sum()
    }

    /// Route position of the start of section `idx`.
    fn section_start_m(&self, idx: usize) -> f32 {
        self.sections[..idx].iter().map(|s| s.length_m).sum()
    }

    /// Index of the first planned section with `id`.
    fn visible_index_of(&self, id: SectionId) -> Option<usize> {
        self.sections[..self.visible.min(self.sections.len())]
            .iter()
            .position(|s| s.id == id)
    }

    /// Index of the section containing the train front.
    fn front_index(&self) -> usize {
        let mut start = 0.0;
        for (i, s) in self.sections.iter().enumerate() {
            if self.position_m < start + s.length_m {
                return i;
            }
            start += s.length_m;
        }
        self.sections.len().saturating_sub(1)
    }

    /// Absolute route position of `pos`, if its section is planned.
    pub fn absolute_m(&self, pos: RoutePosition) -> Option<f32> {
        self.visible_index_of(pos.section)
            .map(|i| self.section_start_m(i) + pos.offset_m)
    }

    /// Place the train front at `position_m` with `speed_mps`.
    pub fn place(&mut self, position_m: f32, speed_mps: f32) {
        self.position_m = position_m;
        self.speed_mps = speed_mps;
    }

    /// Integrate one step of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let before = self.active_subroute();
        let end = self.line_length_m();

        let mut target = self.cruise_mps.min(self.max_speed_mps);
        if let Some(cap) = self.speed_cap {
            target = target.min(cap.max(0.0));
        }
        if self.hold || self.position_m >= end {
            target = 0.0;
        }

        let v0 = self.speed_mps;
        let v1 = if v0 > target {
            (v0 - self.max_decel_mpss * dt).max(target)
        } else {
            (v0 + self.max_accel_mpss * dt).min(target)
        };
        self.speed_mps = v1;
        self.position_m = (self.position_m + 0.5 * (v0 + v1) * dt).min(end);
        if self.position_m >= end {
            self.speed_mps = 0.0;
        }

        self.hold = false;
        self.speed_cap = None;

        let after = self.active_subroute();
        if after != before {
            trace!(train = %self.id, subroute = after, "entered subroute");
        }
    }
}

impl TrainView for LineTrain {
    fn train_id(&self) -> TrainId {
        self.id
    }

    fn distance_travelled_m(&self) -> f32 {
        self.odometer_base_m + self.position_m
    }

    fn speed_mps(&self) -> f32 {
        self.speed_mps
    }

    fn max_speed_mps(&self) -> f32 {
        self.max_speed_mps
    }

    fn max_accel_mpss(&self) -> f32 {
        self.max_accel_mpss
    }

    fn max_decel_mpss(&self) -> f32 {
        self.max_decel_mpss
    }

    fn length_m(&self) -> f32 {
        self.length_m
    }

    fn active_subroute(&self) -> u32 {
        self.sections.get(self.front_index()).map_or(0, |s| s.subroute)
    }

    fn front_position(&self) -> RoutePosition {
        let idx = self.front_index();
        match self.sections.get(idx) {
            Some(s) => RoutePosition::new(s.id, self.position_m - self.section_start_m(idx)),
            None => RoutePosition::default(),
        }
    }

    fn route_distance_between(&self, from: RoutePosition, to: RoutePosition) -> Option<f32> {
        Some(self.absolute_m(to)? - self.absolute_m(from)?)
    }

    fn is_ai_controlled(&self) -> bool {
        self.ai_controlled
    }

    fn at_route_end(&self) -> bool {
        self.position_m >= self.line_length_m() - 0.01
    }

    fn movement_state(&self) -> MovementState {
        self.movement
    }
}

impl TrainControl for LineTrain {
    fn hold_speed_to_zero(&mut self) {
        self.hold = true;
    }

    fn set_speed(&mut self, mps: f32) {
        self.speed_cap = Some(self.speed_cap.map_or(mps, |c| c.min(mps)));
    }

    fn set_movement_state(&mut self, state: MovementState) {
        self.movement = state;
    }

    fn request_uncouple(&mut self, cars: UncoupleCars) {
        self.uncouple_requests.push(cars);
    }

    fn request_attach_to_nearest(&mut self) -> bool {
        self.attach_requests += 1;
        self.attach_available
    }

    fn request_signal_permission(&mut self) {
        self.permission_requests += 1;
    }
}

// ── Signals ───────────────────────────────────────────────────────────────────

/// Signals placed along the line.
#[derive(Clone, Debug, Default)]
pub struct LineSignals {
    pub aspects:  FxHashMap<SignalId, SignalAspect>,
    /// Route positions of signals, ascending.
    pub placed:   Vec<(f32, SignalId)>,
    pub locks:    FxHashMap<SignalId, TrainId>,
    pub next:     Option<SignalId>,
    /// Whether clearance requests on unlocked signals succeed.
    pub grant:    bool,

    pub lock_calls:         u32,
    pub unlock_calls:       u32,
    pub clearance_requests: u32,
}

impl LineSignals {
    pub fn new() -> Self {
        Self { grant: true, ..Self::default() }
    }

    /// Add a signal at route position `at_m`, showing stop.
    pub fn place(&mut self, signal: SignalId, at_m: f32) {
        self.aspects.insert(signal, SignalAspect::Stop);
        self.placed.push((at_m, signal));
        self.placed.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    /// Delete a signal object entirely, as a route change would.
    pub fn remove(&mut self, signal: SignalId) {
        self.aspects.remove(&signal);
        self.placed.retain(|&(_, s)| s != signal);
        self.locks.remove(&signal);
        if self.next == Some(signal) {
            self.next = None;
        }
    }

    pub fn is_locked(&self, signal: SignalId) -> bool {
        self.locks.contains_key(&signal)
    }

    /// Recompute `next` from the train front position.
    pub fn update_next(&mut self, front_m: f32) {
        self.next = self
            .placed
            .iter()
            .find(|&&(at, _)| at > front_m)
            .map(|&(_, s)| s);
    }
}

impl SignalSystem for LineSignals {
    fn request_clearance(&mut self, _train: TrainId, signal: SignalId) -> bool {
        self.clearance_requests += 1;
        if self.is_locked(signal) || !self.grant {
            return false;
        }
        match self.aspects.get_mut(&signal) {
            Some(aspect) => {
                *aspect = SignalAspect::Clear;
                true
            }
            None => false,
        }
    }

    fn lock_signal_for(&mut self, signal: SignalId, train: TrainId) -> bool {
        let Some(aspect) = self.aspects.get_mut(&signal) else {
            return false;
        };
        *aspect = SignalAspect::Stop;
        self.locks.insert(signal, train);
        self.lock_calls += 1;
        true
    }

    fn unlock_signal_for(&mut self, signal: SignalId, _train: TrainId) {
        self.locks.remove(&signal);
        self.unlock_calls += 1;
    }

    fn next_signal_of(&self, _train: TrainId) -> Option<SignalId> {
        self.next
    }

    fn signal_aspect(&self, signal: SignalId) -> Option<SignalAspect> {
        self.aspects.get(&signal).copied()
    }
}

// ── Sound ─────────────────────────────────────────────────────────────────────

/// One recorded sound command.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SoundEvent {
    HornOn,
    HornOff,
    Bell(BellState),
}

/// Records every sound command.
#[derive(Clone, Debug, Default)]
pub struct SoundLog {
    pub events:  Vec<SoundEvent>,
    pub horn_on: bool,
    pub bell:    BellState,
}

impl SoundLog {
    /// Number of distinct horn blasts started.
    pub fn blasts(&self) -> usize {
        self.events.iter().filter(|e| **e == SoundEvent::HornOn).count()
    }
}

impl SoundFeedback for SoundLog {
    fn start_horn(&mut self) {
        self.horn_on = true;
        self.events.push(SoundEvent::HornOn);
    }

    fn stop_horn(&mut self) {
        self.horn_on = false;
        self.events.push(SoundEvent::HornOff);
    }

    fn set_bell(&mut self, state: BellState) {
        self.bell = state;
        self.events.push(SoundEvent::Bell(state));
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// A complete single-train host.
#[derive(Clone, Debug)]
pub struct LineWorld {
    pub train:   LineTrain,
    pub signals: LineSignals,
    pub sound:   SoundLog,
}

impl LineWorld {
    pub fn new(train: LineTrain) -> Self {
        Self { train, signals: LineSignals::new(), sound: SoundLog::default() }
    }

    /// Split-borrow the world into an [`ActionContext`] for one tick.
    pub fn context<'a>(
        &'a mut self,
        now:          SimTime,
        elapsed_secs: f32,
        config:       &'a SchedulerConfig,
    ) -> ActionContext<'a> {
        ActionContext::new(
            now,
            elapsed_secs,
            config,
            &mut self.train,
            &mut self.signals,
            &mut self.sound,
        )
    }

    /// Integrate the train and refresh the next-signal pointer.
    pub fn step(&mut self, dt: f32) {
        self.train.step(dt);
        self.signals.update_next(self.train.position_m);
    }
}
