//! Horn: sound a blast pattern on reaching the point, optionally ring the
//! bell, then hand the movement state back.

use aux_core::SimTime;
use aux_world::{ActionContext, BellState, MovementState};
use tracing::debug;

use crate::item::{ItemCore, ItemState, StepOutcome};
use crate::waiting_point;
use crate::{ActionReference, HornPattern};

#[derive(Debug)]
pub(crate) struct HornState {
    pattern: HornPattern,
    /// Blast windows, seconds from `started`.
    blasts: Vec<(i64, i64)>,
    started: Option<SimTime>,
    /// Movement state before the horn took the train over.
    prior: Option<MovementState>,
    /// Horn currently sounding.
    pub(crate) triggered: bool,
    bell: bool,
}

impl HornState {
    pub(crate) fn new(pattern: HornPattern) -> Self {
        Self { pattern, blasts: Vec::new(), started: None, prior: None, triggered: false, bell: false }
    }
}

pub(crate) fn step(
    core:      &mut ItemCore,
    horn:      &mut HornState,
    reference: &ActionReference,
    ctx:       &mut ActionContext<'_>,
) -> StepOutcome {
    match core.state {
        ItemState::Braking => {
            waiting_point::brake(core, ctx);
            StepOutcome::Pending
        }
        ItemState::Init => {
            if ctx.train.distance_travelled_m() < core.trigger.activation_m {
                return StepOutcome::Pending;
            }
            start(core, horn, reference, ctx);
            sound(core, horn, ctx);
            StepOutcome::Pending
        }
        ItemState::Handle => {
            if sound(core, horn, ctx) {
                return StepOutcome::Pending;
            }
            let departure = core.actual_departure.unwrap_or(ctx.now);
            if horn.bell && ctx.now < departure + ctx.config.bell_extra_secs {
                return StepOutcome::Pending;
            }
            silence(horn, ctx);
            core.state = ItemState::Stopped;
            debug!(reference = %core.reference, at = %ctx.now, "horn finished");
            StepOutcome::DONE
        }
        ItemState::Stopped => StepOutcome::DONE,
    }
}

fn start(core: &mut ItemCore, horn: &mut HornState, reference: &ActionReference, ctx: &mut ActionContext<'_>) {
    let secs = match reference.delay.remaining_wait(ctx.now) {
        0 => ctx.config.default_horn_secs,
        s => s,
    };
    horn.blasts = horn.pattern.blasts(secs);
    let total = horn.blasts.last().map_or(secs, |&(_, end)| end);

    horn.started = Some(ctx.now);
    core.actual_departure = Some(ctx.now + total);
    horn.prior = Some(ctx.train.movement_state());
    ctx.train.set_movement_state(MovementState::HandleAction);
    if horn.pattern.rings_bell() {
        ctx.sound.set_bell(BellState::Ringing);
        horn.bell = true;
    }
    core.state = ItemState::Handle;
    debug!(reference = %core.reference, pattern = ?horn.pattern, total, "horn started");
}

/// Switch the horn on or off for the current second of the pattern.
/// Returns `true` while the pattern is still running.
fn sound(core: &ItemCore, horn: &mut HornState, ctx: &mut ActionContext<'_>) -> bool {
    let started = horn.started.unwrap_or(ctx.now);
    let departure = core.actual_departure.unwrap_or(ctx.now);
    let running = ctx.now < departure;

    let t = ctx.now.since(started);
    let wanted = running && horn.blasts.iter().any(|&(from, to)| from <= t && t < to);
    if wanted != horn.triggered {
        if wanted {
            ctx.sound.start_horn();
        } else {
            ctx.sound.stop_horn();
        }
        horn.triggered = wanted;
    }
    running
}

/// Stop every sound and restore the movement state the horn replaced,
/// unless something else has taken the train over since.
pub(crate) fn silence(horn: &mut HornState, ctx: &mut ActionContext<'_>) {
    if horn.triggered {
        ctx.sound.stop_horn();
        horn.triggered = false;
    }
    if horn.bell {
        ctx.sound.set_bell(BellState::Off);
        horn.bell = false;
    }
    if let Some(prior) = horn.prior.take() {
        if ctx.train.movement_state() == MovementState::HandleAction {
            ctx.train.set_movement_state(prior);
        }
    }
}
