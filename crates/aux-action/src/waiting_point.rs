//! Waiting point: bring the train to a stand at the point, apply the delay
//! code's side effect, hold until departure.

use aux_world::{ActionContext, MovementState};
use tracing::{debug, info, warn};

use crate::item::{ItemCore, ItemState, StepOutcome};
use crate::{ActionReference, Delay, TriggerPoint};

#[derive(Debug, Default)]
pub(crate) struct StopState {
    /// Uncouple / attach / permission already issued.
    side_effects_done: bool,
}

pub(crate) fn step(
    core:      &mut ItemCore,
    stop:      &mut StopState,
    reference: &ActionReference,
    ctx:       &mut ActionContext<'_>,
) -> StepOutcome {
    match core.state {
        ItemState::Braking => {
            brake(core, ctx);
            StepOutcome::Pending
        }
        ItemState::Init => {
            let travelled = ctx.train.distance_travelled_m();
            if !core.trigger.arrived(travelled) {
                if travelled >= core.trigger.activation_m {
                    approach(&core.trigger, ctx);
                }
                return StepOutcome::Pending;
            }
            enter(core, stop, reference.delay, ctx);
            StepOutcome::Pending
        }
        ItemState::Handle => {
            let departure = core.actual_departure.unwrap_or(ctx.now);
            if ctx.now < departure {
                ctx.train.set_movement_state(MovementState::HandleAction);
                ctx.train.hold_speed_to_zero();
                return StepOutcome::Pending;
            }
            ctx.train.set_movement_state(MovementState::Stopped);
            core.state = ItemState::Stopped;
            info!(train = %ctx.train.train_id(), reference = %core.reference, at = %ctx.now, "waiting point departed");
            StepOutcome::DONE
        }
        ItemState::Stopped => StepOutcome::DONE,
    }
}

/// Entry actions: departure time, side effect, take the train over.
fn enter(core: &mut ItemCore, stop: &mut StopState, delay: Delay, ctx: &mut ActionContext<'_>) {
    if core.actual_departure.is_none() {
        core.actual_departure = Some(delay.departure(ctx.now));
    }
    if !stop.side_effects_done {
        stop.side_effects_done = true;
        match delay {
            Delay::UncoupleThenWait { cars, .. } => ctx.train.request_uncouple(cars),
            Delay::AttachUnconditional => {
                if !ctx.train.request_attach_to_nearest() {
                    warn!(train = %ctx.train.train_id(), "no train to attach to");
                }
            }
            Delay::RequestPermission => ctx.train.request_signal_permission(),
            Delay::PlainWait(_) | Delay::AbsoluteTimeOfDay(_) => {}
        }
    }
    ctx.train.set_movement_state(MovementState::HandleAction);
    ctx.train.hold_speed_to_zero();
    core.state = ItemState::Handle;
    debug!(
        reference = %core.reference,
        departure = ?core.actual_departure,
        "waiting point entered"
    );
}

/// Let go of a train this item is holding.
pub(crate) fn release(core: &ItemCore, ctx: &mut ActionContext<'_>) {
    if core.state == ItemState::Handle
        && ctx.train.movement_state() == MovementState::HandleAction
    {
        ctx.train.set_movement_state(MovementState::Stopped);
    }
}

// ── Shared speed control ─────────────────────────────────────────────────────

/// Steer toward the action point.  While the deceleration needed to stop
/// exactly there, `v²/(2·s)`, stays under [`BRAKE_FRACTION`] of the train's
/// maximum the train runs free; beyond that it brakes at exactly the needed
/// rate, which keeps it on a constant-deceleration curve ending at the point.
/// A train standing short of the point needs no deceleration and so creeps up.
pub(crate) fn approach(trigger: &TriggerPoint, ctx: &mut ActionContext<'_>) {
    let to_go = trigger.to_go(ctx.train.distance_travelled_m());
    if to_go <= 0.0 {
        ctx.train.hold_speed_to_zero();
        return;
    }
    let speed = ctx.train.speed_mps().max(0.0);
    let needed = speed * speed / (2.0 * to_go);
    if needed >= BRAKE_FRACTION * ctx.train.max_decel_mpss() {
        ctx.train.set_speed((speed - needed * ctx.elapsed_secs).max(0.0));
    }
}

/// Share of the maximum deceleration at which approach braking starts.
const BRAKE_FRACTION: f32 = 0.8;

/// `Braking`: decelerate at the train's maximum rate until the point is
/// reached or the train has come to a stand, then fall back to `Init`.
pub(crate) fn brake(core: &mut ItemCore, ctx: &mut ActionContext<'_>) {
    let to_go = core.trigger.to_go(ctx.train.distance_travelled_m());
    let speed = ctx.train.speed_mps();
    if to_go <= 0.0 || speed <= ctx.config.approach_tolerance_mps {
        core.state = ItemState::Init;
        debug!(reference = %core.reference, to_go, speed, "braking complete");
        return;
    }
    let decel = ctx.train.max_decel_mpss().max(0.0);
    ctx.train.set_speed((speed - decel * ctx.elapsed_secs).max(0.0));
}
