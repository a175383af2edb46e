//! Trigger placement.
//!
//! Every specific reference is turned into three odometer readings of the
//! train front:
//!
//! ```text
//!   trigger_m  ≤  activation_m  ≤  action_m
//!   (arm item)    (start acting)   (required position)
//! ```
//!
//! For a waiting point `activation_m` is where braking must begin so the
//! train reaches `action_m` at the required speed.  With room to spare the
//! train may first keep accelerating; the spare distance is split between an
//! acceleration phase and the extra braking it causes in the ratio
//! `decel : accel` (equal-speed meeting point of the two ½·a·t² curves).
//! A train that can no longer stop in time gets `activation_m = now`.
//!
//! Horns and signal delegates do not brake: `activation_m = action_m` and
//! the trigger sits a fixed lookahead before it.

use aux_core::{RoutePosition, SchedulerConfig};
use aux_world::TrainView;
use tracing::warn;

use crate::{ActionKind, ActionReference};

/// Speed assumed when placing a braking curve.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SpeedPolicy {
    /// The train's present speed, used when recalculating live items.
    Current,
    /// The highest allowed speed, used when a reference is first placed.
    MaxAllowed,
}

/// Odometer readings at which an item arms, starts acting, and must have
/// completed its approach.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct TriggerPoint {
    pub trigger_m:    f32,
    pub activation_m: f32,
    pub action_m:     f32,
}

impl TriggerPoint {
    /// `true` once the train has travelled at least to the trigger.
    #[inline]
    pub fn reached(&self, distance_travelled_m: f32) -> bool {
        distance_travelled_m >= self.trigger_m
    }

    /// Distance left to the action point.
    #[inline]
    pub fn to_go(&self, distance_travelled_m: f32) -> f32 {
        self.action_m - distance_travelled_m
    }

    /// `true` once the train front is within [`ARRIVAL_WINDOW_M`] of the
    /// action point, or past it.
    #[inline]
    pub fn arrived(&self, distance_travelled_m: f32) -> bool {
        self.to_go(distance_travelled_m) <= ARRIVAL_WINDOW_M
    }
}

/// A train this close to its action point counts as standing at it.
pub const ARRIVAL_WINDOW_M: f32 = 0.5;

const MIN_RATE_MPSS: f32 = 1e-3;

/// Place `reference` relative to the train's current position.
///
/// Returns `None` while the reference's section cannot be resolved in the
/// train's planned route.  That is not an error: the caller retries on a
/// later tick.
pub fn calculate_trigger<T: TrainView + ?Sized>(
    reference: &ActionReference,
    train:     &T,
    policy:    SpeedPolicy,
    config:    &SchedulerConfig,
) -> Option<TriggerPoint> {
    let target = RoutePosition::new(reference.placement.section, reference.required_distance_m);
    let to_go = train.route_distance_between(train.front_position(), target)?;
    let travelled = train.distance_travelled_m();
    let action_m = travelled + to_go;

    let point = match reference.kind {
        ActionKind::WaitingPoint => {
            let activation_m = braking_activation(reference, train, policy, travelled, to_go);
            let margin = reference.trigger_margin_m.max(config.min_trigger_margin_m);
            TriggerPoint { trigger_m: activation_m - margin, activation_m, action_m }
        }
        ActionKind::SoundHorn { .. } => {
            let lookahead = reference.trigger_margin_m.max(config.horn_lookahead_m);
            TriggerPoint { trigger_m: action_m - lookahead, activation_m: action_m, action_m }
        }
        ActionKind::SignalDelegate { .. } => {
            let lookahead = reference.trigger_margin_m.max(config.delegate_lookahead_m)
                + train.length_m();
            TriggerPoint { trigger_m: action_m - lookahead, activation_m: action_m, action_m }
        }
    };
    Some(point)
}

/// Odometer reading at which braking toward the action point must begin.
fn braking_activation<T: TrainView + ?Sized>(
    reference: &ActionReference,
    train:     &T,
    policy:    SpeedPolicy,
    travelled: f32,
    to_go:     f32,
) -> f32 {
    let speed = match policy {
        SpeedPolicy::Current => train.speed_mps(),
        SpeedPolicy::MaxAllowed => train.max_speed_mps().max(train.speed_mps()),
    }
    .max(0.0);
    let accel = train.max_accel_mpss().max(MIN_RATE_MPSS);
    let decel = train.max_decel_mpss().max(MIN_RATE_MPSS);
    let required = reference.required_speed_mps.clamp(0.0, speed);

    let braking_m = (speed * speed - required * required) / (2.0 * decel);
    let spare_m = to_go - braking_m;

    if spare_m >= 0.0 {
        // Below line speed the train keeps accelerating into part of the
        // spare distance; at line speed it coasts through all of it.
        let run_on_m = if speed < train.max_speed_mps() {
            spare_m * decel / (accel + decel)
        } else {
            spare_m
        };
        return travelled + run_on_m;
    }

    let overshoot_m = -spare_m;
    if overshoot_m > train.length_m() {
        warn!(
            train = %train.train_id(),
            overshoot_m,
            "stop cannot be reached in time; braking from current position"
        );
    }
    travelled
}
