//! Train queries and commands.

use aux_core::{RoutePosition, TrainId};

/// The AI movement state machine of the host train.
///
/// The scheduler reads it and may temporarily replace it with
/// `HandleAction`; it never interprets the other states.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum MovementState {
    #[default]
    Stopped,
    StationStop,
    Braking,
    Accelerating,
    Running,
    Following,
    /// An auxiliary action currently owns the train.
    HandleAction,
    Suspended,
}

/// Which cars an uncouple request detaches.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum UncoupleCars {
    /// Detach this many cars counted from the front.
    Front(u8),
    /// Keep this many cars counted from the rear.
    Rear(u8),
}

/// Read-only view of the train the scheduler belongs to.
pub trait TrainView {
    fn train_id(&self) -> TrainId;

    /// Odometer of the train front, in metres.  Monotonically increasing.
    fn distance_travelled_m(&self) -> f32;

    fn speed_mps(&self) -> f32;

    /// Highest speed currently allowed on the route.
    fn max_speed_mps(&self) -> f32;

    fn max_accel_mpss(&self) -> f32;

    fn max_decel_mpss(&self) -> f32;

    fn length_m(&self) -> f32;

    /// Index of the subroute the train is currently running on.
    fn active_subroute(&self) -> u32;

    /// Route position of the train front.
    fn front_position(&self) -> RoutePosition;

    /// Distance along the planned route from `from` to `to`.
    ///
    /// `None` if either point cannot be resolved in the route as currently
    /// planned (e.g. the route has not been extended that far yet).
    fn route_distance_between(&self, from: RoutePosition, to: RoutePosition) -> Option<f32>;

    fn is_ai_controlled(&self) -> bool;

    /// `true` once the train has reached the end of its planned route.
    fn at_route_end(&self) -> bool;

    fn movement_state(&self) -> MovementState;
}

/// Commands the scheduler issues to the movement subsystem.
pub trait TrainControl {
    /// Brake toward standstill for this tick.
    fn hold_speed_to_zero(&mut self);

    /// Cap the speed for this tick.
    fn set_speed(&mut self, mps: f32);

    fn set_movement_state(&mut self, state: MovementState);

    fn request_uncouple(&mut self, cars: UncoupleCars);

    /// Start a coupling manoeuvre with the nearest compatible train.
    /// Returns `false` if no such train is available.
    fn request_attach_to_nearest(&mut self) -> bool;

    /// Ask the dispatcher for permission to pass the next signal.
    fn request_signal_permission(&mut self);
}

/// A train the scheduler can both query and command.
pub trait TrainHandle: TrainView + TrainControl {}

impl<T: TrainView + TrainControl> TrainHandle for T {}
