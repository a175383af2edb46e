//! The per-tick bundle passed to every container and item call.

use aux_core::{SchedulerConfig, SimTime};

use crate::{SignalSystem, SoundFeedback, TrainHandle};

/// Everything an action needs for one tick of one train.
///
/// Built by the host once per train per tick.  The scheduler only ever holds
/// it for the duration of a single call; nothing borrowed here is retained.
pub struct ActionContext<'a> {
    /// Current whole-second clock reading.
    pub now: SimTime,

    /// Simulated seconds since the previous tick.
    pub elapsed_secs: f32,

    pub config: &'a SchedulerConfig,

    /// The train this container belongs to.
    pub train: &'a mut dyn TrainHandle,

    pub signals: &'a mut dyn SignalSystem,

    pub sound: &'a mut dyn SoundFeedback,
}

impl<'a> ActionContext<'a> {
    #[inline]
    pub fn new(
        now:          SimTime,
        elapsed_secs: f32,
        config:       &'a SchedulerConfig,
        train:        &'a mut dyn TrainHandle,
        signals:      &'a mut dyn SignalSystem,
        sound:        &'a mut dyn SoundFeedback,
    ) -> Self {
        Self { now, elapsed_secs, config, train, signals, sound }
    }
}
