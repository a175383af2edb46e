//! Sound and cab feedback.  Fire-and-forget.

/// Whether the train's bell is ringing.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum BellState {
    #[default]
    Off,
    Ringing,
}

/// Audible feedback commands.  Nothing returned here is consumed.
pub trait SoundFeedback {
    fn start_horn(&mut self);
    fn stop_horn(&mut self);
    fn set_bell(&mut self, state: BellState);
}

/// A [`SoundFeedback`] that discards every command.
///
/// Useful for headless hosts and for trains without audio.
pub struct NoopSound;

impl SoundFeedback for NoopSound {
    fn start_horn(&mut self) {}
    fn stop_horn(&mut self) {}
    fn set_bell(&mut self, _state: BellState) {}
}
