//! `aux-world` — the narrow interfaces the scheduler needs from the host.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                          |
//! |-------------|-------------------------------------------------------------------|
//! | [`train`]   | `TrainView` (queries), `TrainControl` (commands), `MovementState` |
//! | [`signal`]  | `SignalSystem`, `SignalAspect`                                    |
//! | [`sound`]   | `SoundFeedback`, `BellState`, `NoopSound`                         |
//! | [`context`] | `ActionContext<'a>` — the per-tick bundle handed to every item    |
//! | [`line`]    | `LineWorld` — a single-line implementation of every interface     |
//!
//! # Design notes
//!
//! The scheduler never computes physics or signal aspects.  Every
//! interaction with the movement and signal subsystems is a query or a
//! command whose outcome is a `bool` or an enum; nothing here returns
//! `Result`.  `LineWorld` is a complete, deterministic host used by the
//! test suites and the demo binary.

pub mod context;
pub mod line;
pub mod signal;
pub mod sound;
pub mod train;


pub use context::ActionContext;
pub use line::{LineSection, LineSignals, LineTrain, LineWorld, SoundEvent, SoundLog};
pub use signal::{SignalAspect, SignalSystem};
pub use sound::{BellState, NoopSound, SoundFeedback};
pub use train::{MovementState, TrainControl, TrainHandle, TrainView, UncoupleCars};
