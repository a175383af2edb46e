//! `aux-action` — action references, delay codes, trigger placement and the
//! per-item state machine.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                      |
//! |-------------------|---------------------------------------------------------------|
//! | [`delay`]         | `Delay` and its integer wire encoding                         |
//! | [`reference`]     | `ActionReference`, `ActionKind`, `HornPattern`, `EventSource`, `ReferenceEntry` |
//! | [`trigger`]       | `TriggerPoint`, `SpeedPolicy`, `calculate_trigger`            |
//! | [`item`]          | `ActionItem`, `ItemState`, `StepOutcome`                      |
//! | `waiting_point`   | stop / side effect / hold (private)                           |
//! | `horn`            | blast pattern and bell (private)                              |
//! | `delegate`        | signal lock and clearance (private)                           |
//! | [`lock`]          | `SignalLock` — a held lock as a consumable token              |
//! | [`loader`]        | `load_references_csv`, `load_references_reader`               |
//! | [`error`]         | `ActionError`, `ActionResult<T>`                              |
//!
//! # Lifecycle (summary)
//!
//! ```text
//! ActionReference ──calculate_trigger──► TriggerPoint
//!        │                                   │ reached
//!        └──────────────handler──────────────┴──► ActionItem ──advance──► … ──► Stopped
//! ```
//!
//! References are owned by the train's container and never mutated after
//! registration.  Items hold only the reference's id; the container hands the
//! reference back in on every `advance`.

pub mod delay;
pub mod error;
pub mod item;
pub mod loader;
pub mod lock;
pub mod reference;
pub mod trigger;

mod delegate;
mod horn;
mod waiting_point;


pub use delay::Delay;
pub use error::{ActionError, ActionResult};
pub use item::{ActionItem, ItemState, StepOutcome};
pub use loader::{load_references_csv, load_references_reader};
pub use lock::SignalLock;
pub use reference::{ActionKind, ActionReference, EventSource, HornPattern, ReferenceEntry};
pub use trigger::{calculate_trigger, SpeedPolicy, TriggerPoint, ARRIVAL_WINDOW_M};
