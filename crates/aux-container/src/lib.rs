//! `aux-container` — everything one train has scheduled.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                       |
//! |---------------|----------------------------------------------------------------|
//! | [`container`] | `Container<O>` — registration, arming, advancing, persistence  |
//! | [`builder`]   | `ContainerBuilder` — fluent construction for a train           |
//! | [`pending`]   | `PendingQueue` — live items ordered by trigger distance        |
//! | [`registry`]  | `GenericRegistry` — event-source hooks and their memo          |
//! | [`observer`]  | `ActionObserver`, `NoopObserver`                               |
//! | [`error`]     | `ContainerError`, `ContainerResult<T>`                         |
//!
//! # Per-tick flow
//!
//! ```text
//! host tick for train T:
//!   ① check_event_source(..)  — zero or more times, as crossings come into view
//!   ② update(ctx)
//!        arm_reachable     — specific queue head → pending_specific
//!        advance_pending   — step every live item once, then apply
//!                            completions and delegate cancellations
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use aux_container::ContainerBuilder;
//!
//! let mut container = ContainerBuilder::new().entries(entries).build(&world.train)?;
//! loop {
//!     let mut ctx = world.context(clock.now(), dt, &config);
//!     container.update(&mut ctx);
//!     world.step(dt);
//! }
//! ```

pub mod builder;
pub mod container;
pub mod error;
pub mod observer;
pub mod pending;
pub mod registry;

#[cfg(test)]
mod tests;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use error::{ContainerError, ContainerResult};
pub use observer::{ActionObserver, NoopObserver};
pub use pending::PendingQueue;
pub use registry::GenericRegistry;
