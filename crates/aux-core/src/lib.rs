//! `aux-core` — foundational types for the auxiliary action scheduler.
//!
//! This crate is a dependency of every other `aux-*` crate.  It has no
//! `aux-*` dependencies and few external ones (`thiserror`, `serde`, `toml`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `TrainId`, `SignalId`, `SectionId`, `RefId`, `ItemId`     |
//! | [`time`]        | `SimTime`, `TimeOfDay`, `SimClock`                        |
//! | [`route`]       | `Direction`, `RoutePlacement`, `RoutePosition`            |
//! | [`geo`]         | `WorldLocation`                                           |
//! | [`config`]      | `SchedulerConfig` (TOML-loadable)                         |
//! | [`error`]       | `AuxError`, `AuxResult`                                   |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod route;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SchedulerConfig;
pub use error::{AuxError, AuxResult};
pub use geo::WorldLocation;
pub use ids::{ItemId, RefId, SectionId, SignalId, TrainId};
pub use route::{Direction, RoutePlacement, RoutePosition};
pub use time::{SimClock, SimTime, TimeOfDay, SECS_PER_DAY};
