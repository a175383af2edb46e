//! Route placement: where along a train's planned path an action applies.
//!
//! A train's planned path is a list of subroutes (split at reversal points),
//! each an ordered list of track-circuit sections.  An action is pinned to
//! one section of one subroute plus an offset inside that section.

use serde::{Deserialize, Serialize};

use crate::SectionId;

/// Direction in which a section is traversed by the route.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// Integer form used by the save file.
    pub fn code(self) -> i32 {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }

    pub fn from_code(code: i32) -> Option<Direction> {
        match code {
            0 => Some(Direction::Forward),
            1 => Some(Direction::Reverse),
            _ => None,
        }
    }
}

/// Identifies where along the planned path an action reference applies.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct RoutePlacement {
    /// Index of the subroute (0 = first leg, incremented at each reversal).
    pub subroute: u32,
    /// Index of the section within the subroute's section list, as planned.
    pub route_index: u32,
    /// Track-circuit section the action lies in.
    pub section: SectionId,
    pub direction: Direction,
}

/// A point on the route: a section plus the distance into it.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct RoutePosition {
    pub section: SectionId,
    pub offset_m: f32,
}

impl RoutePosition {
    pub fn new(section: SectionId, offset_m: f32) -> Self {
        Self { section, offset_m }
    }
}
