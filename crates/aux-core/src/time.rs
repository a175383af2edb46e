//! Simulated time model.
//!
//! # Design
//!
//! The host simulation clock is expressed as whole seconds since midnight of
//! the first simulated day (`SimTime`).  Action departure times, delays and
//! the save-file delay field are all integer seconds, so comparisons such as
//! `now >= actual_departure` are exact.  The host's per-tick step is a
//! fractional number of seconds; [`SimClock`] accumulates those steps and
//! exposes the whole-second view.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seconds in one simulated day.
pub const SECS_PER_DAY: i64 = 86_400;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulation clock reading, in seconds since midnight of day 0.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct SimTime(pub i64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Build a clock reading from a day number and time of day.
    pub fn from_day_time(day: i64, tod: TimeOfDay) -> SimTime {
        SimTime(day * SECS_PER_DAY + tod.secs_since_midnight())
    }

    /// Seconds since the midnight of the current day, in `0..86_400`.
    #[inline]
    pub fn secs_of_day(self) -> i64 {
        self.0.rem_euclid(SECS_PER_DAY)
    }

    /// Zero-based day number.
    #[inline]
    pub fn day(self) -> i64 {
        self.0.div_euclid(SECS_PER_DAY)
    }

    /// Wall-clock time of day for this reading.
    pub fn time_of_day(self) -> TimeOfDay {
        let s = self.secs_of_day();
        TimeOfDay {
            hour:   (s / 3_600) as u8,
            minute: ((s % 3_600) / 60) as u8,
            second: (s % 60) as u8,
        }
    }

    /// Seconds from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: SimTime) -> i64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<i64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: i64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: SimTime) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} {}", self.day(), self.time_of_day())
    }
}

// ── TimeOfDay ─────────────────────────────────────────────────────────────────

/// A wall-clock time of day.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour:   u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// `None` unless `hour < 24` and `minute < 60`.
    pub fn hm(hour: u8, minute: u8) -> Option<TimeOfDay> {
        (hour < 24 && minute < 60).then_some(TimeOfDay { hour, minute, second: 0 })
    }

    #[inline]
    pub fn secs_since_midnight(self) -> i64 {
        self.hour as i64 * 3_600 + self.minute as i64 * 60 + self.second as i64
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Accumulates fractional tick steps into a whole-second [`SimTime`].
///
/// Save files store the clock as its whole-second reading; the sub-second
/// remainder is dropped on restore.
#[derive(Clone, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct SimClock {
    /// Clock reading at construction.
    pub start: SimTime,
    /// Total simulated seconds elapsed since `start`.
    pub elapsed_secs: f64,
}

impl SimClock {
    pub fn new(start: SimTime) -> Self {
        Self { start, elapsed_secs: 0.0 }
    }

    /// Advance by one host tick of `dt_secs` seconds.
    #[inline]
    pub fn advance(&mut self, dt_secs: f32) {
        self.elapsed_secs += dt_secs.max(0.0) as f64;
    }

    /// Current whole-second clock reading.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.start + self.elapsed_secs.floor() as i64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.now().fmt(f)
    }
}
