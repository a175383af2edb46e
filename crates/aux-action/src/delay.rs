//! Delay codes — what a stop does before the train may leave.
//!
//! # Wire encoding
//!
//! Route files and save files carry the delay as one signed integer whose
//! meaning depends on its range:
//!
//! | Code            | Meaning                                                    |
//! |-----------------|------------------------------------------------------------|
//! | `0..=29999`     | wait this many seconds                                     |
//! | `3HHMM`         | wait until HH:MM                                           |
//! | `4NNSS`         | uncouple NN cars counted from the front, then wait SS s    |
//! | `5NNSS`         | uncouple keeping NN cars counted from the rear, then wait SS s |
//! | `60001`         | attach to the nearest train                                |
//! | `60002`         | request permission to pass the next signal                 |
//!
//! Anything else is rejected.  Inside the scheduler the code is always held
//! as a [`Delay`]; [`Delay::decode`] and [`Delay::encode`] convert at the
//! edges.

use aux_core::{SimTime, TimeOfDay, SECS_PER_DAY};
use aux_world::UncoupleCars;

use crate::{ActionError, ActionResult};

pub const ABSOLUTE_TIME_BASE: i32 = 30_000;
pub const UNCOUPLE_FRONT_BASE: i32 = 40_000;
pub const UNCOUPLE_REAR_BASE: i32 = 50_000;
pub const UNCOUPLE_END: i32 = 60_000;
pub const ATTACH_CODE: i32 = 60_001;
pub const PERMISSION_CODE: i32 = 60_002;

/// An absolute target less than this far in the past means "leave now";
/// further back means the same time tomorrow.
const HALF_DAY_SECS: i64 = SECS_PER_DAY / 2;

/// Decoded delay of a waiting point, horn or signal delegate.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Delay {
    PlainWait(u32),
    AbsoluteTimeOfDay(TimeOfDay),
    UncoupleThenWait { cars: UncoupleCars, wait_secs: u8 },
    AttachUnconditional,
    RequestPermission,
}

impl Default for Delay {
    fn default() -> Self {
        Delay::PlainWait(0)
    }
}

impl Delay {
    /// Decode a wire code.
    pub fn decode(code: i32) -> ActionResult<Delay> {
        match code {
            0..ABSOLUTE_TIME_BASE => Ok(Delay::PlainWait(code as u32)),
            ABSOLUTE_TIME_BASE..UNCOUPLE_FRONT_BASE => {
                let rest = code - ABSOLUTE_TIME_BASE;
                TimeOfDay::hm((rest / 100) as u8, (rest % 100) as u8)
                    .map(Delay::AbsoluteTimeOfDay)
                    .ok_or(ActionError::InvalidDelay(code))
            }
            UNCOUPLE_FRONT_BASE..UNCOUPLE_END => {
                let from_rear = code >= UNCOUPLE_REAR_BASE;
                let rest = code % 10_000;
                let n = (rest / 100) as u8;
                let cars = if from_rear { UncoupleCars::Rear(n) } else { UncoupleCars::Front(n) };
                Ok(Delay::UncoupleThenWait { cars, wait_secs: (rest % 100) as u8 })
            }
            ATTACH_CODE => Ok(Delay::AttachUnconditional),
            PERMISSION_CODE => Ok(Delay::RequestPermission),
            _ => Err(ActionError::InvalidDelay(code)),
        }
    }

    /// Encode to a wire code.  `decode(encode(d)) == d` for every valid `d`.
    ///
    /// Plain waits longer than 29 999 s and car counts or waits above 99 are
    /// clamped to the largest encodable value.
    pub fn encode(self) -> i32 {
        match self {
            Delay::PlainWait(secs) => secs.min(ABSOLUTE_TIME_BASE as u32 - 1) as i32,
            Delay::AbsoluteTimeOfDay(tod) => {
                ABSOLUTE_TIME_BASE + tod.hour as i32 * 100 + tod.minute as i32
            }
            Delay::UncoupleThenWait { cars, wait_secs } => {
                let (base, n) = match cars {
                    UncoupleCars::Front(n) => (UNCOUPLE_FRONT_BASE, n),
                    UncoupleCars::Rear(n) => (UNCOUPLE_REAR_BASE, n),
                };
                base + n.min(99) as i32 * 100 + wait_secs.min(99) as i32
            }
            Delay::AttachUnconditional => ATTACH_CODE,
            Delay::RequestPermission => PERMISSION_CODE,
        }
    }

    /// Seconds to wait, counted from `now`.
    pub fn remaining_wait(self, now: SimTime) -> i64 {
        match self {
            Delay::PlainWait(secs) => secs as i64,
            Delay::AbsoluteTimeOfDay(tod) => {
                let diff = tod.secs_since_midnight() - now.secs_of_day();
                if diff >= 0 {
                    diff
                } else if diff > -HALF_DAY_SECS {
                    0
                } else {
                    diff + SECS_PER_DAY
                }
            }
            Delay::UncoupleThenWait { wait_secs, .. } => wait_secs as i64,
            Delay::AttachUnconditional | Delay::RequestPermission => 0,
        }
    }

    /// Clock reading at which the wait ends.
    #[inline]
    pub fn departure(self, now: SimTime) -> SimTime {
        now + self.remaining_wait(now)
    }

    /// The wait left until `departure`, as written to a save file for an
    /// in-flight stop: reading it back at `now` yields the same departure.
    ///
    /// Anything too long for a plain code is written as the departure's time
    /// of day.  Only absolute-time stops wait that long, and they depart on a
    /// whole minute.
    pub fn remaining_until(departure: SimTime, now: SimTime) -> Delay {
        let secs = departure.since(now).max(0);
        if secs < i64::from(ABSOLUTE_TIME_BASE) {
            Delay::PlainWait(secs as u32)
        } else {
            Delay::AbsoluteTimeOfDay(departure.time_of_day())
        }
    }
}
