//! Action references — the templates items are armed from.
//!
//! A reference says *what* to do (its [`ActionKind`] and [`Delay`]) and
//! *where*: either a [`RoutePlacement`] on the train's planned path
//! (a *specific* reference), or an [`EventSource`] kind reported by the world
//! (a *generic* reference, e.g. "any level crossing").
//!
//! References do not change once registered.  The only per-reference
//! runtime state ("is an item currently armed from it?") lives in the
//! owning container.

use aux_core::{ItemId, RefId, RoutePlacement, SignalId};
use tracing::debug;

use crate::item::ActionItem;
use crate::{ActionError, ActionResult, Delay, SignalLock, TriggerPoint};

// ── Kinds ─────────────────────────────────────────────────────────────────────

/// World event kinds generic references can listen to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum EventSource {
    LevelCrossing,
}

/// How the horn is sounded.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum HornPattern {
    /// One continuous blast for the whole duration.
    #[default]
    Single,
    /// Long, long, short, long, with the bell ringing throughout.
    UsCrossing,
}

impl HornPattern {
    /// Long blast length of the crossing pattern, in seconds.
    const LONG_SECS: i64 = 3;
    const SHORT_SECS: i64 = 1;
    const GAP_SECS: i64 = 1;

    /// Blast windows `(start, end)` in seconds from the horn start.  The
    /// last window ends at the total horn duration.
    pub fn blasts(self, duration_secs: i64) -> Vec<(i64, i64)> {
        match self {
            HornPattern::Single => vec![(0, duration_secs.max(1))],
            HornPattern::UsCrossing => {
                let (l, s, g) = (Self::LONG_SECS, Self::SHORT_SECS, Self::GAP_SECS);
                let third = l + g + l + g;
                let fourth = third + s + g;
                vec![
                    (0, l),
                    (l + g, l + g + l),
                    (third, third + s),
                    (fourth, (fourth + l).max(duration_secs)),
                ]
            }
        }
    }

    /// Whether the bell accompanies this pattern.
    #[inline]
    pub fn rings_bell(self) -> bool {
        matches!(self, HornPattern::UsCrossing)
    }

    pub fn code(self) -> i32 {
        match self {
            HornPattern::Single => 0,
            HornPattern::UsCrossing => 1,
        }
    }

    pub fn from_code(code: i32) -> Option<HornPattern> {
        match code {
            0 => Some(HornPattern::Single),
            1 => Some(HornPattern::UsCrossing),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> ActionResult<HornPattern> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "single" => Ok(HornPattern::Single),
            "us" | "us_crossing" => Ok(HornPattern::UsCrossing),
            other => Err(ActionError::InvalidHornPattern(other.to_owned())),
        }
    }
}

/// Kind-specific parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionKind {
    /// Stop and wait.
    WaitingPoint,

    /// Sound the horn for the reference's delay, in seconds.
    SoundHorn { pattern: HornPattern },

    /// Take over clearance of `end_signal` (or the train's next signal when
    /// `None`) until the delay expires.
    SignalDelegate {
        end_signal:    Option<SignalId>,
        /// Waiting point cancelled when this delegate completes.  Filled in
        /// by the container when the pair is registered.
        associated_wp: Option<RefId>,
    },
}

impl ActionKind {
    /// Save-file discriminant.
    pub fn tag(&self) -> u8 {
        match self {
            ActionKind::WaitingPoint => 1,
            ActionKind::SoundHorn { .. } => 2,
            ActionKind::SignalDelegate { .. } => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::WaitingPoint => "waiting_point",
            ActionKind::SoundHorn { .. } => "sound_horn",
            ActionKind::SignalDelegate { .. } => "signal_delegate",
        }
    }
}

// ── ActionReference ───────────────────────────────────────────────────────────

/// Template for one scheduled behaviour.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReference {
    pub kind: ActionKind,

    /// Ignored when `generic` is set.
    pub placement: RoutePlacement,

    /// Offset inside `placement.section` at which the action applies.
    pub required_distance_m: f32,

    /// Speed the train must be at when it reaches the action point.
    pub required_speed_mps: f32,

    /// Extra trigger lookahead accumulated for this reference.
    pub trigger_margin_m: f32,

    pub delay: Delay,

    /// Set for references triggered by world events instead of route position.
    pub generic: Option<EventSource>,

    /// Signal this reference's delegate held locked when the game was saved.
    pub locked_signal: Option<SignalId>,
}

impl ActionReference {
    fn new(kind: ActionKind, placement: RoutePlacement, required_distance_m: f32, delay: Delay) -> Self {
        Self {
            kind,
            placement,
            required_distance_m,
            required_speed_mps: 0.0,
            trigger_margin_m:   0.0,
            delay,
            generic:            None,
            locked_signal:      None,
        }
    }

    /// A stop at `required_distance_m` into the placement's section.
    pub fn waiting_point(placement: RoutePlacement, required_distance_m: f32, delay: Delay) -> Self {
        Self::new(ActionKind::WaitingPoint, placement, required_distance_m, delay)
    }

    /// A horn sounded on passing a route position.
    pub fn horn(
        placement:           RoutePlacement,
        required_distance_m: f32,
        duration_secs:       u32,
        pattern:             HornPattern,
    ) -> Self {
        Self::new(
            ActionKind::SoundHorn { pattern },
            placement,
            required_distance_m,
            Delay::PlainWait(duration_secs),
        )
    }

    /// A horn sounded at every level crossing the train approaches.
    pub fn level_crossing_horn(duration_secs: u32, pattern: HornPattern) -> Self {
        let mut r = Self::horn(RoutePlacement::default(), 0.0, duration_secs, pattern);
        r.generic = Some(EventSource::LevelCrossing);
        r
    }

    /// A signal delegate for `end_signal` (or the next signal when `None`).
    pub fn signal_delegate(
        placement:           RoutePlacement,
        required_distance_m: f32,
        end_signal:          Option<SignalId>,
        delay:               Delay,
    ) -> Self {
        Self::new(
            ActionKind::SignalDelegate { end_signal, associated_wp: None },
            placement,
            required_distance_m,
            delay,
        )
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.generic.is_some()
    }

    /// The associated waiting point of a delegate.
    pub fn associated_wp(&self) -> Option<RefId> {
        match self.kind {
            ActionKind::SignalDelegate { associated_wp, .. } => associated_wp,
            _ => None,
        }
    }

    /// Produce an item for this reference.
    ///
    /// Returns `None` when an item derived from a specific reference is
    /// already live (`linked`): a specific reference is armed at most once
    /// at a time.  Generic references always produce a fresh item.
    ///
    /// `restored` hands a delegate the signal lock it held when the game was
    /// saved.  It must only be passed for a reference that is not `linked`.
    pub fn handler(
        &self,
        this:       RefId,
        linked:     bool,
        item:       ItemId,
        trigger:    TriggerPoint,
        restored:   Option<SignalLock>,
    ) -> Option<ActionItem> {
        if linked && !self.is_generic() {
            debug_assert!(restored.is_none(), "restored lock offered to a linked reference");
            return None;
        }
        debug!(reference = %this, kind = self.kind.name(), trigger_m = trigger.trigger_m, "arming");
        Some(ActionItem::new(item, this, self, trigger, restored))
    }
}

// ── Entries ───────────────────────────────────────────────────────────────────

/// A unit of registration: one reference, or a delegate and the waiting
/// point it cancels on completion.
///
/// Loaders (CSV, save file) produce entries in route order; containers
/// register them in that order.
#[derive(Clone, Debug, PartialEq)]
pub enum ReferenceEntry {
    Single(ActionReference),
    DelegatePair {
        delegate:      ActionReference,
        waiting_point: ActionReference,
    },
}
