//! Scheduler configuration.
//!
//! Typically loaded from a TOML file by the host application and shared by
//! every train's action container.  Every field has a default, so a partial
//! file (or an empty one) is valid:
//!
//! ```toml
//! bell_extra_secs  = 30
//! horn_lookahead_m = 250.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AuxError, AuxResult};

/// Tunables for trigger placement and timed behaviours.
#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds the bell keeps ringing after a horn sequence ends.
    pub bell_extra_secs: i64,

    /// Distance before a level crossing at which a horn item arms.
    pub horn_lookahead_m: f32,

    /// Extra lookahead for signal-delegate triggers, added to train length.
    pub delegate_lookahead_m: f32,

    /// Minimum gap between a trigger distance and its activation distance.
    pub min_trigger_margin_m: f32,

    /// Speed at or below which a braking train counts as stopped.
    pub approach_tolerance_mps: f32,

    /// Horn duration used when a reference carries none.
    pub default_horn_secs: i64,

    /// Two event locations closer than this are the same physical object.
    pub location_match_m: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bell_extra_secs:        30,
            horn_lookahead_m:       200.0,
            delegate_lookahead_m:   50.0,
            min_trigger_margin_m:   10.0,
            approach_tolerance_mps: 0.1,
            default_horn_secs:      3,
            location_match_m:       1.0,
        }
    }
}

impl SchedulerConfig {
    /// Parse a TOML document.  Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> AuxResult<Self> {
        let config: SchedulerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> AuxResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values that would make trigger placement meaningless.
    pub fn validate(&self) -> AuxResult<()> {
        if self.bell_extra_secs < 0 || self.default_horn_secs < 0 {
            return Err(AuxError::Config("durations must be non-negative".into()));
        }
        let distances = [
            ("horn_lookahead_m", self.horn_lookahead_m),
            ("delegate_lookahead_m", self.delegate_lookahead_m),
            ("min_trigger_margin_m", self.min_trigger_margin_m),
            ("approach_tolerance_mps", self.approach_tolerance_mps),
            ("location_match_m", self.location_match_m),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(AuxError::Config(format!("{name} must be a non-negative number, got {value}")));
            }
        }
        Ok(())
    }
}
