//! CSV reference loader.
//!
//! # CSV format
//!
//! One row per reference, in route order.  Unused columns may be left empty.
//!
//! ```csv
//! kind,subroute,route_index,section,direction,distance,speed,delay,horn_secs,pattern,end_signal,associate
//! waiting_point,0,3,12,forward,80.0,0,45,,,,
//! horn,0,5,14,forward,20.0,,,4,us,,
//! delegate,0,7,16,forward,150.0,,30,,,41,1
//! waiting_point,0,7,16,forward,150.0,,60,,,,
//! crossing_horn,,,,,,,,5,us,,
//! ```
//!
//! **`kind`** field:
//!
//! | Value           | Reference                                             |
//! |-----------------|-------------------------------------------------------|
//! | `waiting_point` | stop with `delay` as a delay code                     |
//! | `horn`          | horn for `horn_secs` with `pattern` at the position   |
//! | `delegate`      | signal delegate for `end_signal` (next signal if empty) |
//! | `crossing_horn` | generic horn at every level crossing; placement unused |
//!
//! A `delegate` row with `associate = 1` must be followed directly by the
//! `waiting_point` row it cancels; the two are returned as one
//! [`ReferenceEntry::DelegatePair`].

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use aux_core::{Direction, RoutePlacement, SectionId, SignalId};

use crate::{ActionError, ActionKind, ActionReference, ActionResult, Delay, HornPattern, ReferenceEntry};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ReferenceRecord {
    kind:        String,
    subroute:    Option<u32>,
    route_index: Option<u32>,
    section:     Option<u32>,
    direction:   Option<String>,
    distance:    Option<f32>,
    speed:       Option<f32>,
    delay:       Option<i32>,
    horn_secs:   Option<u32>,
    pattern:     Option<String>,
    end_signal:  Option<u32>,
    associate:   Option<u8>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load reference entries from a CSV file.
pub fn load_references_csv(path: &Path) -> ActionResult<Vec<ReferenceEntry>> {
    let file = std::fs::File::open(path).map_err(ActionError::Io)?;
    load_references_reader(file)
}

/// Like [`load_references_csv`] but accepts any `Read` source.
pub fn load_references_reader<R: Read>(reader: R) -> ActionResult<Vec<ReferenceEntry>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();
    let mut open_delegate: Option<ActionReference> = None;

    for (line, result) in csv_reader.deserialize::<ReferenceRecord>().enumerate() {
        let row = result.map_err(|e| ActionError::Parse(e.to_string()))?;
        let associate = row.associate.unwrap_or(0) != 0;
        let reference = build_reference(&row)?;

        if let Some(delegate) = open_delegate.take() {
            if reference.kind != ActionKind::WaitingPoint
                || reference.placement.section != delegate.placement.section
            {
                return Err(ActionError::Parse(format!(
                    "row {}: an associated delegate must be followed by a waiting point in the same section",
                    line + 1
                )));
            }
            entries.push(ReferenceEntry::DelegatePair { delegate, waiting_point: reference });
            continue;
        }

        match reference.kind {
            ActionKind::SignalDelegate { .. } if associate => open_delegate = Some(reference),
            _ => entries.push(ReferenceEntry::Single(reference)),
        }
    }

    if open_delegate.is_some() {
        return Err(ActionError::Parse(
            "associated delegate at end of file has no waiting point".into(),
        ));
    }
    Ok(entries)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn build_reference(row: &ReferenceRecord) -> ActionResult<ActionReference> {
    let placement = RoutePlacement {
        subroute:    row.subroute.unwrap_or(0),
        route_index: row.route_index.unwrap_or(0),
        section:     row.section.map_or(SectionId::INVALID, SectionId),
        direction:   parse_direction(row.direction.as_deref().unwrap_or(""))?,
    };
    let distance = row.distance.unwrap_or(0.0);
    let pattern = HornPattern::parse(row.pattern.as_deref().unwrap_or(""))?;
    let delay = Delay::decode(row.delay.unwrap_or(0))?;

    let mut reference = match row.kind.trim() {
        "waiting_point" => ActionReference::waiting_point(placement, distance, delay),
        "horn" => ActionReference::horn(placement, distance, row.horn_secs.unwrap_or(0), pattern),
        "delegate" => ActionReference::signal_delegate(
            placement,
            distance,
            row.end_signal.map(SignalId),
            delay,
        ),
        "crossing_horn" => {
            return Ok(ActionReference::level_crossing_horn(row.horn_secs.unwrap_or(0), pattern));
        }
        other => return Err(ActionError::InvalidKind(other.to_owned())),
    };
    if placement.section == SectionId::INVALID {
        return Err(ActionError::Parse(format!("{} reference needs a section", reference.kind.name())));
    }
    reference.required_speed_mps = row.speed.unwrap_or(0.0).max(0.0);
    Ok(reference)
}

fn parse_direction(s: &str) -> ActionResult<Direction> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "forward" | "f" | "0" => Ok(Direction::Forward),
        "reverse" | "r" | "1" => Ok(Direction::Reverse),
        other => Err(ActionError::Parse(format!(
            "invalid direction {other:?}: expected \"forward\" or \"reverse\""
        ))),
    }
}
