//! Reference record codec.
//!
//! A record list is a record count followed by that many records.  Each
//! record is (little-endian):
//!
//! ```text
//! tag            u8    1 waiting point, 2 horn, 3 signal delegate
//! subroute       i32
//! route_index    i32
//! section        i32
//! direction      i32   0 forward, 1 reverse
//! distance_m     f32
//! speed_mps      f32
//! margin_m       f32
//! delay          i32   delay code
//! generic        u8    0 / 1
//! locked_signal  i32   -1 = none
//! ── horn only ──
//! pattern        i32
//! ── delegate only ──
//! end_signal     i32   -1 = none
//! associate      u8    1 = the next record is this delegate's waiting point
//! ```
//!
//! Associations are reconstructed from record order; a delegate's
//! associated waiting point is always the record right after it and counts
//! toward the record count.

use aux_action::{ActionKind, ActionReference, Delay, EventSource, HornPattern, ReferenceEntry};
use aux_core::{Direction, RoutePlacement, SectionId, SignalId};

use crate::{SaveError, SaveResult};

const NO_SIGNAL: i32 = -1;

const TAG_WAITING_POINT: u8 = 1;
const TAG_HORN: u8 = 2;
const TAG_DELEGATE: u8 = 3;

// ── Writing ───────────────────────────────────────────────────────────────────

/// Append `entries` as a counted record list.
pub fn encode_entries(out: &mut Vec<u8>, entries: &[ReferenceEntry]) {
    let count: usize = entries
        .iter()
        .map(|e| match e {
            ReferenceEntry::Single(_) => 1,
            ReferenceEntry::DelegatePair { .. } => 2,
        })
        .sum();
    put_i32(out, count as i32);
    for entry in entries {
        match entry {
            ReferenceEntry::Single(r) => put_record(out, r, false),
            ReferenceEntry::DelegatePair { delegate, waiting_point } => {
                put_record(out, delegate, true);
                put_record(out, waiting_point, false);
            }
        }
    }
}

fn put_record(out: &mut Vec<u8>, r: &ActionReference, associate: bool) {
    out.push(r.kind.tag());
    put_i32(out, r.placement.subroute as i32);
    put_i32(out, r.placement.route_index as i32);
    put_i32(out, r.placement.section.0 as i32);
    put_i32(out, r.placement.direction.code());
    put_f32(out, r.required_distance_m);
    put_f32(out, r.required_speed_mps);
    put_f32(out, r.trigger_margin_m);
    put_i32(out, r.delay.encode());
    out.push(u8::from(r.is_generic()));
    put_i32(out, signal_code(r.locked_signal));
    match &r.kind {
        ActionKind::WaitingPoint => {}
        ActionKind::SoundHorn { pattern } => put_i32(out, pattern.code()),
        ActionKind::SignalDelegate { end_signal, .. } => {
            put_i32(out, signal_code(*end_signal));
            out.push(u8::from(associate));
        }
    }
}

pub(crate) fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_i64(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn signal_code(signal: Option<SignalId>) -> i32 {
    signal.map_or(NO_SIGNAL, |s| s.0 as i32)
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Little-endian cursor over a payload.  Every read past the end is
/// [`SaveError::Truncated`].
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> SaveResult<[u8; N]> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + N)
            .ok_or(SaveError::Truncated(self.pos))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> SaveResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub(crate) fn i32(&mut self) -> SaveResult<i32> {
        self.take().map(i32::from_le_bytes)
    }

    pub(crate) fn u32(&mut self) -> SaveResult<u32> {
        self.take().map(u32::from_le_bytes)
    }

    pub(crate) fn i64(&mut self) -> SaveResult<i64> {
        self.take().map(i64::from_le_bytes)
    }

    fn f32(&mut self) -> SaveResult<f32> {
        self.take().map(f32::from_le_bytes)
    }

    fn flag(&mut self, field: &'static str) -> SaveResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(SaveError::InvalidField { field, value: v.into() }),
        }
    }

    /// Bytes not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Read a counted record list, relinking delegate pairs.
pub(crate) fn decode_entries(r: &mut Reader<'_>) -> SaveResult<Vec<ReferenceEntry>> {
    let count = non_negative(r.i32()?, "record count")?;
    let mut entries = Vec::with_capacity(count.min(1024));
    let mut read = 0;
    while read < count {
        let (reference, associate) = read_record(r)?;
        read += 1;
        if !associate {
            entries.push(ReferenceEntry::Single(reference));
            continue;
        }
        if read == count {
            return Err(SaveError::BrokenAssociation(
                "delegate flags a waiting point but the list ends".into(),
            ));
        }
        let (waiting_point, _) = read_record(r)?;
        read += 1;
        if waiting_point.kind != ActionKind::WaitingPoint {
            return Err(SaveError::BrokenAssociation(format!(
                "delegate followed by {} instead of a waiting point",
                waiting_point.kind.name()
            )));
        }
        entries.push(ReferenceEntry::DelegatePair { delegate: reference, waiting_point });
    }
    Ok(entries)
}

/// One record plus its "associate follows" flag.
fn read_record(r: &mut Reader<'_>) -> SaveResult<(ActionReference, bool)> {
    let tag = r.u8()?;
    if !matches!(tag, TAG_WAITING_POINT | TAG_HORN | TAG_DELEGATE) {
        return Err(SaveError::UnexpectedTag(tag));
    }

    let subroute = non_negative(r.i32()?, "subroute")? as u32;
    let route_index = non_negative(r.i32()?, "route index")? as u32;
    let section = SectionId(non_negative(r.i32()?, "section")? as u32);
    let dir_code = r.i32()?;
    let direction = Direction::from_code(dir_code)
        .ok_or(SaveError::InvalidField { field: "direction", value: dir_code.into() })?;
    let placement = RoutePlacement { subroute, route_index, section, direction };

    let required_distance_m = r.f32()?;
    let required_speed_mps = r.f32()?;
    let trigger_margin_m = r.f32()?;
    let delay_code = r.i32()?;
    let delay = Delay::decode(delay_code)
        .map_err(|_| SaveError::InvalidField { field: "delay", value: delay_code.into() })?;
    let generic = r.flag("generic flag")?.then_some(EventSource::LevelCrossing);
    let locked_signal = read_signal(r, "locked signal")?;

    let mut associate = false;
    let kind = match tag {
        TAG_WAITING_POINT => ActionKind::WaitingPoint,
        TAG_HORN => {
            let code = r.i32()?;
            let pattern = HornPattern::from_code(code)
                .ok_or(SaveError::InvalidField { field: "horn pattern", value: code.into() })?;
            ActionKind::SoundHorn { pattern }
        }
        _ => {
            let end_signal = read_signal(r, "end signal")?;
            associate = r.flag("associate flag")?;
            ActionKind::SignalDelegate { end_signal, associated_wp: None }
        }
    };

    let reference = ActionReference {
        kind,
        placement,
        required_distance_m,
        required_speed_mps,
        trigger_margin_m,
        delay,
        generic,
        locked_signal,
    };
    Ok((reference, associate))
}

fn read_signal(r: &mut Reader<'_>, field: &'static str) -> SaveResult<Option<SignalId>> {
    match r.i32()? {
        NO_SIGNAL => Ok(None),
        v if v >= 0 => Ok(Some(SignalId(v as u32))),
        v => Err(SaveError::InvalidField { field, value: v.into() }),
    }
}

fn non_negative(v: i32, field: &'static str) -> SaveResult<usize> {
    usize::try_from(v).map_err(|_| SaveError::InvalidField { field, value: v.into() })
}
