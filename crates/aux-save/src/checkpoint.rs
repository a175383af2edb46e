//! `Checkpoint` — every train's scheduled actions at one clock reading.
//!
//! Payload layout (inside the header):
//!
//! ```text
//! clock        i64   checkpoint clock, seconds since the simulation epoch
//! train_count  u32
//! per train:   train id u32, then a record list (see [`crate::codec`])
//! ```
//!
//! In-flight waits are written relative to the checkpoint clock (see
//! [`Container::snapshot_for_save`]), so a container restored with the clock
//! set back to the same reading resumes with the same time remaining.

use std::path::Path;

use aux_action::ReferenceEntry;
use aux_container::{ActionObserver, Container, ContainerBuilder};
use aux_core::{SimTime, TrainId};
use aux_world::TrainView;
use tracing::{debug, info};

use crate::codec::{decode_entries, encode_entries, put_i64, put_u32, Reader};
use crate::header::{unwrap_header, wrap_with_header};
use crate::{SaveError, SaveResult};

/// One train's saved references, in route order.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainRecord {
    pub train:   TrainId,
    pub entries: Vec<ReferenceEntry>,
}

/// Saved scheduler state of a whole simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub clock:  SimTime,
    pub trains: Vec<TrainRecord>,
}

impl Checkpoint {
    /// An empty checkpoint taken at `clock`.
    pub fn new(clock: SimTime) -> Self {
        Self { clock, trains: Vec::new() }
    }

    /// Snapshot one train's container at the checkpoint clock.
    pub fn add<O: ActionObserver>(&mut self, container: &Container<O>) {
        self.trains.push(TrainRecord {
            train:   container.train(),
            entries: container.snapshot_for_save(self.clock),
        });
    }

    /// The record for `train`, if it was saved.
    pub fn record(&self, train: TrainId) -> Option<&TrainRecord> {
        self.trains.iter().find(|r| r.train == train)
    }

    /// Rebuild `train`'s container.  `builder` carries whatever is not part
    /// of the save (generic hooks, observer); the saved references are
    /// registered after them, and delegate pairs are relinked.  A train with
    /// no record gets a container with no specific references.
    pub fn restore<T, O>(&self, train: &T, builder: ContainerBuilder<O>) -> SaveResult<Container<O>>
    where
        T: TrainView + ?Sized,
        O: ActionObserver,
    {
        let entries = match self.record(train.train_id()) {
            Some(record) => record.entries.clone(),
            None => {
                debug!(train = %train.train_id(), "no saved actions for train");
                Vec::new()
            }
        };
        let container = builder.entries(entries).build(train)?;
        debug!(
            train = %container.train(),
            references = container.specific_len(),
            "container restored"
        );
        Ok(container)
    }

    // ── Bytes ─────────────────────────────────────────────────────────────

    /// Encode with header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        put_i64(&mut payload, self.clock.0);
        put_u32(&mut payload, self.trains.len() as u32);
        for record in &self.trains {
            put_u32(&mut payload, record.train.0);
            encode_entries(&mut payload, &record.entries);
        }
        wrap_with_header(&payload)
    }

    /// Decode and validate.  Any defect rejects the whole checkpoint.
    pub fn from_bytes(bytes: &[u8]) -> SaveResult<Checkpoint> {
        let payload = unwrap_header(bytes)?;
        let mut r = Reader::new(payload);

        let clock = SimTime(r.i64()?);
        let train_count = r.u32()? as usize;
        let mut trains = Vec::with_capacity(train_count.min(1024));
        for _ in 0..train_count {
            let train = TrainId(r.u32()?);
            let entries = decode_entries(&mut r)?;
            trains.push(TrainRecord { train, entries });
        }
        if r.remaining() > 0 {
            return Err(SaveError::TrailingBytes(r.remaining()));
        }
        Ok(Checkpoint { clock, trains })
    }

    // ── Files ─────────────────────────────────────────────────────────────

    pub fn write(&self, path: impl AsRef<Path>) -> SaveResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes())?;
        info!(path = %path.display(), trains = self.trains.len(), clock = %self.clock, "checkpoint written");
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> SaveResult<Checkpoint> {
        let path = path.as_ref();
        let checkpoint = Checkpoint::from_bytes(&std::fs::read(path)?)?;
        info!(path = %path.display(), trains = checkpoint.trains.len(), clock = %checkpoint.clock, "checkpoint loaded");
        Ok(checkpoint)
    }
}

// ── Single-train shorthands ───────────────────────────────────────────────────

/// Save one container at clock `now`.
pub fn save_container<O: ActionObserver>(container: &Container<O>, now: SimTime) -> Vec<u8> {
    let mut checkpoint = Checkpoint::new(now);
    checkpoint.add(container);
    checkpoint.to_bytes()
}

/// Restore one container from bytes written by [`save_container`].
///
/// # Errors
///
/// Any header, record or association defect rejects the load; no container
/// is returned.
pub fn load_container<T, O>(bytes: &[u8], train: &T, builder: ContainerBuilder<O>) -> SaveResult<Container<O>>
where
    T: TrainView + ?Sized,
    O: ActionObserver,
{
    Checkpoint::from_bytes(bytes)?.restore(train, builder)
}
