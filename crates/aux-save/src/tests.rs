//! Unit tests for aux-save.

use aux_action::{ActionReference, Delay, HornPattern, ItemState, ReferenceEntry};
use aux_container::{Container, ContainerBuilder};
use aux_core::{RoutePlacement, SchedulerConfig, SectionId, SignalId, SimTime, TimeOfDay, TrainId};
use aux_world::{LineSection, LineTrain, LineWorld};

use crate::codec::put_i64;
use crate::{
    encode_entries, load_container, save_container, unwrap_header, wrap_with_header, Checkpoint,
    SaveError, TrainRecord, FORMAT_VERSION, HEADER_SIZE, MAGIC,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn placement(section: u32) -> RoutePlacement {
    RoutePlacement { section: SectionId(section), ..RoutePlacement::default() }
}

fn line() -> LineWorld {
    LineWorld::new(LineTrain::new(TrainId(1), vec![LineSection { id: SectionId(0), length_m: 1_000.0, subroute: 0 }]))
}

fn stop(at_m: f32, delay: Delay) -> ActionReference {
    ActionReference::waiting_point(placement(0), at_m, delay)
}

fn pair(at_m: f32, wp_secs: u32, delegate_secs: u32) -> ReferenceEntry {
    ReferenceEntry::DelegatePair {
        delegate:      ActionReference::signal_delegate(placement(0), at_m, None, Delay::PlainWait(delegate_secs)),
        waiting_point: stop(at_m, Delay::PlainWait(wp_secs)),
    }
}

/// A one-train payload around an already encoded record list.
fn payload_with_records(records: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    put_i64(&mut payload, 0);
    payload.extend_from_slice(&1u32.to_le_bytes());
    payload.extend_from_slice(&1u32.to_le_bytes());
    payload.extend_from_slice(records);
    payload
}

fn tick(container: &mut Container, world: &mut LineWorld, config: &SchedulerConfig, t: i64) {
    {
        let mut ctx = world.context(SimTime(t), 1.0, config);
        container.update(&mut ctx);
    }
    world.step(1.0);
}

// ── Header ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod header {
    use super::*;

    #[test]
    fn wrap_and_unwrap() {
        let data = b"scheduler payload";
        let wrapped = wrap_with_header(data);
        assert_eq!(&wrapped[..4], &MAGIC);
        assert_eq!(wrapped.len(), HEADER_SIZE + data.len());
        assert_eq!(unwrap_header(&wrapped).unwrap(), data);
    }

    #[test]
    fn foreign_file_is_bad_magic() {
        assert!(matches!(unwrap_header(b"MEGA0000000000000000"), Err(SaveError::BadMagic)));
        assert!(matches!(unwrap_header(b""), Err(SaveError::BadMagic)));
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut wrapped = wrap_with_header(b"x");
        wrapped[4..8].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        assert!(matches!(
            unwrap_header(&wrapped),
            Err(SaveError::NewerVersion { found, supported }) if found == FORMAT_VERSION + 1 && supported == FORMAT_VERSION
        ));
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let mut wrapped = wrap_with_header(b"some payload bytes");
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0x40;
        assert!(matches!(unwrap_header(&wrapped), Err(SaveError::Checksum { .. })));
    }

    #[test]
    fn cut_file_is_truncated() {
        let wrapped = wrap_with_header(b"0123456789");
        assert!(matches!(unwrap_header(&wrapped[..10]), Err(SaveError::Truncated(_))));
        assert!(matches!(unwrap_header(&wrapped[..wrapped.len() - 1]), Err(SaveError::Truncated(_))));
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod records {
    use super::*;

    #[test]
    fn checkpoint_bytes_preserve_every_kind() {
        let mut horn = ActionReference::horn(placement(2), 40.0, 4, HornPattern::UsCrossing);
        horn.trigger_margin_m = 25.0;
        let mut sd = ActionReference::signal_delegate(placement(3), 80.0, Some(SignalId(11)), Delay::RequestPermission);
        sd.locked_signal = Some(SignalId(11));
        let at_1430 = Delay::AbsoluteTimeOfDay(TimeOfDay::hm(14, 30).unwrap());
        let checkpoint = Checkpoint {
            clock:  SimTime(90_061),
            trains: vec![
                TrainRecord {
                    train:   TrainId(4),
                    entries: vec![
                        ReferenceEntry::Single(stop(120.0, at_1430)),
                        ReferenceEntry::Single(horn),
                        ReferenceEntry::Single(sd),
                        pair(300.0, 60, 5),
                    ],
                },
                TrainRecord { train: TrainId(9), entries: Vec::new() },
            ],
        };
        let decoded = Checkpoint::from_bytes(&checkpoint.to_bytes()).unwrap();
        assert_eq!(decoded, checkpoint);
    }

    #[test]
    fn every_truncation_is_rejected() {
        let mut records = Vec::new();
        encode_entries(&mut records, &[pair(300.0, 60, 5), ReferenceEntry::Single(stop(500.0, Delay::PlainWait(9)))]);
        let payload = payload_with_records(&records);
        assert!(Checkpoint::from_bytes(&wrap_with_header(&payload)).is_ok());

        for cut in 0..payload.len() {
            let result = Checkpoint::from_bytes(&wrap_with_header(&payload[..cut]));
            assert!(matches!(result, Err(SaveError::Truncated(_))), "cut at {cut}: {result:?}");
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut records = Vec::new();
        records.extend_from_slice(&1i32.to_le_bytes());
        records.push(9);
        records.extend_from_slice(&[0u8; 40]);
        let result = Checkpoint::from_bytes(&wrap_with_header(&payload_with_records(&records)));
        assert!(matches!(result, Err(SaveError::UnexpectedTag(9))));
    }

    #[test]
    fn delegate_followed_by_horn_breaks_association() {
        let mut records = Vec::new();
        let bogus = ReferenceEntry::DelegatePair {
            delegate:      ActionReference::signal_delegate(placement(0), 10.0, None, Delay::default()),
            waiting_point: ActionReference::horn(placement(0), 10.0, 3, HornPattern::Single),
        };
        encode_entries(&mut records, &[bogus]);
        let result = Checkpoint::from_bytes(&wrap_with_header(&payload_with_records(&records)));
        assert!(matches!(result, Err(SaveError::BrokenAssociation(_))));
    }

    #[test]
    fn delegate_flag_at_end_of_list_breaks_association() {
        let mut records = Vec::new();
        encode_entries(&mut records, &[pair(300.0, 60, 5)]);
        // Claim one record: the flagged waiting point now lies outside the list.
        records[..4].copy_from_slice(&1i32.to_le_bytes());
        let result = Checkpoint::from_bytes(&wrap_with_header(&payload_with_records(&records)));
        assert!(matches!(result, Err(SaveError::BrokenAssociation(_))));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut records = Vec::new();
        encode_entries(&mut records, &[]);
        let mut payload = payload_with_records(&records);
        payload.push(0);
        let result = Checkpoint::from_bytes(&wrap_with_header(&payload));
        assert!(matches!(result, Err(SaveError::TrailingBytes(1))));
    }

    #[test]
    fn bad_delay_code_is_rejected() {
        let mut records = Vec::new();
        encode_entries(&mut records, &[ReferenceEntry::Single(stop(10.0, Delay::PlainWait(1)))]);
        // count (4) + tag (1) + placement (16) + three floats (12) → delay.
        records[33..37].copy_from_slice(&60_000i32.to_le_bytes());
        let result = Checkpoint::from_bytes(&wrap_with_header(&payload_with_records(&records)));
        assert!(matches!(result, Err(SaveError::InvalidField { field: "delay", value: 60_000 })));
    }
}

// ── Restore ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod restore {
    use super::*;

    #[test]
    fn in_flight_wait_resumes_with_remaining_time() {
        let config = SchedulerConfig::default();
        let mut world = line();
        world.train.place(499.8, 0.0);
        let mut c = ContainerBuilder::new()
            .entries([ReferenceEntry::Single(stop(500.0, Delay::PlainWait(300)))])
            .build(&world.train)
            .unwrap();
        tick(&mut c, &mut world, &config, 1_000);
        assert_eq!(c.pending_specific()[0].actual_departure(), Some(SimTime(1_300)));

        // Departure is 120 s after the checkpoint clock.
        let bytes = save_container(&c, SimTime(1_180));
        drop(c);

        let mut restored = load_container(&bytes, &world.train, ContainerBuilder::new()).unwrap();
        assert_eq!(
            restored.reference(aux_core::RefId(0)).map(|r| r.delay),
            Some(Delay::PlainWait(120))
        );
        tick(&mut restored, &mut world, &config, 1_180);
        let item = &restored.pending_specific()[0];
        assert_eq!(item.state(), ItemState::Handle);
        assert_eq!(item.actual_departure(), Some(SimTime(1_300)));
    }

    #[test]
    fn long_absolute_wait_resumes_at_same_departure() {
        let config = SchedulerConfig::default();
        let at = |h, m| SimTime::from_day_time(0, TimeOfDay::hm(h, m).unwrap());
        let mut world = line();
        world.train.place(499.8, 0.0);
        let until_four = Delay::AbsoluteTimeOfDay(TimeOfDay::hm(16, 0).unwrap());
        let mut c = ContainerBuilder::new()
            .entries([ReferenceEntry::Single(stop(500.0, until_four))])
            .build(&world.train)
            .unwrap();
        tick(&mut c, &mut world, &config, at(6, 0).0);
        assert_eq!(c.pending_specific()[0].actual_departure(), Some(at(16, 0)));

        // Ten hours left at 06:00, nine at 07:00.
        for saved_at in [at(6, 0), at(7, 0)] {
            let bytes = save_container(&c, saved_at);
            let mut restored = load_container(&bytes, &world.train, ContainerBuilder::new()).unwrap();
            assert_eq!(restored.reference(aux_core::RefId(0)).map(|r| r.delay), Some(until_four));
            tick(&mut restored, &mut world, &config, saved_at.0);
            assert_eq!(restored.pending_specific()[0].actual_departure(), Some(at(16, 0)));
        }
    }

    #[test]
    fn pair_is_relinked_and_lock_is_not_taken_twice() {
        let config = SchedulerConfig::default();
        let sig = SignalId(7);
        let mut world = line();
        world.train.place(599.8, 0.0);
        world.signals.place(sig, 700.0);
        world.signals.update_next(599.8);

        let mut c = ContainerBuilder::new().entries([pair(600.0, 120, 5)]).build(&world.train).unwrap();
        tick(&mut c, &mut world, &config, 0);
        assert!(world.signals.is_locked(sig));
        let bytes = save_container(&c, SimTime(1));
        drop(c);

        let mut restored = load_container(&bytes, &world.train, ContainerBuilder::new()).unwrap();
        let ids: Vec<_> = restored.specific_references().collect();
        assert_eq!(ids.len(), 2);
        let delegate = restored.reference(ids[1]).unwrap();
        assert_eq!(delegate.associated_wp(), Some(ids[0]));
        assert_eq!(delegate.locked_signal, Some(sig));

        for t in 1..200 {
            tick(&mut restored, &mut world, &config, t);
        }
        assert_eq!(world.signals.lock_calls, 1);
        assert_eq!(world.signals.unlock_calls, 1);
        assert!(!world.signals.is_locked(sig));
        assert_eq!(restored.specific_len(), 0);
        assert!(restored.pending_specific().is_empty());
    }

    #[test]
    fn restore_adds_hooks_from_builder() {
        let world = line();
        let c = ContainerBuilder::new()
            .entries([ReferenceEntry::Single(stop(500.0, Delay::PlainWait(10)))])
            .build(&world.train)
            .unwrap();
        let bytes = save_container(&c, SimTime::ZERO);

        let builder = ContainerBuilder::new()
            .generic(ActionReference::level_crossing_horn(3, HornPattern::UsCrossing));
        let restored = load_container(&bytes, &world.train, builder).unwrap();
        assert_eq!(restored.generic_len(), 1);
        assert_eq!(restored.specific_len(), 1);
    }

    #[test]
    fn missing_train_restores_empty() {
        let world = line();
        let checkpoint = Checkpoint::new(SimTime(5));
        let c = checkpoint.restore(&world.train, ContainerBuilder::new()).unwrap();
        assert_eq!(c.specific_len(), 0);
    }

    #[test]
    fn invalid_pair_rejects_whole_load() {
        let world = line();
        let split = ReferenceEntry::DelegatePair {
            delegate:      ActionReference::signal_delegate(placement(0), 10.0, None, Delay::default()),
            waiting_point: ActionReference::waiting_point(placement(1), 10.0, Delay::default()),
        };
        let checkpoint = Checkpoint {
            clock:  SimTime::ZERO,
            trains: vec![TrainRecord { train: TrainId(1), entries: vec![split] }],
        };
        let result = load_container(&checkpoint.to_bytes(), &world.train, ContainerBuilder::new());
        assert!(matches!(result, Err(SaveError::Container(_))));
    }

    #[test]
    fn checkpoint_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.auxsave");

        let world = line();
        let c = ContainerBuilder::new().entries([pair(600.0, 30, 5)]).build(&world.train).unwrap();
        let mut checkpoint = Checkpoint::new(SimTime(42));
        checkpoint.add(&c);
        checkpoint.write(&path).unwrap();

        let loaded = Checkpoint::read(&path).unwrap();
        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.record(TrainId(1)).map(|r| r.entries.len()), Some(1));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Checkpoint::read(dir.path().join("absent.auxsave"));
        assert!(matches!(result, Err(SaveError::Io(_))));
    }
}
