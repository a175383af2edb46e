//! Unit tests for aux-container.

use aux_action::{
    ActionItem, ActionKind, ActionReference, Delay, EventSource, HornPattern, ItemState,
    ReferenceEntry,
};
use aux_core::{ItemId, RefId, RoutePlacement, SchedulerConfig, SectionId, SignalId, SimTime, TimeOfDay, TrainId, WorldLocation};
use aux_world::{LineSection, LineTrain, LineWorld, MovementState};

use crate::{ActionObserver, Container, ContainerBuilder, ContainerError};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn section(id: u32, length_m: f32, subroute: u32) -> LineSection {
    LineSection { id: SectionId(id), length_m, subroute }
}

fn placement(section: u32) -> RoutePlacement {
    RoutePlacement { section: SectionId(section), ..RoutePlacement::default() }
}

fn wp(section: u32, at_m: f32, secs: u32) -> ReferenceEntry {
    ReferenceEntry::Single(ActionReference::waiting_point(placement(section), at_m, Delay::PlainWait(secs)))
}

fn wp_on_subroute(section: u32, subroute: u32, at_m: f32) -> ReferenceEntry {
    let mut p = placement(section);
    p.subroute = subroute;
    ReferenceEntry::Single(ActionReference::waiting_point(p, at_m, Delay::PlainWait(10)))
}

/// One straight section of `length_m`, train standing at its start.
fn line(length_m: f32) -> LineWorld {
    LineWorld::new(LineTrain::new(TrainId(1), vec![section(0, length_m, 0)]))
}

/// Everything the container reported, in order.
#[derive(Debug, Default)]
struct Probe {
    armed:   Vec<RefId>,
    changes: Vec<(ItemId, ItemState, ItemState)>,
    removed: Vec<RefId>,
}

impl ActionObserver for Probe {
    fn on_armed(&mut self, item: &ActionItem) {
        self.armed.push(item.reference());
    }

    fn on_state_change(&mut self, item: ItemId, from: ItemState, to: ItemState) {
        self.changes.push((item, from, to));
    }

    fn on_removed(&mut self, item: &ActionItem) {
        self.removed.push(item.reference());
    }
}

/// One tick at clock `t`: update the container, then integrate the world.
fn tick<O: ActionObserver>(
    container: &mut Container<O>,
    world:     &mut LineWorld,
    config:    &SchedulerConfig,
    t:         i64,
    dt:        f32,
) {
    {
        let mut ctx = world.context(SimTime(t), dt, config);
        container.update(&mut ctx);
    }
    world.step(dt);
}

/// No reference has more than one live item.
fn at_most_one_live_item<O: ActionObserver>(container: &Container<O>) -> bool {
    let mut seen: Vec<RefId> = container.pending_specific().iter().map(ActionItem::reference).collect();
    let n = seen.len();
    seen.sort();
    seen.dedup();
    seen.len() == n
}

// ── Registration ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod registration {
    use super::*;

    #[test]
    fn pair_queues_waiting_point_first() {
        let mut c = Container::new(TrainId(1));
        let delegate = ActionReference::signal_delegate(placement(0), 600.0, None, Delay::PlainWait(5));
        let stop = ActionReference::waiting_point(placement(0), 600.0, Delay::PlainWait(120));
        let id = c.register(ReferenceEntry::DelegatePair { delegate, waiting_point: stop }).unwrap();

        let queued: Vec<RefId> = c.specific_references().collect();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[1], id);
        assert_eq!(c.reference(id).unwrap().associated_wp(), Some(queued[0]));
        assert_eq!(c.reference(queued[0]).unwrap().kind, ActionKind::WaitingPoint);
    }

    #[test]
    fn malformed_pair_is_rejected() {
        let mut c = Container::new(TrainId(1));
        let a = ActionReference::waiting_point(placement(0), 10.0, Delay::default());
        let b = ActionReference::waiting_point(placement(0), 10.0, Delay::default());
        let err = c.register(ReferenceEntry::DelegatePair { delegate: a, waiting_point: b });
        assert!(matches!(err, Err(ContainerError::Association(_))));
        assert_eq!(c.specific_len(), 0);
    }

    #[test]
    fn generic_waiting_point_is_rejected() {
        let mut c = Container::new(TrainId(1));
        let mut r = ActionReference::waiting_point(placement(0), 10.0, Delay::default());
        r.generic = Some(EventSource::LevelCrossing);
        assert!(matches!(
            c.register(ReferenceEntry::Single(r)),
            Err(ContainerError::InvalidReference(_))
        ));
    }

    #[test]
    fn player_train_gets_no_generic_hooks() {
        let mut train = LineTrain::new(TrainId(2), vec![section(0, 1_000.0, 0)]);
        train.ai_controlled = false;
        let c = ContainerBuilder::new()
            .entries([wp(0, 500.0, 10)])
            .generic(ActionReference::level_crossing_horn(3, HornPattern::UsCrossing))
            .build(&train)
            .unwrap();
        assert_eq!(c.specific_len(), 1);
        assert_eq!(c.generic_len(), 0);

        train.ai_controlled = true;
        let c = ContainerBuilder::new()
            .generic(ActionReference::level_crossing_horn(3, HornPattern::UsCrossing))
            .build(&train)
            .unwrap();
        assert_eq!(c.generic_len(), 1);
        assert_eq!(c.train(), TrainId(2));
    }
}

// ── Arming ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod arming {
    use super::*;

    #[test]
    fn stop_too_close_to_brake_arms_in_init() {
        // Sections 4, 5, 6 of 500 m; front in section 5 at 40 m, 20 m/s.
        let mut world = LineWorld::new(LineTrain::new(
            TrainId(1),
            vec![section(4, 500.0, 0), section(5, 500.0, 0), section(6, 500.0, 0)],
        ));
        world.train.place(540.0, 20.0);
        let config = SchedulerConfig::default();
        let mut c = ContainerBuilder::new().entries([wp(5, 100.0, 30)]).build(&world.train).unwrap();

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 1);
        drop(ctx);

        let item = &c.pending_specific()[0];
        assert_eq!(item.state(), ItemState::Init);
        assert_eq!(item.trigger().activation_m, 540.0);
        assert_eq!(item.trigger().action_m, 600.0);
        assert!(c.is_linked(item.reference()));
    }

    #[test]
    fn second_scan_does_not_rearm() {
        let mut world = line(1_000.0);
        world.train.place(450.0, 0.0);
        let config = SchedulerConfig::default();
        let mut c = ContainerBuilder::new().entries([wp(0, 500.0, 10)]).build(&world.train).unwrap();

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 1);
        assert_eq!(c.arm_reachable(&mut ctx), 0);
        drop(ctx);
        assert_eq!(c.pending_specific().len(), 1);
    }

    #[test]
    fn later_reference_waits_for_earlier_one() {
        let mut world = line(10_000.0);
        world.train.place(0.0, 0.0);
        let config = SchedulerConfig::default();
        // Neither is due yet; both arm once the first one is.
        let mut c = ContainerBuilder::new()
            .entries([wp(0, 5_000.0, 10), wp(0, 5_010.0, 10)])
            .build(&world.train)
            .unwrap();
        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 0);
        drop(ctx);

        world.train.place(4_500.0, 0.0);
        let mut ctx = world.context(SimTime(1), 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 2);
    }

    #[test]
    fn passed_subroute_is_discarded_and_later_one_waits() {
        let mut world = LineWorld::new(LineTrain::new(
            TrainId(1),
            vec![section(0, 1_000.0, 0), section(1, 1_000.0, 1), section(2, 1_000.0, 2)],
        ));
        world.train.place(1_500.0, 0.0);
        let config = SchedulerConfig::default();
        let mut c = ContainerBuilder::new()
            .entries([wp_on_subroute(0, 0, 100.0), wp_on_subroute(2, 2, 100.0)])
            .build(&world.train)
            .unwrap();

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 0);
        drop(ctx);
        assert_eq!(c.specific_len(), 1);
        assert_eq!(c.reference(RefId(0)), None);
        assert!(c.reference(RefId(1)).is_some());
    }

    #[test]
    fn unplanned_section_defers_until_visible() {
        let mut world = LineWorld::new(LineTrain::new(
            TrainId(1),
            vec![section(0, 1_000.0, 0), section(1, 1_000.0, 0)],
        ));
        world.train.visible = 1;
        world.train.place(950.0, 0.0);
        let config = SchedulerConfig::default();
        let mut c = ContainerBuilder::new().entries([wp(1, 20.0, 10)]).build(&world.train).unwrap();

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 0);
        drop(ctx);
        assert_eq!(c.specific_len(), 1);

        world.train.visible = 2;
        let mut ctx = world.context(SimTime(1), 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 1);
    }
}

// ── Ordering and exclusivity ──────────────────────────────────────────────────

#[cfg(test)]
mod ordering {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn stops_arm_and_complete_in_route_order(
            gaps in prop::collection::vec(20.0f32..800.0, 1..5),
            dt_pick in 0usize..3,
        ) {
            let dt = [0.5f32, 1.0, 2.0][dt_pick];
            let mut at = 100.0;
            let mut entries = Vec::new();
            for gap in &gaps {
                at += gap;
                entries.push(wp(0, at, 2));
            }
            let mut world = line(at + 500.0);
            let config = SchedulerConfig::default();
            let mut c = ContainerBuilder::new()
                .entries(entries)
                .observer(Probe::default())
                .build(&world.train)
                .unwrap();

            let mut t = 0.0f32;
            for _ in 0..20_000 {
                tick(&mut c, &mut world, &config, t as i64, dt);
                t += dt;
                prop_assert!(at_most_one_live_item(&c));
                if c.specific_len() == 0 && c.pending_specific().is_empty() {
                    break;
                }
            }

            let expected: Vec<RefId> = (0..gaps.len() as u32).map(RefId).collect();
            prop_assert_eq!(&c.observer.armed, &expected);
            prop_assert_eq!(&c.observer.removed, &expected);
        }
    }
}

// ── Delegate pairs ────────────────────────────────────────────────────────────

#[cfg(test)]
mod delegate_pair {
    use super::*;

    const SIG: SignalId = SignalId(7);

    /// Stop at 600 m paired with a delegate there; signal 7 at 700 m.
    fn setup(wp_secs: u32, delegate_secs: u32) -> (LineWorld, Container<Probe>) {
        let mut world = line(1_000.0);
        world.signals.place(SIG, 700.0);
        world.signals.update_next(0.0);
        let delegate = ActionReference::signal_delegate(placement(0), 600.0, None, Delay::PlainWait(delegate_secs));
        let stop = ActionReference::waiting_point(placement(0), 600.0, Delay::PlainWait(wp_secs));
        let c = ContainerBuilder::new()
            .entries([ReferenceEntry::DelegatePair { delegate, waiting_point: stop }])
            .observer(Probe::default())
            .build(&world.train)
            .unwrap();
        (world, c)
    }

    #[test]
    fn delegate_completion_cancels_its_stop() {
        let config = SchedulerConfig::default();
        let (mut world, mut c) = setup(120, 5);

        let mut done_at = None;
        for t in 0..200 {
            tick(&mut c, &mut world, &config, t, 1.0);
            assert!(at_most_one_live_item(&c));
            if done_at.is_none() && !c.observer.armed.is_empty() && c.pending_specific().is_empty() {
                done_at = Some(t);
            }
        }

        // The stop would have held the train for 120 s.
        let done_at = done_at.expect("pair completed");
        assert!(done_at < 120, "completed at {done_at}");
        assert_eq!(c.observer.armed, vec![RefId(0), RefId(1)]);
        assert_eq!(c.observer.removed, vec![RefId(1), RefId(0)]);
        assert_eq!(c.specific_len(), 0);
        assert!(!c.is_linked(RefId(0)));
        assert_eq!(c.reference(RefId(0)), None);

        assert_eq!(world.signals.lock_calls, 1);
        assert_eq!(world.signals.unlock_calls, 1);
        assert!(!world.signals.is_locked(SIG));
        assert!(world.train.position_m > 601.0);
    }

    #[test]
    fn removing_locked_delegate_releases_once() {
        let config = SchedulerConfig::default();
        let (mut world, mut c) = setup(120, 60);

        let mut t = 0;
        while !world.signals.is_locked(SIG) {
            tick(&mut c, &mut world, &config, t, 1.0);
            t += 1;
            assert!(t < 200, "delegate never locked");
        }
        let delegate = c
            .pending_specific()
            .iter()
            .find(|i| i.is_locked())
            .map(ActionItem::id)
            .unwrap();

        let mut ctx = world.context(SimTime(t), 1.0, &config);
        assert!(c.remove(delegate, &mut ctx));
        assert!(!c.remove(delegate, &mut ctx));
        drop(ctx);

        assert!(!world.signals.is_locked(SIG));
        assert_eq!(world.signals.unlock_calls, 1);
        // The stop stays: only the delegate was removed.
        assert!(c.reference(RefId(0)).is_some());
    }

    #[test]
    fn clear_releases_every_lock() {
        let config = SchedulerConfig::default();
        let (mut world, mut c) = setup(120, 60);
        let mut t = 0;
        while !world.signals.is_locked(SIG) {
            tick(&mut c, &mut world, &config, t, 1.0);
            t += 1;
            assert!(t < 200, "delegate never locked");
        }

        let mut ctx = world.context(SimTime(t), 1.0, &config);
        c.clear(&mut ctx);
        drop(ctx);

        assert!(!world.signals.is_locked(SIG));
        assert_eq!(world.signals.unlock_calls, 1);
        assert_eq!(c.specific_len(), 0);
        assert!(c.pending_specific().is_empty());
        assert_eq!(c.observer.removed.len(), c.observer.armed.len());
    }

    #[test]
    fn restored_lock_is_adopted_not_reacquired() {
        let config = SchedulerConfig::default();
        let mut world = line(1_000.0);
        world.train.place(599.8, 0.0);
        world.signals.place(SIG, 700.0);
        world.signals.update_next(599.8);
        world.signals.locks.insert(SIG, TrainId(1));

        let mut delegate = ActionReference::signal_delegate(placement(0), 600.0, None, Delay::PlainWait(0));
        delegate.locked_signal = Some(SIG);
        let mut c = ContainerBuilder::new().entries([ReferenceEntry::Single(delegate)]).build(&world.train).unwrap();

        for t in 0..5 {
            tick(&mut c, &mut world, &config, t, 1.0);
        }
        assert_eq!(world.signals.lock_calls, 0);
        assert_eq!(world.signals.unlock_calls, 1);
        assert_eq!(c.specific_len(), 0);
    }

    /// Delegate restored holding signal 7, train standing at 599.8 m.
    fn restored_setup() -> (LineWorld, Container) {
        let mut world = line(1_000.0);
        world.train.place(599.8, 0.0);
        world.signals.place(SIG, 700.0);
        world.signals.update_next(599.8);
        world.signals.locks.insert(SIG, TrainId(1));
        let mut delegate = ActionReference::signal_delegate(placement(0), 600.0, None, Delay::PlainWait(30));
        delegate.locked_signal = Some(SIG);
        let c = ContainerBuilder::new().entries([ReferenceEntry::Single(delegate)]).build(&world.train).unwrap();
        (world, c)
    }

    #[test]
    fn restored_lock_released_when_cleared_before_first_advance() {
        let config = SchedulerConfig::default();
        let (mut world, mut c) = restored_setup();

        let mut ctx = world.context(SimTime(0), 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 1);
        c.clear(&mut ctx);
        drop(ctx);

        assert!(!world.signals.is_locked(SIG));
        assert_eq!(world.signals.unlock_calls, 1);
        assert_eq!(world.signals.lock_calls, 0);
    }

    #[test]
    fn restored_lock_released_when_removed_before_first_advance() {
        let config = SchedulerConfig::default();
        let (mut world, mut c) = restored_setup();

        let mut ctx = world.context(SimTime(0), 1.0, &config);
        c.arm_reachable(&mut ctx);
        let item = c.pending_specific()[0].id();
        assert!(c.remove(item, &mut ctx));
        drop(ctx);

        assert!(!world.signals.is_locked(SIG));
        assert_eq!(world.signals.unlock_calls, 1);
    }

    #[test]
    fn restored_lock_saved_again_before_first_advance() {
        let config = SchedulerConfig::default();
        let (mut world, mut c) = restored_setup();

        let mut ctx = world.context(SimTime(0), 1.0, &config);
        c.arm_reachable(&mut ctx);
        drop(ctx);
        assert!(c.pending_specific()[0].is_locked());

        let saved = c.snapshot_for_save(SimTime(0));
        let [ReferenceEntry::Single(delegate)] = saved.as_slice() else {
            panic!("expected one reference, got {saved:?}");
        };
        assert_eq!(delegate.locked_signal, Some(SIG));
    }

    #[test]
    fn intermediate_signal_is_not_locked() {
        let config = SchedulerConfig::default();
        let (mut world, mut c) = setup(120, 5);
        // Passed on the way to the stop; signal 7 is the one ahead of it.
        world.signals.place(SignalId(5), 300.0);
        world.signals.update_next(0.0);

        for t in 0..200 {
            tick(&mut c, &mut world, &config, t, 1.0);
            assert!(!world.signals.is_locked(SignalId(5)));
        }
        assert_eq!(world.signals.lock_calls, 1);
        assert_eq!(world.signals.unlock_calls, 1);
        assert!(world.train.position_m > 601.0);
    }
}

// ── Generic hooks ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod generic {
    use super::*;

    fn crossing_container(world: &LineWorld) -> Container {
        ContainerBuilder::new()
            .generic(ActionReference::level_crossing_horn(3, HornPattern::Single))
            .build(&world.train)
            .unwrap()
    }

    #[test]
    fn same_crossing_arms_once() {
        let config = SchedulerConfig::default();
        let mut world = line(1_000.0);
        world.train.place(100.0, 10.0);
        let mut c = crossing_container(&world);
        let here = WorldLocation::new(250.0, 0.0, 0.0);

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert!(c.check_event_source(EventSource::LevelCrossing, here, 150.0, &mut ctx));
        assert!(!c.check_event_source(EventSource::LevelCrossing, here, 140.0, &mut ctx));
        // Within the match tolerance it is still the same crossing.
        let nudged = WorldLocation::new(250.5, 0.0, 0.0);
        assert!(!c.check_event_source(EventSource::LevelCrossing, nudged, 130.0, &mut ctx));
        drop(ctx);
        assert_eq!(c.pending_generic().len(), 1);

        let item = &c.pending_generic()[0];
        assert_eq!(item.trigger().action_m, 250.0);
        assert_eq!(item.trigger().activation_m, 100.0);
    }

    #[test]
    fn another_crossing_arms_again() {
        let config = SchedulerConfig::default();
        let mut world = line(1_000.0);
        let mut c = crossing_container(&world);

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert!(c.check_event_source(EventSource::LevelCrossing, WorldLocation::new(50.0, 0.0, 0.0), 50.0, &mut ctx));
        assert!(c.check_event_source(EventSource::LevelCrossing, WorldLocation::new(90.0, 0.0, 0.0), 90.0, &mut ctx));
        drop(ctx);
        assert_eq!(c.pending_generic().len(), 2);
    }

    #[test]
    fn crossing_beyond_lookahead_is_ignored() {
        let config = SchedulerConfig::default();
        let mut world = line(1_000.0);
        let mut c = crossing_container(&world);
        let far = WorldLocation::new(900.0, 0.0, 0.0);

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert!(!c.check_event_source(EventSource::LevelCrossing, far, 900.0, &mut ctx));
        assert!(!c.check_event_source(EventSource::LevelCrossing, far, -5.0, &mut ctx));
        // Ignored sightings are not remembered.
        assert!(c.check_event_source(EventSource::LevelCrossing, far, 150.0, &mut ctx));
    }

    #[test]
    fn armed_horn_sounds_and_is_swept() {
        let config = SchedulerConfig::default();
        let mut world = line(1_000.0);
        world.train.place(100.0, 10.0);
        let mut c = crossing_container(&world);

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        c.check_event_source(EventSource::LevelCrossing, WorldLocation::new(250.0, 0.0, 0.0), 150.0, &mut ctx);
        drop(ctx);

        for t in 0..10 {
            tick(&mut c, &mut world, &config, t, 1.0);
        }
        assert_eq!(world.sound.blasts(), 1);
        assert!(!world.sound.horn_on);
        assert!(c.pending_generic().is_empty());
        // The hook survives its items.
        assert_eq!(c.generic_len(), 1);
    }
}

// ── Recalculation ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod recalculate {
    use super::*;

    #[test]
    fn approach_already_begun_reenters_braking() {
        let config = SchedulerConfig::default();
        let mut world = line(2_000.0);
        world.train.place(1_000.0, 20.0);
        let mut c = ContainerBuilder::new()
            .entries([wp(0, 1_500.0, 10)])
            .observer(Probe::default())
            .build(&world.train)
            .unwrap();

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 1);
        drop(ctx);

        // 350 m out at 20 m/s needs 400 m of braking.
        world.train.place(1_150.0, 20.0);
        let mut ctx = world.context(SimTime(1), 1.0, &config);
        assert_eq!(c.recalculate(&mut ctx), 1);
        drop(ctx);

        let item = &c.pending_specific()[0];
        assert_eq!(item.state(), ItemState::Braking);
        assert!((item.trigger().action_m - 1_500.0).abs() < 1e-3);
        assert!(c.observer.changes.iter().any(|&(_, from, to)| from == ItemState::Init && to == ItemState::Braking));
    }

    #[test]
    fn room_to_spare_moves_activation_only() {
        let config = SchedulerConfig::default();
        let mut world = line(2_000.0);
        world.train.place(700.0, 10.0);
        let mut c = ContainerBuilder::new().entries([wp(0, 1_500.0, 10)]).build(&world.train).unwrap();

        let mut ctx = world.context(SimTime::ZERO, 1.0, &config);
        assert_eq!(c.arm_reachable(&mut ctx), 1);
        let before = c.pending_specific()[0].trigger();
        assert_eq!(c.recalculate(&mut ctx), 0);
        drop(ctx);

        let after = c.pending_specific()[0].trigger();
        assert_eq!(c.pending_specific()[0].state(), ItemState::Init);
        assert!(after.activation_m > before.activation_m);
        assert!((after.action_m - before.action_m).abs() < 1e-3);
    }
}

// ── Persistence snapshot ──────────────────────────────────────────────────────

#[cfg(test)]
mod snapshot {
    use super::*;

    #[test]
    fn waiting_stop_is_saved_as_remaining_wait() {
        let config = SchedulerConfig::default();
        let mut world = line(1_000.0);
        world.train.place(499.8, 0.0);
        let mut c = ContainerBuilder::new().entries([wp(0, 500.0, 300)]).build(&world.train).unwrap();

        tick(&mut c, &mut world, &config, 1_000, 1.0);
        assert_eq!(c.pending_specific()[0].state(), ItemState::Handle);
        assert_eq!(world.train.movement, MovementState::HandleAction);

        let saved = c.snapshot_for_save(SimTime(1_180));
        let [ReferenceEntry::Single(r)] = saved.as_slice() else {
            panic!("expected one single entry, got {saved:?}");
        };
        assert_eq!(r.delay, Delay::PlainWait(120));
        assert_eq!(r.kind, ActionKind::WaitingPoint);
    }

    #[test]
    fn unarmed_references_keep_their_codes() {
        let at_1430 = Delay::AbsoluteTimeOfDay(TimeOfDay::hm(14, 30).unwrap());
        let absolute = ReferenceEntry::Single(ActionReference::waiting_point(placement(0), 6_000.0, at_1430));
        let world = line(10_000.0);
        let c = ContainerBuilder::new()
            .entries([wp(0, 5_000.0, 45), absolute.clone()])
            .build(&world.train)
            .unwrap();
        let saved = c.snapshot_for_save(SimTime::ZERO);
        assert_eq!(saved, vec![wp(0, 5_000.0, 45), absolute]);
    }

    #[test]
    fn locked_pair_is_written_together() {
        let config = SchedulerConfig::default();
        let mut world = line(1_000.0);
        world.train.place(599.8, 0.0);
        world.signals.place(SignalId(7), 700.0);
        world.signals.update_next(599.8);
        let delegate = ActionReference::signal_delegate(placement(0), 600.0, None, Delay::PlainWait(5));
        let stop = ActionReference::waiting_point(placement(0), 600.0, Delay::PlainWait(120));
        let mut c = ContainerBuilder::new()
            .entries([ReferenceEntry::DelegatePair { delegate, waiting_point: stop }])
            .build(&world.train)
            .unwrap();

        tick(&mut c, &mut world, &config, 0, 1.0);
        assert!(world.signals.is_locked(SignalId(7)));

        let saved = c.snapshot_for_save(SimTime(1));
        let [ReferenceEntry::DelegatePair { delegate, waiting_point }] = saved.as_slice() else {
            panic!("expected one pair, got {saved:?}");
        };
        assert_eq!(delegate.locked_signal, Some(SignalId(7)));
        assert_eq!(delegate.associated_wp(), None);
        assert_eq!(waiting_point.kind, ActionKind::WaitingPoint);
        assert_eq!(waiting_point.locked_signal, None);
    }
}
