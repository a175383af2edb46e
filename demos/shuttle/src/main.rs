//! shuttle — one AI shuttle working a single line.
//!
//! Drives a `LineWorld` train over three sections with timetable stops, a
//! horn point, a signal delegate paired with a stop, and two level
//! crossings.  Partway through, the scheduler state is checkpointed to disk
//! and the train's container is rebuilt from the file before the run
//! continues.
//!
//! Usage: `shuttle [config.toml]` (defaults apply when no file is given).
//! Log level follows `RUST_LOG`, defaulting to `info`.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use aux_action::{load_references_reader, ActionItem, EventSource, ReferenceEntry};
use aux_container::{ActionObserver, Container, ContainerBuilder};
use aux_core::{SchedulerConfig, SectionId, SignalId, SimClock, SimTime, TimeOfDay, TrainId, WorldLocation};
use aux_save::Checkpoint;
use aux_world::{LineSection, LineTrain, LineWorld, TrainView};

// ── Constants ─────────────────────────────────────────────────────────────────

const DT_SECS:         f32 = 1.0;
const MAX_TICKS:       u32 = 4 * 3_600;
const CHECKPOINT_TICK: u32 = 240;
/// Crossings closer than this are reported to the scheduler.
const CROSSING_SIGHT_M: f32 = 400.0;

const SHUTTLE: TrainId = TrainId(1);
const HOME_SIGNAL: SignalId = SignalId(21);
const HOME_SIGNAL_AT_M: f32 = 1_900.0;

/// Level crossings, by route position.
const CROSSINGS_M: [f32; 2] = [500.0, 2_600.0];

// ── Timetable CSV ─────────────────────────────────────────────────────────────

// Section 10: 1200 m, section 11: 800 m, section 12: 1600 m.
// The delegate at 650 m into section 11 holds the home signal while the
// train waits, and cancels the 120 s stop once the signal is handed back.
// The last stop waits until 08:15.
const REFERENCES_CSV: &str = "\
kind,subroute,route_index,section,direction,distance,speed,delay,horn_secs,pattern,end_signal,associate\n\
waiting_point,0,0,10,forward,900.0,0,30,,,,\n\
horn,0,1,11,forward,150.0,,,4,single,,\n\
delegate,0,1,11,forward,650.0,,10,,,,1\n\
waiting_point,0,1,11,forward,650.0,,120,,,,\n\
waiting_point,0,2,12,forward,1400.0,0,30815,,,,\n\
crossing_horn,,,,,,,,5,us,,\n\
";

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RunLog {
    armed:    u32,
    stops:    u32,
    others:   u32,
}

impl ActionObserver for RunLog {
    fn on_armed(&mut self, item: &ActionItem) {
        self.armed += 1;
        debug!(item = %item.id(), reference = %item.reference(), "armed");
    }

    fn on_removed(&mut self, item: &ActionItem) {
        if item.is_waiting_point() {
            self.stops += 1;
        } else {
            self.others += 1;
        }
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

fn build_world() -> LineWorld {
    let sections = vec![
        LineSection { id: SectionId(10), length_m: 1_200.0, subroute: 0 },
        LineSection { id: SectionId(11), length_m:   800.0, subroute: 0 },
        LineSection { id: SectionId(12), length_m: 1_600.0, subroute: 0 },
    ];
    let mut world = LineWorld::new(LineTrain::new(SHUTTLE, sections));
    world.signals.place(HOME_SIGNAL, HOME_SIGNAL_AT_M);
    world.signals.update_next(0.0);
    world
}

/// Report crossings in sight to the container.
fn report_crossings(container: &mut Container<RunLog>, world: &mut LineWorld, config: &SchedulerConfig, now: SimTime) {
    let front = world.train.position_m;
    let mut ctx = world.context(now, DT_SECS, config);
    for at in CROSSINGS_M {
        let ahead = at - front;
        if (0.0..=CROSSING_SIGHT_M).contains(&ahead) {
            let location = WorldLocation::new(at, 0.0, 0.0);
            container.check_event_source(EventSource::LevelCrossing, location, ahead, &mut ctx);
        }
    }
}

fn load_config() -> Result<SchedulerConfig> {
    match std::env::args().nth(1) {
        Some(path) => SchedulerConfig::load(Path::new(&path))
            .with_context(|| format!("loading scheduler config {path}")),
        None => Ok(SchedulerConfig::default()),
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    println!("=== shuttle: auxiliary action scheduler ===");

    // 1. Config and timetable.
    let config = load_config()?;
    let entries = load_references_reader(Cursor::new(REFERENCES_CSV)).context("parsing timetable")?;
    let (hooks, route): (Vec<ReferenceEntry>, Vec<ReferenceEntry>) = entries
        .into_iter()
        .partition(|e| matches!(e, ReferenceEntry::Single(r) if r.is_generic()));
    println!("Timetable: {} route entries, {} event hooks", route.len(), hooks.len());

    // 2. World and container.
    let mut world = build_world();
    let mut container = ContainerBuilder::new()
        .entries(route)
        .entries(hooks.clone())
        .observer(RunLog::default())
        .build(&world.train)?;

    let start = SimTime::from_day_time(0, TimeOfDay::hm(8, 0).context("start time")?);
    let mut clock = SimClock::new(start);
    let save_path = std::env::temp_dir().join("shuttle.auxsave");

    // 3. Run.
    let mut ticks = 0;
    while ticks < MAX_TICKS {
        let now = clock.now();
        report_crossings(&mut container, &mut world, &config, now);
        {
            let mut ctx = world.context(now, DT_SECS, &config);
            container.update(&mut ctx);
        }
        world.step(DT_SECS);
        clock.advance(DT_SECS);
        ticks += 1;

        if ticks == CHECKPOINT_TICK {
            let mut checkpoint = Checkpoint::new(clock.now());
            checkpoint.add(&container);
            checkpoint.write(&save_path)?;

            // Rebuild from the file, as a reloaded game would.
            let restored = Checkpoint::read(&save_path)?;
            let log = std::mem::take(&mut container.observer);
            container = restored.restore(&world.train, ContainerBuilder::new().entries(hooks.clone()).observer(log))?;
            info!(references = container.specific_len(), "resumed from checkpoint");
        }

        let idle = container.specific_len() == 0 && container.pending_specific().is_empty();
        if idle && world.train.at_route_end() {
            break;
        }
    }

    // 4. Summary.
    let end = clock.now();
    println!();
    println!("Finished at {end} after {ticks} ticks");
    println!("  items armed      : {}", container.observer.armed);
    println!("  stops completed  : {}", container.observer.stops);
    println!("  horns/delegates  : {}", container.observer.others);
    println!("  horn blasts      : {}", world.sound.blasts());
    println!("  signal locks     : {} taken, {} released", world.signals.lock_calls, world.signals.unlock_calls);
    println!("  final position   : {:.1} m", world.train.distance_travelled_m());
    Ok(())
}
