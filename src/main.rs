use std::error::Error;
use std::path::PathBuf;

use glam::{vec2, Vec2};
use serde::Serialize;

use shoal::capture::{CaptureRecord, FightOutcome};
use shoal::config::{self, SimConfig};
use shoal::events::SimEvent;
use shoal::input::{HooksetDetector, TickInput};
use shoal::species::{SizeClass, Species};
use shoal::tackle::{LineConfig, LineMaterial, ReelConfig, ReelKind, Tackle};
use shoal::{Simulation, SpawnOverrides};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scenario {
    Reef,
    Fight,
    Frenzy,
}

impl Scenario {
    fn parse_cli(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "reef" | "baseline" => Some(Self::Reef),
            "fight" => Some(Self::Fight),
            "frenzy" => Some(Self::Frenzy),
            _ => None,
        }
    }

    fn default_ticks(self) -> u64 {
        match self {
            Self::Reef => 1800,
            Self::Fight => 2400,
            Self::Frenzy => 1200,
        }
    }
}

struct CliArgs {
    scenario: Scenario,
    seed: Option<u64>,
    ticks: Option<u64>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = CliArgs {
        scenario: Scenario::Reef,
        seed: None,
        ticks: None,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                args.seed = Some(value.parse().map_err(|_| format!("bad seed: {value}"))?);
            }
            "--ticks" => {
                let value = iter.next().ok_or("--ticks needs a value")?;
                args.ticks = Some(value.parse().map_err(|_| format!("bad tick count: {value}"))?);
            }
            "--config" => {
                args.config = Some(PathBuf::from(iter.next().ok_or("--config needs a path")?));
            }
            other => {
                args.scenario =
                    Scenario::parse_cli(other).ok_or_else(|| format!("unknown scenario: {other}"))?;
            }
        }
    }
    Ok(args)
}

#[derive(Debug, Default, Serialize)]
struct SessionSummary {
    scenario: String,
    seed: u64,
    ticks: u64,
    live_agents: usize,
    schools: usize,
    consumptions: u32,
    frenzies: u32,
    strikes: u32,
    hooksets: u32,
    missed_hooksets: u32,
    migrations: u32,
    outcomes: Vec<FightOutcome>,
    catches: Vec<CaptureRecord>,
}

impl SessionSummary {
    fn record(&mut self, event: &SimEvent) {
        match event {
            SimEvent::Consumption { .. } => self.consumptions += 1,
            SimEvent::FrenzyTriggered { .. } => self.frenzies += 1,
            SimEvent::Strike { .. } => self.strikes += 1,
            SimEvent::Hookset { .. } => self.hooksets += 1,
            SimEvent::HooksetMissed { .. } => self.missed_hooksets += 1,
            SimEvent::SchoolMigrating { .. } => self.migrations += 1,
            SimEvent::FightResolved { outcome, .. } => self.outcomes.push(*outcome),
            _ => {}
        }
    }
}

fn populate(sim: &mut Simulation, scenario: Scenario) -> Result<(), Box<dyn Error>> {
    let center = sim.world().center();
    match scenario {
        Scenario::Reef => {
            sim.spawn_school(Species::Shad, 14, center - vec2(300.0, 60.0))?;
            sim.spawn_school(Species::Alewife, 10, center + vec2(350.0, 40.0))?;
            for i in 0..40 {
                let pos = vec2(200.0 + i as f32 * 30.0, 280.0 + (i % 7) as f32 * 18.0);
                sim.spawn_agent(Species::Zooplankton, SizeClass::Tiny, pos)?;
            }
            sim.spawn_agent(Species::LargemouthBass, SizeClass::Medium, center - vec2(500.0, 0.0))?;
            sim.spawn_agent(Species::Walleye, SizeClass::Medium, center + vec2(100.0, 150.0))?;
            sim.spawn_agent(Species::NorthernPike, SizeClass::Large, center + vec2(600.0, 0.0))?;
        }
        Scenario::Fight => {
            sim.spawn_school(Species::Shad, 8, center + vec2(400.0, 0.0))?;
            sim.spawn_agent_with(
                Species::LargemouthBass,
                SizeClass::Large,
                center - vec2(40.0, 0.0),
                SpawnOverrides::hunger(70.0),
            )?;
        }
        Scenario::Frenzy => {
            sim.spawn_school(Species::Shad, 6, center)?;
            for i in 0..4 {
                let offset = vec2(-90.0 + i as f32 * 60.0, if i % 2 == 0 { -50.0 } else { 50.0 });
                sim.spawn_agent_with(
                    Species::LargemouthBass,
                    SizeClass::Medium,
                    center + offset,
                    SpawnOverrides::hunger(90.0),
                )?;
            }
        }
    }
    Ok(())
}

/// Scripted player: keeps the lure still, flicks the stick after a strike,
/// then reels steadily until the fight is over.
struct Angler {
    lure: Option<Vec2>,
    detector: HooksetDetector,
    flick_next: bool,
    fighting: bool,
}

impl Angler {
    fn new(lure: Option<Vec2>) -> Self {
        Self {
            lure,
            detector: HooksetDetector::new(),
            flick_next: false,
            fighting: false,
        }
    }

    fn input(&mut self, tick: u64, scenario: Scenario) -> TickInput {
        let stick = if self.flick_next { Vec2::Y } else { Vec2::ZERO };
        self.flick_next = false;
        let disturbance = (scenario == Scenario::Reef && tick == 900).then(|| vec2(800.0, 280.0));
        TickInput {
            lure: self.lure,
            reel: if self.fighting { 0.7 } else { 0.0 },
            hookset_attempt: self.detector.sample(stick),
            disturbance,
        }
    }

    fn observe(&mut self, event: &SimEvent) {
        match event {
            SimEvent::Strike { .. } => self.flick_next = true,
            SimEvent::Hookset { .. } => self.fighting = true,
            SimEvent::FightResolved { .. } | SimEvent::HooksetMissed { .. } => self.fighting = false,
            _ => {}
        }
    }
}

fn log_event(tick: u64, event: &SimEvent) {
    match event {
        SimEvent::AgentStateChanged { .. } | SimEvent::FightUpdate { .. } => {
            log::trace!("[{tick}] {event:?}")
        }
        SimEvent::Consumption { .. } | SimEvent::AgentRemoved { .. } => {
            log::debug!("[{tick}] {event:?}")
        }
        _ => log::info!("[{tick}] {event:?}"),
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;
    let mut sim_config = match &args.config {
        Some(path) => SimConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        sim_config.seed = seed;
    }
    let seed = sim_config.seed;
    let tackle = Tackle::new(
        LineConfig::new(12.0, LineMaterial::Fluorocarbon),
        ReelConfig::new(ReelKind::Spinning, 0.55),
    );

    let mut sim = Simulation::new(sim_config, tackle)?;
    populate(&mut sim, args.scenario)?;

    let lure = match args.scenario {
        Scenario::Fight => Some(sim.world().center()),
        Scenario::Reef => Some(sim.world().center() + vec2(0.0, 80.0)),
        Scenario::Frenzy => None,
    };
    let mut angler = Angler::new(lure);
    let mut summary = SessionSummary {
        scenario: format!("{:?}", args.scenario).to_ascii_lowercase(),
        seed,
        ..SessionSummary::default()
    };

    let ticks = args.ticks.unwrap_or_else(|| args.scenario.default_ticks());
    log::info!("running {} for {ticks} ticks ({} Hz)", summary.scenario, config::TICK_RATE);
    for _ in 0..ticks {
        let tick = sim.tick_count();
        let input = angler.input(tick, args.scenario);
        sim.tick(&input);
        for event in sim.drain_events() {
            log_event(tick, &event);
            angler.observe(&event);
            summary.record(&event);
        }
        summary.catches.extend(sim.drain_catches());
    }
    sim.force_end_fight();
    for event in sim.drain_events() {
        summary.record(&event);
    }

    summary.ticks = sim.tick_count();
    summary.live_agents = sim.list_visible_agents().len();
    summary.schools = sim.school_snapshots().len();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("[shoal] {e}");
        std::process::exit(1);
    }
}
