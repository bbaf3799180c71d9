//! Hookset window and the line-tension fight that follows it.
//!
//! Only one fight exists at a time. While a window or fight is open the
//! engine owns the struck agent: behavior skips it and only this module
//! moves it.

use glam::{vec2, Vec2};
use rand::Rng;
use serde::Serialize;

use crate::agent::{Agent, AgentId, BehaviorState, RemovalReason};
use crate::behavior::begin_flee;
use crate::config::FightTuning;
use crate::context::SimulationContext;
use crate::events::SimEvent;
use crate::input::TickInput;
use crate::species::Species;
use crate::tackle::Tackle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FightOutcome {
    Caught,
    Escaped,
}

/// A landed fish, queued for the host's trophy/statistics bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptureRecord {
    pub agent: AgentId,
    pub species: Species,
    pub weight_lb: f32,
    pub length_in: f32,
    pub fight_ticks: u32,
    pub tick: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fight {
    pub agent: AgentId,
    pub species: Species,
    pub weight_lb: f32,
    pub length_in: f32,
    pub tension: f32,
    pub drag_setting: f32,
    pub elapsed_ticks: u32,
    /// Line recovered so far; the fish is landed at `catch_distance`.
    pub retrieved: f32,
    pub break_threshold: f32,
    /// Drag as the reel actually applies it.
    effective_drag: f32,
    slack_ticks: u32,
    run_ticks_left: u32,
    run_surge: f32,
    next_run_at: u32,
    above_notable: bool,
    origin: Vec2,
}

impl Fight {
    fn new(fish: &Agent, tackle: &Tackle, tuning: &FightTuning) -> Self {
        Self {
            agent: fish.id,
            species: fish.species,
            weight_lb: fish.weight_lb,
            length_in: fish.length_in,
            tension: 0.0,
            drag_setting: tackle.reel.drag_setting,
            elapsed_ticks: 0,
            retrieved: 0.0,
            break_threshold: break_threshold(tuning, tackle, fish.weight_lb),
            effective_drag: tackle.reel.effective_drag(),
            slack_ticks: 0,
            run_ticks_left: 0,
            run_surge: 1.0,
            next_run_at: tuning.spike_interval_ticks,
            above_notable: false,
            origin: fish.pos,
        }
    }
}

/// Tension at which the line parts for a fish of `weight_lb` on this tackle.
///
/// Drag absorbs part of the load, shaped by the reel's drag curve; the result
/// never exceeds the tension ceiling, so a break stays reachable.
pub fn break_threshold(tuning: &FightTuning, tackle: &Tackle, weight_lb: f32) -> f32 {
    let line = tackle.line.test_strength_lb
        * tuning.break_per_lb_test
        * tackle.line.material.break_multiplier();
    let absorbed = tackle.reel.effective_drag() * tuning.drag_absorb;
    (line + absorbed - weight_lb * tuning.weight_shock_load)
        .min(tuning.tension_ceiling)
        .max(tuning.min_break_threshold)
}

#[derive(Clone, Debug, PartialEq)]
pub enum CapturePhase {
    Idle,
    HooksetWindow { agent: AgentId, remaining: u32 },
    /// Hookset landed this tick; the fight proper starts next step.
    Hooked(Fight),
    Fighting(Fight),
    Missed { agent: AgentId },
    Resolved { agent: AgentId, outcome: FightOutcome },
}

#[derive(Debug)]
pub struct CaptureEngine {
    phase: CapturePhase,
    catches: Vec<CaptureRecord>,
}

impl Default for CaptureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureEngine {
    pub fn new() -> Self {
        Self {
            phase: CapturePhase::Idle,
            catches: Vec::new(),
        }
    }

    pub fn phase(&self) -> &CapturePhase {
        &self.phase
    }

    pub fn fight(&self) -> Option<&Fight> {
        match &self.phase {
            CapturePhase::Hooked(fight) | CapturePhase::Fighting(fight) => Some(fight),
            _ => None,
        }
    }

    /// The agent the engine currently owns, if any.
    pub fn engaged_agent(&self) -> Option<AgentId> {
        match &self.phase {
            CapturePhase::HooksetWindow { agent, .. } => Some(*agent),
            CapturePhase::Hooked(fight) | CapturePhase::Fighting(fight) => Some(fight.agent),
            _ => None,
        }
    }

    /// Whether a new lure strike would be accepted.
    pub fn is_available(&self) -> bool {
        self.engaged_agent().is_none()
    }

    pub fn drain_catches(&mut self) -> Vec<CaptureRecord> {
        std::mem::take(&mut self.catches)
    }

    /// Open the hookset window on `agent`. Ignored while another window or fight is open.
    pub fn handle_strike(&mut self, ctx: &mut SimulationContext, agent: AgentId) -> bool {
        if !self.is_available() {
            log::debug!("strike by {:?} ignored, capture engine busy", agent);
            return false;
        }
        let Some(striker) = ctx.registry.get_live(agent) else {
            return false;
        };
        if striker.state != BehaviorState::Striking {
            return false;
        }
        self.phase = CapturePhase::HooksetWindow {
            agent,
            remaining: ctx.config.hookset_window_ticks,
        };
        log::debug!("hookset window open on {:?}", agent);
        true
    }

    /// Phase 4. Accept this tick's lure strikes, then advance the window or fight.
    ///
    /// Returns the fight outcome if one was reached this tick.
    pub fn step(
        &mut self,
        ctx: &mut SimulationContext,
        input: &TickInput,
        lure_strikes: &[AgentId],
    ) -> Option<FightOutcome> {
        if matches!(
            self.phase,
            CapturePhase::Missed { .. } | CapturePhase::Resolved { .. }
        ) {
            self.phase = CapturePhase::Idle;
        }
        for &agent in lure_strikes {
            self.handle_strike(ctx, agent);
        }

        match std::mem::replace(&mut self.phase, CapturePhase::Idle) {
            CapturePhase::HooksetWindow { agent, remaining } => {
                self.step_window(ctx, input, agent, remaining);
                None
            }
            CapturePhase::Hooked(fight) | CapturePhase::Fighting(fight) => {
                self.step_fight(ctx, input, fight)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    fn step_window(&mut self, ctx: &mut SimulationContext, input: &TickInput, agent: AgentId, remaining: u32) {
        if !ctx.registry.is_live(agent) {
            log::debug!("struck agent {:?} vanished during the window", agent);
            self.miss(ctx, agent);
            return;
        }
        if input.hookset_attempt {
            let felt = ctx.tackle.feel_roll(&mut ctx.rng);
            let tackle = ctx.tackle;
            let Some(fish) = ctx.registry.get_mut(agent) else {
                return;
            };
            fish.scheduled.clear();
            fish.target = None;
            fish.velocity = Vec2::ZERO;
            fish.transition(BehaviorState::Hooked, &mut ctx.events);
            let fight = Fight::new(fish, &tackle, &ctx.config.fight);
            log::info!(
                "{:?} hooked: {:.1} lb, line breaks at {:.1}",
                fish.species,
                fish.weight_lb,
                fight.break_threshold
            );
            ctx.events.push(SimEvent::Hookset { agent, felt });
            self.phase = CapturePhase::Hooked(fight);
            return;
        }

        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.phase = CapturePhase::HooksetWindow { agent, remaining };
        } else {
            self.miss(ctx, agent);
        }
    }

    fn miss(&mut self, ctx: &mut SimulationContext, agent: AgentId) {
        log::debug!("hookset window on {:?} expired", agent);
        let tick = ctx.tick;
        if let Some(fish) = ctx.registry.get_mut(agent).filter(|f| f.is_live()) {
            fish.scheduled.clear();
            let threat = fish.pos + fish.heading * 20.0;
            begin_flee(fish, threat, tick, &mut ctx.events);
        }
        ctx.events.push(SimEvent::HooksetMissed { agent });
        self.phase = CapturePhase::Missed { agent };
    }

    fn step_fight(
        &mut self,
        ctx: &mut SimulationContext,
        input: &TickInput,
        mut fight: Fight,
    ) -> Option<FightOutcome> {
        let Some(fish) = ctx.registry.get_live(fight.agent) else {
            log::info!("fish {:?} gone mid-fight", fight.agent);
            return Some(self.resolve(ctx, &fight, FightOutcome::Escaped));
        };
        let (weight, strength) = (fight.weight_lb, fish.species.profile().fight_strength);
        let tuning = &ctx.config.fight;
        let dt = ctx.dt();
        let reel = input.reel_clamped();
        fight.elapsed_ticks += 1;

        // Periodic runs: the fish surges and takes line.
        let mut run_started = false;
        if fight.run_ticks_left > 0 {
            fight.run_ticks_left -= 1;
        } else if fight.elapsed_ticks >= fight.next_run_at {
            fight.run_ticks_left = tuning.spike_duration_ticks;
            fight.run_surge = ctx.rng.gen_range(1.5..=2.0);
            fight.next_run_at = fight.elapsed_ticks
                + tuning.spike_interval_ticks
                + ctx.rng.gen_range(0..=tuning.spike_interval_ticks / 3);
            run_started = true;
        }
        let surge = if fight.run_ticks_left > 0 { fight.run_surge } else { 1.0 };
        let struggle = tuning.struggle_base * weight.sqrt() * strength * surge;

        let target = struggle + reel * tuning.reel_tension;
        fight.tension += (target - fight.tension) * tuning.tension_response;
        fight.tension = fight.tension.clamp(0.0, tuning.tension_ceiling);

        let retrieve = tuning.retrieve_speed
            * reel
            * ctx.tackle.reel.kind.retrieve_multiplier()
            * (1.0 - fight.effective_drag * tuning.drag_retrieve_slowdown);
        let line_out = tuning.run_factor * struggle;
        fight.retrieved = (fight.retrieved + (retrieve - line_out) * dt).max(0.0);
        fight.slack_ticks = if reel <= 0.0 { fight.slack_ticks + 1 } else { 0 };

        let notable = fight.tension >= fight.break_threshold * tuning.notable_spike;
        let crossed = notable && !fight.above_notable;
        fight.above_notable = notable;

        ctx.events.push(SimEvent::FightUpdate {
            agent: fight.agent,
            tension: fight.tension,
            drag_setting: fight.drag_setting,
            elapsed_ticks: fight.elapsed_ticks,
            retrieved: fight.retrieved,
        });
        if run_started || crossed {
            let felt = ctx.tackle.feel_roll(&mut ctx.rng);
            ctx.events.push(SimEvent::TensionSpike {
                agent: fight.agent,
                tension: fight.tension,
                felt,
            });
        }

        let outcome = if fight.tension >= fight.break_threshold {
            log::info!("line broke at tension {:.1}", fight.tension);
            Some(FightOutcome::Escaped)
        } else if fight.slack_ticks >= tuning.slack_escape_ticks {
            log::info!("fish threw the hook on a slack line");
            Some(FightOutcome::Escaped)
        } else if fight.retrieved >= tuning.catch_distance {
            Some(FightOutcome::Caught)
        } else {
            None
        };
        if let Some(outcome) = outcome {
            return Some(self.resolve(ctx, &fight, outcome));
        }

        self.drive_fish(ctx, &fight, struggle);
        self.phase = CapturePhase::Fighting(fight);
        None
    }

    /// Reel the fish from where it was hooked toward the surface, thrashing sideways.
    fn drive_fish(&self, ctx: &mut SimulationContext, fight: &Fight, struggle: f32) {
        let dt = ctx.dt();
        let progress = (fight.retrieved / ctx.config.fight.catch_distance).clamp(0.0, 1.0);
        let surface = vec2(fight.origin.x, 0.0);
        let thrash = (fight.elapsed_ticks as f32 * 0.3).sin() * struggle * 0.3;
        let pos = ctx
            .world
            .clamp(fight.origin.lerp(surface, progress) + vec2(thrash, 0.0));
        if let Some(fish) = ctx.registry.get_mut(fight.agent) {
            let delta = pos - fish.pos;
            fish.velocity = delta / dt;
            if delta.length_squared() > 1e-6 {
                fish.heading = delta.normalize();
            }
            fish.pos = pos;
        }
    }

    fn resolve(&mut self, ctx: &mut SimulationContext, fight: &Fight, outcome: FightOutcome) -> FightOutcome {
        let tick = ctx.tick;
        let fish = ctx.registry.get_mut(fight.agent).filter(|f| f.is_live());
        // A fish that is already gone can only have escaped.
        let outcome = if fish.is_none() { FightOutcome::Escaped } else { outcome };
        if let Some(fish) = fish {
            match outcome {
                FightOutcome::Caught => {
                    fish.mark_removed(RemovalReason::Caught);
                    self.catches.push(CaptureRecord {
                        agent: fight.agent,
                        species: fight.species,
                        weight_lb: fight.weight_lb,
                        length_in: fight.length_in,
                        fight_ticks: fight.elapsed_ticks,
                        tick,
                    });
                }
                FightOutcome::Escaped => {
                    let threat = fish.pos - Vec2::Y * 20.0;
                    begin_flee(fish, threat, tick, &mut ctx.events);
                }
            }
        }
        log::info!(
            "fight on {:?} resolved: {:?} ({:?}, {:.1} lb) after {} ticks",
            fight.agent,
            outcome,
            fight.species,
            fight.weight_lb,
            fight.elapsed_ticks
        );
        ctx.events.push(SimEvent::FightResolved {
            agent: fight.agent,
            outcome,
            weight_lb: fight.weight_lb,
            length_in: fight.length_in,
            species: fight.species,
        });
        self.phase = CapturePhase::Resolved {
            agent: fight.agent,
            outcome,
        };
        outcome
    }

    /// Cancel any open window or fight. The registry is left with no agent in `Hooked`.
    pub fn force_end(&mut self, ctx: &mut SimulationContext) -> Option<FightOutcome> {
        match std::mem::replace(&mut self.phase, CapturePhase::Idle) {
            CapturePhase::HooksetWindow { agent, .. } => {
                self.miss(ctx, agent);
                None
            }
            CapturePhase::Hooked(fight) | CapturePhase::Fighting(fight) => {
                log::info!("fight on {:?} force-ended", fight.agent);
                Some(self.resolve(ctx, &fight, FightOutcome::Escaped))
            }
            other => {
                self.phase = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::config::SimConfig;
    use crate::species::SizeClass;
    use crate::tackle::{LineConfig, LineMaterial, ReelConfig, ReelKind};

    fn context(test_lb: f32, drag: f32) -> SimulationContext {
        let tackle = Tackle::new(
            LineConfig::new(test_lb, LineMaterial::Monofilament),
            ReelConfig::new(ReelKind::Spinning, drag),
        );
        SimulationContext::new(SimConfig::with_seed(9), tackle)
    }

    fn striking_fish(ctx: &mut SimulationContext, weight_lb: f32) -> AgentId {
        let mut fish = Agent::with_dimensions(
            Species::LargemouthBass,
            SizeClass::Large,
            vec2(800.0, 400.0),
            weight_lb,
            20.0,
        );
        fish.state = BehaviorState::Striking;
        ctx.registry.spawn(fish).unwrap()
    }

    fn hook(ctx: &mut SimulationContext, engine: &mut CaptureEngine, fish: AgentId) {
        let input = TickInput {
            hookset_attempt: true,
            ..TickInput::default()
        };
        assert_eq!(engine.step(ctx, &input, &[fish]), None);
        assert!(matches!(engine.phase(), CapturePhase::Hooked(_)));
        assert_eq!(ctx.registry.get(fish).unwrap().state, BehaviorState::Hooked);
    }

    fn reel(amount: f32) -> TickInput {
        TickInput {
            reel: amount,
            ..TickInput::default()
        }
    }

    #[test]
    fn break_threshold_follows_line_drag_and_weight() {
        let tuning = FightTuning::default();
        let light = context(6.0, 0.3).tackle;
        assert!((break_threshold(&tuning, &light, 8.0) - 35.5).abs() < 1e-3);
        let heavy = context(80.0, 1.0).tackle;
        assert_eq!(break_threshold(&tuning, &heavy, 1.0), tuning.tension_ceiling);
        let tiny = context(2.0, 0.0).tackle;
        assert_eq!(break_threshold(&tuning, &tiny, 40.0), tuning.min_break_threshold);
    }

    #[test]
    fn heavy_fish_on_light_line_breaks_off() {
        let mut ctx = context(6.0, 0.3);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 8.0);
        hook(&mut ctx, &mut engine, fish);

        let mut outcome = None;
        for _ in 0..60 {
            outcome = engine.step(&mut ctx, &reel(1.0), &[]);
            if let Some(fight) = engine.fight() {
                assert!(fight.tension >= 0.0 && fight.tension <= ctx.config.fight.tension_ceiling);
            }
            ctx.tick += 1;
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(FightOutcome::Escaped));
        let agent = ctx.registry.get(fish).unwrap();
        assert_eq!(agent.state, BehaviorState::Fleeing);
        assert!(agent.is_live());
        assert!(engine.drain_catches().is_empty());
        assert!(ctx.events.iter().any(|e| matches!(
            e,
            SimEvent::FightResolved {
                outcome: FightOutcome::Escaped,
                ..
            }
        )));
    }

    #[test]
    fn small_fish_on_strong_line_is_landed() {
        let mut ctx = context(15.0, 0.6);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 2.0);
        hook(&mut ctx, &mut engine, fish);

        let mut outcome = None;
        let mut peak = 0.0f32;
        for i in 0..1200 {
            let amount = if i % 2 == 0 { 0.6 } else { 0.8 };
            outcome = engine.step(&mut ctx, &reel(amount), &[]);
            if let Some(fight) = engine.fight() {
                peak = peak.max(fight.tension);
            }
            ctx.tick += 1;
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(FightOutcome::Caught));
        assert!(peak < ctx.config.fight.tension_ceiling);
        assert_eq!(
            ctx.registry.get(fish).unwrap().removal,
            Some(RemovalReason::Caught)
        );
        let catches = engine.drain_catches();
        assert_eq!(catches.len(), 1);
        assert_eq!(catches[0].weight_lb, 2.0);
        assert!(catches[0].fight_ticks > 0);
    }

    #[test]
    fn unanswered_window_misses_and_the_fish_flees() {
        let mut ctx = context(10.0, 0.5);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 3.0);

        engine.step(&mut ctx, &TickInput::default(), &[fish]);
        for _ in 1..ctx.config.hookset_window_ticks {
            assert!(matches!(engine.phase(), CapturePhase::HooksetWindow { .. }));
            engine.step(&mut ctx, &TickInput::default(), &[]);
        }
        assert_eq!(engine.phase(), &CapturePhase::Missed { agent: fish });
        assert_eq!(ctx.registry.get(fish).unwrap().state, BehaviorState::Fleeing);
        assert!(ctx
            .events
            .iter()
            .any(|e| *e == SimEvent::HooksetMissed { agent: fish }));
        assert!(engine.is_available());
    }

    #[test]
    fn second_strike_during_a_window_is_ignored() {
        let mut ctx = context(10.0, 0.5);
        let mut engine = CaptureEngine::new();
        let first = striking_fish(&mut ctx, 3.0);
        let second = striking_fish(&mut ctx, 4.0);

        engine.step(&mut ctx, &TickInput::default(), &[first, second]);
        assert_eq!(engine.engaged_agent(), Some(first));
        assert!(!engine.handle_strike(&mut ctx, second));
        assert_eq!(engine.engaged_agent(), Some(first));
    }

    #[test]
    fn fish_despawned_mid_fight_counts_as_escaped() {
        let mut ctx = context(10.0, 0.5);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 3.0);
        hook(&mut ctx, &mut engine, fish);
        engine.step(&mut ctx, &reel(0.5), &[]);

        ctx.registry
            .get_mut(fish)
            .unwrap()
            .mark_removed(RemovalReason::Expired);
        assert_eq!(
            engine.step(&mut ctx, &reel(0.5), &[]),
            Some(FightOutcome::Escaped)
        );
        assert!(engine.is_available());
    }

    #[test]
    fn fish_gone_during_the_window_is_a_miss() {
        let mut ctx = context(10.0, 0.5);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 3.0);
        engine.step(&mut ctx, &TickInput::default(), &[fish]);

        ctx.registry
            .get_mut(fish)
            .unwrap()
            .mark_removed(RemovalReason::Expired);
        ctx.events.drain();
        engine.step(&mut ctx, &TickInput::default(), &[]);
        assert_eq!(engine.phase(), &CapturePhase::Missed { agent: fish });
        assert_eq!(ctx.events.drain(), vec![SimEvent::HooksetMissed { agent: fish }]);
        assert_eq!(
            ctx.registry.get(fish).unwrap().state,
            BehaviorState::Striking,
            "removed fish is not sent fleeing"
        );
    }

    #[test]
    fn freed_fish_still_resolves_with_its_hookset_details() {
        let mut ctx = context(10.0, 0.5);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 3.0);
        hook(&mut ctx, &mut engine, fish);
        engine.step(&mut ctx, &reel(0.5), &[]);

        ctx.registry
            .get_mut(fish)
            .unwrap()
            .mark_removed(RemovalReason::Expired);
        ctx.registry.sweep_removed();
        assert!(ctx.registry.get(fish).is_none());
        ctx.events.drain();

        assert_eq!(
            engine.step(&mut ctx, &reel(0.5), &[]),
            Some(FightOutcome::Escaped)
        );
        assert_eq!(
            ctx.events.drain(),
            vec![SimEvent::FightResolved {
                agent: fish,
                outcome: FightOutcome::Escaped,
                weight_lb: 3.0,
                length_in: 20.0,
                species: Species::LargemouthBass,
            }]
        );
    }

    #[test]
    fn runs_raise_a_tension_spike_with_a_feel_roll() {
        for (sensitivity, felt) in [(1.0, true), (0.0, false)] {
            let mut ctx = context(15.0, 0.6);
            ctx.tackle.line.sensitivity = sensitivity;
            let mut engine = CaptureEngine::new();
            let fish = striking_fish(&mut ctx, 2.0);
            hook(&mut ctx, &mut engine, fish);
            ctx.events.drain();

            let spike_at = ctx.config.fight.spike_interval_ticks;
            for _ in 1..spike_at {
                assert_eq!(engine.step(&mut ctx, &reel(0.6), &[]), None);
            }
            assert!(
                !ctx.events.iter().any(|e| matches!(e, SimEvent::TensionSpike { .. })),
                "calm fight has no spikes before the first run"
            );

            engine.step(&mut ctx, &reel(0.6), &[]);
            let spikes: Vec<bool> = ctx
                .events
                .iter()
                .filter_map(|e| match e {
                    SimEvent::TensionSpike { agent, felt, .. } if *agent == fish => Some(*felt),
                    _ => None,
                })
                .collect();
            assert_eq!(spikes, vec![felt]);
        }
    }

    #[test]
    fn tension_nearing_the_break_is_signalled_once() {
        let mut ctx = context(6.0, 0.3);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 8.0);
        hook(&mut ctx, &mut engine, fish);
        ctx.events.drain();

        let mut outcome = None;
        while outcome.is_none() {
            outcome = engine.step(&mut ctx, &reel(1.0), &[]);
        }
        let events = ctx.events.drain();
        let spikes: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::TensionSpike { tension, .. } => Some(*tension),
                _ => None,
            })
            .collect();
        let threshold = break_threshold(&ctx.config.fight, &ctx.tackle, 8.0);
        assert_eq!(spikes.len(), 1);
        assert!(spikes[0] >= threshold * ctx.config.fight.notable_spike);
        assert!(spikes[0] < threshold);
        let spike_at = events
            .iter()
            .position(|e| matches!(e, SimEvent::TensionSpike { .. }));
        let resolved_at = events
            .iter()
            .position(|e| matches!(e, SimEvent::FightResolved { .. }));
        assert!(spike_at < resolved_at);
    }

    #[test]
    fn reel_kind_shapes_the_drag_curve() {
        let tuning = FightTuning::default();
        let with_reel = |kind| {
            Tackle::new(
                LineConfig::new(10.0, LineMaterial::Monofilament),
                ReelConfig::new(kind, 0.9),
            )
        };
        let spincast = break_threshold(&tuning, &with_reel(ReelKind::Spincast), 3.0);
        let spinning = break_threshold(&tuning, &with_reel(ReelKind::Spinning), 3.0);
        let baitcaster = break_threshold(&tuning, &with_reel(ReelKind::Baitcaster), 3.0);
        assert!(spincast < spinning && spinning < baitcaster);
        assert!((spinning - (60.0 + 0.9 * 25.0 - 3.0)).abs() < 1e-3);
    }

    #[test]
    fn slack_line_lets_the_fish_go() {
        let mut ctx = context(20.0, 0.5);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 3.0);
        hook(&mut ctx, &mut engine, fish);

        let mut outcome = None;
        for _ in 0..ctx.config.fight.slack_escape_ticks {
            outcome = engine.step(&mut ctx, &reel(0.0), &[]);
        }
        assert_eq!(outcome, Some(FightOutcome::Escaped));
    }

    #[test]
    fn force_end_releases_the_fish() {
        let mut ctx = context(10.0, 0.5);
        let mut engine = CaptureEngine::new();
        let fish = striking_fish(&mut ctx, 3.0);
        hook(&mut ctx, &mut engine, fish);
        engine.step(&mut ctx, &reel(0.5), &[]);

        assert_eq!(engine.force_end(&mut ctx), Some(FightOutcome::Escaped));
        assert!(engine.is_available());
        assert_eq!(ctx.registry.get(fish).unwrap().state, BehaviorState::Fleeing);
        assert_eq!(engine.force_end(&mut ctx), None, "nothing left to end");
    }
}
