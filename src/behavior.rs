//! Per-agent decision logic: idle / hunt / chase / strike / flee, with a frenzy overlay.

use glam::{vec2, Vec2};
use rand::Rng;

use crate::agent::{Agent, AgentId, BehaviorState, ScheduledKind, TargetRef};
use crate::config;
use crate::context::SimulationContext;
use crate::events::{EventQueue, SimEvent};
use crate::input::TickInput;
use crate::physics;
use crate::school::{GroupRef, PreyGroup, SchoolCoordinator};
use crate::species::{Role, SpeciesProfile};

/// A predator committed to a strike on a prey group this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreyStrike {
    pub predator: AgentId,
    pub group: GroupRef,
}

/// Strikes produced by the behavior phase, handed to the later phases.
#[derive(Debug, Default)]
pub struct BehaviorOutput {
    pub prey_strikes: Vec<PreyStrike>,
    pub lure_strikes: Vec<AgentId>,
}

/// Something a predator could go after.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub target: TargetRef,
    pub pos: Vec2,
    pub distance: f32,
}

/// Nearest candidate; near-equidistant candidates resolve to the one most in
/// line with `heading`, so the fish doesn't visibly reverse.
pub fn pick_target(candidates: &[Candidate], from: Vec2, heading: Vec2) -> Option<Candidate> {
    let nearest = candidates
        .iter()
        .map(|c| c.distance)
        .fold(f32::INFINITY, f32::min);
    let mut best: Option<(Candidate, f32)> = None;
    for c in candidates {
        if c.distance > nearest + config::TIE_DISTANCE_EPSILON {
            continue;
        }
        let alignment = heading.dot((c.pos - from).normalize_or_zero());
        match best {
            Some((_, best_alignment)) if alignment <= best_alignment => {}
            _ => best = Some((*c, alignment)),
        }
    }
    best.map(|(c, _)| c)
}

/// What one agent wants this tick, computed read-only and applied afterwards.
#[derive(Debug, Default)]
struct Intent {
    next: Option<BehaviorState>,
    /// `Some(x)` replaces the target with `x`.
    target: Option<Option<TargetRef>>,
    desired: Vec2,
    threat: Option<Vec2>,
    cooldown: Option<u32>,
    strike: Option<TargetRef>,
    strike_chance: f32,
    flip_bias: bool,
}

impl Intent {
    fn go_idle(&mut self, cooldown: u32) {
        self.next = Some(BehaviorState::Idle);
        self.target = Some(None);
        self.cooldown = Some(cooldown);
    }
}

fn decision_cooldown(frenzied: bool) -> u32 {
    if frenzied {
        config::DECISION_COOLDOWN_TICKS / 2
    } else {
        config::DECISION_COOLDOWN_TICKS
    }
}

fn strike_chance(frenzied: bool, desperate: bool) -> f32 {
    let mut chance = config::BASE_STRIKE_CHANCE;
    if frenzied {
        chance += config::FRENZY_STRIKE_BONUS;
    }
    if desperate {
        chance += config::DESPERATE_STRIKE_BONUS;
    }
    chance.min(1.0)
}

fn idle_velocity(agent: &Agent, tick: u64, profile: &SpeciesProfile) -> Vec2 {
    let sway = (tick as f32 * 0.02 + agent.id.index as f32).sin() * 0.3;
    vec2(agent.idle_bias, sway) * profile.cruise_speed * config::IDLE_SPEED_FRACTION
}

fn flee_velocity(agent: &Agent, threat: Vec2, profile: &SpeciesProfile) -> Vec2 {
    let away = (agent.pos - threat).normalize_or_zero();
    let dir = if away == Vec2::ZERO { -agent.heading } else { away };
    dir * profile.burst_speed * 0.8
}

fn should_flip_bias(agent: &Agent, width: f32) -> bool {
    (agent.pos.x < config::BOUNDARY_MARGIN && agent.idle_bias < 0.0)
        || (agent.pos.x > width - config::BOUNDARY_MARGIN && agent.idle_bias > 0.0)
}

fn calm_since_threat(agent: &Agent, tick: u64) -> bool {
    agent.state_ticks >= config::FLEE_TICKS
        && agent
            .threat
            .map_or(true, |(_, at)| tick.saturating_sub(at) >= config::FLEE_TICKS as u64)
}

/// Enter `Fleeing` away from `threat`. Used for post-strike retreat too.
pub fn begin_flee(agent: &mut Agent, threat: Vec2, tick: u64, events: &mut EventQueue) {
    agent.target = None;
    agent.threat = Some((threat, tick));
    agent.cooldown = config::DECISION_COOLDOWN_TICKS;
    agent.transition(BehaviorState::Fleeing, events);
}

#[derive(Debug, Default)]
pub struct BehaviorStateMachine;

impl BehaviorStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Phase 2: one decision per live agent, in slot order.
    ///
    /// `frozen` is the agent the capture engine currently owns; it is not touched.
    /// The lure takes at most one strike per tick: once it is struck, later
    /// agents see it as gone.
    pub fn step(
        &mut self,
        ctx: &mut SimulationContext,
        schools: &mut SchoolCoordinator,
        frozen: Option<AgentId>,
        mut lure_available: bool,
        input: &TickInput,
    ) -> BehaviorOutput {
        let mut out = BehaviorOutput::default();
        let tick = ctx.tick;

        for id in ctx.registry.live_ids() {
            if frozen == Some(id) {
                continue;
            }
            {
                let Some(agent) = ctx.registry.get_mut(id) else {
                    continue;
                };
                if agent.state == BehaviorState::Hooked || !agent.is_live() {
                    continue;
                }
                advance_timers(agent, tick, &mut ctx.events);
            }

            // Re-run the scored search while closing in, so the strike hits the cached pick.
            let selected = match ctx.registry.get(id) {
                Some(agent)
                    if matches!(agent.state, BehaviorState::Hunting | BehaviorState::Chasing) =>
                {
                    match agent.target {
                        Some(TargetRef::Prey(group)) => schools.select_prey(
                            id,
                            agent.pos,
                            group,
                            &ctx.registry,
                            &ctx.config.target_scoring,
                        ),
                        _ => None,
                    }
                }
                _ => None,
            };

            let intent = {
                let view: &SimulationContext = ctx;
                let Some(me) = view.registry.get(id) else {
                    continue;
                };
                match me.role {
                    Role::Predator => {
                        decide_predator(view, schools, me, selected, input, lure_available)
                    }
                    Role::Baitfish | Role::Forage => decide_prey(view, me, input),
                }
            };
            apply(ctx, id, intent, &mut out);
            if !out.lure_strikes.is_empty() {
                lure_available = false;
            }
        }
        out
    }
}

fn advance_timers(agent: &mut Agent, tick: u64, events: &mut EventQueue) {
    agent.age_ticks += 1;
    agent.state_ticks = agent.state_ticks.saturating_add(1);
    agent.cooldown = agent.cooldown.saturating_sub(1);
    for action in agent.take_due(tick) {
        match action.kind {
            ScheduledKind::Retreat => {
                if agent.state == BehaviorState::Striking {
                    let threat = agent.pos + agent.heading * 20.0;
                    begin_flee(agent, threat, tick, events);
                }
            }
            ScheduledKind::EndFrenzy => agent.frenzy_until = None,
        }
    }
}

fn target_position(
    ctx: &SimulationContext,
    schools: &SchoolCoordinator,
    target: TargetRef,
    selected: Option<AgentId>,
    input: &TickInput,
    lure_available: bool,
) -> Option<Vec2> {
    match target {
        TargetRef::Lure => input.lure.filter(|_| lure_available),
        TargetRef::Prey(group) => selected
            .and_then(|prey| ctx.registry.get_live(prey))
            .map(|prey| prey.pos)
            .or_else(|| schools.resolve(group, &ctx.registry).map(|g| g.center())),
    }
}

fn gather_candidates(
    ctx: &SimulationContext,
    schools: &SchoolCoordinator,
    me: &Agent,
    detection: f32,
    input: &TickInput,
    lure_available: bool,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    if lure_available {
        if let Some(lure) = input.lure {
            let distance = me.pos.distance(lure);
            if distance <= detection {
                candidates.push(Candidate {
                    target: TargetRef::Lure,
                    pos: lure,
                    distance,
                });
            }
        }
    }
    for group in schools.prey_groups(&ctx.registry) {
        if !me.role.can_eat(group.role()) {
            continue;
        }
        let pos = group.center();
        let distance = me.pos.distance(pos);
        if distance <= detection {
            candidates.push(Candidate {
                target: TargetRef::Prey(group.group_ref()),
                pos,
                distance,
            });
        }
    }
    candidates
}

/// External disturbance in range, or a much bigger predator rushing nearby.
fn predator_threat(ctx: &SimulationContext, me: &Agent, input: &TickInput) -> Option<Vec2> {
    if let Some(splash) = input.disturbance {
        if me.pos.distance(splash) <= config::DISTURBANCE_RADIUS {
            return Some(splash);
        }
    }
    let rush_radius = config::DISTURBANCE_RADIUS * 0.5;
    ctx.spatial
        .query_radius_excluding(me.pos, rush_radius, me.id, &ctx.world, &ctx.registry)
        .into_iter()
        .filter_map(|id| ctx.registry.get_live(id))
        .filter(|other| {
            other.role == Role::Predator
                && other.weight_lb > me.weight_lb * 2.0
                && matches!(other.state, BehaviorState::Chasing | BehaviorState::Striking)
        })
        .map(|other| other.pos)
        .min_by(|a, b| me.pos.distance_squared(*a).total_cmp(&me.pos.distance_squared(*b)))
}

fn decide_predator(
    ctx: &SimulationContext,
    schools: &SchoolCoordinator,
    me: &Agent,
    selected: Option<AgentId>,
    input: &TickInput,
    lure_available: bool,
) -> Intent {
    let profile = me.species.profile();
    let tick = ctx.tick;
    let frenzied = me.is_frenzied(tick);
    let desperate = me.hunger > config::CRITICAL_HUNGER;
    let mut detection = profile.detection_radius;
    if frenzied {
        detection *= config::FRENZY_DETECTION_MULT;
    }
    if desperate {
        detection *= config::DESPERATE_DETECTION_MULT;
    }
    let mut intent = Intent {
        strike_chance: strike_chance(frenzied, desperate),
        ..Intent::default()
    };

    // Striking only ever leaves through the scheduled retreat.
    if me.state == BehaviorState::Striking {
        intent.desired = me
            .target
            .and_then(|t| target_position(ctx, schools, t, selected, input, lure_available))
            .map(|pos| physics::seek(me.pos, pos, profile.burst_speed * 1.2))
            .unwrap_or(me.velocity);
        return intent;
    }

    let low_health = me.health < config::LOW_HEALTH && !desperate;
    let threat = predator_threat(ctx, me, input)
        .or_else(|| low_health.then(|| me.pos + me.heading * 20.0));
    if let Some(threat) = threat {
        intent.threat = Some(threat);
        if me.state != BehaviorState::Fleeing {
            intent.next = Some(BehaviorState::Fleeing);
            intent.target = Some(None);
            intent.cooldown = Some(config::DECISION_COOLDOWN_TICKS);
        }
        intent.desired = flee_velocity(me, threat, &profile);
        return intent;
    }

    let tracked = me.target.and_then(|target| {
        target_position(ctx, schools, target, selected, input, lure_available).map(|pos| (target, pos))
    });
    if matches!(me.state, BehaviorState::Hunting | BehaviorState::Chasing) && tracked.is_none() {
        log::debug!("agent {:?} lost target {:?}, back to idle", me.id, me.target);
        intent.go_idle(config::DECISION_COOLDOWN_TICKS);
        intent.desired = idle_velocity(me, tick, &profile);
        return intent;
    }

    match (me.state, tracked) {
        (BehaviorState::Idle, _) => {
            intent.desired = idle_velocity(me, tick, &profile);
            intent.flip_bias = should_flip_bias(me, ctx.world.width);
            let hungry = me.hunger > profile.hunger_threshold || frenzied;
            if me.cooldown == 0 && hungry {
                let candidates = gather_candidates(ctx, schools, me, detection, input, lure_available);
                if let Some(choice) = pick_target(&candidates, me.pos, me.heading) {
                    intent.next = Some(BehaviorState::Hunting);
                    intent.target = Some(Some(choice.target));
                }
            }
        }
        (BehaviorState::Hunting, Some((_, pos))) => {
            let distance = me.pos.distance(pos);
            intent.desired = physics::seek(me.pos, pos, profile.cruise_speed * 1.5);
            let chase_radius = if frenzied {
                profile.chase_radius * config::FRENZY_DETECTION_MULT
            } else {
                profile.chase_radius
            };
            if distance <= chase_radius {
                intent.next = Some(BehaviorState::Chasing);
            } else if distance > detection * config::LOST_TARGET_FACTOR
                || me.state_ticks >= config::HUNT_GRACE_TICKS
            {
                intent.go_idle(decision_cooldown(frenzied));
            }
        }
        (BehaviorState::Chasing, Some((target, pos))) => {
            let distance = me.pos.distance(pos);
            intent.desired = physics::seek(me.pos, pos, profile.burst_speed);
            if distance > detection * config::LOST_TARGET_FACTOR {
                intent.go_idle(decision_cooldown(frenzied));
            } else if distance <= profile.strike_radius && me.cooldown == 0 {
                intent.strike = Some(target);
                intent.cooldown = Some(decision_cooldown(frenzied));
            }
        }
        (BehaviorState::Fleeing, _) => {
            let threat = me.threat.map_or(me.pos - me.heading, |(pos, _)| pos);
            intent.desired = flee_velocity(me, threat, &profile);
            if calm_since_threat(me, tick) {
                intent.next = Some(BehaviorState::Idle);
                intent.cooldown = Some(config::DECISION_COOLDOWN_TICKS);
            }
        }
        _ => {}
    }
    intent
}

fn decide_prey(ctx: &SimulationContext, me: &Agent, input: &TickInput) -> Intent {
    let profile = me.species.profile();
    let tick = ctx.tick;
    let mut intent = Intent {
        flip_bias: should_flip_bias(me, ctx.world.width),
        ..Intent::default()
    };

    // Plankton just drifts.
    if me.role == Role::Forage {
        intent.desired = idle_velocity(me, tick, &profile);
        return intent;
    }

    let disturbance = input
        .disturbance
        .filter(|d| me.pos.distance(*d) <= config::DISTURBANCE_RADIUS);
    let threat = disturbance.or_else(|| {
        ctx.spatial
            .query_radius(me.pos, config::PREY_ALARM_RADIUS, &ctx.world, &ctx.registry)
            .into_iter()
            .filter_map(|id| ctx.registry.get_live(id))
            .filter(|p| {
                p.role.can_eat(me.role)
                    && matches!(p.state, BehaviorState::Chasing | BehaviorState::Striking)
            })
            .map(|p| p.pos)
            .min_by(|a, b| me.pos.distance_squared(*a).total_cmp(&me.pos.distance_squared(*b)))
    });

    match threat {
        Some(threat) => {
            intent.threat = Some(threat);
            if me.state != BehaviorState::Fleeing {
                intent.next = Some(BehaviorState::Fleeing);
            }
            intent.desired = flee_velocity(me, threat, &profile);
        }
        None if me.state == BehaviorState::Fleeing => {
            let from = me.threat.map_or(me.pos - me.heading, |(pos, _)| pos);
            intent.desired = flee_velocity(me, from, &profile);
            if calm_since_threat(me, tick) {
                intent.next = Some(BehaviorState::Idle);
            }
        }
        None => intent.desired = idle_velocity(me, tick, &profile) * 1.5,
    }
    intent
}

fn apply(ctx: &mut SimulationContext, id: AgentId, intent: Intent, out: &mut BehaviorOutput) {
    let tick = ctx.tick;
    let dt = ctx.dt();
    let struck = intent
        .strike
        .filter(|_| ctx.rng.gen::<f32>() < intent.strike_chance);
    let felt = matches!(struck, Some(TargetRef::Lure)) && ctx.tackle.feel_roll(&mut ctx.rng);

    let Some(agent) = ctx.registry.get_mut(id) else {
        return;
    };
    if intent.flip_bias {
        agent.idle_bias = -agent.idle_bias;
    }
    if let Some(cooldown) = intent.cooldown {
        agent.cooldown = cooldown;
    }
    if let Some(target) = intent.target {
        agent.target = target;
    }
    if let Some(threat) = intent.threat {
        agent.threat = Some((threat, tick));
    }
    if let Some(next) = intent.next {
        agent.transition(next, &mut ctx.events);
    }

    if let Some(target) = struck {
        agent.transition(BehaviorState::Striking, &mut ctx.events);
        agent.schedule(tick + config::STRIKE_RECOVERY_TICKS as u64, ScheduledKind::Retreat);
        match target {
            TargetRef::Lure => {
                ctx.events.push(SimEvent::Strike { agent: id, felt });
                out.lure_strikes.push(id);
            }
            TargetRef::Prey(group) => out.prey_strikes.push(PreyStrike {
                predator: id,
                group,
            }),
        }
    }

    // School members are positioned by their school.
    if agent.school.is_none() {
        physics::steer(agent, intent.desired, dt);
        physics::integrate(agent, &ctx.world, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RemovalReason;
    use crate::config::SimConfig;
    use crate::species::{SizeClass, Species};
    use crate::tackle::Tackle;

    fn context() -> SimulationContext {
        SimulationContext::new(SimConfig::with_seed(5), Tackle::default())
    }

    fn spawn_bass(ctx: &mut SimulationContext, pos: Vec2, hunger: f32) -> AgentId {
        let mut bass =
            Agent::with_dimensions(Species::LargemouthBass, SizeClass::Medium, pos, 3.0, 15.0);
        bass.hunger = hunger;
        ctx.registry.spawn(bass).unwrap()
    }

    fn run(
        machine: &mut BehaviorStateMachine,
        ctx: &mut SimulationContext,
        schools: &mut SchoolCoordinator,
        input: &TickInput,
    ) -> BehaviorOutput {
        ctx.rebuild_spatial();
        let out = machine.step(ctx, schools, None, true, input);
        ctx.tick += 1;
        out
    }

    #[test]
    fn equidistant_targets_prefer_current_heading() {
        let from = vec2(100.0, 100.0);
        let behind = Candidate {
            target: TargetRef::Lure,
            pos: vec2(50.0, 100.0),
            distance: 50.0,
        };
        let ahead = Candidate {
            target: TargetRef::Prey(GroupRef::School(crate::school::SchoolId(3))),
            pos: vec2(150.0, 100.0),
            distance: 50.0,
        };
        let far_ahead = Candidate {
            distance: 90.0,
            pos: vec2(190.0, 100.0),
            ..ahead
        };
        assert_eq!(pick_target(&[behind, ahead], from, Vec2::X), Some(ahead));
        assert_eq!(pick_target(&[ahead, behind], from, Vec2::NEG_X), Some(behind));
        assert_eq!(pick_target(&[far_ahead, behind], from, Vec2::X), Some(behind));
        assert_eq!(pick_target(&[], from, Vec2::X), None);
    }

    #[test]
    fn hungry_idle_predator_starts_hunting_the_lure() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let bass = spawn_bass(&mut ctx, vec2(500.0, 300.0), 60.0);
        let input = TickInput::with_lure(vec2(600.0, 300.0));

        run(&mut machine, &mut ctx, &mut schools, &input);
        let agent = ctx.registry.get(bass).unwrap();
        assert_eq!(agent.state, BehaviorState::Hunting);
        assert_eq!(agent.target, Some(TargetRef::Lure));
        assert!(ctx.events.iter().any(|e| matches!(
            e,
            SimEvent::AgentStateChanged {
                new_state: BehaviorState::Hunting,
                ..
            }
        )));
    }

    #[test]
    fn sated_predator_ignores_the_lure() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let bass = spawn_bass(&mut ctx, vec2(500.0, 300.0), 10.0);
        let input = TickInput::with_lure(vec2(600.0, 300.0));

        run(&mut machine, &mut ctx, &mut schools, &input);
        assert_eq!(ctx.registry.get(bass).unwrap().state, BehaviorState::Idle);
    }

    #[test]
    fn stale_prey_target_falls_back_to_idle_with_cooldown() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let bass = spawn_bass(&mut ctx, vec2(500.0, 300.0), 60.0);
        let shad = ctx
            .registry
            .spawn(Agent::with_dimensions(
                Species::Shad,
                SizeClass::Small,
                vec2(540.0, 300.0),
                0.3,
                6.0,
            ))
            .unwrap();
        {
            let agent = ctx.registry.get_mut(bass).unwrap();
            agent.state = BehaviorState::Chasing;
            agent.target = Some(TargetRef::Prey(GroupRef::Solitary(shad)));
        }
        ctx.registry.get_mut(shad).unwrap().mark_removed(RemovalReason::Consumed);

        run(&mut machine, &mut ctx, &mut schools, &TickInput::default());
        let agent = ctx.registry.get(bass).unwrap();
        assert_eq!(agent.state, BehaviorState::Idle);
        assert_eq!(agent.target, None);
        assert_eq!(agent.cooldown, config::DECISION_COOLDOWN_TICKS);
    }

    #[test]
    fn frozen_agent_is_left_alone() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let bass = spawn_bass(&mut ctx, vec2(500.0, 300.0), 60.0);
        let input = TickInput::with_lure(vec2(510.0, 300.0));

        ctx.rebuild_spatial();
        let out = machine.step(&mut ctx, &mut schools, Some(bass), true, &input);
        let agent = ctx.registry.get(bass).unwrap();
        assert_eq!(agent.state, BehaviorState::Idle);
        assert_eq!(agent.pos, vec2(500.0, 300.0));
        assert_eq!(agent.age_ticks, 0);
        assert!(out.lure_strikes.is_empty());
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn frenzied_starving_predator_in_range_strikes_then_retreats() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let bass = spawn_bass(&mut ctx, vec2(500.0, 300.0), 90.0);
        {
            let agent = ctx.registry.get_mut(bass).unwrap();
            agent.state = BehaviorState::Chasing;
            agent.target = Some(TargetRef::Lure);
            agent.frenzy_until = Some(10_000);
        }
        let input = TickInput::with_lure(vec2(505.0, 300.0));

        let out = run(&mut machine, &mut ctx, &mut schools, &input);
        assert_eq!(out.lure_strikes, vec![bass]);
        assert_eq!(ctx.registry.get(bass).unwrap().state, BehaviorState::Striking);
        assert!(ctx
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::Strike { agent, .. } if *agent == bass)));

        for _ in 0..config::STRIKE_RECOVERY_TICKS {
            run(&mut machine, &mut ctx, &mut schools, &input);
        }
        assert_eq!(ctx.registry.get(bass).unwrap().state, BehaviorState::Fleeing);
    }

    #[test]
    fn lure_takes_one_strike_per_tick() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let lure = vec2(500.0, 300.0);
        let left = spawn_bass(&mut ctx, lure - vec2(5.0, 0.0), 90.0);
        let right = spawn_bass(&mut ctx, lure + vec2(5.0, 0.0), 90.0);
        for id in [left, right] {
            let agent = ctx.registry.get_mut(id).unwrap();
            agent.state = BehaviorState::Chasing;
            agent.target = Some(TargetRef::Lure);
            agent.frenzy_until = Some(10_000);
        }

        let out = run(&mut machine, &mut ctx, &mut schools, &TickInput::with_lure(lure));
        assert_eq!(out.lure_strikes, vec![left]);
        let strikes = ctx
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::Strike { .. }))
            .count();
        assert_eq!(strikes, 1);
        assert_eq!(ctx.registry.get(left).unwrap().state, BehaviorState::Striking);
        let loser = ctx.registry.get(right).unwrap();
        assert_eq!(loser.state, BehaviorState::Idle);
        assert_eq!(loser.target, None);
    }

    #[test]
    fn hunt_gives_up_after_the_grace_period() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let bass = spawn_bass(&mut ctx, vec2(500.0, 300.0), 60.0);
        {
            let agent = ctx.registry.get_mut(bass).unwrap();
            agent.state = BehaviorState::Hunting;
            agent.target = Some(TargetRef::Lure);
            agent.state_ticks = config::HUNT_GRACE_TICKS - 2;
        }
        // Outside the chase radius, well inside detection.
        let input = TickInput::with_lure(vec2(700.0, 300.0));

        run(&mut machine, &mut ctx, &mut schools, &input);
        assert_eq!(ctx.registry.get(bass).unwrap().state, BehaviorState::Hunting);

        run(&mut machine, &mut ctx, &mut schools, &input);
        let agent = ctx.registry.get(bass).unwrap();
        assert_eq!(agent.state, BehaviorState::Idle);
        assert_eq!(agent.target, None);
        assert_eq!(agent.cooldown, config::DECISION_COOLDOWN_TICKS);
    }

    #[test]
    fn wounded_predator_hides_unless_starving() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let wounded = spawn_bass(&mut ctx, vec2(300.0, 300.0), 60.0);
        let starving = spawn_bass(&mut ctx, vec2(900.0, 300.0), 90.0);
        for id in [wounded, starving] {
            ctx.registry.get_mut(id).unwrap().health = config::LOW_HEALTH - 5.0;
        }
        let input = TickInput::with_lure(vec2(1000.0, 300.0));

        run(&mut machine, &mut ctx, &mut schools, &input);
        let agent = ctx.registry.get(wounded).unwrap();
        assert_eq!(agent.state, BehaviorState::Fleeing);
        assert!(agent.threat.is_some());
        assert_eq!(ctx.registry.get(starving).unwrap().state, BehaviorState::Hunting);
    }

    #[test]
    fn disturbance_scatters_solitary_baitfish_then_they_calm_down() {
        let mut ctx = context();
        let mut schools = SchoolCoordinator::new(5, 4);
        let mut machine = BehaviorStateMachine::new();
        let shad = ctx
            .registry
            .spawn(Agent::with_dimensions(
                Species::Shad,
                SizeClass::Small,
                vec2(800.0, 300.0),
                0.3,
                6.0,
            ))
            .unwrap();
        let splash = TickInput {
            disturbance: Some(vec2(780.0, 300.0)),
            ..TickInput::default()
        };

        run(&mut machine, &mut ctx, &mut schools, &splash);
        let agent = ctx.registry.get(shad).unwrap();
        assert_eq!(agent.state, BehaviorState::Fleeing);
        assert!(agent.velocity.x > 0.0, "flees away from the splash");

        for _ in 0..config::FLEE_TICKS + 1 {
            run(&mut machine, &mut ctx, &mut schools, &TickInput::default());
        }
        assert_eq!(ctx.registry.get(shad).unwrap().state, BehaviorState::Idle);
    }
}
