use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;

use crate::agent::{AgentId, BehaviorState, RemovalReason, ScheduledKind};
use crate::behavior::PreyStrike;
use crate::config;
use crate::context::SimulationContext;
use crate::events::SimEvent;
use crate::school::{GroupRef, SchoolCoordinator};
use crate::species::{Role, Species};

/// Resolves predation and grazing, tracks per-species feeding windows for
/// frenzies, and applies hunger and starvation.
#[derive(Debug, Default)]
pub struct FoodChainResolver {
    /// Recent consumption ticks per predator species.
    windows: BTreeMap<Species, VecDeque<u64>>,
}

impl FoodChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 3. Predator strikes first, then grazing, then metabolism.
    ///
    /// A baitfish eaten by a predator this tick never gets to graze.
    pub fn step(
        &mut self,
        ctx: &mut SimulationContext,
        schools: &mut SchoolCoordinator,
        strikes: &[PreyStrike],
        frozen: Option<AgentId>,
    ) -> usize {
        let mut consumed = 0;
        for strike in strikes {
            if self.resolve_strike(ctx, schools, *strike, frozen) {
                consumed += 1;
            }
        }
        consumed += graze(ctx);
        metabolize(ctx, frozen);
        consumed
    }

    /// Consume the predator's selected prey if the predation rules allow it.
    fn resolve_strike(
        &mut self,
        ctx: &mut SimulationContext,
        schools: &mut SchoolCoordinator,
        strike: PreyStrike,
        frozen: Option<AgentId>,
    ) -> bool {
        let Some(predator) = ctx.registry.get_live(strike.predator) else {
            return false;
        };
        if predator.state != BehaviorState::Striking {
            return false;
        }
        let (predator_pos, predator_role, species) = (predator.pos, predator.role, predator.species);
        let reach = species.profile().strike_radius * config::STRIKE_REACH_SLACK;

        let Some(prey_id) = schools.take_selected(strike.predator, strike.group, &ctx.registry)
        else {
            log::debug!("strike by {:?} found no prey in {:?}", strike.predator, strike.group);
            return false;
        };
        let Some(prey) = ctx.registry.get_live(prey_id) else {
            return false;
        };
        if !predator_role.can_eat(prey.role) {
            log::warn!(
                "refusing {:?} eating {:?}: tiers are not adjacent",
                species,
                prey.species
            );
            return false;
        }
        if predator_pos.distance(prey.pos) > reach {
            log::debug!("strike by {:?} fell short", strike.predator);
            return false;
        }
        let prey_weight = prey.weight_lb;

        consume(ctx, strike.predator, prey_id, prey_weight);

        let wiped_school = matches!(strike.group, GroupRef::School(_))
            && schools.resolve(strike.group, &ctx.registry).is_none();
        if self.record_consumption(species, ctx.tick) || wiped_school {
            trigger_frenzy(ctx, species, predator_pos, frozen);
            if let Some(window) = self.windows.get_mut(&species) {
                window.clear();
            }
        }
        true
    }

    /// Push a consumption into the species window and report whether it is now hot.
    fn record_consumption(&mut self, species: Species, tick: u64) -> bool {
        let window = self.windows.entry(species).or_default();
        window.push_back(tick);
        while window
            .front()
            .is_some_and(|&t| t + config::FRENZY_WINDOW_TICKS <= tick)
        {
            window.pop_front();
        }
        window.len() >= config::FRENZY_CONSUMPTION_THRESHOLD
    }
}

/// Mark `prey` consumed and feed `predator`.
fn consume(ctx: &mut SimulationContext, predator: AgentId, prey: AgentId, prey_weight: f32) {
    if let Some(agent) = ctx.registry.get_mut(prey) {
        agent.mark_removed(RemovalReason::Consumed);
    }
    if let Some(agent) = ctx.registry.get_mut(predator) {
        let satiation = (prey_weight * config::SATIATION_PER_LB).max(config::MIN_SATIATION);
        agent.hunger = (agent.hunger - satiation).max(0.0);
        agent.stomach_contents += 1;
    }
    ctx.events.push(SimEvent::Consumption { predator, prey });
}

/// Same-species predators near `origin` go into frenzy.
fn trigger_frenzy(
    ctx: &mut SimulationContext,
    species: Species,
    origin: Vec2,
    frozen: Option<AgentId>,
) {
    let radius = species.profile().detection_radius;
    let until = ctx.tick + config::FRENZY_TICKS as u64;
    let mut agents = Vec::new();
    for id in ctx.registry.live_ids() {
        if frozen == Some(id) {
            continue;
        }
        let Some(agent) = ctx.registry.get_mut(id) else {
            continue;
        };
        if agent.species != species
            || agent.state == BehaviorState::Fleeing
            || agent.pos.distance(origin) > radius
        {
            continue;
        }
        agent.frenzy_until = Some(until);
        agent.schedule(until, ScheduledKind::EndFrenzy);
        agents.push(id);
    }
    log::info!("{:?} frenzy: {} agents", species, agents.len());
    ctx.events.push(SimEvent::FrenzyTriggered { species, agents });
}

/// Hungry baitfish eat the nearest plankton in reach, one bite per tick.
fn graze(ctx: &mut SimulationContext) -> usize {
    let grazers: Vec<AgentId> = ctx
        .registry
        .iter_live()
        .filter(|a| a.role == Role::Baitfish && a.hunger > config::GRAZE_HUNGER)
        .map(|a| a.id)
        .collect();

    let mut eaten = 0;
    for grazer in grazers {
        let Some(pos) = ctx.registry.get_live(grazer).map(|a| a.pos) else {
            continue;
        };
        let food = ctx
            .spatial
            .query_radius(pos, config::GRAZE_RADIUS, &ctx.world, &ctx.registry)
            .into_iter()
            .filter_map(|id| ctx.registry.get_live(id))
            .filter(|a| a.role == Role::Forage)
            .min_by(|a, b| {
                pos.distance_squared(a.pos)
                    .total_cmp(&pos.distance_squared(b.pos))
                    .then(a.id.cmp(&b.id))
            })
            .map(|a| a.id);
        let Some(food) = food else {
            continue;
        };
        if let Some(agent) = ctx.registry.get_mut(food) {
            agent.mark_removed(RemovalReason::Consumed);
        }
        if let Some(agent) = ctx.registry.get_mut(grazer) {
            agent.hunger = (agent.hunger - config::FORAGE_SATIATION).max(0.0);
            agent.stomach_contents += 1;
        }
        ctx.events.push(SimEvent::Consumption {
            predator: grazer,
            prey: food,
        });
        eaten += 1;
    }
    eaten
}

/// Hunger rises with time; past terminal hunger, health drains until starvation.
fn metabolize(ctx: &mut SimulationContext, frozen: Option<AgentId>) {
    let dt = ctx.dt();
    for slot in ctx.registry.agents.iter_mut() {
        let Some(agent) = slot else {
            continue;
        };
        if !agent.is_live() || frozen == Some(agent.id) {
            continue;
        }
        let rate = agent.species.profile().hunger_rate;
        agent.hunger = (agent.hunger + rate * dt).min(config::MAX_HUNGER);
        if agent.hunger >= config::TERMINAL_HUNGER {
            agent.health -= config::STARVATION_DAMAGE * dt;
            if agent.health <= 0.0 {
                log::info!("agent {:?} ({:?}) starved", agent.id, agent.species);
                agent.health = 0.0;
                agent.mark_removed(RemovalReason::Starved);
            }
        }
    }
}
