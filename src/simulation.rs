use glam::Vec2;

use crate::agent::{Agent, AgentId, RemovalReason};
use crate::behavior::BehaviorStateMachine;
use crate::capture::{CaptureEngine, CaptureRecord, FightOutcome};
use crate::config::{self, SimConfig};
use crate::context::SimulationContext;
use crate::error::{ConfigError, SpawnError};
use crate::events::SimEvent;
use crate::food_chain::FoodChainResolver;
use crate::input::TickInput;
use crate::school::{SchoolCoordinator, SchoolId};
use crate::snapshot::{AgentSnapshot, SchoolSnapshot};
use crate::species::{SizeClass, Species};
use crate::tackle::Tackle;
use crate::world::World;

/// The ecosystem core: owns the shared context and the four components, and
/// runs them in a fixed phase order once per tick.
pub struct Simulation {
    ctx: SimulationContext,
    schools: SchoolCoordinator,
    behavior: BehaviorStateMachine,
    food_chain: FoodChainResolver,
    capture: CaptureEngine,
}

/// Starting values applied to an agent as it is spawned.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpawnOverrides {
    pub hunger: Option<f32>,
    pub heading: Option<Vec2>,
}

impl SpawnOverrides {
    pub fn hunger(hunger: f32) -> Self {
        Self {
            hunger: Some(hunger),
            ..Self::default()
        }
    }
}

impl Simulation {
    pub fn new(config: SimConfig, tackle: Tackle) -> Result<Self, ConfigError> {
        config.validate()?;
        let schools = SchoolCoordinator::new(config.seed, config.max_schools);
        log::info!(
            "simulation seed {} world {}x{}, {:?} line {} lb",
            config.seed,
            config.world_width,
            config.world_depth,
            tackle.line.material,
            tackle.line.test_strength_lb
        );
        Ok(Self {
            ctx: SimulationContext::new(config, tackle),
            schools,
            behavior: BehaviorStateMachine::new(),
            food_chain: FoodChainResolver::new(),
            capture: CaptureEngine::new(),
        })
    }

    pub fn tick_count(&self) -> u64 {
        self.ctx.tick
    }

    pub fn world(&self) -> &World {
        &self.ctx.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.ctx.config
    }

    pub fn capture(&self) -> &CaptureEngine {
        &self.capture
    }

    /// Advance one fixed step.
    pub fn tick(&mut self, input: &TickInput) {
        let frozen = self.capture.engaged_agent();

        // 1. School kinematics.
        self.schools.update(&mut self.ctx);
        self.ctx.rebuild_spatial();

        // 2. Behavior decisions.
        let lure_available = self.capture.is_available();
        let strikes = self.behavior.step(
            &mut self.ctx,
            &mut self.schools,
            frozen,
            lure_available,
            input,
        );

        // 3. Food chain.
        self.food_chain
            .step(&mut self.ctx, &mut self.schools, &strikes.prey_strikes, frozen);

        // 4. Capture.
        self.capture.step(&mut self.ctx, input, &strikes.lure_strikes);

        // 5. Deferred removal.
        self.cleanup();

        self.ctx.tick += 1;
    }

    /// Free removed agents and purge stale school state. Safe to call repeatedly;
    /// returns how many entries were removed.
    pub fn cleanup(&mut self) -> usize {
        let removed = self.ctx.registry.sweep_removed();
        for &(agent, reason) in &removed {
            self.ctx.events.push(SimEvent::AgentRemoved { agent, reason });
        }
        removed.len() + self.schools.purge(&self.ctx.registry, &mut self.ctx.events)
    }

    pub fn spawn_agent(
        &mut self,
        species: Species,
        size_class: SizeClass,
        pos: Vec2,
    ) -> Result<AgentId, SpawnError> {
        self.spawn_agent_with(species, size_class, pos, SpawnOverrides::default())
    }

    pub fn spawn_agent_with(
        &mut self,
        species: Species,
        size_class: SizeClass,
        pos: Vec2,
        overrides: SpawnOverrides,
    ) -> Result<AgentId, SpawnError> {
        if !self.ctx.world.contains(pos) {
            log::warn!("spawn position {pos} outside the water, clamped");
        }
        let pos = self.ctx.world.clamp(pos);
        let mut agent = Agent::new(species, size_class, pos, &mut self.ctx.rng);
        if let Some(hunger) = overrides.hunger {
            agent.hunger = hunger.clamp(0.0, config::MAX_HUNGER);
        }
        if let Some(heading) = overrides.heading.and_then(Vec2::try_normalize) {
            agent.heading = heading;
        }
        let id = self.ctx.registry.spawn(agent)?;
        log::debug!("spawned {:?} {:?} as {:?}", size_class, species, id);
        Ok(id)
    }

    pub fn spawn_school(
        &mut self,
        species: Species,
        count: usize,
        pos: Vec2,
    ) -> Result<SchoolId, SpawnError> {
        self.schools.spawn_school(&mut self.ctx, species, count, pos)
    }

    /// Expire an agent from outside the tick. A fight on it ends as an escape.
    pub fn despawn_agent(&mut self, id: AgentId) -> bool {
        match self.ctx.registry.get_mut(id) {
            Some(agent) if agent.is_live() => {
                agent.mark_removed(RemovalReason::Expired);
                true
            }
            _ => false,
        }
    }

    /// Expire live agents farther than `radius` from `center`, except one the capture engine owns.
    pub fn expire_outside(&mut self, center: Vec2, radius: f32) -> usize {
        let engaged = self.capture.engaged_agent();
        let mut expired = 0;
        for slot in self.ctx.registry.agents.iter_mut() {
            let Some(agent) = slot else {
                continue;
            };
            if agent.is_live() && Some(agent.id) != engaged && agent.pos.distance(center) > radius {
                agent.mark_removed(RemovalReason::Expired);
                expired += 1;
            }
        }
        expired
    }

    /// Cancel any hookset window or fight, e.g. on scene teardown.
    pub fn force_end_fight(&mut self) -> Option<FightOutcome> {
        self.capture.force_end(&mut self.ctx)
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.ctx.events.drain()
    }

    pub fn drain_catches(&mut self) -> Vec<CaptureRecord> {
        self.capture.drain_catches()
    }

    pub fn list_visible_agents(&self) -> Vec<AgentSnapshot> {
        self.ctx
            .registry
            .iter_live()
            .map(|agent| AgentSnapshot::capture(agent, self.ctx.tick))
            .collect()
    }

    pub fn agent_snapshot(&self, id: AgentId) -> Option<AgentSnapshot> {
        self.ctx
            .registry
            .get_live(id)
            .map(|agent| AgentSnapshot::capture(agent, self.ctx.tick))
    }

    pub fn school_snapshot(&self, id: SchoolId) -> Option<SchoolSnapshot> {
        self.schools.get(id).map(SchoolSnapshot::from)
    }

    pub fn school_snapshots(&self) -> Vec<SchoolSnapshot> {
        self.schools.schools().iter().map(SchoolSnapshot::from).collect()
    }

    /// Scored baitfish pick from the group nearest `from`.
    pub fn closest_baitfish(&self, from: Vec2) -> Option<AgentId> {
        self.schools
            .closest_baitfish(from, &self.ctx.registry, &self.ctx.config.target_scoring)
    }
}
