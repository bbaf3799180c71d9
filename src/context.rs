use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::agent::AgentRegistry;
use crate::config::{self, SimConfig};
use crate::events::EventQueue;
use crate::spatial_hash::SpatialHash;
use crate::tackle::Tackle;
use crate::world::World;

/// Shared simulation state, passed by reference into each component's per-tick entry point.
///
/// Components keep only their own bookkeeping; agents, randomness and the
/// outbound event queue all live here.
pub struct SimulationContext {
    pub config: SimConfig,
    pub tackle: Tackle,
    pub world: World,
    pub registry: AgentRegistry,
    pub spatial: SpatialHash,
    pub rng: ChaCha8Rng,
    pub events: EventQueue,
    pub tick: u64,
}

impl SimulationContext {
    pub fn new(config: SimConfig, tackle: Tackle) -> Self {
        let world = World::new(config.world_width, config.world_depth);
        let spatial = SpatialHash::new(world.width, world.depth, config::SPATIAL_CELL_SIZE);
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            registry: AgentRegistry::new(config.max_agents),
            tackle,
            world,
            spatial,
            events: EventQueue::new(),
            tick: 0,
            config,
        }
    }

    pub fn rebuild_spatial(&mut self) {
        self.spatial.rebuild(&self.registry);
    }

    pub fn dt(&self) -> f32 {
        config::FIXED_DT
    }
}
