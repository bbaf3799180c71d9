use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::SpawnError;
use crate::events::{EventQueue, SimEvent};
use crate::school::{GroupRef, SchoolId};
use crate::species::{Role, SizeClass, Species};

/// Stable handle to an agent. The generation field invalidates stale references.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct AgentId {
    pub index: u32,
    pub generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    Idle,
    Hunting,
    Chasing,
    Striking,
    Fleeing,
    /// On the line; position is owned by the capture engine.
    Hooked,
}

/// What a predator is currently after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRef {
    Lure,
    Prey(GroupRef),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    Consumed,
    Caught,
    Expired,
    Starved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduledKind {
    /// Leave `Striking` for `Fleeing`.
    Retreat,
    EndFrenzy,
}

/// Deferred state change keyed by tick deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledAction {
    pub due_tick: u64,
    pub kind: ScheduledKind,
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub id: AgentId,
    pub species: Species,
    pub role: Role,
    pub size_class: SizeClass,
    pub pos: Vec2,
    pub velocity: Vec2,
    /// Unit facing direction; kept when velocity drops to zero.
    pub heading: Vec2,
    pub weight_lb: f32,
    pub length_in: f32,
    pub hunger: f32,
    pub health: f32,
    pub age_ticks: u64,
    pub state: BehaviorState,
    pub state_ticks: u32,
    pub cooldown: u32,
    pub target: Option<TargetRef>,
    /// -1.0 or 1.0: preferred horizontal drift while idle.
    pub idle_bias: f32,
    pub school: Option<SchoolId>,
    pub school_offset: Vec2,
    pub stomach_contents: u32,
    /// Terminal; the agent is logically dead and awaits the cleanup pass.
    pub removal: Option<RemovalReason>,
    pub frenzy_until: Option<u64>,
    /// Where the last disturbance came from, and when.
    pub threat: Option<(Vec2, u64)>,
    pub scheduled: Vec<ScheduledAction>,
}

impl Agent {
    pub fn with_dimensions(
        species: Species,
        size_class: SizeClass,
        pos: Vec2,
        weight_lb: f32,
        length_in: f32,
    ) -> Self {
        Self {
            id: AgentId {
                index: u32::MAX,
                generation: 0,
            },
            species,
            role: species.role(),
            size_class,
            pos,
            velocity: Vec2::ZERO,
            heading: Vec2::X,
            weight_lb,
            length_in,
            hunger: config::INITIAL_HUNGER,
            health: config::MAX_HEALTH,
            age_ticks: 0,
            state: BehaviorState::Idle,
            state_ticks: 0,
            cooldown: 0,
            target: None,
            idle_bias: 1.0,
            school: None,
            school_offset: Vec2::ZERO,
            stomach_contents: 0,
            removal: None,
            frenzy_until: None,
            threat: None,
            scheduled: Vec::new(),
        }
    }

    /// Create an agent with rolled dimensions and a random idle direction.
    pub fn new(species: Species, size_class: SizeClass, pos: Vec2, rng: &mut impl Rng) -> Self {
        let (weight, length) = species.roll_dimensions(size_class, rng);
        let mut agent = Self::with_dimensions(species, size_class, pos, weight, length);
        agent.idle_bias = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        agent.heading = Vec2::new(agent.idle_bias, 0.0);
        agent
    }

    pub fn is_live(&self) -> bool {
        self.removal.is_none()
    }

    pub fn is_consumed(&self) -> bool {
        self.removal == Some(RemovalReason::Consumed)
    }

    /// Frenzy never applies while fleeing.
    pub fn is_frenzied(&self, tick: u64) -> bool {
        self.state != BehaviorState::Fleeing && self.frenzy_until.is_some_and(|until| tick < until)
    }

    /// Change state, resetting the state timer and announcing the change.
    pub fn transition(&mut self, new_state: BehaviorState, events: &mut EventQueue) {
        if self.state == new_state {
            return;
        }
        log::debug!("agent {:?} {:?} -> {:?}", self.id, self.state, new_state);
        events.push(SimEvent::AgentStateChanged {
            agent: self.id,
            old_state: self.state,
            new_state,
        });
        self.state = new_state;
        self.state_ticks = 0;
    }

    pub fn schedule(&mut self, due_tick: u64, kind: ScheduledKind) {
        self.scheduled.retain(|a| a.kind != kind);
        self.scheduled.push(ScheduledAction { due_tick, kind });
    }

    /// Remove and return the actions due at or before `tick`, in deadline order.
    pub fn take_due(&mut self, tick: u64) -> Vec<ScheduledAction> {
        let mut due: Vec<ScheduledAction> = self
            .scheduled
            .iter()
            .copied()
            .filter(|a| a.due_tick <= tick)
            .collect();
        self.scheduled.retain(|a| a.due_tick > tick);
        due.sort_by_key(|a| a.due_tick);
        due
    }

    /// Mark the agent for removal. The first reason wins.
    pub fn mark_removed(&mut self, reason: RemovalReason) {
        if self.removal.is_none() {
            self.removal = Some(reason);
            self.velocity = Vec2::ZERO;
        }
    }
}

/// Arena-based agent storage with generational indices, a free list and a hard capacity.
pub struct AgentRegistry {
    pub agents: Vec<Option<Agent>>,
    pub generations: Vec<u32>,
    pub free_list: Vec<u32>,
    pub count: usize,
    pub capacity: usize,
}

impl AgentRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            agents: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            count: 0,
            capacity,
        }
    }

    pub fn spawn(&mut self, mut agent: Agent) -> Result<AgentId, SpawnError> {
        if self.count >= self.capacity {
            return Err(SpawnError::AgentCapacity {
                capacity: self.capacity,
            });
        }
        // Reuse the lowest freed slot so ids stay dense and deterministic.
        let reuse = self
            .free_list
            .iter()
            .enumerate()
            .min_by_key(|(_, i)| **i)
            .map(|(pos, _)| pos);
        let index = match reuse {
            Some(pos) => self.free_list.swap_remove(pos),
            None => {
                self.agents.push(None);
                self.generations.push(0);
                (self.agents.len() - 1) as u32
            }
        };
        let idx = index as usize;
        let id = AgentId {
            index,
            generation: self.generations[idx],
        };
        agent.id = id;
        self.agents[idx] = Some(agent);
        self.count += 1;
        Ok(id)
    }

    /// Immediately free a slot. Returns the removed agent if the handle was current.
    pub fn despawn(&mut self, id: AgentId) -> Option<Agent> {
        let idx = id.index as usize;
        if idx < self.agents.len() && self.generations[idx] == id.generation {
            let agent = self.agents[idx].take()?;
            self.generations[idx] += 1;
            self.free_list.push(id.index);
            self.count -= 1;
            Some(agent)
        } else {
            None
        }
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        let idx = id.index as usize;
        if idx < self.agents.len() && self.generations[idx] == id.generation {
            self.agents[idx].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let idx = id.index as usize;
        if idx < self.agents.len() && self.generations[idx] == id.generation {
            self.agents[idx].as_mut()
        } else {
            None
        }
    }

    /// Present and not marked for removal.
    pub fn get_live(&self, id: AgentId) -> Option<&Agent> {
        self.get(id).filter(|a| a.is_live())
    }

    pub fn is_live(&self, id: AgentId) -> bool {
        self.get_live(id).is_some()
    }

    /// Iterate over all live agents in slot order.
    pub fn iter_live(&self) -> impl Iterator<Item = &Agent> {
        self.agents
            .iter()
            .filter_map(|slot| slot.as_ref().filter(|a| a.is_live()))
    }

    /// Snapshot of live ids, for loops that need to mutate the registry.
    pub fn live_ids(&self) -> Vec<AgentId> {
        self.iter_live().map(|a| a.id).collect()
    }

    /// Free every slot whose agent is marked for removal.
    pub fn sweep_removed(&mut self) -> Vec<(AgentId, RemovalReason)> {
        let mut removed = Vec::new();
        for (idx, slot) in self.agents.iter_mut().enumerate() {
            let reason = match slot {
                Some(agent) => match agent.removal {
                    Some(reason) => (agent.id, reason),
                    None => continue,
                },
                None => continue,
            };
            *slot = None;
            self.generations[idx] += 1;
            self.free_list.push(idx as u32);
            self.count -= 1;
            removed.push(reason);
        }
        removed
    }
}
