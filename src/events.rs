use glam::Vec2;
use serde::Serialize;

use crate::agent::{AgentId, BehaviorState, RemovalReason};
use crate::capture::FightOutcome;
use crate::school::SchoolId;
use crate::species::Species;

/// Everything the core reports to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SimEvent {
    AgentStateChanged {
        agent: AgentId,
        old_state: BehaviorState,
        new_state: BehaviorState,
    },
    /// A predator hit the lure. `felt` decides whether the player notices it.
    Strike { agent: AgentId, felt: bool },
    Hookset { agent: AgentId, felt: bool },
    HooksetMissed { agent: AgentId },
    FightUpdate {
        agent: AgentId,
        tension: f32,
        drag_setting: f32,
        elapsed_ticks: u32,
        retrieved: f32,
    },
    TensionSpike {
        agent: AgentId,
        tension: f32,
        felt: bool,
    },
    FightResolved {
        agent: AgentId,
        outcome: FightOutcome,
        weight_lb: f32,
        length_in: f32,
        species: Species,
    },
    Consumption { predator: AgentId, prey: AgentId },
    FrenzyTriggered {
        species: Species,
        agents: Vec<AgentId>,
    },
    SchoolFormed {
        school: SchoolId,
        species: Species,
        size: usize,
    },
    SchoolDisbanded { school: SchoolId },
    SchoolMigrating { school: SchoolId, direction: Vec2 },
    AgentRemoved {
        agent: AgentId,
        reason: RemovalReason,
    },
}

/// Outbound events in emission order, drained once per tick by the host.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
