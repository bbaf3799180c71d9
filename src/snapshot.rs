//! Read-only views handed to the presentation layer.

use glam::Vec2;
use serde::Serialize;

use crate::agent::{Agent, AgentId, BehaviorState};
use crate::school::{School, SchoolId};
use crate::species::{Role, SizeClass, Species};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub species: Species,
    pub role: Role,
    pub size_class: SizeClass,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub heading: Vec2,
    pub weight_lb: f32,
    pub length_in: f32,
    pub hunger: f32,
    pub health: f32,
    pub age_ticks: u64,
    pub state: BehaviorState,
    pub school: Option<SchoolId>,
    pub stomach_contents: u32,
    pub frenzied: bool,
}

impl AgentSnapshot {
    pub fn capture(agent: &Agent, tick: u64) -> Self {
        Self {
            id: agent.id,
            species: agent.species,
            role: agent.role,
            size_class: agent.size_class,
            pos: agent.pos,
            velocity: agent.velocity,
            heading: agent.heading,
            weight_lb: agent.weight_lb,
            length_in: agent.length_in,
            hunger: agent.hunger,
            health: agent.health,
            age_ticks: agent.age_ticks,
            state: agent.state,
            school: agent.school,
            stomach_contents: agent.stomach_contents,
            frenzied: agent.is_frenzied(tick),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SchoolSnapshot {
    pub id: SchoolId,
    pub species: Species,
    pub center: Vec2,
    pub velocity: Vec2,
    pub members: Vec<AgentId>,
    pub nearby_food: usize,
    pub low_food_ticks: u32,
    pub migrating: bool,
    pub migration_dir: Vec2,
}

impl From<&School> for SchoolSnapshot {
    fn from(school: &School) -> Self {
        Self {
            id: school.id,
            species: school.species,
            center: school.center,
            velocity: school.velocity,
            members: school.members.clone(),
            nearby_food: school.nearby_food,
            low_food_ticks: school.low_food_ticks,
            migrating: school.migrating,
            migration_dir: school.migration_dir,
        }
    }
}
