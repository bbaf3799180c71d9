//! Emergent baitfish/forage schools and the prey-group abstraction predators hunt through.

use std::collections::{BTreeMap, BTreeSet};

use glam::{vec2, Vec2};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, AgentRegistry, BehaviorState};
use crate::config::{self, TargetScoring};
use crate::context::SimulationContext;
use crate::error::SpawnError;
use crate::events::{EventQueue, SimEvent};
use crate::physics;
use crate::species::{Role, SizeClass, Species};
use crate::world::{Boundary, World};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchoolId(pub u32);

/// Id-only handle to something a predator can hunt: a whole school or one loner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupRef {
    School(SchoolId),
    Solitary(AgentId),
}

/// Uniform view over schooling and solitary prey.
pub trait PreyGroup {
    fn group_ref(&self) -> GroupRef;
    fn species(&self) -> Species;
    fn center(&self) -> Vec2;
    fn live_count(&self, registry: &AgentRegistry) -> usize;

    /// Best member for a predator at `predator_pos` to go after.
    fn score_target(
        &self,
        predator_pos: Vec2,
        registry: &AgentRegistry,
        scoring: &TargetScoring,
    ) -> Option<AgentId>;

    fn role(&self) -> Role {
        self.species().role()
    }
}

#[derive(Clone, Debug)]
pub struct School {
    pub id: SchoolId,
    pub species: Species,
    pub center: Vec2,
    pub velocity: Vec2,
    /// Ordered, duplicate-free.
    pub members: Vec<AgentId>,
    pub nearby_food: usize,
    pub food_centroid: Option<Vec2>,
    pub low_food_ticks: u32,
    pub migrating: bool,
    pub migration_dir: Vec2,
    /// (predator, member it selected) pairs so a strike consumes exactly that member.
    selections: Vec<(AgentId, AgentId)>,
}

impl School {
    fn new(id: SchoolId, species: Species, center: Vec2) -> Self {
        Self {
            id,
            species,
            center,
            velocity: Vec2::ZERO,
            members: Vec::new(),
            nearby_food: 0,
            food_centroid: None,
            low_food_ticks: 0,
            migrating: false,
            migration_dir: Vec2::ZERO,
            selections: Vec::new(),
        }
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.members.contains(&id)
    }

    fn add_member(&mut self, id: AgentId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.members.push(id);
        true
    }

    pub fn selection_for(&self, predator: AgentId) -> Option<AgentId> {
        self.selections
            .iter()
            .find(|(p, _)| *p == predator)
            .map(|(_, prey)| *prey)
    }

    fn cache_selection(&mut self, predator: AgentId, prey: AgentId) {
        self.selections.retain(|(p, _)| *p != predator);
        self.selections.push((predator, prey));
    }

    fn take_selection(&mut self, predator: AgentId) -> Option<AgentId> {
        let pos = self.selections.iter().position(|(p, _)| *p == predator)?;
        Some(self.selections.remove(pos).1)
    }

    fn average_hunger(&self, registry: &AgentRegistry) -> f32 {
        let (sum, n) = self
            .members
            .iter()
            .filter_map(|id| registry.get_live(*id))
            .fold((0.0, 0usize), |(sum, n), a| (sum + a.hunger, n + 1));
        if n == 0 {
            0.0
        } else {
            sum / n as f32
        }
    }
}

impl PreyGroup for School {
    fn group_ref(&self) -> GroupRef {
        GroupRef::School(self.id)
    }

    fn species(&self) -> Species {
        self.species
    }

    fn center(&self) -> Vec2 {
        self.center
    }

    fn live_count(&self, registry: &AgentRegistry) -> usize {
        self.members.iter().filter(|id| registry.is_live(**id)).count()
    }

    /// Score = facing-side alignment + edge preference - distance penalty.
    /// Ties keep the earlier member.
    fn score_target(
        &self,
        predator_pos: Vec2,
        registry: &AgentRegistry,
        scoring: &TargetScoring,
    ) -> Option<AgentId> {
        let live: Vec<&Agent> = self
            .members
            .iter()
            .filter_map(|id| registry.get_live(*id))
            .collect();
        let radius = live
            .iter()
            .map(|a| a.pos.distance(self.center))
            .fold(1.0f32, f32::max);
        let approach = (self.center - predator_pos).normalize_or_zero();

        let mut best: Option<(AgentId, f32)> = None;
        for agent in live {
            let from_center = agent.pos - self.center;
            let facing = from_center.normalize_or_zero().dot(-approach);
            let edge = from_center.length() / radius;
            let distance = agent.pos.distance(predator_pos);
            let score = scoring.alignment_weight * facing + scoring.edge_weight * edge
                - scoring.distance_penalty * distance;
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((agent.id, score)),
            }
        }
        best.map(|(id, _)| id)
    }
}

impl<T: PreyGroup + ?Sized> PreyGroup for &T {
    fn group_ref(&self) -> GroupRef {
        (**self).group_ref()
    }

    fn species(&self) -> Species {
        (**self).species()
    }

    fn center(&self) -> Vec2 {
        (**self).center()
    }

    fn live_count(&self, registry: &AgentRegistry) -> usize {
        (**self).live_count(registry)
    }

    fn score_target(
        &self,
        predator_pos: Vec2,
        registry: &AgentRegistry,
        scoring: &TargetScoring,
    ) -> Option<AgentId> {
        (**self).score_target(predator_pos, registry, scoring)
    }
}

/// A lone prey agent presented as a group of one.
pub struct SolitaryPrey<'a> {
    agent: &'a Agent,
}

impl<'a> SolitaryPrey<'a> {
    pub fn new(agent: &'a Agent) -> Self {
        Self { agent }
    }
}

impl PreyGroup for SolitaryPrey<'_> {
    fn group_ref(&self) -> GroupRef {
        GroupRef::Solitary(self.agent.id)
    }

    fn species(&self) -> Species {
        self.agent.species
    }

    fn center(&self) -> Vec2 {
        self.agent.pos
    }

    fn live_count(&self, registry: &AgentRegistry) -> usize {
        usize::from(registry.is_live(self.agent.id))
    }

    fn score_target(
        &self,
        _predator_pos: Vec2,
        registry: &AgentRegistry,
        _scoring: &TargetScoring,
    ) -> Option<AgentId> {
        registry.get_live(self.agent.id).map(|a| a.id)
    }
}

/// Sunflower-spiral slot offset; consecutive slots never stack on each other.
pub fn spiral_offset(slot: usize) -> Vec2 {
    let r = config::SCHOOL_SPACING * (slot as f32 + 0.5).sqrt();
    let theta = slot as f32 * config::GOLDEN_ANGLE;
    // Schools are flatter than they are long.
    vec2(r * theta.cos(), r * theta.sin() * 0.6)
}

/// Heading for a school that has given up on its current feeding ground.
fn migration_direction(world: &World, center: Vec2) -> Vec2 {
    let (boundary, _) = world.nearest_boundary(center);
    let normal = boundary.inward_normal();
    match boundary {
        Boundary::Left | Boundary::Right => normal,
        Boundary::Surface | Boundary::Bottom => {
            let horizontal = if center.x < world.width * 0.5 {
                Vec2::X
            } else {
                Vec2::NEG_X
            };
            (horizontal + normal * 0.25).normalize()
        }
    }
}

pub struct SchoolCoordinator {
    schools: Vec<School>,
    next_id: u32,
    max_schools: usize,
    noise: Perlin,
}

impl SchoolCoordinator {
    pub fn new(seed: u64, max_schools: usize) -> Self {
        Self {
            schools: Vec::new(),
            next_id: 0,
            max_schools,
            noise: Perlin::new(seed as u32),
        }
    }

    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    pub fn get(&self, id: SchoolId) -> Option<&School> {
        self.schools.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }

    fn get_mut(&mut self, id: SchoolId) -> Option<&mut School> {
        self.schools.iter_mut().find(|s| s.id == id)
    }

    fn alloc_id(&mut self) -> SchoolId {
        let id = SchoolId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn `count` members on a spiral around `pos` as a new school.
    pub fn spawn_school(
        &mut self,
        ctx: &mut SimulationContext,
        species: Species,
        count: usize,
        pos: Vec2,
    ) -> Result<SchoolId, SpawnError> {
        if !species.schools() {
            return Err(SpawnError::NotSchooling(species));
        }
        if count == 0 {
            return Err(SpawnError::EmptySchool);
        }
        if self.schools.len() >= self.max_schools {
            return Err(SpawnError::SchoolCapacity {
                capacity: self.max_schools,
            });
        }
        if ctx.registry.count + count > ctx.registry.capacity {
            return Err(SpawnError::AgentCapacity {
                capacity: ctx.registry.capacity,
            });
        }

        let center = ctx.world.clamp_inset(pos, config::BOUNDARY_MARGIN);
        let id = self.alloc_id();
        let mut school = School::new(id, species, center);
        for slot in 0..count {
            let offset = spiral_offset(slot);
            let mut agent = Agent::new(
                species,
                SizeClass::Small,
                ctx.world.clamp(center + offset),
                &mut ctx.rng,
            );
            agent.school = Some(id);
            agent.school_offset = offset;
            let agent_id = ctx.registry.spawn(agent)?;
            school.add_member(agent_id);
        }

        log::info!("school {:?} spawned: {count} {:?}", id, species);
        ctx.events.push(SimEvent::SchoolFormed {
            school: id,
            species,
            size: school.members.len(),
        });
        self.schools.push(school);
        Ok(id)
    }

    /// Phase 1: membership upkeep, clustering, flock kinematics and member positioning.
    pub fn update(&mut self, ctx: &mut SimulationContext) {
        self.purge(&ctx.registry, &mut ctx.events);
        ctx.rebuild_spatial();
        self.release_drifters(&mut ctx.registry);
        self.cluster(ctx);
        self.disband_empty(&mut ctx.events);
        self.steer_schools(ctx);
        self.position_members(ctx);
    }

    /// Drop dead, foreign and duplicate members and stale selections, then
    /// disband empty schools. Returns how many entries were removed.
    pub fn purge(&mut self, registry: &AgentRegistry, events: &mut EventQueue) -> usize {
        let mut removed = 0;
        for school in &mut self.schools {
            let school_id = school.id;
            let before = school.members.len();
            let mut seen = BTreeSet::new();
            school.members.retain(|id| {
                registry
                    .get_live(*id)
                    .is_some_and(|a| a.school == Some(school_id))
                    && seen.insert(*id)
            });
            removed += before - school.members.len();

            let members = &school.members;
            let before = school.selections.len();
            school
                .selections
                .retain(|(predator, prey)| registry.is_live(*predator) && members.contains(prey));
            removed += before - school.selections.len();
        }
        removed + self.disband_empty(events)
    }

    fn disband_empty(&mut self, events: &mut EventQueue) -> usize {
        let mut disbanded = Vec::new();
        self.schools.retain(|s| {
            if s.members.is_empty() {
                disbanded.push(s.id);
                false
            } else {
                true
            }
        });
        for id in &disbanded {
            log::info!("school {:?} disbanded", id);
            events.push(SimEvent::SchoolDisbanded { school: *id });
        }
        disbanded.len()
    }

    /// Members that strayed past the still-belongs radius go solitary.
    fn release_drifters(&mut self, registry: &mut AgentRegistry) {
        let limit_sq = config::STILL_BELONGS_RADIUS * config::STILL_BELONGS_RADIUS;
        for school in &mut self.schools {
            let center = school.center;
            school.members.retain(|id| match registry.get_mut(*id) {
                Some(agent) if agent.pos.distance_squared(center) > limit_sq => {
                    agent.school = None;
                    agent.school_offset = Vec2::ZERO;
                    false
                }
                _ => true,
            });
        }
    }

    /// Unschooled agents join a nearby school of their species, or merge with
    /// each other (union-find) into a new one.
    fn cluster(&mut self, ctx: &mut SimulationContext) {
        let radius_sq = config::CLUSTER_RADIUS * config::CLUSTER_RADIUS;
        let candidates: Vec<(AgentId, Species, Vec2)> = ctx
            .registry
            .iter_live()
            .filter(|a| a.species.schools() && a.school.is_none() && a.state != BehaviorState::Hooked)
            .map(|a| (a.id, a.species, a.pos))
            .collect();

        let mut unjoined: Vec<(AgentId, Species, Vec2)> = Vec::new();
        for (id, species, pos) in candidates {
            let mut best: Option<(usize, f32)> = None;
            for (i, school) in self.schools.iter().enumerate() {
                if school.species != species {
                    continue;
                }
                let d = school.center.distance_squared(pos);
                if d <= radius_sq && best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((i, d));
                }
            }
            match best {
                Some((i, _)) => {
                    let school = &mut self.schools[i];
                    school.add_member(id);
                    if let Some(agent) = ctx.registry.get_mut(id) {
                        agent.school = Some(school.id);
                        agent.school_offset = pos - school.center;
                    }
                }
                None => unjoined.push((id, species, pos)),
            }
        }

        // Candidates come out of the registry in slot order, so ids are sorted.
        let mut parent: Vec<usize> = (0..unjoined.len()).collect();
        for i in 0..unjoined.len() {
            let (id, species, pos) = unjoined[i];
            let neighbors = ctx.spatial.query_radius_excluding(
                pos,
                config::CLUSTER_RADIUS,
                id,
                &ctx.world,
                &ctx.registry,
            );
            for other in neighbors {
                let Ok(j) = unjoined.binary_search_by_key(&other, |(id, _, _)| *id) else {
                    continue;
                };
                if unjoined[j].1 == species {
                    union(&mut parent, i, j);
                }
            }
        }

        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..unjoined.len() {
            let root = find(&mut parent, i);
            components.entry(root).or_default().push(i);
        }

        for indices in components.into_values() {
            if indices.len() < config::MIN_SCHOOL_SIZE {
                continue;
            }
            if self.schools.len() >= self.max_schools {
                log::debug!("school capacity reached, {} agents stay solitary", indices.len());
                break;
            }
            let species = unjoined[indices[0]].1;
            let centroid =
                indices.iter().map(|&i| unjoined[i].2).sum::<Vec2>() / indices.len() as f32;
            let id = self.alloc_id();
            let mut school = School::new(id, species, centroid);
            let mut velocity = Vec2::ZERO;
            for &i in &indices {
                let (agent_id, _, pos) = unjoined[i];
                if let Some(agent) = ctx.registry.get_mut(agent_id) {
                    agent.school = Some(id);
                    agent.school_offset = pos - centroid;
                    velocity += agent.velocity;
                    school.add_member(agent_id);
                }
            }
            school.velocity = velocity / indices.len() as f32;
            log::info!("school {:?} formed from {} {:?}", id, school.members.len(), species);
            ctx.events.push(SimEvent::SchoolFormed {
                school: id,
                species,
                size: school.members.len(),
            });
            self.schools.push(school);
        }
    }

    /// Boids-style drift of each school center: wander, food seeking, migration.
    fn steer_schools(&mut self, ctx: &mut SimulationContext) {
        let dt = ctx.dt();
        let t = ctx.tick as f64 * config::SCHOOL_WANDER_FREQUENCY;
        for school in &mut self.schools {
            let forages = school.species.role() == Role::Baitfish;
            if forages {
                let (count, centroid) = sense_food(ctx, school.center);
                school.nearby_food = count;
                school.food_centroid = centroid;
                update_foraging(school, &ctx.world, &mut ctx.events);
            }

            let hungry = school.average_hunger(&ctx.registry) > config::SCHOOL_HUNGRY;
            let feeding = !school.migrating && hungry && school.food_centroid.is_some();

            let seed = school.id.0 as f64 * 17.0 + 0.5;
            let wander = vec2(
                self.noise.get([seed, t]) as f32,
                self.noise.get([seed + 101.0, t]) as f32,
            ) * config::SCHOOL_WANDER_STRENGTH;

            let mut accel = match (feeding, school.food_centroid) {
                (true, Some(food)) => (food - school.center).normalize_or_zero() * config::FOOD_ATTRACTION,
                _ => wander,
            };
            if school.migrating {
                accel += school.migration_dir * config::MIGRATION_IMPULSE;
            }

            school.velocity = (school.velocity + accel * dt) * config::SCHOOL_VELOCITY_DAMPING;
            let (max_h, max_v) = if school.migrating {
                (config::MIGRATING_MAX_SPEED_H, config::MIGRATING_MAX_SPEED_V)
            } else if feeding {
                (config::SCHOOL_MAX_SPEED_H, config::FEEDING_MAX_SPEED_V)
            } else {
                (config::SCHOOL_MAX_SPEED_H, config::SCHOOL_MAX_SPEED_V)
            };
            school.velocity = physics::clamp_axes(school.velocity, max_h, max_v);

            let next = school.center + school.velocity * dt;
            let clamped = ctx.world.clamp_inset(next, config::BOUNDARY_MARGIN);
            if clamped.x != next.x {
                school.velocity.x *= -0.5;
                school.migration_dir.x = -school.migration_dir.x;
            }
            if clamped.y != next.y {
                school.velocity.y *= -0.5;
                school.migration_dir.y = -school.migration_dir.y;
            }
            school.center = clamped;
        }
    }

    /// Members track center + offset, with short-range separation and alignment on top.
    fn position_members(&self, ctx: &mut SimulationContext) {
        let dt = ctx.dt();
        for school in &self.schools {
            let members: Vec<(AgentId, Vec2)> = school
                .members
                .iter()
                .filter_map(|id| ctx.registry.get_live(*id).map(|a| (a.id, a.pos)))
                .collect();

            for &(id, pos) in &members {
                let Some(agent) = ctx.registry.get_mut(id) else {
                    continue;
                };
                if agent.state == BehaviorState::Hooked {
                    continue;
                }
                let anchor = school.center + agent.school_offset;
                let mut desired = school.velocity + (anchor - pos) * config::MEMBER_OFFSET_PULL;

                for &(other, other_pos) in &members {
                    if other == id {
                        continue;
                    }
                    let away = pos - other_pos;
                    let dist = away.length();
                    if dist > 1e-3 && dist < config::MEMBER_SEPARATION_RADIUS {
                        let push = (config::MEMBER_SEPARATION_RADIUS - dist)
                            / config::MEMBER_SEPARATION_RADIUS;
                        desired += away / dist * push * config::MEMBER_SEPARATION_STRENGTH;
                    }
                }
                desired += (school.velocity - agent.velocity) * config::MEMBER_ALIGNMENT_STRENGTH;

                if agent.state == BehaviorState::Fleeing {
                    if let Some((threat, _)) = agent.threat {
                        desired += (pos - threat).normalize_or_zero() * config::MEMBER_FLEE_STRENGTH;
                    }
                }

                agent.velocity = desired.clamp_length_max(agent.species.profile().burst_speed);
                physics::integrate(agent, &ctx.world, dt);
            }
        }
    }

    /// Every huntable group: live schools plus unschooled schooling-species agents.
    pub fn prey_groups<'a>(&'a self, registry: &'a AgentRegistry) -> Vec<Box<dyn PreyGroup + 'a>> {
        let mut groups: Vec<Box<dyn PreyGroup + 'a>> = Vec::new();
        for school in &self.schools {
            if school.live_count(registry) > 0 {
                groups.push(Box::new(school));
            }
        }
        for agent in registry.iter_live() {
            if agent.species.schools() && agent.school.is_none() {
                groups.push(Box::new(SolitaryPrey::new(agent)));
            }
        }
        groups
    }

    /// Resolve a group handle; `None` once the group is gone.
    pub fn resolve<'a>(
        &'a self,
        group: GroupRef,
        registry: &'a AgentRegistry,
    ) -> Option<Box<dyn PreyGroup + 'a>> {
        match group {
            GroupRef::School(id) => {
                let school = self.get(id)?;
                if school.live_count(registry) == 0 {
                    return None;
                }
                Some(Box::new(school))
            }
            GroupRef::Solitary(id) => {
                let agent = registry.get_live(id)?;
                Some(Box::new(SolitaryPrey::new(agent)))
            }
        }
    }

    /// Run the scored search for `predator` and remember the pick.
    pub fn select_prey(
        &mut self,
        predator: AgentId,
        predator_pos: Vec2,
        group: GroupRef,
        registry: &AgentRegistry,
        scoring: &TargetScoring,
    ) -> Option<AgentId> {
        match group {
            GroupRef::School(id) => {
                let school = self.get_mut(id)?;
                let prey = school.score_target(predator_pos, registry, scoring)?;
                school.cache_selection(predator, prey);
                Some(prey)
            }
            GroupRef::Solitary(id) => registry.get_live(id).map(|a| a.id),
        }
    }

    /// Hand over the member `predator` selected, if it is still a live member.
    pub fn take_selected(
        &mut self,
        predator: AgentId,
        group: GroupRef,
        registry: &AgentRegistry,
    ) -> Option<AgentId> {
        match group {
            GroupRef::School(id) => {
                let school = self.get_mut(id)?;
                let prey = school.take_selection(predator)?;
                (school.contains(prey) && registry.is_live(prey)).then_some(prey)
            }
            GroupRef::Solitary(id) => registry.get_live(id).map(|a| a.id),
        }
    }

    /// Scored pick from the baitfish group whose center is closest to `from`.
    pub fn closest_baitfish(
        &self,
        from: Vec2,
        registry: &AgentRegistry,
        scoring: &TargetScoring,
    ) -> Option<AgentId> {
        let groups = self.prey_groups(registry);
        let mut best: Option<(&dyn PreyGroup, f32)> = None;
        for group in &groups {
            if group.role() != Role::Baitfish {
                continue;
            }
            let d = group.center().distance_squared(from);
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((&**group, d)),
            }
        }
        best.and_then(|(group, _)| group.score_target(from, registry, scoring))
    }
}

fn sense_food(ctx: &SimulationContext, center: Vec2) -> (usize, Option<Vec2>) {
    let nearby = ctx
        .spatial
        .query_radius(center, config::FOOD_SENSE_RADIUS, &ctx.world, &ctx.registry);
    let mut count = 0;
    let mut sum = Vec2::ZERO;
    for id in nearby {
        if let Some(agent) = ctx.registry.get_live(id) {
            if agent.role == Role::Forage {
                count += 1;
                sum += agent.pos;
            }
        }
    }
    let centroid = (count > 0).then(|| sum / count as f32);
    (count, centroid)
}

/// Low-food bookkeeping. Migration starts exactly when food has been short for
/// `MIGRATION_TRIGGER_TICKS` consecutive ticks; food coming back resets it.
fn update_foraging(school: &mut School, world: &World, events: &mut EventQueue) {
    if school.nearby_food < config::FOOD_DEPLETION_THRESHOLD {
        school.low_food_ticks = school.low_food_ticks.saturating_add(1);
        if !school.migrating && school.low_food_ticks >= config::MIGRATION_TRIGGER_TICKS {
            school.migrating = true;
            school.migration_dir = migration_direction(world, school.center);
            log::info!("school {:?} migrating {:?}", school.id, school.migration_dir);
            events.push(SimEvent::SchoolMigrating {
                school: school.id,
                direction: school.migration_dir,
            });
        }
    } else {
        school.low_food_ticks = 0;
        if school.migrating {
            log::debug!("school {:?} found food, migration over", school.id);
            school.migrating = false;
        }
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Lower index wins so roots are stable across runs.
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}
