use glam::Vec2;

use crate::agent::{AgentId, AgentRegistry};
use crate::world::World;

/// Uniform grid over the water column, rebuilt from the registry each phase that needs it.
pub struct SpatialHash {
    inv_cell_size: f32,
    pub cols: usize,
    pub rows: usize,
    cells: Vec<Vec<AgentId>>,
}

impl SpatialHash {
    pub fn new(world_w: f32, world_h: f32, cell_size: f32) -> Self {
        let cols = ((world_w / cell_size).ceil() as usize).max(1);
        let rows = ((world_h / cell_size).ceil() as usize).max(1);
        let cells = (0..cols * rows).map(|_| Vec::with_capacity(8)).collect();
        Self {
            inv_cell_size: 1.0 / cell_size,
            cols,
            rows,
            cells,
        }
    }

    fn cell_coords(&self, pos: Vec2) -> (usize, usize) {
        let cx = ((pos.x.max(0.0) * self.inv_cell_size) as usize).min(self.cols - 1);
        let cy = ((pos.y.max(0.0) * self.inv_cell_size) as usize).min(self.rows - 1);
        (cx, cy)
    }

    /// Clear all cells and re-insert every live agent.
    pub fn rebuild(&mut self, registry: &AgentRegistry) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for agent in registry.iter_live() {
            let (cx, cy) = self.cell_coords(agent.pos);
            self.cells[cy * self.cols + cx].push(agent.id);
        }
    }

    /// Live agents within `radius` of `pos`, in cell-scan order.
    ///
    /// Agents marked for removal since the last rebuild are filtered out.
    pub fn query_radius(
        &self,
        pos: Vec2,
        radius: f32,
        world: &World,
        registry: &AgentRegistry,
    ) -> Vec<AgentId> {
        let mut result = Vec::new();
        let radius_sq = radius * radius;
        let cells_range = (radius * self.inv_cell_size).ceil() as i32 + 1;
        let (cx, cy) = self.cell_coords(pos);
        let (cx, cy) = (cx as i32, cy as i32);

        for dy in -cells_range..=cells_range {
            for dx in -cells_range..=cells_range {
                let gx = cx + dx;
                let gy = cy + dy;
                if gx < 0 || gx >= self.cols as i32 || gy < 0 || gy >= self.rows as i32 {
                    continue;
                }
                let cell_idx = gy as usize * self.cols + gx as usize;
                for &id in &self.cells[cell_idx] {
                    if let Some(agent) = registry.get_live(id) {
                        if world.distance_sq(pos, agent.pos) <= radius_sq {
                            result.push(id);
                        }
                    }
                }
            }
        }

        result
    }

    pub fn query_radius_excluding(
        &self,
        pos: Vec2,
        radius: f32,
        exclude: AgentId,
        world: &World,
        registry: &AgentRegistry,
    ) -> Vec<AgentId> {
        let mut result = self.query_radius(pos, radius, world, registry);
        result.retain(|&id| id != exclude);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, RemovalReason};
    use crate::species::{SizeClass, Species};
    use glam::vec2;

    #[test]
    fn consumed_agents_are_not_returned_from_queries() {
        let world = World::new(200.0, 200.0);
        let mut registry = AgentRegistry::new(2);
        let keep = registry
            .spawn(Agent::with_dimensions(Species::Shad, SizeClass::Small, vec2(50.0, 50.0), 0.2, 5.0))
            .unwrap();
        let eaten = registry
            .spawn(Agent::with_dimensions(Species::Shad, SizeClass::Small, vec2(55.0, 50.0), 0.2, 5.0))
            .unwrap();

        let mut spatial = SpatialHash::new(world.width, world.depth, 32.0);
        spatial.rebuild(&registry);
        // Marked after the rebuild: still filtered.
        registry.get_mut(eaten).unwrap().mark_removed(RemovalReason::Consumed);

        let neighbors = spatial.query_radius(vec2(50.0, 50.0), 20.0, &world, &registry);
        assert_eq!(neighbors, vec![keep]);
    }
}
