use glam::Vec2;

use crate::agent::Agent;
use crate::config;
use crate::world::World;

/// Ease velocity toward `desired` (simple friction model).
pub fn steer(agent: &mut Agent, desired: Vec2, dt: f32) {
    agent.velocity += (desired - agent.velocity) * (config::STEERING_RESPONSE * dt).min(1.0);
}

/// Integrate position from velocity, keep the agent in the water and update heading.
pub fn integrate(agent: &mut Agent, world: &World, dt: f32) {
    agent.pos = world.clamp(agent.pos + agent.velocity * dt);
    if agent.velocity.length_squared() > 1e-4 {
        agent.heading = agent.velocity.normalize();
    }
}

/// Clamp horizontal and vertical speed independently.
pub fn clamp_axes(v: Vec2, max_h: f32, max_v: f32) -> Vec2 {
    Vec2::new(v.x.clamp(-max_h, max_h), v.y.clamp(-max_v, max_v))
}

/// Desired velocity to travel from `from` to `to` at `speed`.
pub fn seek(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let delta = to - from;
    if delta.length_squared() < 1e-6 {
        return Vec2::ZERO;
    }
    delta.normalize() * speed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::{SizeClass, Species};
    use glam::vec2;

    #[test]
    fn integrate_clamps_to_water_and_tracks_heading() {
        let world = World::new(100.0, 50.0);
        let mut agent =
            Agent::with_dimensions(Species::Walleye, SizeClass::Medium, vec2(95.0, 25.0), 3.0, 18.0);
        agent.velocity = vec2(600.0, 0.0);
        integrate(&mut agent, &world, 1.0 / 60.0);
        assert_eq!(agent.pos.x, 100.0);
        assert_eq!(agent.heading, Vec2::X);

        agent.velocity = Vec2::ZERO;
        integrate(&mut agent, &world, 1.0 / 60.0);
        assert_eq!(agent.heading, Vec2::X, "heading survives a stop");
    }

    #[test]
    fn clamp_axes_limits_each_axis() {
        assert_eq!(clamp_axes(vec2(100.0, -50.0), 40.0, 10.0), vec2(40.0, -10.0));
        assert_eq!(seek(Vec2::ZERO, vec2(10.0, 0.0), 20.0), vec2(20.0, 0.0));
        assert_eq!(seek(Vec2::ONE, Vec2::ONE, 20.0), Vec2::ZERO);
    }
}
