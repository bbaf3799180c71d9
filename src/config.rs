// All tunable simulation constants in one place.
//
// Durations are expressed in ticks at `TICK_RATE`; speeds in world units per second.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Simulation
pub const TICK_RATE: u32 = 60;
pub const FIXED_DT: f32 = 1.0 / TICK_RATE as f32;
pub const DEFAULT_SEED: u64 = 42;

// World
pub const WORLD_WIDTH: f32 = 1600.0;
pub const WORLD_DEPTH: f32 = 600.0;
pub const SPATIAL_CELL_SIZE: f32 = 64.0;
pub const BOUNDARY_MARGIN: f32 = 30.0;

// Capacity
pub const MAX_AGENT_COUNT: usize = 512;
pub const MAX_SCHOOL_COUNT: usize = 32;

// Vitals
pub const MAX_HUNGER: f32 = 100.0;
pub const MAX_HEALTH: f32 = 100.0;
pub const INITIAL_HUNGER: f32 = 40.0;
pub const CRITICAL_HUNGER: f32 = 75.0;
pub const TERMINAL_HUNGER: f32 = 98.0;
pub const STARVATION_DAMAGE: f32 = 4.0; // health per second above terminal hunger
pub const LOW_HEALTH: f32 = 20.0;

// Behavior
pub const DECISION_COOLDOWN_TICKS: u32 = 12;
pub const HUNT_GRACE_TICKS: u32 = 90;
pub const STRIKE_RECOVERY_TICKS: u32 = 20;
pub const FLEE_TICKS: u32 = 120;
pub const FRENZY_TICKS: u32 = 300;
pub const LOST_TARGET_FACTOR: f32 = 1.5;
pub const TIE_DISTANCE_EPSILON: f32 = 0.5;
pub const DISTURBANCE_RADIUS: f32 = 140.0;
pub const PREY_ALARM_RADIUS: f32 = 90.0;
pub const BASE_STRIKE_CHANCE: f32 = 0.65;
pub const FRENZY_STRIKE_BONUS: f32 = 0.3;
pub const DESPERATE_STRIKE_BONUS: f32 = 0.15;
pub const FRENZY_DETECTION_MULT: f32 = 1.5;
pub const DESPERATE_DETECTION_MULT: f32 = 1.3;
pub const STEERING_RESPONSE: f32 = 4.0;
pub const IDLE_SPEED_FRACTION: f32 = 0.3;

// Schools
pub const MIN_SCHOOL_SIZE: usize = 3;
pub const CLUSTER_RADIUS: f32 = 40.0;
pub const STILL_BELONGS_RADIUS: f32 = 140.0;
pub const SCHOOL_SPACING: f32 = 7.0;
pub const GOLDEN_ANGLE: f32 = 2.399_963;
pub const FOOD_SENSE_RADIUS: f32 = 220.0;
pub const FOOD_DEPLETION_THRESHOLD: usize = 3;
pub const MIGRATION_TRIGGER_TICKS: u32 = 600;
pub const SCHOOL_HUNGRY: f32 = 35.0;
pub const SCHOOL_WANDER_STRENGTH: f32 = 30.0;
pub const SCHOOL_WANDER_FREQUENCY: f64 = 0.01;
pub const FOOD_ATTRACTION: f32 = 90.0;
pub const MIGRATION_IMPULSE: f32 = 70.0;
pub const SCHOOL_VELOCITY_DAMPING: f32 = 0.98;
pub const SCHOOL_MAX_SPEED_H: f32 = 40.0;
pub const SCHOOL_MAX_SPEED_V: f32 = 15.0;
pub const MIGRATING_MAX_SPEED_H: f32 = 70.0;
pub const MIGRATING_MAX_SPEED_V: f32 = 6.0;
pub const FEEDING_MAX_SPEED_V: f32 = 45.0;
pub const MEMBER_OFFSET_PULL: f32 = 6.0;
pub const MEMBER_SEPARATION_RADIUS: f32 = 5.0;
pub const MEMBER_SEPARATION_STRENGTH: f32 = 60.0;
pub const MEMBER_ALIGNMENT_STRENGTH: f32 = 1.5;
pub const MEMBER_FLEE_STRENGTH: f32 = 160.0;

// Food chain
pub const GRAZE_RADIUS: f32 = 10.0;
pub const GRAZE_HUNGER: f32 = 20.0;
pub const FORAGE_SATIATION: f32 = 12.0;
pub const SATIATION_PER_LB: f32 = 30.0;
pub const MIN_SATIATION: f32 = 8.0;
pub const STRIKE_REACH_SLACK: f32 = 1.25;
pub const FRENZY_WINDOW_TICKS: u64 = 120;
pub const FRENZY_CONSUMPTION_THRESHOLD: usize = 3;

// Capture
pub const HOOKSET_WINDOW_TICKS: u32 = 45;
pub const HOOKSET_PULSE_THRESHOLD: f32 = 0.6;
pub const HOOKSET_SUSTAIN_INTENSITY: f32 = 0.98;
pub const HOOKSET_SUSTAIN_TICKS: u32 = 6;

/// Weights for choosing which school member a predator goes after.
///
/// The defaults are hand-tuned; they favour members on the side facing the
/// predator and on the edge of the school over the closest member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetScoring {
    pub alignment_weight: f32,
    pub edge_weight: f32,
    pub distance_penalty: f32,
}

impl Default for TargetScoring {
    fn default() -> Self {
        Self {
            alignment_weight: 1.0,
            edge_weight: 0.6,
            distance_penalty: 0.004,
        }
    }
}

/// Coefficients of the line-tension fight model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FightTuning {
    pub tension_ceiling: f32,
    /// Fraction of the gap to target tension closed per tick.
    pub tension_response: f32,
    pub struggle_base: f32,
    pub reel_tension: f32,
    pub break_per_lb_test: f32,
    pub drag_absorb: f32,
    pub weight_shock_load: f32,
    pub min_break_threshold: f32,
    pub retrieve_speed: f32,
    pub drag_retrieve_slowdown: f32,
    pub run_factor: f32,
    pub catch_distance: f32,
    pub slack_escape_ticks: u32,
    pub spike_interval_ticks: u32,
    pub spike_duration_ticks: u32,
    pub notable_spike: f32,
}

impl Default for FightTuning {
    fn default() -> Self {
        Self {
            tension_ceiling: 120.0,
            tension_response: 0.15,
            struggle_base: 8.0,
            reel_tension: 30.0,
            break_per_lb_test: 6.0,
            drag_absorb: 25.0,
            weight_shock_load: 1.0,
            min_break_threshold: 10.0,
            retrieve_speed: 60.0,
            drag_retrieve_slowdown: 0.5,
            run_factor: 0.5,
            catch_distance: 120.0,
            slack_escape_ticks: 180,
            spike_interval_ticks: 90,
            spike_duration_ticks: 20,
            notable_spike: 0.75,
        }
    }
}

/// Runtime-tunable configuration. Everything not here is a `pub const` above.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    pub world_width: f32,
    pub world_depth: f32,
    pub max_agents: usize,
    pub max_schools: usize,
    pub hookset_window_ticks: u32,
    pub target_scoring: TargetScoring,
    pub fight: FightTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            world_width: WORLD_WIDTH,
            world_depth: WORLD_DEPTH,
            max_agents: MAX_AGENT_COUNT,
            max_schools: MAX_SCHOOL_COUNT,
            hookset_window_ticks: HOOKSET_WINDOW_TICKS,
            target_scoring: TargetScoring::default(),
            fight: FightTuning::default(),
        }
    }
}

impl SimConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON config; missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_width > SPATIAL_CELL_SIZE) || !(self.world_depth > SPATIAL_CELL_SIZE) {
            return Err(ConfigError::InvalidWorld {
                width: self.world_width,
                depth: self.world_depth,
            });
        }
        if self.max_agents == 0 {
            return Err(ConfigError::ZeroCapacity("max_agents"));
        }
        if self.max_schools == 0 {
            return Err(ConfigError::ZeroCapacity("max_schools"));
        }
        if self.hookset_window_ticks == 0 {
            return Err(ConfigError::ZeroCapacity("hookset_window_ticks"));
        }
        if !(self.fight.tension_ceiling > 0.0) {
            return Err(ConfigError::InvalidFightTuning("tension_ceiling must be positive"));
        }
        if !(self.fight.tension_response > 0.0 && self.fight.tension_response <= 1.0) {
            return Err(ConfigError::InvalidFightTuning(
                "tension_response must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config = SimConfig::from_json_str(r#"{ "seed": 7, "target_scoring": { "edge_weight": 2.0 } }"#)
            .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.target_scoring.edge_weight, 2.0);
        assert_eq!(config.target_scoring.alignment_weight, 1.0);
        assert_eq!(config.max_agents, MAX_AGENT_COUNT);
    }

    #[test]
    fn rejects_degenerate_world_and_capacity() {
        assert!(matches!(
            SimConfig::from_json_str(r#"{ "world_width": 0.0 }"#),
            Err(ConfigError::InvalidWorld { .. })
        ));
        assert!(matches!(
            SimConfig::from_json_str(r#"{ "max_schools": 0 }"#),
            Err(ConfigError::ZeroCapacity("max_schools"))
        ));
        assert!(matches!(
            SimConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
