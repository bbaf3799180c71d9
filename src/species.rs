use rand::Rng;
use serde::{Deserialize, Serialize};

/// Position in the food chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Predator,
    Baitfish,
    Forage,
}

impl Role {
    pub fn tier(self) -> u8 {
        match self {
            Role::Forage => 0,
            Role::Baitfish => 1,
            Role::Predator => 2,
        }
    }

    /// A consumer may only eat exactly one tier down.
    pub fn can_eat(self, prey: Role) -> bool {
        self.tier() == prey.tier() + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    LargemouthBass,
    NorthernPike,
    Walleye,
    Shad,
    Alewife,
    Zooplankton,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Tiny,
    Small,
    Medium,
    Large,
    Trophy,
}

impl SizeClass {
    pub fn weight_multiplier(self) -> f32 {
        match self {
            SizeClass::Tiny => 0.25,
            SizeClass::Small => 0.5,
            SizeClass::Medium => 1.0,
            SizeClass::Large => 1.8,
            SizeClass::Trophy => 3.0,
        }
    }
}

/// Static per-species tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeciesProfile {
    pub detection_radius: f32,
    pub chase_radius: f32,
    pub strike_radius: f32,
    pub hunger_threshold: f32,
    /// Hunger gained per second.
    pub hunger_rate: f32,
    pub cruise_speed: f32,
    pub burst_speed: f32,
    /// Struggle multiplier during a fight.
    pub fight_strength: f32,
    pub base_weight_lb: f32,
    pub base_length_in: f32,
}

impl Species {
    pub const ALL: [Species; 6] = [
        Species::LargemouthBass,
        Species::NorthernPike,
        Species::Walleye,
        Species::Shad,
        Species::Alewife,
        Species::Zooplankton,
    ];

    pub fn role(self) -> Role {
        match self {
            Species::LargemouthBass | Species::NorthernPike | Species::Walleye => Role::Predator,
            Species::Shad | Species::Alewife => Role::Baitfish,
            Species::Zooplankton => Role::Forage,
        }
    }

    pub fn schools(self) -> bool {
        self.role() != Role::Predator
    }

    pub fn profile(self) -> SpeciesProfile {
        match self {
            Species::LargemouthBass => SpeciesProfile {
                detection_radius: 220.0,
                chase_radius: 120.0,
                strike_radius: 18.0,
                hunger_threshold: 45.0,
                hunger_rate: 0.6,
                cruise_speed: 35.0,
                burst_speed: 140.0,
                fight_strength: 1.0,
                base_weight_lb: 3.0,
                base_length_in: 15.0,
            },
            Species::NorthernPike => SpeciesProfile {
                detection_radius: 260.0,
                chase_radius: 140.0,
                strike_radius: 24.0,
                hunger_threshold: 50.0,
                hunger_rate: 0.5,
                cruise_speed: 30.0,
                burst_speed: 170.0,
                fight_strength: 1.2,
                base_weight_lb: 8.0,
                base_length_in: 30.0,
            },
            Species::Walleye => SpeciesProfile {
                detection_radius: 200.0,
                chase_radius: 110.0,
                strike_radius: 16.0,
                hunger_threshold: 40.0,
                hunger_rate: 0.55,
                cruise_speed: 32.0,
                burst_speed: 120.0,
                fight_strength: 0.8,
                base_weight_lb: 3.0,
                base_length_in: 18.0,
            },
            Species::Shad => SpeciesProfile {
                detection_radius: 80.0,
                chase_radius: 0.0,
                strike_radius: 0.0,
                hunger_threshold: 30.0,
                hunger_rate: 0.4,
                cruise_speed: 25.0,
                burst_speed: 90.0,
                fight_strength: 0.3,
                base_weight_lb: 0.3,
                base_length_in: 6.0,
            },
            Species::Alewife => SpeciesProfile {
                detection_radius: 70.0,
                chase_radius: 0.0,
                strike_radius: 0.0,
                hunger_threshold: 30.0,
                hunger_rate: 0.45,
                cruise_speed: 28.0,
                burst_speed: 95.0,
                fight_strength: 0.3,
                base_weight_lb: 0.2,
                base_length_in: 5.0,
            },
            Species::Zooplankton => SpeciesProfile {
                detection_radius: 0.0,
                chase_radius: 0.0,
                strike_radius: 0.0,
                hunger_threshold: 0.0,
                hunger_rate: 0.0,
                cruise_speed: 6.0,
                burst_speed: 10.0,
                fight_strength: 0.0,
                base_weight_lb: 0.001,
                base_length_in: 0.1,
            },
        }
    }

    /// Roll a weight (lb) and length (in) for a fresh agent of this species.
    pub fn roll_dimensions(self, size: SizeClass, rng: &mut impl Rng) -> (f32, f32) {
        let profile = self.profile();
        let mult = size.weight_multiplier();
        let weight = profile.base_weight_lb * mult * rng.gen_range(0.85..1.15);
        // Length scales with the cube root of mass.
        let length = profile.base_length_in * mult.cbrt() * rng.gen_range(0.95..1.05);
        (weight, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn tiers_cannot_be_skipped() {
        assert!(Role::Predator.can_eat(Role::Baitfish));
        assert!(Role::Baitfish.can_eat(Role::Forage));
        assert!(!Role::Predator.can_eat(Role::Forage));
        assert!(!Role::Forage.can_eat(Role::Forage));
        assert!(!Role::Baitfish.can_eat(Role::Predator));
    }

    #[test]
    fn trophy_fish_outweigh_tiny_fish() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (tiny, _) = Species::LargemouthBass.roll_dimensions(SizeClass::Tiny, &mut rng);
        let (trophy, _) = Species::LargemouthBass.roll_dimensions(SizeClass::Trophy, &mut rng);
        assert!(trophy > tiny * 5.0);
        assert!(Species::ALL.iter().filter(|s| s.schools()).count() == 3);
    }
}
