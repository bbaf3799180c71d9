//! Session tackle: the line and reel the player picked. Read-only during a session.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_TEST_LB: f32 = 2.0;
pub const MAX_TEST_LB: f32 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineMaterial {
    Monofilament,
    Fluorocarbon,
    Braid,
}

impl LineMaterial {
    pub fn default_sensitivity(self) -> f32 {
        match self {
            LineMaterial::Monofilament => 0.6,
            LineMaterial::Fluorocarbon => 0.75,
            LineMaterial::Braid => 0.95,
        }
    }

    pub fn break_multiplier(self) -> f32 {
        match self {
            LineMaterial::Monofilament => 1.0,
            LineMaterial::Fluorocarbon => 1.05,
            LineMaterial::Braid => 1.2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReelKind {
    Spincast,
    Spinning,
    Baitcaster,
}

impl ReelKind {
    pub fn retrieve_multiplier(self) -> f32 {
        match self {
            ReelKind::Spincast => 0.85,
            ReelKind::Spinning => 1.0,
            ReelKind::Baitcaster => 1.15,
        }
    }

    /// Drag the reel actually applies for a setting in [0, 1]. Spincast drags
    /// top out early; a baitcaster's star drag bites harder at low settings.
    pub fn drag_curve(self, setting: f32) -> f32 {
        match self {
            ReelKind::Spincast => setting.min(0.7),
            ReelKind::Spinning => setting,
            ReelKind::Baitcaster => setting.powf(0.8),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    pub test_strength_lb: f32,
    pub material: LineMaterial,
    /// Probability in [0, 1] that a strike or spike is surfaced to the player.
    pub sensitivity: f32,
}

impl LineConfig {
    pub fn new(test_strength_lb: f32, material: LineMaterial) -> Self {
        Self {
            test_strength_lb,
            material,
            sensitivity: material.default_sensitivity(),
        }
    }

    pub fn sanitized(self) -> Self {
        let test = clamp_logged("test_strength_lb", self.test_strength_lb, MIN_TEST_LB, MAX_TEST_LB);
        let sensitivity = clamp_logged("sensitivity", self.sensitivity, 0.0, 1.0);
        Self {
            test_strength_lb: test,
            sensitivity,
            ..self
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::new(10.0, LineMaterial::Monofilament)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReelConfig {
    pub kind: ReelKind,
    /// Drag in [0, 1].
    pub drag_setting: f32,
}

impl ReelConfig {
    pub fn new(kind: ReelKind, drag_setting: f32) -> Self {
        Self { kind, drag_setting }
    }

    pub fn sanitized(self) -> Self {
        Self {
            drag_setting: clamp_logged("drag_setting", self.drag_setting, 0.0, 1.0),
            ..self
        }
    }

    pub fn effective_drag(&self) -> f32 {
        self.kind.drag_curve(self.drag_setting)
    }
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self::new(ReelKind::Spinning, 0.5)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tackle {
    pub line: LineConfig,
    pub reel: ReelConfig,
}

impl Tackle {
    /// Build a session profile, clamping anything out of range.
    pub fn new(line: LineConfig, reel: ReelConfig) -> Self {
        Self {
            line: line.sanitized(),
            reel: reel.sanitized(),
        }
    }

    /// Roll against line sensitivity: should this event be surfaced to the player?
    pub fn feel_roll(&self, rng: &mut impl Rng) -> bool {
        rng.gen::<f32>() < self.line.sensitivity
    }
}

fn clamp_logged(name: &str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != value {
        log::warn!("{name} {value} out of range, clamped to {clamped}");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn out_of_range_settings_are_clamped_at_ingestion() {
        let tackle = Tackle::new(
            LineConfig {
                test_strength_lb: 500.0,
                material: LineMaterial::Braid,
                sensitivity: -0.3,
            },
            ReelConfig::new(ReelKind::Baitcaster, 1.7),
        );
        assert_eq!(tackle.line.test_strength_lb, MAX_TEST_LB);
        assert_eq!(tackle.line.sensitivity, 0.0);
        assert_eq!(tackle.reel.drag_setting, 1.0);

        let nan_drag = ReelConfig::new(ReelKind::Spinning, f32::NAN).sanitized();
        assert_eq!(nan_drag.drag_setting, 0.0);
    }

    #[test]
    fn feel_roll_respects_sensitivity_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let numb = Tackle::new(
            LineConfig {
                sensitivity: 0.0,
                ..LineConfig::default()
            },
            ReelConfig::default(),
        );
        let sharp = Tackle::new(
            LineConfig {
                sensitivity: 1.0,
                ..LineConfig::default()
            },
            ReelConfig::default(),
        );
        for _ in 0..100 {
            assert!(!numb.feel_roll(&mut rng));
            assert!(sharp.feel_roll(&mut rng));
        }
    }
}
