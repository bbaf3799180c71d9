use glam::Vec2;

use crate::config;

/// Normalised player intents for one tick. Raw device polling happens elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickInput {
    /// Current lure position, if the lure is in the water.
    pub lure: Option<Vec2>,
    /// Reel intensity in [0, 1].
    pub reel: f32,
    /// A qualifying hookset input happened this tick.
    pub hookset_attempt: bool,
    /// Splash or other scare at this point.
    pub disturbance: Option<Vec2>,
}

impl TickInput {
    pub fn with_lure(lure: Vec2) -> Self {
        Self {
            lure: Some(lure),
            ..Self::default()
        }
    }

    pub fn reel_clamped(&self) -> f32 {
        if self.reel.is_nan() {
            0.0
        } else {
            self.reel.clamp(0.0, 1.0)
        }
    }
}

/// Turns a stream of normalised stick samples into one-shot hookset attempts.
///
/// Qualifies on a sharp pulse (large change between consecutive samples) or on
/// full-intensity input held for `HOOKSET_SUSTAIN_TICKS`.
#[derive(Clone, Debug, Default)]
pub struct HooksetDetector {
    last: Vec2,
    sustained_ticks: u32,
    latched: bool,
}

impl HooksetDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this tick's stick sample (each axis in [-1, 1]).
    pub fn sample(&mut self, stick: Vec2) -> bool {
        // Only a jerk outward counts; letting go of the stick is not a hookset.
        let pulse = (stick - self.last).length() >= config::HOOKSET_PULSE_THRESHOLD
            && stick.length() > self.last.length();
        self.last = stick;

        if stick.length() >= config::HOOKSET_SUSTAIN_INTENSITY {
            self.sustained_ticks += 1;
        } else {
            self.sustained_ticks = 0;
            self.latched = false;
        }
        let sustained = self.sustained_ticks >= config::HOOKSET_SUSTAIN_TICKS;

        // One attempt per hold; releasing the stick re-arms.
        if (pulse || sustained) && !self.latched {
            self.latched = true;
            return true;
        }
        false
    }
}
