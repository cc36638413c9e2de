//! World scroll speed
//!
//! Movers ask a [`SpeedProvider`] instead of reading shared state, so tests can
//! plug in a fixed speed.

use crate::tuning::SpeedTuning;

pub trait SpeedProvider: std::fmt::Debug {
    /// World units per second the level scrolls left
    fn current_scroll_speed(&self) -> f32;

    /// Advance by one tick
    fn advance(&mut self, _dt: f32) {}

    /// Back to the run-start speed
    fn reset(&mut self) {}

    /// Pick up new tuning without restarting
    fn retune(&mut self, _tuning: &SpeedTuning) {}
}

/// Constant speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSpeed(pub f32);

impl SpeedProvider for FixedSpeed {
    fn current_scroll_speed(&self) -> f32 {
        self.0
    }
}

/// Eases from `base` to `max` over `ramp_seconds` (smoothstep)
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedRamp {
    pub base: f32,
    pub max: f32,
    pub ramp_seconds: f32,
    pub elapsed: f32,
    pub enabled: bool,
}

impl SpeedRamp {
    pub fn from_tuning(tuning: &SpeedTuning) -> Self {
        Self {
            base: tuning.base,
            max: tuning.max,
            ramp_seconds: tuning.ramp_seconds,
            elapsed: 0.0,
            enabled: tuning.ramp,
        }
    }
}

impl SpeedProvider for SpeedRamp {
    /// Keeps the elapsed time
    fn retune(&mut self, tuning: &SpeedTuning) {
        self.base = tuning.base;
        self.max = tuning.max;
        self.ramp_seconds = tuning.ramp_seconds;
        self.enabled = tuning.ramp;
    }

    fn current_scroll_speed(&self) -> f32 {
        if !self.enabled {
            return self.base;
        }
        if self.ramp_seconds <= 0.0 {
            return self.max;
        }
        let t = (self.elapsed / self.ramp_seconds).clamp(0.0, 1.0);
        let eased = t * t * (3.0 - 2.0 * t);
        self.base + (self.max - self.base) * eased
    }

    fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}
