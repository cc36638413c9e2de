//! Jump envelope estimation
//!
//! Spawners size their lanes from how high a single jump reaches. The apex is
//! the closed-form `v² / 2g`; the double-jump apex is a fixed multiple of it.

use serde::{Deserialize, Serialize};

use crate::consts::MIN_GRAVITY;
use crate::tuning::Tuning;

/// Apex height of a jump launched at `impulse` (unit mass) under
/// `gravity_magnitude * gravity_scale`.
///
/// The denominator is floored at [`MIN_GRAVITY`], so the result is finite and
/// non-negative for any finite impulse.
#[inline]
pub fn apex_height(impulse: f32, gravity_magnitude: f32, gravity_scale: Option<f32>) -> f32 {
    let g = (gravity_magnitude * gravity_scale.unwrap_or(1.0)).abs();
    impulse * impulse / (2.0 * g.max(MIN_GRAVITY))
}

/// Physical reach of the player, derived from the current tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpEnvelope {
    /// Single-jump apex above take-off
    pub apex_height: f32,
    /// Effective gravity magnitude (scale applied)
    pub gravity_magnitude: f32,
    pub impulse: f32,
    /// Double-jump apex as a multiple of `apex_height`
    pub double_jump_factor: f32,
}

impl JumpEnvelope {
    pub fn new(
        impulse: f32,
        gravity_magnitude: f32,
        gravity_scale: Option<f32>,
        double_jump_factor: f32,
    ) -> Self {
        Self {
            apex_height: apex_height(impulse, gravity_magnitude, gravity_scale),
            gravity_magnitude: (gravity_magnitude * gravity_scale.unwrap_or(1.0)).abs(),
            impulse,
            double_jump_factor,
        }
    }

    /// Recompute from tuning. Never cached: tuning can change mid-run.
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(
            tuning.motion.jump_impulse,
            tuning.physics.gravity,
            tuning.physics.gravity_scale,
            tuning.physics.double_jump_factor,
        )
    }

    /// Conservative double-jump apex (under-approximates the true arc)
    #[inline]
    pub fn double_apex(&self) -> f32 {
        self.apex_height * self.double_jump_factor
    }

    /// Time to reach the apex from take-off
    pub fn time_to_apex(&self) -> f32 {
        self.impulse.abs() / self.gravity_magnitude.max(MIN_GRAVITY)
    }
}
