//! Dash Runner - endless runner core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player motion, spawners, self-settling coins)
//! - `tuning`: Data-driven jump feel and spawn balance
//! - `error`: Tuning load/validation errors

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::TuningError;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World gravity magnitude (units/s², pointing down)
    pub const GRAVITY: f32 = 9.81;
    /// Floor on `gravity * gravity_scale` when estimating jump apex
    pub const MIN_GRAVITY: f32 = 0.01;
    /// Player collider height used when no player is present
    pub const DEFAULT_PLAYER_HEIGHT: f32 = 1.8;
    pub const PLAYER_WIDTH: f32 = 0.6;
    /// Jump impulse (initial upward velocity, unit mass)
    pub const DEFAULT_JUMP_IMPULSE: f32 = 11.0;
    /// Scroll speed at run start
    pub const DEFAULT_SCROLL_SPEED: f32 = 8.0;
    /// Fixed player X; the world scrolls past it
    pub const PLAYER_X: f32 = -6.0;

    /// Top of the ground strip
    pub const GROUND_Y: f32 = 0.0;
    pub const GROUND_HALF_LENGTH: f32 = 1000.0;
    pub const GROUND_DEPTH: f32 = 4.0;
    /// Camera view, centered above the ground
    pub const CAMERA_Y: f32 = 3.0;
    pub const CAMERA_HALF_HEIGHT: f32 = 5.0;

    /// Spawn probe starts this far above the top of the camera view
    pub const PROBE_LIFT: f32 = 5.0;
    /// Maximum distance of the downward surface probe
    pub const PROBE_DISTANCE: f32 = 100.0;
    /// Overhead prefab thickness at or below this is not rescaled
    pub const MIN_MEASURABLE_THICKNESS: f32 = 1e-4;
}

/// Clamp `value` into `[lo, hi]`, checking the lower bound first.
///
/// Unlike `f32::clamp` this never panics when `lo > hi`; the lower bound wins.
#[inline]
pub fn soft_clamp(value: f32, lo: f32, hi: f32) -> f32 {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}
