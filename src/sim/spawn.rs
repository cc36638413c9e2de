//! Shared spawner plumbing: schedule, camera, spawn column probe

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::envelope::JumpEnvelope;
use super::world::{Layers, SpatialQuery};
use crate::consts::{PROBE_DISTANCE, PROBE_LIFT};

/// When a spawner fires next. Rolled forward after every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSchedule {
    pub next_spawn_time: f32,
    pub min_interval: f32,
    pub max_interval: f32,
}

impl SpawnSchedule {
    pub fn new(min_interval: f32, max_interval: f32) -> Self {
        Self {
            next_spawn_time: 0.0,
            min_interval,
            max_interval,
        }
    }

    #[inline]
    pub fn is_due(&self, now: f32) -> bool {
        now >= self.next_spawn_time
    }

    /// Schedule the next spawn relative to `now`
    pub fn roll<R: Rng>(&mut self, now: f32, rng: &mut R) {
        self.next_spawn_time = now + self.draw_interval(rng);
    }

    /// Change the interval range without moving the pending spawn
    pub fn set_intervals(&mut self, min_interval: f32, max_interval: f32) {
        self.min_interval = min_interval;
        self.max_interval = max_interval;
    }

    fn draw_interval<R: Rng>(&self, rng: &mut R) -> f32 {
        let lo = self.min_interval.min(self.max_interval).max(0.0);
        let hi = self.min_interval.max(self.max_interval).max(0.0);
        if hi - lo <= f32::EPSILON {
            lo
        } else {
            rng.random_range(lo..=hi)
        }
    }
}

/// Orthographic camera the spawn column is measured from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec2,
    /// Half of the visible world height
    pub half_height: f32,
}

impl Camera {
    pub fn new(position: Vec2, half_height: f32) -> Self {
        Self {
            position,
            half_height,
        }
    }

    /// Height above the view the downward probe starts from
    pub fn probe_origin_y(&self) -> f32 {
        self.position.y + self.half_height + PROBE_LIFT
    }
}

/// What spawners need to know about the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Collider center
    pub position: Vec2,
    /// Standing collider height
    pub height: f32,
}

/// Per-tick inputs shared by both spawners
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    /// Seconds since run start
    pub now: f32,
    pub camera: Option<Camera>,
    pub player: Option<PlayerSnapshot>,
    /// Recomputed from tuning every tick
    pub envelope: JumpEnvelope,
}

/// Ground surface height under `x`, probing down from above the camera view.
///
/// Falls back to one unit below the player, or 0 with no player.
pub fn probe_surface<Q: SpatialQuery + ?Sized>(
    world: &Q,
    camera: &Camera,
    x: f32,
    player: Option<&PlayerSnapshot>,
) -> f32 {
    let origin = Vec2::new(x, camera.probe_origin_y());
    match world.raycast(origin, Vec2::NEG_Y, PROBE_DISTANCE, Layers::GROUND) {
        Some(hit) => hit.point.y,
        None => player.map(|p| p.position.y - 1.0).unwrap_or(0.0),
    }
}
