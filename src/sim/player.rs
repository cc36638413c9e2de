//! Player body
//!
//! The player stays at a fixed X while the world scrolls past. Vertical motion
//! is the motion controller's velocity plus base gravity, integrated against
//! ground colliders only (obstacles are hazards, not platforms).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::motion::{MotionInput, MotionOutcome, MotionState};
use super::spawn::PlayerSnapshot;
use super::world::{Layers, SpatialQuery};
use crate::tuning::Tuning;

/// Ground probe box thickness beneath the collider
const GROUND_PROBE_HEIGHT: f32 = 0.08;
/// Ground probe is this much narrower than the collider
const GROUND_PROBE_INSET: f32 = 0.04;
/// Downward snap ray starts this far inside the collider
const SNAP_SKIN: f32 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Collider center
    pub position: Vec2,
    pub size: Vec2,
    pub motion: MotionState,
}

impl Player {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            motion: MotionState::new(),
        }
    }

    /// Standing on `surface_y` at `x`
    pub fn standing(x: f32, surface_y: f32, size: Vec2) -> Self {
        Self::new(Vec2::new(x, surface_y + size.y * 0.5), size)
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.size)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            height: self.size.y,
        }
    }

    /// Thin box just below the collider. No ground layer simply means airborne.
    pub fn probe_ground<Q: SpatialQuery + ?Sized>(&self, world: &Q) -> bool {
        let bottom = self.bounds().min.y;
        let center = Vec2::new(self.position.x, bottom - GROUND_PROBE_HEIGHT * 0.5 + 0.01);
        let size = Vec2::new(
            (self.size.x - GROUND_PROBE_INSET).max(0.01),
            GROUND_PROBE_HEIGHT,
        );
        world.overlap_box(center, size, Layers::GROUND).is_some()
    }

    /// One fixed step: controller, gravity, then move with a ground snap
    pub fn step<Q: SpatialQuery + ?Sized>(
        &mut self,
        world: &Q,
        jump_pressed: bool,
        jump_held: bool,
        dt: f32,
        tuning: &Tuning,
    ) -> MotionOutcome {
        let input = MotionInput {
            grounded: self.probe_ground(world),
            jump_pressed,
            jump_held,
            dt,
        };
        let outcome = self.motion.step(&input, &tuning.motion, tuning.physics.gravity);

        let vy = &mut self.motion.vertical_velocity;
        if input.grounded && *vy <= 0.0 {
            *vy = 0.0;
            return outcome;
        }
        *vy -= tuning.physics.gravity * tuning.physics.effective_gravity_scale() * dt;

        let dy = *vy * dt;
        if dy < 0.0 {
            let half_height = self.size.y * 0.5;
            let origin = Vec2::new(self.position.x, self.position.y - half_height + SNAP_SKIN);
            if let Some(hit) = world.raycast(origin, Vec2::NEG_Y, -dy + SNAP_SKIN, Layers::GROUND) {
                self.position.y = hit.point.y + half_height;
                self.motion.vertical_velocity = 0.0;
                return outcome;
            }
        }
        self.position.y += dy;
        outcome
    }
}
