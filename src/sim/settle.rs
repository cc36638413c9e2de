//! Coin self-settle
//!
//! A coin checks its own clearance when it is created and again for a few
//! ticks afterwards, searching an ordered list of nearby positions. If none is
//! clear it is removed instead of being left overlapping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Circle, Shape};
use super::world::{ColliderId, CollisionWorld, Layers, SpatialQuery};
use crate::tuning::SettleTuning;

/// Ordered trial positions around `start`.
///
/// The start itself, then `pairs` symmetric vertical nudges (`±k·v_step`),
/// then `pairs` forward nudges (`+k·h_step, ±k·v_step/2`). Never longer than
/// `max_count`, never empty.
pub fn candidate_positions(
    start: Vec2,
    v_step: f32,
    h_step: f32,
    pairs: u32,
    max_count: usize,
) -> Vec<Vec2> {
    let max_count = max_count.max(1);
    let mut out = Vec::with_capacity(max_count);
    out.push(start);

    for k in 1..=pairs {
        if out.len() >= max_count {
            break;
        }
        let dy = k as f32 * v_step;
        out.push(start + Vec2::new(0.0, dy));
        if out.len() < max_count {
            out.push(start + Vec2::new(0.0, -dy));
        }
    }
    for k in 1..=pairs {
        if out.len() >= max_count {
            break;
        }
        let dx = k as f32 * h_step;
        let dy = k as f32 * 0.5 * v_step;
        out.push(start + Vec2::new(dx, dy));
        if out.len() < max_count {
            out.push(start + Vec2::new(dx, -dy));
        }
    }
    out
}

/// Whether a coin of `radius` may sit at `p`.
///
/// No obstacle inside a rectangle wider than the coin, and no other coin
/// inside its personal-space circle. `own` is excluded from the coin test.
pub fn is_clear<Q: SpatialQuery + ?Sized>(
    world: &Q,
    p: Vec2,
    radius: f32,
    own: Option<ColliderId>,
    tuning: &SettleTuning,
) -> bool {
    let avoid = Vec2::new(
        tuning.avoid_half_width * 2.0,
        radius * 2.0 + tuning.avoid_half_height * 2.0,
    );
    if world.overlap_box(p, avoid, Layers::OBSTACLE).is_some() {
        return false;
    }

    let personal_space = radius + tuning.min_coin_separation * 0.5;
    world
        .overlap_circle_all(p, personal_space, Layers::COIN)
        .into_iter()
        .all(|hit| Some(hit) == own)
}

/// First clear position around `start`, if any
pub fn find_clear_position<Q: SpatialQuery + ?Sized>(
    world: &Q,
    start: Vec2,
    radius: f32,
    own: Option<ColliderId>,
    tuning: &SettleTuning,
) -> Option<Vec2> {
    candidate_positions(
        start,
        tuning.vertical_step,
        tuning.horizontal_step,
        tuning.nudge_pairs,
        tuning.settle_attempts,
    )
    .into_iter()
    .find(|&p| is_clear(world, p, radius, own, tuning))
}

/// A live coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: ColliderId,
    pub position: Vec2,
    pub radius: f32,
    pub value: u32,
    /// Remaining post-spawn clearance re-checks
    pub verify_ticks_left: u32,
}

impl Coin {
    /// Settle at or near `position` and register the collider.
    ///
    /// Returns `None` (nothing registered) when every candidate is blocked.
    pub fn spawn(
        world: &mut CollisionWorld,
        position: Vec2,
        radius: f32,
        tuning: &SettleTuning,
    ) -> Option<Coin> {
        let Some(settled) = find_clear_position(&*world, position, radius, None, tuning) else {
            log::debug!(
                "Coin at ({:.2}, {:.2}) found no clear spot, dropped",
                position.x,
                position.y
            );
            return None;
        };

        let id = world.insert(Layers::COIN, Shape::Circle(Circle::new(settled, radius)));
        Some(Coin {
            id,
            position: settled,
            radius,
            value: tuning.coin_value,
            verify_ticks_left: tuning.verify_ticks,
        })
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.position, self.radius)
    }

    /// Re-run the settle search from the current position
    pub fn settle(&mut self, world: &mut CollisionWorld, tuning: &SettleTuning) -> bool {
        match find_clear_position(&*world, self.position, self.radius, Some(self.id), tuning) {
            Some(p) => {
                self.move_to(world, p);
                true
            }
            None => false,
        }
    }

    /// Post-spawn check. Returns false if the coin has to be removed.
    pub fn verify(&mut self, world: &mut CollisionWorld, tuning: &SettleTuning) -> bool {
        if self.verify_ticks_left == 0 {
            return true;
        }
        self.verify_ticks_left -= 1;

        if is_clear(&*world, self.position, self.radius, Some(self.id), tuning) {
            return true;
        }
        let settled = self.settle(world, tuning);
        if !settled {
            log::debug!("Coin {:?} lost its clearance, removing", self.id);
        }
        settled
    }

    pub fn scroll(&mut self, world: &mut CollisionWorld, distance: f32) {
        let target = self.position - Vec2::new(distance, 0.0);
        self.move_to(world, target);
    }

    pub fn is_past(&self, kill_x: f32) -> bool {
        self.position.x < kill_x
    }

    fn move_to(&mut self, world: &mut CollisionWorld, p: Vec2) {
        self.position = p;
        world.set_shape(self.id, Shape::Circle(self.circle()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::Aabb;

    const R: f32 = 0.22;

    fn block(world: &mut CollisionWorld, min: Vec2, max: Vec2) -> ColliderId {
        world.insert(Layers::OBSTACLE, Shape::Box(Aabb::new(min, max)))
    }

    #[test]
    fn test_candidate_order() {
        let c = candidate_positions(Vec2::ZERO, 0.35, 0.6, 3, 10);
        assert_eq!(c.len(), 10);
        assert_eq!(c[0], Vec2::ZERO);
        assert_eq!(c[1], Vec2::new(0.0, 0.35));
        assert_eq!(c[2], Vec2::new(0.0, -0.35));
        assert!((c[5].y - 1.05).abs() < 1e-6);
        assert!((c[6].y + 1.05).abs() < 1e-6);
        assert_eq!(c[7], Vec2::new(0.6, 0.175));
        assert_eq!(c[8], Vec2::new(0.6, -0.175));
        assert!((c[9].x - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_candidate_cap() {
        assert_eq!(candidate_positions(Vec2::ONE, 0.3, 0.5, 2, 8).len(), 8);
        assert_eq!(candidate_positions(Vec2::ONE, 0.3, 0.5, 2, 4).len(), 4);
        assert_eq!(candidate_positions(Vec2::ONE, 0.3, 0.5, 2, 0), vec![Vec2::ONE]);
        // Without a cap the list is 1 + 4 * pairs long
        assert_eq!(candidate_positions(Vec2::ZERO, 0.3, 0.5, 3, 100).len(), 13);
    }

    #[test]
    fn test_spawn_in_open_space_keeps_position() {
        let mut world = CollisionWorld::new();
        let tuning = SettleTuning::default();
        let coin = Coin::spawn(&mut world, Vec2::new(3.0, 2.0), R, &tuning).unwrap();
        assert_eq!(coin.position, Vec2::new(3.0, 2.0));
        assert_eq!(coin.verify_ticks_left, tuning.verify_ticks);
        assert_eq!(world.iter_layer(Layers::COIN).count(), 1);
    }

    #[test]
    fn test_spawn_nudges_off_obstacle() {
        let mut world = CollisionWorld::new();
        let tuning = SettleTuning::default();
        // Thin bar grazing the avoidance box: first upward nudge clears it
        block(&mut world, Vec2::new(-2.0, -0.6), Vec2::new(2.0, -0.4));
        let coin = Coin::spawn(&mut world, Vec2::ZERO, R, &tuning).unwrap();
        assert_eq!(coin.position, Vec2::new(0.0, 0.35));
        assert!(is_clear(&world, coin.position, R, Some(coin.id), &tuning));
    }

    #[test]
    fn test_fully_blocked_coin_is_dropped() {
        let mut world = CollisionWorld::new();
        let tuning = SettleTuning::default();
        block(&mut world, Vec2::new(-5.0, -5.0), Vec2::new(10.0, 5.0));
        assert!(Coin::spawn(&mut world, Vec2::ZERO, R, &tuning).is_none());
        assert_eq!(world.iter_layer(Layers::COIN).count(), 0);
    }

    #[test]
    fn test_coin_separation_excludes_self() {
        let mut world = CollisionWorld::new();
        let tuning = SettleTuning::default();
        let a = Coin::spawn(&mut world, Vec2::ZERO, R, &tuning).unwrap();
        assert!(is_clear(&world, a.position, R, Some(a.id), &tuning));
        assert!(!is_clear(&world, a.position, R, None, &tuning));

        // A second coin on the same spot moves away instead of stacking
        let b = Coin::spawn(&mut world, Vec2::ZERO, R, &tuning).unwrap();
        assert!(!a.circle().overlaps(&b.circle()));
    }

    #[test]
    fn test_verify_relocates_after_late_obstacle() {
        let mut world = CollisionWorld::new();
        let tuning = SettleTuning::default();
        let mut coin = Coin::spawn(&mut world, Vec2::ZERO, R, &tuning).unwrap();

        // Obstacle appears the same tick, below the coin
        block(&mut world, Vec2::new(-0.5, -0.9), Vec2::new(0.5, -0.5));
        assert!(coin.verify(&mut world, &tuning));
        assert!(coin.position.y > 0.0);
        assert_eq!(
            world.get(coin.id).unwrap().shape.center(),
            coin.position
        );
        assert_eq!(coin.verify_ticks_left, tuning.verify_ticks - 1);
    }

    #[test]
    fn test_verify_fails_when_engulfed() {
        let mut world = CollisionWorld::new();
        let tuning = SettleTuning::default();
        let mut coin = Coin::spawn(&mut world, Vec2::ZERO, R, &tuning).unwrap();
        block(&mut world, Vec2::new(-5.0, -5.0), Vec2::new(10.0, 5.0));
        assert!(!coin.verify(&mut world, &tuning));
    }

    #[test]
    fn test_verify_window_expires() {
        let mut world = CollisionWorld::new();
        let tuning = SettleTuning::default();
        let mut coin = Coin::spawn(&mut world, Vec2::ZERO, R, &tuning).unwrap();
        for _ in 0..tuning.verify_ticks {
            assert!(coin.verify(&mut world, &tuning));
        }
        block(&mut world, Vec2::new(-5.0, -5.0), Vec2::new(10.0, 5.0));
        // Past the window the coin no longer checks itself
        assert!(coin.verify(&mut world, &tuning));
        assert_eq!(coin.verify_ticks_left, 0);
    }

    #[test]
    fn test_scroll_moves_collider() {
        let mut world = CollisionWorld::new();
        let tuning = SettleTuning::default();
        let mut coin = Coin::spawn(&mut world, Vec2::new(0.0, 1.0), R, &tuning).unwrap();
        coin.scroll(&mut world, 41.0);
        assert!(coin.is_past(tuning.kill_x));
        assert_eq!(world.get(coin.id).unwrap().shape.center(), Vec2::new(-41.0, 1.0));
    }
}
