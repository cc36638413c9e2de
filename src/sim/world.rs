//! Collision world and the spatial query contract
//!
//! The controller and spawners only ever talk to [`SpatialQuery`]. The
//! [`CollisionWorld`] here is the brute-force implementation the run loop
//! uses; an engine integration can supply its own broadphase instead.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Circle, Shape};

bitflags! {
    /// Collider categories, used as query masks
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Layers: u32 {
        const GROUND   = 1 << 0;
        const OBSTACLE = 1 << 1;
        const COIN     = 1 << 2;
        const PLAYER   = 1 << 3;
    }
}

/// Stable handle to a collider (doubles as the owning entity's id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// A collider registered in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collider {
    pub id: ColliderId,
    pub layer: Layers,
    pub shape: Shape,
}

/// Result of a raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub collider: ColliderId,
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

/// Synchronous, side-effect-free spatial queries
pub trait SpatialQuery {
    /// First collider in `mask` overlapping the box
    fn overlap_box(&self, center: Vec2, size: Vec2, mask: Layers) -> Option<ColliderId>;

    /// Every collider in `mask` overlapping the box
    fn overlap_box_all(&self, center: Vec2, size: Vec2, mask: Layers) -> Vec<ColliderId>;

    /// Every collider in `mask` overlapping the circle
    fn overlap_circle_all(&self, center: Vec2, radius: f32, mask: Layers) -> Vec<ColliderId>;

    /// Closest collider in `mask` along the ray, if any within `max_distance`
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: Layers)
    -> Option<RayHit>;
}

/// Flat list of colliders, kept sorted by id for stable query order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionWorld {
    colliders: Vec<Collider>,
    next_id: u32,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self {
            colliders: Vec::new(),
            next_id: 1,
        }
    }

    /// Register a collider and return its handle
    pub fn insert(&mut self, layer: Layers, shape: Shape) -> ColliderId {
        let id = ColliderId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.colliders.push(Collider { id, layer, shape });
        id
    }

    /// Remove a collider; returns it if it existed
    pub fn remove(&mut self, id: ColliderId) -> Option<Collider> {
        let idx = self.index_of(id)?;
        Some(self.colliders.remove(idx))
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.index_of(id).map(|idx| &self.colliders[idx])
    }

    /// Replace a collider's geometry
    pub fn set_shape(&mut self, id: ColliderId, shape: Shape) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.colliders[idx].shape = shape;
                true
            }
            None => false,
        }
    }

    /// Move a collider by `delta`
    pub fn translate(&mut self, id: ColliderId, delta: Vec2) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                let collider = &mut self.colliders[idx];
                collider.shape = collider.shape.translated(delta);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Colliders in a category
    pub fn iter_layer(&self, mask: Layers) -> impl Iterator<Item = &Collider> {
        self.colliders
            .iter()
            .filter(move |c| c.layer.intersects(mask))
    }

    /// Drop every collider in `mask`
    pub fn clear_layer(&mut self, mask: Layers) {
        self.colliders.retain(|c| !c.layer.intersects(mask));
    }

    fn index_of(&self, id: ColliderId) -> Option<usize> {
        // Ids are handed out in increasing order and only ever removed
        self.colliders.binary_search_by_key(&id, |c| c.id).ok()
    }
}

impl SpatialQuery for CollisionWorld {
    fn overlap_box(&self, center: Vec2, size: Vec2, mask: Layers) -> Option<ColliderId> {
        let query = Aabb::from_center_size(center, size);
        self.iter_layer(mask)
            .find(|c| c.shape.overlaps_box(&query))
            .map(|c| c.id)
    }

    fn overlap_box_all(&self, center: Vec2, size: Vec2, mask: Layers) -> Vec<ColliderId> {
        let query = Aabb::from_center_size(center, size);
        self.iter_layer(mask)
            .filter(|c| c.shape.overlaps_box(&query))
            .map(|c| c.id)
            .collect()
    }

    fn overlap_circle_all(&self, center: Vec2, radius: f32, mask: Layers) -> Vec<ColliderId> {
        let query = Circle::new(center, radius);
        self.iter_layer(mask)
            .filter(|c| c.shape.overlaps_circle(&query))
            .map(|c| c.id)
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: Layers,
    ) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO || max_distance.is_nan() || max_distance <= 0.0 {
            return None;
        }

        self.iter_layer(mask)
            .filter_map(|c| {
                c.shape
                    .raycast(origin, dir, max_distance)
                    .map(|(distance, normal)| RayHit {
                        collider: c.id,
                        point: origin + dir * distance,
                        normal,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
