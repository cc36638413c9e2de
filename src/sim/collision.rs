//! Overlap and ray tests for axis-aligned boxes and circles
//!
//! Everything the spawners need reduces to box/box, box/circle and
//! circle/circle overlap plus a downward ray against boxes. Touching edges do
//! not count as overlap, so an obstacle snapped exactly onto the ground is
//! not "inside" it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box from center and full size
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Shift the box by `delta`
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Strict overlap (shared edges don't count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Closest point inside the box to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    pub fn overlaps_circle(&self, circle: &Circle) -> bool {
        let closest = self.closest_point(circle.center);
        closest.distance_squared(circle.center) < circle.radius * circle.radius
    }
}

/// Circle (coins)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }

    pub fn overlaps(&self, other: &Circle) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }

    /// Tight bounding box
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.center, Vec2::splat(self.radius * 2.0))
    }
}

/// Collider geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box(Aabb),
    Circle(Circle),
}

impl Shape {
    pub fn bounds(&self) -> Aabb {
        match self {
            Shape::Box(aabb) => *aabb,
            Shape::Circle(circle) => circle.bounds(),
        }
    }

    pub fn center(&self) -> Vec2 {
        match self {
            Shape::Box(aabb) => aabb.center(),
            Shape::Circle(circle) => circle.center,
        }
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        match self {
            Shape::Box(aabb) => Shape::Box(aabb.translated(delta)),
            Shape::Circle(circle) => Shape::Circle(Circle::new(circle.center + delta, circle.radius)),
        }
    }

    pub fn overlaps_box(&self, aabb: &Aabb) -> bool {
        match self {
            Shape::Box(own) => own.overlaps(aabb),
            Shape::Circle(circle) => aabb.overlaps_circle(circle),
        }
    }

    pub fn overlaps_circle(&self, circle: &Circle) -> bool {
        match self {
            Shape::Box(aabb) => aabb.overlaps_circle(circle),
            Shape::Circle(own) => own.overlaps(circle),
        }
    }

    /// Ray intersection distance along a normalized `dir`
    pub fn raycast(&self, origin: Vec2, dir: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
        match self {
            Shape::Box(aabb) => ray_aabb(origin, dir, max_distance, aabb),
            Shape::Circle(circle) => ray_circle(origin, dir, max_distance, circle),
        }
    }
}

/// Slab test. Returns the entry distance and surface normal.
///
/// A ray starting inside the box reports distance 0 with a zero normal.
pub fn ray_aabb(origin: Vec2, dir: Vec2, max_distance: f32, aabb: &Aabb) -> Option<(f32, Vec2)> {
    let mut t_min = 0.0_f32;
    let mut t_max = max_distance;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        let o = origin[axis];
        let d = dir[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        if d.abs() < 1e-8 {
            // Parallel to this slab: must already be inside it
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (lo - o) * inv;
        let mut t2 = (hi - o) * inv;
        let mut axis_normal = Vec2::ZERO;
        axis_normal[axis] = -d.signum();
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_min {
            t_min = t1;
            normal = axis_normal;
        }
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }

    Some((t_min, normal))
}

/// Ray vs circle. Returns the entry distance and outward normal.
pub fn ray_circle(
    origin: Vec2,
    dir: Vec2,
    max_distance: f32,
    circle: &Circle,
) -> Option<(f32, Vec2)> {
    let to_origin = origin - circle.center;
    let c = to_origin.length_squared() - circle.radius * circle.radius;
    if c <= 0.0 {
        return Some((0.0, Vec2::ZERO));
    }
    let b = to_origin.dot(dir);
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t > max_distance {
        return None;
    }
    let point = origin + dir * t;
    Some((t, (point - circle.center).normalize_or_zero()))
}
