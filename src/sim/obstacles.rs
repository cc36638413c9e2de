//! Obstacle spawner
//!
//! Alternates ground blocks and overhead bars, keeping both the type mix and
//! the three overhead heights balanced. Overhead heights are derived from the
//! jump envelope so every bar is passable by running under it, a single jump
//! or a double jump.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::balance::LaneBalanceCounters;
use super::collision::{Aabb, Shape};
use super::envelope::JumpEnvelope;
use super::spawn::{SpawnContext, SpawnSchedule, probe_surface};
use super::world::{ColliderId, CollisionWorld, Layers};
use crate::consts::{DEFAULT_PLAYER_HEIGHT, MIN_MEASURABLE_THICKNESS};
use crate::soft_clamp;
use crate::tuning::ObstacleTuning;

/// Instance placement: position of the pivot and world scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub scale: Vec2,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            scale: Vec2::ONE,
        }
    }
}

/// Authored collider geometry at unit scale, relative to the pivot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prefab {
    pub collider_size: Vec2,
    pub collider_offset: Vec2,
}

impl Prefab {
    pub fn new(collider_size: Vec2, collider_offset: Vec2) -> Self {
        Self {
            collider_size,
            collider_offset,
        }
    }

    /// Measured world bounds of an instance
    pub fn bounds(&self, transform: &Transform) -> Aabb {
        Aabb::from_center_size(
            transform.position + self.collider_offset * transform.scale,
            self.collider_size * transform.scale.abs(),
        )
    }
}

/// The two obstacle prefabs. A missing one turns spawning into a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePrefabs {
    pub ground: Option<Prefab>,
    pub overhead: Option<Prefab>,
}

impl ObstaclePrefabs {
    /// Unit ground block and a wide bar with arbitrary authored thickness
    pub fn standard() -> Self {
        Self {
            ground: Some(Prefab::new(Vec2::new(1.0, 1.0), Vec2::ZERO)),
            overhead: Some(Prefab::new(Vec2::new(3.0, 0.5), Vec2::ZERO)),
        }
    }
}

/// How an overhead bar is meant to be passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeightMode {
    RunUnder,
    SingleJump,
    DoubleJump,
}

impl HeightMode {
    pub const ALL: [HeightMode; 3] = [
        HeightMode::RunUnder,
        HeightMode::SingleJump,
        HeightMode::DoubleJump,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Ground,
    Overhead(HeightMode),
}

impl ObstacleKind {
    /// Type-balance bin (0 = ground, 1 = overhead)
    pub fn type_bin(self) -> usize {
        match self {
            ObstacleKind::Ground => GROUND_BIN,
            ObstacleKind::Overhead(_) => OVERHEAD_BIN,
        }
    }
}

const GROUND_BIN: usize = 0;
const OVERHEAD_BIN: usize = 1;

/// A live obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ColliderId,
    pub kind: ObstacleKind,
    pub transform: Transform,
    pub prefab: Prefab,
    /// Set on the first registered hit
    pub consumed: bool,
    /// Player overlapped this obstacle last tick
    pub in_contact: bool,
}

impl Obstacle {
    pub fn bounds(&self) -> Aabb {
        self.prefab.bounds(&self.transform)
    }

    /// Move left by `distance`, keeping the collider in sync
    pub fn scroll(&mut self, world: &mut CollisionWorld, distance: f32) {
        let delta = Vec2::new(-distance, 0.0);
        self.transform.position += delta;
        world.translate(self.id, delta);
    }

    pub fn is_past(&self, kill_x: f32) -> bool {
        self.transform.position.x < kill_x
    }

    /// Feed this tick's overlap with the player. Only a contact entry can hit;
    /// staying inside, or entering while invulnerable, never does.
    pub fn touch(&mut self, touching: bool, one_hit: bool, invulnerable: bool) -> bool {
        let entered = touching && !self.in_contact;
        self.in_contact = touching;
        entered && self.register_hit(one_hit, invulnerable)
    }

    /// Latch a player contact. Returns true if it counts as a hit.
    pub fn register_hit(&mut self, one_hit: bool, invulnerable: bool) -> bool {
        if (self.consumed && one_hit) || invulnerable {
            return false;
        }
        self.consumed = true;
        true
    }
}

/// Resolved bottom edge of an overhead bar of thickness `h`
pub fn overhead_bottom(
    mode: HeightMode,
    surface_y: f32,
    player_height: f32,
    h: f32,
    envelope: &JumpEnvelope,
    tuning: &ObstacleTuning,
) -> f32 {
    let single = envelope.apex_height;
    let double = envelope.double_apex();

    match mode {
        HeightMode::RunUnder => surface_y + player_height + tuning.run_under_clearance,
        HeightMode::SingleJump => {
            let top = surface_y
                + soft_clamp(
                    single * tuning.single_top_frac,
                    tuning.single_top_min,
                    single * tuning.single_top_max_frac,
                );
            (top - h).max(surface_y + tuning.ground_gap)
        }
        HeightMode::DoubleJump => {
            let target = surface_y
                + (single * tuning.double_top_min_frac).max(single * tuning.double_top_frac);
            let cap = surface_y + double * tuning.double_apex_cap;
            (target.min(cap) - h).max(surface_y + tuning.ground_gap)
        }
    }
}

/// Schedules and places obstacles
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleSpawner {
    pub schedule: SpawnSchedule,
    /// Ground vs overhead tally
    pub type_counters: LaneBalanceCounters<2>,
    /// Run-under / single / double tally
    pub height_counters: LaneBalanceCounters<3>,
}

impl ObstacleSpawner {
    pub fn new(tuning: &ObstacleTuning) -> Self {
        Self {
            schedule: SpawnSchedule::new(tuning.spawn_min, tuning.spawn_max),
            type_counters: LaneBalanceCounters::new(),
            height_counters: LaneBalanceCounters::new(),
        }
    }

    /// Arm the first spawn
    pub fn start<R: Rng>(&mut self, now: f32, rng: &mut R) {
        self.schedule.roll(now, rng);
    }

    pub fn reset<R: Rng>(&mut self, now: f32, rng: &mut R) {
        self.type_counters.reset();
        self.height_counters.reset();
        self.start(now, rng);
    }

    /// Fire if due. The schedule advances whether or not anything spawned.
    pub fn update<R: Rng>(
        &mut self,
        world: &mut CollisionWorld,
        ctx: &SpawnContext,
        prefabs: &ObstaclePrefabs,
        tuning: &ObstacleTuning,
        rng: &mut R,
    ) -> Option<Obstacle> {
        if !self.schedule.is_due(ctx.now) {
            return None;
        }
        let spawned = self.spawn_one(world, ctx, prefabs, tuning, rng);
        self.schedule.roll(ctx.now, rng);
        spawned
    }

    /// Place exactly one obstacle, or none if a dependency is missing
    pub fn spawn_one<R: Rng>(
        &mut self,
        world: &mut CollisionWorld,
        ctx: &SpawnContext,
        prefabs: &ObstaclePrefabs,
        tuning: &ObstacleTuning,
        rng: &mut R,
    ) -> Option<Obstacle> {
        let (Some(ground), Some(overhead), Some(camera)) =
            (prefabs.ground, prefabs.overhead, ctx.camera)
        else {
            log::debug!("Obstacle spawn skipped: missing prefab or camera");
            return None;
        };

        let x = camera.position.x + tuning.spawn_x_offset;
        let surface_y = probe_surface(&*world, &camera, x, ctx.player.as_ref());

        let obstacle = if self.decide_overhead(tuning, rng) {
            let player_height = ctx.player.map(|p| p.height).unwrap_or(DEFAULT_PLAYER_HEIGHT);
            let mode = HeightMode::from_index(self.height_counters.pick_least_used(rng));
            self.height_counters.record(mode.index());
            place_overhead(
                world,
                &overhead,
                x,
                surface_y,
                player_height,
                mode,
                &ctx.envelope,
                tuning,
            )
        } else {
            place_ground(world, &ground, x, surface_y, tuning)
        };
        self.type_counters.record(obstacle.kind.type_bin());

        log::debug!(
            "Spawned {:?} obstacle {:?} at ({:.2}, {:.2})",
            obstacle.kind,
            obstacle.id,
            obstacle.transform.position.x,
            obstacle.transform.position.y
        );
        Some(obstacle)
    }

    fn decide_overhead<R: Rng>(&self, tuning: &ObstacleTuning, rng: &mut R) -> bool {
        if !tuning.keep_type_balanced {
            return rng.random_bool(0.5);
        }
        self.type_counters.pick_least_used(rng) == OVERHEAD_BIN
    }
}

fn place_ground(
    world: &mut CollisionWorld,
    prefab: &Prefab,
    x: f32,
    surface_y: f32,
    tuning: &ObstacleTuning,
) -> Obstacle {
    let mut transform = Transform {
        position: Vec2::new(x, surface_y),
        scale: tuning.ground_scale,
    };
    // Scaling moves the collider's lower edge, so snap on measured bounds
    let bounds = prefab.bounds(&transform);
    transform.position.y += surface_y + tuning.ground_pad - bounds.min.y;

    insert(world, ObstacleKind::Ground, transform, *prefab)
}

#[allow(clippy::too_many_arguments)]
fn place_overhead(
    world: &mut CollisionWorld,
    prefab: &Prefab,
    x: f32,
    surface_y: f32,
    player_height: f32,
    mode: HeightMode,
    envelope: &JumpEnvelope,
    tuning: &ObstacleTuning,
) -> Obstacle {
    let mut transform = Transform::at(Vec2::new(x, surface_y));

    // Authored thickness is arbitrary: force the world thickness from what we measure
    let current = prefab.bounds(&transform).height();
    if current > MIN_MEASURABLE_THICKNESS {
        transform.scale.y *= tuning.bar_thickness / current;
    }
    let h = prefab.bounds(&transform).height();

    let bottom = overhead_bottom(mode, surface_y, player_height, h, envelope, tuning);
    let center_y = bottom + h * 0.5 + tuning.overhead_pad;
    transform.position.y = center_y - prefab.collider_offset.y * transform.scale.y;

    insert(world, ObstacleKind::Overhead(mode), transform, *prefab)
}

fn insert(world: &mut CollisionWorld, kind: ObstacleKind, transform: Transform, prefab: Prefab) -> Obstacle {
    let id = world.insert(Layers::OBSTACLE, Shape::Box(prefab.bounds(&transform)));
    Obstacle {
        id,
        kind,
        transform,
        prefab,
        consumed: false,
        in_contact: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn::{Camera, PlayerSnapshot};
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const SURFACE: f32 = -1.0;

    fn world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.insert(
            Layers::GROUND,
            Shape::Box(Aabb::new(Vec2::new(-500.0, -3.0), Vec2::new(500.0, SURFACE))),
        );
        world
    }

    fn ctx(tuning: &Tuning) -> SpawnContext {
        SpawnContext {
            now: 0.0,
            camera: Some(Camera::new(Vec2::ZERO, 5.0)),
            player: Some(PlayerSnapshot {
                position: Vec2::new(-6.0, SURFACE + 0.9),
                height: 1.8,
            }),
            envelope: JumpEnvelope::from_tuning(tuning),
        }
    }

    fn spawn_many(n: usize, seed: u64) -> (ObstacleSpawner, Vec<Obstacle>) {
        let tuning = Tuning::default();
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut spawner = ObstacleSpawner::new(&tuning.obstacles);
        let prefabs = ObstaclePrefabs::standard();
        let ctx = ctx(&tuning);
        let obstacles: Vec<Obstacle> = (0..n)
            .filter_map(|_| spawner.spawn_one(&mut world, &ctx, &prefabs, &tuning.obstacles, &mut rng))
            .collect();
        (spawner, obstacles)
    }

    #[test]
    fn test_ground_obstacle_snaps_to_surface() {
        let tuning = ObstacleTuning::default();
        let mut world = world();
        // Pivot at the bottom edge: scaling would otherwise float or sink it
        let prefab = Prefab::new(Vec2::new(1.0, 2.0), Vec2::new(0.0, 1.0));
        let obstacle = place_ground(&mut world, &prefab, 18.0, SURFACE, &tuning);

        let bounds = obstacle.bounds();
        assert!((bounds.min.y - (SURFACE + tuning.ground_pad)).abs() < 1e-5);
        assert!((bounds.height() - 2.0 * tuning.ground_scale.y).abs() < 1e-5);
        assert_eq!(world.get(obstacle.id).unwrap().shape.bounds(), bounds);
    }

    #[test]
    fn test_overhead_thickness_is_forced() {
        let tuning = ObstacleTuning::default();
        let envelope = JumpEnvelope::from_tuning(&Tuning::default());
        for authored in [0.05, 0.5, 3.0] {
            let mut world = world();
            let prefab = Prefab::new(Vec2::new(3.0, authored), Vec2::new(0.0, 0.3));
            let bar = place_overhead(
                &mut world,
                &prefab,
                18.0,
                SURFACE,
                1.8,
                HeightMode::SingleJump,
                &envelope,
                &tuning,
            );
            assert!((bar.bounds().height() - tuning.bar_thickness).abs() < 1e-4);
        }
    }

    #[test]
    fn test_height_modes_respect_envelope() {
        let tuning = ObstacleTuning::default();
        let envelope = JumpEnvelope::from_tuning(&Tuning::default());
        let h = tuning.bar_thickness;
        let single = envelope.apex_height;

        let run_under = overhead_bottom(HeightMode::RunUnder, SURFACE, 1.8, h, &envelope, &tuning);
        assert!((run_under - (SURFACE + 1.8 + 0.2)).abs() < 1e-5);

        let single_bottom =
            overhead_bottom(HeightMode::SingleJump, SURFACE, 1.8, h, &envelope, &tuning);
        let single_top = single_bottom + h;
        assert!(single_top - SURFACE <= single * 0.98 + 1e-4);
        assert!(single_top - SURFACE >= 0.5 - 1e-4);
        assert!(single_bottom >= SURFACE + tuning.ground_gap);

        let double_bottom =
            overhead_bottom(HeightMode::DoubleJump, SURFACE, 1.8, h, &envelope, &tuning);
        let double_top = double_bottom + h;
        assert!(double_top - SURFACE > single);
        assert!(double_top - SURFACE <= envelope.double_apex() * 0.9 + 1e-4);
    }

    #[test]
    fn test_single_jump_bar_never_sinks_into_ground() {
        let tuning = ObstacleTuning::default();
        // Tiny apex: clamp pushes top below thickness
        let envelope = JumpEnvelope::new(0.5, 9.81, Some(3.0), 1.9);
        let bottom =
            overhead_bottom(HeightMode::SingleJump, SURFACE, 1.8, 2.0, &envelope, &tuning);
        assert_eq!(bottom, SURFACE + tuning.ground_gap);
    }

    #[test]
    fn test_type_and_height_balance() {
        let (spawner, obstacles) = spawn_many(60, 3);
        assert_eq!(obstacles.len(), 60);
        assert!(spawner.type_counters.spread() <= 1);
        assert!(spawner.height_counters.spread() <= 1);

        let overhead = obstacles
            .iter()
            .filter(|o| matches!(o.kind, ObstacleKind::Overhead(_)))
            .count();
        assert_eq!(overhead as u32, spawner.type_counters.count(OVERHEAD_BIN));
    }

    #[test]
    fn test_obstacles_spawn_at_offset_column() {
        let (_, obstacles) = spawn_many(4, 9);
        for obstacle in obstacles {
            assert!((obstacle.transform.position.x - 18.0).abs() < 1e-5);
            assert!(obstacle.bounds().min.y >= SURFACE);
        }
    }

    #[test]
    fn test_missing_prefab_is_noop_but_schedule_advances() {
        let tuning = Tuning::default();
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut spawner = ObstacleSpawner::new(&tuning.obstacles);
        let prefabs = ObstaclePrefabs {
            ground: None,
            ..ObstaclePrefabs::standard()
        };
        let ctx = ctx(&tuning);

        assert!(spawner.schedule.is_due(0.0));
        let spawned = spawner.update(&mut world, &ctx, &prefabs, &tuning.obstacles, &mut rng);
        assert!(spawned.is_none());
        assert!(!spawner.schedule.is_due(0.0));
        assert_eq!(spawner.type_counters.counts(), [0, 0]);
        assert_eq!(world.iter_layer(Layers::OBSTACLE).count(), 0);
    }

    #[test]
    fn test_missing_camera_is_noop() {
        let tuning = Tuning::default();
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut spawner = ObstacleSpawner::new(&tuning.obstacles);
        let ctx = SpawnContext {
            camera: None,
            ..ctx(&tuning)
        };
        assert!(
            spawner
                .spawn_one(&mut world, &ctx, &ObstaclePrefabs::standard(), &tuning.obstacles, &mut rng)
                .is_none()
        );
    }

    #[test]
    fn test_unbalanced_mode_still_tallies() {
        let mut tuning = Tuning::default();
        tuning.obstacles.keep_type_balanced = false;
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut spawner = ObstacleSpawner::new(&tuning.obstacles);
        let ctx = ctx(&tuning);
        for _ in 0..40 {
            spawner.spawn_one(&mut world, &ctx, &ObstaclePrefabs::standard(), &tuning.obstacles, &mut rng);
        }
        let [ground, overhead] = spawner.type_counters.counts();
        assert_eq!(ground + overhead, 40);
    }

    #[test]
    fn test_hit_registers_once() {
        let mut world = world();
        let mut obstacle = place_ground(
            &mut world,
            &Prefab::new(Vec2::ONE, Vec2::ZERO),
            0.0,
            SURFACE,
            &ObstacleTuning::default(),
        );
        assert!(!obstacle.register_hit(true, true));
        assert!(obstacle.register_hit(true, false));
        assert!(!obstacle.register_hit(true, false));
        // Without one-hit every contact counts
        assert!(obstacle.register_hit(false, false));
    }

    #[test]
    fn test_contact_hits_on_entry_only() {
        let mut world = world();
        let mut obstacle = place_ground(
            &mut world,
            &Prefab::new(Vec2::ONE, Vec2::ZERO),
            0.0,
            SURFACE,
            &ObstacleTuning::default(),
        );
        assert!(obstacle.touch(true, false, false));
        assert!(!obstacle.touch(true, false, false));
        assert!(!obstacle.touch(false, false, false));
        assert!(obstacle.touch(true, false, false));
        assert!(obstacle.in_contact);
    }

    #[test]
    fn test_contact_entered_while_invulnerable_never_hits() {
        let mut world = world();
        let mut obstacle = place_ground(
            &mut world,
            &Prefab::new(Vec2::ONE, Vec2::ZERO),
            0.0,
            SURFACE,
            &ObstacleTuning::default(),
        );
        assert!(!obstacle.touch(true, true, true));
        // Window over, still inside: no new entry
        assert!(!obstacle.touch(true, true, false));
        assert!(!obstacle.consumed);
    }

    #[test]
    fn test_tied_types_split_evenly() {
        let tuning = ObstacleTuning::default();
        let mut spawner = ObstacleSpawner::new(&tuning);
        spawner.type_counters = LaneBalanceCounters::from_counts([5, 5]);
        let mut rng = Pcg32::seed_from_u64(0x5EED);
        let trials = 10_000;
        let overhead = (0..trials)
            .filter(|_| spawner.decide_overhead(&tuning, &mut rng))
            .count();
        let ratio = overhead as f64 / trials as f64;
        assert!((0.47..=0.53).contains(&ratio), "ratio {ratio}");
        assert_eq!(spawner.type_counters.counts(), [5, 5]);
    }

    #[test]
    fn test_type_bins() {
        assert_eq!(ObstacleKind::Ground.type_bin(), GROUND_BIN);
        for mode in HeightMode::ALL {
            assert_eq!(ObstacleKind::Overhead(mode).type_bin(), OVERHEAD_BIN);
        }
    }

    #[test]
    fn test_scroll_and_kill() {
        let mut world = world();
        let mut obstacle = place_ground(
            &mut world,
            &Prefab::new(Vec2::ONE, Vec2::ZERO),
            0.0,
            SURFACE,
            &ObstacleTuning::default(),
        );
        obstacle.scroll(&mut world, 41.0);
        assert!(obstacle.is_past(-40.0));
        let collider = world.get(obstacle.id).unwrap().shape.bounds();
        assert!(collider.center().distance(obstacle.bounds().center()) < 1e-4);
    }
}
