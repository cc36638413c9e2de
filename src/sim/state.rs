//! Run context
//!
//! Everything one run owns: tuning, the seeded RNG, the collision world, the
//! player, live entities and both spawners. Created at run start and passed
//! explicitly to [`tick`](super::tick::tick); there is no global instance.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::coins::{CoinPrefab, CoinSpawner};
use super::collision::{Aabb, Shape};
use super::envelope::JumpEnvelope;
use super::obstacles::{Obstacle, ObstaclePrefabs, ObstacleSpawner};
use super::player::Player;
use super::settle::Coin;
use super::spawn::{Camera, SpawnContext};
use super::speed::{SpeedProvider, SpeedRamp};
use super::world::{ColliderId, CollisionWorld, Layers};
use crate::consts::*;
use crate::error::TuningError;
use crate::tuning::Tuning;

/// Something the run reports downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    CoinCollected { value: u32 },
    PlayerHit,
}

/// Receiver for run notifications (lives, score and UI live elsewhere)
pub trait RunSink {
    fn on_coin_collected(&mut self, value: u32);
    fn on_player_hit(&mut self);
}

impl RunSink for Vec<GameEvent> {
    fn on_coin_collected(&mut self, value: u32) {
        self.push(GameEvent::CoinCollected { value });
    }

    fn on_player_hit(&mut self) {
        self.push(GameEvent::PlayerHit);
    }
}

/// One run of the game
#[derive(Debug)]
pub struct Run {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub rng: Pcg32,
    /// Seconds since run start. f64 so long runs keep tick resolution.
    pub time: f64,
    pub time_ticks: u64,
    pub world: CollisionWorld,
    pub ground: ColliderId,
    pub player: Player,
    /// Live obstacles, in spawn order
    pub obstacles: Vec<Obstacle>,
    /// Live coins, in spawn order
    pub coins: Vec<Coin>,
    pub obstacle_spawner: ObstacleSpawner,
    pub coin_spawner: CoinSpawner,
    pub camera: Option<Camera>,
    pub obstacle_prefabs: ObstaclePrefabs,
    pub coin_prefab: Option<CoinPrefab>,
    pub speed: Box<dyn SpeedProvider>,
    /// Hits are ignored while > 0
    pub invulnerable_timer: f32,
}

impl Run {
    /// Fresh run with the standard ground strip, camera and prefabs
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut world = CollisionWorld::new();
        let ground = world.insert(Layers::GROUND, ground_shape());
        let speed = Box::new(SpeedRamp::from_tuning(&tuning.speed));

        let mut run = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            time_ticks: 0,
            world,
            ground,
            player: standing_player(),
            obstacles: Vec::new(),
            coins: Vec::new(),
            obstacle_spawner: ObstacleSpawner::new(&tuning.obstacles),
            coin_spawner: CoinSpawner::new(&tuning.coins),
            camera: Some(Camera::new(Vec2::new(0.0, CAMERA_Y), CAMERA_HALF_HEIGHT)),
            obstacle_prefabs: ObstaclePrefabs::standard(),
            coin_prefab: Some(CoinPrefab::default()),
            speed,
            invulnerable_timer: 0.0,
            tuning,
        };
        run.obstacle_spawner.start(0.0, &mut run.rng);
        run.coin_spawner.start(0.0, &mut run.rng);

        log::info!("Run started with seed {}", seed);
        run
    }

    /// Swap in a different scroll speed source
    pub fn with_speed(mut self, speed: Box<dyn SpeedProvider>) -> Self {
        self.speed = speed;
        self
    }

    /// Apply new tuning mid-run.
    ///
    /// Balance counters, pending spawn times, live entities and the motion
    /// state are left alone; only the interval ranges pick up the change.
    pub fn retune(&mut self, tuning: Tuning) -> Result<(), TuningError> {
        tuning.validate()?;
        self.obstacle_spawner
            .schedule
            .set_intervals(tuning.obstacles.spawn_min, tuning.obstacles.spawn_max);
        self.coin_spawner
            .schedule
            .set_intervals(tuning.coins.spawn_min, tuning.coins.spawn_max);
        self.speed.retune(&tuning.speed);
        self.tuning = tuning;
        log::info!("Run retuned at t={:.2}s", self.time);
        Ok(())
    }

    /// Start the post-revive invulnerability window
    pub fn revive(&mut self) {
        self.invulnerable_timer = self.tuning.run.revive_invulnerable_seconds;
        log::info!("Revived, invulnerable for {:.2}s", self.invulnerable_timer);
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    /// Back to a fresh run with the same seed. The only place counters reset.
    pub fn restart(&mut self) {
        self.world.clear_layer(Layers::OBSTACLE | Layers::COIN);
        self.obstacles.clear();
        self.coins.clear();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.time = 0.0;
        self.time_ticks = 0;
        self.invulnerable_timer = 0.0;
        self.player = standing_player();
        self.speed.reset();
        self.obstacle_spawner.reset(0.0, &mut self.rng);
        self.coin_spawner.reset(0.0, &mut self.rng);
        log::info!("Run restarted with seed {}", self.seed);
    }

    /// Jump reach under the current tuning
    pub fn envelope(&self) -> JumpEnvelope {
        JumpEnvelope::from_tuning(&self.tuning)
    }

    /// What the spawners see this tick
    pub fn spawn_context(&self) -> SpawnContext {
        SpawnContext {
            now: self.time as f32,
            camera: self.camera,
            player: Some(self.player.snapshot()),
            envelope: self.envelope(),
        }
    }
}

fn ground_shape() -> Shape {
    Shape::Box(Aabb::new(
        Vec2::new(-GROUND_HALF_LENGTH, GROUND_Y - GROUND_DEPTH),
        Vec2::new(GROUND_HALF_LENGTH, GROUND_Y),
    ))
}

fn standing_player() -> Player {
    Player::standing(
        PLAYER_X,
        GROUND_Y,
        Vec2::new(PLAYER_WIDTH, DEFAULT_PLAYER_HEIGHT),
    )
}
