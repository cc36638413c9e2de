//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entities in spawn order, colliders by id)
//! - No rendering or platform dependencies

pub mod balance;
pub mod coins;
pub mod collision;
pub mod envelope;
pub mod motion;
pub mod obstacles;
pub mod player;
pub mod settle;
pub mod spawn;
pub mod speed;
pub mod state;
pub mod tick;
pub mod world;

pub use balance::LaneBalanceCounters;
pub use coins::{CoinBurst, CoinPrefab, CoinSpawner, Lane, lane_heights};
pub use collision::{Aabb, Circle, Shape};
pub use envelope::{JumpEnvelope, apex_height};
pub use motion::{MotionInput, MotionOutcome, MotionState};
pub use obstacles::{
    HeightMode, Obstacle, ObstacleKind, ObstaclePrefabs, ObstacleSpawner, Prefab, Transform,
};
pub use player::Player;
pub use settle::{Coin, candidate_positions};
pub use spawn::{Camera, PlayerSnapshot, SpawnContext, SpawnSchedule, probe_surface};
pub use speed::{FixedSpeed, SpeedProvider, SpeedRamp};
pub use state::{GameEvent, Run, RunSink};
pub use tick::{TickInput, TickReport, tick};
pub use world::{Collider, ColliderId, CollisionWorld, Layers, RayHit, SpatialQuery};
