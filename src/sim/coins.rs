//! Coin burst spawner
//!
//! A burst is a short horizontal line of coins in one of three lanes. The
//! whole burst must fit an obstacle-free box before any coin is placed; each
//! coin then gets its own small-box check with local nudges and finally
//! settles itself (see `settle`).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::balance::LaneBalanceCounters;
use super::envelope::JumpEnvelope;
use super::settle::{Coin, candidate_positions};
use super::spawn::{SpawnContext, SpawnSchedule, probe_surface};
use super::world::{CollisionWorld, Layers, SpatialQuery};
use crate::soft_clamp;
use crate::tuning::{CoinTuning, SettleTuning};

/// Vertical placement band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Low,
    Mid,
    High,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Low, Lane::Mid, Lane::High];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Next lane in cyclic order
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

/// Lane center heights (world Y), indexed by [`Lane::index`]
pub fn lane_heights(surface_y: f32, envelope: &JumpEnvelope, tuning: &CoinTuning) -> [f32; 3] {
    let single = envelope.apex_height;
    let double = envelope.double_apex();
    [
        surface_y + tuning.low_offset,
        surface_y + soft_clamp(single * tuning.mid_frac, tuning.mid_min, single * tuning.mid_max_frac),
        surface_y + (single * tuning.high_frac).min(double * tuning.high_double_cap),
    ]
}

/// Coin geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoinPrefab {
    pub radius: f32,
}

impl Default for CoinPrefab {
    fn default() -> Self {
        Self { radius: 0.22 }
    }
}

/// Result of an accepted burst
#[derive(Debug, Clone, PartialEq)]
pub struct CoinBurst {
    pub lane: Lane,
    pub requested: u32,
    pub coins: Vec<Coin>,
}

/// Schedules and places coin bursts
#[derive(Debug, Clone, PartialEq)]
pub struct CoinSpawner {
    pub schedule: SpawnSchedule,
    pub lane_counters: LaneBalanceCounters<3>,
}

impl CoinSpawner {
    pub fn new(tuning: &CoinTuning) -> Self {
        Self {
            schedule: SpawnSchedule::new(tuning.spawn_min, tuning.spawn_max),
            lane_counters: LaneBalanceCounters::new(),
        }
    }

    pub fn start<R: Rng>(&mut self, now: f32, rng: &mut R) {
        self.schedule.roll(now, rng);
    }

    pub fn reset<R: Rng>(&mut self, now: f32, rng: &mut R) {
        self.lane_counters.reset();
        self.start(now, rng);
    }

    /// Fire if due. The schedule advances whether or not a burst was placed.
    pub fn update<R: Rng>(
        &mut self,
        world: &mut CollisionWorld,
        ctx: &SpawnContext,
        prefab: Option<&CoinPrefab>,
        coins: &CoinTuning,
        settle: &SettleTuning,
        rng: &mut R,
    ) -> Option<CoinBurst> {
        if !self.schedule.is_due(ctx.now) {
            return None;
        }
        let burst = self.spawn_burst(world, ctx, prefab, coins, settle, rng);
        self.schedule.roll(ctx.now, rng);
        burst
    }

    /// Place one burst, or nothing if a dependency is missing or every lane is blocked
    pub fn spawn_burst<R: Rng>(
        &mut self,
        world: &mut CollisionWorld,
        ctx: &SpawnContext,
        prefab: Option<&CoinPrefab>,
        coins: &CoinTuning,
        settle: &SettleTuning,
        rng: &mut R,
    ) -> Option<CoinBurst> {
        let (Some(prefab), Some(camera)) = (prefab, ctx.camera) else {
            log::debug!("Coin burst skipped: missing prefab or camera");
            return None;
        };

        let x0 = camera.position.x + coins.spawn_x_offset;
        let surface_y = probe_surface(&*world, &camera, x0, ctx.player.as_ref());
        let heights = lane_heights(surface_y, &ctx.envelope, coins);
        let count = burst_size(coins, rng);

        let preferred = Lane::from_index(self.lane_counters.pick_least_used(rng));
        let Some(lane) = [preferred, preferred.next(), preferred.next().next()]
            .into_iter()
            .find(|&lane| {
                lane_is_clear(&*world, x0, heights[lane.index()], count, prefab.radius, coins)
            })
        else {
            log::debug!("Coin burst of {count} skipped: all lanes blocked at x={x0:.2}");
            return None;
        };

        let base_y = heights[lane.index()];
        let mut placed = Vec::with_capacity(count as usize);
        for i in 0..count {
            let fi = i as f32;
            let anchor = Vec2::new(x0 + fi * coins.gap_x, base_y + (fi * 0.6).sin() * coins.wobble_y);
            if let Some(coin) = place_coin(world, anchor, prefab.radius, coins, settle) {
                placed.push(coin);
            } else {
                log::trace!("Coin {i} of burst skipped at ({:.2}, {:.2})", anchor.x, anchor.y);
            }
        }

        // Counted once the lane is accepted, however many coins made it
        self.lane_counters.record(lane.index());
        log::debug!(
            "Coin burst in {:?} lane: {}/{} placed",
            lane,
            placed.len(),
            count
        );

        Some(CoinBurst {
            lane,
            requested: count,
            coins: placed,
        })
    }
}

fn burst_size<R: Rng>(tuning: &CoinTuning, rng: &mut R) -> u32 {
    let lo = tuning.min_coins.min(tuning.max_coins).max(1);
    let hi = tuning.max_coins.max(lo);
    rng.random_range(lo..=hi)
}

/// Single wide box covering the whole burst, margins included
pub fn lane_is_clear<Q: SpatialQuery + ?Sized>(
    world: &Q,
    x0: f32,
    lane_y: f32,
    count: u32,
    radius: f32,
    tuning: &CoinTuning,
) -> bool {
    let burst_width = count.saturating_sub(1) as f32 * tuning.gap_x;
    let center = Vec2::new(x0 + burst_width * 0.5, lane_y);
    let size = Vec2::new(
        burst_width + 2.0 * (radius + tuning.extra_pad + tuning.lane_extra_width),
        2.0 * (radius + tuning.extra_pad + tuning.lane_extra_height) + tuning.wobble_y.abs() * 2.0,
    );
    world.overlap_box(center, size, Layers::OBSTACLE).is_none()
}

/// First candidate whose small box is obstacle-free, then let the coin settle
fn place_coin(
    world: &mut CollisionWorld,
    anchor: Vec2,
    radius: f32,
    coins: &CoinTuning,
    settle: &SettleTuning,
) -> Option<Coin> {
    let reach = radius + coins.extra_pad;
    let size = Vec2::splat(reach * 2.0);

    let spot = candidate_positions(
        anchor,
        coins.vertical_step,
        coins.horizontal_step,
        coins.nudge_pairs,
        coins.placement_attempts,
    )
    .into_iter()
    .find(|&p| world.overlap_box(p, size, Layers::OBSTACLE).is_none())?;

    Coin::spawn(world, spot, radius, settle)
}
