//! Jump feel and spawn balance tuning
//!
//! Every constant the controller and spawners read lives here. Tuning is read
//! fresh each tick, so swapping it mid-run (see `Run::retune`) never touches
//! spawn schedules or balance counters.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_JUMP_IMPULSE, DEFAULT_SCROLL_SPEED, GRAVITY};
use crate::error::TuningError;

/// World gravity and jump-envelope shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Gravity magnitude (units/s²)
    pub gravity: f32,
    /// Player body gravity scale (`None` = unknown, treated as 1)
    pub gravity_scale: Option<f32>,
    /// Double-jump apex as a multiple of the single-jump apex.
    /// Empirical and deliberately conservative; lane math is tuned against it.
    pub double_jump_factor: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            gravity_scale: Some(3.0),
            double_jump_factor: 1.9,
        }
    }
}

impl PhysicsTuning {
    /// Gravity scale with the unknown case resolved
    pub fn effective_gravity_scale(&self) -> f32 {
        self.gravity_scale.unwrap_or(1.0)
    }
}

/// Player jump feel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Grace after leaving the ground (seconds)
    pub coyote_time: f32,
    /// Grace before landing (seconds)
    pub jump_buffer: f32,
    /// Jumps available per airtime (2 = double jump)
    pub max_jumps: u32,
    /// Upward velocity set by a jump (unit mass)
    pub jump_impulse: f32,
    /// Heavier on the way down
    pub fall_gravity_multiplier: f32,
    /// Short hop when jump is released while rising
    pub jump_cut_multiplier: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            coyote_time: 0.12,
            jump_buffer: 0.12,
            max_jumps: 2,
            jump_impulse: DEFAULT_JUMP_IMPULSE,
            fall_gravity_multiplier: 2.0,
            jump_cut_multiplier: 2.5,
        }
    }
}

/// Obstacle spawner tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    /// Seconds between spawns (lower bound)
    pub spawn_min: f32,
    /// Seconds between spawns (upper bound)
    pub spawn_max: f32,
    /// How far right of the camera to spawn
    pub spawn_x_offset: f32,
    /// Fixed world scale applied to ground obstacles
    pub ground_scale: Vec2,
    /// Lift so a ground obstacle sits cleanly on the surface
    pub ground_pad: f32,
    /// World thickness forced onto overhead bars
    pub bar_thickness: f32,
    /// Gap above the standing player's head for run-under bars
    pub run_under_clearance: f32,
    /// Top of a single-jump bar as a fraction of the single apex
    pub single_top_frac: f32,
    /// Lowest top edge of a single-jump bar (world units above the surface)
    pub single_top_min: f32,
    /// Highest top edge of a single-jump bar as a fraction of the single apex
    pub single_top_max_frac: f32,
    /// Top of a double-jump bar as a fraction of the single apex
    pub double_top_frac: f32,
    /// Double-jump bar top is at least this fraction of the single apex
    pub double_top_min_frac: f32,
    /// Double-jump bar top is capped at this fraction of the double apex
    pub double_apex_cap: f32,
    /// Minimum gap between an overhead bar and the surface
    pub ground_gap: f32,
    /// Extra space added under overhead bars
    pub overhead_pad: f32,
    /// Keep ground vs overhead counts even (otherwise 50/50)
    pub keep_type_balanced: bool,
    /// Only the first contact registers a hit
    pub one_hit: bool,
    /// Obstacles are removed once left of this X
    pub kill_x: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            spawn_min: 1.0,
            spawn_max: 1.6,
            spawn_x_offset: 18.0,
            ground_scale: Vec2::new(1.0, 0.6),
            ground_pad: 0.02,
            bar_thickness: 0.2,
            run_under_clearance: 0.2,
            single_top_frac: 0.9,
            single_top_min: 0.5,
            single_top_max_frac: 0.98,
            double_top_frac: 1.3,
            double_top_min_frac: 1.01,
            double_apex_cap: 0.9,
            ground_gap: 0.05,
            overhead_pad: 0.02,
            keep_type_balanced: true,
            one_hit: true,
            kill_x: -40.0,
        }
    }
}

/// Coin spawner tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinTuning {
    pub spawn_min: f32,
    pub spawn_max: f32,
    pub spawn_x_offset: f32,
    /// Burst size range (inclusive)
    pub min_coins: u32,
    pub max_coins: u32,
    /// Horizontal spacing inside a burst
    pub gap_x: f32,
    /// Sinusoidal vertical wobble amplitude (0 keeps clearance tight)
    pub wobble_y: f32,
    /// Free space kept around each coin
    pub extra_pad: f32,
    /// Extra X margin on the whole-burst lane box
    pub lane_extra_width: f32,
    /// Extra Y margin on the whole-burst lane box
    pub lane_extra_height: f32,
    /// Candidate positions tried per coin
    pub placement_attempts: usize,
    /// Nudge rings per direction (vertical, then forward)
    pub nudge_pairs: u32,
    pub vertical_step: f32,
    pub horizontal_step: f32,
    /// Low lane height above the surface
    pub low_offset: f32,
    /// Mid lane: fraction of single apex, clamped to `[mid_min, mid_max_frac * apex]`
    pub mid_frac: f32,
    pub mid_min: f32,
    pub mid_max_frac: f32,
    /// High lane: fraction of single apex, capped at `high_double_cap * double apex`
    pub high_frac: f32,
    pub high_double_cap: f32,
}

impl Default for CoinTuning {
    fn default() -> Self {
        Self {
            spawn_min: 1.0,
            spawn_max: 1.6,
            spawn_x_offset: 18.0,
            min_coins: 1,
            max_coins: 3,
            gap_x: 1.1,
            wobble_y: 0.0,
            extra_pad: 0.2,
            lane_extra_width: 0.5,
            lane_extra_height: 0.25,
            placement_attempts: 8,
            nudge_pairs: 2,
            vertical_step: 0.3,
            horizontal_step: 0.5,
            low_offset: 0.65,
            mid_frac: 0.8,
            mid_min: 0.9,
            mid_max_frac: 0.95,
            high_frac: 1.2,
            high_double_cap: 0.9,
        }
    }
}

/// Coin self-settle tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleTuning {
    /// Half width of the obstacle-avoidance rectangle (wider than the coin)
    pub avoid_half_width: f32,
    /// Extra half height on top of the coin radius
    pub avoid_half_height: f32,
    /// Candidate positions tried when settling
    pub settle_attempts: usize,
    pub nudge_pairs: u32,
    pub vertical_step: f32,
    pub horizontal_step: f32,
    /// Spacing kept between coins
    pub min_coin_separation: f32,
    /// Ticks after spawn during which the coin re-checks its clearance
    pub verify_ticks: u32,
    /// Value reported when collected
    pub coin_value: u32,
    /// Coins are removed once left of this X
    pub kill_x: f32,
}

impl Default for SettleTuning {
    fn default() -> Self {
        Self {
            avoid_half_width: 1.0,
            avoid_half_height: 0.4,
            settle_attempts: 10,
            nudge_pairs: 3,
            vertical_step: 0.35,
            horizontal_step: 0.6,
            min_coin_separation: 0.3,
            verify_ticks: 3,
            coin_value: 1,
            kill_x: -40.0,
        }
    }
}

/// Scroll speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTuning {
    pub base: f32,
    /// Ease from `base` to `max` over `ramp_seconds`
    pub ramp: bool,
    pub max: f32,
    pub ramp_seconds: f32,
}

impl Default for SpeedTuning {
    fn default() -> Self {
        Self {
            base: DEFAULT_SCROLL_SPEED,
            ramp: false,
            max: 14.0,
            ramp_seconds: 90.0,
        }
    }
}

/// Run-level tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTuning {
    /// Hits are ignored for this long after a revive
    pub revive_invulnerable_seconds: f32,
}

impl Default for RunTuning {
    fn default() -> Self {
        Self {
            revive_invulnerable_seconds: 1.2,
        }
    }
}

/// Complete tuning surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub motion: MotionTuning,
    pub obstacles: ObstacleTuning,
    pub coins: CoinTuning,
    pub settle: SettleTuning,
    pub speed: SpeedTuning,
    pub run: RunTuning,
}

impl Tuning {
    /// Parse and validate tuning from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load tuning from a JSON file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("Using default tuning ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Check ranges the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        check_interval(
            "obstacles.spawn_min",
            self.obstacles.spawn_min,
            self.obstacles.spawn_max,
        )?;
        check_interval("coins.spawn_min", self.coins.spawn_min, self.coins.spawn_max)?;

        if self.coins.min_coins == 0 {
            return Err(TuningError::invalid("coins.min_coins", "must be at least 1"));
        }
        if self.coins.min_coins > self.coins.max_coins {
            return Err(TuningError::invalid(
                "coins.max_coins",
                format!(
                    "{} is below min_coins {}",
                    self.coins.max_coins, self.coins.min_coins
                ),
            ));
        }
        if self.coins.placement_attempts == 0 {
            return Err(TuningError::invalid(
                "coins.placement_attempts",
                "must be at least 1",
            ));
        }
        if self.settle.settle_attempts == 0 {
            return Err(TuningError::invalid(
                "settle.settle_attempts",
                "must be at least 1",
            ));
        }

        let finite = [
            ("physics.gravity", self.physics.gravity),
            ("physics.double_jump_factor", self.physics.double_jump_factor),
            ("motion.jump_impulse", self.motion.jump_impulse),
            ("motion.coyote_time", self.motion.coyote_time),
            ("motion.jump_buffer", self.motion.jump_buffer),
            ("obstacles.bar_thickness", self.obstacles.bar_thickness),
            ("coins.gap_x", self.coins.gap_x),
            ("coins.vertical_step", self.coins.vertical_step),
            ("coins.horizontal_step", self.coins.horizontal_step),
            ("settle.vertical_step", self.settle.vertical_step),
            ("settle.horizontal_step", self.settle.horizontal_step),
            ("coins.extra_pad", self.coins.extra_pad),
            ("settle.min_coin_separation", self.settle.min_coin_separation),
            ("speed.base", self.speed.base),
            ("speed.max", self.speed.max),
            ("speed.ramp_seconds", self.speed.ramp_seconds),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(TuningError::invalid(field, format!("{value} is not finite")));
            }
        }

        if self.motion.coyote_time < 0.0 || self.motion.jump_buffer < 0.0 {
            return Err(TuningError::invalid(
                "motion.coyote_time",
                "grace timers cannot be negative",
            ));
        }

        // Entities only leave the live set by scrolling left past kill_x
        if self.speed.base <= 0.0 {
            return Err(TuningError::invalid(
                "speed.base",
                format!("{} must be positive", self.speed.base),
            ));
        }
        if self.speed.max < self.speed.base {
            return Err(TuningError::invalid(
                "speed.max",
                format!("{} is below base {}", self.speed.max, self.speed.base),
            ));
        }
        if let Some(scale) = self
            .physics
            .gravity_scale
            .filter(|s| !(s.is_finite() && *s >= 0.0))
        {
            return Err(TuningError::invalid(
                "physics.gravity_scale",
                format!("{scale} must be finite and non-negative"),
            ));
        }

        let non_negative = [
            ("speed.ramp_seconds", self.speed.ramp_seconds),
            ("coins.extra_pad", self.coins.extra_pad),
            ("coins.vertical_step", self.coins.vertical_step),
            ("settle.vertical_step", self.settle.vertical_step),
            ("settle.min_coin_separation", self.settle.min_coin_separation),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(TuningError::invalid(field, format!("{value} cannot be negative")));
            }
        }

        Ok(())
    }
}

fn check_interval(field: &'static str, min: f32, max: f32) -> Result<(), TuningError> {
    if !(min.is_finite() && max.is_finite()) || min < 0.0 {
        return Err(TuningError::invalid(
            field,
            format!("interval [{min}, {max}] must be finite and non-negative"),
        ));
    }
    if min > max {
        return Err(TuningError::invalid(
            field,
            format!("min {min} exceeds max {max}"),
        ));
    }
    Ok(())
}
