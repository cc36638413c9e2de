//! Player motion state machine
//!
//! Turns input edges and ground contact into vertical velocity once per tick:
//! coyote time, jump buffering, multi-jump, heavier falls and jump cut.
//! Base gravity is the body integrator's job (see `player`); this only adds
//! the extra shaping on top of it.

use serde::{Deserialize, Serialize};

use crate::tuning::MotionTuning;

/// Per-tick controller input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionInput {
    /// Ground probe result for this tick
    pub grounded: bool,
    /// Jump went down this tick
    pub jump_pressed: bool,
    /// Jump is held
    pub jump_held: bool,
    pub dt: f32,
}

/// What happened during a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionOutcome {
    pub jumped: bool,
    pub landed: bool,
}

/// Controller state, one per player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub vertical_velocity: f32,
    pub grounded: bool,
    /// Expired once <= 0
    pub coyote_timer: f32,
    pub jump_buffer_timer: f32,
    pub jumps_used: u32,
    pub was_grounded: bool,
}

impl MotionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick. `gravity` is the world gravity magnitude used for
    /// fall and jump-cut shaping.
    pub fn step(&mut self, input: &MotionInput, tuning: &MotionTuning, gravity: f32) -> MotionOutcome {
        let mut outcome = MotionOutcome::default();
        let dt = input.dt.max(0.0);

        // Landing resets the jump count, exactly once per touchdown
        self.grounded = input.grounded;
        if self.grounded && !self.was_grounded {
            self.jumps_used = 0;
            outcome.landed = true;
        }
        self.was_grounded = self.grounded;

        if self.grounded {
            self.coyote_timer = tuning.coyote_time;
        } else {
            self.coyote_timer -= dt;
        }

        if input.jump_pressed {
            self.jump_buffer_timer = tuning.jump_buffer;
        } else {
            self.jump_buffer_timer -= dt;
        }

        // One resolution per tick, no matter how many presses were buffered
        if self.jump_buffer_timer > 0.0 {
            if self.coyote_timer > 0.0 && tuning.max_jumps >= 1 {
                self.jump(tuning);
                self.jumps_used = 1;
                outcome.jumped = true;
            } else if self.jumps_used < tuning.max_jumps {
                self.jump(tuning);
                self.jumps_used += 1;
                outcome.jumped = true;
            }
        }

        let g = gravity.abs();
        if self.vertical_velocity < 0.0 {
            self.vertical_velocity -= g * (tuning.fall_gravity_multiplier - 1.0) * dt;
        } else if self.vertical_velocity > 0.0 && !input.jump_held {
            self.vertical_velocity -= g * (tuning.jump_cut_multiplier - 1.0) * dt;
        }

        outcome
    }

    fn jump(&mut self, tuning: &MotionTuning) {
        self.vertical_velocity = tuning.jump_impulse;
        self.jump_buffer_timer = 0.0;
        self.coyote_timer = 0.0;
    }

    /// Reset for a new run
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GRAVITY, SIM_DT};
    use proptest::prelude::*;

    fn input(grounded: bool, pressed: bool, held: bool) -> MotionInput {
        MotionInput {
            grounded,
            jump_pressed: pressed,
            jump_held: held,
            dt: SIM_DT,
        }
    }

    fn grounded_state(tuning: &MotionTuning) -> MotionState {
        let mut state = MotionState::new();
        state.step(&input(true, false, false), tuning, GRAVITY);
        state
    }

    #[test]
    fn test_ground_jump_sets_impulse() {
        let tuning = MotionTuning::default();
        let mut state = grounded_state(&tuning);

        let outcome = state.step(&input(true, true, true), &tuning, GRAVITY);
        assert!(outcome.jumped);
        assert_eq!(state.jumps_used, 1);
        assert_eq!(state.vertical_velocity, tuning.jump_impulse);
        assert_eq!(state.jump_buffer_timer, 0.0);
        assert_eq!(state.coyote_timer, 0.0);
    }

    #[test]
    fn test_coyote_jump_after_leaving_ground() {
        let tuning = MotionTuning::default();
        let mut state = grounded_state(&tuning);

        // Walk off a ledge, a few ticks of airtime inside the coyote window
        for _ in 0..5 {
            state.step(&input(false, false, false), &tuning, GRAVITY);
        }
        assert!(state.coyote_timer > 0.0);

        let outcome = state.step(&input(false, true, true), &tuning, GRAVITY);
        assert!(outcome.jumped);
        // Coyote jump counts as the first jump, one air jump left
        assert_eq!(state.jumps_used, 1);
    }

    #[test]
    fn test_coyote_expires() {
        let tuning = MotionTuning {
            max_jumps: 1,
            ..Default::default()
        };
        let mut state = grounded_state(&tuning);
        let ticks = (tuning.coyote_time / SIM_DT).ceil() as usize + 1;
        for _ in 0..ticks {
            state.step(&input(false, false, false), &tuning, GRAVITY);
        }
        assert!(state.coyote_timer <= 0.0);

        // max_jumps=1 and no coyote left: the press only gets buffered
        state.jumps_used = 1;
        let outcome = state.step(&input(false, true, true), &tuning, GRAVITY);
        assert!(!outcome.jumped);
        assert!(state.jump_buffer_timer > 0.0);
    }

    #[test]
    fn test_double_jump_then_exhausted() {
        let tuning = MotionTuning::default();
        let mut state = grounded_state(&tuning);

        assert!(state.step(&input(true, true, true), &tuning, GRAVITY).jumped);
        for _ in 0..20 {
            state.step(&input(false, false, true), &tuning, GRAVITY);
        }
        assert!(state.step(&input(false, true, true), &tuning, GRAVITY).jumped);
        assert_eq!(state.jumps_used, 2);
        for _ in 0..5 {
            state.step(&input(false, false, true), &tuning, GRAVITY);
        }
        assert!(!state.step(&input(false, true, true), &tuning, GRAVITY).jumped);
        assert_eq!(state.jumps_used, 2);
    }

    #[test]
    fn test_buffered_jump_fires_once_on_landing() {
        let tuning = MotionTuning::default();
        let mut state = grounded_state(&tuning);
        state.step(&input(true, true, true), &tuning, GRAVITY);
        for _ in 0..20 {
            state.step(&input(false, false, false), &tuning, GRAVITY);
        }
        state.step(&input(false, true, false), &tuning, GRAVITY);
        assert_eq!(state.jumps_used, 2);

        // Press again with no jumps left, a couple of ticks before touchdown
        assert!(!state.step(&input(false, true, false), &tuning, GRAVITY).jumped);
        state.step(&input(false, false, false), &tuning, GRAVITY);

        let mut jumps = 0;
        let landing = state.step(&input(true, false, false), &tuning, GRAVITY);
        assert!(landing.landed);
        if landing.jumped {
            jumps += 1;
        }
        for _ in 0..30 {
            if state.step(&input(true, false, false), &tuning, GRAVITY).jumped {
                jumps += 1;
            }
        }
        assert_eq!(jumps, 1);
        assert_eq!(state.jumps_used, 1);
    }

    #[test]
    fn test_stale_buffer_does_not_fire() {
        let tuning = MotionTuning {
            max_jumps: 1,
            ..Default::default()
        };
        let mut state = grounded_state(&tuning);
        state.step(&input(true, true, true), &tuning, GRAVITY);
        state.step(&input(false, true, false), &tuning, GRAVITY);
        // Buffer window passes before landing
        let ticks = (tuning.jump_buffer / SIM_DT).ceil() as usize + 2;
        for _ in 0..ticks {
            state.step(&input(false, false, false), &tuning, GRAVITY);
        }
        assert!(!state.step(&input(true, false, false), &tuning, GRAVITY).jumped);
    }

    #[test]
    fn test_fall_gravity_and_jump_cut() {
        let tuning = MotionTuning::default();

        let mut falling = MotionState {
            vertical_velocity: -1.0,
            ..Default::default()
        };
        falling.step(&input(false, false, false), &tuning, GRAVITY);
        let expected = -1.0 - GRAVITY * (tuning.fall_gravity_multiplier - 1.0) * SIM_DT;
        assert!((falling.vertical_velocity - expected).abs() < 1e-5);

        let mut rising_held = MotionState {
            vertical_velocity: 5.0,
            ..Default::default()
        };
        rising_held.step(&input(false, false, true), &tuning, GRAVITY);
        assert_eq!(rising_held.vertical_velocity, 5.0);

        let mut rising_released = rising_held.clone();
        rising_released.step(&input(false, false, false), &tuning, GRAVITY);
        let expected = 5.0 - GRAVITY * (tuning.jump_cut_multiplier - 1.0) * SIM_DT;
        assert!((rising_released.vertical_velocity - expected).abs() < 1e-5);
    }

    #[test]
    fn test_landing_resets_only_on_transition() {
        let tuning = MotionTuning::default();
        let mut state = grounded_state(&tuning);
        state.jumps_used = 2;
        // Still grounded: not a transition
        assert!(!state.step(&input(true, false, false), &tuning, GRAVITY).landed);
        assert_eq!(state.jumps_used, 2);

        state.step(&input(false, false, false), &tuning, GRAVITY);
        assert!(state.step(&input(true, false, false), &tuning, GRAVITY).landed);
        assert_eq!(state.jumps_used, 0);
    }

    proptest! {
        #[test]
        fn jumps_never_exceed_max(
            max_jumps in 0u32..4,
            ticks in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 1..300),
        ) {
            let tuning = MotionTuning { max_jumps, ..Default::default() };
            let mut state = MotionState::new();
            let mut was_grounded = false;
            for (grounded, pressed, held) in ticks {
                let before = state.jumps_used;
                let outcome = state.step(&input(grounded, pressed, held), &tuning, GRAVITY);
                prop_assert!(state.jumps_used <= max_jumps);
                if grounded && !was_grounded {
                    prop_assert!(outcome.landed);
                    prop_assert!(state.jumps_used <= 1);
                } else if !outcome.jumped {
                    prop_assert_eq!(state.jumps_used, before);
                }
                was_grounded = grounded;
            }
        }
    }
}
