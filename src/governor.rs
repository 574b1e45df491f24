//! Anti-freeze governor: layered overrides that keep the agent moving.
//!
//! Rules run in priority order and later rules may overwrite earlier ones:
//!
//! 1. **Level 1**: slow with clear road ahead, floor throttle and cap brake.
//! 2. **Level 2**: crawling with some room ahead, stronger floor and cap.
//! 3. **Level 3**: frozen for too long, full throttle and no brake. Past a
//!    second limit one random steering direction is forced as well.
//!
//! A danger nudge driven by the predictor's forecast runs after all levels.
//! It is bounded by its own floor and cap and never undoes Level 3 beyond them.
//!
//! Every override is a `max`/`min` against constants in `[0, 1]` (or a
//! constant assignment), so a bounded action stays bounded.

use rand::Rng;

use crate::action::ActionVector;
use crate::config::GovernorConfig;

/// Index of the straight-ahead sensor.
pub const FRONT_SENSOR: usize = 4;

/// Applies the anti-freeze rules for one brain's configuration.
#[derive(Debug, Clone, Copy)]
pub struct AntiFreezeGovernor<'a> {
    config: &'a GovernorConfig,
}

impl<'a> AntiFreezeGovernor<'a> {
    #[must_use]
    pub const fn new(config: &'a GovernorConfig) -> Self {
        Self { config }
    }

    /// The front reading, or the configured default if the slice is too short.
    #[must_use]
    pub fn front(&self, readings: &[f32]) -> f32 {
        readings
            .get(FRONT_SENSOR)
            .copied()
            .unwrap_or(self.config.default_front)
    }

    /// Update the freeze counter for one tick at `speed`.
    ///
    /// Slow ticks add one; other ticks remove `freeze_decay`, saturating at zero,
    /// so recovery outpaces the build-up.
    #[must_use]
    pub fn track_freeze(&self, freeze_frames: u32, speed: f32) -> u32 {
        if speed < self.config.freeze_speed {
            freeze_frames.saturating_add(1)
        } else {
            freeze_frames.saturating_sub(self.config.freeze_decay)
        }
    }

    /// Apply levels 1 to 3. Randomness is drawn only when `freeze_frames`
    /// exceeds the steering limit.
    #[must_use]
    pub fn override_action<R: Rng>(
        &self,
        mut action: ActionVector,
        speed: f32,
        front: f32,
        freeze_frames: u32,
        rng: &mut R,
    ) -> ActionVector {
        let c = self.config;

        if speed < c.level1_speed && front > c.level1_front {
            action.throttle = action.throttle.max(c.level1_throttle);
            action.brake = action.brake.min(c.level1_brake);
        }

        if speed < c.level2_speed && front > c.level2_front {
            action.throttle = action.throttle.max(c.level2_throttle);
            action.brake = action.brake.min(c.level2_brake);
        }

        if freeze_frames > c.freeze_limit {
            action.throttle = 1.0;
            action.brake = 0.0;
            if freeze_frames > c.steer_limit {
                if rng.random_bool(0.5) {
                    action.steer_left = action.steer_left.max(c.steer_floor);
                } else {
                    action.steer_right = action.steer_right.max(c.steer_floor);
                }
            }
        }

        action
    }

    /// Soft brake and throttle nudge when the forecast front distance is short.
    ///
    /// `danger = 1 - predicted_front / danger_front`. The predictor output is
    /// linear, so a negative forecast yields `danger > 1`; only the brake cap
    /// and throttle floor bound the result.
    #[must_use]
    pub fn correct_danger(&self, mut action: ActionVector, predicted_front: f32) -> ActionVector {
        let c = self.config;
        if predicted_front < c.danger_front {
            let danger = 1.0 - predicted_front / c.danger_front;
            action.brake = (action.brake + danger * c.danger_brake_gain).min(c.danger_brake_cap);
            action.throttle =
                (action.throttle - danger * c.danger_throttle_gain).max(c.danger_throttle_floor);
        }
        action
    }
}
