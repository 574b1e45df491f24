//! Scalar fitness for evolutionary selection.
//!
//! ```text
//! score = 5·distance + 200·laps + 60·racing_line
//!       + efficiency + 1.5·(distance / time) − 2·low_speed_penalty
//! efficiency = (10 − time/laps)·25·laps   when laps > 0 and time/laps < 10
//! ```
//!
//! All weights come from [`FitnessConfig`]; the formula above shows the defaults.

use serde::{Deserialize, Serialize};

use crate::config::FitnessConfig;

/// Everything the score depends on, gathered at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitnessInputs {
    pub distance: f32,
    pub elapsed_time: f32,
    pub completed_laps: u32,
    pub racing_line_bonus: f32,
    pub low_speed_penalty: f32,
}

/// The individual score terms. [`total`](Self::total) combines them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub distance: f32,
    pub laps: f32,
    pub racing_line: f32,
    pub efficiency: f32,
    pub speed: f32,
    pub low_speed_penalty: f32,
}

impl FitnessBreakdown {
    /// Sum of the bonus terms minus the low-speed penalty.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.distance + self.laps + self.racing_line + self.efficiency + self.speed
            - self.low_speed_penalty
    }
}

/// Whether `distance` marks the start of a new episode relative to the
/// previously recorded distance.
#[must_use]
pub fn is_new_episode(distance: f32, previous: f32, config: &FitnessConfig) -> bool {
    distance < previous * config.episode_regression || distance < config.episode_min_distance
}

/// Compute every score term.
#[must_use]
#[allow(clippy::cast_precision_loss)] // lap counts stay tiny
pub fn evaluate(inputs: &FitnessInputs, config: &FitnessConfig) -> FitnessBreakdown {
    let laps = inputs.completed_laps as f32;
    let time = inputs.elapsed_time;

    let efficiency = if inputs.completed_laps > 0 && time > 0.0 {
        let time_per_lap = time / laps;
        if time_per_lap < config.target_lap_time {
            (config.target_lap_time - time_per_lap) * config.efficiency_weight * laps
        } else {
            0.0
        }
    } else {
        0.0
    };

    let speed = if time > 0.0 {
        config.speed_weight * (inputs.distance / time)
    } else {
        0.0
    };

    FitnessBreakdown {
        distance: config.distance_weight * inputs.distance,
        laps: config.lap_weight * laps,
        racing_line: config.racing_line_weight * inputs.racing_line_bonus,
        efficiency,
        speed,
        low_speed_penalty: config.low_speed_weight * inputs.low_speed_penalty,
    }
}
