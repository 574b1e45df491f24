//! Mutable state carried between ticks, kept apart from the genome.
//!
//! [`TickState`] is what the decision pipeline needs from one tick to the next.
//! [`RunState`] holds the episode counters that feed the fitness score.

use serde::{Deserialize, Serialize};

use crate::history::{SensorHistory, SENSORS_PER_FRAME};
use crate::lap::LapTracker;
use crate::situation::Situation;

/// Telemetry, history and derivative cache for the decision pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickState {
    /// Rolling window of recent frames.
    pub history: SensorHistory,
    /// Readings of the previous tick, for the sensor derivative. Zero before the first tick.
    pub prev_readings: [f32; SENSORS_PER_FRAME],
    /// Last reported position.
    pub x: f32,
    pub y: f32,
    /// Last reported speed.
    pub speed: f32,
    /// Number of decisions taken.
    pub ticks: u64,
    /// Situation classified on the most recent tick.
    pub last_situation: Situation,
}

/// Episode progress and the accumulators that feed the fitness score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Distance recorded by the most recent fitness evaluation.
    pub total_distance: f32,
    /// Start anchor, checkpoint flag and lap count.
    pub laps: LapTracker,
    /// Slow-tick counter driving the anti-freeze levels.
    pub freeze_frames: u32,
    /// Grows each time fitness is evaluated while the agent is slow.
    pub low_speed_penalty: f32,
    /// Sum of scaled per-tick racing-line bonuses.
    pub racing_line_bonus: f32,
    /// Reserved centring accumulator; cleared with the other counters.
    pub centering_acc: f32,
}

impl RunState {
    /// Clear the counters of a finished episode. The start anchor and the
    /// recorded distance survive.
    pub fn reset_episode(&mut self) {
        self.laps.reset_progress();
        self.freeze_frames = 0;
        self.low_speed_penalty = 0.0;
        self.racing_line_bonus = 0.0;
        self.centering_acc = 0.0;
    }

    /// Clear everything, including the recorded distance and the start anchor.
    pub fn reset_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LapConfig;

    fn busy_run() -> RunState {
        let mut run = RunState {
            total_distance: 80.0,
            freeze_frames: 12,
            low_speed_penalty: 0.4,
            racing_line_bonus: 1.5,
            centering_acc: 0.2,
            ..RunState::default()
        };
        let config = LapConfig::default();
        run.laps.update(0.0, 0.0, 80.0, &config);
        run.laps.update(200.0, -500.0, 80.0, &config);
        run.laps.update(0.0, 0.0, 80.0, &config);
        run
    }

    #[test]
    fn test_reset_episode_keeps_anchor_and_distance() {
        let mut run = busy_run();
        assert_eq!(run.laps.completed_laps(), 1);

        run.reset_episode();
        assert_eq!(run.laps.completed_laps(), 0);
        assert_eq!(run.freeze_frames, 0);
        assert_eq!(run.low_speed_penalty, 0.0);
        assert_eq!(run.racing_line_bonus, 0.0);
        assert_eq!(run.centering_acc, 0.0);
        assert_eq!(run.total_distance, 80.0);
        assert_eq!(run.laps.start(), Some((0.0, 0.0)));
    }

    #[test]
    fn test_reset_all_clears_everything() {
        let mut run = busy_run();
        run.reset_all();
        assert_eq!(run, RunState::default());
    }
}
