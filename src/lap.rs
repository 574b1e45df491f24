//! Lap detection from position telemetry.
//!
//! The first observed position becomes the start anchor. A lap is credited
//! when the agent, having passed the checkpoint, re-enters the start zone
//! with enough total distance behind it:
//!
//! ```text
//! no anchor ──first update──▶ checkpoint pending ──checkpoint──▶ checkpoint passed
//!                                   ▲                                  │
//!                                   └──────── start zone, lap += 1 ────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::config::LapConfig;

/// Outcome of feeding one position to a [`LapTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapEvent {
    /// Nothing changed.
    None,
    /// The checkpoint was reached for the current lap.
    CheckpointPassed,
    /// A lap was completed; carries the new lap count.
    LapCompleted(u32),
}

/// Checkpoint and lap state for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LapTracker {
    start: Option<(f32, f32)>,
    passed_checkpoint: bool,
    completed_laps: u32,
}

impl LapTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The start anchor, once a position has been observed.
    #[must_use]
    pub const fn start(&self) -> Option<(f32, f32)> {
        self.start
    }

    #[must_use]
    pub const fn passed_checkpoint(&self) -> bool {
        self.passed_checkpoint
    }

    #[must_use]
    pub const fn completed_laps(&self) -> u32 {
        self.completed_laps
    }

    /// Clear lap progress but keep the start anchor.
    pub fn reset_progress(&mut self) {
        self.passed_checkpoint = false;
        self.completed_laps = 0;
    }

    /// Feed one position. `total_distance` is the distance recorded by the
    /// most recent fitness evaluation.
    pub fn update(&mut self, x: f32, y: f32, total_distance: f32, config: &LapConfig) -> LapEvent {
        let (start_x, start_y) = *self.start.get_or_insert((x, y));

        let mut event = LapEvent::None;

        let checkpoint_y = start_y - config.checkpoint_offset;
        let far_from_start = (x - start_x).abs() > config.checkpoint_lateral;
        if y < checkpoint_y && far_from_start && !self.passed_checkpoint {
            self.passed_checkpoint = true;
            event = LapEvent::CheckpointPassed;
        }

        let in_start_zone = (x - start_x).abs() < config.start_tolerance
            && (y - start_y).abs() < config.start_tolerance;

        if in_start_zone && self.passed_checkpoint && total_distance > config.min_lap_distance {
            self.completed_laps += 1;
            self.passed_checkpoint = false;
            event = LapEvent::LapCompleted(self.completed_laps);
        }

        event
    }
}
