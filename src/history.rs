//! Sensor frames and the rolling history window fed to the control network.

use serde::{Deserialize, Serialize};

/// Distance readings per frame, index 0 = left 90°, 4 = straight ahead, 8 = right 90°.
pub const SENSORS_PER_FRAME: usize = 9;
/// Number of frames kept in the history window.
pub const HISTORY_LENGTH: usize = 5;
/// Values stored per history frame: the readings plus normalised speed.
pub const FRAME_WIDTH: usize = SENSORS_PER_FRAME + 1;
/// Divisor mapping raw speed into the network's input range.
pub const SPEED_SCALE: f32 = 500.0;
/// Reading used to seed the history before any real frame is seen.
pub const NEUTRAL_READING: f32 = 3.0;

/// Copy the first [`SENSORS_PER_FRAME`] raw readings, zero-padding a short input.
///
/// This is the single ingress point for variable-length sensor data.
#[must_use]
pub fn ingest(raw: &[f32]) -> [f32; SENSORS_PER_FRAME] {
    let mut readings = [0.0; SENSORS_PER_FRAME];
    for (dst, src) in readings.iter_mut().zip(raw) {
        *dst = *src;
    }
    readings
}

/// One tick of sensor readings together with the normalised speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Distance readings from left to right.
    pub readings: [f32; SENSORS_PER_FRAME],
    /// Speed divided by [`SPEED_SCALE`].
    pub speed: f32,
}

impl SensorFrame {
    /// The frame used to fill a fresh history: open road, standing still.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            readings: [NEUTRAL_READING; SENSORS_PER_FRAME],
            speed: 0.0,
        }
    }

    /// Build a frame from already-ingested readings and a raw speed.
    #[must_use]
    pub fn new(readings: [f32; SENSORS_PER_FRAME], raw_speed: f32) -> Self {
        Self {
            readings,
            speed: raw_speed / SPEED_SCALE,
        }
    }

    /// Build a frame from a raw, possibly short, sensor slice.
    #[must_use]
    pub fn from_readings(raw: &[f32], raw_speed: f32) -> Self {
        Self::new(ingest(raw), raw_speed)
    }

    /// The frame as stored in the flattened network input.
    #[must_use]
    pub fn to_array(&self) -> [f32; FRAME_WIDTH] {
        let mut out = [0.0; FRAME_WIDTH];
        out[..SENSORS_PER_FRAME].copy_from_slice(&self.readings);
        out[SENSORS_PER_FRAME] = self.speed;
        out
    }
}

impl Default for SensorFrame {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Fixed-length FIFO of the most recent frames, oldest first.
///
/// The window always holds exactly [`HISTORY_LENGTH`] frames: pushing a frame
/// evicts the oldest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorHistory {
    frames: [SensorFrame; HISTORY_LENGTH],
}

impl SensorHistory {
    /// A history filled with [`SensorFrame::neutral`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames: [SensorFrame::neutral(); HISTORY_LENGTH],
        }
    }

    /// Append `frame`, dropping the oldest.
    pub fn push(&mut self, frame: SensorFrame) {
        self.frames.rotate_left(1);
        self.frames[HISTORY_LENGTH - 1] = frame;
    }

    /// Frames from oldest to newest.
    #[must_use]
    pub const fn frames(&self) -> &[SensorFrame; HISTORY_LENGTH] {
        &self.frames
    }

    /// Always [`HISTORY_LENGTH`].
    #[must_use]
    pub const fn len(&self) -> usize {
        HISTORY_LENGTH
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The most recently pushed frame.
    #[must_use]
    pub const fn latest(&self) -> &SensorFrame {
        &self.frames[HISTORY_LENGTH - 1]
    }

    /// Write the frames, oldest first, into the first
    /// `FRAME_WIDTH * HISTORY_LENGTH` slots of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `FRAME_WIDTH * HISTORY_LENGTH`.
    pub fn flatten_into(&self, out: &mut [f32]) {
        for (chunk, frame) in out.chunks_exact_mut(FRAME_WIDTH).zip(&self.frames) {
            chunk.copy_from_slice(&frame.to_array());
        }
    }
}

impl Default for SensorHistory {
    fn default() -> Self {
        Self::new()
    }
}
