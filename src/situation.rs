//! Rule-based track situation classifier and racing-line scorer.
//!
//! Both read the raw sensor slice. Fewer than [`SENSORS_PER_FRAME`] readings
//! is not an error: the classifier reports a straight with zero asymmetry and
//! the scorer awards nothing.

use serde::{Deserialize, Serialize};

use crate::history::SENSORS_PER_FRAME;

const LEFT_90: usize = 0;
const LEFT_45: usize = 2;
const RIGHT_45: usize = 6;
const RIGHT_90: usize = 8;

/// Side-to-side clearance difference that separates a turn from a straight.
pub const TURN_THRESHOLD: f32 = 0.8;
/// Inner-side band earning the full racing-line bonus.
pub const TIGHT_LINE: (f32, f32) = (0.8, 1.8);
/// Wider inner-side band earning half the bonus.
pub const LOOSE_LINE: (f32, f32) = (0.5, 2.5);
/// Maximum left/right difference that counts as centred on a straight.
pub const CENTERED_TOLERANCE: f32 = 1.0;
/// Factor applied to each tick's bonus before it is accumulated.
pub const BONUS_SCALE: f32 = 0.01;

/// Coarse classification of the track geometry around the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Situation {
    #[default]
    Straight,
    LeftTurn,
    RightTurn,
}

/// Classify the sensor geometry.
///
/// Returns the situation and the asymmetry `mean(l90, l45) - mean(r45, r90)`.
/// More clearance on the left than the right reads as a right turn.
#[must_use]
pub fn classify(sensors: &[f32]) -> (Situation, f32) {
    if sensors.len() < SENSORS_PER_FRAME {
        return (Situation::Straight, 0.0);
    }

    let left_avg = (sensors[LEFT_90] + sensors[LEFT_45]) / 2.0;
    let right_avg = (sensors[RIGHT_90] + sensors[RIGHT_45]) / 2.0;
    let asymmetry = left_avg - right_avg;

    let situation = if asymmetry.abs() < TURN_THRESHOLD {
        Situation::Straight
    } else if asymmetry > 0.0 {
        Situation::RightTurn
    } else {
        Situation::LeftTurn
    };
    (situation, asymmetry)
}

/// Per-tick racing-line bonus for the given situation, before [`BONUS_SCALE`].
///
/// In a turn, the inner-side 90° reading is rewarded for sitting in the tight
/// band (1.0) or the loose band (0.5). On a straight, 0.3 is awarded for
/// staying centred.
#[must_use]
pub fn racing_line_bonus(sensors: &[f32], situation: Situation) -> f32 {
    if sensors.len() < SENSORS_PER_FRAME {
        return 0.0;
    }

    let left_90 = sensors[LEFT_90];
    let right_90 = sensors[RIGHT_90];

    match situation {
        Situation::RightTurn => inner_line_bonus(right_90),
        Situation::LeftTurn => inner_line_bonus(left_90),
        Situation::Straight => {
            if (left_90 - right_90).abs() < CENTERED_TOLERANCE {
                0.3
            } else {
                0.0
            }
        }
    }
}

fn inner_line_bonus(inner: f32) -> f32 {
    let within = |(lo, hi): (f32, f32)| (lo..=hi).contains(&inner);
    if within(TIGHT_LINE) {
        1.0
    } else if within(LOOSE_LINE) {
        0.5
    } else {
        0.0
    }
}
