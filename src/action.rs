//! The four-component control output.

use serde::{Deserialize, Serialize};

use crate::network::ACTION_SIZE;

/// Throttle, brake and the two steering intensities, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ActionVector {
    pub throttle: f32,
    pub brake: f32,
    pub steer_left: f32,
    pub steer_right: f32,
}

impl ActionVector {
    /// Interpret a raw network output as `[throttle, brake, steer_left, steer_right]`.
    #[must_use]
    pub const fn from_array(raw: [f32; ACTION_SIZE]) -> Self {
        Self {
            throttle: raw[0],
            brake: raw[1],
            steer_left: raw[2],
            steer_right: raw[3],
        }
    }

    #[must_use]
    pub const fn to_array(self) -> [f32; ACTION_SIZE] {
        [self.throttle, self.brake, self.steer_left, self.steer_right]
    }

    /// Whether every component lies in `[0, 1]`.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.to_array().iter().all(|v| (0.0..=1.0).contains(v))
    }
}

impl From<[f32; ACTION_SIZE]> for ActionVector {
    fn from(raw: [f32; ACTION_SIZE]) -> Self {
        Self::from_array(raw)
    }
}

impl From<ActionVector> for [f32; ACTION_SIZE] {
    fn from(action: ActionVector) -> Self {
        action.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_layout() {
        let action = ActionVector::from([0.1, 0.2, 0.3, 0.4]);
        assert_eq!(action.throttle, 0.1);
        assert_eq!(action.steer_right, 0.4);
        let raw: [f32; ACTION_SIZE] = action.into();
        assert_eq!(raw, [0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_is_bounded() {
        assert!(ActionVector::from([0.0, 1.0, 0.5, 0.5]).is_bounded());
        assert!(!ActionVector::from([1.1, 0.0, 0.0, 0.0]).is_bounded());
        assert!(!ActionVector::from([f32::NAN, 0.0, 0.0, 0.0]).is_bounded());
    }
}
