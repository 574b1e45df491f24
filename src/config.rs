//! Tunable thresholds for the heuristic layers around the networks.
//!
//! Network dimensions are compile-time constants and deliberately absent here.
//! Every default below reproduces the stock controller exactly.

use serde::{Deserialize, Serialize};

/// Configuration for brain creation, the anti-freeze governor, lap tracking
/// and fitness scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BrainConfig {
    /// Random initialisation of a fresh genome.
    pub init: InitConfig,
    /// Anti-freeze and danger-correction thresholds.
    pub governor: GovernorConfig,
    /// Start/checkpoint geometry.
    pub lap: LapConfig,
    /// Score weights.
    pub fitness: FitnessConfig,
}

impl BrainConfig {
    /// Parse a config from JSON. Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `json` is not a valid config document,
    /// or [`ConfigError::OutOfRange`] if it fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that end up in an action component.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.governor.validate()
    }
}

/// Reasons a configuration is rejected.
#[derive(Debug)]
pub enum ConfigError {
    /// The document is not valid JSON for a [`BrainConfig`].
    Parse(serde_json::Error),
    /// A field lies outside its permitted range.
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "invalid config: {}", err),
            ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "config field {} = {} is outside [{}, {}]",
                field, value, min, max
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::OutOfRange { .. } => None,
        }
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Initialisation prior for new genomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// Standard deviation of the initial Gaussian weights.
    pub weight_std: f32,
    /// Initial control output bias for throttle.
    pub throttle_bias: f32,
    /// Initial control output bias for brake.
    pub brake_bias: f32,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            weight_std: 0.3,
            throttle_bias: 0.7,
            brake_bias: -0.5,
        }
    }
}

/// Thresholds for the layered anti-freeze override and the danger nudge.
///
/// The floors, ceilings and caps are written straight into the action, so
/// they must lie in `[0, 1]` and the danger gains must be non-negative.
/// [`validate`](Self::validate) checks this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Front reading assumed when fewer than five sensors are supplied.
    pub default_front: f32,
    /// Below this speed a tick counts towards `freeze_frames`.
    pub freeze_speed: f32,
    /// `freeze_frames` decrement per tick at or above `freeze_speed`.
    pub freeze_decay: u32,

    /// Level 1 applies below this speed...
    pub level1_speed: f32,
    /// ...when the front reading exceeds this.
    pub level1_front: f32,
    /// Level 1 throttle floor.
    pub level1_throttle: f32,
    /// Level 1 brake ceiling.
    pub level1_brake: f32,

    /// Level 2 applies below this speed...
    pub level2_speed: f32,
    /// ...when the front reading exceeds this.
    pub level2_front: f32,
    /// Level 2 throttle floor.
    pub level2_throttle: f32,
    /// Level 2 brake ceiling.
    pub level2_brake: f32,

    /// Level 3 (full throttle, no brake) once `freeze_frames` exceeds this.
    pub freeze_limit: u32,
    /// Random steering injection once `freeze_frames` exceeds this.
    pub steer_limit: u32,
    /// Minimum value of the injected steering component.
    pub steer_floor: f32,

    /// Predicted front distance below which the danger nudge applies.
    pub danger_front: f32,
    /// Brake added per unit of danger.
    pub danger_brake_gain: f32,
    /// Upper bound on brake after the danger nudge.
    pub danger_brake_cap: f32,
    /// Throttle removed per unit of danger.
    pub danger_throttle_gain: f32,
    /// Lower bound on throttle after the danger nudge.
    pub danger_throttle_floor: f32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            default_front: 3.0,
            freeze_speed: 50.0,
            freeze_decay: 2,
            level1_speed: 100.0,
            level1_front: 1.2,
            level1_throttle: 0.75,
            level1_brake: 0.15,
            level2_speed: 50.0,
            level2_front: 0.6,
            level2_throttle: 0.9,
            level2_brake: 0.1,
            freeze_limit: 10,
            steer_limit: 20,
            steer_floor: 0.7,
            danger_front: 0.8,
            danger_brake_gain: 0.2,
            danger_brake_cap: 0.5,
            danger_throttle_gain: 0.1,
            danger_throttle_floor: 0.3,
        }
    }
}

impl GovernorConfig {
    /// Check that every action-valued field lies in `[0, 1]` and that the
    /// danger gains are non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("level1_throttle", self.level1_throttle),
            ("level1_brake", self.level1_brake),
            ("level2_throttle", self.level2_throttle),
            ("level2_brake", self.level2_brake),
            ("steer_floor", self.steer_floor),
            ("danger_brake_cap", self.danger_brake_cap),
            ("danger_throttle_floor", self.danger_throttle_floor),
        ];
        for (field, value) in unit {
            check_range(field, value, 0.0, 1.0)?;
        }
        check_range("danger_brake_gain", self.danger_brake_gain, 0.0, f32::MAX)?;
        check_range("danger_throttle_gain", self.danger_throttle_gain, 0.0, f32::MAX)?;
        Ok(())
    }
}

/// Geometry of the start zone and the checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapConfig {
    /// The checkpoint lies this far below the start in `y`.
    pub checkpoint_offset: f32,
    /// Minimum lateral distance from the start for the checkpoint to count.
    pub checkpoint_lateral: f32,
    /// Half-width of the square start zone.
    pub start_tolerance: f32,
    /// Total distance required before a lap can be credited.
    pub min_lap_distance: f32,
}

impl Default for LapConfig {
    fn default() -> Self {
        Self {
            checkpoint_offset: 400.0,
            checkpoint_lateral: 160.0,
            start_tolerance: 100.0,
            min_lap_distance: 35.0,
        }
    }
}

/// Weights of the fitness score terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// Points per unit of distance.
    pub distance_weight: f32,
    /// Points per completed lap.
    pub lap_weight: f32,
    /// Multiplier on the accumulated racing-line bonus.
    pub racing_line_weight: f32,
    /// Laps faster than this (in time units) earn the efficiency bonus.
    pub target_lap_time: f32,
    /// Efficiency points per time unit under target, per lap.
    pub efficiency_weight: f32,
    /// Multiplier on average speed.
    pub speed_weight: f32,
    /// Multiplier on the low-speed penalty.
    pub low_speed_weight: f32,
    /// Speed below which an evaluation adds to the low-speed penalty.
    pub low_speed_threshold: f32,
    /// Penalty added per evaluation below `low_speed_threshold`.
    pub low_speed_step: f32,
    /// A distance below this fraction of the previous one starts a new episode.
    pub episode_regression: f32,
    /// A distance below this always starts a new episode.
    pub episode_min_distance: f32,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            distance_weight: 5.0,
            lap_weight: 200.0,
            racing_line_weight: 60.0,
            target_lap_time: 10.0,
            efficiency_weight: 25.0,
            speed_weight: 1.5,
            low_speed_weight: 2.0,
            low_speed_threshold: 50.0,
            low_speed_step: 0.1,
            episode_regression: 0.5,
            episode_min_distance: 1.0,
        }
    }
}
