//! The decision pipeline and the [`Brain`] aggregate around it.
//!
//! [`step`] is the whole per-tick pipeline as a function of an immutable
//! genome, the mutable tick/run state and an injected random generator:
//!
//! ```text
//! sensors ─▶ classify + racing line ─▶ history push ─▶ network A ─▶ network B
//!         ─▶ anti-freeze levels 1..3 ─▶ danger nudge ─▶ action
//! ```
//!
//! [`Brain`] bundles a genome with its state, a name and a score, and exposes
//! the interface a population manager drives: `decide`, `update_telemetry`,
//! `evaluate_fitness`, `mutate` and parameter export/import.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::action::ActionVector;
use crate::config::BrainConfig;
use crate::fitness::{self, FitnessBreakdown, FitnessInputs};
use crate::genome::{Genotype, TensorSet};
use crate::governor::{AntiFreezeGovernor, FRONT_SENSOR};
use crate::history::{SensorFrame, SensorHistory, FRAME_WIDTH, HISTORY_LENGTH, SENSORS_PER_FRAME};
use crate::lap::LapEvent;
use crate::network::{ACTION_SIZE, CONTROL_INPUTS, PREDICTOR_INPUTS};
use crate::params::{ImportError, ParameterBundle};
use crate::situation::{self, Situation, BONUS_SCALE};
use crate::state::{RunState, TickState};

/// Marker appended to a brain's name on every mutation.
pub const LINEAGE_MARKER: char = 'm';

/// Everything computed during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Final action after all overrides.
    pub action: ActionVector,
    /// Network A output before any override.
    pub raw_action: ActionVector,
    /// Network B forecast of the next tick's readings.
    pub predicted: [f32; SENSORS_PER_FRAME],
    /// Classified track situation.
    pub situation: Situation,
    /// Left-minus-right clearance used for the classification.
    pub asymmetry: f32,
    /// This tick's racing-line bonus before scaling.
    pub racing_line_bonus: f32,
}

/// Advance one tick.
///
/// Deterministic for fixed inputs and state unless `run.freeze_frames`
/// passes the steering limit, where the random steering injection draws from
/// `rng`. Never fails: malformed sensor slices fall back to defaults.
pub fn step<R: Rng>(
    genome: &TensorSet,
    config: &BrainConfig,
    tick: &mut TickState,
    run: &mut RunState,
    sensors: &[f32],
    rng: &mut R,
) -> TickReport {
    tick.ticks += 1;

    let (situation, asymmetry) = situation::classify(sensors);
    tick.last_situation = situation;
    let line_bonus = situation::racing_line_bonus(sensors, situation);
    run.racing_line_bonus += line_bonus * BONUS_SCALE;

    let frame = SensorFrame::from_readings(sensors, tick.speed);
    let readings = frame.readings;
    let mut derivative = [0.0; SENSORS_PER_FRAME];
    for ((d, now), before) in derivative.iter_mut().zip(&readings).zip(&tick.prev_readings) {
        *d = now - before;
    }
    tick.prev_readings = readings;
    tick.history.push(frame);

    let mut control_input = [0.0; CONTROL_INPUTS];
    let (frames, deltas) = control_input.split_at_mut(FRAME_WIDTH * HISTORY_LENGTH);
    tick.history.flatten_into(frames);
    deltas.copy_from_slice(&derivative);
    let raw = genome.act(&control_input);

    let mut predictor_input = [0.0; PREDICTOR_INPUTS];
    predictor_input[..CONTROL_INPUTS].copy_from_slice(&control_input);
    predictor_input[CONTROL_INPUTS..CONTROL_INPUTS + ACTION_SIZE].copy_from_slice(&raw);
    let predicted = genome.predict(&predictor_input);

    let governor = AntiFreezeGovernor::new(&config.governor);
    run.freeze_frames = governor.track_freeze(run.freeze_frames, tick.speed);
    let raw_action = ActionVector::from(raw);
    let action = governor.override_action(
        raw_action,
        tick.speed,
        governor.front(sensors),
        run.freeze_frames,
        rng,
    );
    let action = governor.correct_danger(action, predicted[FRONT_SENSOR]);

    TickReport {
        action,
        raw_action,
        predicted,
        situation,
        asymmetry,
        racing_line_bonus: line_bonus,
    }
}

/// An evolvable racing controller: genome, run-time state, name and score.
///
/// A brain owns all of its state; brains in a population share nothing and
/// can be driven from different threads.
#[derive(Debug, Clone)]
pub struct Brain {
    genome: TensorSet,
    config: BrainConfig,
    tick: TickState,
    run: RunState,
    name: String,
    score: f32,
    fitness: FitnessBreakdown,
}

impl Brain {
    /// Name given to freshly created brains.
    pub const DEFAULT_NAME: &'static str = "Ensemble";

    /// Create a brain with a randomly initialised genome.
    #[must_use]
    pub fn new<R: Rng>(config: BrainConfig, rng: &mut R) -> Self {
        let genome = TensorSet::random(&config.init, rng);
        Self::from_genome(genome, config, Self::DEFAULT_NAME)
    }

    /// Wrap an existing genome with fresh state.
    #[must_use]
    pub fn from_genome(genome: TensorSet, config: BrainConfig, name: impl Into<String>) -> Self {
        Self {
            genome,
            config,
            tick: TickState::default(),
            run: RunState::default(),
            name: name.into(),
            score: 0.0,
            fitness: FitnessBreakdown::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn genome(&self) -> &TensorSet {
        &self.genome
    }

    #[must_use]
    pub const fn config(&self) -> &BrainConfig {
        &self.config
    }

    #[must_use]
    pub const fn tick_state(&self) -> &TickState {
        &self.tick
    }

    #[must_use]
    pub const fn run_state(&self) -> &RunState {
        &self.run
    }

    #[must_use]
    pub const fn history(&self) -> &SensorHistory {
        &self.tick.history
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.tick.ticks
    }

    #[must_use]
    pub const fn last_situation(&self) -> Situation {
        self.tick.last_situation
    }

    #[must_use]
    pub const fn position(&self) -> (f32, f32) {
        (self.tick.x, self.tick.y)
    }

    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.tick.speed
    }

    #[must_use]
    pub const fn completed_laps(&self) -> u32 {
        self.run.laps.completed_laps()
    }

    #[must_use]
    pub const fn freeze_frames(&self) -> u32 {
        self.run.freeze_frames
    }

    #[must_use]
    pub const fn racing_line_bonus(&self) -> f32 {
        self.run.racing_line_bonus
    }

    /// Score set by the last [`evaluate_fitness`](Self::evaluate_fitness).
    #[must_use]
    pub const fn score(&self) -> f32 {
        self.score
    }

    /// Per-term breakdown of the last score.
    #[must_use]
    pub const fn fitness(&self) -> &FitnessBreakdown {
        &self.fitness
    }

    /// Advance one tick and return the action to apply.
    pub fn decide<R: Rng>(&mut self, sensors: &[f32], rng: &mut R) -> ActionVector {
        self.step(sensors, rng).action
    }

    /// Advance one tick and return the full [`TickReport`].
    pub fn step<R: Rng>(&mut self, sensors: &[f32], rng: &mut R) -> TickReport {
        step(
            &self.genome,
            &self.config,
            &mut self.tick,
            &mut self.run,
            sensors,
            rng,
        )
    }

    /// Record this tick's position and speed and advance the lap tracker.
    ///
    /// Call once per tick. The speed seen by [`decide`](Self::decide) is the
    /// last one passed here.
    pub fn update_telemetry(&mut self, x: f32, y: f32, speed: f32) {
        self.tick.x = x;
        self.tick.y = y;
        self.tick.speed = speed;

        let event = self
            .run
            .laps
            .update(x, y, self.run.total_distance, &self.config.lap);
        if let LapEvent::LapCompleted(laps) = event {
            info!(brain = %self.name, laps, "lap completed");
        }
    }

    /// Recompute the score from the distance and time reported by the simulation.
    ///
    /// A distance that regresses below half of the previous one (or below 1.0)
    /// starts a new episode and clears the episode counters first. Each call
    /// made while the agent is slow adds to the low-speed penalty, so the
    /// caller's call frequency scales that penalty.
    pub fn evaluate_fitness(&mut self, distance: f32, elapsed_time: f32, episode: u32) {
        let config = &self.config.fitness;

        if fitness::is_new_episode(distance, self.run.total_distance, config) {
            debug!(brain = %self.name, episode, distance, "new episode, clearing run state");
            self.run.reset_episode();
        }
        self.run.total_distance = distance;

        if self.tick.speed < config.low_speed_threshold {
            self.run.low_speed_penalty += config.low_speed_step;
        }

        let inputs = FitnessInputs {
            distance,
            elapsed_time,
            completed_laps: self.run.laps.completed_laps(),
            racing_line_bonus: self.run.racing_line_bonus,
            low_speed_penalty: self.run.low_speed_penalty,
        };
        self.fitness = fitness::evaluate(&inputs, config);
        self.score = self.fitness.total();
    }

    /// Perturb every tensor in place and extend the name's lineage marker.
    ///
    /// Clone first (or use [`offspring`](Self::offspring)) if the parent must survive.
    pub fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.genome.mutate(rng, 1.0);
        self.name.push(LINEAGE_MARKER);
        debug!(brain = %self.name, "mutated");
    }

    /// A mutated copy with fresh run-time state. `self` is left untouched.
    #[must_use]
    pub fn offspring<R: Rng>(&self, rng: &mut R) -> Self {
        let mut child = Self::from_genome(self.genome.clone(), self.config.clone(), &*self.name);
        child.mutate(rng);
        child
    }

    /// Independent snapshot of every tensor and the name.
    #[must_use]
    pub fn export_parameters(&self) -> ParameterBundle {
        ParameterBundle {
            name: self.name.clone(),
            tensors: self.genome.to_tensors(),
        }
    }

    /// Replace the genome and name from `bundle` and reset the run state.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError`] if any tensor is missing or has the wrong
    /// shape. The brain is left exactly as it was.
    pub fn import_parameters(&mut self, bundle: &ParameterBundle) -> Result<(), ImportError> {
        let genome = match TensorSet::from_tensors(&bundle.tensors) {
            Ok(genome) => genome,
            Err(err) => {
                warn!(brain = %self.name, incoming = %bundle.name, %err, "ignoring incompatible parameters");
                return Err(err);
            }
        };

        self.genome = genome;
        self.name.clone_from(&bundle.name);
        self.run.reset_all();
        Ok(())
    }
}
