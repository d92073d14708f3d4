//! Dice box engine
//!
//! Owns the dice, the physics world and the renderer, and drives rolls one
//! frame at a time.
//!
//! # Roll protocol
//!
//! A natural roll seeds the physics stream, throws the dice and lets the
//! frame loop run until every die has settled.
//!
//! A predicted roll decides the outcome first:
//!
//! ```text
//! 1. Resolve the desired value of every die
//! 2. Seed, throw, and simulate silently until settled (or tick cap)
//! 3. Read the natural value of every die
//! 4. Rig every die so its natural face prints the desired value
//! 5. Seed identically and throw again
//! 6. Frame loop replays the same trajectory; the dice now read as desired
//! ```
//!
//! # Phases
//!
//! ```text
//! Idle -> Predicting -> Rigging -> Replaying -> Settled
//! Idle -> Rolling -> Settled
//! Rolling | Replaying -> Cancelled (stop)
//! ```
//!
//! While a roll is in flight the box is locked: `start` and dice-set
//! mutations are rejected (return `false`) rather than queued.
//!
//! # Example
//!
//! ```rust
//! use dice_box_core_rs::orchestrator::{DesiredOutcome, DiceBox, DiceBoxConfig};
//! use dice_box_core_rs::DieType;
//!
//! let mut dice_box = DiceBox::headless(DiceBoxConfig::default()).unwrap();
//! dice_box.add_dice(DieType::D6);
//! dice_box.set_desired_outcome(DesiredOutcome::Values(vec![4])).unwrap();
//!
//! assert!(dice_box.start(true));
//! let outcome = dice_box.run_until_settled(10_000).unwrap();
//! assert_eq!(outcome.values, vec![4]);
//! ```

use super::record::{compute_config_hash, RecordError, RecordedDie, RigRecord, RollRecord};
use super::trace::Trajectory;
use crate::core::time::{TickClock, DEFAULT_TIME_STEP};
use crate::dice::{DieCatalog, DieError, DieType};
use crate::events::{EntityEvent, EventPayload};
use crate::models::{DieState, EntityOptions, EntityRegistry, RollEvent, RollLog};
use crate::physics::{BodyPose, PhysicsWorld, SimpleWorld, WorldConfig};
use crate::render::{Camera, Frame, RecordingRenderer, Renderer};
use crate::rng::DiceRng;
use crate::settle::{
    StopDetector, StopTransition, DEFAULT_VELOCITY_EPSILON, DEFAULT_WINDOW_TICKS,
};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// Configuration Types
// ============================================================================

/// Hard limit on ticks of a silent prediction
pub const DEFAULT_TICK_CAP: usize = 3000;

/// Dice laid out per row when spawning
const SPAWN_COLUMNS: usize = 4;

/// Settle detection tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    /// Squared linear and angular speed below which a die may be resting
    pub velocity_epsilon: f32,
    /// Hysteresis window of the silent prediction
    pub predict_window_ticks: usize,
    /// Hysteresis window of the visible pass
    pub visible_window_ticks: usize,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            velocity_epsilon: DEFAULT_VELOCITY_EPSILON,
            predict_window_ticks: DEFAULT_WINDOW_TICKS,
            visible_window_ticks: DEFAULT_WINDOW_TICKS,
        }
    }
}

/// How dice are spawned and thrown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowConfig {
    /// Drop height of the spawn grid
    pub spawn_height: f32,
    /// Distance between spawn grid cells
    pub spacing: f32,
    /// Random horizontal offset around each cell
    pub spawn_jitter: f32,
    /// Horizontal throw speed limit (m/s)
    pub linear_speed: f32,
    /// Spin limit per axis (rad/s)
    pub angular_speed: f32,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for ThrowConfig {
    fn default() -> Self {
        Self {
            spawn_height: 4.0,
            spacing: 2.5,
            spawn_jitter: 0.5,
            linear_speed: 4.0,
            angular_speed: 15.0,
            mass: 1.0,
            linear_damping: 0.1,
            angular_damping: 0.5,
        }
    }
}

/// Complete dice box configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceBoxConfig {
    /// Seed of the session stream that draws roll seeds
    pub rng_seed: i64,

    /// Fixed physics timestep (seconds)
    pub time_step: f32,

    /// Tick cap of the silent prediction
    pub tick_cap: usize,

    pub stop: StopConfig,

    pub throw: ThrowConfig,

    /// Tuning of the headless reference world
    pub world: WorldConfig,

    pub camera: Camera,

    /// Keep per-tick poses of both passes for comparison
    pub record_trajectories: bool,
}

impl Default for DiceBoxConfig {
    fn default() -> Self {
        Self {
            rng_seed: 0,
            time_step: DEFAULT_TIME_STEP,
            tick_cap: DEFAULT_TICK_CAP,
            stop: StopConfig::default(),
            throw: ThrowConfig::default(),
            world: WorldConfig::default(),
            camera: Camera::default(),
            record_trajectories: true,
        }
    }
}

/// The part of the config a roll's trajectory depends on
#[derive(Serialize)]
struct ReplayFingerprint<'a> {
    time_step: f32,
    stop: &'a StopConfig,
    throw: &'a ThrowConfig,
    world: &'a WorldConfig,
}

impl DiceBoxConfig {
    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, DiceBoxError> {
        let config: DiceBoxConfig = serde_json::from_str(json)
            .map_err(|e| DiceBoxError::InvalidConfig(format!("JSON parse failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DiceBoxError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(DiceBoxError::InvalidConfig(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.tick_cap == 0 {
            return Err(DiceBoxError::InvalidConfig(
                "tick_cap must be > 0".to_string(),
            ));
        }
        if !(self.stop.velocity_epsilon > 0.0) {
            return Err(DiceBoxError::InvalidConfig(format!(
                "velocity_epsilon must be positive, got {}",
                self.stop.velocity_epsilon
            )));
        }
        if !(self.throw.mass > 0.0) {
            return Err(DiceBoxError::InvalidConfig(format!(
                "dice mass must be positive, got {}",
                self.throw.mass
            )));
        }
        if !(self.throw.spacing > 0.0) {
            return Err(DiceBoxError::InvalidConfig(format!(
                "spawn spacing must be positive, got {}",
                self.throw.spacing
            )));
        }
        Ok(())
    }

    /// Hash of the settings that shape a trajectory
    ///
    /// Session seed, tick cap, camera and recording flags are excluded: a
    /// record made under one of them replays identically under another.
    pub fn replay_fingerprint(&self) -> Result<String, RecordError> {
        compute_config_hash(&ReplayFingerprint {
            time_step: self.time_step,
            stop: &self.stop,
            throw: &self.throw,
            world: &self.world,
        })
    }
}

// ============================================================================
// Roll Types
// ============================================================================

/// What a predicted roll should land on
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredOutcome {
    /// Draw a value per die from the session stream
    #[default]
    Random,
    /// One value per die, in dice order
    Values(Vec<u32>),
    /// Any combination summing to this total
    Total(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollPhase {
    Idle,
    Predicting,
    Rigging,
    Replaying,
    Rolling,
    Settled,
    Cancelled,
}

/// Result of one [`DiceBox::run`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// No roll and no frame pending
    Idle,
    /// A roll is in flight; call `run` again next frame
    Running,
    Settled,
    Cancelled,
}

/// Final values of a settled roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub roll_id: String,
    pub seed: i64,
    pub predicted: bool,
    /// One 1-based value per die, in dice order
    pub values: Vec<u32>,
    pub total: u32,
    /// What the silent pass landed on
    pub natural: Option<Vec<u32>>,
    /// Ticks taken by the visible pass
    pub ticks: usize,
    /// The prediction hit the tick cap; values were read mid-motion
    pub capped: bool,
}

/// A die in the box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDie {
    pub name: String,
    pub die_type: DieType,
    /// Cyclic label shift from the catalog mesh, in `0..face_count`
    pub label_offset: u32,
}

struct ActiveRoll {
    id: String,
    seed: i64,
    predicted: bool,
    natural: Option<Vec<u32>>,
    capped: bool,
    rigs: Vec<RigRecord>,
    /// Tick at which the visible pass is ended regardless of motion
    deadline: Option<usize>,
}

/// Dice box errors
#[derive(Debug, Error)]
pub enum DiceBoxError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Desired outcome has {got} values for {expected} dice")]
    OutcomeArity { expected: usize, got: usize },

    #[error("Desired total {total} not reachable, dice cover {min}..={max}")]
    TotalOutOfRange { total: u32, min: u32, max: u32 },

    #[error("Record config hash {recorded} does not match {current}")]
    ConfigMismatch { recorded: String, current: String },

    #[error(transparent)]
    Die(#[from] DieError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

type SettledCallback = Box<dyn FnMut(&RollOutcome)>;

// ============================================================================
// Dice Box
// ============================================================================

pub struct DiceBox<W: PhysicsWorld, R: Renderer> {
    config: DiceBoxConfig,
    config_hash: String,
    catalog: DieCatalog,
    registry: EntityRegistry,
    world: W,
    renderer: R,
    clock: TickClock,

    /// Physics stream, re-seeded at the start of every pass
    rng: DiceRng,

    /// Session stream drawing roll seeds and random desired values
    seed_source: DiceRng,

    dice: Vec<ActiveDie>,
    next_die_id: u64,
    desired: DesiredOutcome,

    phase: RollPhase,
    /// Phase to return to when a cancelled roll is continued
    resume_phase: Option<RollPhase>,
    locked: bool,
    frame_pending: bool,

    roll: Option<ActiveRoll>,
    roll_seed: Option<i64>,
    outcome: Option<RollOutcome>,
    last_record: Option<RollRecord>,
    prediction_trace: Option<Trajectory>,
    replay_trace: Option<Trajectory>,

    log: RollLog,
    settled_callbacks: Vec<SettledCallback>,
}

impl DiceBox<SimpleWorld, RecordingRenderer> {
    /// Dice box on the reference world with a recording renderer
    pub fn headless(config: DiceBoxConfig) -> Result<Self, DiceBoxError> {
        let world = SimpleWorld::new(config.world.clone());
        Self::new(config, world, RecordingRenderer::new())
    }
}

impl<W: PhysicsWorld, R: Renderer> DiceBox<W, R> {
    /// Create a dice box
    ///
    /// # Errors
    ///
    /// Returns [`DiceBoxError::InvalidConfig`] if the config fails validation
    pub fn new(config: DiceBoxConfig, world: W, renderer: R) -> Result<Self, DiceBoxError> {
        config.validate()?;
        let config_hash = config.replay_fingerprint()?;

        info!(
            seed = config.rng_seed,
            tick_cap = config.tick_cap,
            "dice box created"
        );

        Ok(Self {
            clock: TickClock::new(config.time_step),
            rng: DiceRng::new(config.rng_seed),
            seed_source: DiceRng::new(config.rng_seed),
            config,
            config_hash,
            catalog: DieCatalog::standard(),
            registry: EntityRegistry::new(),
            world,
            renderer,
            dice: Vec::new(),
            next_die_id: 0,
            desired: DesiredOutcome::Random,
            phase: RollPhase::Idle,
            resume_phase: None,
            locked: false,
            frame_pending: false,
            roll: None,
            roll_seed: None,
            outcome: None,
            last_record: None,
            prediction_trace: None,
            replay_trace: None,
            log: RollLog::new(),
            settled_callbacks: Vec::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &DiceBoxConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DieCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Mutable registry access, e.g. to attach handlers to a die
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Dice in roll order
    pub fn dice(&self) -> &[ActiveDie] {
        &self.dice
    }

    pub fn phase(&self) -> RollPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Seed of the current or last roll
    pub fn roll_seed(&self) -> Option<i64> {
        self.roll_seed
    }

    /// Tick of the current pass
    pub fn current_tick(&self) -> usize {
        self.clock.current_tick()
    }

    /// Outcome of the last settled roll
    pub fn outcome(&self) -> Option<&RollOutcome> {
        self.outcome.as_ref()
    }

    /// Sum of the last settled roll
    pub fn total_value(&self) -> Option<u32> {
        self.outcome.as_ref().map(|o| o.total)
    }

    pub fn desired_outcome(&self) -> &DesiredOutcome {
        &self.desired
    }

    pub fn roll_log(&self) -> &RollLog {
        &self.log
    }

    /// Record of the last settled roll
    pub fn last_record(&self) -> Option<&RollRecord> {
        self.last_record.as_ref()
    }

    /// Poses of the last silent pass (when recording is enabled)
    pub fn last_prediction_trace(&self) -> Option<&Trajectory> {
        self.prediction_trace.as_ref()
    }

    /// Poses of the last visible pass (when recording is enabled)
    pub fn last_replay_trace(&self) -> Option<&Trajectory> {
        self.replay_trace.as_ref()
    }

    // ========================================================================
    // Dice Set
    // ========================================================================

    /// Add a die at the end of the dice order; `false` while locked
    pub fn add_dice(&mut self, die_type: DieType) -> bool {
        if self.locked {
            debug!(%die_type, "add_dice rejected: roll in progress");
            return false;
        }

        let name = format!("die-{}", self.next_die_id);
        self.next_die_id += 1;

        let kind = self.catalog.kind(die_type);
        let options = EntityOptions {
            mass: self.config.throw.mass,
            linear_damping: self.config.throw.linear_damping,
            angular_damping: self.config.throw.angular_damping,
        };
        let index = self.dice.len();
        let mut rest = spawn_cell(&self.config.throw, index, index + 1);
        rest.z = kind.shape().radius();

        let entity = self.registry.create_or_replace(
            &name,
            kind.geometry().clone(),
            kind.materials().clone(),
            kind.shape().clone(),
            options,
            &mut self.renderer,
            &mut self.world,
        );
        entity.set_die(DieState {
            die_type,
            detector: StopDetector::new(
                self.config.stop.velocity_epsilon,
                self.config.stop.visible_window_ticks,
            ),
        });
        entity.place(
            BodyPose {
                position: rest,
                orientation: Quat::IDENTITY,
            },
            Vec3::ZERO,
            Vec3::ZERO,
            &mut self.world,
        );
        entity.create(&mut self.renderer, &mut self.world);

        debug!(die = %name, %die_type, "die added");
        self.log.log(RollEvent::DiceAdded {
            tick: self.clock.current_tick(),
            die: name.clone(),
            die_type,
        });
        self.dice.push(ActiveDie {
            name,
            die_type,
            label_offset: 0,
        });
        self.dice_set_changed();
        true
    }

    /// Remove the named die; `false` while locked or if there is none
    pub fn remove_dice(&mut self, name: &str) -> bool {
        if self.locked {
            debug!(die = name, "remove_dice rejected: roll in progress");
            return false;
        }
        let Some(index) = self.dice.iter().position(|d| d.name == name) else {
            return false;
        };

        self.dice.remove(index);
        self.registry.remove(name, &mut self.renderer, &mut self.world);

        debug!(die = name, "die removed");
        self.log.log(RollEvent::DiceRemoved {
            tick: self.clock.current_tick(),
            die: name.to_string(),
        });
        self.dice_set_changed();
        true
    }

    /// The last outcome and any cancelled roll no longer describe the dice
    fn dice_set_changed(&mut self) {
        self.outcome = None;
        if self.phase == RollPhase::Cancelled {
            debug!("cancelled roll discarded: dice set changed");
            self.roll = None;
            self.resume_phase = None;
            self.phase = RollPhase::Idle;
        }
    }

    /// Remove the most recently added die of `die_type`
    pub fn remove_die_type(&mut self, die_type: DieType) -> bool {
        let name = self
            .dice
            .iter()
            .rev()
            .find(|d| d.die_type == die_type)
            .map(|d| d.name.clone());
        match name {
            Some(name) => self.remove_dice(&name),
            None => false,
        }
    }

    /// Remove every die; `false` while locked
    pub fn clear_dice(&mut self) -> bool {
        if self.locked {
            debug!("clear_dice rejected: roll in progress");
            return false;
        }

        let count = self.dice.len();
        for die in self.dice.drain(..) {
            self.registry.remove(&die.name, &mut self.renderer, &mut self.world);
        }

        debug!(count, "dice cleared");
        self.log.log(RollEvent::DiceCleared {
            tick: self.clock.current_tick(),
            count,
        });
        self.dice_set_changed();
        true
    }

    // ========================================================================
    // Desired Outcome
    // ========================================================================

    /// Set what the next predicted rolls should land on
    ///
    /// # Errors
    ///
    /// The outcome must fit the current dice: one in-range value per die, or
    /// a reachable total.
    pub fn set_desired_outcome(&mut self, desired: DesiredOutcome) -> Result<(), DiceBoxError> {
        self.check_desired(&desired)?;
        self.desired = desired;
        Ok(())
    }

    fn check_desired(&self, desired: &DesiredOutcome) -> Result<(), DiceBoxError> {
        match desired {
            DesiredOutcome::Random => Ok(()),
            DesiredOutcome::Values(values) => {
                if values.len() != self.dice.len() {
                    return Err(DiceBoxError::OutcomeArity {
                        expected: self.dice.len(),
                        got: values.len(),
                    });
                }
                for (die, &value) in self.dice.iter().zip(values) {
                    self.catalog.kind(die.die_type).check_value(value)?;
                }
                Ok(())
            }
            DesiredOutcome::Total(total) => {
                let min = self.dice.len() as u32;
                let max: u32 = self.dice.iter().map(|d| d.die_type.face_count()).sum();
                if *total < min || *total > max {
                    return Err(DiceBoxError::TotalOutOfRange {
                        total: *total,
                        min,
                        max,
                    });
                }
                Ok(())
            }
        }
    }

    /// Desired value per die for the roll about to start
    fn resolve_desired(&mut self) -> Vec<u32> {
        let desired = match self.check_desired(&self.desired) {
            Ok(()) => self.desired.clone(),
            Err(e) => {
                warn!(error = %e, "desired outcome no longer fits the dice, rolling random");
                DesiredOutcome::Random
            }
        };

        match desired {
            DesiredOutcome::Values(values) => values,
            DesiredOutcome::Random => self
                .dice
                .iter()
                .map(|d| self.seed_source.next_int(1, d.die_type.face_count() as i64 + 1) as u32)
                .collect(),
            DesiredOutcome::Total(total) => {
                let faces: Vec<u32> = self.dice.iter().map(|d| d.die_type.face_count()).collect();
                split_total(total, &faces, &mut self.seed_source)
            }
        }
    }

    // ========================================================================
    // Roll Control
    // ========================================================================

    /// Start a roll with a fresh seed from the session stream
    ///
    /// Returns `false` (and changes nothing) while a roll is in flight.
    pub fn start(&mut self, predicted: bool) -> bool {
        if self.locked {
            debug!(predicted, "start rejected: roll in progress");
            return false;
        }
        let seed = self.seed_source.next();
        self.start_with_seed(predicted, seed)
    }

    /// Start a roll with an explicit seed
    pub fn start_with_seed(&mut self, predicted: bool, seed: i64) -> bool {
        if self.locked {
            debug!(predicted, "start rejected: roll in progress");
            return false;
        }

        self.rng.set_seed(seed);
        let seed = self.rng.seed();
        let roll_id = Uuid::new_v4().to_string();

        info!(
            roll_id = %roll_id,
            seed,
            predicted,
            dice = self.dice.len(),
            "roll started"
        );
        self.log.log(RollEvent::RollStarted {
            tick: 0,
            roll_id: roll_id.clone(),
            seed,
            predicted,
            dice: self.dice.len(),
        });

        self.outcome = None;
        self.resume_phase = None;
        self.prediction_trace = None;
        self.replay_trace = None;
        self.roll_seed = Some(seed);

        let mut roll = ActiveRoll {
            id: roll_id,
            seed,
            predicted,
            natural: None,
            capped: false,
            rigs: Vec::new(),
            deadline: None,
        };

        if predicted {
            let desired = self.resolve_desired();

            self.phase = RollPhase::Predicting;
            let (natural, end_tick, capped) = self.predict(&roll.id, seed);

            self.phase = RollPhase::Rigging;
            roll.rigs = self.rig_dice(&natural, &desired);
            roll.natural = Some(natural);
            roll.capped = capped;
            roll.deadline = capped.then_some(end_tick);

            self.phase = RollPhase::Replaying;
            self.log.log(RollEvent::ReplayStarted {
                tick: 0,
                roll_id: roll.id.clone(),
                seed,
            });
        } else {
            self.phase = RollPhase::Rolling;
        }

        self.throw_dice(seed, self.config.stop.visible_window_ticks);
        if self.config.record_trajectories {
            self.replay_trace = Some(Trajectory::new());
        }
        self.roll = Some(roll);
        self.locked = true;
        self.frame_pending = true;
        true
    }

    /// Show a recorded roll again
    ///
    /// Rebuilds the recorded dice set with the recorded labels and plays
    /// the visible pass from the recorded seed. Returns `Ok(false)` while a
    /// roll is in flight.
    ///
    /// # Errors
    ///
    /// The record must be consistent and made under a config with the same
    /// [`DiceBoxConfig::replay_fingerprint`].
    pub fn replay_record(&mut self, record: &RollRecord) -> Result<bool, DiceBoxError> {
        if self.locked {
            debug!("replay_record rejected: roll in progress");
            return Ok(false);
        }
        if record.config_hash != self.config_hash {
            return Err(DiceBoxError::ConfigMismatch {
                recorded: record.config_hash.clone(),
                current: self.config_hash.clone(),
            });
        }
        record.validate()?;

        self.clear_dice();
        for recorded in &record.dice {
            self.add_dice(recorded.die_type);
        }
        for (die, recorded) in self.dice.iter_mut().zip(&record.dice) {
            let kind = self.catalog.kind(die.die_type);
            if let Some(entity) = self.registry.get_mut(&die.name) {
                kind.rig(entity.mesh_mut(), 1, 1 + recorded.label_offset)?;
                die.label_offset = recorded.label_offset;
            }
        }

        self.rng.set_seed(record.seed);
        let seed = self.rng.seed();
        let roll_id = Uuid::new_v4().to_string();
        info!(
            roll_id = %roll_id,
            recorded = %record.roll_id,
            seed,
            "replaying recorded roll"
        );
        self.log.log(RollEvent::RollStarted {
            tick: 0,
            roll_id: roll_id.clone(),
            seed,
            predicted: false,
            dice: self.dice.len(),
        });

        self.outcome = None;
        self.resume_phase = None;
        self.prediction_trace = None;
        self.replay_trace = self.config.record_trajectories.then(Trajectory::new);
        self.roll_seed = Some(seed);
        self.roll = Some(ActiveRoll {
            id: roll_id,
            seed,
            predicted: record.predicted,
            natural: record.natural.clone(),
            capped: record.capped,
            rigs: Vec::new(),
            deadline: record.capped.then_some(record.ticks),
        });

        self.phase = RollPhase::Replaying;
        self.throw_dice(seed, self.config.stop.visible_window_ticks);
        self.locked = true;
        self.frame_pending = true;
        Ok(true)
    }

    /// Cancel the roll in flight and unlock; the outcome stays unset
    pub fn stop(&mut self) -> bool {
        if !self.frame_pending || !self.is_rolling() {
            return false;
        }

        self.resume_phase = Some(self.phase);
        self.phase = RollPhase::Cancelled;
        self.locked = false;
        self.frame_pending = false;

        let roll_id = self.roll.as_ref().map(|r| r.id.clone()).unwrap_or_default();
        info!(roll_id = %roll_id, tick = self.clock.current_tick(), "roll stopped");
        self.log.log(RollEvent::RollStopped {
            tick: self.clock.current_tick(),
            roll_id,
        });
        true
    }

    /// Re-enter the frame loop without resetting anything
    ///
    /// A cancelled roll resumes (and locks again). Otherwise one refresh
    /// frame is scheduled. Returns `false` if a frame is already pending.
    pub fn continue_run(&mut self) -> bool {
        if self.frame_pending {
            return false;
        }

        match self.resume_phase.take() {
            Some(phase) if self.phase == RollPhase::Cancelled && self.roll.is_some() => {
                info!(tick = self.clock.current_tick(), "roll continued");
                self.phase = phase;
                self.locked = true;
            }
            _ => debug!("refresh frame scheduled"),
        }
        self.frame_pending = true;
        true
    }

    /// Register a callback fired with the outcome of every settled roll
    pub fn on_settled(&mut self, callback: impl FnMut(&RollOutcome) + 'static) {
        self.settled_callbacks.push(Box::new(callback));
    }

    // ========================================================================
    // Frame Loop
    // ========================================================================

    /// Advance one frame: step, update, render, then check for settle
    pub fn run(&mut self) -> FrameStatus {
        if !self.frame_pending {
            return self.status();
        }

        self.step_world();
        let tick = self.clock.current_tick();

        self.registry
            .update_entities(self.dice.iter().map(|d| d.name.as_str()), &mut self.world);
        let poses = self.body_poses();
        if let Some(trace) = self.replay_trace.as_mut() {
            trace.push(poses);
        }

        let frame = Frame {
            tick,
            camera: &self.config.camera,
            meshes: self.registry.scene_meshes(),
        };
        self.renderer.render_frame(&frame);

        if !self.is_rolling() {
            self.frame_pending = false;
            return self.status();
        }

        let all_stopped = self.observe_dice(tick, true);
        let deadline_hit = self
            .roll
            .as_ref()
            .and_then(|r| r.deadline)
            .is_some_and(|deadline| tick >= deadline);

        if all_stopped || deadline_hit {
            if deadline_hit && !all_stopped {
                warn!(tick, "replay ended at the capped prediction's last tick");
            }
            self.finish_roll(tick);
        }
        self.status()
    }

    /// Call [`DiceBox::run`] until the roll settles or `max_frames` pass
    pub fn run_until_settled(&mut self, max_frames: usize) -> Option<&RollOutcome> {
        for _ in 0..max_frames {
            match self.run() {
                FrameStatus::Running => continue,
                FrameStatus::Settled => return self.outcome.as_ref(),
                FrameStatus::Idle | FrameStatus::Cancelled => return None,
            }
        }
        None
    }

    fn status(&self) -> FrameStatus {
        match self.phase {
            RollPhase::Settled => FrameStatus::Settled,
            RollPhase::Cancelled => FrameStatus::Cancelled,
            RollPhase::Rolling | RollPhase::Replaying if self.frame_pending => FrameStatus::Running,
            _ => FrameStatus::Idle,
        }
    }

    fn is_rolling(&self) -> bool {
        matches!(self.phase, RollPhase::Rolling | RollPhase::Replaying)
    }

    // ========================================================================
    // Roll Internals
    // ========================================================================

    fn step_world(&mut self) {
        self.world.step(self.clock.time_step());
        self.clock.advance_tick();
    }

    /// Re-seed the physics stream and throw every die from the spawn grid
    fn throw_dice(&mut self, seed: i64, window: usize) {
        self.rng.set_seed(seed);
        self.clock.reset();

        let throw = &self.config.throw;
        let count = self.dice.len();
        for (index, die) in self.dice.iter().enumerate() {
            let jitter = Vec3::new(
                self.rng.next_signed(throw.spawn_jitter),
                self.rng.next_signed(throw.spawn_jitter),
                0.0,
            );
            let orientation = Quat::from_euler(
                EulerRot::XYZ,
                self.rng.next_signed(PI),
                self.rng.next_signed(PI),
                self.rng.next_signed(PI),
            )
            .normalize();
            let linear = Vec3::new(
                self.rng.next_signed(throw.linear_speed),
                self.rng.next_signed(throw.linear_speed),
                0.0,
            );
            let angular = Vec3::new(
                self.rng.next_signed(throw.angular_speed),
                self.rng.next_signed(throw.angular_speed),
                self.rng.next_signed(throw.angular_speed),
            );

            let Some(entity) = self.registry.get_mut(&die.name) else {
                warn!(die = %die.name, "die missing from registry");
                continue;
            };
            entity.place(
                BodyPose {
                    position: spawn_cell(throw, index, count) + jitter,
                    orientation,
                },
                linear,
                angular,
                &mut self.world,
            );
            if let Some(state) = entity.die_mut() {
                state.detector.reset();
                state.detector.set_window(window);
            }
        }
    }

    /// Silent pass; returns natural values, last tick and whether the cap hit
    fn predict(&mut self, roll_id: &str, seed: i64) -> (Vec<u32>, usize, bool) {
        self.throw_dice(seed, self.config.stop.predict_window_ticks);
        let mut trace = self.config.record_trajectories.then(Trajectory::new);

        let capped = loop {
            self.step_world();
            let tick = self.clock.current_tick();
            for die in &self.dice {
                if let Some(entity) = self.registry.get_mut(&die.name) {
                    entity.sync_pose(&self.world);
                }
            }
            if let Some(trace) = trace.as_mut() {
                trace.push(self.body_poses());
            }
            if self.observe_dice(tick, false) {
                break false;
            }
            if self.clock.reached(self.config.tick_cap) {
                break true;
            }
        };

        let end_tick = self.clock.current_tick();
        let natural = self.read_values();
        if capped {
            warn!(
                roll_id,
                tick_cap = self.config.tick_cap,
                ?natural,
                "prediction hit the tick cap, reading dice mid-motion"
            );
            self.log.log(RollEvent::PredictionCapped {
                tick: end_tick,
                roll_id: roll_id.to_string(),
                natural: natural.clone(),
            });
        } else {
            debug!(roll_id, tick = end_tick, ?natural, "prediction settled");
            self.log.log(RollEvent::PredictionFinished {
                tick: end_tick,
                roll_id: roll_id.to_string(),
                natural: natural.clone(),
            });
        }

        self.prediction_trace = trace;
        (natural, end_tick, capped)
    }

    /// Relabel every die from its natural value to its desired value
    fn rig_dice(&mut self, natural: &[u32], desired: &[u32]) -> Vec<RigRecord> {
        let tick = self.clock.current_tick();
        let mut rigs = Vec::new();

        for ((die, &from), &to) in self.dice.iter_mut().zip(natural).zip(desired) {
            let kind = self.catalog.kind(die.die_type);
            let Some(entity) = self.registry.get_mut(&die.name) else {
                warn!(die = %die.name, "die missing from registry");
                continue;
            };

            match kind.rig(entity.mesh_mut(), from, to) {
                Ok(()) => {
                    let faces = i64::from(kind.face_count());
                    let shifted = i64::from(die.label_offset) + i64::from(to) - i64::from(from);
                    die.label_offset = shifted.rem_euclid(faces) as u32;

                    debug!(die = %die.name, from, to, "die rigged");
                    self.log.log(RollEvent::DieRigged {
                        tick,
                        die: die.name.clone(),
                        from,
                        to,
                    });
                    rigs.push(RigRecord {
                        die: die.name.clone(),
                        from,
                        to,
                    });
                }
                Err(e) => warn!(die = %die.name, error = %e, "rig skipped"),
            }
        }
        rigs
    }

    /// Feed every die's velocities to its stop detector; `true` once all
    /// dice are stopped
    fn observe_dice(&mut self, tick: usize, visible: bool) -> bool {
        let mut all_stopped = true;

        for die in &self.dice {
            let Some(entity) = self.registry.get_mut(&die.name) else {
                continue;
            };
            let Some((linear, angular)) = entity
                .body(&self.world)
                .map(|b| (b.linear_velocity, b.angular_velocity))
            else {
                warn!(die = %die.name, "die has no body");
                continue;
            };
            let Some(state) = entity.die_mut() else {
                continue;
            };

            let transition = state.detector.observe(tick, linear, angular);
            all_stopped &= state.detector.is_stopped();

            if visible && transition == StopTransition::Settled {
                let value = self.catalog.kind(die.die_type).read_up_face(entity.mesh());
                debug!(die = %die.name, tick, ?value, "die settled");
                self.log.log(RollEvent::DieSettled {
                    tick,
                    die: die.name.clone(),
                    value,
                });
                if let Some(value) = value {
                    entity.emit(
                        EntityEvent::Settled,
                        &EventPayload::Value { tick, value },
                        &mut self.world,
                    );
                }
            }
        }
        all_stopped
    }

    fn read_values(&self) -> Vec<u32> {
        self.dice
            .iter()
            .map(|die| {
                let value = self
                    .registry
                    .get(&die.name)
                    .and_then(|e| self.catalog.kind(die.die_type).read_up_face(e.mesh()));
                value.unwrap_or_else(|| {
                    warn!(die = %die.name, "no face readable, counting 0");
                    0
                })
            })
            .collect()
    }

    fn body_poses(&self) -> Vec<BodyPose> {
        self.dice
            .iter()
            .filter_map(|d| self.registry.get(&d.name))
            .filter_map(|e| e.body(&self.world))
            .map(|b| b.pose())
            .collect()
    }

    fn finish_roll(&mut self, tick: usize) {
        let Some(roll) = self.roll.take() else {
            warn!(tick, "settle without a roll in flight");
            return;
        };

        let values = self.read_values();
        let total: u32 = values.iter().sum();
        let outcome = RollOutcome {
            roll_id: roll.id.clone(),
            seed: roll.seed,
            predicted: roll.predicted,
            values: values.clone(),
            total,
            natural: roll.natural.clone(),
            ticks: tick,
            capped: roll.capped,
        };

        self.locked = false;
        self.frame_pending = false;
        self.phase = RollPhase::Settled;

        info!(roll_id = %roll.id, ?values, total, ticks = tick, "roll settled");
        self.log.log(RollEvent::RollSettled {
            tick,
            roll_id: roll.id.clone(),
            values,
            total,
        });

        self.check_replay(&roll.id, tick);

        self.last_record = Some(RollRecord {
            roll_id: roll.id,
            seed: roll.seed,
            predicted: roll.predicted,
            dice: self
                .dice
                .iter()
                .map(|d| RecordedDie {
                    die_type: d.die_type,
                    label_offset: d.label_offset,
                })
                .collect(),
            rigs: roll.rigs,
            natural: roll.natural,
            values: outcome.values.clone(),
            total,
            ticks: tick,
            capped: roll.capped,
            trajectory_digest: self.replay_trace.as_ref().map(Trajectory::digest),
            config_hash: self.config_hash.clone(),
        });

        for callback in self.settled_callbacks.iter_mut() {
            callback(&outcome);
        }
        self.outcome = Some(outcome);
    }

    /// Compare the silent and visible trajectories over their common ticks
    fn check_replay(&mut self, roll_id: &str, tick: usize) {
        let (Some(predicted), Some(replayed)) = (&self.prediction_trace, &self.replay_trace) else {
            return;
        };
        let Some(at) = predicted.first_divergence(replayed) else {
            return;
        };

        let common = predicted.len().min(replayed.len());
        let predicted_digest = predicted.digest_prefix(common);
        let replay_digest = replayed.digest_prefix(common);
        warn!(
            roll_id,
            diverged_at = at,
            predicted = %predicted_digest,
            replayed = %replay_digest,
            "replay diverged from prediction"
        );
        self.log.log(RollEvent::ReplayDiverged {
            tick,
            roll_id: roll_id.to_string(),
            predicted_digest,
            replay_digest,
        });
    }
}

impl<W: PhysicsWorld, R: Renderer> std::fmt::Debug for DiceBox<W, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiceBox")
            .field("dice", &self.dice)
            .field("phase", &self.phase)
            .field("locked", &self.locked)
            .field("frame_pending", &self.frame_pending)
            .field("roll_seed", &self.roll_seed)
            .field("outcome", &self.outcome)
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Centre of spawn grid cell `index` when `count` dice are thrown
fn spawn_cell(throw: &ThrowConfig, index: usize, count: usize) -> Vec3 {
    let columns = count.clamp(1, SPAWN_COLUMNS);
    let rows = count.div_ceil(SPAWN_COLUMNS).max(1);
    let column = index % SPAWN_COLUMNS;
    let row = index / SPAWN_COLUMNS;
    Vec3::new(
        (column as f32 - (columns - 1) as f32 / 2.0) * throw.spacing,
        (row as f32 - (rows - 1) as f32 / 2.0) * throw.spacing,
        throw.spawn_height,
    )
}

/// Split `total` into one value per die, each within `1..=faces[i]`
///
/// Every die starts at 1; the remainder is handed out one pip at a time to
/// a randomly drawn die that still has room. The caller guarantees
/// `faces.len() <= total <= faces.iter().sum()`.
fn split_total(total: u32, faces: &[u32], rng: &mut DiceRng) -> Vec<u32> {
    let mut values = vec![1u32; faces.len()];
    let mut remaining = total.saturating_sub(faces.len() as u32);

    while remaining > 0 {
        let open: Vec<usize> = (0..faces.len()).filter(|&i| values[i] < faces[i]).collect();
        if open.is_empty() {
            break;
        }
        let pick = open[rng.next_int(0, open.len() as i64) as usize];
        values[pick] += 1;
        remaining -= 1;
    }
    values
}
