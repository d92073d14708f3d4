//! Orchestrator - the dice box and its roll bookkeeping
//!
//! See `engine.rs` for the roll protocol.

pub mod engine;
pub mod record;
pub mod trace;

// Re-export main types for convenience
pub use engine::{
    ActiveDie, DesiredOutcome, DiceBox, DiceBoxConfig, DiceBoxError, FrameStatus, RollOutcome,
    RollPhase, StopConfig, ThrowConfig, DEFAULT_TICK_CAP,
};

// Re-export record types
pub use record::{compute_config_hash, RecordError, RecordedDie, RigRecord, RollRecord};
pub use trace::Trajectory;
