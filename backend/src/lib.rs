//! Dice Box Core - Rust Engine
//!
//! Deterministic 3D dice rolling with predetermined outcomes.
//!
//! # Architecture
//!
//! - **core**: Fixed-step tick clock
//! - **rng**: Deterministic random number generation (Park-Miller)
//! - **geometry**: Labeled polygon meshes and convex collision hulls
//! - **dice**: Die kinds, the standard catalog, up-face reading and rigging
//! - **physics**: Physics world contract and a deterministic reference world
//! - **render**: Renderer contract plus null and recording renderers
//! - **events**: Per-entity event emitter
//! - **models**: Entities, the entity registry and the roll log
//! - **settle**: Stop detection
//! - **orchestrator**: The dice box (predict, rig, replay)
//!
//! # Critical Invariants
//!
//! 1. Physics advances only in fixed timesteps
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Rigging changes labels only, never geometry or physics

// Module declarations
pub mod core;
pub mod dice;
pub mod events;
pub mod geometry;
pub mod models;
pub mod orchestrator;
pub mod physics;
pub mod render;
pub mod rng;
pub mod settle;

// Re-exports for convenience
pub use crate::core::time::TickClock;
pub use dice::{DieCatalog, DieError, DieKind, DieType, MaterialSet};
pub use geometry::{ConvexShape, Geometry, GeometrySource};
pub use models::{Entity, EntityRegistry, RollEvent, RollLog};
pub use orchestrator::{
    DesiredOutcome, DiceBox, DiceBoxConfig, DiceBoxError, FrameStatus, RollOutcome, RollPhase,
    RollRecord,
};
pub use physics::{PhysicsWorld, SimpleWorld};
pub use render::{NullRenderer, RecordingRenderer, Renderer};
pub use rng::{DiceRng, MODULUS};
pub use settle::StopDetector;
