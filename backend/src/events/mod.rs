//! Per-entity publish/subscribe
//!
//! Every entity carries an [`EventEmitter`]. Dispatch is two-phase: the
//! listener list is snapshotted before handlers run, and any `on`/`off`/
//! `once` requested while handlers are running is queued and committed after
//! the outermost dispatch returns.

pub mod emitter;
pub mod types;

pub use emitter::{EventEmitter, HandlerId};
pub use types::{EntityEvent, EventPayload};
