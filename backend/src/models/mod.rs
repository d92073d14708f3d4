//! Scene entities, their registry and the roll log

pub mod entity;
pub mod event;
pub mod registry;

// Re-exports
pub use entity::{DieState, Entity, EntityOptions, EventContext, Handler};
pub use event::{RollEvent, RollLog};
pub use registry::EntityRegistry;
