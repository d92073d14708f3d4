//! Rigid-body physics contract
//!
//! The dice box never integrates motion itself; it drives a [`PhysicsWorld`]
//! one fixed step at a time and reads body poses back.
//!
//! # Determinism
//!
//! The predicted-roll protocol assumes `step` is a pure function of the
//! bodies' state and the timestep. Implementations must not consult clocks
//! or unseeded entropy, and must visit bodies in a stable order.
//! [`SimpleWorld`] satisfies this contract.

mod world;

pub use world::{SimpleWorld, WorldConfig};

use crate::geometry::ConvexShape;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque identifier of a body inside a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Position and orientation of a body at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// A dynamic convex rigid body
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// Centre of mass in world space
    pub position: Vec3,
    /// Body-to-world rotation
    pub orientation: Quat,
    /// World-space linear velocity
    pub linear_velocity: Vec3,
    /// World-space angular velocity (radians per second)
    pub angular_velocity: Vec3,
    /// Mass; `0.0` means static
    pub mass: f32,
    /// Fraction of linear velocity lost per second
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second
    pub angular_damping: f32,
    /// Collision hull in body space
    pub shape: Arc<ConvexShape>,
}

impl RigidBody {
    /// Body at rest at the origin
    pub fn new(shape: Arc<ConvexShape>, mass: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass,
            linear_damping: 0.01,
            angular_damping: 0.01,
            shape,
        }
    }

    /// Whether the body is moved by the solver
    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }

    /// Current pose
    pub fn pose(&self) -> BodyPose {
        BodyPose {
            position: self.position,
            orientation: self.orientation,
        }
    }

    /// Teleport the body and overwrite its velocities
    pub fn set_state(&mut self, pose: BodyPose, linear_velocity: Vec3, angular_velocity: Vec3) {
        self.position = pose.position;
        self.orientation = pose.orientation;
        self.linear_velocity = linear_velocity;
        self.angular_velocity = angular_velocity;
    }
}

/// A world that owns bodies and advances them in fixed steps
pub trait PhysicsWorld {
    /// Insert a body and return its handle
    fn add_body(&mut self, body: RigidBody) -> BodyHandle;

    /// Remove a body, returning it if it existed
    fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody>;

    /// Look up a body
    fn body(&self, handle: BodyHandle) -> Option<&RigidBody>;

    /// Look up a body for mutation
    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody>;

    /// Advance every body by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Number of bodies currently in the world
    fn body_count(&self) -> usize;
}
