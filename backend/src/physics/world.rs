//! Reference physics world
//!
//! A small deterministic rigid-body integrator: gravity, a floor at `z = 0`,
//! four arena walls, vertex-vs-plane contacts resolved with accumulated
//! sequential impulses, and bounding-sphere contacts between bodies.
//!
//! Bodies are kept in a vector sorted by handle, so every step visits them
//! in the same order and floating-point results repeat exactly.

use super::{BodyHandle, PhysicsWorld, RigidBody};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Tuning of the reference world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity acceleration (m/s²); the default points down the Z axis
    pub gravity: Vec3,
    /// Bounciness of impacts faster than `rest_speed`
    pub restitution: f32,
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Walls stand at `±arena_half_extent` on X and Y
    pub arena_half_extent: f32,
    /// Sequential-impulse passes per contact plane
    pub solver_iterations: usize,
    /// Impacts slower than this are treated as inelastic (m/s)
    pub rest_speed: f32,
    /// Fraction of the bounding radius used for body-body contacts
    pub body_contact_scale: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.82),
            restitution: 0.35,
            friction: 0.45,
            arena_half_extent: 6.0,
            solver_iterations: 8,
            rest_speed: 0.6,
            body_contact_scale: 0.8,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    handle: BodyHandle,
    body: RigidBody,
}

/// Deterministic reference implementation of [`PhysicsWorld`]
#[derive(Debug, Clone)]
pub struct SimpleWorld {
    config: WorldConfig,
    slots: Vec<Slot>,
    next_handle: u64,
}

/// An infinite plane `normal · p >= offset` bounding the arena
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vec3,
    offset: f32,
}

impl SimpleWorld {
    /// Create an empty world
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            next_handle: 1,
        }
    }

    /// World tuning
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Handles of all bodies, in stepping order
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.slots.iter().map(|s| s.handle).collect()
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.slots.binary_search_by_key(&handle, |s| s.handle).ok()
    }

    fn planes(&self) -> [Plane; 5] {
        let l = self.config.arena_half_extent;
        [
            Plane {
                normal: Vec3::Z,
                offset: 0.0,
            },
            Plane {
                normal: Vec3::X,
                offset: -l,
            },
            Plane {
                normal: Vec3::NEG_X,
                offset: -l,
            },
            Plane {
                normal: Vec3::Y,
                offset: -l,
            },
            Plane {
                normal: Vec3::NEG_Y,
                offset: -l,
            },
        ]
    }

    fn integrate(body: &mut RigidBody, gravity: Vec3, dt: f32) {
        body.linear_velocity += gravity * dt;
        body.linear_velocity *= (1.0 - body.linear_damping).clamp(0.0, 1.0).powf(dt);
        body.angular_velocity *= (1.0 - body.angular_damping).clamp(0.0, 1.0).powf(dt);

        body.position += body.linear_velocity * dt;

        let w = body.angular_velocity;
        let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * body.orientation;
        body.orientation = (body.orientation + spin * (0.5 * dt)).normalize();
    }

    fn resolve_plane(&self, body: &mut RigidBody, plane: Plane) {
        let inv_mass = 1.0 / body.mass;
        let inv_inertia = inverse_inertia(body);

        // Lever arms of every hull vertex below the plane
        let mut contacts: Vec<Vec3> = Vec::new();
        let mut deepest = 0.0f32;
        for vertex in body.shape.vertices() {
            let arm = body.orientation * *vertex;
            let distance = plane.normal.dot(body.position + arm) - plane.offset;
            if distance < 0.0 {
                contacts.push(arm);
                deepest = deepest.min(distance);
            }
        }
        if contacts.is_empty() {
            return;
        }

        body.position -= plane.normal * deepest;

        let n = plane.normal;
        let targets: Vec<f32> = contacts
            .iter()
            .map(|arm| {
                let vn = (body.linear_velocity + body.angular_velocity.cross(*arm)).dot(n);
                if vn < -self.config.rest_speed {
                    -self.config.restitution * vn
                } else {
                    0.0
                }
            })
            .collect();
        let mut accumulated = vec![0.0f32; contacts.len()];

        for _ in 0..self.config.solver_iterations {
            for (i, arm) in contacts.iter().enumerate() {
                let rn = arm.cross(n);
                let k = inv_mass + inv_inertia * rn.length_squared();
                let vn = (body.linear_velocity + body.angular_velocity.cross(*arm)).dot(n);
                let delta = (targets[i] - vn) / k;
                let total = (accumulated[i] + delta).max(0.0);
                let jn = total - accumulated[i];
                accumulated[i] = total;
                body.linear_velocity += n * (jn * inv_mass);
                body.angular_velocity += rn * (jn * inv_inertia);

                let vp = body.linear_velocity + body.angular_velocity.cross(*arm);
                let vt = vp - n * vp.dot(n);
                let slip = vt.length();
                if slip > 1e-6 {
                    let t = vt / slip;
                    let rt = arm.cross(t);
                    let kt = inv_mass + inv_inertia * rt.length_squared();
                    let limit = self.config.friction * accumulated[i];
                    let jt = (-slip / kt).max(-limit);
                    body.linear_velocity += t * (jt * inv_mass);
                    body.angular_velocity += rt * (jt * inv_inertia);
                }
            }
        }
    }

    fn resolve_pair(&self, a: &mut RigidBody, b: &mut RigidBody) {
        let scale = self.config.body_contact_scale;
        let reach = (a.shape.radius() + b.shape.radius()) * scale;
        let offset = b.position - a.position;
        let distance = offset.length();
        if distance >= reach || distance <= 1e-6 {
            return;
        }

        let n = offset / distance;
        let inv_a = 1.0 / a.mass;
        let inv_b = 1.0 / b.mass;
        let share = (reach - distance) / (inv_a + inv_b);
        a.position -= n * (share * inv_a);
        b.position += n * (share * inv_b);

        let closing = (b.linear_velocity - a.linear_velocity).dot(n);
        if closing < 0.0 {
            let j = -(1.0 + self.config.restitution) * closing / (inv_a + inv_b);
            a.linear_velocity -= n * (j * inv_a);
            b.linear_velocity += n * (j * inv_b);
        }
    }
}

/// Scalar inverse inertia of a solid body filling its bounding radius
fn inverse_inertia(body: &RigidBody) -> f32 {
    let r = body.shape.radius().max(1e-3);
    1.0 / (body.mass * r * r * 2.0 / 9.0)
}

impl Default for SimpleWorld {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl PhysicsWorld for SimpleWorld {
    fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.slots.push(Slot { handle, body });
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        self.index_of(handle).map(|i| self.slots.remove(i).body)
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.index_of(handle).map(|i| &self.slots[i].body)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        match self.index_of(handle) {
            Some(i) => Some(&mut self.slots[i].body),
            None => None,
        }
    }

    fn step(&mut self, dt: f32) {
        let gravity = self.config.gravity;
        let planes = self.planes();

        let mut slots = std::mem::take(&mut self.slots);

        for slot in slots.iter_mut().filter(|s| s.body.is_dynamic()) {
            Self::integrate(&mut slot.body, gravity, dt);
        }

        for i in 0..slots.len() {
            let (head, tail) = slots.split_at_mut(i + 1);
            let a = &mut head[i].body;
            if !a.is_dynamic() {
                continue;
            }
            for other in tail.iter_mut().filter(|s| s.body.is_dynamic()) {
                self.resolve_pair(a, &mut other.body);
            }
        }

        for slot in slots.iter_mut().filter(|s| s.body.is_dynamic()) {
            for plane in planes {
                self.resolve_plane(&mut slot.body, plane);
            }
        }

        self.slots = slots;
    }

    fn body_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ConvexShape;
    use std::sync::Arc;

    fn cube_body() -> RigidBody {
        let mut body = RigidBody::new(Arc::new(ConvexShape::cuboid(Vec3::splat(0.5))), 1.0);
        body.linear_damping = 0.1;
        body.angular_damping = 0.1;
        body
    }

    #[test]
    fn test_handles_are_unique_and_ordered() {
        let mut world = SimpleWorld::default();
        let a = world.add_body(cube_body());
        let b = world.add_body(cube_body());
        assert!(a < b);
        assert_eq!(world.handles(), vec![a, b]);

        assert!(world.remove_body(a).is_some());
        assert!(world.remove_body(a).is_none());
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_dropped_cube_comes_to_rest_on_floor() {
        let mut world = SimpleWorld::default();
        let mut body = cube_body();
        body.position = Vec3::new(0.0, 0.0, 2.0);
        let handle = world.add_body(body);

        for _ in 0..600 {
            world.step(1.0 / 60.0);
        }

        let body = world.body(handle).unwrap();
        assert!((body.position.z - 0.5).abs() < 0.05, "z = {}", body.position.z);
        assert!(body.linear_velocity.length_squared() < 0.045);
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut world = SimpleWorld::default();
        let mut body = cube_body();
        body.mass = 0.0;
        body.position = Vec3::new(0.0, 0.0, 3.0);
        let handle = world.add_body(body);

        world.step(1.0 / 60.0);
        assert_eq!(world.body(handle).unwrap().position, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_step_is_deterministic() {
        let build = || {
            let mut world = SimpleWorld::default();
            let mut body = cube_body();
            body.position = Vec3::new(0.3, -0.2, 3.0);
            body.angular_velocity = Vec3::new(7.0, -3.0, 11.0);
            body.linear_velocity = Vec3::new(2.0, 1.0, 0.0);
            let handle = world.add_body(body);
            (world, handle)
        };
        let (mut w1, h1) = build();
        let (mut w2, h2) = build();
        for _ in 0..300 {
            w1.step(1.0 / 60.0);
            w2.step(1.0 / 60.0);
            let (a, b) = (w1.body(h1).unwrap(), w2.body(h2).unwrap());
            assert_eq!(a.position.to_array(), b.position.to_array());
            assert_eq!(a.orientation.to_array(), b.orientation.to_array());
        }
    }
}
