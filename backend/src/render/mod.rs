//! Rendering contract
//!
//! The dice box tells a [`Renderer`] which meshes enter and leave the scene
//! and hands it one [`Frame`] per visible tick. Drawing, textures and the
//! window belong to the host.

use crate::dice::MaterialSet;
use crate::geometry::Geometry;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifier of a mesh within one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeshId(pub u64);

/// A drawable polyhedron with its transform and label set
#[derive(Debug, Clone)]
pub struct Mesh {
    pub id: MeshId,
    /// Shared until a per-entity edit (rigging) clones it
    pub geometry: Arc<Geometry>,
    pub materials: Arc<MaterialSet>,
    /// Active texture-set variant within `materials`
    pub variant: usize,
    pub position: Vec3,
    pub orientation: Quat,
}

impl Mesh {
    pub fn new(id: MeshId, geometry: Arc<Geometry>, materials: Arc<MaterialSet>) -> Self {
        Self {
            id,
            geometry,
            materials,
            variant: 0,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

/// Perspective camera looking at the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 20.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
        }
    }
}

/// Everything needed to draw one tick
pub struct Frame<'a> {
    pub tick: usize,
    pub camera: &'a Camera,
    pub meshes: Vec<&'a Mesh>,
}

/// Host-side drawing backend
pub trait Renderer {
    /// A mesh joined the scene
    fn add_to_scene(&mut self, mesh: &Mesh);

    /// A mesh left the scene
    fn remove_from_scene(&mut self, mesh: MeshId);

    /// Draw one frame
    fn render_frame(&mut self, frame: &Frame<'_>);
}

/// Renderer that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn add_to_scene(&mut self, _mesh: &Mesh) {}

    fn remove_from_scene(&mut self, _mesh: MeshId) {}

    fn render_frame(&mut self, _frame: &Frame<'_>) {}
}

/// What a [`RecordingRenderer`] saw for one mesh in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnMesh {
    pub id: MeshId,
    pub position: Vec3,
    pub orientation: Quat,
    pub variant: usize,
}

/// Headless renderer that keeps the scene membership and every frame drawn
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    scene: Vec<MeshId>,
    frames: Vec<(usize, Vec<DrawnMesh>)>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meshes currently in the scene, in insertion order
    pub fn scene(&self) -> &[MeshId] {
        &self.scene
    }

    /// Frames drawn so far as `(tick, meshes)`
    pub fn frames(&self) -> &[(usize, Vec<DrawnMesh>)] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn add_to_scene(&mut self, mesh: &Mesh) {
        if !self.scene.contains(&mesh.id) {
            self.scene.push(mesh.id);
        }
    }

    fn remove_from_scene(&mut self, mesh: MeshId) {
        self.scene.retain(|id| *id != mesh);
    }

    fn render_frame(&mut self, frame: &Frame<'_>) {
        let drawn = frame
            .meshes
            .iter()
            .map(|m| DrawnMesh {
                id: m.id,
                position: m.position,
                orientation: m.orientation,
                variant: m.variant,
            })
            .collect();
        self.frames.push((frame.tick, drawn));
    }
}
