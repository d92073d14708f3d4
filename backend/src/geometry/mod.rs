//! Convex polyhedron geometry
//!
//! A die mesh is a triangulated convex polyhedron. Every triangle carries a
//! material index: `0` marks background triangles (no printed label), any
//! other value selects a label from the die's material set. Several triangles
//! may share one material index when a printed face is a quad or pentagon.
//!
//! The collision hull ([`ConvexShape`]) is derived from the same vertices so
//! physics and rendering agree on the shape.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Material index reserved for faces without a printed label
pub const BACKGROUND_MATERIAL: u32 = 0;

/// One triangle of a polyhedron mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Vertex indices, counter-clockwise seen from outside
    pub indices: [usize; 3],
    /// Label slot (0 = background)
    pub material_index: u32,
    /// Outward unit normal in body space
    pub normal: Vec3,
}

impl Face {
    /// Whether this face carries a printed label
    pub fn is_labeled(&self) -> bool {
        self.material_index != BACKGROUND_MATERIAL
    }
}

/// Triangulated polyhedron mesh
///
/// Cloning is a deep copy; share it behind an [`Arc`] and clone only when a
/// per-entity edit is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    radius: f32,
}

impl Geometry {
    /// Build a mesh from polygon descriptions
    ///
    /// Each polygon lists its vertex indices followed by a label tag; tag `t`
    /// becomes material index `t + 1`, so a tag of `-1` yields a background
    /// face. Vertices are normalized onto the unit sphere and scaled by
    /// `radius`. Polygons are fan-triangulated from their first vertex.
    ///
    /// # Example
    /// ```
    /// use dice_box_core_rs::Geometry;
    ///
    /// let tetra = Geometry::from_polygons(
    ///     &[[1.0, 1.0, 1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [1.0, -1.0, -1.0]],
    ///     &[&[1, 0, 2, 1], &[0, 1, 3, 2], &[0, 3, 2, 3], &[1, 2, 3, 4]],
    ///     1.0,
    /// );
    /// assert_eq!(tetra.faces().len(), 4);
    /// ```
    pub fn from_polygons(vertices: &[[f32; 3]], polygons: &[&[i32]], radius: f32) -> Self {
        let vertices: Vec<Vec3> = vertices
            .iter()
            .map(|v| Vec3::from_array(*v).normalize_or_zero() * radius)
            .collect();

        let mut faces = Vec::new();
        for polygon in polygons {
            let Some((&tag, corners)) = polygon.split_last() else {
                continue;
            };
            let material_index = (tag + 1).max(0) as u32;
            for j in 1..corners.len().saturating_sub(1) {
                let indices = [
                    corners[0] as usize,
                    corners[j] as usize,
                    corners[j + 1] as usize,
                ];
                let normal = outward_normal(&vertices, indices);
                faces.push(Face {
                    indices,
                    material_index,
                    normal,
                });
            }
        }

        Self {
            vertices,
            faces,
            radius,
        }
    }

    /// Body-space vertices
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangles in declaration order
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Mutable triangles (material relabeling only; topology is fixed)
    pub fn faces_mut(&mut self) -> &mut [Face] {
        &mut self.faces
    }

    /// Bounding sphere radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Outward normal of face `index` rotated into world space
    pub fn face_normal(&self, index: usize, orientation: Quat) -> Option<Vec3> {
        self.faces.get(index).map(|f| orientation * f.normal)
    }

    /// Material indices of all triangles, in declaration order
    pub fn material_indices(&self) -> Vec<u32> {
        self.faces.iter().map(|f| f.material_index).collect()
    }

    /// Convex collision hull sharing this mesh's vertices
    pub fn to_shape(&self) -> ConvexShape {
        ConvexShape {
            vertices: self.vertices.clone(),
            faces: self.faces.iter().map(|f| f.indices).collect(),
            radius: self.radius,
        }
    }
}

/// Normal of triangle `indices`, flipped if needed to point away from the
/// origin (all dice are convex and centred).
fn outward_normal(vertices: &[Vec3], indices: [usize; 3]) -> Vec3 {
    let a = vertices[indices[0]];
    let b = vertices[indices[1]];
    let c = vertices[indices[2]];
    let normal = (c - b).cross(a - b).normalize_or_zero();
    let centroid = (a + b + c) / 3.0;
    if normal.dot(centroid) < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Convex collision hull
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexShape {
    vertices: Vec<Vec3>,
    faces: Vec<[usize; 3]>,
    radius: f32,
}

impl ConvexShape {
    /// Hull built directly from points and triangles
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[usize; 3]>) -> Self {
        let radius = vertices.iter().map(|v| v.length()).fold(0.0, f32::max);
        Self {
            vertices,
            faces,
            radius,
        }
    }

    /// Axis-aligned box with the given half extents
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let vertices = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        let faces = vec![
            [0, 3, 2],
            [0, 2, 1],
            [1, 2, 6],
            [1, 6, 5],
            [0, 1, 5],
            [0, 5, 4],
            [3, 7, 6],
            [3, 6, 2],
            [0, 4, 7],
            [0, 7, 3],
            [4, 5, 6],
            [4, 6, 7],
        ];
        Self::new(vertices, faces)
    }

    /// Hull points in body space
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Hull triangles
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Bounding sphere radius
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// Geometry supplied either ready-made or as a deferred builder
///
/// Resolved exactly once, at construction of the die kind or entity that
/// consumes it.
pub enum GeometrySource {
    /// Shared, already-built mesh
    Geometry(Arc<Geometry>),
    /// Builder invoked on resolution
    Factory(Box<dyn FnOnce() -> Geometry>),
}

impl GeometrySource {
    /// Wrap a builder closure
    pub fn factory(build: impl FnOnce() -> Geometry + 'static) -> Self {
        GeometrySource::Factory(Box::new(build))
    }

    /// Produce the mesh, running the builder if there is one
    pub fn resolve(self) -> Arc<Geometry> {
        match self {
            GeometrySource::Geometry(geometry) => geometry,
            GeometrySource::Factory(build) => Arc::new(build()),
        }
    }
}

impl From<Geometry> for GeometrySource {
    fn from(geometry: Geometry) -> Self {
        GeometrySource::Geometry(Arc::new(geometry))
    }
}

impl From<Arc<Geometry>> for GeometrySource {
    fn from(geometry: Arc<Geometry>) -> Self {
        GeometrySource::Geometry(geometry)
    }
}

impl std::fmt::Debug for GeometrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometrySource::Geometry(g) => f
                .debug_struct("Geometry")
                .field("faces", &g.faces().len())
                .finish(),
            GeometrySource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> Geometry {
        Geometry::from_polygons(
            &[
                [-1.0, -1.0, -1.0],
                [1.0, -1.0, -1.0],
                [1.0, 1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [-1.0, -1.0, 1.0],
                [1.0, -1.0, 1.0],
                [1.0, 1.0, 1.0],
                [-1.0, 1.0, 1.0],
            ],
            &[
                &[0, 3, 2, 1, 1],
                &[1, 2, 6, 5, 2],
                &[0, 1, 5, 4, 3],
                &[3, 7, 6, 2, 4],
                &[0, 4, 7, 3, 5],
                &[4, 5, 6, 7, 6],
            ],
            1.0,
        )
    }

    #[test]
    fn test_quads_are_fan_triangulated() {
        let geometry = cube();
        assert_eq!(geometry.faces().len(), 12);
        assert_eq!(geometry.faces()[0].material_index, 2);
        assert_eq!(geometry.faces()[1].material_index, 2);
    }

    #[test]
    fn test_normals_point_outward() {
        let geometry = cube();
        for face in geometry.faces() {
            let centroid = face
                .indices
                .iter()
                .map(|&i| geometry.vertices()[i])
                .sum::<Vec3>()
                / 3.0;
            assert!(face.normal.dot(centroid) > 0.0);
            assert!((face.normal.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_negative_tag_is_background() {
        let geometry = Geometry::from_polygons(
            &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            &[&[0, 1, 2, -1]],
            1.0,
        );
        assert!(!geometry.faces()[0].is_labeled());
    }

    #[test]
    fn test_factory_source_resolves_once() {
        let source = GeometrySource::factory(cube);
        let geometry = source.resolve();
        assert_eq!(geometry.faces().len(), 12);
    }

    #[test]
    fn test_shape_matches_geometry() {
        let geometry = cube();
        let shape = geometry.to_shape();
        assert_eq!(shape.vertices().len(), 8);
        assert_eq!(shape.faces().len(), 12);
        assert!((shape.radius() - 1.0).abs() < 1e-6);
    }
}
