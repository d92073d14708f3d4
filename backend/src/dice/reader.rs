//! Uppermost-face lookup

use crate::geometry::Geometry;
use glam::{Quat, Vec3};

/// The labeled triangle best aligned with the up axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpFace {
    /// Triangle index within the geometry
    pub face_index: usize,
    pub material_index: u32,
    /// Dot product of the rotated normal with the up axis
    pub alignment: f32,
}

/// Find the labeled face whose rotated normal points furthest along `up`
///
/// Background faces never win. Ties keep the earliest face in declaration
/// order. Returns `None` for a mesh without labeled faces.
pub fn up_face(geometry: &Geometry, orientation: Quat, up: Vec3) -> Option<UpFace> {
    let mut best: Option<UpFace> = None;
    for (face_index, face) in geometry.faces().iter().enumerate() {
        if !face.is_labeled() {
            continue;
        }
        let alignment = (orientation * face.normal).dot(up);
        let better = match best {
            Some(current) => alignment > current.alignment,
            None => true,
        };
        if better {
            best = Some(UpFace {
                face_index,
                material_index: face.material_index,
                alignment,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

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
    fn test_identity_reads_top_face() {
        let face = up_face(&cube(), Quat::IDENTITY, Vec3::Z).unwrap();
        // tag 6 -> material 7
        assert_eq!(face.material_index, 7);
        assert!((face.alignment - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_inverted_reads_bottom_face() {
        let face = up_face(&cube(), Quat::IDENTITY, Vec3::NEG_Z).unwrap();
        assert_eq!(face.material_index, 2);
    }

    #[test]
    fn test_rotation_changes_reading() {
        // Rotating +X up onto +Z brings the x = +1 face (tag 2) to the top
        let turn = Quat::from_rotation_y(-FRAC_PI_2);
        let face = up_face(&cube(), turn, Vec3::Z).unwrap();
        assert_eq!(face.material_index, 3);
    }

    #[test]
    fn test_tie_keeps_first_face() {
        // Both triangles of the top quad are equally aligned
        let geometry = cube();
        let face = up_face(&geometry, Quat::IDENTITY, Vec3::Z).unwrap();
        let first_top = geometry
            .faces()
            .iter()
            .position(|f| f.material_index == 7)
            .unwrap();
        assert_eq!(face.face_index, first_top);
    }

    #[test]
    fn test_background_only_mesh_reads_nothing() {
        let geometry = Geometry::from_polygons(
            &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            &[&[0, 1, 2, -1]],
            1.0,
        );
        assert!(up_face(&geometry, Quat::IDENTITY, Vec3::Z).is_none());
    }
}
