//! Dice that print one number per face

use super::{rig_offset, shift_labels, DieError, DieKind, DieType, MaterialSet};
use crate::geometry::{ConvexShape, Geometry, GeometrySource};
use crate::render::Mesh;
use std::sync::Arc;

/// A die whose faces each carry a single printed value (d6, d8, d10, d12,
/// d20)
#[derive(Debug, Clone)]
pub struct StandardDie {
    die_type: DieType,
    geometry: Arc<Geometry>,
    shape: Arc<ConvexShape>,
    materials: Arc<MaterialSet>,
    invert_up: bool,
}

impl StandardDie {
    /// Build a die kind, resolving `geometry` immediately
    pub fn new(
        die_type: DieType,
        geometry: impl Into<GeometrySource>,
        materials: Arc<MaterialSet>,
        invert_up: bool,
    ) -> Self {
        let geometry = geometry.into().resolve();
        let shape = Arc::new(geometry.to_shape());
        Self {
            die_type,
            geometry,
            shape,
            materials,
            invert_up,
        }
    }
}

impl DieKind for StandardDie {
    fn die_type(&self) -> DieType {
        self.die_type
    }

    fn face_count(&self) -> u32 {
        self.die_type.face_count()
    }

    fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    fn shape(&self) -> &Arc<ConvexShape> {
        &self.shape
    }

    fn materials(&self) -> &Arc<MaterialSet> {
        &self.materials
    }

    fn invert_up(&self) -> bool {
        self.invert_up
    }

    fn rig(&self, mesh: &mut Mesh, from: u32, to: u32) -> Result<(), DieError> {
        self.check_value(from)?;
        self.check_value(to)?;
        let offset = rig_offset(from, to);
        if offset == 0 {
            return Ok(());
        }
        shift_labels(
            Arc::make_mut(&mut mesh.geometry),
            offset,
            self.face_count(),
            self.label_base(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{numeric_labels, printed_values};
    use crate::render::MeshId;
    use glam::Quat;

    fn d6() -> StandardDie {
        StandardDie::new(
            DieType::D6,
            GeometrySource::factory(crate::dice::catalog::d6_geometry),
            Arc::new(MaterialSet::single(numeric_labels(20))),
            false,
        )
    }

    fn mesh_for(die: &StandardDie) -> Mesh {
        Mesh::new(MeshId(1), die.geometry().clone(), die.materials().clone())
    }

    #[test]
    fn test_rig_moves_top_value() {
        let die = d6();
        let mut mesh = mesh_for(&die);
        assert_eq!(die.read_up_face(&mesh), Some(6));

        die.rig(&mut mesh, 6, 2).unwrap();
        assert_eq!(die.read_up_face(&mesh), Some(2));
        assert_eq!(printed_values(&die, &mesh.geometry).len(), 6);
    }

    #[test]
    fn test_rig_does_not_touch_shared_geometry() {
        let die = d6();
        let mut mesh = mesh_for(&die);
        die.rig(&mut mesh, 1, 4).unwrap();
        assert!(!Arc::ptr_eq(&mesh.geometry, die.geometry()));
        assert_eq!(
            die.read_up_face(&Mesh::new(MeshId(2), die.geometry().clone(), die.materials().clone())),
            Some(6)
        );
    }

    #[test]
    fn test_identity_rig_keeps_sharing() {
        let die = d6();
        let mut mesh = mesh_for(&die);
        die.rig(&mut mesh, 3, 3).unwrap();
        assert!(Arc::ptr_eq(&mesh.geometry, die.geometry()));
    }

    #[test]
    fn test_rig_rejects_out_of_range() {
        let die = d6();
        let mut mesh = mesh_for(&die);
        assert_eq!(
            die.rig(&mut mesh, 0, 3),
            Err(DieError::FaceOutOfRange {
                value: 0,
                face_count: 6
            })
        );
        assert!(die.rig(&mut mesh, 2, 7).is_err());
    }

    #[test]
    fn test_value_of_ignores_background_and_overflow() {
        let die = d6();
        assert_eq!(die.value_of(0), None);
        assert_eq!(die.value_of(1), None);
        assert_eq!(die.value_of(2), Some(1));
        assert_eq!(die.value_of(7), Some(6));
        assert_eq!(die.value_of(8), None);
        assert_eq!(die.material_for(6), 7);
    }

    #[test]
    fn test_orientation_is_used() {
        let die = d6();
        let mut mesh = mesh_for(&die);
        mesh.orientation = Quat::from_rotation_x(std::f32::consts::PI);
        assert_eq!(die.read_up_face(&mesh), Some(1));
    }
}
