//! The d4
//!
//! A tetrahedron lands on a face, so its value is read from the face
//! pointing down. Each face texture prints three numbers around its corners;
//! relabeling the faces also means rotating which texture set is shown.

use super::{rig_offset, shift_labels, DieError, DieKind, DieType, FaceLabel, MaterialSet};
use crate::geometry::{ConvexShape, Geometry, GeometrySource};
use crate::render::Mesh;
use std::sync::Arc;

/// Corner labels per texture variant, indexed by material slot
const CORNER_LABELS: [[[u32; 3]; 5]; 4] = [
    [[0, 0, 0], [2, 4, 3], [1, 3, 4], [2, 1, 4], [1, 2, 3]],
    [[0, 0, 0], [2, 3, 4], [3, 1, 4], [2, 4, 1], [3, 2, 1]],
    [[0, 0, 0], [4, 3, 2], [3, 4, 1], [4, 2, 1], [3, 1, 2]],
    [[0, 0, 0], [4, 2, 3], [1, 4, 3], [4, 1, 2], [1, 3, 2]],
];

/// The four d4 texture variants
pub fn corner_materials() -> MaterialSet {
    let variants = CORNER_LABELS
        .iter()
        .map(|slots| {
            std::iter::once(FaceLabel::Blank)
                .chain(slots.iter().map(|corners| FaceLabel::Corners(*corners)))
                .collect()
        })
        .collect();
    MaterialSet::with_variants(variants)
}

#[derive(Debug, Clone)]
pub struct TetrahedralDie {
    geometry: Arc<Geometry>,
    shape: Arc<ConvexShape>,
    materials: Arc<MaterialSet>,
}

impl TetrahedralDie {
    pub fn new(geometry: impl Into<GeometrySource>, materials: Arc<MaterialSet>) -> Self {
        let geometry = geometry.into().resolve();
        let shape = Arc::new(geometry.to_shape());
        Self {
            geometry,
            shape,
            materials,
        }
    }
}

impl DieKind for TetrahedralDie {
    fn die_type(&self) -> DieType {
        DieType::D4
    }

    fn face_count(&self) -> u32 {
        4
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
        true
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

        // Variant tracks the cumulative offset so rigging back restores it
        let variants = mesh.materials.variant_count() as i64;
        if variants > 0 {
            mesh.variant = (mesh.variant as i64 + offset).rem_euclid(variants) as usize;
        }
        Ok(())
    }
}
