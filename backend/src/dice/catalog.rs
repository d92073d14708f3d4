//! Standard polyhedral dice
//!
//! Vertex positions are given unnormalized; [`Geometry::from_polygons`]
//! projects them onto the unit sphere. Every polygon ends with its label
//! tag (`-1` for background).

use super::tetrahedral::corner_materials;
use super::{numeric_labels, DieKind, DieType, MaterialSet, StandardDie, TetrahedralDie};
use crate::geometry::{Geometry, GeometrySource};
use std::f32::consts::PI;
use std::sync::Arc;

/// Highest value in the shared numeric label table
const MAX_LABEL: u32 = 20;

/// Radius of every catalog die
pub const DIE_RADIUS: f32 = 1.0;

pub fn d4_geometry() -> Geometry {
    Geometry::from_polygons(
        &[
            [1.0, 1.0, 1.0],
            [-1.0, -1.0, 1.0],
            [-1.0, 1.0, -1.0],
            [1.0, -1.0, -1.0],
        ],
        &[&[1, 0, 2, 1], &[0, 1, 3, 2], &[0, 3, 2, 3], &[1, 2, 3, 4]],
        DIE_RADIUS,
    )
}

pub fn d6_geometry() -> Geometry {
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
        DIE_RADIUS,
    )
}

pub fn d8_geometry() -> Geometry {
    Geometry::from_polygons(
        &[
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ],
        &[
            &[0, 2, 4, 1],
            &[0, 4, 3, 2],
            &[0, 3, 5, 3],
            &[0, 5, 2, 4],
            &[1, 3, 4, 5],
            &[1, 4, 2, 6],
            &[1, 2, 5, 7],
            &[1, 5, 3, 8],
        ],
        DIE_RADIUS,
    )
}

/// Pentagonal trapezohedron; each kite is one labeled triangle plus one
/// background triangle
pub fn d10_geometry() -> Geometry {
    let step = PI * 2.0 / 10.0;
    let h = 0.105;
    let mut vertices: Vec<[f32; 3]> = (0..10)
        .map(|i| {
            let b = step * i as f32;
            let z = if i % 2 == 1 { h } else { -h };
            [b.cos(), b.sin(), z]
        })
        .collect();
    vertices.push([0.0, 0.0, -1.0]);
    vertices.push([0.0, 0.0, 1.0]);

    let v = -1;
    Geometry::from_polygons(
        &vertices,
        &[
            &[5, 7, 11, 1],
            &[4, 2, 10, 2],
            &[1, 3, 11, 3],
            &[0, 8, 10, 4],
            &[7, 9, 11, 5],
            &[8, 6, 10, 6],
            &[9, 1, 11, 7],
            &[2, 0, 10, 8],
            &[3, 5, 11, 9],
            &[6, 4, 10, 10],
            &[1, 0, 2, v],
            &[1, 2, 3, v],
            &[3, 2, 4, v],
            &[3, 4, 5, v],
            &[5, 4, 6, v],
            &[5, 6, 7, v],
            &[7, 6, 8, v],
            &[7, 8, 9, v],
            &[9, 8, 0, v],
            &[9, 0, 1, v],
        ],
        DIE_RADIUS,
    )
}

pub fn d12_geometry() -> Geometry {
    let p = (1.0 + 5f32.sqrt()) / 2.0;
    let q = 1.0 / p;
    Geometry::from_polygons(
        &[
            [0.0, q, p],
            [0.0, q, -p],
            [0.0, -q, p],
            [0.0, -q, -p],
            [p, 0.0, q],
            [p, 0.0, -q],
            [-p, 0.0, q],
            [-p, 0.0, -q],
            [q, p, 0.0],
            [q, -p, 0.0],
            [-q, p, 0.0],
            [-q, -p, 0.0],
            [1.0, 1.0, 1.0],
            [1.0, 1.0, -1.0],
            [1.0, -1.0, 1.0],
            [1.0, -1.0, -1.0],
            [-1.0, 1.0, 1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [-1.0, -1.0, -1.0],
        ],
        &[
            &[2, 14, 4, 12, 0, 1],
            &[15, 9, 11, 19, 3, 2],
            &[16, 10, 17, 7, 6, 3],
            &[6, 7, 19, 11, 18, 4],
            &[6, 18, 2, 0, 16, 5],
            &[18, 11, 9, 14, 2, 6],
            &[1, 17, 10, 8, 13, 7],
            &[1, 13, 5, 15, 3, 8],
            &[13, 8, 12, 4, 5, 9],
            &[5, 4, 14, 9, 15, 10],
            &[0, 12, 8, 10, 16, 11],
            &[3, 19, 7, 17, 1, 12],
        ],
        DIE_RADIUS,
    )
}

pub fn d20_geometry() -> Geometry {
    let t = (1.0 + 5f32.sqrt()) / 2.0;
    Geometry::from_polygons(
        &[
            [-1.0, t, 0.0],
            [1.0, t, 0.0],
            [-1.0, -t, 0.0],
            [1.0, -t, 0.0],
            [0.0, -1.0, t],
            [0.0, 1.0, t],
            [0.0, -1.0, -t],
            [0.0, 1.0, -t],
            [t, 0.0, -1.0],
            [t, 0.0, 1.0],
            [-t, 0.0, -1.0],
            [-t, 0.0, 1.0],
        ],
        &[
            &[0, 11, 5, 1],
            &[0, 5, 1, 2],
            &[0, 1, 7, 3],
            &[0, 7, 10, 4],
            &[0, 10, 11, 5],
            &[1, 5, 9, 6],
            &[5, 11, 4, 7],
            &[11, 10, 2, 8],
            &[10, 7, 6, 9],
            &[7, 1, 8, 10],
            &[3, 9, 4, 11],
            &[3, 4, 2, 12],
            &[3, 2, 6, 13],
            &[3, 6, 8, 14],
            &[3, 8, 9, 15],
            &[4, 9, 5, 16],
            &[2, 4, 11, 17],
            &[6, 2, 10, 18],
            &[8, 6, 7, 19],
            &[9, 8, 1, 20],
        ],
        DIE_RADIUS,
    )
}

/// One shared definition per die type
///
/// Owned by the dice box; entities share each kind's geometry until rigging
/// gives them a private copy.
#[derive(Debug, Clone)]
pub struct DieCatalog {
    d4: Arc<TetrahedralDie>,
    d6: Arc<StandardDie>,
    d8: Arc<StandardDie>,
    d10: Arc<StandardDie>,
    d12: Arc<StandardDie>,
    d20: Arc<StandardDie>,
}

impl DieCatalog {
    /// Build every standard die
    pub fn standard() -> Self {
        let numeric = Arc::new(MaterialSet::single(numeric_labels(MAX_LABEL)));
        let standard = |die_type: DieType, source: GeometrySource| {
            Arc::new(StandardDie::new(die_type, source, numeric.clone(), false))
        };

        Self {
            d4: Arc::new(TetrahedralDie::new(
                d4_geometry(),
                Arc::new(corner_materials()),
            )),
            d6: standard(DieType::D6, d6_geometry().into()),
            d8: standard(DieType::D8, d8_geometry().into()),
            d10: standard(DieType::D10, GeometrySource::factory(d10_geometry)),
            d12: standard(DieType::D12, GeometrySource::factory(d12_geometry)),
            d20: standard(DieType::D20, GeometrySource::factory(d20_geometry)),
        }
    }

    /// Definition for `die_type`
    pub fn kind(&self, die_type: DieType) -> Arc<dyn DieKind> {
        match die_type {
            DieType::D4 => self.d4.clone(),
            DieType::D6 => self.d6.clone(),
            DieType::D8 => self.d8.clone(),
            DieType::D10 => self.d10.clone(),
            DieType::D12 => self.d12.clone(),
            DieType::D20 => self.d20.clone(),
        }
    }
}

impl Default for DieCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::printed_values;

    #[test]
    fn test_every_kind_prints_each_value_once() {
        let catalog = DieCatalog::standard();
        for die_type in DieType::ALL {
            let kind = catalog.kind(die_type);
            let values = printed_values(kind.as_ref(), kind.geometry());
            let expected: Vec<u32> = (1..=die_type.face_count()).collect();
            assert_eq!(values.into_iter().collect::<Vec<_>>(), expected, "{}", die_type);
        }
    }

    #[test]
    fn test_kind_matches_type() {
        let catalog = DieCatalog::standard();
        for die_type in DieType::ALL {
            let kind = catalog.kind(die_type);
            assert_eq!(kind.die_type(), die_type);
            assert_eq!(kind.face_count(), die_type.face_count());
            assert_eq!(kind.invert_up(), die_type == DieType::D4);
        }
    }

    #[test]
    fn test_triangle_counts() {
        assert_eq!(d4_geometry().faces().len(), 4);
        assert_eq!(d6_geometry().faces().len(), 12);
        assert_eq!(d8_geometry().faces().len(), 8);
        assert_eq!(d10_geometry().faces().len(), 20);
        assert_eq!(d12_geometry().faces().len(), 36);
        assert_eq!(d20_geometry().faces().len(), 20);
    }

    #[test]
    fn test_d10_background_faces_stay_blank() {
        let geometry = d10_geometry();
        let blank = geometry.faces().iter().filter(|f| !f.is_labeled()).count();
        assert_eq!(blank, 10);
    }

    #[test]
    fn test_shape_radius_matches_die() {
        let catalog = DieCatalog::standard();
        for die_type in DieType::ALL {
            let kind = catalog.kind(die_type);
            assert!((kind.shape().radius() - DIE_RADIUS).abs() < 1e-5);
        }
    }
}
