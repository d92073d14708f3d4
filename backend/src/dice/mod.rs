//! Die definitions and face rigging
//!
//! A die kind couples a polyhedron mesh, its collision hull and a label set
//! with the two operations the predicted roll depends on:
//!
//! - **read**: which printed value is uppermost for a given orientation
//! - **rig**: relabel the faces of one entity's mesh so a chosen physical
//!   face carries a different value
//!
//! # Labeling convention
//!
//! Material index `0` is background. A labeled triangle with material index
//! `m` shows value `m - label_base`. Rigging shifts every labeled value by
//! the same cyclic offset, so the mapping from physical faces to values
//! stays a bijection onto `1..=face_count`.

pub mod catalog;
pub mod reader;
pub mod standard;
pub mod tetrahedral;

pub use catalog::DieCatalog;
pub use reader::{up_face, UpFace};
pub use standard::StandardDie;
pub use tetrahedral::TetrahedralDie;

use crate::geometry::{ConvexShape, Geometry};
use crate::render::Mesh;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by die definitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DieError {
    #[error("Face value {value} outside 1..={face_count}")]
    FaceOutOfRange { value: u32, face_count: u32 },

    #[error("Unknown die type: {0}")]
    UnknownDieType(String),
}

/// The standard polyhedral dice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl DieType {
    pub const ALL: [DieType; 6] = [
        DieType::D4,
        DieType::D6,
        DieType::D8,
        DieType::D10,
        DieType::D12,
        DieType::D20,
    ];

    /// Number of printed faces
    pub fn face_count(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.face_count())
    }
}

impl FromStr for DieType {
    type Err = DieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d4" => Ok(DieType::D4),
            "d6" => Ok(DieType::D6),
            "d8" => Ok(DieType::D8),
            "d10" => Ok(DieType::D10),
            "d12" => Ok(DieType::D12),
            "d20" => Ok(DieType::D20),
            other => Err(DieError::UnknownDieType(other.to_string())),
        }
    }
}

/// What a material slot prints on its face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceLabel {
    /// Background, nothing printed
    Blank,
    /// A single number or glyph
    Text(String),
    /// Three numbers arranged around the face's corners (d4)
    Corners([u32; 3]),
}

/// Label slots indexed by material index, possibly in several variants
///
/// Most dice have one variant. Dice whose printed face depends on rotation
/// (d4) carry one variant per orientation offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSet {
    variants: Vec<Vec<FaceLabel>>,
}

impl MaterialSet {
    pub fn single(labels: Vec<FaceLabel>) -> Self {
        Self {
            variants: vec![labels],
        }
    }

    pub fn with_variants(variants: Vec<Vec<FaceLabel>>) -> Self {
        Self { variants }
    }

    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Label for `material_index` in `variant`
    pub fn label(&self, variant: usize, material_index: u32) -> Option<&FaceLabel> {
        self.variants
            .get(variant)
            .and_then(|labels| labels.get(material_index as usize))
    }
}

/// Capability implemented once per polyhedron family
pub trait DieKind: fmt::Debug {
    fn die_type(&self) -> DieType;

    fn face_count(&self) -> u32;

    /// Shared, unrigged mesh
    fn geometry(&self) -> &Arc<Geometry>;

    /// Collision hull matching [`DieKind::geometry`]
    fn shape(&self) -> &Arc<ConvexShape>;

    fn materials(&self) -> &Arc<MaterialSet>;

    /// Whether the value is read from the face pointing down (`-Z`)
    fn invert_up(&self) -> bool;

    /// Offset between material index and printed value
    fn label_base(&self) -> u32 {
        1
    }

    /// Printed value of a material index; `None` for background or
    /// out-of-range slots
    fn value_of(&self, material_index: u32) -> Option<u32> {
        if material_index == crate::geometry::BACKGROUND_MATERIAL {
            return None;
        }
        material_index
            .checked_sub(self.label_base())
            .filter(|v| (1..=self.face_count()).contains(v))
    }

    /// Material index that prints `value`
    fn material_for(&self, value: u32) -> u32 {
        value + self.label_base()
    }

    /// Axis a face must point along to count as uppermost
    fn up_axis(&self) -> Vec3 {
        if self.invert_up() {
            Vec3::NEG_Z
        } else {
            Vec3::Z
        }
    }

    /// Relabel `mesh` so faces showing `from` show `to`, shifting every other
    /// labeled face by the same cyclic offset
    fn rig(&self, mesh: &mut Mesh, from: u32, to: u32) -> Result<(), DieError>;

    /// Printed value facing up for the mesh's current orientation
    fn read_up_face(&self, mesh: &Mesh) -> Option<u32> {
        up_face(&mesh.geometry, mesh.orientation, self.up_axis())
            .and_then(|face| self.value_of(face.material_index))
    }

    /// Check `value` lies in `1..=face_count`
    fn check_value(&self, value: u32) -> Result<(), DieError> {
        if (1..=self.face_count()).contains(&value) {
            Ok(())
        } else {
            Err(DieError::FaceOutOfRange {
                value,
                face_count: self.face_count(),
            })
        }
    }
}

/// Signed cyclic distance from `from` to `to`
pub fn rig_offset(from: u32, to: u32) -> i64 {
    to as i64 - from as i64
}

/// Shift every labeled face of `geometry` by `offset`, wrapping values into
/// `1..=face_count`; background faces are left alone
pub fn shift_labels(geometry: &mut Geometry, offset: i64, face_count: u32, label_base: u32) {
    if offset == 0 {
        return;
    }
    let count = face_count as i64;
    let base = label_base as i64;
    for face in geometry.faces_mut() {
        if !face.is_labeled() {
            continue;
        }
        let value = face.material_index as i64 - base;
        let shifted = (value - 1 + offset).rem_euclid(count) + 1;
        face.material_index = (shifted + base) as u32;
    }
}

/// Distinct printed values present on a mesh
pub fn printed_values(kind: &dyn DieKind, geometry: &Geometry) -> BTreeSet<u32> {
    geometry
        .faces()
        .iter()
        .filter_map(|f| kind.value_of(f.material_index))
        .collect()
}

/// Shared label table of the single-number dice: slot `m` prints `m - 1`
pub fn numeric_labels(max_value: u32) -> Vec<FaceLabel> {
    let mut labels = vec![FaceLabel::Blank];
    for value in 0..=max_value {
        let text = match value {
            6 | 9 => format!("{}.", value),
            _ => value.to_string(),
        };
        labels.push(FaceLabel::Text(text));
    }
    labels
}
