//! Roll records - save and replay a finished roll
//!
//! A record holds everything needed to show the same roll again: the roll
//! seed, the dice in order, and how far each die's labels were shifted from
//! the catalog mesh. Physics is not stored; it is re-simulated.
//!
//! # Invariants
//!
//! - **Determinism**: same seed + dice + labels + config reproduces the
//!   trajectory digest
//! - **Config matching**: a record only replays under a config with the same
//!   hash

use crate::dice::DieType;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid record: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Serialization(e.to_string())
    }
}

// ============================================================================
// Record Structures
// ============================================================================

/// One die as it was during the visible pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedDie {
    pub die_type: DieType,
    /// Cyclic label shift from the catalog mesh, in `0..face_count`
    pub label_offset: u32,
}

/// A relabeling applied between the prediction and the replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigRecord {
    pub die: String,
    pub from: u32,
    pub to: u32,
}

/// Complete description of a finished roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollRecord {
    pub roll_id: String,

    /// Seed of both passes (CRITICAL for replay)
    pub seed: i64,

    pub predicted: bool,

    pub dice: Vec<RecordedDie>,

    pub rigs: Vec<RigRecord>,

    /// Values the silent pass landed on, for predicted rolls
    pub natural: Option<Vec<u32>>,

    pub values: Vec<u32>,

    pub total: u32,

    /// Ticks taken by the visible pass
    pub ticks: usize,

    /// Visible pass was ended at the capped prediction's last tick
    pub capped: bool,

    /// SHA-256 of the visible trajectory, when trajectories were recorded
    pub trajectory_digest: Option<String>,

    /// SHA-256 of the physics-relevant config (for validation)
    pub config_hash: String,
}

impl RollRecord {
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let record: RollRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Check internal consistency
    ///
    /// - one value per die, each within the die's range
    /// - one natural value per die, when present
    /// - label offsets below each die's face count
    /// - total equals the sum of values
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.values.len() != self.dice.len() {
            return Err(RecordError::Invalid(format!(
                "{} values for {} dice",
                self.values.len(),
                self.dice.len()
            )));
        }

        if let Some(natural) = &self.natural {
            if natural.len() != self.values.len() {
                return Err(RecordError::Invalid(format!(
                    "{} natural values for {} dice",
                    natural.len(),
                    self.values.len()
                )));
            }
        }

        for (die, value) in self.dice.iter().zip(&self.values) {
            let faces = die.die_type.face_count();
            if die.label_offset >= faces {
                return Err(RecordError::Invalid(format!(
                    "label offset {} out of range for {}",
                    die.label_offset, die.die_type
                )));
            }
            if !(1..=faces).contains(value) {
                return Err(RecordError::Invalid(format!(
                    "value {} out of range for {}",
                    value, die.die_type
                )));
            }
        }

        let sum: u32 = self.values.iter().sum();
        if sum != self.total {
            return Err(RecordError::Invalid(format!(
                "total {} does not match values summing to {}",
                self.total, sum
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// SHA-256 over the canonical JSON form of `config`
///
/// `serde_json::Value` objects keep their keys sorted, so going through a
/// `Value` makes the text independent of field declaration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, RecordError> {
    let canonical = serde_json::to_value(config)?.to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(format!("{:x}", digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::DiceBoxConfig;

    fn record() -> RollRecord {
        RollRecord {
            roll_id: "roll".to_string(),
            seed: 42,
            predicted: true,
            dice: vec![
                RecordedDie {
                    die_type: DieType::D6,
                    label_offset: 2,
                },
                RecordedDie {
                    die_type: DieType::D20,
                    label_offset: 0,
                },
            ],
            rigs: vec![RigRecord {
                die: "die-1".to_string(),
                from: 3,
                to: 5,
            }],
            natural: Some(vec![3, 17]),
            values: vec![5, 17],
            total: 22,
            ticks: 240,
            capped: false,
            trajectory_digest: None,
            config_hash: "abc".to_string(),
        }
    }

    #[test]
    fn test_config_hash_is_stable_hex() {
        let config = DiceBoxConfig::default();
        let first = compute_config_hash(&config).unwrap();
        let second = compute_config_hash(&config.clone()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_config_hash_tracks_physics_changes() {
        let base = DiceBoxConfig::default();
        let mut bouncier = DiceBoxConfig::default();
        bouncier.world.restitution = 0.8;

        assert_ne!(
            compute_config_hash(&base).unwrap(),
            compute_config_hash(&bouncier).unwrap()
        );
    }

    #[test]
    fn test_valid_record_passes() {
        assert!(record().validate().is_ok());
    }

    #[test]
    fn test_value_count_mismatch_rejected() {
        let mut r = record();
        r.values.pop();
        assert!(matches!(r.validate(), Err(RecordError::Invalid(_))));
    }

    #[test]
    fn test_label_offset_out_of_range_rejected() {
        let mut r = record();
        r.dice[0].label_offset = 6;
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_natural_count_mismatch_rejected() {
        let mut r = record();
        r.natural = Some(vec![3]);
        assert!(matches!(r.validate(), Err(RecordError::Invalid(_))));

        r.natural = None;
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let mut r = record();
        r.total = 21;
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            RollRecord::from_json("{not json"),
            Err(RecordError::Serialization(_))
        ));
    }
}
