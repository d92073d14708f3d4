//! Roll Record Tests - Save and Replay a Finished Roll
//!
//! Critical invariants tested:
//! - Determinism: a replayed record reproduces values and trajectory digest
//! - Config matching: records from a different physics config are rejected
//! - Consistency: malformed records are rejected before anything changes

use dice_box_core_rs::orchestrator::{
    DesiredOutcome, DiceBox, DiceBoxConfig, DiceBoxError, RecordError, RollRecord,
};
use dice_box_core_rs::{DieType, PhysicsWorld};

// ============================================================================
// Test Helpers
// ============================================================================

fn recorded_roll(dice: &[DieType], desired: DesiredOutcome) -> RollRecord {
    let mut dice_box = DiceBox::headless(DiceBoxConfig::default()).unwrap();
    for die_type in dice {
        dice_box.add_dice(*die_type);
    }
    dice_box.set_desired_outcome(desired).unwrap();
    assert!(dice_box.start(true));
    dice_box.run_until_settled(10_000).unwrap();
    dice_box.last_record().cloned().unwrap()
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_describes_the_roll() {
    let record = recorded_roll(
        &[DieType::D6, DieType::D20],
        DesiredOutcome::Values(vec![2, 19]),
    );

    assert!(record.predicted);
    assert_eq!(record.values, vec![2, 19]);
    assert_eq!(record.total, 21);
    assert_eq!(record.dice.len(), 2);
    assert_eq!(record.rigs.len(), 2);
    assert!(record.trajectory_digest.is_some());
    assert_eq!(record.config_hash.len(), 64);
    assert!(record.validate().is_ok());
}

#[test]
fn test_record_json_round_trip() {
    let record = recorded_roll(&[DieType::D8], DesiredOutcome::Values(vec![3]));

    let json = record.to_json().unwrap();
    let restored = RollRecord::from_json(&json).unwrap();

    assert_eq!(restored, record);
}

#[test]
fn test_replay_in_fresh_box_reproduces_roll() {
    let record = recorded_roll(
        &[DieType::D4, DieType::D10, DieType::D12],
        DesiredOutcome::Values(vec![4, 1, 7]),
    );

    let mut fresh = DiceBox::headless(DiceBoxConfig::default()).unwrap();
    assert!(fresh.replay_record(&record).unwrap());
    let outcome = fresh.run_until_settled(10_000).cloned().unwrap();

    assert_eq!(outcome.values, record.values);
    assert_eq!(outcome.ticks, record.ticks);
    assert_eq!(
        fresh.last_replay_trace().map(|t| t.digest()),
        record.trajectory_digest
    );
    let offsets: Vec<u32> = fresh.dice().iter().map(|d| d.label_offset).collect();
    let recorded: Vec<u32> = record.dice.iter().map(|d| d.label_offset).collect();
    assert_eq!(offsets, recorded);
}

#[test]
fn test_replay_replaces_existing_dice() {
    let record = recorded_roll(&[DieType::D6], DesiredOutcome::Values(vec![6]));

    let mut other = DiceBox::headless(DiceBoxConfig::default()).unwrap();
    other.add_dice(DieType::D20);
    other.add_dice(DieType::D20);
    assert!(other.replay_record(&record).unwrap());

    assert_eq!(other.dice().len(), 1);
    assert_eq!(other.dice()[0].die_type, DieType::D6);
    assert_eq!(other.world().body_count(), 1);
}

#[test]
fn test_replay_rejected_under_different_physics() {
    let record = recorded_roll(&[DieType::D6], DesiredOutcome::Values(vec![1]));

    let mut config = DiceBoxConfig::default();
    config.world.friction = 0.9;
    let mut other = DiceBox::headless(config).unwrap();

    assert!(matches!(
        other.replay_record(&record),
        Err(DiceBoxError::ConfigMismatch { .. })
    ));
    assert!(!other.is_locked());
}

#[test]
fn test_session_seed_does_not_block_replay() {
    let record = recorded_roll(&[DieType::D6], DesiredOutcome::Values(vec![3]));

    let config = DiceBoxConfig {
        rng_seed: 987,
        ..DiceBoxConfig::default()
    };
    let mut other = DiceBox::headless(config).unwrap();
    assert!(other.replay_record(&record).unwrap());
    let outcome = other.run_until_settled(10_000).cloned().unwrap();
    assert_eq!(outcome.values, vec![3]);
}

#[test]
fn test_malformed_record_rejected() {
    let mut record = recorded_roll(&[DieType::D6], DesiredOutcome::Values(vec![4]));
    record.total += 1;

    let mut other = DiceBox::headless(DiceBoxConfig::default()).unwrap();
    other.add_dice(DieType::D20);

    assert!(matches!(
        other.replay_record(&record),
        Err(DiceBoxError::Record(RecordError::Invalid(_)))
    ));
    assert_eq!(other.dice().len(), 1);
}

#[test]
fn test_replay_rejected_while_locked() {
    let record = recorded_roll(&[DieType::D6], DesiredOutcome::Values(vec![2]));

    let mut other = DiceBox::headless(DiceBoxConfig::default()).unwrap();
    other.add_dice(DieType::D8);
    assert!(other.start(false));

    assert!(!other.replay_record(&record).unwrap());
    assert_eq!(other.dice()[0].die_type, DieType::D8);
}
