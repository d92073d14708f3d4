//! Deterministic random number generation
//!
//! Uses the Park-Miller "minimal standard" multiplicative LCG.
//! CRITICAL: every stochastic decision of a roll (spawn pose, throw velocity,
//! drawn outcomes) MUST go through this module, otherwise a roll cannot be
//! replayed.

mod park_miller;

pub use park_miller::{DiceRng, MODULUS, MULTIPLIER};
