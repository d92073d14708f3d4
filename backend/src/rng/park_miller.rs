//! Park-Miller minimal standard random number generator
//!
//! # Algorithm
//!
//! `state = state * 16807 mod (2^31 - 1)`. The state is always in
//! `[1, 2^31 - 2]`; zero is unreachable, so the sequence never collapses.
//!
//! # Determinism
//!
//! Same seed → same sequence. The predicted-roll protocol depends on this:
//! the silent rollout and the visible replay are both driven from one seed.

use serde::{Deserialize, Serialize};

/// Modulus of the generator (`2^31 - 1`, a Mersenne prime)
pub const MODULUS: i64 = 2_147_483_647;

/// Multiplier of the generator (`7^5`)
pub const MULTIPLIER: i64 = 16_807;

/// Deterministic random number generator
///
/// # Example
/// ```
/// use dice_box_core_rs::DiceRng;
///
/// let mut rng = DiceRng::new(12345);
/// let value = rng.next();
/// let face = rng.next_int(1, 7); // [1, 7)
/// assert!((1..7).contains(&face));
/// # let _ = value;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRng {
    /// Seed the stream was (re)started from
    seed: i64,
    /// Last value produced (equal to `seed` right after seeding)
    state: i64,
}

impl DiceRng {
    /// Create a new RNG with given seed
    ///
    /// See [`DiceRng::set_seed`] for how out-of-range seeds are mapped.
    pub fn new(seed: i64) -> Self {
        let mut rng = Self { seed: 1, state: 1 };
        rng.set_seed(seed);
        rng
    }

    /// Restart the stream from `seed`
    ///
    /// The seed is reduced modulo `2^31 - 1`. Zero, multiples of the modulus
    /// and negative values are shifted up by `2^31 - 2`, so zero maps to the
    /// fixed non-zero default `2^31 - 2`.
    ///
    /// # Example
    /// ```
    /// use dice_box_core_rs::{DiceRng, MODULUS};
    ///
    /// let rng = DiceRng::new(0);
    /// assert_eq!(rng.seed(), MODULUS - 1);
    /// ```
    pub fn set_seed(&mut self, seed: i64) {
        let mut reduced = seed % MODULUS;
        if reduced <= 0 {
            reduced += MODULUS - 1;
        }
        self.seed = reduced;
        self.state = reduced;
    }

    /// Seed the current stream was started from
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Current internal state (last value produced)
    pub fn state(&self) -> i64 {
        self.state
    }

    /// Generate the next value of the sequence, in `[1, 2^31 - 2]`
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> i64 {
        self.state = self.state * MULTIPLIER % MODULUS;
        self.state
    }

    /// Generate a float in `[0.0, 1.0)`
    ///
    /// # Example
    /// ```
    /// use dice_box_core_rs::DiceRng;
    ///
    /// let mut rng = DiceRng::new(7);
    /// let p = rng.next_float();
    /// assert!(p >= 0.0 && p < 1.0);
    /// ```
    pub fn next_float(&mut self) -> f64 {
        (self.next() - 1) as f64 / (MODULUS - 1) as f64
    }

    /// Generate an integer in `[min, max)`
    ///
    /// # Panics
    /// Panics if `min >= max`
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");
        min + self.next() % (max - min)
    }

    /// Generate an `f32` in `[-magnitude, magnitude]`
    pub fn next_signed(&mut self, magnitude: f32) -> f32 {
        (self.next_float() as f32 * 2.0 - 1.0) * magnitude
    }
}
