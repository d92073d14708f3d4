//! Time management for the physics loop
//!
//! The dice box advances in fixed-timestep ticks. Identical tick sequences
//! are what make a silent prediction reproducible during the visible replay.

use serde::{Deserialize, Serialize};

/// Default fixed timestep (60 Hz)
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Counts fixed-timestep ticks for the current pass
///
/// # Example
/// ```
/// use dice_box_core_rs::TickClock;
///
/// let mut clock = TickClock::new(1.0 / 60.0);
/// assert_eq!(clock.current_tick(), 0);
///
/// clock.advance_tick();
/// assert_eq!(clock.current_tick(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickClock {
    /// Ticks elapsed since the last reset
    current_tick: usize,
    /// Seconds of simulated time per tick
    time_step: f32,
}

impl TickClock {
    /// Create a new clock
    ///
    /// # Panics
    /// Panics if `time_step` is not strictly positive
    pub fn new(time_step: f32) -> Self {
        assert!(time_step > 0.0, "time_step must be positive");
        Self {
            current_tick: 0,
            time_step,
        }
    }

    /// Advance time by one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Restart counting from tick 0
    pub fn reset(&mut self) {
        self.current_tick = 0;
    }

    /// Ticks elapsed since the last reset
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }

    /// Seconds of simulated time per tick
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Simulated seconds elapsed since the last reset
    ///
    /// # Example
    /// ```
    /// use dice_box_core_rs::TickClock;
    ///
    /// let mut clock = TickClock::new(0.5);
    /// clock.advance_tick();
    /// clock.advance_tick();
    /// assert_eq!(clock.elapsed_seconds(), 1.0);
    /// ```
    pub fn elapsed_seconds(&self) -> f32 {
        self.current_tick as f32 * self.time_step
    }

    /// Whether `cap` ticks have already been taken
    pub fn reached(&self, cap: usize) -> bool {
        self.current_tick >= cap
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "time_step must be positive")]
    fn test_zero_time_step_panics() {
        TickClock::new(0.0);
    }

    #[test]
    fn test_reset_and_cap() {
        let mut clock = TickClock::default();
        for _ in 0..10 {
            clock.advance_tick();
        }
        assert!(clock.reached(10));
        assert!(!clock.reached(11));

        clock.reset();
        assert_eq!(clock.current_tick(), 0);
    }
}
