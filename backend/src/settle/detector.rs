use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Squared-speed threshold below which a die may be resting
pub const DEFAULT_VELOCITY_EPSILON: f32 = 0.045;

/// Ticks a die must stay below the threshold
pub const DEFAULT_WINDOW_TICKS: usize = 30;

/// What one observation changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopTransition {
    /// Above threshold, or no longer resting
    Moving,
    /// Below threshold but the window has not elapsed (or already settled)
    Resting,
    /// The window just elapsed; reported once per settle
    Settled,
}

/// Per-die hysteresis on body speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopDetector {
    epsilon: f32,
    window: usize,
    /// First tick of the current sub-threshold run
    mark: Option<usize>,
    stopped: bool,
}

impl StopDetector {
    pub fn new(epsilon: f32, window: usize) -> Self {
        Self {
            epsilon,
            window,
            mark: None,
            stopped: false,
        }
    }

    /// Feed the body's velocities at `tick`
    pub fn observe(&mut self, tick: usize, linear: Vec3, angular: Vec3) -> StopTransition {
        let quiet =
            angular.length_squared() < self.epsilon && linear.length_squared() < self.epsilon;
        if !quiet {
            self.mark = None;
            self.stopped = false;
            return StopTransition::Moving;
        }

        let mark = *self.mark.get_or_insert(tick);
        if !self.stopped && tick.saturating_sub(mark) >= self.window {
            self.stopped = true;
            return StopTransition::Settled;
        }
        StopTransition::Resting
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// First tick of the current sub-threshold run
    pub fn stop_tick_mark(&self) -> Option<usize> {
        self.mark
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Change the window for the next pass; keeps the current mark
    pub fn set_window(&mut self, window: usize) {
        self.window = window;
    }

    /// Forget any run in progress
    pub fn reset(&mut self) {
        self.mark = None;
        self.stopped = false;
    }
}

impl Default for StopDetector {
    fn default() -> Self {
        Self::new(DEFAULT_VELOCITY_EPSILON, DEFAULT_WINDOW_TICKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: Vec3 = Vec3::new(1.0, 0.0, 0.0);

    #[test]
    fn test_settles_after_window() {
        let mut detector = StopDetector::new(0.045, 3);
        assert_eq!(detector.observe(10, Vec3::ZERO, Vec3::ZERO), StopTransition::Resting);
        assert_eq!(detector.stop_tick_mark(), Some(10));
        assert_eq!(detector.observe(11, Vec3::ZERO, Vec3::ZERO), StopTransition::Resting);
        assert_eq!(detector.observe(12, Vec3::ZERO, Vec3::ZERO), StopTransition::Resting);
        assert_eq!(detector.observe(13, Vec3::ZERO, Vec3::ZERO), StopTransition::Settled);
        assert!(detector.is_stopped());
        assert_eq!(detector.observe(14, Vec3::ZERO, Vec3::ZERO), StopTransition::Resting);
    }

    #[test]
    fn test_motion_clears_mark() {
        let mut detector = StopDetector::new(0.045, 2);
        detector.observe(0, Vec3::ZERO, Vec3::ZERO);
        detector.observe(1, Vec3::ZERO, FAST);
        assert_eq!(detector.stop_tick_mark(), None);
        detector.observe(2, Vec3::ZERO, Vec3::ZERO);
        assert_eq!(detector.observe(3, Vec3::ZERO, Vec3::ZERO), StopTransition::Resting);
        assert_eq!(detector.observe(4, Vec3::ZERO, Vec3::ZERO), StopTransition::Settled);
    }

    #[test]
    fn test_either_velocity_counts() {
        let mut detector = StopDetector::new(0.045, 0);
        assert_eq!(detector.observe(0, FAST, Vec3::ZERO), StopTransition::Moving);
        assert_eq!(detector.observe(1, Vec3::ZERO, FAST), StopTransition::Moving);
        assert_eq!(detector.observe(2, Vec3::ZERO, Vec3::ZERO), StopTransition::Settled);
    }

    #[test]
    fn test_reset_forgets_settle() {
        let mut detector = StopDetector::new(0.045, 0);
        detector.observe(0, Vec3::ZERO, Vec3::ZERO);
        assert!(detector.is_stopped());
        detector.reset();
        assert!(!detector.is_stopped());
        assert_eq!(detector.stop_tick_mark(), None);
    }

    #[test]
    fn test_all_stopped_is_vacuous_for_empty() {
        assert!(crate::settle::all_stopped(std::iter::empty()));
    }
}
