//! Settle detection
//!
//! A die counts as stopped once both its linear and angular speed stay
//! below a threshold for a window of consecutive ticks. The roll as a whole
//! is stopped when every active die is.

mod detector;

pub use detector::{StopDetector, StopTransition, DEFAULT_VELOCITY_EPSILON, DEFAULT_WINDOW_TICKS};

/// Whether every detector reports stopped (true for none)
pub fn all_stopped<'a>(detectors: impl IntoIterator<Item = &'a StopDetector>) -> bool {
    detectors.into_iter().all(StopDetector::is_stopped)
}
