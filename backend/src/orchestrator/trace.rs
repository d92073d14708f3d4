//! Per-tick pose recording
//!
//! The silent prediction and the visible replay of a roll must follow the
//! same trajectory bit for bit. Both passes record every die's pose each
//! tick; comparing the raw float bits (never approximate equality) shows
//! whether the physics actually repeated.

use crate::physics::BodyPose;
use sha2::{Digest, Sha256};

/// Poses of every die, one entry per tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    frames: Vec<Vec<BodyPose>>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the poses of one tick, in dice order
    pub fn push(&mut self, poses: Vec<BodyPose>) {
        self.frames.push(poses);
    }

    /// Number of ticks recorded
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Vec<BodyPose>] {
        &self.frames
    }

    /// SHA-256 over the whole trajectory
    pub fn digest(&self) -> String {
        self.digest_prefix(self.frames.len())
    }

    /// SHA-256 over the first `ticks` ticks
    pub fn digest_prefix(&self, ticks: usize) -> String {
        let mut hasher = Sha256::new();
        for frame in self.frames.iter().take(ticks) {
            hasher.update((frame.len() as u64).to_le_bytes());
            for pose in frame {
                for bits in pose_bits(pose) {
                    hasher.update(bits.to_le_bytes());
                }
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// First tick index (0-based) where the two trajectories differ, over
    /// their common length
    pub fn first_divergence(&self, other: &Trajectory) -> Option<usize> {
        self.frames
            .iter()
            .zip(&other.frames)
            .position(|(a, b)| !frames_identical(a, b))
    }
}

fn pose_bits(pose: &BodyPose) -> [u32; 7] {
    let p = pose.position;
    let q = pose.orientation;
    [
        p.x.to_bits(),
        p.y.to_bits(),
        p.z.to_bits(),
        q.x.to_bits(),
        q.y.to_bits(),
        q.z.to_bits(),
        q.w.to_bits(),
    ]
}

fn frames_identical(a: &[BodyPose], b: &[BodyPose]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| pose_bits(x) == pose_bits(y))
}
