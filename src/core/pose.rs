// core/pose.rs

// Pose types shared by the recorder and the latest-sample cache fed by the
// localization topic. The cache keeps no history: every sample replaces the last.

// Dependencies
use log::trace;
use nalgebra::{Point3, Quaternion, UnitQuaternion};

use crate::RecorderError;

/// Robot position in the map frame (meters)
pub type Position = Point3<f64>;

/// Robot orientation as a raw (not necessarily normalized) quaternion
pub type Orientation = Quaternion<f64>;

/// Snapshot of a robot pose at the moment it was recorded
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    /// Position (x, y, z)
    pub position: Position,
    /// Orientation (x, y, z, w)
    pub orientation: Orientation,
}

impl Waypoint {
    /// Builds a waypoint from a position and orientation sample
    pub fn new(position: Position, orientation: Orientation) -> Self {
        Waypoint {
            position,
            orientation,
        }
    }

    /// Heading around the z axis in radians, 0.0 for a degenerate quaternion
    pub fn yaw(&self) -> f64 {
        if self.orientation.norm() == 0.0 {
            return 0.0;
        }
        UnitQuaternion::from_quaternion(self.orientation)
            .euler_angles()
            .2
    }
}

/// Latest pose reported by the localization feed
#[derive(Debug, Default)]
pub struct PoseCache {
    latest: Option<Waypoint>,
}

impl PoseCache {
    /// Creates an empty cache; `current` fails until the first update
    pub fn new() -> Self {
        PoseCache { latest: None }
    }

    /// Overwrites the cached pose, last writer wins
    pub fn update(&mut self, position: Position, orientation: Orientation) {
        trace!(
            "pose sample: ({:.3}, {:.3}, {:.3})",
            position.x, position.y, position.z
        );
        self.latest = Some(Waypoint::new(position, orientation));
    }

    /// Returns the latest snapshot
    pub fn current(&self) -> Result<Waypoint, RecorderError> {
        self.latest.ok_or(RecorderError::NoPoseAvailable)
    }

    /// Whether any sample has arrived yet
    pub fn has_pose(&self) -> bool {
        self.latest.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn empty_cache_reports_no_pose() {
        let cache = PoseCache::new();
        assert!(!cache.has_pose());
        assert!(matches!(cache.current(), Err(RecorderError::NoPoseAvailable)));
    }

    #[test]
    fn update_overwrites_previous_sample() {
        let mut cache = PoseCache::new();
        cache.update(Position::new(1.0, 2.0, 0.0), Orientation::identity());
        cache.update(Position::new(3.0, 4.0, 0.5), Orientation::new(0.0, 0.0, 0.0, 1.0));

        let pose = cache.current().unwrap();
        assert_eq!(pose.position, Position::new(3.0, 4.0, 0.5));
        assert_eq!(pose.orientation.w, 0.0);
        assert_eq!(pose.orientation.k, 1.0);
    }

    #[test]
    fn yaw_from_quarter_turn() {
        let half = FRAC_PI_2 / 2.0;
        let waypoint = Waypoint::new(
            Position::origin(),
            Orientation::new(half.cos(), 0.0, 0.0, half.sin()),
        );
        assert!((waypoint.yaw() - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn degenerate_orientation_has_zero_yaw() {
        let waypoint = Waypoint::new(Position::origin(), Orientation::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(waypoint.yaw(), 0.0);
    }
}
