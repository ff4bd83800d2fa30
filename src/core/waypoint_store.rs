// core/waypoint_store.rs

// Ordered, append-only list of recorded waypoints. Insertion order is the
// navigation order. The store freezes when playback starts and is read-only
// from then on.

// Dependencies
use log::info;

use super::pose::Waypoint;
use crate::RecorderError;

/// Append-only waypoint sequence
#[derive(Debug, Default)]
pub struct WaypointStore {
    waypoints: Vec<Waypoint>,
    frozen: bool,
}

impl WaypointStore {
    /// Creates an empty, writable store
    pub fn new() -> Self {
        WaypointStore {
            waypoints: Vec::new(),
            frozen: false,
        }
    }

    /// Appends a waypoint and returns its index
    pub fn record(&mut self, waypoint: Waypoint) -> Result<usize, RecorderError> {
        if self.frozen {
            return Err(RecorderError::StoreFrozen);
        }
        let index = self.waypoints.len();
        self.waypoints.push(waypoint);
        info!(
            "Pose saved #{}: ({:.3}, {:.3}, {:.3})",
            index, waypoint.position.x, waypoint.position.y, waypoint.position.z
        );
        Ok(index)
    }

    /// Returns the waypoint at `index`
    pub fn get(&self, index: usize) -> Result<&Waypoint, RecorderError> {
        self.waypoints
            .get(index)
            .ok_or(RecorderError::IndexOutOfRange {
                index,
                len: self.waypoints.len(),
            })
    }

    /// Number of recorded waypoints
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Recorded waypoints in navigation order
    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    /// Rejects any further `record` calls
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether playback has started
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
