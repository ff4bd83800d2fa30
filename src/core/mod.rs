// core/mod.rs

// Recording and sequencing core: the latest-pose cache, the waypoint store and
// the sequencing state machine, wired together by `Core`. Everything here is
// synchronous and single-owner; the runner drives it from one event loop.

pub mod pose;
pub mod state;
pub mod waypoint_store;

pub use pose::{Orientation, PoseCache, Position, Waypoint};
pub use state::{Directive, GoalTicket, SequenceController, SequenceState};
pub use waypoint_store::WaypointStore;

use crate::RecorderError;
use crate::navigation::GoalOutcome;

/// Pose cache, waypoint store and sequencer for one session
#[derive(Debug, Default)]
pub struct Core {
    poses: PoseCache,
    waypoints: WaypointStore,
    sequence: SequenceController,
}

impl Core {
    /// Empty session: no pose, no waypoints, sequencer idle
    pub fn new() -> Self {
        Core::default()
    }

    /// Feeds a localization sample into the pose cache
    pub fn on_pose_sample(&mut self, position: Position, orientation: Orientation) {
        self.poses.update(position, orientation);
    }

    /// Records the cached pose as the next waypoint
    pub fn record(&mut self) -> Result<usize, RecorderError> {
        if self.waypoints.is_frozen() {
            return Err(RecorderError::StoreFrozen);
        }
        let snapshot = self.poses.current()?;
        self.waypoints.record(snapshot)
    }

    /// Starts playback from the first waypoint
    pub fn start(&mut self) -> Result<Directive, RecorderError> {
        self.sequence.start(&mut self.waypoints)
    }

    /// Routes a navigation outcome to the sequencer
    pub fn on_result(
        &mut self,
        ticket: GoalTicket,
        outcome: GoalOutcome,
    ) -> Result<Directive, RecorderError> {
        self.sequence.on_result(&self.waypoints, ticket, outcome)
    }

    /// Routes a dwell-timer expiry to the sequencer
    pub fn on_dwell_elapsed(&mut self, ticket: GoalTicket) -> Result<Directive, RecorderError> {
        self.sequence.on_dwell_elapsed(&self.waypoints, ticket)
    }

    /// Stops the sequencer for good
    pub fn shutdown(&mut self) -> Option<GoalTicket> {
        self.sequence.shutdown()
    }

    /// Latest pose cache
    pub fn poses(&self) -> &PoseCache {
        &self.poses
    }

    /// Recorded waypoints
    pub fn waypoints(&self) -> &WaypointStore {
        &self.waypoints
    }

    /// Sequencer state
    pub fn sequence(&self) -> &SequenceController {
        &self.sequence
    }
}
