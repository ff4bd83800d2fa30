// core/state.rs

// Waypoint sequencing state machine. Decides, after each navigation outcome,
// whether the robot advances, dwells and then advances, holds at its pose, or
// wraps to the start of the patrol. The controller performs no I/O: every
// transition returns a `Directive` that the runner carries out.

// Dependencies
use log::{error, info, warn};
use std::time::Duration;

use super::waypoint_store::WaypointStore;
use crate::navigation::GoalOutcome;
use crate::{RecorderError, Waypoint};

/// Waypoint where the robot always dwells before moving on
pub const DWELL_INDEX: usize = 6;
/// Dwell length at `DWELL_INDEX`
pub const DWELL_PAUSE: Duration = Duration::from_secs(5);
/// Waypoint with a one-shot dwell on its first visit
pub const FIRST_VISIT_INDEX: usize = 8;
/// Dwell length for the first visit to `FIRST_VISIT_INDEX`
pub const FIRST_VISIT_PAUSE: Duration = Duration::from_secs(2);
/// Sequences longer than this wrap to `LONG_WRAP_INDEX` instead of 0
pub const LONG_SEQUENCE_THRESHOLD: usize = 9;
/// Wrap target for long sequences
pub const LONG_WRAP_INDEX: usize = 8;

/// Identifies one dispatched goal or one scheduled dwell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GoalTicket(u64);

/// Sequencer states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceState {
    /// No goal outstanding; waiting for a start command
    Idle,
    /// Exactly one goal is outstanding
    GoalInFlight {
        /// Index of the waypoint being navigated to
        index: usize,
        /// Ticket the result must carry
        ticket: GoalTicket,
    },
    /// Paused at a waypoint before sending `next_index`
    Dwelling {
        /// Waypoint to send once the pause elapses
        next_index: usize,
        /// Ticket the timer expiry must carry
        ticket: GoalTicket,
    },
    /// Single-waypoint sequence reached; idle at the current pose
    Holding {
        /// Index the robot is holding at
        index: usize,
    },
    /// Terminal; quit was requested
    Shutdown,
}

/// Work the runner must carry out after a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// Send `waypoint` as the single outstanding goal
    SendGoal {
        /// Ticket to report the outcome with
        ticket: GoalTicket,
        /// Store index of the waypoint
        index: usize,
        /// Waypoint to navigate to
        waypoint: Waypoint,
    },
    /// Wait `pause`, then report the ticket back through `on_dwell_elapsed`
    Dwell {
        /// Ticket to report the expiry with
        ticket: GoalTicket,
        /// Pause length
        pause: Duration,
        /// Waypoint that follows the pause
        next_index: usize,
    },
    /// Sequence idles at the only waypoint
    Hold {
        /// Index held
        index: usize,
    },
    /// Sequence stopped after a failed goal
    Halt {
        /// Index whose goal failed
        index: usize,
        /// Failure reported by the gateway
        outcome: GoalOutcome,
    },
    /// Nothing to do
    Ignore,
}

/// Waypoint sequencing state machine
///
/// The first-visit dwell at `FIRST_VISIT_INDEX` fires at most once over the
/// whole lifetime of a controller, including across restarts after a halt.
#[derive(Debug)]
pub struct SequenceController {
    state: SequenceState,
    current_index: usize,
    first_visit_fired: bool,
    next_ticket: u64,
}

impl Default for SequenceController {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceController {
    /// Starts in Idle with no goal sent
    pub fn new() -> Self {
        SequenceController {
            state: SequenceState::Idle,
            current_index: 0,
            first_visit_fired: false,
            next_ticket: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// Index of the waypoint last sent (or being dwelt at)
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// True while a goal is in flight or a dwell is pending
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SequenceState::GoalInFlight { .. } | SequenceState::Dwelling { .. }
        )
    }

    /// Whether the one-shot dwell at `FIRST_VISIT_INDEX` has fired
    pub fn first_visit_pause_fired(&self) -> bool {
        self.first_visit_fired
    }

    /// Freezes the store and sends the first waypoint
    pub fn start(&mut self, store: &mut WaypointStore) -> Result<Directive, RecorderError> {
        match self.state {
            SequenceState::Shutdown => return Err(RecorderError::ShutDown),
            SequenceState::GoalInFlight { .. } | SequenceState::Dwelling { .. } => {
                return Err(RecorderError::SequenceAlreadyActive);
            }
            SequenceState::Idle | SequenceState::Holding { .. } => {}
        }
        if store.is_empty() {
            return Err(RecorderError::NoWaypointsRecorded);
        }

        store.freeze();
        info!("Starting sequence over {} waypoints", store.len());
        self.dispatch(store, 0)
    }

    /// Applies a navigation outcome for `ticket`
    pub fn on_result(
        &mut self,
        store: &WaypointStore,
        ticket: GoalTicket,
        outcome: GoalOutcome,
    ) -> Result<Directive, RecorderError> {
        let index = match self.state {
            SequenceState::GoalInFlight { index, ticket: expected } if expected == ticket => index,
            _ => {
                warn!("Ignoring {:?} for goal {:?} that is not in flight", outcome, ticket);
                return Ok(Directive::Ignore);
            }
        };

        match outcome {
            GoalOutcome::Succeeded => {
                info!("Goal #{} was successful", index);
                self.advance(store, index)
            }
            failure => {
                error!("Goal #{} failed: {}", index, failure);
                self.state = SequenceState::Idle;
                Ok(Directive::Halt {
                    index,
                    outcome: failure,
                })
            }
        }
    }

    /// Sends the waypoint that follows a dwell once its timer fires
    pub fn on_dwell_elapsed(
        &mut self,
        store: &WaypointStore,
        ticket: GoalTicket,
    ) -> Result<Directive, RecorderError> {
        match self.state {
            SequenceState::Dwelling {
                next_index,
                ticket: expected,
            } if expected == ticket => self.dispatch(store, next_index),
            _ => Ok(Directive::Ignore),
        }
    }

    /// Enters Shutdown and returns the ticket of any abandoned goal
    pub fn shutdown(&mut self) -> Option<GoalTicket> {
        let abandoned = match self.state {
            SequenceState::GoalInFlight { ticket, .. } => Some(ticket),
            _ => None,
        };
        self.state = SequenceState::Shutdown;
        abandoned
    }

    // Rule order matters: both dwell cases win over the generic advance/wrap.
    fn advance(&mut self, store: &WaypointStore, index: usize) -> Result<Directive, RecorderError> {
        if index == DWELL_INDEX {
            return Ok(self.dwell(store, index, DWELL_PAUSE));
        }
        if index == FIRST_VISIT_INDEX && !self.first_visit_fired {
            self.first_visit_fired = true;
            return Ok(self.dwell(store, index, FIRST_VISIT_PAUSE));
        }
        if store.len() == 1 {
            info!("Only one goal was saved. Robot is now idle.");
            self.state = SequenceState::Holding { index };
            return Ok(Directive::Hold { index });
        }

        let next = successor(index, store.len());
        if next <= index {
            info!("All goals completed. Resetting index to {}", next);
        }
        self.dispatch(store, next)
    }

    fn dwell(&mut self, store: &WaypointStore, index: usize, pause: Duration) -> Directive {
        let next_index = successor(index, store.len());
        let ticket = self.issue_ticket();
        info!("Dwelling {:?} at waypoint #{} before #{}", pause, index, next_index);
        self.state = SequenceState::Dwelling { next_index, ticket };
        Directive::Dwell {
            ticket,
            pause,
            next_index,
        }
    }

    fn dispatch(&mut self, store: &WaypointStore, index: usize) -> Result<Directive, RecorderError> {
        let waypoint = *store.get(index)?;
        let ticket = self.issue_ticket();
        self.current_index = index;
        self.state = SequenceState::GoalInFlight { index, ticket };
        Ok(Directive::SendGoal {
            ticket,
            index,
            waypoint,
        })
    }

    fn issue_ticket(&mut self) -> GoalTicket {
        let ticket = GoalTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }
}

/// Index that follows `index` in a sequence of `len` waypoints
///
/// Steps forward while possible; past the end it wraps to `LONG_WRAP_INDEX`
/// for sequences longer than `LONG_SEQUENCE_THRESHOLD`, otherwise to 0.
pub fn successor(index: usize, len: usize) -> usize {
    if index + 1 < len {
        index + 1
    } else if len > LONG_SEQUENCE_THRESHOLD {
        LONG_WRAP_INDEX
    } else {
        0
    }
}
