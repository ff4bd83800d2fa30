//! Navigation gateway seam
//!
//! The sequencer never talks to a navigation stack directly. It hands one
//! waypoint at a time to a [`NavigationGateway`], which waits for the action
//! server, sends the goal and resolves to exactly one [`GoalOutcome`].

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::Waypoint;

/// Terminal result of a single navigation goal
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GoalOutcome {
    /// The robot reached the waypoint
    Succeeded,
    /// The navigation server gave up on the goal
    Aborted,
    /// The goal was canceled before completion
    Canceled,
    /// Any other terminal status, or a transport failure
    Unknown(String),
}

impl fmt::Display for GoalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GoalOutcome::Succeeded => write!(f, "succeeded"),
            GoalOutcome::Aborted => write!(f, "aborted"),
            GoalOutcome::Canceled => write!(f, "canceled"),
            GoalOutcome::Unknown(detail) => write!(f, "unknown result ({})", detail),
        }
    }
}

/// Transport-level failures while sending a goal
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The goal request could not be sent
    #[error("failed to send goal: {0}")]
    Send(String),
    /// The server refused the goal
    #[error("goal rejected: {0}")]
    Rejected(String),
    /// The result never arrived
    #[error("failed to receive result: {0}")]
    Result(String),
}

/// Sends waypoints to a navigation stack, one goal at a time
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NavigationGateway: Send + Sync {
    /// Navigates to `waypoint` and resolves to its terminal outcome
    ///
    /// Implementations wait for the server to become available before sending,
    /// retrying with backoff; unavailability is logged, never returned.
    async fn navigate(&self, waypoint: Waypoint) -> Result<GoalOutcome, GatewayError>;
}

/// Doubling delay capped at a maximum
#[derive(Clone, Debug)]
pub struct Backoff {
    initial: Duration,
    current: Duration,
    max: Duration,
}

impl Backoff {
    /// Starts at `initial` and never exceeds `max`
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Backoff {
            initial,
            current: initial,
            max,
        }
    }

    /// Returns the delay to wait now and doubles the next one
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Back to the initial delay
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
