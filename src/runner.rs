// runner.rs

// Single event loop that owns the recording core. Pose samples, keyboard
// commands, navigation results, dwell expiries and interrupts all arrive on one
// channel and are handled in order. Goals and dwell timers run as tokio tasks
// that report back through the same channel, so nothing here ever blocks.

// Dependencies
use log::{error, info, warn};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::{Core, Directive, GoalTicket, Orientation, Position};
use crate::input::Command;
use crate::navigation::{GoalOutcome, NavigationGateway};
use crate::RecorderError;

/// Everything the event loop reacts to
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Localization sample
    PoseSample {
        /// Position in the map frame
        position: Position,
        /// Orientation quaternion
        orientation: Orientation,
    },
    /// Operator command
    Command(Command),
    /// A goal reached its terminal state
    GoalFinished {
        /// Ticket the goal was sent with
        ticket: GoalTicket,
        /// How it ended
        outcome: GoalOutcome,
    },
    /// A dwell timer fired
    DwellElapsed(GoalTicket),
    /// Ctrl+C
    Interrupt,
}

/// Sending half of the event channel
pub type EventSender = mpsc::UnboundedSender<Event>;
/// Receiving half of the event channel
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Creates the event channel shared by all producers
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Drives the core from the event channel
pub struct Runner {
    core: Core,
    gateway: Arc<dyn NavigationGateway>,
    events: EventSender,
    inbox: EventReceiver,
    goal_task: Option<JoinHandle<()>>,
    dwell_task: Option<JoinHandle<()>>,
}

impl Runner {
    /// Builds a runner around `gateway` and an event channel from [`channel`]
    pub fn new(gateway: Arc<dyn NavigationGateway>, (events, inbox): (EventSender, EventReceiver)) -> Self {
        Runner {
            core: Core::new(),
            gateway,
            events,
            inbox,
            goal_task: None,
            dwell_task: None,
        }
    }

    /// Another handle for event producers
    pub fn sender(&self) -> EventSender {
        self.events.clone()
    }

    /// Recording core, for inspection
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// Handles events until quit or interrupt
    ///
    /// Returns an error only for fatal invariant violations.
    pub async fn run(&mut self) -> Result<(), RecorderError> {
        info!("Started...");
        while let Some(event) = self.inbox.recv().await {
            match self.handle(event) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break,
                Err(e) => {
                    error!("Stopping: {}", e);
                    self.abandon();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn handle(&mut self, event: Event) -> Result<ControlFlow<()>, RecorderError> {
        match event {
            Event::PoseSample {
                position,
                orientation,
            } => self.core.on_pose_sample(position, orientation),
            Event::Command(Command::Record) => match self.core.record() {
                Ok(_) => {}
                Err(e) if !e.is_fatal() => warn!("Cannot save pose: {}", e),
                Err(e) => return Err(e),
            },
            Event::Command(Command::StartSequence) => match self.core.start() {
                Ok(directive) => {
                    for (i, waypoint) in self.core.waypoints().iter().enumerate() {
                        info!(
                            "Saved Pose #{}: ({:.3}, {:.3}, {:.3}) yaw {:.3}",
                            i,
                            waypoint.position.x,
                            waypoint.position.y,
                            waypoint.position.z,
                            waypoint.yaw()
                        );
                    }
                    self.execute(directive);
                }
                Err(RecorderError::NoWaypointsRecorded) => info!("No saved poses to send."),
                Err(e) if !e.is_fatal() => warn!("Cannot start sequence: {}", e),
                Err(e) => return Err(e),
            },
            Event::Command(Command::Quit) => {
                info!("Quit requested. Shutting down...");
                self.abandon();
                return Ok(ControlFlow::Break(()));
            }
            Event::Interrupt => {
                info!("Ctrl+C pressed (SIGINT). Shutting down...");
                self.abandon();
                return Ok(ControlFlow::Break(()));
            }
            Event::GoalFinished { ticket, outcome } => {
                let directive = self.core.on_result(ticket, outcome)?;
                if directive != Directive::Ignore {
                    self.goal_task = None;
                }
                self.execute(directive);
            }
            Event::DwellElapsed(ticket) => {
                let directive = self.core.on_dwell_elapsed(ticket)?;
                if directive != Directive::Ignore {
                    self.dwell_task = None;
                }
                self.execute(directive);
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn execute(&mut self, directive: Directive) {
        match directive {
            Directive::SendGoal {
                ticket,
                index,
                waypoint,
            } => {
                info!("Started to go to Pose #{}", index);
                let gateway = Arc::clone(&self.gateway);
                let events = self.events.clone();
                self.goal_task = Some(tokio::spawn(async move {
                    let outcome = gateway.navigate(waypoint).await.unwrap_or_else(|e| {
                        error!("Goal #{} transport failure: {}", index, e);
                        GoalOutcome::Unknown(e.to_string())
                    });
                    let _ = events.send(Event::GoalFinished { ticket, outcome });
                }));
            }
            Directive::Dwell { ticket, pause, .. } => {
                let events = self.events.clone();
                self.dwell_task = Some(tokio::spawn(async move {
                    tokio::time::sleep(pause).await;
                    let _ = events.send(Event::DwellElapsed(ticket));
                }));
            }
            Directive::Hold { index } => info!("Holding at Pose #{}", index),
            Directive::Halt { index, .. } => {
                warn!("Sequence halted at Pose #{}; start again to restart from #0", index)
            }
            Directive::Ignore => {}
        }
    }

    // Drops any in-flight goal or pending dwell without waiting for it.
    fn abandon(&mut self) {
        if let Some(ticket) = self.core.shutdown() {
            info!("Abandoning in-flight goal {:?}", ticket);
        }
        if let Some(task) = self.goal_task.take() {
            task.abort();
        }
        if let Some(task) = self.dwell_task.take() {
            task.abort();
        }
    }
}
