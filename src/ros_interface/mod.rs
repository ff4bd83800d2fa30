//! ROS 2 interface for the recorder
//!
//! This module handles all communication with ROS 2:
//! - Subscribing to the robot pose topic
//! - Sending `NavigateToPose` goals to Nav2
//! - Spinning the node on its own thread until shutdown

mod action_client;
mod subscriber;

use log::{debug, info};
use r2r::{Context, Node};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

pub use action_client::Nav2Gateway;
pub use subscriber::spawn_pose_feed;

use crate::runner::EventSender;
use crate::{NavigationConfig, RecorderError, RosConfig};

const SPIN_PERIOD: Duration = Duration::from_millis(100);

/// Owns the r2r node until it is handed to the spin thread
pub struct RosInterface {
    node: Node,
}

impl RosInterface {
    /// Creates the context and node
    pub fn new(config: &RosConfig) -> Result<Self, RecorderError> {
        let context = Context::create()?;
        let node = Node::create(context, &config.node_name, &config.namespace)?;
        info!(
            "ROS 2 node '{}' created in namespace '{}'",
            config.node_name, config.namespace
        );
        Ok(RosInterface { node })
    }

    /// Subscribes to the pose topic and forwards samples to the runner
    pub fn subscribe_poses(
        &mut self,
        config: &RosConfig,
        events: EventSender,
    ) -> Result<tokio::task::JoinHandle<()>, RecorderError> {
        spawn_pose_feed(&mut self.node, config, events)
    }

    /// Creates the Nav2 action client
    pub fn navigation_gateway(
        &mut self,
        config: &NavigationConfig,
    ) -> Result<Nav2Gateway, RecorderError> {
        Nav2Gateway::new(&mut self.node, config)
    }

    /// Moves the node onto a dedicated spin thread
    pub fn spin(self) -> Result<SpinHandle, RecorderError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let mut node = self.node;
        let thread = thread::Builder::new()
            .name("ros-spin".into())
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    node.spin_once(SPIN_PERIOD);
                }
                debug!("ROS spin thread stopped");
            })?;
        Ok(SpinHandle { running, thread })
    }
}

/// Running spin thread
pub struct SpinHandle {
    running: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl SpinHandle {
    /// Stops spinning and waits for the thread; the node is dropped with it
    pub fn shutdown(self) {
        self.running.store(false, Ordering::Release);
        if self.thread.join().is_err() {
            log::error!("ROS spin thread panicked");
        }
        info!("ROS interface shutdown complete");
    }
}
