//! Waypoint recorder - record robot poses and replay them as navigation goals
//!
//! Poses arrive from a localization topic and are cached; the operator saves
//! them as waypoints from the keyboard, then starts playback. Playback sends one
//! Nav2 goal at a time and decides what comes next from each result, including
//! fixed dwells at waypoints 6 and 8 and the wrap rules at the end of the list.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod core;
pub mod input;
pub mod navigation;
pub mod runner;
#[cfg(feature = "ros2")]
pub mod ros_interface;

// Re-export commonly used items for easier access
pub use crate::core::{Core, Orientation, PoseCache, Position, SequenceController, Waypoint, WaypointStore};
pub use input::{Command, KeyBindings};
pub use navigation::{GatewayError, GoalOutcome, NavigationGateway};
pub use runner::{Event, EventSender, Runner};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the recorder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// ROS 2 node and pose topic settings
    pub ros: RosConfig,
    /// Navigation action settings
    pub navigation: NavigationConfig,
    /// Keyboard bindings
    pub keys: KeyBindings,
}

impl RecorderConfig {
    /// Loads a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RecorderError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Parses YAML configuration text
    pub fn from_yaml_str(text: &str) -> Result<Self, RecorderError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Message type published on the pose topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseMessage {
    /// `geometry_msgs/PoseStamped`
    #[default]
    PoseStamped,
    /// `geometry_msgs/PoseWithCovarianceStamped`, e.g. `/amcl_pose`
    PoseWithCovarianceStamped,
    /// `nav_msgs/Odometry`
    Odometry,
}

/// ROS 2 specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosConfig {
    /// Node name
    pub node_name: String,
    /// Node namespace
    pub namespace: String,
    /// Topic carrying the robot pose
    pub pose_topic: String,
    /// Message type on `pose_topic`
    pub pose_message: PoseMessage,
}

impl Default for RosConfig {
    fn default() -> Self {
        RosConfig {
            node_name: "pose_subscriber".to_string(),
            namespace: String::new(),
            pose_topic: "/odom".to_string(),
            pose_message: PoseMessage::PoseStamped,
        }
    }
}

/// Navigation action configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// `NavigateToPose` action name
    pub action_name: String,
    /// Frame the goals are expressed in
    pub frame_id: String,
    /// How long one availability check waits for the action server
    pub server_wait_secs: f64,
    /// First delay between availability checks
    pub retry_initial_secs: f64,
    /// Longest delay between availability checks
    pub retry_max_secs: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            action_name: "/navigate_to_pose".to_string(),
            frame_id: "map".to_string(),
            server_wait_secs: 2.0,
            retry_initial_secs: 0.5,
            retry_max_secs: 5.0,
        }
    }
}

impl NavigationConfig {
    /// Availability check timeout
    pub fn server_wait(&self) -> Duration {
        secs(self.server_wait_secs)
    }

    /// Retry backoff for an unavailable server
    pub fn retry_backoff(&self) -> navigation::Backoff {
        navigation::Backoff::new(secs(self.retry_initial_secs), secs(self.retry_max_secs))
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Recorder error types
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// Playback requested with an empty store
    #[error("no waypoints recorded")]
    NoWaypointsRecorded,
    /// Record requested before any pose arrived
    #[error("no pose received yet")]
    NoPoseAvailable,
    /// Record requested after playback started
    #[error("waypoints are read-only once playback has started")]
    StoreFrozen,
    /// Start requested while a goal or dwell is pending
    #[error("sequence already running")]
    SequenceAlreadyActive,
    /// The sequencer has been shut down
    #[error("sequencer is shut down")]
    ShutDown,
    /// Internal invariant violation
    #[error("waypoint index {index} out of range for {len} waypoints")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Store size
        len: usize,
    },
    /// Config file or thread spawn I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file could not be parsed
    #[error("config parse error: {0}")]
    Config(#[from] serde_yaml::Error),
    /// ROS 2 failure
    #[cfg(feature = "ros2")]
    #[error("ROS error: {0}")]
    Ros(#[from] r2r::Error),
}

impl RecorderError {
    /// Fatal errors end the session; the rest are operator warnings
    pub fn is_fatal(&self) -> bool {
        match self {
            RecorderError::NoWaypointsRecorded
            | RecorderError::NoPoseAvailable
            | RecorderError::StoreFrozen
            | RecorderError::SequenceAlreadyActive
            | RecorderError::ShutDown => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = RecorderConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, RecorderConfig::default());
        assert_eq!(config.ros.pose_topic, "/odom");
        assert_eq!(config.navigation.server_wait(), Duration::from_secs(2));
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let config = RecorderConfig::from_yaml_str(
            "ros:\n  pose_topic: /amcl_pose\n  pose_message: pose_with_covariance_stamped\nnavigation:\n  frame_id: odom\n",
        )
        .unwrap();
        assert_eq!(config.ros.pose_topic, "/amcl_pose");
        assert_eq!(config.ros.pose_message, PoseMessage::PoseWithCovarianceStamped);
        assert_eq!(config.ros.node_name, "pose_subscriber");
        assert_eq!(config.navigation.frame_id, "odom");
        assert_eq!(config.navigation.action_name, "/navigate_to_pose");
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/recorder.yaml");
        assert_eq!(RecorderConfig::from_file(path).unwrap(), RecorderConfig::default());
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = RecorderConfig::from_file("/nonexistent/recorder.yaml").unwrap_err();
        assert!(matches!(err, RecorderError::Io(_)));
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let err = RecorderConfig::from_yaml_str("ros: [1, 2").unwrap_err();
        assert!(matches!(err, RecorderError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        let navigation = NavigationConfig {
            server_wait_secs: -1.0,
            ..NavigationConfig::default()
        };
        assert_eq!(navigation.server_wait(), Duration::ZERO);
    }
}
