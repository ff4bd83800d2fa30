// ros_interface/subscriber.rs
// Forwards robot poses from the configured topic into the runner's event channel.

use futures::{Stream, StreamExt};
use log::{debug, info};
use r2r::QosProfile;
use r2r::geometry_msgs::msg::{Pose, PoseStamped, PoseWithCovarianceStamped};
use r2r::nav_msgs::msg::Odometry;
use tokio::task::JoinHandle;

use crate::runner::{Event, EventSender};
use crate::{Orientation, PoseMessage, Position, RecorderError, RosConfig};

/// Subscribes to `config.pose_topic` and spawns the forwarding task
pub fn spawn_pose_feed(
    node: &mut r2r::Node,
    config: &RosConfig,
    events: EventSender,
) -> Result<JoinHandle<()>, RecorderError> {
    let topic = config.pose_topic.as_str();
    let qos = QosProfile::default();
    info!("Subscribing to {} ({:?})", topic, config.pose_message);

    let handle = match config.pose_message {
        PoseMessage::PoseStamped => {
            forward(node.subscribe::<PoseStamped>(topic, qos)?, |m: PoseStamped| m.pose, events)
        }
        PoseMessage::PoseWithCovarianceStamped => forward(
            node.subscribe::<PoseWithCovarianceStamped>(topic, qos)?,
            |m: PoseWithCovarianceStamped| m.pose.pose,
            events,
        ),
        PoseMessage::Odometry => {
            forward(node.subscribe::<Odometry>(topic, qos)?, |m: Odometry| m.pose.pose, events)
        }
    };
    Ok(handle)
}

fn forward<T, S>(mut stream: S, extract: fn(T) -> Pose, events: EventSender) -> JoinHandle<()>
where
    T: Send + 'static,
    S: Stream<Item = T> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            let pose = extract(msg);
            let event = Event::PoseSample {
                position: Position::new(pose.position.x, pose.position.y, pose.position.z),
                orientation: Orientation::new(
                    pose.orientation.w,
                    pose.orientation.x,
                    pose.orientation.y,
                    pose.orientation.z,
                ),
            };
            if events.send(event).is_err() {
                break;
            }
        }
        debug!("Pose feed closed");
    })
}
