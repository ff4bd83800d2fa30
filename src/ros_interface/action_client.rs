// ros_interface/action_client.rs
// Nav2 `NavigateToPose` client behind the NavigationGateway seam.

use async_trait::async_trait;
use log::{error, info};
use r2r::GoalStatus;
use r2r::nav2_msgs::action::NavigateToPose;
use std::time::Duration;

use crate::navigation::{Backoff, GatewayError, GoalOutcome, NavigationGateway};
use crate::{NavigationConfig, RecorderError, Waypoint};

/// Sends waypoints to Nav2 as `NavigateToPose` goals
pub struct Nav2Gateway {
    client: r2r::ActionClient<NavigateToPose::Action>,
    action_name: String,
    frame_id: String,
    server_wait: Duration,
    backoff: Backoff,
}

impl Nav2Gateway {
    /// Creates the action client on `node`
    pub fn new(node: &mut r2r::Node, config: &NavigationConfig) -> Result<Self, RecorderError> {
        let client = node.create_action_client::<NavigateToPose::Action>(&config.action_name)?;
        Ok(Nav2Gateway {
            client,
            action_name: config.action_name.clone(),
            frame_id: config.frame_id.clone(),
            server_wait: config.server_wait(),
            backoff: config.retry_backoff(),
        })
    }

    // Blocks this goal (not the event loop) until the server answers.
    async fn wait_for_server(&self) {
        let mut backoff = self.backoff.clone();
        loop {
            match r2r::Node::is_available(&self.client) {
                Ok(available) => match tokio::time::timeout(self.server_wait, available).await {
                    Ok(Ok(())) => {
                        info!("Action server available.");
                        return;
                    }
                    Ok(Err(e)) => error!("Action server {} check failed: {}", self.action_name, e),
                    Err(_) => error!(
                        "Action server {} not available after waiting {:?}",
                        self.action_name, self.server_wait
                    ),
                },
                Err(e) => error!("Action server {} check failed: {}", self.action_name, e),
            }
            tokio::time::sleep(backoff.next_delay()).await;
        }
    }

    fn goal_for(&self, waypoint: &Waypoint) -> NavigateToPose::Goal {
        let mut goal = NavigateToPose::Goal::default();
        goal.pose.header.frame_id = self.frame_id.clone();
        goal.pose.pose.position.x = waypoint.position.x;
        goal.pose.pose.position.y = waypoint.position.y;
        goal.pose.pose.position.z = waypoint.position.z;
        goal.pose.pose.orientation.x = waypoint.orientation.i;
        goal.pose.pose.orientation.y = waypoint.orientation.j;
        goal.pose.pose.orientation.z = waypoint.orientation.k;
        goal.pose.pose.orientation.w = waypoint.orientation.w;
        goal
    }
}

#[async_trait]
impl NavigationGateway for Nav2Gateway {
    async fn navigate(&self, waypoint: Waypoint) -> Result<GoalOutcome, GatewayError> {
        self.wait_for_server().await;

        let goal = self.goal_for(&waypoint);
        info!(
            "Sending goal to ({:.3}, {:.3}, {:.3}) in '{}'",
            waypoint.position.x, waypoint.position.y, waypoint.position.z, self.frame_id
        );

        let request = self
            .client
            .send_goal_request(goal)
            .map_err(|e| GatewayError::Send(e.to_string()))?;
        let (_handle, result, _feedback) = request
            .await
            .map_err(|e| GatewayError::Rejected(e.to_string()))?;
        let (status, _) = result
            .await
            .map_err(|e| GatewayError::Result(e.to_string()))?;

        Ok(outcome_from_status(status))
    }
}

fn outcome_from_status(status: GoalStatus) -> GoalOutcome {
    match status {
        GoalStatus::Succeeded => GoalOutcome::Succeeded,
        GoalStatus::Aborted => GoalOutcome::Aborted,
        GoalStatus::Canceled => GoalOutcome::Canceled,
        other => GoalOutcome::Unknown(format!("{:?}", other)),
    }
}
