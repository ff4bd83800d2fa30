// src/main.rs
// Entry point for the waypoint recorder: loads configuration, wires the ROS 2
// pose feed, Nav2 client, keyboard and Ctrl+C into the runner, and shuts down
// in order (input, then the ROS executor, then the process).

use clap::Parser;
use std::path::PathBuf;

/// Record robot poses from the keyboard and replay them as Nav2 goals.
#[derive(Parser, Debug)]
#[cfg_attr(not(feature = "ros2"), allow(dead_code))]
#[command(name = "waypoint_recorder", version, about)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the pose topic from the configuration
    #[arg(long)]
    pose_topic: Option<String>,

    /// Override the goal frame from the configuration
    #[arg(long)]
    frame_id: Option<String>,
}

#[cfg(feature = "ros2")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use log::info;
    use std::sync::Arc;
    use waypoint_recorder::ros_interface::RosInterface;
    use waypoint_recorder::runner::{self, Event, Runner};
    use waypoint_recorder::{RecorderConfig, input};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RecorderConfig::from_file(path)?,
        None => RecorderConfig::default(),
    };
    if let Some(topic) = cli.pose_topic {
        config.ros.pose_topic = topic;
    }
    if let Some(frame_id) = cli.frame_id {
        config.navigation.frame_id = frame_id;
    }
    info!("Starting waypoint recorder...");

    let (events, inbox) = runner::channel();

    let mut ros = RosInterface::new(&config.ros)?;
    let pose_feed = ros.subscribe_poses(&config.ros, events.clone())?;
    let gateway = Arc::new(ros.navigation_gateway(&config.navigation)?);
    let spinner = ros.spin()?;

    let interrupts = events.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupts.send(Event::Interrupt);
        }
    });
    input::spawn_keyboard_listener(config.keys.clone(), events.clone())?;

    let mut runner = Runner::new(gateway, (events, inbox));
    let result = runner.run().await;

    // The keyboard thread stays blocked on stdin and dies with the process.
    pose_feed.abort();
    drop(runner);
    spinner.shutdown();
    info!("Waypoint recorder stopped");

    result?;
    Ok(())
}

#[cfg(not(feature = "ros2"))]
fn main() {
    let _ = Cli::parse();
    eprintln!("waypoint_recorder was built without the `ros2` feature; rebuild with --features ros2");
}
