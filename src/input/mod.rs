// input/mod.rs

// Keyboard commands for the recorder. A dedicated thread blocks on stdin and
// publishes one command per line into the runner's event channel, so the event
// loop never polls the terminal.

// Dependencies
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::thread;

use crate::runner::{Event, EventSender};

/// Operator commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Save the current pose as the next waypoint
    Record,
    /// Begin replaying the recorded waypoints
    StartSequence,
    /// Stop everything and exit
    Quit,
}

/// Keys bound to each command
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Record key
    pub record: char,
    /// Start-sequence key
    pub start: char,
    /// Quit key
    pub quit: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            record: 's',
            start: 'r',
            quit: 'q',
        }
    }
}

impl KeyBindings {
    /// Command bound to `key`, if any
    pub fn command_for(&self, key: char) -> Option<Command> {
        if key == self.record {
            Some(Command::Record)
        } else if key == self.start {
            Some(Command::StartSequence)
        } else if key == self.quit {
            Some(Command::Quit)
        } else {
            None
        }
    }

    /// Maps an input line to a command using its first non-blank character
    pub fn parse_line(&self, line: &str) -> Option<Command> {
        line.trim().chars().next().and_then(|key| self.command_for(key))
    }

    /// One-line usage hint
    pub fn help(&self) -> String {
        format!(
            "Press '{}' to save the current pose, '{}' to replay saved poses, '{}' to quit (then Enter)",
            self.record, self.start, self.quit
        )
    }
}

/// Spawns the stdin listener thread
///
/// The thread exits on EOF, on a read error, or once the runner has dropped its
/// receiver. It is never joined: a blocked read must not hold up shutdown.
pub fn spawn_keyboard_listener(
    bindings: KeyBindings,
    events: EventSender,
) -> std::io::Result<thread::JoinHandle<()>> {
    info!("{}", bindings.help());
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Keyboard input failed: {}", e);
                        break;
                    }
                };
                match bindings.parse_line(&line) {
                    Some(command) => {
                        if events.send(Event::Command(command)).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => debug!("Unbound input {:?}", line.trim()),
                }
            }
            debug!("Keyboard listener stopped");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("s", Some(Command::Record))]
    #[case("  r\n", Some(Command::StartSequence))]
    #[case("q", Some(Command::Quit))]
    #[case("sq", Some(Command::Record))]
    #[case("x", None)]
    #[case("", None)]
    fn default_bindings(#[case] line: &str, #[case] expected: Option<Command>) {
        assert_eq!(KeyBindings::default().parse_line(line), expected);
    }

    #[test]
    fn custom_bindings_from_yaml() {
        let bindings: KeyBindings = serde_yaml::from_str("record: p\nquit: x\n").unwrap();
        assert_eq!(bindings.command_for('p'), Some(Command::Record));
        assert_eq!(bindings.command_for('r'), Some(Command::StartSequence));
        assert_eq!(bindings.command_for('x'), Some(Command::Quit));
        assert_eq!(bindings.command_for('q'), None);
    }
}
