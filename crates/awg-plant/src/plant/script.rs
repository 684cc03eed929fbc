//! Timed command scripts for unattended runs.
//!
//! A script stands in for a user at the controls: each event is sent to the
//! runner's command channel once the session clock reaches `at_ms`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::command::Command;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script io: {0}")]
    Io(#[from] std::io::Error),
    #[error("script json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("script yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    pub at_ms: u64,
    pub command: Command,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub events: Vec<ScriptEvent>,
}

impl Script {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            events: Vec::new(),
        }
    }

    pub fn at(mut self, at_ms: u64, command: Command) -> Self {
        self.events.push(ScriptEvent { at_ms, command });
        self
    }

    /// Load script from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load script from a YAML file.
    pub fn load_yaml(path: &Path) -> Result<Self, ScriptError> {
        let yaml = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::load_yaml(path),
            _ => Self::load_json(path),
        }
    }
}

/// Plays a script against a session clock.
#[derive(Clone, Debug)]
pub struct ScriptPlayer {
    events: Vec<ScriptEvent>,
    next: usize,
}

impl ScriptPlayer {
    pub fn new(script: Script) -> Self {
        let mut events = script.events;
        // Stable: same-time events keep file order.
        events.sort_by_key(|e| e.at_ms);
        Self { events, next: 0 }
    }

    /// Commands whose time has come, each returned once.
    pub fn due(&mut self, now_ms: u64) -> Vec<Command> {
        let start = self.next;
        while self.next < self.events.len() && self.events[self.next].at_ms <= now_ms {
            self.next += 1;
        }
        self.events[start..self.next]
            .iter()
            .map(|e| e.command.clone())
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_releases_in_time_order() {
        let script = Script::new("t")
            .at(1000, Command::Next)
            .at(200, Command::TogglePause)
            .at(1000, Command::Reset);
        let mut player = ScriptPlayer::new(script);

        assert!(player.due(100).is_empty());
        assert_eq!(player.due(500), vec![Command::TogglePause]);
        assert_eq!(player.due(1500), vec![Command::Next, Command::Reset]);
        assert!(player.due(5000).is_empty());
        assert!(player.is_finished());
    }

    #[test]
    fn test_yaml_script_parses() {
        let yaml = r#"
name: demo
events:
  - at_ms: 500
    command:
      type: set_inputs
      flow: 0.9
      condensation: 0.3
  - at_ms: 1200
    command:
      type: jump_to_key
      key: uv-treatment
"#;
        let script: Script = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(script.events.len(), 2);
        assert_eq!(
            script.events[1].command,
            Command::JumpToKey {
                key: "uv-treatment".into()
            }
        );
        assert!(script.description.is_empty());
    }
}
