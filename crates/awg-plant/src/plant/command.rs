//! UI -> simulation command channel.
//!
//! UI code holds a [`ControlHandle`] (possibly on another thread) and sends
//! commands; the runner drains the [`CommandQueue`] between ticks, so every
//! command lands wholly before or wholly after a given tick.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use awg_sim::StageRequest;
use serde::{Deserialize, Serialize};

/// A user interaction forwarded to the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Next,
    Previous,
    Reset,
    JumpTo { index: usize },
    JumpToKey { key: String },
    SetAutoAdvance { enabled: bool, period_ms: u64 },
    SetInputs { flow: f32, condensation: f32 },
    TogglePause,
}

impl Command {
    /// The navigation request this command maps to, if it is one.
    pub fn stage_request(&self) -> Option<StageRequest> {
        match self {
            Command::Next => Some(StageRequest::Next),
            Command::Previous => Some(StageRequest::Previous),
            Command::Reset => Some(StageRequest::Reset),
            Command::JumpTo { index } => Some(StageRequest::JumpTo(*index)),
            _ => None,
        }
    }
}

/// Sending side, cheap to clone.
#[derive(Clone, Debug)]
pub struct ControlHandle {
    tx: Sender<Command>,
}

impl ControlHandle {
    /// Returns false once the runner is gone.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Receiving side, owned by the runner.
#[derive(Debug)]
pub struct CommandQueue {
    rx: Receiver<Command>,
}

impl CommandQueue {
    /// Everything queued so far, in send order. Never blocks.
    pub fn drain(&self) -> Vec<Command> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(cmd) => out.push(cmd),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}

pub fn command_channel() -> (ControlHandle, CommandQueue) {
    let (tx, rx) = mpsc::channel();
    (ControlHandle { tx }, CommandQueue { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let (handle, queue) = command_channel();
        handle.send(Command::Next);
        handle.send(Command::SetInputs {
            flow: 0.2,
            condensation: 0.9,
        });
        handle.send(Command::TogglePause);

        let drained = queue.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], Command::Next);
        assert_eq!(drained[2], Command::TogglePause);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_send_from_other_thread() {
        let (handle, queue) = command_channel();
        let remote = handle.clone();
        std::thread::spawn(move || {
            remote.send(Command::JumpTo { index: 3 });
        })
        .join()
        .unwrap();
        assert_eq!(queue.drain(), vec![Command::JumpTo { index: 3 }]);
    }

    #[test]
    fn test_send_after_queue_dropped() {
        let (handle, queue) = command_channel();
        drop(queue);
        assert!(!handle.send(Command::Reset));
    }

    #[test]
    fn test_stage_request_mapping() {
        assert_eq!(Command::Reset.stage_request(), Some(StageRequest::Reset));
        assert_eq!(
            Command::JumpTo { index: 2 }.stage_request(),
            Some(StageRequest::JumpTo(2))
        );
        assert_eq!(Command::TogglePause.stage_request(), None);
    }

    #[test]
    fn test_tagged_json() {
        let json = serde_json::to_string(&Command::JumpToKey { key: "uv".into() }).unwrap();
        assert_eq!(json, r#"{"type":"jump_to_key","key":"uv"}"#);
        let back: Command = serde_json::from_str(r#"{"type":"next"}"#).unwrap();
        assert_eq!(back, Command::Next);
    }
}
