use std::fmt;
use std::time::Duration;

use usio_frame::{Frame, EVENT_INPUT_CHANGED, EVENT_RESTARTED};

use crate::engine::Engine;
use crate::BROADCAST_REQUEST_ID;

/// An unsolicited report from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// An input port changed state (`AIP`).
    InputChanged { port: i64, state: i64 },
    /// The controller restarted itself (`ASP`).
    Restarted,
}

impl DeviceEvent {
    /// Decode an event sentence; `None` for anything else.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        match frame.sentence_id.as_str() {
            EVENT_INPUT_CHANGED => Some(DeviceEvent::InputChanged {
                port: frame.arg(1).unwrap_or_default(),
                state: frame.arg(2).unwrap_or_default(),
            }),
            EVENT_RESTARTED => Some(DeviceEvent::Restarted),
            _ => None,
        }
    }

    /// Event kind passed to the action script.
    pub fn action(&self) -> &'static str {
        match self {
            DeviceEvent::InputChanged { .. } => "io_input",
            DeviceEvent::Restarted => "restart",
        }
    }

    pub fn port(&self) -> i64 {
        match self {
            DeviceEvent::InputChanged { port, .. } => *port,
            DeviceEvent::Restarted => 0,
        }
    }

    pub fn state(&self) -> i64 {
        match self {
            DeviceEvent::InputChanged { state, .. } => *state,
            DeviceEvent::Restarted => 0,
        }
    }
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceEvent::InputChanged { port, state } => {
                write!(f, "input {port} changed to {state}")
            }
            DeviceEvent::Restarted => f.write_str("controller restarted"),
        }
    }
}

impl Engine {
    /// Claim the next unsolicited event.
    ///
    /// `None` waits indefinitely; with `Some(t)` returns `None` once `t` passes
    /// without an event.
    pub fn next_event(&self, timeout: Option<Duration>) -> Option<DeviceEvent> {
        let frame = self.recv_any(
            BROADCAST_REQUEST_ID,
            &[EVENT_INPUT_CHANGED, EVENT_RESTARTED],
            timeout,
        )?;
        DeviceEvent::from_frame(&frame)
    }
}
