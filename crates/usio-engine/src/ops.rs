//! High-level controller operations.
//!
//! Each operation sends its command, waits for the matching status sentence
//! and checks the echoed arguments. A timeout or a mismatched echo costs one
//! attempt; running out of attempts yields [`EngineError::OperationFailed`].

use tracing::{debug, warn};
use usio_frame::{
    Frame, INPUT_READ, INPUT_STATUS, OUTPUT_STATUS, RELAY_READ, RELAY_WRITE, TALKER_PC,
    WATCHDOG_CONTROL, WATCHDOG_RESET, WATCHDOG_STATUS,
};

use crate::engine::Engine;
use crate::error::{EngineError, Operation, Result};
use crate::BROADCAST_REQUEST_ID;

/// Bit of the `WDS` state argument that reports whether the watchdog is armed.
const WATCHDOG_ENABLED_BIT: i64 = 1;

impl Engine {
    /// Drive relay `port` to `state` and wait for the controller to confirm it.
    pub fn relay_set_state(&self, request_id: i64, port: i64, state: i64) -> Result<()> {
        self.with_retries(
            Operation::RelaySet { port, state },
            request_id,
            RELAY_WRITE,
            &[port, state],
            OUTPUT_STATUS,
            |frame| frame.arg(1) == Some(port) && frame.arg(2) == Some(state),
        )
        .map(|_| ())
    }

    /// Read the state of relay `port`.
    pub fn output_port_state(&self, request_id: i64, port: i64) -> Result<i64> {
        let frame = self.with_retries(
            Operation::RelayGet { port },
            request_id,
            RELAY_READ,
            &[port],
            OUTPUT_STATUS,
            |frame| frame.arg(1) == Some(port) && frame.arg(2).is_some(),
        )?;
        Ok(frame.arg(2).unwrap_or_default())
    }

    /// Read the state of input `port`.
    pub fn input_port_state(&self, request_id: i64, port: i64) -> Result<i64> {
        let frame = self.with_retries(
            Operation::InputGet { port },
            request_id,
            INPUT_READ,
            &[port],
            INPUT_STATUS,
            |frame| frame.arg(1) == Some(port) && frame.arg(2).is_some(),
        )?;
        Ok(frame.arg(2).unwrap_or_default())
    }

    /// Arm or disarm the hardware watchdog.
    pub fn set_watchdog(&self, request_id: i64, enabled: bool) -> Result<()> {
        let state = i64::from(enabled);
        self.with_retries(
            Operation::WatchdogSet { enabled },
            request_id,
            WATCHDOG_CONTROL,
            &[state],
            WATCHDOG_STATUS,
            |frame| {
                frame
                    .arg(1)
                    .is_some_and(|bits| bits & WATCHDOG_ENABLED_BIT == state)
            },
        )
        .map(|_| ())
    }

    /// Pulse the watchdog. Fire-and-forget: nothing is awaited.
    pub fn reset_watchdog(&self) -> Result<()> {
        self.send_cmd(BROADCAST_REQUEST_ID, TALKER_PC, WATCHDOG_RESET, &[])
    }

    fn with_retries<F>(
        &self,
        operation: Operation,
        request_id: i64,
        command: &str,
        args: &[i64],
        status: &str,
        accept: F,
    ) -> Result<Frame>
    where
        F: Fn(&Frame) -> bool,
    {
        let attempts = self.config().attempts;
        let timeout = self.config().response_timeout;

        for attempt in 1..=attempts {
            self.send_cmd(request_id, TALKER_PC, command, args)?;

            match self.recv(request_id, status, timeout) {
                Some(frame) if accept(&frame) => return Ok(frame),
                Some(frame) => {
                    debug!(request_id, attempt, %frame, "echo does not match request; retrying")
                }
                None => debug!(request_id, attempt, sentence = status, "no status in time; retrying"),
            }
        }

        warn!(request_id, attempts, %operation, "operation failed");
        Err(EngineError::OperationFailed {
            operation,
            attempts,
        })
    }
}
