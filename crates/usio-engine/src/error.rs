use std::fmt;

/// A high-level controller operation, named in failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RelaySet { port: i64, state: i64 },
    RelayGet { port: i64 },
    InputGet { port: i64 },
    WatchdogSet { enabled: bool },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::RelaySet { port, state } => {
                write!(f, "can't set relay {port} state to {state}")
            }
            Operation::RelayGet { port } => write!(f, "can't get output {port} state"),
            Operation::InputGet { port } => write!(f, "can't get input {port} state"),
            Operation::WatchdogSet { enabled } => {
                write!(f, "can't set watchdog state {}", u8::from(*enabled))
            }
        }
    }
}

/// Errors that can occur in engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] usio_transport::TransportError),

    /// Sentence-level error.
    #[error("frame error: {0}")]
    Frame(#[from] usio_frame::FrameError),

    /// No confirming response within the attempt budget.
    #[error("{operation} (no confirmation after {attempts} attempts)")]
    OperationFailed { operation: Operation, attempts: u32 },

    /// The transmitter loop has stopped; nothing more can be sent.
    #[error("serial link is down")]
    Disconnected,

    /// Writing to the device failed. The link is unusable.
    #[error("can't write to serial device: {0}")]
    Write(usio_frame::FrameError),

    /// An engine thread could not be started.
    #[error("can't start {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },

    /// An engine thread panicked.
    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
