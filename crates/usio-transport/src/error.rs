use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open or configure the serial device.
    #[error("can't open {path}: {source}")]
    Open {
        path: PathBuf,
        source: serialport::Error,
    },

    /// The baud rate cannot be applied to a serial line.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),

    /// Failed to bind the control socket.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the control socket.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on a transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

impl TransportError {
    /// The underlying OS error kind, when there is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Open { source, .. } => match source.kind() {
                serialport::ErrorKind::Io(kind) => Some(kind),
                _ => None,
            },
            TransportError::Bind { source, .. }
            | TransportError::Connect { source, .. }
            | TransportError::Accept(source)
            | TransportError::Io(source) => Some(source.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
