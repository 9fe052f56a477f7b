use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits, TTYPort};
use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Poll interval of the underlying device. An idle read returns
/// `ErrorKind::TimedOut` after this long; writes retry past it.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Serial line settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device node, e.g. `/dev/ttyS1`.
    pub path: PathBuf,
    /// Line speed in bits per second.
    pub baud_rate: u32,
}

impl SerialConfig {
    pub fn new(path: impl Into<PathBuf>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

/// An open serial device in raw mode (8N1, no flow control, no echo, no line
/// editing), held exclusively.
///
/// Reads block for at most the poll interval, then fail with
/// `ErrorKind::TimedOut` so a reader thread can notice it is no longer needed.
pub struct SerialPort {
    inner: TTYPort,
    path: PathBuf,
    baud_rate: u32,
}

impl SerialPort {
    /// Open the device and apply raw-mode line settings.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        if config.baud_rate == 0 {
            return Err(TransportError::UnsupportedBaud(config.baud_rate));
        }
        let path = config.path.clone();

        let inner = serialport::new(path.to_string_lossy(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(POLL_INTERVAL)
            .open_native()
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        info!(?path, baud_rate = config.baud_rate, "serial device configured");

        Ok(Self {
            inner,
            path,
            baud_rate: config.baud_rate,
        })
    }

    /// Duplicate the descriptor so reading and writing can live on separate threads.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = self
            .inner
            .try_clone_native()
            .map_err(|source| TransportError::Open {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = ?self.path, "serial descriptor duplicated");
        Ok(Self {
            inner,
            path: self.path.clone(),
            baud_rate: self.baud_rate,
        })
    }

    /// Device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured line speed.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        loop {
            match self.inner.write(buf) {
                Err(err) if err.kind() == ErrorKind::TimedOut => continue,
                other => return other,
            }
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .finish()
    }
}
