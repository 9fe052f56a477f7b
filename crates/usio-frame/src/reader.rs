use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::codec::{Frame, FrameConfig, NmeaParser};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 64;

/// Reads decoded sentences from any `Read` stream.
///
/// Bytes may arrive with any granularity; parser state survives across
/// calls, including calls that returned an I/O error.
pub struct FrameReader<T> {
    inner: T,
    parser: NmeaParser,
    ready: VecDeque<Frame>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            parser: NmeaParser::with_config(&config),
            ready: VecDeque::new(),
        }
    }

    /// Read the next valid sentence (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` on a zero-byte read.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            for byte in &chunk[..read] {
                if let Some(frame) = self.parser.push_byte(*byte) {
                    self.ready.push_back(frame);
                }
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
