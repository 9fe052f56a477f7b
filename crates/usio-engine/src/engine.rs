use std::io::{ErrorKind, Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};
use usio_frame::{Frame, FrameError, FrameReader, FrameWriter};
use usio_transport::SerialPort;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pending::PendingQueue;

const BACKOFF_INITIAL: Duration = Duration::from_millis(5);
const BACKOFF_MAX: Duration = Duration::from_millis(500);

/// Handle to a running protocol engine.
///
/// Cheap to clone; every clone talks to the same device. The receiver and
/// transmitter threads stop once the last handle is dropped.
#[derive(Clone)]
pub struct Engine {
    outgoing: SyncSender<Frame>,
    pending: Arc<PendingQueue>,
    config: Arc<EngineConfig>,
}

/// The engine's background threads.
pub struct EngineTasks {
    receiver: JoinHandle<()>,
    transmitter: JoinHandle<Result<()>>,
}

impl EngineTasks {
    /// Block until the transmitter stops.
    ///
    /// Returns `Err(EngineError::Write)` when the device write failed; the link
    /// is then unusable and the caller should shut down.
    pub fn wait_transmitter(self) -> Result<()> {
        self.transmitter
            .join()
            .map_err(|_| EngineError::Panicked("transmitter"))?
    }

    /// Whether the transmitter has already stopped.
    pub fn transmitter_finished(&self) -> bool {
        self.transmitter.is_finished()
    }

    /// Whether the receiver has already stopped.
    pub fn receiver_finished(&self) -> bool {
        self.receiver.is_finished()
    }
}

impl Engine {
    /// Start the engine on an opened serial port.
    pub fn start(port: SerialPort, config: EngineConfig) -> Result<(Self, EngineTasks)> {
        let reader = port.try_clone()?;
        info!(path = ?port.path(), baud_rate = port.baud_rate(), "starting protocol engine");
        Self::spawn(reader, port, config)
    }

    /// Start the engine on any byte stream split into its read and write halves.
    pub fn spawn<R, W>(reader: R, writer: W, config: EngineConfig) -> Result<(Self, EngineTasks)>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let pending = Arc::new(PendingQueue::new(config.pending_max_age));
        let (outgoing, queue) = mpsc::sync_channel(config.tx_queue_capacity);

        let frames = FrameReader::with_config(reader, config.frame.clone());
        let weak = Arc::downgrade(&pending);
        let receiver = thread::Builder::new()
            .name("usio-rx".to_string())
            .spawn(move || receiver_loop(frames, weak))
            .map_err(|source| EngineError::Spawn {
                name: "receiver",
                source,
            })?;

        let writer = FrameWriter::new(writer);
        let transmitter = thread::Builder::new()
            .name("usio-tx".to_string())
            .spawn(move || transmitter_loop(writer, queue))
            .map_err(|source| EngineError::Spawn {
                name: "transmitter",
                source,
            })?;

        let engine = Self {
            outgoing,
            pending,
            config: Arc::new(config),
        };
        Ok((
            engine,
            EngineTasks {
                receiver,
                transmitter,
            },
        ))
    }

    /// Queue a command with `request_id` prepended to its arguments.
    ///
    /// Blocks while the outgoing queue is full. Does not wait for a response.
    pub fn send_cmd(
        &self,
        request_id: i64,
        talker_id: &str,
        sentence_id: &str,
        args: &[i64],
    ) -> Result<()> {
        let mut full_args = Vec::with_capacity(args.len() + 1);
        full_args.push(request_id);
        full_args.extend_from_slice(args);

        let frame = Frame::new(talker_id, sentence_id, full_args);
        frame.validate()?;

        debug!(request_id, sentence = sentence_id, "queueing command");
        self.outgoing
            .send(frame)
            .map_err(|_| EngineError::Disconnected)
    }

    /// Claim the response for `request_id` with the given sentence id (empty = any).
    ///
    /// `None` waits indefinitely; `Some(t)` returns `None` after `t` without a match.
    pub fn recv(&self, request_id: i64, sentence_id: &str, timeout: Option<Duration>) -> Option<Frame> {
        if sentence_id.is_empty() {
            self.recv_any(request_id, &[], timeout)
        } else {
            self.recv_any(request_id, &[sentence_id], timeout)
        }
    }

    /// Claim a sentence for `request_id` matching any of `sentence_ids` (empty = any).
    pub fn recv_any(
        &self,
        request_id: i64,
        sentence_ids: &[&str],
        timeout: Option<Duration>,
    ) -> Option<Frame> {
        self.pending.wait_for(request_id, sentence_ids, timeout)
    }

    /// Number of received sentences nobody has claimed yet.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn receiver_loop<R: Read>(mut frames: FrameReader<R>, pending: Weak<PendingQueue>) {
    let mut backoff = Backoff::default();

    loop {
        match frames.read_frame() {
            Ok(frame) => {
                backoff.reset();
                let Some(pending) = pending.upgrade() else {
                    break;
                };
                debug!(%frame, "received sentence");
                pending.push(frame);
            }
            Err(FrameError::Io(err)) if is_idle(&err) => {
                if pending.strong_count() == 0 {
                    break;
                }
            }
            Err(err) => {
                if pending.strong_count() == 0 {
                    break;
                }
                let delay = backoff.next_delay();
                if backoff.streak() == 1 {
                    warn!(error = %err, "serial read failed; retrying");
                } else {
                    debug!(error = %err, ?delay, streak = backoff.streak(), "serial read still failing");
                }
                thread::sleep(delay);
            }
        }
    }

    debug!("engine dropped; receiver stopping");
}

// Nothing arrived within the device's poll interval.
fn is_idle(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

fn transmitter_loop<W: Write>(mut writer: FrameWriter<W>, queue: Receiver<Frame>) -> Result<()> {
    for frame in queue {
        if let Err(err) = writer.write_frame(&frame) {
            error!(error = %err, %frame, "serial write failed; link unusable");
            return Err(EngineError::Write(err));
        }
        debug!(%frame, "sent sentence");
    }

    debug!("command queue closed; transmitter stopping");
    Ok(())
}

/// Doubling delay for consecutive receive failures.
#[derive(Debug, Default)]
struct Backoff {
    streak: u32,
}

impl Backoff {
    fn next_delay(&mut self) -> Duration {
        self.streak = self.streak.saturating_add(1);
        let factor = 1u32 << self.streak.saturating_sub(1).min(16);
        BACKOFF_INITIAL.saturating_mul(factor).min(BACKOFF_MAX)
    }

    fn streak(&self) -> u32 {
        self.streak
    }

    fn reset(&mut self) {
        self.streak = 0;
    }
}
