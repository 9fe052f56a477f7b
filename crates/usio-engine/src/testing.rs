//! A scripted controller on the far end of a socket pair.

use std::io::{BufRead, BufReader, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use usio_frame::{parse_line, Frame};

use crate::config::EngineConfig;
use crate::engine::{Engine, EngineTasks};

pub(crate) fn fast_config() -> EngineConfig {
    EngineConfig {
        response_timeout: Some(Duration::from_millis(100)),
        ..EngineConfig::default()
    }
}

pub(crate) struct FakeController {
    device: Arc<Mutex<UnixStream>>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl FakeController {
    /// Start an engine wired to a fake controller that answers every received
    /// command with the lines `respond` returns.
    pub(crate) fn start<F>(config: EngineConfig, respond: F) -> (Engine, EngineTasks, Self)
    where
        F: Fn(&Frame) -> Vec<String> + Send + 'static,
    {
        let (host, device) = UnixStream::pair().unwrap();
        let (engine, tasks) = Engine::spawn(host.try_clone().unwrap(), host, config).unwrap();

        let reader = BufReader::new(device.try_clone().unwrap());
        let device = Arc::new(Mutex::new(device));
        let lines = Arc::new(Mutex::new(Vec::new()));

        {
            let device = Arc::clone(&device);
            let lines = Arc::clone(&lines);
            thread::spawn(move || {
                for line in reader.lines() {
                    let Ok(line) = line else { break };
                    let Some(Ok(frame)) = line.strip_prefix('$').map(|l| parse_line(l.as_bytes()))
                    else {
                        continue;
                    };
                    lines.lock().unwrap().push(line);
                    for reply in respond(&frame) {
                        if device.lock().unwrap().write_all(reply.as_bytes()).is_err() {
                            return;
                        }
                    }
                }
            });
        }

        (engine, tasks, Self { device, lines })
    }

    /// Write raw bytes towards the engine as if the controller sent them.
    pub(crate) fn inject(&self, data: &str) {
        self.device
            .lock()
            .unwrap()
            .write_all(data.as_bytes())
            .unwrap();
    }

    /// Commands received so far.
    pub(crate) fn received(&self) -> Vec<Frame> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter_map(|line| line.strip_prefix('$'))
            .map(|line| parse_line(line.as_bytes()).unwrap())
            .collect()
    }

    /// The `index`th received line as it appeared on the wire, without terminator.
    pub(crate) fn raw_line(&self, index: usize) -> Option<String> {
        self.lines.lock().unwrap().get(index).cloned()
    }

    /// Wait until at least `count` commands have arrived.
    pub(crate) fn wait_received(&self, count: usize) -> Vec<Frame> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let received = self.received();
            if received.len() >= count {
                return received;
            }
            assert!(
                Instant::now() < deadline,
                "expected {count} commands, got {}",
                received.len()
            );
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Drop for FakeController {
    fn drop(&mut self) {
        if let Ok(device) = self.device.lock() {
            let _ = device.shutdown(Shutdown::Both);
        }
    }
}
