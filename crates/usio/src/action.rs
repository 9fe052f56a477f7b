use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use usio_engine::{DeviceEvent, Engine};

/// How often the event loop checks for shutdown while idle.
const EVENT_POLL: Duration = Duration::from_millis(500);

/// Runs the configured script for controller events.
#[derive(Debug, Clone)]
pub struct ActionRunner {
    script: PathBuf,
    workdir: PathBuf,
}

impl ActionRunner {
    pub fn new(script: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            workdir: workdir.into(),
        }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Run `<script> <kind> <port> <state>` and wait for it to exit.
    pub fn run(&self, event: &DeviceEvent) -> io::Result<ExitStatus> {
        Command::new(&self.script)
            .arg(event.action())
            .arg(event.port().to_string())
            .arg(event.state().to_string())
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .status()
    }
}

/// Claim controller events until `running` is cleared, running the action
/// script for each one.
pub fn event_loop(engine: Engine, runner: Option<ActionRunner>, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        let Some(event) = engine.next_event(Some(EVENT_POLL)) else {
            continue;
        };
        info!(%event, "controller event");

        let Some(runner) = &runner else {
            continue;
        };
        match runner.run(&event) {
            Ok(status) if status.success() => {
                debug!(action = event.action(), "action script finished");
            }
            Ok(status) => {
                warn!(action = event.action(), %status, "action script failed");
            }
            Err(err) => {
                error!(script = ?runner.script(), error = %err, "can't run action script");
            }
        }
    }
    debug!("event loop stopping");
}
