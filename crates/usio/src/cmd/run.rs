use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{error, info};
use usio_engine::Engine;
use usio_transport::{ControlListener, SerialPort};

use crate::action::{event_loop, ActionRunner};
use crate::cmd::RunArgs;
use crate::config::DaemonConfig;
use crate::exit::{
    config_error, engine_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS,
};
use crate::server::serve;

/// How often the supervisor checks for shutdown or a dead serial link.
const SUPERVISE_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: RunArgs, config_path: &Path) -> CliResult<i32> {
    let mut config = DaemonConfig::load(config_path).map_err(config_error)?;
    if let Some(device) = args.device {
        config.uart_dev = device;
    }
    if let Some(socket) = args.socket {
        config.control_socket = socket;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let port = SerialPort::open(&config.serial_config())
        .map_err(|err| transport_error("can't open serial device", err))?;
    let (engine, tasks) = Engine::start(port, config.engine_config())
        .map_err(|err| engine_error("can't start protocol engine", err))?;

    let listener = Arc::new(
        ControlListener::bind(&config.control_socket)
            .map_err(|err| transport_error("can't listen on control socket", err))?,
    );

    spawn_named("usio-ctl", {
        let listener = Arc::clone(&listener);
        let engine = engine.clone();
        move || serve(listener, engine)
    })?;

    let runner = config
        .exec_script
        .as_ref()
        .map(|script| ActionRunner::new(script, &config.exec_path));
    if runner.is_none() {
        info!("no exec_script configured; controller events are only logged");
    }
    spawn_named("usio-events", {
        let engine = engine.clone();
        let running = Arc::clone(&running);
        move || event_loop(engine, runner, running)
    })?;

    info!(
        device = ?config.uart_dev,
        socket = ?config.control_socket,
        "usio daemon running"
    );

    let outcome = loop {
        if !running.load(Ordering::SeqCst) {
            info!("shutdown requested");
            break Ok(SUCCESS);
        }
        if tasks.transmitter_finished() {
            break match tasks.wait_transmitter() {
                Ok(()) => Err(CliError::new(INTERNAL, "transmitter stopped unexpectedly")),
                Err(err) => {
                    error!(error = %err, "serial link lost; shutting down");
                    Err(engine_error("serial link lost", err))
                }
            };
        }
        thread::sleep(SUPERVISE_INTERVAL);
    };

    // Exiting skips destructors, so clean up the socket file explicitly.
    listener.remove_socket_file();
    drop(engine);
    outcome
}

fn spawn_named<F>(name: &str, body: F) -> CliResult<()>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map(|_| ())
        .map_err(|err| CliError::new(INTERNAL, format!("can't start {name} thread: {err}")))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
