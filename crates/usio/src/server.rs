use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use usio_engine::Engine;
use usio_transport::{ControlListener, ControlStream};

use crate::dispatch::{handle_line, ClientIds};

/// Pause after a failed accept before trying again.
const ACCEPT_RETRY: Duration = Duration::from_millis(100);

/// Accept control clients forever, one thread per connection.
pub fn serve(listener: Arc<ControlListener>, engine: Engine) {
    let ids = ClientIds::new();

    loop {
        let stream = match listener.accept() {
            Ok(stream) => stream,
            Err(err) => {
                error!(error = %err, "can't accept control connection");
                thread::sleep(ACCEPT_RETRY);
                continue;
            }
        };

        let client_id = ids.next_id();
        match stream.peer_credentials() {
            Some((uid, gid, pid)) => info!(client_id, uid, gid, pid, "control client connected"),
            None => info!(client_id, "control client connected"),
        }

        let engine = engine.clone();
        let spawned = thread::Builder::new()
            .name(format!("usio-client-{client_id}"))
            .spawn(move || {
                if let Err(err) = handle_client(stream, &engine, client_id) {
                    debug!(client_id, error = %err, "control connection failed");
                }
                debug!(client_id, "control client disconnected");
            });
        if let Err(err) = spawned {
            warn!(client_id, error = %err, "can't start client thread; dropping connection");
        }
    }
}

/// Answer every query line until the client hangs up.
pub fn handle_client(stream: ControlStream, engine: &Engine, client_id: i64) -> io::Result<()> {
    let mut writer = stream.try_clone().map_err(io::Error::other)?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        if let Some(reply) = handle_line(engine, client_id, &line) {
            writer.write_all(reply.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }
    Ok(())
}
