//! Control-socket query language.
//!
//! One query per line: a command word followed by integer arguments, all
//! separated by whitespace. Every query yields exactly one reply line.

use std::sync::atomic::{AtomicI64, Ordering};

use tracing::debug;
use usio_engine::Engine;

/// Highest request identifier handed to a client.
const MAX_CLIENT_ID: i64 = 255;

/// Hands out per-connection request identifiers.
///
/// Identifiers run 2, 3, ..., 255, then wrap to 1. Zero is never handed out;
/// the controller uses it for unsolicited events.
#[derive(Debug)]
pub struct ClientIds {
    last: AtomicI64,
}

impl ClientIds {
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(1),
        }
    }

    pub fn next_id(&self) -> i64 {
        let advance = |last: i64| if last >= MAX_CLIENT_ID { 1 } else { last + 1 };
        match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(advance(last)))
        {
            Ok(previous) | Err(previous) => advance(previous),
        }
    }
}

impl Default for ClientIds {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    RelaySet { port: i64, state: i64 },
    RelayGet { port: i64 },
    InputGet { port: i64 },
    WatchdogOn,
    WatchdogOff,
    WatchdogReset,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("{command} takes {expected} argument(s), got {got}")]
    ArgCount {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{command}: {value:?} is not an integer")]
    InvalidArg { command: &'static str, value: String },
}

/// Parse one query line. The caller has already skipped blank lines.
pub fn parse_query(line: &str) -> Result<Query, QueryError> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match command {
        "relay_set" => {
            let [port, state] = int_args::<2>("relay_set", &args)?;
            Ok(Query::RelaySet { port, state })
        }
        "relay_get" => {
            let [port] = int_args::<1>("relay_get", &args)?;
            Ok(Query::RelayGet { port })
        }
        "input_get" => {
            let [port] = int_args::<1>("input_get", &args)?;
            Ok(Query::InputGet { port })
        }
        "wdt_on" => int_args::<0>("wdt_on", &args).map(|_| Query::WatchdogOn),
        "wdt_off" => int_args::<0>("wdt_off", &args).map(|_| Query::WatchdogOff),
        "wdt_reset" => int_args::<0>("wdt_reset", &args).map(|_| Query::WatchdogReset),
        other => Err(QueryError::UnknownCommand(other.to_string())),
    }
}

fn int_args<const N: usize>(command: &'static str, args: &[&str]) -> Result<[i64; N], QueryError> {
    if args.len() != N {
        return Err(QueryError::ArgCount {
            command,
            expected: N,
            got: args.len(),
        });
    }

    let mut values = [0i64; N];
    for (slot, arg) in values.iter_mut().zip(args) {
        *slot = arg.parse().map_err(|_| QueryError::InvalidArg {
            command,
            value: arg.to_string(),
        })?;
    }
    Ok(values)
}

/// Run a query against the controller and render the reply text.
pub fn execute(engine: &Engine, request_id: i64, query: Query) -> String {
    let result = match query {
        Query::RelaySet { port, state } => engine
            .relay_set_state(request_id, port, state)
            .map(|()| "ok".to_string()),
        Query::RelayGet { port } => engine
            .output_port_state(request_id, port)
            .map(|state| state.to_string()),
        Query::InputGet { port } => engine
            .input_port_state(request_id, port)
            .map(|state| state.to_string()),
        Query::WatchdogOn => engine
            .set_watchdog(request_id, true)
            .map(|()| "ok".to_string()),
        Query::WatchdogOff => engine
            .set_watchdog(request_id, false)
            .map(|()| "ok".to_string()),
        Query::WatchdogReset => engine.reset_watchdog().map(|()| "ok".to_string()),
    };

    result.unwrap_or_else(|err| err.to_string())
}

/// Reply for one input line; `None` for blank lines.
pub fn handle_line(engine: &Engine, request_id: i64, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    debug!(request_id, query = line, "control query");
    let reply = match parse_query(line) {
        Ok(query) => execute(engine, request_id, query),
        Err(err) => format!("error: {err}"),
    };
    Some(reply)
}
