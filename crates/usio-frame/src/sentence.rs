//! Talker and sentence identifiers used by the I/O controller.
//!
//! Commands flow host → controller, statuses and events flow back.
//! Every command carries the request identifier as argument 0 and the
//! controller echoes it in the same position.

/// Talker id used for every host-originated sentence.
pub const TALKER_PC: &str = "PC";

/// Relay write: `(request_id, port, state)`.
pub const RELAY_WRITE: &str = "RWS";

/// Relay read: `(request_id, port)`.
pub const RELAY_READ: &str = "RRS";

/// Input read: `(request_id, port)`.
pub const INPUT_READ: &str = "RIP";

/// Watchdog enable/disable: `(request_id, state)`.
pub const WATCHDOG_CONTROL: &str = "WDC";

/// Watchdog reset pulse.
pub const WATCHDOG_RESET: &str = "WRS";

/// Output port status: `(request_id, port, state)`.
pub const OUTPUT_STATUS: &str = "SOP";

/// Input port status: `(request_id, port, state)`.
pub const INPUT_STATUS: &str = "SIP";

/// Watchdog status: `(request_id, state_bits)`.
pub const WATCHDOG_STATUS: &str = "WDS";

/// Unsolicited input change: `(0, port, state)`.
pub const EVENT_INPUT_CHANGED: &str = "AIP";

/// Unsolicited controller restart notice.
pub const EVENT_RESTARTED: &str = "ASP";

/// Returns a human-readable name for a sentence id.
pub fn sentence_name(id: &str) -> &'static str {
    match id {
        RELAY_WRITE => "relay write",
        RELAY_READ => "relay read",
        INPUT_READ => "input read",
        WATCHDOG_CONTROL => "watchdog control",
        WATCHDOG_RESET => "watchdog reset",
        OUTPUT_STATUS => "output status",
        INPUT_STATUS => "input status",
        WATCHDOG_STATUS => "watchdog status",
        EVENT_INPUT_CHANGED => "input changed",
        EVENT_RESTARTED => "controller restarted",
        _ => "unknown",
    }
}

/// Returns true for sentences the host sends.
pub fn is_command(id: &str) -> bool {
    matches!(
        id,
        RELAY_WRITE | RELAY_READ | INPUT_READ | WATCHDOG_CONTROL | WATCHDOG_RESET
    )
}

/// Returns true for sentences the controller sends in reply to a command.
pub fn is_status(id: &str) -> bool {
    matches!(id, OUTPUT_STATUS | INPUT_STATUS | WATCHDOG_STATUS)
}

/// Returns true for sentences the controller sends on its own.
pub fn is_event(id: &str) -> bool {
    matches!(id, EVENT_INPUT_CHANGED | EVENT_RESTARTED)
}
