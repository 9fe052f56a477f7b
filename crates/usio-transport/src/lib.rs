//! OS-facing transports for the usio daemon.
//!
//! - [`SerialPort`]: the controller's serial device, opened and switched to raw mode
//! - [`ControlListener`] / [`ControlStream`]: the local Unix-socket command surface
//!
//! This is the lowest layer of usio. The protocol engine owns a [`SerialPort`];
//! the daemon owns a [`ControlListener`].

pub mod error;

#[cfg(unix)]
pub mod control;
#[cfg(unix)]
pub mod serial;
#[cfg(unix)]
pub mod stream;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use control::ControlListener;
#[cfg(unix)]
pub use serial::{SerialConfig, SerialPort};
#[cfg(unix)]
pub use stream::ControlStream;
