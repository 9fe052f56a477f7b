//! Control daemon for serial-attached relay and input controllers.
//!
//! The controller speaks an NMEA0183-style line protocol over a UART. Many
//! clients share that one link; each request carries an identifier that the
//! controller echoes back, so responses find their way to the right caller.
//!
//! # Crate Structure
//!
//! - [`frame`] - Sentence codec, blocking reader/writer, optional async codec
//! - [`transport`] - Serial port setup and the Unix control socket
//! - [`engine`] - Request/response correlation and the controller operations

/// Re-export frame types.
pub mod frame {
    pub use usio_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use usio_transport::*;
}

/// Re-export engine types.
pub mod engine {
    pub use usio_engine::*;
}
