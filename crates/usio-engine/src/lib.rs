//! Protocol engine for the I/O controller link.
//!
//! Multiplexes many concurrent logical requests over one serial channel:
//! a transmitter thread drains a bounded command queue onto the device, a
//! receiver thread decodes sentences into a shared pending queue, and callers
//! claim their responses by request identifier and sentence id.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod ops;
pub mod pending;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use engine::{Engine, EngineTasks};
pub use error::{EngineError, Operation, Result};
pub use event::DeviceEvent;
pub use pending::PendingQueue;

/// Request identifier for sentences that are not correlated with a caller.
pub const BROADCAST_REQUEST_ID: i64 = 0;
