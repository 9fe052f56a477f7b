//! Streaming codec for the NMEA0183-derived text protocol spoken by the I/O controller.
//!
//! Every sentence on the wire is one ASCII line:
//! - A `$` start marker
//! - A 5-character header: 2-character talker id + 3-character sentence id
//! - Zero or more `,<int>` arguments
//! - An optional `*<hex>` checksum (8-bit sum of the preceding payload bytes)
//! - A CR or LF terminator
//!
//! Malformed lines are line noise: the streaming parser drops them and keeps going.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod sentence;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::NmeaCodec;
pub use codec::{checksum, encode_frame, parse_line, Frame, FrameConfig, NmeaParser, DEFAULT_MAX_LINE};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use sentence::{
    EVENT_INPUT_CHANGED, EVENT_RESTARTED, INPUT_READ, INPUT_STATUS, OUTPUT_STATUS, RELAY_READ,
    RELAY_WRITE, TALKER_PC, WATCHDOG_CONTROL, WATCHDOG_RESET, WATCHDOG_STATUS,
};
pub use writer::FrameWriter;
