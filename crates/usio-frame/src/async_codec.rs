//! `tokio_util` codec adapter over [`NmeaParser`].

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, Frame, FrameConfig, NmeaParser};
use crate::error::FrameError;

/// Decodes and encodes sentences on async byte streams.
#[derive(Debug, Default)]
pub struct NmeaCodec {
    parser: NmeaParser,
}

impl NmeaCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            parser: NmeaParser::with_config(config),
        }
    }
}

impl Decoder for NmeaCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        while src.has_remaining() {
            if let Some(frame) = self.parser.push_byte(src.get_u8()) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

impl Encoder<Frame> for NmeaCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(&item, dst)
    }
}
