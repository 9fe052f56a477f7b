use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Start-of-sentence marker.
pub const START_MARKER: u8 = b'$';

/// Separates the payload from the optional checksum.
pub const CHECKSUM_MARKER: char = '*';

/// Talker id (2) + sentence id (3).
pub const HEADER_LEN: usize = 5;

const TALKER_LEN: usize = 2;
const SENTENCE_LEN: usize = 3;

/// Default capacity of the line accumulation buffer.
pub const DEFAULT_MAX_LINE: usize = 256;

/// One decoded protocol sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 2-character source/category tag.
    pub talker_id: String,
    /// 3-character message type tag.
    pub sentence_id: String,
    /// Integer arguments in wire order.
    pub args: Vec<i64>,
}

impl Frame {
    /// Create a new frame.
    pub fn new(talker_id: impl Into<String>, sentence_id: impl Into<String>, args: Vec<i64>) -> Self {
        Self {
            talker_id: talker_id.into(),
            sentence_id: sentence_id.into(),
            args,
        }
    }

    /// The request identifier carried in argument 0, if any.
    pub fn request_id(&self) -> Option<i64> {
        self.args.first().copied()
    }

    /// Argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<i64> {
        self.args.get(index).copied()
    }

    /// Check that the talker and sentence ids can be put on the wire.
    pub fn validate(&self) -> Result<()> {
        validate_id("talker id", &self.talker_id, TALKER_LEN)?;
        validate_id("sentence id", &self.sentence_id, SENTENCE_LEN)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}{}", self.talker_id, self.sentence_id)?;
        for arg in &self.args {
            write!(f, ",{arg}")?;
        }
        Ok(())
    }
}

/// 8-bit wrapping sum of the payload bytes.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Encode a frame into the wire format.
///
/// ```text
/// $<talker:2><sentence:3>[,<arg>]*\n
/// ```
///
/// No checksum is emitted; the decoder accepts sentences with or without one.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    frame.validate()?;

    dst.reserve(1 + HEADER_LEN + frame.args.len() * 4 + 1);
    dst.put_u8(START_MARKER);
    dst.put_slice(frame.talker_id.as_bytes());
    dst.put_slice(frame.sentence_id.as_bytes());
    for arg in &frame.args {
        dst.put_u8(b',');
        dst.put_slice(arg.to_string().as_bytes());
    }
    dst.put_u8(b'\n');
    Ok(())
}

fn validate_id(field: &'static str, value: &str, len: usize) -> Result<()> {
    if value.len() != len || !value.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(FrameError::InvalidId {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Parse one accumulated line (without `$` and terminator) into a frame.
pub fn parse_line(line: &[u8]) -> Result<Frame> {
    let text = std::str::from_utf8(line).map_err(|_| FrameError::NotUtf8)?;

    let mut parts = text.split(CHECKSUM_MARKER);
    let payload = parts.next().unwrap_or_default();
    if let Some(field) = parts.next() {
        let expected = u8::from_str_radix(field.trim(), 16)
            .map_err(|_| FrameError::InvalidChecksum(field.to_string()))?;
        let actual = checksum(payload.as_bytes());
        if expected != actual {
            return Err(FrameError::ChecksumMismatch { expected, actual });
        }
    }

    let mut tokens = payload.split(',');
    let header = tokens.next().unwrap_or_default();
    if header.len() != HEADER_LEN || !header.is_ascii() {
        return Err(FrameError::BadHeader { len: header.len() });
    }

    let (talker_id, sentence_id) = header.split_at(TALKER_LEN);
    Ok(Frame {
        talker_id: talker_id.to_string(),
        sentence_id: sentence_id.to_string(),
        args: tokens.map(parse_arg).collect(),
    })
}

// Leading decimal digits (with optional sign) are the value; trailing junk is
// ignored. No digits, or a value out of range, reads as zero.
fn parse_arg(token: &str) -> i64 {
    let token = token.trim_start();
    let sign_len = usize::from(token.starts_with(['+', '-']));
    let digits_len = token[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    token[..sign_len + digits_len].parse().unwrap_or(0)
}

/// Configuration for the sentence codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum line length before the current sentence is abandoned. Default: 256.
    pub max_line_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE,
        }
    }
}

/// Byte-at-a-time sentence reassembler.
///
/// Bytes before a `$` are discarded, a CR/LF right after another terminator
/// is ignored, and an over-long line is abandoned until the next `$`.
#[derive(Debug)]
pub struct NmeaParser {
    buf: Vec<u8>,
    max_line_len: usize,
    in_frame: bool,
    after_terminator: bool,
}

impl NmeaParser {
    /// Create a parser with the default line capacity.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create a parser with explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            buf: Vec::with_capacity(config.max_line_len),
            max_line_len: config.max_line_len,
            in_frame: false,
            after_terminator: false,
        }
    }

    /// Feed one byte; returns a frame when a terminator completes a valid sentence.
    pub fn push_byte(&mut self, byte: u8) -> Option<Frame> {
        match byte {
            START_MARKER => {
                self.buf.clear();
                self.after_terminator = false;
                self.in_frame = true;
                None
            }
            b'\r' | b'\n' => {
                if self.after_terminator || !self.in_frame {
                    return None;
                }
                self.after_terminator = true;
                self.in_frame = false;

                match parse_line(&self.buf) {
                    Ok(frame) => Some(frame),
                    Err(err) => {
                        tracing::trace!(
                            error = %err,
                            line = %String::from_utf8_lossy(&self.buf),
                            "dropping malformed sentence"
                        );
                        None
                    }
                }
            }
            _ => {
                self.after_terminator = false;
                if !self.in_frame {
                    self.buf.clear();
                    return None;
                }
                if self.buf.len() >= self.max_line_len {
                    tracing::trace!(max = self.max_line_len, "sentence too long, resyncing");
                    self.in_frame = false;
                    return None;
                }
                self.buf.push(byte);
                None
            }
        }
    }

    /// Whether a `$` has been seen and the sentence is still accumulating.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Forget any partially accumulated sentence.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.in_frame = false;
        self.after_terminator = false;
    }
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new()
    }
}
