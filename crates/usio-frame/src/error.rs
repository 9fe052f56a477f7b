/// Errors that can occur while decoding or encoding sentences.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header token is not exactly talker (2) + sentence (3) characters.
    #[error("invalid sentence header ({len} characters, expected 5)")]
    BadHeader { len: usize },

    /// The trailing checksum does not match the payload.
    #[error("checksum mismatch (sentence carries {expected:02X}, payload sums to {actual:02X})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The checksum field is not a hexadecimal byte.
    #[error("invalid checksum field {0:?}")]
    InvalidChecksum(String),

    /// The line is not valid text.
    #[error("sentence is not valid UTF-8")]
    NotUtf8,

    /// A talker or sentence id cannot be put on the wire.
    #[error("invalid {field} {value:?}")]
    InvalidId { field: &'static str, value: String },

    /// An I/O error occurred while reading or writing sentences.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached end of file.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
