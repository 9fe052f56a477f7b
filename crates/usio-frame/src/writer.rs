use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, Frame};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Writes encoded sentences to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new sentence writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and send a sentence built from its parts.
    pub fn send(&mut self, talker_id: &str, sentence_id: &str, args: &[i64]) -> Result<()> {
        self.write_frame(&Frame::new(talker_id, sentence_id, args.to_vec()))
    }

    /// Write a complete sentence (blocking), looping on partial writes.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        encode_frame(frame, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn write_single_sentence() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send("PC", "RWS", &[7, 3, 1]).unwrap();

        assert_eq!(writer.into_inner().into_inner(), b"$PCRWS,7,3,1\n");
    }

    #[test]
    fn write_multiple_sentences() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send("PC", "RRS", &[1, 2]).unwrap();
        writer.write_frame(&Frame::new("PC", "WRS", vec![0])).unwrap();

        assert_eq!(
            writer.into_inner().into_inner(),
            b"$PCRRS,1,2\n$PCWRS,0\n"
        );
    }

    #[test]
    fn partial_writes_are_completed() {
        let sink = TrickleWriter::default();
        let mut writer = FrameWriter::new(sink);

        writer.send("PC", "WDC", &[5, 1]).unwrap();

        assert_eq!(writer.get_ref().written, b"$PCWDC,5,1\n");
    }

    #[test]
    fn invalid_ids_rejected_before_writing() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        let err = writer.send("P", "RWS", &[]).unwrap_err();
        assert!(matches!(err, FrameError::InvalidId { .. }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn zero_length_write_is_connection_closed() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send("PC", "WRS", &[0]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn write_error_propagates() {
        let mut writer = FrameWriter::new(BrokenWriter);
        let err = writer.send("PC", "WRS", &[0]).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send("PC", "WRS", &[0]).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[derive(Default)]
    struct TrickleWriter {
        written: Vec<u8>,
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(3);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }
}
