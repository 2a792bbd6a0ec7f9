//! Recording writer.
//!
//! [`RecordingWriter`] streams a recording to any `Write` sink. The arena
//! snapshot is written immediately on construction.

use std::io::Write;

use reel_core::InputFrame;

use crate::codec::{encode_frame, encode_snapshot};
use crate::error::ReplayError;
use crate::hash::snapshot_hash;

/// Writes recording data to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and the session can
/// use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use reel_core::InputFrame;
/// use reel_replay::{RecordingReader, RecordingWriter};
///
/// let arena = vec![7u8; 256];
/// let mut buf = Vec::new();
/// let mut writer = RecordingWriter::new(&mut buf, &arena).unwrap();
/// for i in 0..2 {
///     let mut frame = InputFrame::default();
///     frame.mouse_x = i;
///     writer.write_frame(&frame).unwrap();
/// }
/// assert_eq!(writer.frames_written(), 2);
/// drop(writer);
///
/// let mut restored = vec![0u8; 256];
/// let mut reader = RecordingReader::open(buf.as_slice(), &mut restored).unwrap();
/// assert_eq!(restored, arena);
/// assert_eq!(reader.next_frame().unwrap().unwrap().mouse_x, 0);
/// assert_eq!(reader.next_frame().unwrap().unwrap().mouse_x, 1);
/// assert!(reader.next_frame().unwrap().is_none());
/// ```
pub struct RecordingWriter<W: Write> {
    writer: W,
    snapshot_hash: u64,
    frames_written: u64,
}

impl<W: Write> RecordingWriter<W> {
    /// Create a writer, immediately writing `arena_bytes` as the snapshot.
    pub fn new(mut writer: W, arena_bytes: &[u8]) -> Result<Self, ReplayError> {
        encode_snapshot(&mut writer, arena_bytes)?;
        Ok(Self {
            writer,
            snapshot_hash: snapshot_hash(arena_bytes),
            frames_written: 0,
        })
    }

    /// Append one input frame.
    pub fn write_frame(&mut self, frame: &InputFrame) -> Result<(), ReplayError> {
        encode_frame(&mut self.writer, frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Hash of the snapshot this recording started from.
    pub fn snapshot_hash(&self) -> u64 {
        self.snapshot_hash
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
