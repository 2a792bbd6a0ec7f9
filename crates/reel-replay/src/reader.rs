//! Recording reader.
//!
//! [`RecordingReader`] restores the snapshot into caller-provided arena
//! bytes on construction, then yields frames.

use std::io::Read;

use reel_core::InputFrame;

use crate::codec::{decode_frame, decode_snapshot};
use crate::error::ReplayError;
use crate::hash::snapshot_hash;

/// Reads recording data from a byte stream.
///
/// Generic over `R: Read` so tests can use `&[u8]` and the session can use
/// `BufReader<File>`.
pub struct RecordingReader<R: Read> {
    reader: R,
    snapshot_hash: u64,
    frames_read: u64,
}

impl<R: Read> RecordingReader<R> {
    /// Open a recording, overwriting `arena_bytes` with its snapshot.
    pub fn open(mut reader: R, arena_bytes: &mut [u8]) -> Result<Self, ReplayError> {
        decode_snapshot(&mut reader, arena_bytes)?;
        Ok(Self {
            reader,
            snapshot_hash: snapshot_hash(arena_bytes),
            frames_read: 0,
        })
    }

    /// Read the next frame, or `None` if the stream is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<InputFrame>, ReplayError> {
        let frame = decode_frame(&mut self.reader, self.frames_read)?;
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Hash of the restored snapshot.
    pub fn snapshot_hash(&self) -> u64 {
        self.snapshot_hash
    }

    /// Convert into a frame iterator.
    pub fn frames(self) -> FrameIter<R> {
        FrameIter {
            reader: self.reader,
            frames_read: self.frames_read,
            done: false,
        }
    }
}

/// Iterator adapter over recorded frames.
pub struct FrameIter<R: Read> {
    reader: R,
    frames_read: u64,
    done: bool,
}

impl<R: Read> Iterator for FrameIter<R> {
    type Item = Result<InputFrame, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match decode_frame(&mut self.reader, self.frames_read) {
            Ok(Some(frame)) => {
                self.frames_read += 1;
                Some(Ok(frame))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::RecordingWriter;
    use reel_core::FRAME_SIZE;

    fn record(arena: &[u8], count: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = RecordingWriter::new(&mut buf, arena).unwrap();
        for i in 0..count {
            let mut frame = InputFrame::default();
            frame.mouse_y = i;
            writer.write_frame(&frame).unwrap();
        }
        buf
    }

    #[test]
    fn restores_snapshot_and_reads_frames() {
        let arena: Vec<u8> = (0..128u8).collect();
        let buf = record(&arena, 4);

        let mut restored = vec![0u8; 128];
        let mut reader = RecordingReader::open(buf.as_slice(), &mut restored).unwrap();
        assert_eq!(restored, arena);
        assert_eq!(reader.snapshot_hash(), snapshot_hash(&arena));
        for i in 0..4 {
            assert_eq!(reader.next_frame().unwrap().unwrap().mouse_y, i);
        }
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.frames_read(), 4);
    }

    #[test]
    fn writer_and_reader_agree_on_snapshot_hash() {
        let arena = vec![42u8; 512];
        let mut buf = Vec::new();
        let writer = RecordingWriter::new(&mut buf, &arena).unwrap();
        let written = writer.snapshot_hash();
        drop(writer);
        let mut restored = vec![0u8; 512];
        let reader = RecordingReader::open(buf.as_slice(), &mut restored).unwrap();
        assert_eq!(reader.snapshot_hash(), written);
    }

    #[test]
    fn frames_iterate_in_recorded_order() {
        let arena = vec![0u8; 32];
        let buf = record(&arena, 3);
        let mut restored = vec![0u8; 32];
        let reader = RecordingReader::open(buf.as_slice(), &mut restored).unwrap();
        let frames: Vec<_> = reader.frames().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].mouse_y, 2);
    }

    #[test]
    fn partial_trailing_frame_is_reported() {
        let arena = vec![0u8; 32];
        let mut buf = record(&arena, 2);
        buf.truncate(buf.len() - 4);
        let mut restored = vec![0u8; 32];
        let mut reader = RecordingReader::open(buf.as_slice(), &mut restored).unwrap();
        assert!(reader.next_frame().unwrap().is_some());
        let err = reader.next_frame().unwrap_err();
        assert!(matches!(
            err,
            ReplayError::TruncatedFrame { index: 1, found } if found == FRAME_SIZE - 4
        ));
    }

    #[test]
    fn short_snapshot_on_open() {
        let buf = vec![1u8; 10];
        let mut restored = vec![0u8; 32];
        let result = RecordingReader::open(buf.as_slice(), &mut restored);
        assert!(matches!(result, Err(ReplayError::CorruptSnapshot { .. })));
    }
}
