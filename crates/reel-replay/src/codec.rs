//! Binary encode/decode for the recording format.
//!
//! The snapshot is the arena's bytes verbatim; each frame is the raw bytes
//! of an [`InputFrame`]. No length prefixes, no padding, no schema.

use std::io::{self, Read, Write};

use reel_core::{InputFrame, FRAME_SIZE};

use crate::error::ReplayError;

/// Read until `buf` is full or the stream ends. Returns bytes read.
fn read_full(r: &mut dyn Read, buf: &mut [u8]) -> Result<usize, ReplayError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Write the arena snapshot.
pub fn encode_snapshot(w: &mut dyn Write, arena_bytes: &[u8]) -> Result<(), ReplayError> {
    w.write_all(arena_bytes)?;
    Ok(())
}

/// Read a snapshot into `dest`, which must be exactly arena-sized.
///
/// A short stream is [`ReplayError::CorruptSnapshot`]; the prefix that was
/// read has already been written into `dest` by then.
pub fn decode_snapshot(r: &mut dyn Read, dest: &mut [u8]) -> Result<(), ReplayError> {
    let found = read_full(r, dest)?;
    if found < dest.len() {
        return Err(ReplayError::CorruptSnapshot {
            expected: dest.len() as u64,
            found: found as u64,
        });
    }
    Ok(())
}

/// Write one frame record.
pub fn encode_frame(w: &mut dyn Write, frame: &InputFrame) -> Result<(), ReplayError> {
    w.write_all(frame.as_bytes())?;
    Ok(())
}

/// Read the frame at `index`, or `None` at a clean end of stream.
///
/// A stream that ends part-way through a record is
/// [`ReplayError::TruncatedFrame`].
pub fn decode_frame(r: &mut dyn Read, index: u64) -> Result<Option<InputFrame>, ReplayError> {
    let mut buf = [0u8; FRAME_SIZE];
    let found = read_full(r, &mut buf)?;
    if found == 0 {
        return Ok(None);
    }
    if found < FRAME_SIZE {
        return Err(ReplayError::TruncatedFrame { index, found });
    }
    // Length is exact, so the conversion cannot fail.
    InputFrame::from_bytes(&buf)
        .map(Some)
        .ok_or(ReplayError::TruncatedFrame { index, found })
}
