//! Benchmark profiles and utilities for the reel simulation host.
//!
//! - [`bench_arena_config`]: a 4 MiB + 1 MiB arena, large enough that
//!   snapshot cost dominates per-frame cost
//! - [`scripted_frames`]: a deterministic input sequence from a seed
//! - [`recording_bytes`]: a complete in-memory recording of those frames

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use reel_arena::{Arena, ArenaConfig};
use reel_core::{apply_digital_event, begin_tick, ButtonId, InputFrame};
use reel_replay::{RecordingWriter, ReplayError};

/// Permanent bytes in [`bench_arena_config`].
pub const BENCH_PERMANENT: usize = 4 * 1024 * 1024;
/// Transient bytes in [`bench_arena_config`].
pub const BENCH_TRANSIENT: usize = 1024 * 1024;

/// Arena sized for benchmarking snapshot and restore.
pub fn bench_arena_config() -> ArenaConfig {
    ArenaConfig::new(BENCH_PERMANENT, BENCH_TRANSIENT)
}

/// `count` frames of pseudo-random button presses and mouse motion at
/// 60 Hz. The same seed always yields the same frames.
pub fn scripted_frames(count: usize, seed: u64) -> Vec<InputFrame> {
    // xorshift64; zero is a fixed point.
    let mut x = seed | 1;
    let mut next = move || {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        x
    };

    let mut frames = Vec::with_capacity(count);
    let mut previous = InputFrame::default();
    for _ in 0..count {
        let mut frame = begin_tick(&previous);
        let r = next();
        let button = ButtonId::ALL[(r % ButtonId::ALL.len() as u64) as usize];
        let down = !frame.button(button).ended_down();
        apply_digital_event(&mut frame, button, down);
        frame.mouse_x = ((r >> 16) % 768) as i32;
        frame.mouse_y = ((r >> 32) % 432) as i32;
        frame.delta_seconds = 1.0 / 60.0;
        frames.push(frame);
        previous = frame;
    }
    frames
}

/// Encode a recording of `frames` started from `arena`'s current bytes.
pub fn recording_bytes(arena: &Arena, frames: &[InputFrame]) -> Result<Vec<u8>, ReplayError> {
    let capacity = arena.total_size() + frames.len() * reel_core::FRAME_SIZE;
    let mut writer = RecordingWriter::new(Vec::with_capacity(capacity), arena.as_bytes())?;
    for frame in frames {
        writer.write_frame(frame)?;
    }
    writer.flush()?;
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_deterministic_per_seed() {
        assert_eq!(scripted_frames(32, 7), scripted_frames(32, 7));
        assert_ne!(scripted_frames(32, 7), scripted_frames(32, 8));
    }

    #[test]
    fn every_frame_has_one_transition() {
        for frame in scripted_frames(16, 3) {
            let transitions: i32 = frame.buttons.iter().map(|b| b.half_transition_count).sum();
            assert_eq!(transitions, 1);
        }
    }

    #[test]
    fn recording_is_snapshot_then_frames() {
        let arena = Arena::reserve(&ArenaConfig::new(4096, 4096)).unwrap();
        let frames = scripted_frames(5, 1);
        let bytes = recording_bytes(&arena, &frames).unwrap();
        assert_eq!(bytes.len(), arena.total_size() + 5 * reel_core::FRAME_SIZE);
        assert_eq!(&bytes[arena.total_size()..][..reel_core::FRAME_SIZE], frames[0].as_bytes());
    }
}
