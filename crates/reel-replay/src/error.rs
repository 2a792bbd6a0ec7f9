//! Error types for recording and playback.

use std::fmt;
use std::io;

use reel_core::SlotId;

/// Errors that can occur while recording or playing back a slot.
#[derive(Debug)]
pub enum ReplayError {
    /// An I/O error occurred on the slot file.
    Io(io::Error),
    /// A recording or playback session is already active.
    SessionBusy {
        /// What the session is currently doing.
        active: &'static str,
    },
    /// The recording is shorter than the arena it must restore.
    CorruptSnapshot {
        /// Arena size in bytes.
        expected: u64,
        /// Bytes available in the file.
        found: u64,
    },
    /// The recording holds a snapshot but no frames, so it cannot loop.
    EmptyRecording {
        /// The slot that was being played.
        slot: SlotId,
    },
    /// The recording ends in the middle of a frame.
    TruncatedFrame {
        /// Zero-based index of the incomplete frame.
        index: u64,
        /// Bytes of that frame present in the file.
        found: usize,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::SessionBusy { active } => write!(f, "session busy: already {active}"),
            Self::CorruptSnapshot { expected, found } => write!(
                f,
                "corrupt snapshot: arena is {expected} bytes but recording holds {found}"
            ),
            Self::EmptyRecording { slot } => {
                write!(f, "recording in slot {slot} has no frames")
            }
            Self::TruncatedFrame { index, found } => write!(
                f,
                "truncated frame {index}: {found} of {} bytes present",
                reel_core::FRAME_SIZE
            ),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
