//! Arena snapshot recording and looping input playback.
//!
//! A recording captures the complete arena once, then every input frame
//! handed to the module afterwards. Because the module is a pure function
//! of `(arena, input)`, restoring the snapshot and feeding the same frames
//! reproduces the same simulation. Playback loops: after the last frame the
//! snapshot is restored again and the first frame follows.
//!
//! # Architecture
//!
//! - [`RecordingWriter`] writes a snapshot then frames to any `Write` sink
//! - [`RecordingReader`] restores a snapshot then yields frames from any `Read` source
//! - [`Session`] owns the Idle/Recording/Playing state machine over slot files
//! - [`snapshot_hash`] fingerprints arena bytes for log correlation
//!
//! # Format
//!
//! ```text
//! [arena snapshot: total_size bytes] [InputFrame 0] [InputFrame 1] ... [InputFrame N-1]
//! ```
//!
//! There is no header. Each frame is the raw `#[repr(C)]` bytes of
//! [`InputFrame`](reel_core::InputFrame), so a file is only meaningful to a
//! host with the same arena size and the same build of `reel-core`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod hash;
pub mod reader;
pub mod session;
pub mod writer;

pub use error::ReplayError;
pub use hash::snapshot_hash;
pub use reader::{FrameIter, RecordingReader};
pub use session::{slot_path, Session, SessionState, SLOT_EXTENSION};
pub use writer::RecordingWriter;
