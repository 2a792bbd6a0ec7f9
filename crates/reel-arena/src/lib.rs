//! Fixed memory arena for the reel simulation host.
//!
//! The arena is one contiguous anonymous mapping reserved at startup and
//! never resized or moved. It is split into two zones:
//!
//! ```text
//! base
//! ├── permanent zone  (module state; survives reloads; snapshotted)
//! │   ├── header      PERMANENT_HEADER_SIZE bytes, host-owned
//! │   │   └── [0]     initialized flag
//! │   └── module state
//! └── transient zone  (scratch; may be cleared by the host)
//! ```
//!
//! Because everything a module cares about lives in this one region, a
//! single contiguous copy is a complete snapshot of the simulation. This
//! crate is the only one in the workspace besides `reel-module` that may
//! contain `unsafe` code, confined to the mapping itself.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;

pub use arena::{Arena, INITIALIZED_FLAG_OFFSET, PERMANENT_HEADER_SIZE};
pub use config::ArenaConfig;
pub use error::ArenaError;
