//! Test utilities and fakes for reel development.
//!
//! Provides in-process implementations of the host's seams so the
//! scheduler can be exercised without a dynamic library or a window:
//!
//! - [`FoldModule`] and [`FakeSource`] stand in for module code and the
//!   artifact it is loaded from.
//! - [`ScriptedEvents`] replays a fixed sequence of per-tick event batches.
//! - [`CapturePresenter`] keeps a fingerprint of every presented surface.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    CallLog, CapturePresenter, FakeSource, FoldModule, ScriptedEvents, STATE_COUNTER, STATE_FOLD,
    STATE_MAGIC,
};
