//! Core types for the reel simulation host.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! data that crosses the boundary between the host and a simulation module:
//! the per-tick [`InputFrame`], the [`MemoryHandle`] and
//! [`SurfaceDescriptor`] passed to the module's entry points, and the
//! entry-point signatures themselves.
//!
//! Everything here is `#[repr(C)]` and has a stable layout: input frames are
//! written to recording files as their raw bytes, and a module built against
//! the same version of this crate reads the same bytes back.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod abi;
pub mod id;
pub mod input;
pub mod surface;

pub use abi::{InitFn, MemoryHandle, UpdateFn, ABI_VERSION, INIT_SYMBOL, UPDATE_SYMBOL};
pub use id::{ModuleGeneration, SlotId};
pub use input::{
    apply_analog_event, apply_digital_event, begin_tick, ButtonId, ButtonState, InputBuffers,
    InputFrame, BUTTON_COUNT, FRAME_SIZE,
};
pub use surface::{Surface, SurfaceDescriptor};
