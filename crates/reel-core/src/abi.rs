//! The simulation module ABI.
//!
//! A simulation module is a dynamic library exporting exactly two functions,
//! [`INIT_SYMBOL`] and [`UPDATE_SYMBOL`], with the signatures [`InitFn`] and
//! [`UpdateFn`]. The version is part of the symbol name: a module built
//! against an incompatible ABI simply fails to resolve.
//!
//! Modules must keep all state behind [`MemoryHandle::permanent_storage`].
//! Anything held in the module's own statics is lost on hot reload.

use crate::input::InputFrame;
use crate::surface::SurfaceDescriptor;

/// ABI version encoded in the entry-point symbol names.
pub const ABI_VERSION: u32 = 1;

/// NUL-terminated name of the init entry point.
pub const INIT_SYMBOL: &[u8] = b"reel_init_v1\0";

/// NUL-terminated name of the update entry point.
pub const UPDATE_SYMBOL: &[u8] = b"reel_update_v1\0";

/// Memory view handed to the module on every call.
///
/// Both pointers stay valid for the whole process lifetime and never move,
/// so the module may store pointers into its own storage. The host rebuilds
/// this struct before each call; modules must not keep a pointer to it.
#[repr(C)]
#[derive(Debug)]
pub struct MemoryHandle {
    /// Whether the module state in permanent storage has been initialised.
    /// Informational; the host calls `init` exactly when this is false.
    pub is_initialized: bool,
    /// Size in bytes of `permanent_storage`.
    pub permanent_storage_size: u64,
    /// Start of the module's persistent state. Survives reloads and is
    /// restored by playback.
    pub permanent_storage: *mut u8,
    /// Size in bytes of `transient_storage`.
    pub transient_storage_size: u64,
    /// Start of scratch memory. May be cleared by the host.
    pub transient_storage: *mut u8,
}

/// `init(memory, surface)`: first-run setup of module state.
pub type InitFn = unsafe extern "C" fn(memory: *mut MemoryHandle, surface: *mut SurfaceDescriptor);

/// `update(memory, surface, input, delta_seconds)`: advance one tick.
pub type UpdateFn = unsafe extern "C" fn(
    memory: *mut MemoryHandle,
    surface: *mut SurfaceDescriptor,
    input: *const InputFrame,
    delta_seconds: f32,
);
