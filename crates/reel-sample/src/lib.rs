//! Sample simulation module for the reel host.
//!
//! Paints the surface red on init, then fades its alpha channel up while
//! MoveNorth is held and down while MoveSouth is held. All state lives in
//! [`SampleState`] at the start of permanent storage, so the fade survives
//! a rebuild and is reproduced exactly by playback.
//!
//! Build it as a `cdylib` and point the host at the artifact:
//!
//! ```text
//! cargo build -p reel-sample
//! reel target/debug/libreel_sample.so
//! ```
//!
//! The exported entry points are thin wrappers over [`init`] and
//! [`update`], which take ordinary slices and can be tested in-process.

#![deny(missing_docs)]

use bytemuck::{Pod, Zeroable};
use reel_core::{ButtonId, InputFrame, MemoryHandle, SurfaceDescriptor};

/// Module state, stored at the start of permanent storage.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SampleState {
    /// Alpha written to every pixel. Wraps in both directions.
    pub alpha: u8,
    _pad: [u8; 3],
    /// Updates since init.
    pub ticks: u32,
    /// Simulated seconds since init.
    pub elapsed: f32,
}

/// Reset `state` and paint every pixel red with zero alpha.
pub fn init(state: &mut SampleState, pixels: &mut [u8], bytes_per_pixel: usize) {
    *state = SampleState::default();
    if bytes_per_pixel == 0 {
        return;
    }
    for px in pixels.chunks_exact_mut(bytes_per_pixel) {
        px.fill(0);
        px[0] = 0xFF;
    }
}

/// Advance one tick.
pub fn update(
    state: &mut SampleState,
    pixels: &mut [u8],
    bytes_per_pixel: usize,
    input: &InputFrame,
    delta_seconds: f32,
) {
    if input.button(ButtonId::MoveNorth).ended_down() {
        state.alpha = state.alpha.wrapping_add(1);
    } else if input.button(ButtonId::MoveSouth).ended_down() {
        state.alpha = state.alpha.wrapping_sub(1);
    }
    state.ticks = state.ticks.wrapping_add(1);
    state.elapsed += delta_seconds;

    if bytes_per_pixel < 4 {
        return;
    }
    for px in pixels.chunks_exact_mut(bytes_per_pixel) {
        px[3] = state.alpha;
    }
}

/// Borrow the state and pixels behind the raw ABI views.
///
/// # Safety
///
/// Both pointers must be valid for the duration of the call, as the host
/// guarantees for every entry-point call.
unsafe fn views<'a>(
    memory: *mut MemoryHandle,
    surface: *mut SurfaceDescriptor,
) -> Option<(&'a mut SampleState, &'a mut [u8], usize)> {
    let memory = unsafe { memory.as_mut() }?;
    let surface = unsafe { surface.as_mut() }?;
    let needed = std::mem::size_of::<SampleState>();
    if memory.permanent_storage.is_null() || (memory.permanent_storage_size as usize) < needed {
        return None;
    }
    let storage = unsafe { std::slice::from_raw_parts_mut(memory.permanent_storage, needed) };
    let state = bytemuck::try_from_bytes_mut::<SampleState>(storage).ok()?;
    let pixels: &mut [u8] = if surface.pixels.is_null() {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(surface.pixels, surface.byte_len as usize) }
    };
    Some((state, pixels, surface.bytes_per_pixel as usize))
}

/// ABI init entry point.
///
/// # Safety
///
/// Called by the host with valid memory and surface views.
#[no_mangle]
pub unsafe extern "C" fn reel_init_v1(memory: *mut MemoryHandle, surface: *mut SurfaceDescriptor) {
    if let Some((state, pixels, bpp)) = unsafe { views(memory, surface) } {
        init(state, pixels, bpp);
    }
}

/// ABI update entry point.
///
/// # Safety
///
/// Called by the host with valid memory, surface and input views.
#[no_mangle]
pub unsafe extern "C" fn reel_update_v1(
    memory: *mut MemoryHandle,
    surface: *mut SurfaceDescriptor,
    input: *const InputFrame,
    delta_seconds: f32,
) {
    let Some(input) = (unsafe { input.as_ref() }) else {
        return;
    };
    if let Some((state, pixels, bpp)) = unsafe { views(memory, surface) } {
        update(state, pixels, bpp, input, delta_seconds);
    }
}
