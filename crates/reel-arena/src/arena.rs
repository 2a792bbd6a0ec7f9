//! The arena mapping and its zone views.

#![allow(unsafe_code)]

use std::ffi::c_void;
use std::ptr::NonNull;

use reel_core::MemoryHandle;
use rustix::mm::{MapFlags, ProtFlags};

use crate::config::ArenaConfig;
use crate::error::ArenaError;

/// Bytes at the start of the permanent zone reserved for the host.
pub const PERMANENT_HEADER_SIZE: usize = 64;

/// Offset of the initialized flag within the permanent zone.
pub const INITIALIZED_FLAG_OFFSET: usize = 0;

struct Mapping {
    base: NonNull<u8>,
    len: usize,
}

/// One contiguous, never-moving memory region split into a permanent and a
/// transient zone.
///
/// Dropping the arena unmaps it. [`release`](Arena::release) does the same
/// eagerly and may be called more than once; after release every view is
/// empty.
pub struct Arena {
    mapping: Option<Mapping>,
    permanent_size: usize,
    transient_size: usize,
}

// SAFETY: the arena exclusively owns its mapping; no other handle to the
// memory exists outside borrows of `self`.
unsafe impl Send for Arena {}

impl Arena {
    /// Reserve the arena with a single anonymous read/write mapping.
    ///
    /// The memory is zero-filled, so the initialized flag starts clear.
    pub fn reserve(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let total = config.total_size().ok_or(ArenaError::SizeOverflow)?;
        let hint = config.base_address.unwrap_or(0) as *mut c_void;

        // SAFETY: a private anonymous mapping aliases no existing memory.
        // Without MAP_FIXED the address is only a hint and cannot clobber
        // an existing mapping.
        let ptr = unsafe {
            rustix::mm::mmap_anonymous(
                hint,
                total,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::PRIVATE,
            )
        }
        .map_err(|errno| ArenaError::OutOfMemory {
            requested: total,
            os_error: errno.raw_os_error(),
        })?;

        let base = NonNull::new(ptr.cast::<u8>()).ok_or(ArenaError::OutOfMemory {
            requested: total,
            os_error: 0,
        })?;

        if let Some(requested) = config.base_address {
            let actual = base.as_ptr() as usize;
            if actual != requested {
                log::warn!(
                    "arena requested at {requested:#x} but mapped at {actual:#x}; \
                     recordings holding raw pointers will not replay faithfully"
                );
            }
        }

        log::info!(
            "arena reserved at {:#x}: {} bytes (permanent {}, transient {})",
            base.as_ptr() as usize,
            total,
            config.permanent_size,
            config.transient_size
        );

        Ok(Self {
            mapping: Some(Mapping { base, len: total }),
            permanent_size: config.permanent_size,
            transient_size: config.transient_size,
        })
    }

    /// Unmap the arena. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mapping) = self.mapping.take() {
            // SAFETY: the mapping came from mmap with exactly this length
            // and `take()` guarantees it is unmapped only once. No borrow of
            // the memory can outlive `&mut self`.
            let result = unsafe { rustix::mm::munmap(mapping.base.as_ptr().cast(), mapping.len) };
            match result {
                Ok(()) => log::info!("arena released: {} bytes", mapping.len),
                Err(errno) => log::error!("arena munmap failed: {errno}"),
            }
        }
    }

    /// Whether the mapping is still live.
    pub fn is_reserved(&self) -> bool {
        self.mapping.is_some()
    }

    /// Address of the first byte, or 0 after release.
    pub fn base_address(&self) -> usize {
        self.mapping
            .as_ref()
            .map_or(0, |m| m.base.as_ptr() as usize)
    }

    /// Total size in bytes (fixed at reservation).
    pub fn total_size(&self) -> usize {
        self.permanent_size + self.transient_size
    }

    /// Permanent zone size in bytes, including the host header.
    pub fn permanent_size(&self) -> usize {
        self.permanent_size
    }

    /// Transient zone size in bytes.
    pub fn transient_size(&self) -> usize {
        self.transient_size
    }

    /// The whole arena, permanent zone first.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.mapping {
            // SAFETY: the mapping is live, `len` bytes long and readable;
            // the returned borrow is tied to `&self`.
            Some(m) => unsafe { std::slice::from_raw_parts(m.base.as_ptr(), m.len) },
            None => &[],
        }
    }

    /// The whole arena, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.mapping {
            // SAFETY: as above, and `&mut self` guarantees exclusivity.
            Some(m) => unsafe { std::slice::from_raw_parts_mut(m.base.as_ptr(), m.len) },
            None => &mut [],
        }
    }

    /// The permanent zone, including the host header.
    pub fn permanent(&self) -> &[u8] {
        let end = self.permanent_size;
        self.as_bytes().get(..end).unwrap_or(&[])
    }

    /// The transient zone.
    pub fn transient(&self) -> &[u8] {
        let start = self.permanent_size;
        self.as_bytes().get(start..).unwrap_or(&[])
    }

    /// The transient zone, mutably.
    pub fn transient_mut(&mut self) -> &mut [u8] {
        let start = self.permanent_size;
        self.as_bytes_mut().get_mut(start..).unwrap_or(&mut [])
    }

    /// The module's persistent state: the permanent zone minus the header.
    pub fn module_state(&self) -> &[u8] {
        let end = self.permanent_size;
        self.as_bytes()
            .get(PERMANENT_HEADER_SIZE..end)
            .unwrap_or(&[])
    }

    /// The module's persistent state, mutably.
    pub fn module_state_mut(&mut self) -> &mut [u8] {
        let end = self.permanent_size;
        self.as_bytes_mut()
            .get_mut(PERMANENT_HEADER_SIZE..end)
            .unwrap_or(&mut [])
    }

    /// Whether module state has been initialised.
    ///
    /// Lives inside the arena, so it survives reloads and is restored by
    /// playback along with everything else.
    pub fn is_initialized(&self) -> bool {
        self.as_bytes()
            .get(INITIALIZED_FLAG_OFFSET)
            .is_some_and(|&b| b != 0)
    }

    /// Set or clear the initialized flag.
    pub fn set_initialized(&mut self, initialized: bool) {
        if let Some(flag) = self.as_bytes_mut().get_mut(INITIALIZED_FLAG_OFFSET) {
            *flag = initialized as u8;
        }
    }

    /// Zero the transient zone.
    pub fn clear_transient(&mut self) {
        self.transient_mut().fill(0);
    }

    /// Build the ABI memory view for one module call.
    ///
    /// After release both pointers are null and both sizes zero.
    pub fn memory_handle(&mut self) -> MemoryHandle {
        let is_initialized = self.is_initialized();
        match &self.mapping {
            Some(m) => {
                let base = m.base.as_ptr();
                MemoryHandle {
                    is_initialized,
                    permanent_storage_size: (self.permanent_size - PERMANENT_HEADER_SIZE) as u64,
                    permanent_storage: base.wrapping_add(PERMANENT_HEADER_SIZE),
                    transient_storage_size: self.transient_size as u64,
                    transient_storage: base.wrapping_add(self.permanent_size),
                }
            }
            None => MemoryHandle {
                is_initialized: false,
                permanent_storage_size: 0,
                permanent_storage: std::ptr::null_mut(),
                transient_storage_size: 0,
                transient_storage: std::ptr::null_mut(),
            },
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("base", &format_args!("{:#x}", self.base_address()))
            .field("permanent_size", &self.permanent_size)
            .field("transient_size", &self.transient_size)
            .field("reserved", &self.is_reserved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ArenaConfig {
        ArenaConfig::new(4096, 8192)
    }

    #[test]
    fn reserve_gives_zeroed_zones_of_configured_size() {
        let arena = Arena::reserve(&small()).unwrap();
        assert_eq!(arena.total_size(), 4096 + 8192);
        assert_eq!(arena.as_bytes().len(), 4096 + 8192);
        assert_eq!(arena.permanent().len(), 4096);
        assert_eq!(arena.transient().len(), 8192);
        assert_eq!(arena.module_state().len(), 4096 - PERMANENT_HEADER_SIZE);
        assert!(arena.as_bytes().iter().all(|&b| b == 0));
        assert!(!arena.is_initialized());
    }

    #[test]
    fn permanent_precedes_transient() {
        let mut arena = Arena::reserve(&small()).unwrap();
        arena.transient_mut()[0] = 0xAB;
        assert_eq!(arena.as_bytes()[4096], 0xAB);
        arena.module_state_mut()[0] = 0xCD;
        assert_eq!(arena.as_bytes()[PERMANENT_HEADER_SIZE], 0xCD);
    }

    #[test]
    fn initialized_flag_lives_in_permanent_header() {
        let mut arena = Arena::reserve(&small()).unwrap();
        arena.set_initialized(true);
        assert!(arena.is_initialized());
        assert_eq!(arena.as_bytes()[INITIALIZED_FLAG_OFFSET], 1);
        // Module state is untouched by the flag.
        assert!(arena.module_state().iter().all(|&b| b == 0));
        arena.set_initialized(false);
        assert!(!arena.is_initialized());
    }

    #[test]
    fn memory_handle_exposes_state_after_header() {
        let mut arena = Arena::reserve(&small()).unwrap();
        arena.set_initialized(true);
        let base = arena.base_address();
        let handle = arena.memory_handle();
        assert!(handle.is_initialized);
        assert_eq!(handle.permanent_storage as usize, base + PERMANENT_HEADER_SIZE);
        assert_eq!(handle.permanent_storage_size, (4096 - PERMANENT_HEADER_SIZE) as u64);
        assert_eq!(handle.transient_storage as usize, base + 4096);
        assert_eq!(handle.transient_storage_size, 8192);
    }

    #[test]
    fn clear_transient_leaves_permanent_alone() {
        let mut arena = Arena::reserve(&small()).unwrap();
        arena.module_state_mut().fill(7);
        arena.transient_mut().fill(9);
        arena.clear_transient();
        assert!(arena.transient().iter().all(|&b| b == 0));
        assert!(arena.module_state().iter().all(|&b| b == 7));
    }

    #[test]
    fn release_is_idempotent() {
        let mut arena = Arena::reserve(&small()).unwrap();
        arena.release();
        arena.release();
        assert!(!arena.is_reserved());
        assert_eq!(arena.base_address(), 0);
        assert!(arena.as_bytes().is_empty());
        assert!(!arena.is_initialized());
        let handle = arena.memory_handle();
        assert!(handle.permanent_storage.is_null());
        assert_eq!(handle.transient_storage_size, 0);
    }

    #[test]
    fn base_address_never_moves() {
        let mut arena = Arena::reserve(&small()).unwrap();
        let base = arena.base_address();
        arena.as_bytes_mut().fill(1);
        arena.clear_transient();
        assert_eq!(arena.base_address(), base);
    }

    #[test]
    fn reserve_rejects_invalid_config() {
        let err = Arena::reserve(&ArenaConfig::new(0, 4096)).unwrap_err();
        assert_eq!(err, ArenaError::ZeroSized { zone: "permanent" });
    }

    #[test]
    fn base_address_hint_is_honoured_when_free() {
        // Reserve once to learn a free region, release it, then ask for
        // the same address again. The hint is advisory, so only assert
        // the arena is usable either way.
        let mut first = Arena::reserve(&small()).unwrap();
        let address = first.base_address();
        first.release();
        let second = Arena::reserve(&small().with_base_address(address)).unwrap();
        assert!(second.is_reserved());
        assert_eq!(second.total_size(), 4096 + 8192);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn module_state_writes_never_touch_the_flag(
                writes in prop::collection::vec((0usize..4096 - PERMANENT_HEADER_SIZE, any::<u8>()), 1..64)
            ) {
                let mut arena = Arena::reserve(&ArenaConfig::new(4096, 4096)).unwrap();
                for &(offset, value) in &writes {
                    arena.module_state_mut()[offset] = value;
                    prop_assert_eq!(arena.as_bytes()[PERMANENT_HEADER_SIZE + offset], value);
                }
                prop_assert!(!arena.is_initialized());
                prop_assert!(arena.transient().iter().all(|&b| b == 0));
            }
        }
    }
}
