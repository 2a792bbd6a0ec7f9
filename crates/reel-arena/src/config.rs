//! Arena configuration parameters.

use crate::arena::PERMANENT_HEADER_SIZE;
use crate::error::ArenaError;

/// Alignment required of a requested base address.
const PAGE_ALIGN: usize = 4096;

/// Configuration for the arena reservation.
///
/// Validated at reservation; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the permanent zone in bytes, including the host header.
    ///
    /// Default: 64 MiB.
    pub permanent_size: usize,

    /// Size of the transient zone in bytes.
    ///
    /// Default: 512 MiB. The mapping is lazily committed by the OS, so an
    /// untouched transient zone costs address space, not memory.
    pub transient_size: usize,

    /// Virtual address to request for the mapping.
    ///
    /// Recordings taken by a module that stores raw pointers inside its
    /// state only replay correctly if every run maps the arena at the same
    /// address. `None` lets the OS choose.
    pub base_address: Option<usize>,
}

impl ArenaConfig {
    /// Default permanent zone size: 64 MiB.
    pub const DEFAULT_PERMANENT_SIZE: usize = 64 * 1024 * 1024;

    /// Default transient zone size: 512 MiB.
    pub const DEFAULT_TRANSIENT_SIZE: usize = 512 * 1024 * 1024;

    /// Create a config with explicit zone sizes and no fixed base.
    pub fn new(permanent_size: usize, transient_size: usize) -> Self {
        Self {
            permanent_size,
            transient_size,
            base_address: None,
        }
    }

    /// Request a fixed base address.
    pub fn with_base_address(mut self, address: usize) -> Self {
        self.base_address = Some(address);
        self
    }

    /// Total mapping size, or `None` on overflow.
    pub fn total_size(&self) -> Option<usize> {
        self.permanent_size.checked_add(self.transient_size)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.permanent_size == 0 {
            return Err(ArenaError::ZeroSized { zone: "permanent" });
        }
        if self.transient_size == 0 {
            return Err(ArenaError::ZeroSized { zone: "transient" });
        }
        if self.permanent_size <= PERMANENT_HEADER_SIZE {
            return Err(ArenaError::PermanentTooSmall {
                size: self.permanent_size,
                minimum: PERMANENT_HEADER_SIZE + 1,
            });
        }
        if self.total_size().is_none() {
            return Err(ArenaError::SizeOverflow);
        }
        if let Some(address) = self.base_address {
            if address % PAGE_ALIGN != 0 {
                return Err(ArenaError::MisalignedBase { address });
            }
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERMANENT_SIZE, Self::DEFAULT_TRANSIENT_SIZE)
    }
}
