//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur while reserving the arena.
///
/// Every variant is fatal at startup: a host without its arena has no
/// degraded mode to fall back to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The OS refused the mapping.
    OutOfMemory {
        /// Total bytes requested.
        requested: usize,
        /// Raw OS error code, or 0 if the OS returned a null mapping.
        os_error: i32,
    },
    /// A zone was configured with zero bytes.
    ZeroSized {
        /// Which zone (`"permanent"` or `"transient"`).
        zone: &'static str,
    },
    /// The permanent zone cannot hold the host header plus any module state.
    PermanentTooSmall {
        /// Configured permanent size in bytes.
        size: usize,
        /// Smallest accepted size in bytes.
        minimum: usize,
    },
    /// `permanent_size + transient_size` overflows `usize`.
    SizeOverflow,
    /// The requested base address is not page-aligned.
    MisalignedBase {
        /// The requested address.
        address: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                os_error,
            } => {
                write!(
                    f,
                    "unable to reserve {requested} bytes of arena memory (os error {os_error})"
                )
            }
            Self::ZeroSized { zone } => write!(f, "{zone} zone must not be empty"),
            Self::PermanentTooSmall { size, minimum } => {
                write!(
                    f,
                    "permanent zone of {size} bytes is below the minimum of {minimum} bytes"
                )
            }
            Self::SizeOverflow => write!(f, "arena size overflows the address space"),
            Self::MisalignedBase { address } => {
                write!(f, "base address {address:#x} is not page-aligned")
            }
        }
    }
}

impl Error for ArenaError {}
