//! Error types for module loading.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while loading or reloading module code.
#[derive(Debug)]
pub enum ModuleError {
    /// The module artifact does not exist.
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },
    /// The artifact loaded but does not export a required entry point.
    SymbolMissing {
        /// Name of the missing symbol.
        symbol: String,
    },
    /// The dynamic loader rejected the artifact.
    LoadFailed {
        /// Path handed to the loader.
        path: PathBuf,
        /// Loader diagnostic.
        detail: String,
    },
    /// Filesystem error while inspecting or copying the artifact.
    Io(io::Error),
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "module not found: {}", path.display()),
            Self::SymbolMissing { symbol } => write!(f, "module is missing symbol {symbol}"),
            Self::LoadFailed { path, detail } => {
                write!(f, "failed to load module {}: {detail}", path.display())
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ModuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ModuleError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
