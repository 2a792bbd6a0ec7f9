//! Startup errors for the host.

use std::error::Error;
use std::fmt;

use reel_arena::ArenaError;
use reel_module::ModuleError;

use crate::config::ConfigError;

/// Fatal errors raised while constructing a [`Host`](crate::Host).
///
/// Nothing after startup is fatal: reload failures keep the old code and
/// session failures fall back to live input.
#[derive(Debug)]
pub enum HostError {
    /// Configuration failed validation.
    Config(ConfigError),
    /// The arena could not be reserved.
    Arena(ArenaError),
    /// The initial module could not be loaded.
    Module(ModuleError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::Module(e) => write!(f, "module: {e}"),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Arena(e) => Some(e),
            Self::Module(e) => Some(e),
        }
    }
}

impl From<ConfigError> for HostError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ArenaError> for HostError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<ModuleError> for HostError {
    fn from(e: ModuleError) -> Self {
        Self::Module(e)
    }
}
