//! Where module code comes from.

use std::time::SystemTime;

use reel_core::ModuleGeneration;

use crate::error::ModuleError;
use crate::module::SimulationModule;

/// A loadable, replaceable origin of module code.
///
/// The host compares [`last_modified`](ModuleSource::last_modified) against
/// the value seen at the last successful load to decide when to reload.
pub trait ModuleSource {
    /// Modification time of the current artifact.
    fn last_modified(&self) -> Result<SystemTime, ModuleError>;

    /// Load a fresh instance of the module code.
    ///
    /// `generation` is the generation the new instance will have if the
    /// load succeeds. The previous instance is still alive while this runs.
    fn load(
        &mut self,
        generation: ModuleGeneration,
    ) -> Result<Box<dyn SimulationModule>, ModuleError>;

    /// Short human-readable label for logs.
    fn describe(&self) -> String;
}
