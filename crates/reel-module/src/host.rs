//! The module host: owns the active module and swaps it on change.

use std::time::{Duration, Instant, SystemTime};

use reel_arena::Arena;
use reel_core::{InputFrame, ModuleGeneration, Surface};

use crate::error::ModuleError;
use crate::module::SimulationModule;
use crate::source::ModuleSource;

/// Reload tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReloadConfig {
    /// How long the artifact's timestamp must stay unchanged before a
    /// reload is attempted. Default: 250 ms.
    pub settle_delay: Duration,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(250),
        }
    }
}

/// Where the host is in the reload cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleState {
    /// Running code matches the artifact.
    Loaded,
    /// The artifact changed; waiting for it to settle before loading.
    Reloading {
        /// Timestamp observed when the current settle period began.
        observed: SystemTime,
        /// When the current settle period began.
        since: Instant,
    },
}

/// Result of one [`ModuleHost::reload_if_changed`] poll.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// Nothing to do.
    Unchanged,
    /// A change is waiting out the settle delay.
    Settling,
    /// New code is now active.
    Reloaded(ModuleGeneration),
    /// Loading the new code failed; the old code keeps running and the
    /// load is retried on a later poll.
    Failed(ModuleError),
}

/// Owns the active module and the source it came from.
///
/// The arena is never touched by loading or reloading; module state lives
/// in the arena and simply carries over to the new code.
pub struct ModuleHost<S: ModuleSource> {
    module: Box<dyn SimulationModule>,
    source: S,
    config: ReloadConfig,
    state: ModuleState,
    loaded_modified: SystemTime,
    generation: ModuleGeneration,
    reloads: u64,
    failed_reloads: u64,
}

impl<S: ModuleSource> ModuleHost<S> {
    /// Load the initial module. Failure here is fatal for the host.
    pub fn load(mut source: S, config: ReloadConfig) -> Result<Self, ModuleError> {
        let loaded_modified = source.last_modified()?;
        let generation = ModuleGeneration::default();
        let module = source.load(generation)?;
        log::info!("loaded module {} (generation {generation})", source.describe());
        Ok(Self {
            module,
            source,
            config,
            state: ModuleState::Loaded,
            loaded_modified,
            generation,
            reloads: 0,
            failed_reloads: 0,
        })
    }

    /// Poll the source and reload if its artifact changed and settled.
    pub fn reload_if_changed(&mut self) -> ReloadOutcome {
        self.reload_if_changed_at(Instant::now())
    }

    /// [`reload_if_changed`](Self::reload_if_changed) with an explicit clock.
    pub fn reload_if_changed_at(&mut self, now: Instant) -> ReloadOutcome {
        let modified = match self.source.last_modified() {
            Ok(t) => t,
            Err(e) => {
                // Builds commonly delete the artifact before rewriting it.
                log::debug!("module {} unavailable: {e}", self.source.describe());
                return ReloadOutcome::Unchanged;
            }
        };

        match self.state {
            ModuleState::Loaded => {
                if modified == self.loaded_modified {
                    return ReloadOutcome::Unchanged;
                }
                log::debug!("module {} changed; settling", self.source.describe());
                self.state = ModuleState::Reloading {
                    observed: modified,
                    since: now,
                };
                if !self.config.settle_delay.is_zero() {
                    return ReloadOutcome::Settling;
                }
            }
            ModuleState::Reloading { observed, since } => {
                if modified != observed {
                    self.state = ModuleState::Reloading {
                        observed: modified,
                        since: now,
                    };
                    return ReloadOutcome::Settling;
                }
                if now.saturating_duration_since(since) < self.config.settle_delay {
                    return ReloadOutcome::Settling;
                }
            }
        }

        self.swap(modified)
    }

    fn swap(&mut self, modified: SystemTime) -> ReloadOutcome {
        let next = self.generation.next();
        match self.source.load(next) {
            Ok(module) => {
                // The new module is fully loaded before the old one drops.
                self.module = module;
                self.generation = next;
                self.loaded_modified = modified;
                self.reloads += 1;
                self.state = ModuleState::Loaded;
                log::info!(
                    "reloaded module {} (generation {next})",
                    self.source.describe()
                );
                ReloadOutcome::Reloaded(next)
            }
            Err(e) => {
                self.failed_reloads += 1;
                // Back to Loaded with the old timestamp, so the next poll
                // sees the change again and restarts the settle delay.
                self.state = ModuleState::Loaded;
                log::warn!(
                    "reload of {} failed, keeping generation {}: {e}",
                    self.source.describe(),
                    self.generation
                );
                ReloadOutcome::Failed(e)
            }
        }
    }

    /// Call `init` if the arena's initialized flag is clear, then set it.
    ///
    /// Returns whether `init` ran.
    pub fn ensure_initialized(&mut self, arena: &mut Arena, surface: &mut Surface) -> bool {
        if arena.is_initialized() {
            return false;
        }
        self.module.init(arena, surface);
        arena.set_initialized(true);
        log::info!("module state initialised");
        true
    }

    /// Run one tick of module code.
    pub fn update(
        &mut self,
        arena: &mut Arena,
        surface: &mut Surface,
        input: &InputFrame,
        delta_seconds: f32,
    ) {
        self.module.update(arena, surface, input, delta_seconds);
    }

    /// Current reload state.
    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Generation of the running code.
    pub fn generation(&self) -> ModuleGeneration {
        self.generation
    }

    /// Successful reloads so far.
    pub fn reloads(&self) -> u64 {
        self.reloads
    }

    /// Failed reload attempts so far.
    pub fn failed_reloads(&self) -> u64 {
        self.failed_reloads
    }

    /// The source the module is loaded from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: ModuleSource> std::fmt::Debug for ModuleHost<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHost")
            .field("source", &self.source.describe())
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("reloads", &self.reloads)
            .field("failed_reloads", &self.failed_reloads)
            .finish()
    }
}
