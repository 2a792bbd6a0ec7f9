//! Module code loaded from a dynamic library.
//!
//! The build writes the artifact in place; the host never opens that file
//! directly. Each load copies it to a shadow path unique to the generation
//! and opens the copy, so the next build can overwrite the original while
//! the current code is running, and the dynamic loader cannot hand back a
//! cached image of an older copy.

#![allow(unsafe_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use libloading::Library;
use reel_arena::Arena;
use reel_core::{
    InitFn, InputFrame, ModuleGeneration, Surface, UpdateFn, INIT_SYMBOL, UPDATE_SYMBOL,
};

use crate::error::ModuleError;
use crate::module::SimulationModule;
use crate::source::ModuleSource;

fn symbol_name(symbol: &[u8]) -> String {
    let trimmed = symbol.strip_suffix(&[0]).unwrap_or(symbol);
    String::from_utf8_lossy(trimmed).into_owned()
}

/// One opened copy of the module library and its two entry points.
///
/// The entry points are only valid while the library is loaded; both are
/// dropped together. Dropping the module unloads the library and deletes
/// its shadow copy.
pub struct DylibModule {
    init: InitFn,
    update: UpdateFn,
    library: Option<Library>,
    path: PathBuf,
}

impl DylibModule {
    /// Open the library at `path` and resolve both entry points.
    ///
    /// The library's initialisers run during this call; the library must
    /// be trusted.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ModuleError> {
        let path = path.into();

        // SAFETY: loading runs the library's static initialisers. Module
        // artifacts are trusted build outputs of the same workspace.
        let library = unsafe { Library::new(&path) }.map_err(|e| ModuleError::LoadFailed {
            path: path.clone(),
            detail: e.to_string(),
        })?;

        // SAFETY: the symbol types are the versioned ABI signatures; a
        // module exporting these names promises to match them. The fn
        // pointers are copied out and kept alongside the library.
        let init: InitFn = unsafe {
            *library
                .get::<InitFn>(INIT_SYMBOL)
                .map_err(|_| ModuleError::SymbolMissing {
                    symbol: symbol_name(INIT_SYMBOL),
                })?
        };
        // SAFETY: as above.
        let update: UpdateFn = unsafe {
            *library
                .get::<UpdateFn>(UPDATE_SYMBOL)
                .map_err(|_| ModuleError::SymbolMissing {
                    symbol: symbol_name(UPDATE_SYMBOL),
                })?
        };

        Ok(Self {
            init,
            update,
            library: Some(library),
            path,
        })
    }

    /// Path of the opened library file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SimulationModule for DylibModule {
    fn init(&mut self, arena: &mut Arena, surface: &mut Surface) {
        let mut memory = arena.memory_handle();
        let mut descriptor = surface.descriptor();
        // SAFETY: both views point into memory owned by the host that stays
        // valid and unaliased for the duration of the call; the library is
        // still loaded because `self` holds it.
        unsafe { (self.init)(&mut memory, &mut descriptor) };
    }

    fn update(
        &mut self,
        arena: &mut Arena,
        surface: &mut Surface,
        input: &InputFrame,
        delta_seconds: f32,
    ) {
        let mut memory = arena.memory_handle();
        let mut descriptor = surface.descriptor();
        // SAFETY: as in `init`; `input` is borrowed for the call only.
        unsafe { (self.update)(&mut memory, &mut descriptor, input, delta_seconds) };
    }
}

impl Drop for DylibModule {
    fn drop(&mut self) {
        drop(self.library.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("removed shadow copy {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("could not remove {}: {e}", self.path.display()),
        }
    }
}

impl std::fmt::Debug for DylibModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DylibModule")
            .field("path", &self.path)
            .field("loaded", &self.library.is_some())
            .finish()
    }
}

/// A module artifact on disk, opened through per-generation shadow copies.
#[derive(Clone, Debug)]
pub struct DylibSource {
    path: PathBuf,
    shadow_dir: PathBuf,
}

impl DylibSource {
    /// Watch the artifact at `path`, keeping shadow copies in a
    /// process-specific directory under the system temp dir.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let shadow_dir = std::env::temp_dir().join(format!("reel-shadow-{}", std::process::id()));
        Self {
            path: path.into(),
            shadow_dir,
        }
    }

    /// Keep shadow copies in `dir` instead.
    pub fn with_shadow_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shadow_dir = dir.into();
        self
    }

    /// The artifact being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where generation `generation` of the artifact is copied before
    /// opening: `<shadow_dir>/<stem>.<generation>.<ext>`.
    pub fn shadow_path(&self, generation: ModuleGeneration) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "module".to_string());
        let name = match self.path.extension() {
            Some(ext) => format!("{stem}.{generation}.{}", ext.to_string_lossy()),
            None => format!("{stem}.{generation}"),
        };
        self.shadow_dir.join(name)
    }

    fn not_found_or_io(&self, e: io::Error) -> ModuleError {
        if e.kind() == io::ErrorKind::NotFound {
            ModuleError::NotFound {
                path: self.path.clone(),
            }
        } else {
            ModuleError::Io(e)
        }
    }
}

impl ModuleSource for DylibSource {
    fn last_modified(&self) -> Result<SystemTime, ModuleError> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|e| self.not_found_or_io(e))
    }

    fn load(
        &mut self,
        generation: ModuleGeneration,
    ) -> Result<Box<dyn SimulationModule>, ModuleError> {
        std::fs::create_dir_all(&self.shadow_dir)?;
        let shadow = self.shadow_path(generation);
        std::fs::copy(&self.path, &shadow).map_err(|e| self.not_found_or_io(e))?;
        log::debug!(
            "copied {} to {}",
            self.path.display(),
            shadow.display()
        );
        match DylibModule::open(&shadow) {
            Ok(module) => Ok(Box::new(module)),
            Err(e) => {
                let _ = std::fs::remove_file(&shadow);
                Err(e)
            }
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
