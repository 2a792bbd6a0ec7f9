//! Hot-reloadable simulation module host.
//!
//! Module code lives behind the [`SimulationModule`] trait. In production
//! it is a dynamic library loaded with `libloading` ([`DylibSource`]); in
//! tests it is any in-process type. A [`ModuleSource`] knows where the code
//! comes from and when it last changed; [`ModuleHost`] polls it once per
//! tick and swaps in new code without touching the arena.
//!
//! ```text
//!              load
//!   (no host) ──────> Loaded ──artifact changed──> Reloading
//!                       ▲                             │
//!                       └────settled: load new, ──────┘
//!                             drop old (or keep old
//!                             on failure and retry)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod dylib;
pub mod error;
pub mod host;
pub mod module;
pub mod source;

pub use dylib::{DylibModule, DylibSource};
pub use error::ModuleError;
pub use host::{ModuleHost, ModuleState, ReloadConfig, ReloadOutcome};
pub use module::SimulationModule;
pub use source::ModuleSource;
