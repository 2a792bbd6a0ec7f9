//! Reel: a live-reload simulation host with deterministic looped recording.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all reel sub-crates, plus the pieces the `reel` binary is built from.
//!
//! # Quick start
//!
//! ```no_run
//! use reel::prelude::*;
//!
//! let config = HostConfig::default();
//! let source = DylibSource::new("target/debug/libreel_sample.so");
//! let (tx, events) = ChannelEventSource::channel();
//! let mut host = Host::new(config, source, events, NullPresenter::default()).unwrap();
//!
//! tx.send("toggle 1".parse().unwrap()).unwrap();
//! tx.send(PlatformEvent::Quit).unwrap();
//! let metrics = host.run();
//! println!("{} ticks", metrics.ticks);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `reel-core` | Input frames, module ABI, surfaces, IDs |
//! | [`arena`] | `reel-arena` | The fixed-address simulation memory |
//! | [`module`] | `reel-module` | Module loading and hot reload |
//! | [`replay`] | `reel-replay` | Recording files and looped playback |
//! | [`engine`] | `reel-engine` | The tick loop, input translation, config |
//! | [`cli`] | this crate | Argument parsing and the line-based event driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cli;

/// Core types and the module ABI (`reel-core`).
pub use reel_core as types;

/// The fixed-address simulation memory (`reel-arena`).
pub use reel_arena as arena;

/// Module loading and hot reload (`reel-module`).
///
/// [`module::DylibSource`] loads a compiled module; implement
/// [`module::SimulationModule`] directly to run one in-process.
pub use reel_module as module;

/// Recording files and looped playback (`reel-replay`).
pub use reel_replay as replay;

/// The host tick loop (`reel-engine`).
pub use reel_engine as engine;

/// Common imports for running a host.
///
/// ```rust
/// use reel::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use reel_core::{ButtonId, InputFrame, SlotId, Surface};

    // Arena
    pub use reel_arena::{Arena, ArenaConfig};

    // Modules
    pub use reel_module::{DylibSource, ModuleSource, ReloadConfig, SimulationModule};

    // Sessions
    pub use reel_replay::{Session, SessionState};

    // Engine
    pub use reel_engine::{
        ChannelEventSource, EventSource, Host, HostConfig, HostError, HostMetrics, Key,
        NullPresenter, PlatformEvent, Presenter, SessionCommand,
    };
}
