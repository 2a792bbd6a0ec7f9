//! Frame scheduler for the reel simulation host.
//!
//! [`Host`] owns the arena, the module host, the recording session and the
//! double-buffered input, and drives them once per tick:
//!
//! ```text
//!   measure dt ─> reload check ─> begin_tick ─> poll + translate events
//!        ▲                                              │
//!        │                                   session commands, then
//!   sleep(budget - work)                     record / replace frame
//!        │                                              │
//!     present <─ swap buffers <─ update <─ ensure_initialized
//! ```
//!
//! The loop is single-threaded and cooperative; the end-of-tick sleep is
//! its only suspension point. A tick that overruns its budget is logged and
//! counted, never caught up or skipped.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod metrics;
pub mod platform;

pub use config::{Bindings, ConfigError, HostConfig, KeyAction, SurfaceConfig};
pub use error::HostError;
pub use host::Host;
pub use input::{
    Control, GamepadAxis, GamepadButton, InputTranslator, Key, MouseButton, ParseEventError,
    PlatformEvent, SessionCommand,
};
pub use metrics::{HostMetrics, TickMetrics};
pub use platform::{ChannelEventSource, EventBatch, EventSource, NullPresenter, Presenter};
