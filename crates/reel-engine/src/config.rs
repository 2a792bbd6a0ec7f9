//! Host configuration, validation, and error types.
//!
//! [`HostConfig`] gathers everything the scheduler needs at startup.
//! [`validate()`](HostConfig::validate) checks structural invariants before
//! any memory is reserved or code loaded.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use reel_arena::{ArenaConfig, ArenaError};
use reel_core::{ButtonId, SlotId};
use reel_module::ReloadConfig;

use crate::input::Key;

// ── Bindings ───────────────────────────────────────────────────────

/// What a bound key does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Drive a simulation button.
    Button(ButtonId),
    /// Stop the host.
    Quit,
    /// Cycle the record/play loop on a slot.
    ToggleLoop(SlotId),
}

/// Keyboard bindings, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bindings {
    map: IndexMap<Key, KeyAction>,
}

impl Bindings {
    /// No keys bound.
    pub fn empty() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }

    /// Bind `key`, replacing any previous binding.
    pub fn bind(&mut self, key: Key, action: KeyAction) -> &mut Self {
        self.map.insert(key, action);
        self
    }

    /// Remove the binding for `key`.
    pub fn unbind(&mut self, key: Key) -> Option<KeyAction> {
        self.map.shift_remove(&key)
    }

    /// The action bound to `key`.
    pub fn get(&self, key: Key) -> Option<KeyAction> {
        self.map.get(&key).copied()
    }

    /// Iterate bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, KeyAction)> + '_ {
        self.map.iter().map(|(k, a)| (*k, *a))
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no keys are bound.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for Bindings {
    /// WASD and arrows move, E/F/Q/R are the face actions, left shift and
    /// left control the shoulders, P/I start and select, Escape quits and L
    /// cycles the loop on slot 1.
    fn default() -> Self {
        use ButtonId::*;
        let mut b = Self::empty();
        for (key, button) in [
            (Key::W, MoveNorth),
            (Key::A, MoveWest),
            (Key::S, MoveSouth),
            (Key::D, MoveEast),
            (Key::Up, MoveNorth),
            (Key::Left, MoveWest),
            (Key::Down, MoveSouth),
            (Key::Right, MoveEast),
            (Key::E, ActionSouth),
            (Key::F, ActionEast),
            (Key::Q, ActionWest),
            (Key::R, ActionNorth),
            (Key::LShift, LeftShoulder),
            (Key::LCtrl, RightShoulder),
            (Key::P, Start),
            (Key::I, Select),
        ] {
            b.bind(key, KeyAction::Button(button));
        }
        b.bind(Key::Escape, KeyAction::Quit);
        b.bind(Key::L, KeyAction::ToggleLoop(SlotId(1)));
        b
    }
}

// ── SurfaceConfig ──────────────────────────────────────────────────

/// Dimensions of the pixel surface handed to the module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceConfig {
    /// Width in pixels. Default: 768.
    pub width: u32,
    /// Height in pixels. Default: 432.
    pub height: u32,
    /// Bytes per pixel. Default: 4 (RGBA8).
    pub bytes_per_pixel: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 768,
            height: 432,
            bytes_per_pixel: 4,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`HostConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Arena configuration is invalid.
    Arena(ArenaError),
    /// tick_rate_hz is not a number within
    /// [`HostConfig::MIN_TICK_RATE_HZ`]`..=`[`HostConfig::MAX_TICK_RATE_HZ`].
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// Surface has a zero dimension.
    EmptySurface {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// bytes_per_pixel is outside 1..=4.
    InvalidBytesPerPixel {
        /// The configured value.
        value: u32,
    },
    /// stick_threshold is outside `(0, 1)`.
    InvalidStickThreshold {
        /// The configured value.
        value: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::InvalidTickRate { value } => {
                write!(
                    f,
                    "tick_rate_hz must be within {}..={}, got {value}",
                    HostConfig::MIN_TICK_RATE_HZ,
                    HostConfig::MAX_TICK_RATE_HZ
                )
            }
            Self::EmptySurface { width, height } => {
                write!(f, "surface must be non-empty, got {width}x{height}")
            }
            Self::InvalidBytesPerPixel { value } => {
                write!(f, "bytes_per_pixel must be 1..=4, got {value}")
            }
            Self::InvalidStickThreshold { value } => {
                write!(f, "stick_threshold must be in (0, 1), got {value}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

// ── HostConfig ─────────────────────────────────────────────────────

/// Complete configuration for constructing a [`Host`](crate::Host).
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Target ticks per second. Default: 60.
    pub tick_rate_hz: f64,
    /// Arena sizes and optional fixed base address.
    pub arena: ArenaConfig,
    /// Surface dimensions.
    pub surface: SurfaceConfig,
    /// Hot-reload tuning.
    pub reload: ReloadConfig,
    /// Directory holding slot recordings. Default: `recordings`.
    pub recording_dir: PathBuf,
    /// Keyboard bindings.
    pub bindings: Bindings,
    /// Left-stick deflection beyond which a move button counts as held.
    /// Default: 0.5.
    pub stick_threshold: f32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            arena: ArenaConfig::default(),
            surface: SurfaceConfig::default(),
            reload: ReloadConfig::default(),
            recording_dir: PathBuf::from("recordings"),
            bindings: Bindings::default(),
            stick_threshold: 0.5,
        }
    }
}

impl HostConfig {
    /// Slowest accepted tick rate: one tick every 1000 seconds.
    pub const MIN_TICK_RATE_HZ: f64 = 1.0e-3;

    /// Fastest accepted tick rate: a one nanosecond budget.
    pub const MAX_TICK_RATE_HZ: f64 = 1.0e9;

    /// Check a tick rate against the accepted range.
    pub fn check_tick_rate(tick_rate_hz: f64) -> Result<(), ConfigError> {
        if (Self::MIN_TICK_RATE_HZ..=Self::MAX_TICK_RATE_HZ).contains(&tick_rate_hz) {
            Ok(())
        } else {
            Err(ConfigError::InvalidTickRate {
                value: tick_rate_hz,
            })
        }
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_tick_rate(self.tick_rate_hz)?;
        self.arena.validate()?;
        let SurfaceConfig {
            width,
            height,
            bytes_per_pixel,
        } = self.surface;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptySurface { width, height });
        }
        if !(1..=4).contains(&bytes_per_pixel) {
            return Err(ConfigError::InvalidBytesPerPixel {
                value: bytes_per_pixel,
            });
        }
        if !(self.stick_threshold > 0.0 && self.stick_threshold < 1.0) {
            return Err(ConfigError::InvalidStickThreshold {
                value: self.stick_threshold,
            });
        }
        Ok(())
    }

    /// Wall-clock budget of one tick.
    ///
    /// Saturates at [`Duration::MAX`] for a rate [`validate`](Self::validate)
    /// would reject.
    pub fn tick_budget(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.tick_rate_hz).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.surface.width, 768);
        assert_eq!(config.surface.height, 432);
        assert_eq!(config.reload.settle_delay, Duration::from_millis(250));
        let budget = config.tick_budget();
        assert!(budget > Duration::from_micros(16_600) && budget < Duration::from_micros(16_700));
    }

    #[test]
    fn rejects_bad_tick_rate() {
        for value in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-300, 1e-4, 2e9] {
            let config = HostConfig {
                tick_rate_hz: value,
                ..HostConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidTickRate { .. })
            ));
        }
    }

    #[test]
    fn tick_rate_bounds_have_representable_budgets() {
        for value in [HostConfig::MIN_TICK_RATE_HZ, HostConfig::MAX_TICK_RATE_HZ] {
            let config = HostConfig {
                tick_rate_hz: value,
                ..HostConfig::default()
            };
            assert!(config.validate().is_ok());
            assert!(config.tick_budget() <= Duration::from_secs(1000));
        }
    }

    #[test]
    fn tiny_tick_rate_saturates_instead_of_panicking() {
        let config = HostConfig {
            tick_rate_hz: 1e-300,
            ..HostConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.tick_budget(), Duration::MAX);
    }

    #[test]
    fn rejects_bad_surface() {
        let mut config = HostConfig::default();
        config.surface.height = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptySurface {
                width: 768,
                height: 0
            })
        );
        config.surface = SurfaceConfig {
            bytes_per_pixel: 5,
            ..SurfaceConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidBytesPerPixel { value: 5 })
        );
    }

    #[test]
    fn rejects_bad_arena_and_threshold() {
        let mut config = HostConfig::default();
        config.arena = ArenaConfig::new(0, 4096);
        assert!(matches!(config.validate(), Err(ConfigError::Arena(_))));
        config.arena = ArenaConfig::default();
        config.stick_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStickThreshold { .. })
        ));
    }

    #[test]
    fn default_bindings_cover_keyboard_layout() {
        let b = Bindings::default();
        assert_eq!(b.get(Key::W), Some(KeyAction::Button(ButtonId::MoveNorth)));
        assert_eq!(b.get(Key::Down), Some(KeyAction::Button(ButtonId::MoveSouth)));
        assert_eq!(b.get(Key::R), Some(KeyAction::Button(ButtonId::ActionNorth)));
        assert_eq!(b.get(Key::LCtrl), Some(KeyAction::Button(ButtonId::RightShoulder)));
        assert_eq!(b.get(Key::Escape), Some(KeyAction::Quit));
        assert_eq!(b.get(Key::L), Some(KeyAction::ToggleLoop(SlotId(1))));
        assert_eq!(b.len(), Key::ALL.len());
    }

    #[test]
    fn rebinding_replaces_and_keeps_order() {
        let mut b = Bindings::empty();
        b.bind(Key::P, KeyAction::Quit)
            .bind(Key::A, KeyAction::Button(ButtonId::Start))
            .bind(Key::P, KeyAction::ToggleLoop(SlotId(4)));
        let order: Vec<_> = b.iter().collect();
        assert_eq!(
            order,
            vec![
                (Key::P, KeyAction::ToggleLoop(SlotId(4))),
                (Key::A, KeyAction::Button(ButtonId::Start)),
            ]
        );
        assert_eq!(b.unbind(Key::P), Some(KeyAction::ToggleLoop(SlotId(4))));
        assert_eq!(b.get(Key::P), None);
    }
}
