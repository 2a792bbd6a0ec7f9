//! Platform events and their translation into the input model.
//!
//! A platform layer (window system, stdin driver, test script) produces
//! [`PlatformEvent`]s. [`InputTranslator`] folds them into the frame being
//! built this tick and reports the few events that control the host
//! itself rather than the simulation.

use std::fmt;
use std::str::FromStr;

use reel_core::{apply_analog_event, apply_digital_event, ButtonId, InputBuffers, SlotId};

use crate::config::{Bindings, KeyAction};

/// Keyboard keys the host knows how to bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// W
    W,
    /// A
    A,
    /// S
    S,
    /// D
    D,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Arrow left
    Left,
    /// Arrow right
    Right,
    /// E
    E,
    /// F
    F,
    /// Q
    Q,
    /// R
    R,
    /// Left shift
    LShift,
    /// Left control
    LCtrl,
    /// P
    P,
    /// I
    I,
    /// L
    L,
    /// Escape
    Escape,
}

impl Key {
    /// Every key, in declaration order.
    pub const ALL: [Key; 18] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::E,
        Key::F,
        Key::Q,
        Key::R,
        Key::LShift,
        Key::LCtrl,
        Key::P,
        Key::I,
        Key::L,
        Key::Escape,
    ];

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::W => "w",
            Self::A => "a",
            Self::S => "s",
            Self::D => "d",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::E => "e",
            Self::F => "f",
            Self::Q => "q",
            Self::R => "r",
            Self::LShift => "lshift",
            Self::LCtrl => "lctrl",
            Self::P => "p",
            Self::I => "i",
            Self::L => "l",
            Self::Escape => "escape",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Gamepad buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    /// Bottom face button.
    South,
    /// Right face button.
    East,
    /// Left face button.
    West,
    /// Top face button.
    North,
    /// Left shoulder.
    LeftShoulder,
    /// Right shoulder.
    RightShoulder,
    /// Start.
    Start,
    /// Back / select.
    Back,
    /// D-pad up.
    DpadUp,
    /// D-pad down.
    DpadDown,
    /// D-pad left.
    DpadLeft,
    /// D-pad right.
    DpadRight,
}

impl GamepadButton {
    fn button_id(self) -> ButtonId {
        match self {
            Self::South => ButtonId::ActionSouth,
            Self::East => ButtonId::ActionEast,
            Self::West => ButtonId::ActionWest,
            Self::North => ButtonId::ActionNorth,
            Self::LeftShoulder => ButtonId::LeftShoulder,
            Self::RightShoulder => ButtonId::RightShoulder,
            Self::Start => ButtonId::Start,
            Self::Back => ButtonId::Select,
            Self::DpadUp => ButtonId::MoveNorth,
            Self::DpadDown => ButtonId::MoveSouth,
            Self::DpadLeft => ButtonId::MoveWest,
            Self::DpadRight => ButtonId::MoveEast,
        }
    }

    fn is_dpad(self) -> bool {
        matches!(
            self,
            Self::DpadUp | Self::DpadDown | Self::DpadLeft | Self::DpadRight
        )
    }
}

/// Gamepad axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    /// Left stick, horizontal. Negative is west.
    LeftX,
    /// Left stick, vertical. Negative is north.
    LeftY,
    /// Right stick, horizontal. Ignored.
    RightX,
    /// Right stick, vertical. Ignored.
    RightY,
}

/// Mouse buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary.
    Left,
    /// Middle.
    Middle,
    /// Secondary.
    Right,
}

impl MouseButton {
    fn button_id(self) -> ButtonId {
        match self {
            Self::Left => ButtonId::MouseLeft,
            Self::Middle => ButtonId::MouseMiddle,
            Self::Right => ButtonId::MouseRight,
        }
    }
}

/// Explicit recording-session requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start recording into a slot.
    Record(SlotId),
    /// Start playing a slot.
    Play(SlotId),
    /// Stop whatever session is active.
    Stop,
    /// Advance the loop cycle on a slot: record, then play, then stop.
    Toggle(SlotId),
}

/// One event from the platform layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlatformEvent {
    /// The user asked to close the host.
    Quit,
    /// A key changed state.
    Key {
        /// Which key.
        key: Key,
        /// New state.
        down: bool,
        /// Whether this is an OS auto-repeat.
        repeat: bool,
    },
    /// A gamepad button changed state.
    GamepadButton {
        /// Which button.
        button: GamepadButton,
        /// New state.
        down: bool,
    },
    /// A gamepad axis moved. `value` is in `[-1, 1]`, deadzone applied.
    GamepadAxis {
        /// Which axis.
        axis: GamepadAxis,
        /// New position.
        value: f32,
    },
    /// The mouse moved, in surface pixels.
    MouseMotion {
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
    },
    /// A mouse button changed state.
    MouseButton {
        /// Which button.
        button: MouseButton,
        /// New state.
        down: bool,
    },
    /// A recording-session request.
    Session(SessionCommand),
    /// Zero the arena's transient storage before the next update.
    ClearTransient,
}

/// Events that act on the host rather than the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// Stop after the current tick.
    Quit,
    /// Change the recording session.
    Session(SessionCommand),
    /// Zero transient storage.
    ClearTransient,
}

/// Applies platform events to the frame under construction.
#[derive(Clone, Debug)]
pub struct InputTranslator {
    bindings: Bindings,
    stick_threshold: f32,
}

impl InputTranslator {
    /// Translator using `bindings` for keys and `stick_threshold` for
    /// deriving move buttons from the left stick.
    pub fn new(bindings: Bindings, stick_threshold: f32) -> Self {
        Self {
            bindings,
            stick_threshold,
        }
    }

    /// Key bindings in use.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Fold `event` into the current frame of `input`.
    pub fn apply(&self, event: &PlatformEvent, input: &mut InputBuffers) -> Option<Control> {
        match *event {
            PlatformEvent::Quit => Some(Control::Quit),
            PlatformEvent::Session(command) => Some(Control::Session(command)),
            PlatformEvent::ClearTransient => Some(Control::ClearTransient),
            PlatformEvent::Key { key, down, repeat } => self.apply_key(key, down, repeat, input),
            PlatformEvent::GamepadButton { button, down } => {
                let frame = input.current_mut();
                if button.is_dpad() {
                    frame.set_analog(false);
                }
                apply_digital_event(frame, button.button_id(), down);
                None
            }
            PlatformEvent::GamepadAxis { axis, value } => {
                self.apply_axis(axis, value, input);
                None
            }
            PlatformEvent::MouseMotion { x, y } => {
                let frame = input.current_mut();
                frame.mouse_x = x;
                frame.mouse_y = y;
                None
            }
            PlatformEvent::MouseButton { button, down } => {
                apply_digital_event(input.current_mut(), button.button_id(), down);
                None
            }
        }
    }

    fn apply_key(
        &self,
        key: Key,
        down: bool,
        repeat: bool,
        input: &mut InputBuffers,
    ) -> Option<Control> {
        match self.bindings.get(key)? {
            KeyAction::Quit => down.then_some(Control::Quit),
            KeyAction::ToggleLoop(slot) => {
                (down && !repeat).then_some(Control::Session(SessionCommand::Toggle(slot)))
            }
            KeyAction::Button(button) => {
                if !repeat {
                    apply_digital_event(input.current_mut(), button, down);
                }
                None
            }
        }
    }

    fn apply_axis(&self, axis: GamepadAxis, value: f32, input: &mut InputBuffers) {
        let value = if value.is_finite() {
            value.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let threshold = self.stick_threshold;
        let (old, new) = input.split_mut();
        let (negative, positive) = match axis {
            GamepadAxis::LeftX => {
                new.left_stick_x = value;
                (ButtonId::MoveWest, ButtonId::MoveEast)
            }
            GamepadAxis::LeftY => {
                new.left_stick_y = value;
                (ButtonId::MoveNorth, ButtonId::MoveSouth)
            }
            GamepadAxis::RightX | GamepadAxis::RightY => return,
        };
        new.set_analog(true);
        apply_analog_event(old, new, negative, value < -threshold);
        apply_analog_event(old, new, positive, value > threshold);
    }
}

/// Error parsing a text event line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseEventError {
    line: String,
    reason: &'static str,
}

impl fmt::Display for ParseEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse event {:?}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ParseEventError {}

impl FromStr for Key {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEventError {
                line: s.to_string(),
                reason: "unknown key",
            })
    }
}

/// Text form of events, one per line, for headless drivers:
///
/// ```text
/// quit
/// key <name> down|up|repeat
/// pad <south|east|west|north|lb|rb|start|back|up|down|left|right> down|up
/// axis <leftx|lefty|rightx|righty> <value>
/// mouse <x> <y>
/// click <left|middle|right> down|up
/// record <slot> | play <slot> | toggle <slot> | stop
/// clear-transient
/// ```
impl FromStr for PlatformEvent {
    type Err = ParseEventError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fail = |reason| ParseEventError {
            line: line.to_string(),
            reason,
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let state = |word: &str| match word {
            "down" => Ok((true, false)),
            "up" => Ok((false, false)),
            "repeat" => Ok((true, true)),
            _ => Err(fail("expected down, up or repeat")),
        };
        let slot = |word: &str| {
            word.parse::<u32>()
                .map(SlotId)
                .map_err(|_| fail("expected a slot number"))
        };

        match words.as_slice() {
            ["quit"] => Ok(Self::Quit),
            ["stop"] => Ok(Self::Session(SessionCommand::Stop)),
            ["clear-transient"] => Ok(Self::ClearTransient),
            ["record", n] => Ok(Self::Session(SessionCommand::Record(slot(n)?))),
            ["play", n] => Ok(Self::Session(SessionCommand::Play(slot(n)?))),
            ["toggle", n] => Ok(Self::Session(SessionCommand::Toggle(slot(n)?))),
            ["key", name, s] => {
                let key = name.parse::<Key>().map_err(|_| fail("unknown key"))?;
                let (down, repeat) = state(s)?;
                Ok(Self::Key { key, down, repeat })
            }
            ["pad", name, s] => {
                let button = match *name {
                    "south" => GamepadButton::South,
                    "east" => GamepadButton::East,
                    "west" => GamepadButton::West,
                    "north" => GamepadButton::North,
                    "lb" => GamepadButton::LeftShoulder,
                    "rb" => GamepadButton::RightShoulder,
                    "start" => GamepadButton::Start,
                    "back" => GamepadButton::Back,
                    "up" => GamepadButton::DpadUp,
                    "down" => GamepadButton::DpadDown,
                    "left" => GamepadButton::DpadLeft,
                    "right" => GamepadButton::DpadRight,
                    _ => return Err(fail("unknown gamepad button")),
                };
                let (down, _) = state(s)?;
                Ok(Self::GamepadButton { button, down })
            }
            ["axis", name, v] => {
                let axis = match *name {
                    "leftx" => GamepadAxis::LeftX,
                    "lefty" => GamepadAxis::LeftY,
                    "rightx" => GamepadAxis::RightX,
                    "righty" => GamepadAxis::RightY,
                    _ => return Err(fail("unknown axis")),
                };
                let value = v.parse::<f32>().map_err(|_| fail("expected a number"))?;
                Ok(Self::GamepadAxis { axis, value })
            }
            ["mouse", x, y] => {
                let x = x.parse().map_err(|_| fail("expected an integer"))?;
                let y = y.parse().map_err(|_| fail("expected an integer"))?;
                Ok(Self::MouseMotion { x, y })
            }
            ["click", name, s] => {
                let button = match *name {
                    "left" => MouseButton::Left,
                    "middle" => MouseButton::Middle,
                    "right" => MouseButton::Right,
                    _ => return Err(fail("unknown mouse button")),
                };
                let (down, _) = state(s)?;
                Ok(Self::MouseButton { button, down })
            }
            _ => Err(fail("unrecognised event")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> InputTranslator {
        InputTranslator::new(Bindings::default(), 0.5)
    }

    fn key(key: Key, down: bool) -> PlatformEvent {
        PlatformEvent::Key {
            key,
            down,
            repeat: false,
        }
    }

    fn axis(axis: GamepadAxis, value: f32) -> PlatformEvent {
        PlatformEvent::GamepadAxis { axis, value }
    }

    #[test]
    fn keyboard_moves_and_actions() {
        let t = translator();
        let mut input = InputBuffers::new();
        input.begin_tick();
        t.apply(&key(Key::W, true), &mut input);
        t.apply(&key(Key::Right, true), &mut input);
        t.apply(&key(Key::E, true), &mut input);
        t.apply(&key(Key::E, false), &mut input);
        let f = input.current();
        assert!(f.button(ButtonId::MoveNorth).ended_down());
        assert!(f.button(ButtonId::MoveEast).ended_down());
        assert_eq!(f.button(ButtonId::ActionSouth).half_transition_count, 2);
        assert!(!f.button(ButtonId::ActionSouth).ended_down());
    }

    #[test]
    fn auto_repeat_is_filtered() {
        let t = translator();
        let mut input = InputBuffers::new();
        input.begin_tick();
        t.apply(&key(Key::A, true), &mut input);
        for _ in 0..5 {
            let repeat = PlatformEvent::Key {
                key: Key::A,
                down: true,
                repeat: true,
            };
            t.apply(&repeat, &mut input);
        }
        assert_eq!(input.current().button(ButtonId::MoveWest).half_transition_count, 1);
    }

    #[test]
    fn host_events_map_to_controls() {
        let t = translator();
        let mut input = InputBuffers::new();
        assert_eq!(t.apply(&key(Key::Escape, true), &mut input), Some(Control::Quit));
        assert_eq!(t.apply(&PlatformEvent::Quit, &mut input), Some(Control::Quit));
        assert_eq!(
            t.apply(&PlatformEvent::ClearTransient, &mut input),
            Some(Control::ClearTransient)
        );
        assert_eq!(t.apply(&key(Key::Escape, false), &mut input), None);
    }

    #[test]
    fn l_key_toggles_slot_one() {
        let t = translator();
        let mut input = InputBuffers::new();
        assert_eq!(
            t.apply(&key(Key::L, true), &mut input),
            Some(Control::Session(SessionCommand::Toggle(SlotId(1))))
        );
        assert_eq!(t.apply(&key(Key::L, false), &mut input), None);
        let repeat = PlatformEvent::Key {
            key: Key::L,
            down: true,
            repeat: true,
        };
        assert_eq!(t.apply(&repeat, &mut input), None);
    }

    #[test]
    fn stick_axes_set_independently() {
        let t = translator();
        let mut input = InputBuffers::new();
        input.begin_tick();
        t.apply(&axis(GamepadAxis::LeftX, 0.8), &mut input);
        t.apply(&axis(GamepadAxis::LeftY, -0.2), &mut input);
        let f = input.current();
        assert_eq!(f.left_stick_x, 0.8);
        assert_eq!(f.left_stick_y, -0.2);
        assert!(f.is_analog());
        assert!(f.button(ButtonId::MoveEast).ended_down());
        assert!(!f.button(ButtonId::MoveWest).ended_down());
        assert!(!f.button(ButtonId::MoveNorth).ended_down());
    }

    #[test]
    fn stick_events_compare_against_previous_frame() {
        let t = translator();
        let mut input = InputBuffers::new();
        input.begin_tick();
        t.apply(&axis(GamepadAxis::LeftY, 0.6), &mut input);
        t.apply(&axis(GamepadAxis::LeftY, 0.9), &mut input);
        t.apply(&axis(GamepadAxis::LeftX, 0.1), &mut input);
        // Each event above the threshold differs from the previous frame's
        // released state, so both count.
        let f = input.current();
        assert_eq!(f.button(ButtonId::MoveSouth).half_transition_count, 2);
        assert!(f.button(ButtonId::MoveSouth).ended_down());
        assert_eq!(f.button(ButtonId::MoveWest).half_transition_count, 0);

        input.swap();
        input.begin_tick();
        t.apply(&axis(GamepadAxis::LeftY, 0.7), &mut input);
        assert_eq!(
            input.current().button(ButtonId::MoveSouth).half_transition_count,
            0
        );
    }

    #[test]
    fn dpad_clears_analog_flag() {
        let t = translator();
        let mut input = InputBuffers::new();
        input.begin_tick();
        t.apply(&axis(GamepadAxis::LeftX, 1.0), &mut input);
        t.apply(
            &PlatformEvent::GamepadButton {
                button: GamepadButton::DpadUp,
                down: true,
            },
            &mut input,
        );
        let f = input.current();
        assert!(!f.is_analog());
        assert!(f.button(ButtonId::MoveNorth).ended_down());
    }

    #[test]
    fn right_stick_is_ignored() {
        let t = translator();
        let mut input = InputBuffers::new();
        input.begin_tick();
        t.apply(&axis(GamepadAxis::RightX, 1.0), &mut input);
        assert!(!input.current().is_analog());
        assert_eq!(input.current().left_stick_x, 0.0);
    }

    #[test]
    fn mouse_events() {
        let t = translator();
        let mut input = InputBuffers::new();
        input.begin_tick();
        t.apply(&PlatformEvent::MouseMotion { x: 12, y: 34 }, &mut input);
        t.apply(
            &PlatformEvent::MouseButton {
                button: MouseButton::Right,
                down: true,
            },
            &mut input,
        );
        let f = input.current();
        assert_eq!((f.mouse_x, f.mouse_y), (12, 34));
        assert!(f.button(ButtonId::MouseRight).ended_down());
    }

    #[test]
    fn parses_text_events() {
        assert_eq!("quit".parse::<PlatformEvent>(), Ok(PlatformEvent::Quit));
        assert_eq!(
            "key lshift down".parse::<PlatformEvent>(),
            Ok(PlatformEvent::Key {
                key: Key::LShift,
                down: true,
                repeat: false
            })
        );
        assert_eq!(
            "axis leftx -0.75".parse::<PlatformEvent>(),
            Ok(PlatformEvent::GamepadAxis {
                axis: GamepadAxis::LeftX,
                value: -0.75
            })
        );
        assert_eq!(
            "toggle 2".parse::<PlatformEvent>(),
            Ok(PlatformEvent::Session(SessionCommand::Toggle(SlotId(2))))
        );
        assert_eq!(
            "mouse 5 -3".parse::<PlatformEvent>(),
            Ok(PlatformEvent::MouseMotion { x: 5, y: -3 })
        );
        assert_eq!(
            "clear-transient".parse::<PlatformEvent>(),
            Ok(PlatformEvent::ClearTransient)
        );
        assert!("key nope down".parse::<PlatformEvent>().is_err());
        assert!("record x".parse::<PlatformEvent>().is_err());
        assert!("".parse::<PlatformEvent>().is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stick_transitions_count_changes_from_previous_frame(
                previous in -1.0f32..=1.0,
                values in prop::collection::vec(-1.0f32..=1.0, 1..16),
            ) {
                let t = translator();
                let mut input = InputBuffers::new();
                input.begin_tick();
                t.apply(&axis(GamepadAxis::LeftY, previous), &mut input);
                input.swap();
                input.begin_tick();
                for &v in &values {
                    t.apply(&axis(GamepadAxis::LeftY, v), &mut input);
                }

                let was_south = previous > 0.5;
                let was_north = previous < -0.5;
                let south = values.iter().filter(|&&v| (v > 0.5) != was_south).count() as i32;
                let north = values.iter().filter(|&&v| (v < -0.5) != was_north).count() as i32;
                let last = values[values.len() - 1];

                let frame = input.current();
                prop_assert_eq!(frame.button(ButtonId::MoveSouth).half_transition_count, south);
                prop_assert_eq!(frame.button(ButtonId::MoveNorth).half_transition_count, north);
                prop_assert_eq!(frame.button(ButtonId::MoveSouth).ended_down(), last > 0.5);
                prop_assert_eq!(frame.button(ButtonId::MoveNorth).ended_down(), last < -0.5);
                prop_assert_eq!(frame.left_stick_y, last);
                prop_assert!(frame.is_analog());
            }
        }
    }
}
