//! Edge-triggered input frames and the double-buffered frame model.
//!
//! An [`InputFrame`] describes everything the simulation module may know
//! about player input for one tick. Digital buttons record both their final
//! state (`ended_down`) and how many times they changed state during the tick
//! (`half_transition_count`), so a press-and-release inside a single tick is
//! never lost.
//!
//! # Per-tick protocol
//!
//! ```text
//! begin_tick(previous)           carry ended_down / axes / mouse forward,
//!                                zero every half_transition_count
//! apply_digital_event(...)  x N  one call per discrete device event
//! apply_analog_event(...)   x M  axis-derived buttons, edge-detected
//!                                against the previous frame
//! ```
//!
//! Recorded input streams are replayed bit-for-bit, so the exact counting
//! rules below are part of the recording format.

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Number of digital buttons in an [`InputFrame`].
pub const BUTTON_COUNT: usize = 15;

/// Size in bytes of one [`InputFrame`] record.
pub const FRAME_SIZE: usize = std::mem::size_of::<InputFrame>();

const _: () = assert!(FRAME_SIZE == 144);

/// Named digital buttons, in frame order.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ButtonId {
    /// Up on the d-pad / left stick, or W / arrow up.
    MoveNorth = 0,
    /// Down on the d-pad / left stick, or S / arrow down.
    MoveSouth = 1,
    /// Left on the d-pad / left stick, or A / arrow left.
    MoveWest = 2,
    /// Right on the d-pad / left stick, or D / arrow right.
    MoveEast = 3,
    /// Top face button.
    ActionNorth = 4,
    /// Bottom face button.
    ActionSouth = 5,
    /// Left face button.
    ActionWest = 6,
    /// Right face button.
    ActionEast = 7,
    /// Left shoulder.
    LeftShoulder = 8,
    /// Right shoulder.
    RightShoulder = 9,
    /// Start.
    Start = 10,
    /// Select / back.
    Select = 11,
    /// Primary mouse button.
    MouseLeft = 12,
    /// Middle mouse button.
    MouseMiddle = 13,
    /// Secondary mouse button.
    MouseRight = 14,
}

impl ButtonId {
    /// Every button, in frame order.
    pub const ALL: [ButtonId; BUTTON_COUNT] = [
        ButtonId::MoveNorth,
        ButtonId::MoveSouth,
        ButtonId::MoveWest,
        ButtonId::MoveEast,
        ButtonId::ActionNorth,
        ButtonId::ActionSouth,
        ButtonId::ActionWest,
        ButtonId::ActionEast,
        ButtonId::LeftShoulder,
        ButtonId::RightShoulder,
        ButtonId::Start,
        ButtonId::Select,
        ButtonId::MouseLeft,
        ButtonId::MouseMiddle,
        ButtonId::MouseRight,
    ];

    /// Index of this button within [`InputFrame::buttons`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name, used in logs and key-binding tables.
    pub fn name(self) -> &'static str {
        match self {
            Self::MoveNorth => "move_north",
            Self::MoveSouth => "move_south",
            Self::MoveWest => "move_west",
            Self::MoveEast => "move_east",
            Self::ActionNorth => "action_north",
            Self::ActionSouth => "action_south",
            Self::ActionWest => "action_west",
            Self::ActionEast => "action_east",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::Start => "start",
            Self::Select => "select",
            Self::MouseLeft => "mouse_left",
            Self::MouseMiddle => "mouse_middle",
            Self::MouseRight => "mouse_right",
        }
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of one digital button within a frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ButtonState {
    /// Number of up/down transitions observed during the tick.
    pub half_transition_count: i32,
    ended_down: u8,
    _pad: [u8; 3],
}

impl ButtonState {
    /// Build a button state directly.
    pub fn new(ended_down: bool, half_transition_count: i32) -> Self {
        Self {
            half_transition_count,
            ended_down: ended_down as u8,
            _pad: [0; 3],
        }
    }

    /// Whether the button was held at the end of the tick.
    pub fn ended_down(&self) -> bool {
        self.ended_down != 0
    }

    /// Set the end-of-tick held state.
    pub fn set_ended_down(&mut self, down: bool) {
        self.ended_down = down as u8;
    }

    /// True if the button went down at least once during the tick.
    ///
    /// A press-and-release inside one tick counts, as does a press that is
    /// still held.
    pub fn was_pressed(&self) -> bool {
        self.half_transition_count > 1 || (self.half_transition_count == 1 && self.ended_down())
    }
}

/// One tick of player input.
///
/// `#[repr(C)]` and [`Pod`]: the in-memory bytes of this struct are its
/// recording format, and modules receive a pointer to it unchanged.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InputFrame {
    /// Digital buttons, indexed by [`ButtonId::index`].
    pub buttons: [ButtonState; BUTTON_COUNT],
    /// Left stick X in `[-1, 1]`, deadzone already applied.
    pub left_stick_x: f32,
    /// Left stick Y in `[-1, 1]`, deadzone already applied.
    pub left_stick_y: f32,
    /// Mouse X in surface pixels.
    pub mouse_x: i32,
    /// Mouse Y in surface pixels.
    pub mouse_y: i32,
    /// Seconds the simulation should advance for this frame.
    pub delta_seconds: f32,
    is_analog: u32,
}

impl Default for InputFrame {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl InputFrame {
    /// Borrow a button's state.
    pub fn button(&self, id: ButtonId) -> &ButtonState {
        &self.buttons[id.index()]
    }

    /// Mutably borrow a button's state.
    pub fn button_mut(&mut self, id: ButtonId) -> &mut ButtonState {
        &mut self.buttons[id.index()]
    }

    /// Whether the last movement input came from an analog stick.
    pub fn is_analog(&self) -> bool {
        self.is_analog != 0
    }

    /// Mark the frame's movement input as analog or digital.
    pub fn set_analog(&mut self, analog: bool) {
        self.is_analog = analog as u32;
    }

    /// Raw bytes of this frame, as stored in a recording.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Reinterpret a recorded byte record as a frame.
    ///
    /// Returns `None` unless `bytes` is exactly [`FRAME_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }
}

/// Start a new frame from the previous one.
///
/// Carries forward every button's `ended_down`, the stick axes, the analog
/// flag and the mouse position, and zeroes every `half_transition_count`.
/// `delta_seconds` is left at zero for the scheduler to fill.
pub fn begin_tick(previous: &InputFrame) -> InputFrame {
    let mut next = InputFrame::default();
    for (new_state, old_state) in next.buttons.iter_mut().zip(previous.buttons.iter()) {
        new_state.set_ended_down(old_state.ended_down());
    }
    next.left_stick_x = previous.left_stick_x;
    next.left_stick_y = previous.left_stick_y;
    next.mouse_x = previous.mouse_x;
    next.mouse_y = previous.mouse_y;
    next.is_analog = previous.is_analog;
    next
}

/// Apply one discrete device event to a button.
///
/// Every call is a transition: discrete events are edge-triggered, and
/// keyboard auto-repeat must be filtered before it gets here.
pub fn apply_digital_event(frame: &mut InputFrame, button: ButtonId, is_down: bool) {
    let state = frame.button_mut(button);
    state.set_ended_down(is_down);
    state.half_transition_count = state.half_transition_count.saturating_add(1);
}

/// Apply an axis-derived button state.
///
/// Counts a transition only when `is_down` differs from the same button's
/// `ended_down` in `old`. Equal state never counts.
pub fn apply_analog_event(old: &InputFrame, new: &mut InputFrame, button: ButtonId, is_down: bool) {
    let previous = old.button(button).ended_down();
    let state = new.button_mut(button);
    state.set_ended_down(is_down);
    if is_down != previous {
        state.half_transition_count = state.half_transition_count.saturating_add(1);
    }
}

/// The two input frames, with rotating "current" and "previous" roles.
///
/// [`swap`](InputBuffers::swap) exchanges the roles without copying.
#[derive(Clone, Debug, Default)]
pub struct InputBuffers {
    frames: [InputFrame; 2],
    current: usize,
}

impl InputBuffers {
    /// Two zeroed frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reinitialise the current frame from the previous one.
    pub fn begin_tick(&mut self) {
        let next = begin_tick(self.previous());
        self.frames[self.current] = next;
    }

    /// The frame being built this tick.
    pub fn current(&self) -> &InputFrame {
        &self.frames[self.current]
    }

    /// Mutable access to the frame being built this tick.
    pub fn current_mut(&mut self) -> &mut InputFrame {
        &mut self.frames[self.current]
    }

    /// The frame handed to the module on the previous tick.
    pub fn previous(&self) -> &InputFrame {
        &self.frames[1 - self.current]
    }

    /// Borrow `(previous, current)` at once, for [`apply_analog_event`].
    pub fn split_mut(&mut self) -> (&InputFrame, &mut InputFrame) {
        let [a, b] = &mut self.frames;
        if self.current == 0 {
            (&*b, a)
        } else {
            (&*a, b)
        }
    }

    /// Overwrite the current frame (playback).
    pub fn replace_current(&mut self, frame: InputFrame) {
        self.frames[self.current] = frame;
    }

    /// Rotate roles: the current frame becomes the previous one.
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    /// Zero both frames, releasing any held buttons.
    pub fn clear(&mut self) {
        self.frames = [InputFrame::default(); 2];
    }
}
