//! Console input
//!
//! The runtime never talks to a platform directly. Hosts inject an
//! [`InputSource`] that reports which console buttons are held, and the engine
//! snapshots it once per frame into an [`InputState`] so that scripts can ask
//! for press and release edges.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use rustc_hash::FxHashSet;

/// Buttons of the virtual console pad.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InputButton {
    // D-pad
    Up,
    Down,
    Left,
    Right,

    // Face buttons
    A,
    B,
    X,
    Y,

    // Shoulders and stick clicks
    L1,
    L2,
    L3,
    R1,
    R2,
    R3,

    Start,
    Select,
}

impl InputButton {
    pub const ALL: [InputButton; 16] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::A,
        Self::B,
        Self::X,
        Self::Y,
        Self::L1,
        Self::L2,
        Self::L3,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::Start,
        Self::Select,
    ];
}

impl fmt::Display for InputButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error for button names that are not part of the pad.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown input button '{0}'")]
pub struct UnknownButton(pub String);

impl FromStr for InputButton {
    type Err = UnknownButton;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|button| button.to_string().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownButton(name.to_string()))
    }
}

/// Injected capability reporting the raw state of the pad.
pub trait InputSource {
    fn is_button_down(&self, button: InputButton) -> bool;
}

/// A pad with nothing held, for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputSource for NoInput {
    fn is_button_down(&self, _button: InputButton) -> bool {
        false
    }
}

impl InputSource for FxHashSet<InputButton> {
    fn is_button_down(&self, button: InputButton) -> bool {
        self.contains(&button)
    }
}

/// Two-frame snapshot of the pad.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    current: FxHashSet<InputButton>,
    previous: FxHashSet<InputButton>,
}

/// Input state shared between the engine and script handles.
pub type SharedInput = Rc<RefCell<InputState>>;

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances one frame: the current snapshot becomes the previous one and
    /// the source is sampled again.
    pub fn poll(&mut self, source: &dyn InputSource) {
        self.previous = std::mem::take(&mut self.current);
        self.current = InputButton::ALL
            .into_iter()
            .filter(|&button| source.is_button_down(button))
            .collect();
    }

    /// Held this frame.
    #[must_use]
    pub fn is_pressed(&self, button: InputButton) -> bool {
        self.current.contains(&button)
    }

    /// Went down this frame.
    #[must_use]
    pub fn was_pressed(&self, button: InputButton) -> bool {
        self.current.contains(&button) && !self.previous.contains(&button)
    }

    /// Came up this frame.
    #[must_use]
    pub fn was_released(&self, button: InputButton) -> bool {
        !self.current.contains(&button) && self.previous.contains(&button)
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.previous.clear();
    }
}
