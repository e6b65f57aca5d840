//! # Scripted Keypad
//!
//! Edge-triggered input replayed from a script. A button reads as pressed
//! only during the tick its press is scheduled for.
//!
//! Processors poll the keypad from inside `update`, so it is shared through
//! an `Rc` and advanced by the run loop between ticks.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The buttons of a handheld keypad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// D-pad up.
    Up,
    /// D-pad down.
    Down,
    /// D-pad left.
    Left,
    /// D-pad right.
    Right,
    /// Face button A.
    A,
    /// Face button B.
    B,
    /// Left shoulder.
    L,
    /// Right shoulder.
    R,
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::A => "a",
            Self::B => "b",
            Self::L => "l",
            Self::R => "r",
        };
        f.write_str(name)
    }
}

/// One scheduled press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedPress {
    /// Tick during which the button reads as pressed.
    pub tick: u32,
    /// The button.
    pub button: Button,
}

/// Input source replaying a press script.
#[derive(Debug, Default)]
pub struct Keypad {
    presses: Vec<ScriptedPress>,
    tick: Cell<u32>,
}

impl Keypad {
    /// Creates a keypad at tick 0.
    #[must_use]
    pub fn new(mut presses: Vec<ScriptedPress>) -> Self {
        presses.sort_by_key(|press| press.tick);
        Self {
            presses,
            tick: Cell::new(0),
        }
    }

    /// The current tick.
    #[inline]
    #[must_use]
    pub fn tick(&self) -> u32 {
        self.tick.get()
    }

    /// Moves to the next tick.
    pub fn advance(&self) {
        self.tick.set(self.tick.get() + 1);
    }

    /// Checks if `button` went down this tick.
    #[must_use]
    pub fn pressed(&self, button: Button) -> bool {
        let tick = self.tick.get();
        let start = self.presses.partition_point(|press| press.tick < tick);
        self.presses[start..]
            .iter()
            .take_while(|press| press.tick == tick)
            .any(|press| press.button == button)
    }
}
