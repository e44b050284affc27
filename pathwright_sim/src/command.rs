// Per-tick movement output.
//
// A navigator's only effect on the world is the `MoveCommand` it returns
// from each tick: forward and side movement, an optional view override, and
// a small set of held buttons. The host applies it to the agent however its
// movement model works (the harness integrates it onto a point body).
//
// Forward and side are in host movement units, positive forward and
// positive to the right, each clamped to `±max_move` by the controller.
// `view` is `None` when the navigator is not steering the camera this tick,
// in which case the host keeps the agent's own aim.
//
// See also: `locomotion.rs` which builds commands, `navigator.rs` which
// returns them.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Held-button bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buttons(pub u8);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    pub const JUMP: Buttons = Buttons(1 << 0);
    pub const DUCK: Buttons = Buttons(1 << 1);
    /// Host-defined auxiliary action; never set by the navigator itself.
    pub const UTILITY: Buttons = Buttons(1 << 2);

    pub fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    fn bitor_assign(&mut self, rhs: Buttons) {
        self.0 |= rhs.0;
    }
}

/// Commanded view direction, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewAngles {
    pub pitch: f32,
    pub yaw: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    pub forward: f32,
    pub side: f32,
    pub view: Option<ViewAngles>,
    pub buttons: Buttons,
}

impl MoveCommand {
    /// No movement, no view override, no buttons.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.side == 0.0 && self.view.is_none() && self.buttons.is_empty()
    }
}
