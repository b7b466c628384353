use serde::Serialize;

use crate::line::LineState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ButtonEvent {
    #[serde(rename = "BTN_PRESS")]
    Press,
    #[serde(rename = "BTN_RELEASE")]
    Release,
}

/// Edge detector for a push-button on a pulled-up line (LOW = pressed).
///
/// Bounces shorter than the poll interval are never seen as a change,
/// and the pressed/released flags make sure each press is followed by
/// exactly one release before the next press is reported.
///
/// The first read seeds the previous level, so a button held down at
/// startup does not report a press until it has been let go.
pub struct Button {
    sw_prev: LineState,
    pressed: bool,
    released: bool,
}

impl Button {
    pub fn new(sw: LineState) -> Self {
        Self {
            sw_prev: sw,
            pressed: false,
            released: false,
        }
    }

    pub fn update(&mut self, sw: LineState) -> Option<ButtonEvent> {
        if sw == self.sw_prev {
            return None;
        }
        self.sw_prev = sw;

        match sw {
            LineState::Low if !self.pressed => {
                self.pressed = true;
                self.released = false;
                Some(ButtonEvent::Press)
            }
            LineState::High if self.pressed && !self.released => {
                self.pressed = false;
                self.released = true;
                Some(ButtonEvent::Release)
            }
            _ => None,
        }
    }
}
