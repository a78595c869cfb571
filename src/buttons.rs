//! Badge buttons mapped onto the feedback channels.
//!
//! | Channel    | Badge button   | Level       |
//! |------------|----------------|-------------|
//! | `Power`    | Start          | active low  |
//! | `A`        | A              | active low  |
//! | `B`        | B              | active low  |
//! | `C`        | Select         | active high |
//! | `External` | joystick click | active low  |

use esp_hal::gpio::{
    Input,
    InputConfig,
    Pull,
};

use crate::{
    ButtonResources,
    input::{
        ButtonChannel,
        ButtonTracker,
        RawButtonFlags,
    },
};

/// The five badge buttons the feedback engine listens to.
pub struct Buttons {
    pub start: Input<'static>,
    pub a: Input<'static>,
    pub b: Input<'static>,
    pub select: Input<'static>,
    pub stick: Input<'static>,
}

impl From<ButtonResources<'static>> for Buttons {
    fn from(res: ButtonResources<'static>) -> Self {
        let pull_up = InputConfig::default().with_pull(Pull::Up);
        Self {
            start: Input::new(res.start, pull_up),
            a: Input::new(res.a, pull_up),
            b: Input::new(res.b, pull_up),
            select: Input::new(res.select, InputConfig::default().with_pull(Pull::Down)),
            stick: Input::new(res.stick, pull_up),
        }
    }
}

impl Buttons {
    /// Current pressed state of every channel, in [`ButtonChannel::ALL`] order.
    pub fn levels(&self) -> [bool; ButtonChannel::COUNT] {
        [
            self.start.is_low(),
            self.a.is_low(),
            self.b.is_low(),
            self.select.is_high(),
            self.stick.is_low(),
        ]
    }
}

/// Buttons plus one tracker per channel.
pub struct ButtonPad {
    buttons: Buttons,
    trackers: [ButtonTracker; ButtonChannel::COUNT],
}

impl From<ButtonResources<'static>> for ButtonPad {
    fn from(res: ButtonResources<'static>) -> Self {
        Self::new(res.into())
    }
}

impl ButtonPad {
    pub const fn new(buttons: Buttons) -> Self {
        Self {
            buttons,
            trackers: [const { ButtonTracker::new() }; ButtonChannel::COUNT],
        }
    }

    /// Sample every button once and return this tick's transitions.
    pub fn poll(&mut self, now_ms: u32) -> [RawButtonFlags; ButtonChannel::COUNT] {
        let levels = self.buttons.levels();
        core::array::from_fn(|i| self.trackers[i].update(now_ms, levels[i]))
    }
}
