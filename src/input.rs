//! Button channels and raw transition tracking.
//!
//! Every physical button is sampled once per tick. [`ButtonTracker`]
//! debounces the level and produces the raw transition flags
//! ([`RawButtonFlags`]) that the classifier turns into events.
//!
//! | Flag       | Raised when                                                    |
//! |------------|----------------------------------------------------------------|
//! | `pressed`  | debounced released → pressed edge                              |
//! | `hold`     | a press reaches [`HOLD_MS`] (once per press)                   |
//! | `released` | debounced pressed → released edge                              |
//! | `clicked`  | release of a press that never became a hold                    |
//! | `decided`  | released and idle for more than [`HOLD_MS`] after a click      |

use crate::config::{
    DEBOUNCE_MS,
    HOLD_MS,
};

/// The fixed set of buttons the feedback engine listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ButtonChannel {
    Power = 0,
    A = 1,
    B = 2,
    C = 3,
    External = 4,
}

impl ButtonChannel {
    pub const COUNT: usize = 5;

    /// All channels in processing order.
    pub const ALL: [Self; Self::COUNT] = [Self::Power, Self::A, Self::B, Self::C, Self::External];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Power => "BtnPWR",
            Self::A => "BtnA",
            Self::B => "BtnB",
            Self::C => "BtnC",
            Self::External => "BtnEXT",
        }
    }

    /// Feedback tone, one note of the G5/C5..F5 scale per button.
    pub const fn tone_hz(self) -> u16 {
        match self {
            Self::Power => 784, // G5
            Self::A => 523,     // C5
            Self::B => 587,     // D5
            Self::C => 659,     // E5
            Self::External => 698, // F5
        }
    }

    /// Screen band holding this button's counter cell.
    pub const fn row(self) -> u32 {
        2 + self as u32
    }
}

impl core::fmt::Display for ButtonChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Transition flags for one button and one tick.
///
/// Several flags can be raised at once (a click is also a release).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawButtonFlags {
    pub hold: bool,
    pub clicked: bool,
    pub pressed: bool,
    pub released: bool,
    pub decided: bool,
    pub click_count: u16,
}

impl RawButtonFlags {
    /// True when no transition happened this tick.
    pub const fn is_idle(&self) -> bool {
        !(self.hold || self.clicked || self.pressed || self.released || self.decided)
    }
}

/// Debounce and click-counting state for one button.
#[derive(Debug, Clone)]
pub struct ButtonTracker {
    raw: bool,
    raw_since: u32,
    pressed: bool,
    pressed_since: u32,
    holding: bool,
    click_count: u16,
    last_click: u32,
    decided: bool,
}

impl ButtonTracker {
    pub const fn new() -> Self {
        Self {
            raw: false,
            raw_since: 0,
            pressed: false,
            pressed_since: 0,
            holding: false,
            click_count: 0,
            last_click: 0,
            decided: false,
        }
    }

    /// Debounced level as of the last update.
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed the current physical level and return this tick's transitions.
    ///
    /// `now_ms` is a wrapping millisecond timestamp.
    pub fn update(&mut self, now_ms: u32, pressed: bool) -> RawButtonFlags {
        // The decided count is reported for exactly one update.
        if self.decided {
            self.decided = false;
            self.click_count = 0;
        }

        if pressed != self.raw {
            self.raw = pressed;
            self.raw_since = now_ms;
        }

        let mut flags = RawButtonFlags::default();
        let settled = now_ms.wrapping_sub(self.raw_since) >= DEBOUNCE_MS;

        if settled && self.raw != self.pressed {
            self.pressed = self.raw;
            if self.pressed {
                self.pressed_since = now_ms;
                self.holding = false;
                flags.pressed = true;
            } else {
                flags.released = true;
                if !self.holding {
                    self.click_count = self.click_count.saturating_add(1);
                    self.last_click = now_ms;
                    flags.clicked = true;
                }
                self.holding = false;
            }
        } else if self.pressed {
            if !self.holding && now_ms.wrapping_sub(self.pressed_since) >= HOLD_MS {
                self.holding = true;
                self.click_count = 0;
                flags.hold = true;
            }
        } else if self.raw == self.pressed
            && self.click_count > 0
            && now_ms.wrapping_sub(self.last_click) > HOLD_MS
        {
            self.decided = true;
            flags.decided = true;
        }

        flags.click_count = self.click_count;
        flags
    }
}

impl Default for ButtonTracker {
    fn default() -> Self {
        Self::new()
    }
}
