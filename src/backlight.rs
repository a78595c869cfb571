//! Display backlight control.

use esp_hal::gpio::{
    Level,
    Output,
    OutputConfig,
};

use crate::BacklightResources;

/// Controls the display backlight LED.
pub struct Backlight {
    pin: Output<'static>,
}

impl From<BacklightResources<'static>> for Backlight {
    fn from(res: BacklightResources<'static>) -> Self {
        // Lit at boot, matching the initial screen power state.
        Self {
            pin: Output::new(res.led, Level::High, OutputConfig::default()),
        }
    }
}

impl Backlight {
    pub fn set(&mut self, on: bool) {
        self.pin.set_level(if on { Level::High } else { Level::Low });
    }
}
