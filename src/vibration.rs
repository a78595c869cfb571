//! Vibration motor, used as the badge's tone output.
//!
//! There is no speaker on the badge, so a tone becomes a motor pulse of the
//! same length. The frequency only shows up in the log.

use embassy_time::{
    Duration,
    Instant,
};
use esp_hal::gpio::{
    Level,
    Output,
    OutputConfig,
};

use crate::{
    VibrationResources,
    traits::ToneOutput,
};

/// Controls the onboard vibration motor.
pub struct Vibration {
    pin: Output<'static>,
    until: Option<Instant>,
}

impl From<VibrationResources<'static>> for Vibration {
    fn from(res: VibrationResources<'static>) -> Self {
        Self {
            pin: Output::new(res.motor, Level::Low, OutputConfig::default()),
            until: None,
        }
    }
}

impl Vibration {
    pub fn on(&mut self) {
        self.pin.set_high();
    }

    pub fn off(&mut self) {
        self.pin.set_low();
    }
}

impl ToneOutput for Vibration {
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32) {
        debug!("tone {} Hz for {} ms", frequency_hz, duration_ms);
        self.on();
        self.until = Some(Instant::now() + Duration::from_millis(u64::from(duration_ms)));
    }

    /// Also stops the motor once the pulse has run its course, so polling
    /// this is what ends a non-blocking tone.
    fn is_playing(&mut self) -> bool {
        match self.until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                self.off();
                self.until = None;
                false
            }
            None => false,
        }
    }
}
