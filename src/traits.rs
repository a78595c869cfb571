//! Collaborator interfaces.
//!
//! The feedback engine never talks to hardware directly. The badge (or a
//! test fake) provides these, plus a [`Surface`](crate::surface::Surface)
//! for drawing.

use palette::Srgb;

use crate::clock::DateTime;

/// Global indicator light (the LED strip on the badge).
#[allow(async_fn_in_trait)]
pub trait Indicator {
    /// Show `color` on every indicator LED.
    async fn set_color(&mut self, color: Srgb<u8>);
}

/// Something that can play a tone for a bounded duration.
pub trait ToneOutput {
    /// Start a tone. Returns immediately; a tone already playing is replaced.
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32);

    /// Whether the last tone is still sounding.
    fn is_playing(&mut self) -> bool;
}

/// Start a tone and, if `blocking`, spin until it has finished.
///
/// The wait has no timeout and yields to the executor between polls.
/// Returns the number of polls spent waiting.
pub async fn request_tone<T: ToneOutput>(
    tone: &mut T,
    frequency_hz: u16,
    duration_ms: u32,
    blocking: bool,
) -> u32 {
    tone.play_tone(frequency_hz, duration_ms);

    let mut polls = 0u32;
    if blocking {
        while tone.is_playing() {
            polls = polls.saturating_add(1);
            embassy_futures::yield_now().await;
        }
    }
    polls
}

/// Raw sensor acquisition.
///
/// A sensor that is not fitted reports itself unavailable; that is a steady
/// state, not an error.
pub trait Sensors {
    /// Battery charge in percent, `None` if there is no gauge.
    fn battery_percent(&mut self) -> Option<u8>;

    /// Whether any wall clock (RTC or system time) is available.
    fn clock_available(&self) -> bool;

    /// Read the real-time clock. `None` when there is no RTC or the read
    /// failed; callers fall back to [`system_time`](Self::system_time).
    fn read_clock(&mut self) -> Option<DateTime>;

    /// System wall clock in Unix seconds, derived from time since boot.
    fn system_time(&self) -> u64;

    fn imu_available(&self) -> bool;

    /// Acceleration in g, X/Y/Z.
    fn read_accel(&mut self) -> [f32; 3];

    /// Angular rate in degrees per second, X/Y/Z.
    fn read_gyro(&mut self) -> [f32; 3];
}

/// Identity strings reported by hardware bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardInfo {
    pub board: &'static str,
    pub imu: &'static str,
}
