//! Compile-time configuration.
//!
//! Everything the badge does is fixed at build time. Two values can be
//! overridden from the environment when building:
//!
//! ```sh
//! AMBIO_BOARD="Disobey 2026" AMBIO_EPOCH=1767225600 cargo run --release --example telemetry --features firmware
//! ```

use embedded_graphics::pixelcolor::{
    Rgb565,
    RgbColor,
};

// ── Timing ──────────────────────────────────────────────────────────────────

/// Main loop period.
pub const TICK_MS: u64 = 10;

/// A raw level change must be stable this long before it is accepted.
pub const DEBOUNCE_MS: u32 = 10;

/// Press duration that turns a press into a hold. Also the idle time after
/// the last click before the click count is decided.
pub const HOLD_MS: u32 = 500;

/// Backlight switches off after this long without a button event.
pub const SCREEN_IDLE_TIMEOUT_MS: u32 = 60_000;

// ── Feedback ────────────────────────────────────────────────────────────────

/// Length of the feedback tone played for every button event.
pub const BUTTON_TONE_DURATION_MS: u32 = 100;

/// Blocking tones played once at startup: `(frequency_hz, duration_ms)`.
pub const STARTUP_TONES: [(u16, u32); 2] = [(2000, 100), (1000, 100)];

/// Indicator LED brightness (0-255) applied to the event colors.
pub const LED_BRIGHTNESS: u8 = 64;

// ── Telemetry scaling ───────────────────────────────────────────────────────

/// Accelerometer pixels per g: ±2 g spans roughly ±100 px.
pub const ACCEL_GAIN: f32 = 50.0;

/// Gyro degrees per second per pixel.
pub const GYRO_DIVISOR: f32 = 2.0;

// ── Layout ──────────────────────────────────────────────────────────────────

/// The screen is split into this many horizontal bands. Band 0 is the header,
/// bands 2..8 hold the button cells and the IMU bars.
pub const SCREEN_BANDS: u32 = 8;

/// Foreground color for telemetry text.
pub const TEXT_COLOR: Rgb565 = Rgb565::WHITE;

/// Color of the click counter drawn on top of a button cell.
pub const COUNTER_TEXT_COLOR: Rgb565 = Rgb565::BLACK;

/// Screen background, also used to erase.
pub const BACKGROUND: Rgb565 = Rgb565::BLACK;

// ── Build-time identity ─────────────────────────────────────────────────────

const BOARD_ENV: Option<&str> = option_env!("AMBIO_BOARD");
const EPOCH_ENV: Option<&str> = option_env!("AMBIO_EPOCH");

/// Board name shown on the startup screen.
pub const BOARD_NAME: &str = match BOARD_ENV {
    Some(name) => name,
    None => "Disobey2026",
};

/// Wall-clock time (Unix seconds) at boot, used when there is no RTC.
pub const BOOT_EPOCH_SECS: u64 = match EPOCH_ENV {
    Some(s) => match parse_u64(s) {
        Some(secs) => secs,
        None => panic!("AMBIO_EPOCH must be a decimal number of Unix seconds"),
    },
    None => 0,
};

/// Const decimal parser for build-time environment values.
const fn parse_u64(s: &str) -> Option<u64> {
    let b = s.as_bytes();
    if b.is_empty() {
        return None;
    }
    let mut value: u64 = 0;
    let mut i = 0;
    while i < b.len() {
        let digit = match b[i] {
            c @ b'0'..=b'9' => (c - b'0') as u64,
            _ => return None,
        };
        value = match value.checked_mul(10) {
            Some(v) => match v.checked_add(digit) {
                Some(v) => v,
                None => return None,
            },
            None => return None,
        };
        i += 1;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epoch_digits() {
        assert_eq!(parse_u64("0"), Some(0));
        assert_eq!(parse_u64("1767225600"), Some(1_767_225_600));
    }

    #[test]
    fn rejects_bad_epoch() {
        assert_eq!(parse_u64(""), None);
        assert_eq!(parse_u64("12a"), None);
        assert_eq!(parse_u64("-5"), None);
        assert_eq!(parse_u64("99999999999999999999999"), None);
    }
}
