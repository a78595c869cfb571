//! Backlight idle policy.

use crate::config::SCREEN_IDLE_TIMEOUT_MS;

/// Whether the screen should be lit after `idle_ms` without a button event.
pub const fn screen_should_be_on(idle_ms: u32, timeout_ms: u32) -> bool {
    idle_ms < timeout_ms
}

/// Tracks button activity and decides when the backlight changes.
#[derive(Debug, Clone)]
pub struct ScreenPower {
    last_activity: u32,
    on: bool,
    timeout_ms: u32,
}

impl ScreenPower {
    /// Screen starts lit, as the badge powers the backlight on at boot.
    pub const fn new(now_ms: u32) -> Self {
        Self::with_timeout(now_ms, SCREEN_IDLE_TIMEOUT_MS)
    }

    pub const fn with_timeout(now_ms: u32, timeout_ms: u32) -> Self {
        Self {
            last_activity: now_ms,
            on: true,
            timeout_ms,
        }
    }

    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Feed one tick. Returns the new backlight state when it changes.
    pub fn update(&mut self, now_ms: u32, activity: bool) -> Option<bool> {
        if activity {
            self.last_activity = now_ms;
        }
        let on = screen_should_be_on(now_ms.wrapping_sub(self.last_activity), self.timeout_ms);
        if on == self.on {
            return None;
        }

        self.on = on;
        info!("backlight {}", if on { "on" } else { "off" });
        Some(on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy() {
        assert!(screen_should_be_on(0, 1000));
        assert!(screen_should_be_on(999, 1000));
        assert!(!screen_should_be_on(1000, 1000));
    }

    #[test]
    fn turns_off_after_timeout_and_wakes_on_event() {
        let mut p = ScreenPower::with_timeout(0, 1000);
        assert_eq!(p.update(500, false), None);
        assert_eq!(p.update(999, false), None);
        assert_eq!(p.update(1000, false), Some(false));
        assert!(!p.is_on());
        assert_eq!(p.update(5000, false), None);
        assert_eq!(p.update(5010, true), Some(true));
        assert_eq!(p.update(5020, false), None);
    }

    #[test]
    fn activity_postpones_timeout() {
        let mut p = ScreenPower::with_timeout(0, 1000);
        assert_eq!(p.update(900, true), None);
        assert_eq!(p.update(1800, false), None);
        assert_eq!(p.update(1900, false), Some(false));
    }

    #[test]
    fn survives_timestamp_wrap() {
        let start = u32::MAX - 100;
        let mut p = ScreenPower::with_timeout(start, 1000);
        assert_eq!(p.update(start.wrapping_add(500), false), None);
        assert_eq!(p.update(start.wrapping_add(1000), false), Some(false));
    }

    #[test]
    fn default_timeout_is_a_minute() {
        let mut p = ScreenPower::new(0);
        assert_eq!(p.update(SCREEN_IDLE_TIMEOUT_MS - 1, false), None);
        assert_eq!(p.update(SCREEN_IDLE_TIMEOUT_MS, false), Some(false));
    }
}
