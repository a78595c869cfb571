//! What the badge can sense.
//!
//! No battery gauge, RTC or IMU is fitted. The clock is the build-time epoch
//! plus uptime.

use embassy_time::Instant;

use crate::{
    clock::DateTime,
    config::{
        BOARD_NAME,
        BOOT_EPOCH_SECS,
    },
    traits::{
        BoardInfo,
        Sensors,
    },
};

pub const BOARD_INFO: BoardInfo = BoardInfo {
    board: BOARD_NAME,
    imu: "none",
};

#[derive(Debug, Default)]
pub struct BadgeSensors {
    _private: (),
}

impl BadgeSensors {
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl Sensors for BadgeSensors {
    fn battery_percent(&mut self) -> Option<u8> {
        None
    }

    fn clock_available(&self) -> bool {
        true
    }

    fn read_clock(&mut self) -> Option<DateTime> {
        None
    }

    fn system_time(&self) -> u64 {
        BOOT_EPOCH_SECS + Instant::now().as_secs()
    }

    fn imu_available(&self) -> bool {
        false
    }

    fn read_accel(&mut self) -> [f32; 3] {
        [0.0; 3]
    }

    fn read_gyro(&mut self) -> [f32; 3] {
        [0.0; 3]
    }
}
