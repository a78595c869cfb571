//! Recording fakes for the collaborator traits.

use core::cell::Cell;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};
use palette::Srgb;

use crate::{
    clock::DateTime,
    surface::Surface,
    traits::{
        Indicator,
        Sensors,
        ToneOutput,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Begin,
    End,
    Fill(Rectangle, Rgb565),
    Clip(Rectangle),
    Unclip,
    Text(Point, String, Rgb565),
    Commit,
    /// An `is_busy` poll that answered `true`.
    BusyPoll,
}

impl Op {
    pub fn is_draw(&self) -> bool {
        matches!(self, Op::Fill(..) | Op::Text(..))
    }
}

/// Records every call. 320×170 like the badge panel, 6×10 glyphs.
pub struct RecordingSurface {
    pub ops: Vec<Op>,
    pub size: Size,
    /// Number of `is_busy` polls that still answer `true`.
    pub busy: Cell<u32>,
    pub depth: u32,
    /// Busy answers not yet logged; they land in `ops` ahead of the next call.
    busy_answers: Cell<u32>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            size: Size::new(320, 170),
            busy: Cell::new(0),
            depth: 0,
            busy_answers: Cell::new(0),
        }
    }

    pub fn fills(&self) -> Vec<(Rectangle, Rgb565)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Fill(area, color) => Some((*area, *color)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(_, text, _) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_draw()).count()
    }

    fn record(&mut self, op: Op) {
        for _ in 0..self.busy_answers.take() {
            self.ops.push(Op::BusyPoll);
        }
        self.ops.push(op);
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn glyph_size(&self) -> Size {
        Size::new(6, 10)
    }

    fn base_color(&self) -> Rgb565 {
        Rgb565::BLACK
    }

    fn is_busy(&self) -> bool {
        let left = self.busy.get();
        if left > 0 {
            self.busy.set(left - 1);
            self.busy_answers.set(self.busy_answers.get() + 1);
            true
        } else {
            false
        }
    }

    fn begin_batch(&mut self) {
        assert_eq!(self.depth, 0, "nested batch");
        self.depth += 1;
        self.record(Op::Begin);
    }

    fn end_batch(&mut self) {
        self.depth -= 1;
        self.record(Op::End);
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) {
        self.record(Op::Fill(area, color));
    }

    fn set_clip(&mut self, area: Rectangle) {
        self.record(Op::Clip(area));
    }

    fn clear_clip(&mut self) {
        self.record(Op::Unclip);
    }

    fn draw_text(&mut self, origin: Point, text: &str, color: Rgb565) {
        self.record(Op::Text(origin, text.into(), color));
    }

    fn commit(&mut self) {
        self.record(Op::Commit);
    }
}

#[derive(Default)]
pub struct FakeIndicator {
    pub colors: Vec<Srgb<u8>>,
}

impl Indicator for FakeIndicator {
    async fn set_color(&mut self, color: Srgb<u8>) {
        self.colors.push(color);
    }
}

/// Tone that reports playing for `length` polls after each start.
#[derive(Default)]
pub struct FakeTone {
    pub played: Vec<(u16, u32)>,
    pub length: u32,
    remaining: u32,
}

impl FakeTone {
    pub fn with_length(length: u32) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }
}

impl ToneOutput for FakeTone {
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32) {
        self.played.push((frequency_hz, duration_ms));
        self.remaining = self.length;
    }

    fn is_playing(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            false
        }
    }
}

/// Scriptable sensor readings.
pub struct FakeSensors {
    pub battery: Option<u8>,
    pub clock: bool,
    pub rtc: Option<DateTime>,
    pub system_time: u64,
    pub imu: bool,
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
}

impl FakeSensors {
    /// Nothing fitted.
    pub fn absent() -> Self {
        Self {
            battery: None,
            clock: false,
            rtc: None,
            system_time: 0,
            imu: false,
            accel: [0.0; 3],
            gyro: [0.0; 3],
        }
    }
}

impl Sensors for FakeSensors {
    fn battery_percent(&mut self) -> Option<u8> {
        self.battery
    }

    fn clock_available(&self) -> bool {
        self.clock
    }

    fn read_clock(&mut self) -> Option<DateTime> {
        self.rtc
    }

    fn system_time(&self) -> u64 {
        self.system_time
    }

    fn imu_available(&self) -> bool {
        self.imu
    }

    fn read_accel(&mut self) -> [f32; 3] {
        self.accel
    }

    fn read_gyro(&mut self) -> [f32; 3] {
        self.gyro
    }
}
