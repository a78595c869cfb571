//! Incremental sensor rendering.
//!
//! The renderer remembers what it last put on screen (battery text, bar
//! extents) and each tick issues only the draws needed to reach the new
//! sample. A full redraw happens only on the first sample.
//!
//! Screen layout, with `h = height / 8`:
//!
//! ```text
//!  0      h                 ox                        width
//!  ┌──────┬─────────────────┬──────────────────────────┐ 0
//!  │      │                 │ YYYY/MM/DD(Www) HH:MM:SS │
//!  │Bat:  │                 │                          │ h
//!  ├──────┼─────────────────┼──────────────────────────┤ 2h
//!  │ Pwr  │   accel X  ◄────┼────►                     │
//!  │ A    │   accel Y       │                          │
//!  │ ...  │   ...           │                          │
//!  │      │   gyro Z        │                          │ 8h
//!  └──────┴─────────────────┴──────────────────────────┘
//! ```

use core::fmt::Write as _;

use embedded_graphics::{
    pixelcolor::{
        Rgb565,
        RgbColor,
    },
    prelude::*,
    primitives::Rectangle,
};
use heapless::String;

use crate::{
    clock::{
        DATE_CHARS,
        DateTime,
        TIME_CHARS,
    },
    config::{
        ACCEL_GAIN,
        GYRO_DIVISOR,
        SCREEN_BANDS,
        TEXT_COLOR,
    },
    surface::{
        Batch,
        Surface,
    },
    traits::Sensors,
};

/// `Bat:NNN` / `Bat:none`
pub const BATTERY_CHARS: usize = 8;

/// The six IMU bar channels, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Axis {
    AccelX = 0,
    AccelY = 1,
    AccelZ = 2,
    GyroX = 3,
    GyroY = 4,
    GyroZ = 5,
}

impl Axis {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::AccelX,
        Self::AccelY,
        Self::AccelZ,
        Self::GyroX,
        Self::GyroY,
        Self::GyroZ,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// X red, Y green, Z blue, for both sensors.
    pub const fn color(self) -> Rgb565 {
        match self.index() % 3 {
            0 => Rgb565::RED,
            1 => Rgb565::GREEN,
            _ => Rgb565::BLUE,
        }
    }
}

/// Bar length in pixels for an acceleration in g. Truncates toward zero.
pub fn accel_extent(g: f32) -> i32 {
    (g * ACCEL_GAIN) as i32
}

/// Bar length in pixels for an angular rate in degrees per second.
pub fn gyro_extent(dps: f32) -> i32 {
    (dps / GYRO_DIVISOR) as i32
}

/// Half-open pixel interval `start..end` relative to the bar origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: i32,
    pub end: i32,
}

impl Span {
    /// Interval between two extents, in either order.
    pub const fn between(a: i32, b: i32) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Pixels covered.
    pub const fn width(&self) -> u32 {
        self.end.abs_diff(self.start)
    }
}

/// One fill of a bar update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub span: Span,
    /// Growing away from zero draws in the axis color, shrinking erases.
    pub grow: bool,
}

/// Minimal fills to take a bar from one extent to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarDelta {
    /// Whole previous bar, erased first when the sign flips.
    pub erase: Option<Span>,
    pub stroke: Option<Stroke>,
}

impl BarDelta {
    pub const fn plan(prev: i32, next: i32) -> Self {
        let mut delta = Self {
            erase: None,
            stroke: None,
        };
        if next == prev {
            return delta;
        }

        let mut from = prev;
        if (next < 0) != (from < 0) {
            if from != 0 {
                delta.erase = Some(Span::between(0, from));
            }
            from = 0;
        }

        if next != from {
            delta.stroke = Some(Stroke {
                span: Span::between(from, next),
                grow: (next > from) != (next < 0),
            });
        }
        delta
    }

    pub const fn is_empty(&self) -> bool {
        self.erase.is_none() && self.stroke.is_none()
    }
}

/// Where the bars go for a given screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarGeometry {
    /// Column of extent zero.
    pub origin_x: i32,
    pub row_height: u32,
    screen: Size,
}

impl BarGeometry {
    pub const fn new(screen: Size) -> Self {
        let h = screen.height / SCREEN_BANDS;
        Self {
            origin_x: ((screen.width + h) / 2) as i32,
            row_height: h,
            screen,
        }
    }

    pub const fn row_y(&self, axis: Axis) -> i32 {
        (self.row_height * (axis.index() as u32 + 2)) as i32
    }

    /// Screen rectangle covered by `span` on `axis`'s row.
    pub const fn area(&self, axis: Axis, span: Span) -> Rectangle {
        Rectangle::new(
            Point::new(self.origin_x + span.start, self.row_y(axis)),
            Size::new(span.width(), self.row_height),
        )
    }

    /// Everything below the header band and right of the counter column.
    pub const fn clip_area(&self) -> Rectangle {
        let h = self.row_height;
        Rectangle::new(
            Point::new(h as i32, h as i32),
            Size::new(
                self.screen.width.saturating_sub(h),
                self.screen.height.saturating_sub(h),
            ),
        )
    }
}

/// A text cell that remembers what it last showed.
#[derive(Debug, Clone, Default)]
pub struct ScalarCell<const N: usize> {
    last: Option<String<N>>,
}

impl<const N: usize> ScalarCell<N> {
    pub const fn new() -> Self {
        Self { last: None }
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Store `text`. Returns false, storing nothing, if it is what the cell
    /// already shows.
    pub fn replace(&mut self, text: String<N>) -> bool {
        if self.last.as_ref() == Some(&text) {
            return false;
        }
        self.last = Some(text);
        true
    }
}

/// What one renderer pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderReport {
    pub battery_drawn: bool,
    pub clock_drawn: bool,
    /// Bar fills issued, erases included.
    pub bars_filled: u32,
    pub busy_polls: u32,
}

/// Previous-frame state for the telemetry panel.
#[derive(Debug, Clone, Default)]
pub struct SensorRenderer {
    battery: ScalarCell<BATTERY_CHARS>,
    extents: [i32; Axis::COUNT],
}

impl SensorRenderer {
    pub const fn new() -> Self {
        Self {
            battery: ScalarCell::new(),
            extents: [0; Axis::COUNT],
        }
    }

    /// Bar length currently on screen for `axis`.
    pub const fn extent(&self, axis: Axis) -> i32 {
        self.extents[axis.index()]
    }

    pub fn battery_text(&self) -> Option<&str> {
        self.battery.last()
    }

    /// Sample every sensor, draw the differences in one batch, then commit.
    pub async fn update<S, N>(&mut self, surface: &mut S, sensors: &mut N) -> RenderReport
    where
        S: Surface,
        N: Sensors,
    {
        let mut report = RenderReport::default();
        {
            let mut batch = Batch::begin(surface);
            report.battery_drawn = self.update_battery(&mut batch, sensors);
            report.clock_drawn = Self::update_clock(&mut batch, sensors);
            if sensors.imu_available() {
                self.update_imu(&mut batch, sensors, &mut report).await;
            }
        }
        surface.commit();
        report
    }

    fn update_battery<S: Surface, N: Sensors>(&mut self, batch: &mut Batch<'_, S>, sensors: &mut N) -> bool {
        let mut text = String::<BATTERY_CHARS>::new();
        let _ = match sensors.battery_percent() {
            Some(percent) => write!(text, "Bat:{percent:03}"),
            None => write!(text, "Bat:none"),
        };

        if !self.battery.replace(text.clone()) {
            return false;
        }
        let origin = Point::new(0, batch.glyph_size().height as i32 * 3);
        draw_cell(batch, origin, &text, BATTERY_CHARS);
        true
    }

    /// Redraws unconditionally whenever a clock is available.
    fn update_clock<S: Surface, N: Sensors>(batch: &mut Batch<'_, S>, sensors: &mut N) -> bool {
        if !sensors.clock_available() {
            return false;
        }
        // An unrepresentable system time shows as dashes.
        let now = sensors
            .read_clock()
            .or_else(|| DateTime::from_unix(sensors.system_time()))
            .unwrap_or_default();

        let x = (batch.size().width / 2) as i32;
        let line = batch.glyph_size().height as i32;
        draw_cell(batch, Point::new(x, 0), &now.date_text(), DATE_CHARS);
        draw_cell(batch, Point::new(x, line), &now.time_text(), TIME_CHARS);
        true
    }

    async fn update_imu<S: Surface, N: Sensors>(
        &mut self,
        batch: &mut Batch<'_, S>,
        sensors: &mut N,
        report: &mut RenderReport,
    ) {
        let accel = sensors.read_accel();
        let gyro = sensors.read_gyro();
        let mut target = [0i32; Axis::COUNT];
        for i in 0..3 {
            target[i] = accel_extent(accel[i]);
            target[i + 3] = gyro_extent(gyro[i]);
        }

        let geometry = BarGeometry::new(batch.size());
        let mut clip = batch.clip(geometry.clip_area());
        report.busy_polls = clip.wait_while_busy().await;
        let background = clip.base_color();

        for axis in Axis::ALL {
            let i = axis.index();
            let delta = BarDelta::plan(self.extents[i], target[i]);
            if let Some(span) = delta.erase {
                clip.fill_rect(geometry.area(axis, span), background);
                report.bars_filled += 1;
            }
            if let Some(stroke) = delta.stroke {
                let color = if stroke.grow { axis.color() } else { background };
                clip.fill_rect(geometry.area(axis, stroke.span), color);
                report.bars_filled += 1;
            }
            self.extents[i] = target[i];
        }
    }
}

/// Clear a `chars`-wide text box and draw `text` into it.
fn draw_cell<S: Surface>(batch: &mut Batch<'_, S>, origin: Point, text: &str, chars: usize) {
    let glyph = batch.glyph_size();
    let background = batch.base_color();
    batch.fill_rect(
        Rectangle::new(origin, Size::new(glyph.width * chars as u32, glyph.height)),
        background,
    );
    batch.draw_text(origin, text, TEXT_COLOR);
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::testing::{
        FakeSensors,
        Op,
        RecordingSurface,
    };

    // 320×170: h = 21, ox = 170, accel X row at y = 42.
    const OX: i32 = 170;
    const H: u32 = 21;

    fn imu(accel_x: f32) -> FakeSensors {
        FakeSensors {
            imu: true,
            accel: [accel_x, 0.0, 0.0],
            ..FakeSensors::absent()
        }
    }

    fn render(r: &mut SensorRenderer, s: &mut RecordingSurface, n: &mut FakeSensors) -> RenderReport {
        s.ops.clear();
        block_on(r.update(s, n))
    }

    #[test]
    fn scaling_truncates_toward_zero() {
        assert_eq!(accel_extent(0.8), 40);
        assert_eq!(accel_extent(-0.019), 0);
        assert_eq!(accel_extent(-2.0), -100);
        assert_eq!(gyro_extent(-7.0), -3);
    }

    #[test]
    fn plan_same_sign() {
        assert!(BarDelta::plan(12, 12).is_empty());
        assert_eq!(
            BarDelta::plan(40, 20),
            BarDelta {
                erase: None,
                stroke: Some(Stroke { span: Span::between(20, 40), grow: false }),
            }
        );
        assert_eq!(
            BarDelta::plan(-5, -30).stroke,
            Some(Stroke { span: Span { start: -30, end: -5 }, grow: true })
        );
    }

    #[test]
    fn plan_zero_crossing() {
        let delta = BarDelta::plan(40, -20);
        assert_eq!(delta.erase, Some(Span { start: 0, end: 40 }));
        assert_eq!(delta.stroke, Some(Stroke { span: Span { start: -20, end: 0 }, grow: true }));

        // Leaving zero is not an erase.
        let delta = BarDelta::plan(0, -8);
        assert_eq!(delta.erase, None);
        assert!(delta.stroke.is_some_and(|s| s.grow));

        // Back to zero from below: the erase is the whole job.
        let delta = BarDelta::plan(-8, 0);
        assert_eq!(delta.erase, Some(Span { start: -8, end: 0 }));
        assert_eq!(delta.stroke, None);
    }

    #[test]
    fn geometry_for_badge_panel() {
        let g = BarGeometry::new(Size::new(320, 170));
        assert_eq!(g.origin_x, OX);
        assert_eq!(g.row_height, H);
        assert_eq!(g.row_y(Axis::AccelX), 42);
        assert_eq!(g.row_y(Axis::GyroZ), 147);
        assert_eq!(g.clip_area(), Rectangle::new(Point::new(21, 21), Size::new(299, 149)));
        assert_eq!(Axis::GyroY.color(), Rgb565::GREEN);
    }

    #[test]
    fn repeated_sample_draws_nothing() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        let mut n = FakeSensors {
            battery: Some(50),
            gyro: [30.0, -12.0, 4.0],
            ..imu(0.5)
        };

        let first = render(&mut r, &mut s, &mut n);
        assert!(first.battery_drawn);
        assert_eq!(first.bars_filled, 4);

        let second = render(&mut r, &mut s, &mut n);
        assert_eq!(second, RenderReport::default());
        assert_eq!(s.draw_count(), 0);
        assert_eq!(s.ops.last(), Some(&Op::Commit));
    }

    #[test]
    fn zero_crossing_erases_then_draws() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        render(&mut r, &mut s, &mut imu(0.8));
        assert_eq!(r.extent(Axis::AccelX), 40);

        let report = render(&mut r, &mut s, &mut imu(-0.4));
        assert_eq!(report.bars_filled, 2);
        assert_eq!(
            s.fills(),
            vec![
                (Rectangle::new(Point::new(OX, 42), Size::new(40, H)), Rgb565::BLACK),
                (Rectangle::new(Point::new(OX - 20, 42), Size::new(20, H)), Rgb565::RED),
            ]
        );
        assert_eq!(r.extent(Axis::AccelX), -20);
    }

    #[test]
    fn shrinking_bar_erases_the_difference() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        render(&mut r, &mut s, &mut imu(0.8));
        render(&mut r, &mut s, &mut imu(0.4));
        assert_eq!(
            s.fills(),
            vec![(Rectangle::new(Point::new(OX + 20, 42), Size::new(20, H)), Rgb565::BLACK)]
        );
        assert_eq!(r.extent(Axis::AccelX), 20);
    }

    #[test]
    fn bar_fills_run_inside_clip() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        render(&mut r, &mut s, &mut imu(1.0));
        let clip = BarGeometry::new(s.size).clip_area();
        assert_eq!(
            s.ops,
            vec![
                Op::Begin,
                Op::Fill(Rectangle::new(Point::new(0, 30), Size::new(48, 10)), Rgb565::BLACK),
                Op::Text(Point::new(0, 30), "Bat:none".into(), TEXT_COLOR),
                Op::Clip(clip),
                Op::Fill(Rectangle::new(Point::new(OX, 42), Size::new(50, H)), Rgb565::RED),
                Op::Unclip,
                Op::End,
                Op::Commit,
            ]
        );
    }

    #[test]
    fn battery_redraws_only_on_change() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        let mut n = FakeSensors::absent();
        let mut drawn = Vec::new();
        for level in [77, 77, 63] {
            n.battery = Some(level);
            render(&mut r, &mut s, &mut n);
            drawn.push(s.texts());
        }
        assert_eq!(drawn, vec![vec!["Bat:077".to_string()], vec![], vec!["Bat:063".to_string()]]);
        assert_eq!(r.battery_text(), Some("Bat:063"));
    }

    #[test]
    fn clock_falls_back_to_system_time_and_redraws_every_tick() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        let mut n = FakeSensors {
            clock: true,
            system_time: 946_684_799,
            ..FakeSensors::absent()
        };
        render(&mut r, &mut s, &mut n);

        for _ in 0..2 {
            let report = render(&mut r, &mut s, &mut n);
            assert!(report.clock_drawn);
            assert_eq!(s.texts(), vec!["1999/12/31(Fri)".to_string(), "23:59:59".to_string()]);
        }
        let origins: Vec<_> = s
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(p, ..) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(origins, vec![Point::new(160, 0), Point::new(160, 10)]);
    }

    #[test]
    fn rtc_reading_wins_over_system_time() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        let mut n = FakeSensors {
            clock: true,
            rtc: DateTime::from_unix(0),
            system_time: 946_684_799,
            ..FakeSensors::absent()
        };
        render(&mut r, &mut s, &mut n);
        assert_eq!(&s.texts()[1..], ["1970/01/01(Thu)", "00:00:00"]);
    }

    #[test]
    fn missing_sensors_skip_their_panels() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        let report = render(&mut r, &mut s, &mut FakeSensors::absent());
        assert!(!report.clock_drawn);
        assert_eq!(report.bars_filled, 0);
        assert!(!s.ops.iter().any(|op| matches!(op, Op::Clip(_))));
    }

    #[test]
    fn busy_display_is_polled_before_bars() {
        let mut r = SensorRenderer::new();
        let mut s = RecordingSurface::new();
        s.busy.set(3);
        let report = render(&mut r, &mut s, &mut imu(0.2));
        assert_eq!(report.busy_polls, 3);
        assert_eq!(report.bars_filled, 1);

        let clip = s.ops.iter().position(|op| matches!(op, Op::Clip(_))).unwrap();
        assert_eq!(
            s.ops[clip + 1..],
            [
                Op::BusyPoll,
                Op::BusyPoll,
                Op::BusyPoll,
                Op::Fill(Rectangle::new(Point::new(OX, 42), Size::new(10, H)), Rgb565::RED),
                Op::Unclip,
                Op::End,
                Op::Commit,
            ]
        );
    }
}
