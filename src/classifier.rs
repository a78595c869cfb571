//! Button event classification and feedback fan-out.

use core::fmt::Write as _;

use embedded_graphics::{
    pixelcolor::{
        Rgb565,
        Rgb888,
        RgbColor,
    },
    prelude::*,
    primitives::Rectangle,
};
use palette::Srgb;

use crate::{
    config::{
        BUTTON_TONE_DURATION_MS,
        COUNTER_TEXT_COLOR,
        LED_BRIGHTNESS,
        SCREEN_BANDS,
    },
    input::{
        ButtonChannel,
        RawButtonFlags,
    },
    surface::{
        Batch,
        Surface,
    },
    traits::{
        Indicator,
        ToneOutput,
        request_tone,
    },
};

/// What happened to one button during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ButtonEvent {
    #[default]
    None = 0,
    Hold = 1,
    Clicked = 2,
    Pressed = 3,
    Released = 4,
    DecideClickCount = 5,
}

/// Indexed by [`ButtonEvent::ordinal`].
pub const EVENT_COLORS: [Rgb565; 6] = [
    Rgb565::WHITE,
    Rgb565::CYAN,
    Rgb565::RED,
    Rgb565::YELLOW,
    Rgb565::BLUE,
    Rgb565::GREEN,
];

impl ButtonEvent {
    /// Pick the single event for this tick's flags.
    ///
    /// Several flags can be raised together; the first match in the order
    /// hold, clicked, pressed, released, decided wins.
    pub const fn classify(flags: &RawButtonFlags) -> Self {
        if flags.hold {
            Self::Hold
        } else if flags.clicked {
            Self::Clicked
        } else if flags.pressed {
            Self::Pressed
        } else if flags.released {
            Self::Released
        } else if flags.decided {
            Self::DecideClickCount
        } else {
            Self::None
        }
    }

    pub const fn ordinal(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hold => "wasHold",
            Self::Clicked => "wasClicked",
            Self::Pressed => "wasPressed",
            Self::Released => "wasReleased",
            Self::DecideClickCount => "wasDecideClickCount",
        }
    }

    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Full-intensity overlay color.
    pub const fn color(self) -> Rgb565 {
        EVENT_COLORS[self.ordinal()]
    }

    /// Indicator LED color: the overlay hue at [`LED_BRIGHTNESS`].
    pub fn led_color(self) -> Srgb<u8> {
        let c = Rgb888::from(self.color());
        Srgb::new(dim(c.r()), dim(c.g()), dim(c.b()))
    }
}

impl core::fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

const fn dim(channel: u8) -> u8 {
    (channel as u16 * LED_BRIGHTNESS as u16 / 255) as u8
}

/// Per-channel results of one classifier pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonTick {
    pub events: [ButtonEvent; ButtonChannel::COUNT],
}

impl ButtonTick {
    /// True if any channel produced an event.
    pub fn any_event(&self) -> bool {
        self.events.iter().any(|e| !e.is_none())
    }

    pub fn event(&self, channel: ButtonChannel) -> ButtonEvent {
        self.events[channel.index()]
    }
}

/// Counter cell for `channel`: one band tall minus a separator line, as wide
/// as it is tall, in the left column.
pub fn counter_cell(screen: Size, channel: ButtonChannel) -> Rectangle {
    let h = screen.height / SCREEN_BANDS;
    Rectangle::new(
        Point::new(0, (h * channel.row()) as i32),
        Size::new(h, h.saturating_sub(1)),
    )
}

/// Classify every channel and fan out the feedback for those with an event.
///
/// All overlay drawing happens inside one batch. Nothing is committed here;
/// the renderer flushes at the end of the tick.
pub async fn process_buttons<S, L, T>(
    surface: &mut S,
    indicator: &mut L,
    tone: &mut T,
    flags: &[RawButtonFlags; ButtonChannel::COUNT],
) -> ButtonTick
where
    S: Surface,
    L: Indicator,
    T: ToneOutput,
{
    let mut tick = ButtonTick::default();
    let mut batch = Batch::begin(surface);

    for channel in ButtonChannel::ALL {
        let raw = &flags[channel.index()];
        let event = ButtonEvent::classify(raw);
        tick.events[channel.index()] = event;
        if event.is_none() {
            continue;
        }

        indicator.set_color(event.led_color()).await;
        request_tone(tone, channel.tone_hz(), BUTTON_TONE_DURATION_MS, false).await;
        info!(
            "{}:{}  count:{}",
            channel.name(),
            event.name(),
            raw.click_count
        );

        if !batch.is_busy() {
            let cell = counter_cell(batch.size(), channel);
            batch.fill_rect(cell, event.color());

            let mut count = heapless::String::<5>::new();
            let _ = write!(count, "{}", raw.click_count);
            batch.draw_text(cell.top_left, &count, COUNTER_TEXT_COLOR);
        }
    }

    tick
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::testing::{
        FakeIndicator,
        FakeTone,
        Op,
        RecordingSurface,
    };

    fn flags(hold: bool, clicked: bool, pressed: bool, released: bool, decided: bool) -> RawButtonFlags {
        RawButtonFlags {
            hold,
            clicked,
            pressed,
            released,
            decided,
            click_count: 0,
        }
    }

    #[test]
    fn highest_priority_flag_wins() {
        // Exhaustive over the 32 flag combinations.
        for bits in 0u8..32 {
            let bit = |n: u8| bits & (1 << n) != 0;
            let f = flags(bit(0), bit(1), bit(2), bit(3), bit(4));
            let expected = match bits.trailing_zeros() {
                0 => ButtonEvent::Hold,
                1 => ButtonEvent::Clicked,
                2 => ButtonEvent::Pressed,
                3 => ButtonEvent::Released,
                4 => ButtonEvent::DecideClickCount,
                _ => ButtonEvent::None,
            };
            assert_eq!(ButtonEvent::classify(&f), expected, "flags {bits:05b}");
        }
    }

    #[test]
    fn hold_outranks_click() {
        let f = flags(true, true, false, true, false);
        assert_eq!(ButtonEvent::classify(&f), ButtonEvent::Hold);
    }

    #[test]
    fn color_and_name_tables() {
        assert_eq!(ButtonEvent::None.color(), Rgb565::WHITE);
        assert_eq!(ButtonEvent::Released.color(), Rgb565::BLUE);
        assert_eq!(ButtonEvent::DecideClickCount.name(), "wasDecideClickCount");
        assert_eq!(ButtonEvent::Clicked.led_color(), Srgb::new(64, 0, 0));
        assert_eq!(ButtonEvent::None.led_color(), Srgb::new(64, 64, 64));
    }

    #[test]
    fn idle_flags_have_no_side_effects() {
        let mut surface = RecordingSurface::new();
        let mut leds = FakeIndicator::default();
        let mut tone = FakeTone::default();
        let idle = [RawButtonFlags::default(); ButtonChannel::COUNT];

        let tick = block_on(process_buttons(&mut surface, &mut leds, &mut tone, &idle));

        assert!(!tick.any_event());
        assert!(leds.colors.is_empty());
        assert!(tone.played.is_empty());
        assert_eq!(surface.ops, vec![Op::Begin, Op::End]);
    }

    #[test]
    fn click_fans_out_to_every_sink() {
        let mut surface = RecordingSurface::new();
        let mut leds = FakeIndicator::default();
        let mut tone = FakeTone::with_length(10);
        let mut raw = [RawButtonFlags::default(); ButtonChannel::COUNT];
        raw[ButtonChannel::B.index()] = RawButtonFlags {
            clicked: true,
            released: true,
            click_count: 3,
            ..RawButtonFlags::default()
        };

        let tick = block_on(process_buttons(&mut surface, &mut leds, &mut tone, &raw));

        assert!(tick.any_event());
        assert_eq!(tick.event(ButtonChannel::B), ButtonEvent::Clicked);
        assert_eq!(tick.event(ButtonChannel::A), ButtonEvent::None);
        assert_eq!(leds.colors, vec![Srgb::new(64, 0, 0)]);
        // Non-blocking: the tone is still playing afterwards.
        assert_eq!(tone.played, vec![(587, 100)]);
        assert!(tone.is_playing());

        // 170 / 8 = 21 px bands, row 4.
        let cell = Rectangle::new(Point::new(0, 84), Size::new(21, 20));
        assert_eq!(
            surface.ops,
            vec![
                Op::Begin,
                Op::Fill(cell, Rgb565::RED),
                Op::Text(Point::new(0, 84), "3".into(), COUNTER_TEXT_COLOR),
                Op::End,
            ]
        );
    }

    #[test]
    fn busy_display_skips_only_the_overlay() {
        let mut surface = RecordingSurface::new();
        surface.busy.set(u32::MAX);
        let mut leds = FakeIndicator::default();
        let mut tone = FakeTone::default();
        let mut raw = [RawButtonFlags::default(); ButtonChannel::COUNT];
        raw[ButtonChannel::Power.index()].hold = true;
        raw[ButtonChannel::External.index()].pressed = true;

        let tick = block_on(process_buttons(&mut surface, &mut leds, &mut tone, &raw));

        assert_eq!(tick.event(ButtonChannel::Power), ButtonEvent::Hold);
        assert_eq!(tick.event(ButtonChannel::External), ButtonEvent::Pressed);
        assert_eq!(leds.colors.len(), 2);
        assert_eq!(tone.played, vec![(784, 100), (698, 100)]);
        assert_eq!(surface.draw_count(), 0);
    }

    #[test]
    fn counter_cells_follow_channel_rows() {
        let screen = Size::new(320, 170);
        assert_eq!(counter_cell(screen, ButtonChannel::Power).top_left, Point::new(0, 42));
        assert_eq!(counter_cell(screen, ButtonChannel::External).top_left, Point::new(0, 126));
    }
}
