//! Tick coordination: buttons first, then telemetry, then screen power.

use embedded_graphics::prelude::*;

use crate::{
    classifier::{
        ButtonTick,
        process_buttons,
    },
    config::{
        STARTUP_TONES,
        TEXT_COLOR,
    },
    input::{
        ButtonChannel,
        RawButtonFlags,
    },
    power::ScreenPower,
    surface::{
        Batch,
        Surface,
    },
    telemetry::{
        RenderReport,
        SensorRenderer,
    },
    traits::{
        BoardInfo,
        Indicator,
        Sensors,
        ToneOutput,
        request_tone,
    },
};

/// Outcome of one [`Pendant::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub buttons: ButtonTick,
    pub render: RenderReport,
    /// New backlight state, if it changed this tick.
    pub backlight: Option<bool>,
}

impl TickReport {
    pub fn any_button_event(&self) -> bool {
        self.buttons.any_event()
    }
}

/// The feedback engine: owns its collaborators and all previous-frame state.
pub struct Pendant<S, L, T, N> {
    surface: S,
    indicator: L,
    tone: T,
    sensors: N,
    renderer: SensorRenderer,
    power: ScreenPower,
}

impl<S, L, T, N> Pendant<S, L, T, N>
where
    S: Surface,
    L: Indicator,
    T: ToneOutput,
    N: Sensors,
{
    pub fn new(surface: S, indicator: L, tone: T, sensors: N, now_ms: u32) -> Self {
        Self {
            surface,
            indicator,
            tone,
            sensors,
            renderer: SensorRenderer::new(),
            power: ScreenPower::new(now_ms),
        }
    }

    /// Show the board identity and play the startup chime.
    pub async fn start(&mut self, info: &BoardInfo) {
        {
            let mut batch = Batch::begin(&mut self.surface);
            let glyph = batch.glyph_size();
            let lines = [("Core:", info.board), ("IMU:", info.imu)];
            for (row, (label, value)) in lines.into_iter().enumerate() {
                let y = glyph.height as i32 * row as i32;
                batch.draw_text(Point::new(0, y), label, TEXT_COLOR);
                let x = glyph.width as i32 * label.len() as i32;
                batch.draw_text(Point::new(x, y), value, TEXT_COLOR);
            }
        }
        self.surface.commit();
        info!("Displayed: core={}, imu={}", info.board, info.imu);

        for (frequency_hz, duration_ms) in STARTUP_TONES {
            request_tone(&mut self.tone, frequency_hz, duration_ms, true).await;
        }
    }

    /// Run one iteration of the main loop.
    ///
    /// Button overlays and telemetry from the same tick land in one commit.
    pub async fn tick(&mut self, now_ms: u32, flags: &[RawButtonFlags; ButtonChannel::COUNT]) -> TickReport {
        let buttons = process_buttons(&mut self.surface, &mut self.indicator, &mut self.tone, flags).await;
        let render = self.renderer.update(&mut self.surface, &mut self.sensors).await;
        let backlight = self.power.update(now_ms, buttons.any_event());
        TickReport {
            buttons,
            render,
            backlight,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn indicator(&self) -> &L {
        &self.indicator
    }

    pub fn tone(&self) -> &T {
        &self.tone
    }

    pub fn tone_mut(&mut self) -> &mut T {
        &mut self.tone
    }

    pub fn sensors_mut(&mut self) -> &mut N {
        &mut self.sensors
    }

    pub fn renderer(&self) -> &SensorRenderer {
        &self.renderer
    }

    pub fn screen_on(&self) -> bool {
        self.power.is_on()
    }
}
