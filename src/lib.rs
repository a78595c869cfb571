//! # ambio-badge
//!
//! Button feedback and live sensor telemetry for a wearable badge.
//!
//! Two subsystems share the display once per tick:
//! - **Classifier** ([`classifier`]): turns raw per-button transitions into
//!   one [`ButtonEvent`] per button and fans it out to the indicator LEDs, a
//!   tone and an on-screen click counter.
//! - **Renderer** ([`telemetry`]): samples battery, clock and IMU, compares
//!   against what is already on screen and draws only the difference.
//!
//! [`Pendant`] ties them together. Hardware is reached through the traits in
//! [`traits`] and the [`Surface`] display contract, so the whole engine runs
//! on the host under test. With the `firmware` feature the crate also carries
//! the Disobey 2026 badge support (ST7789 LCD, WS2812 LEDs, vibration motor,
//! buttons).
//!
//! ## Quick start (badge)
//!
//! ```rust,ignore
//! let peripherals = ambio_badge::init();
//! let resources = ambio_badge::split_resources!(peripherals);
//!
//! let screen: Screen = resources.display.into();
//! let leds: Leds = resources.leds.into();
//! let vibration: Vibration = resources.vibra.into();
//! let mut pendant = Pendant::new(screen, leds, vibration, BadgeSensors::new(), 0);
//! pendant.start(&BOARD_INFO).await;
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod app;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod input;
pub mod power;
pub mod surface;
pub mod telemetry;
pub mod traits;

#[cfg(test)]
mod testing;

pub use app::{
    Pendant,
    TickReport,
};
pub use classifier::{
    ButtonEvent,
    ButtonTick,
};
pub use clock::DateTime;
pub use input::{
    ButtonChannel,
    ButtonTracker,
    RawButtonFlags,
};
pub use surface::{
    FrameSurface,
    Surface,
};
pub use telemetry::{
    RenderReport,
    SensorRenderer,
};
pub use traits::{
    BoardInfo,
    Indicator,
    Sensors,
    ToneOutput,
};

#[cfg(feature = "firmware")]
mod backlight;
#[cfg(feature = "firmware")]
mod buttons;
#[cfg(feature = "firmware")]
mod display;
#[cfg(feature = "firmware")]
mod leds;
#[cfg(feature = "firmware")]
mod sensors;
#[cfg(feature = "firmware")]
mod vibration;

#[cfg(feature = "firmware")]
pub use board::*;

#[cfg(feature = "firmware")]
mod board {
    use esp_hal::{
        Blocking,
        assign_resources,
        clock::{
            Clock,
            CpuClock,
        },
        gpio::{
            Level,
            Output,
            OutputConfig,
        },
        rmt::{
            Rmt,
            Tx,
            TxChannelConfig,
            TxChannelCreator as _,
        },
        rom,
        time::Rate,
    };

    pub use crate::{
        backlight::Backlight,
        buttons::{
            ButtonPad,
            Buttons,
        },
        display::{
            Display,
            Screen,
        },
        leds::{
            LED_COUNT,
            Leds,
        },
        sensors::{
            BOARD_INFO,
            BadgeSensors,
        },
        vibration::Vibration,
    };

    /// StaticCell helper: allocates a value into a `static` exactly once.
    #[macro_export]
    macro_rules! mk_static {
        ($t:ty, $val:expr) => {{
            static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
            #[deny(unused_attributes)]
            let x = STATIC_CELL.uninit().write($val);
            x
        }};
    }

    // ── Pin / peripheral assignments ────────────────────────────────────────

    assign_resources! {
        pub Resources<'d> {
            display: DisplayResources<'d> {
                dc: GPIO15,
                rst: GPIO7,
                sck: GPIO4,
                cs: GPIO6,
                miso: GPIO16,
                mosi: GPIO5,
                spi: SPI2,
                dma: DMA_CH0,
            },
            backlight: BacklightResources<'d> {
                led: GPIO19,
            },
            buttons: ButtonResources<'d> {
                stick: GPIO14,
                a: GPIO13,
                b: GPIO38,
                start: GPIO12,
                select: GPIO45,
            },
            leds: LedResources<'d> {
                power: GPIO17,
                io: GPIO18,
                rmt: RMT,
            },
            vibra: VibrationResources<'d> {
                motor: GPIO20,
            },
        }
    }

    // ── Board initialisation ────────────────────────────────────────────────

    /// Minimal CPU clock switcher for ESP32-S3.
    ///
    /// Steps through an intermediate frequency before reaching the target,
    /// which is required by the hardware.
    fn set_cpu_clock(cpu_clock_speed: CpuClock) {
        let _ = esp_hal::peripherals::SYSTEM::regs()
            .sysclk_conf()
            .modify(|_, w| unsafe { w.soc_clk_sel().bits(1) });
        let _ = esp_hal::peripherals::SYSTEM::regs()
            .cpu_per_conf()
            .modify(|_, w| unsafe {
                let _ = w.pll_freq_sel().set_bit();
                w.cpuperiod_sel().bits(match cpu_clock_speed {
                    CpuClock::_80MHz => 0,
                    CpuClock::_160MHz => 1,
                    CpuClock::_240MHz => 2,
                    _ => panic!("Unsupported CPU clock speed"),
                })
            });

        rom::ets_update_cpu_frequency_rom(cpu_clock_speed.frequency().as_mhz());
    }

    /// Initialise the badge hardware and return the raw peripheral set.
    ///
    /// Call this once at the top of `main`, then use [`split_resources!`] to
    /// break the peripherals into typed resource groups.
    #[must_use]
    pub fn init() -> esp_hal::peripherals::Peripherals {
        set_cpu_clock(CpuClock::_160MHz);
        let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
        esp_hal::init(config)
    }

    // ── Resource → peripheral conversions ───────────────────────────────────

    impl From<esp_hal::peripherals::Peripherals> for Resources<'_> {
        fn from(peripherals: esp_hal::peripherals::Peripherals) -> Self {
            split_resources!(peripherals)
        }
    }

    impl<'a> From<LedResources<'a>> for esp_hal::rmt::Channel<'a, Blocking, Tx> {
        fn from(res: LedResources<'a>) -> Self {
            let _ws_power = Output::new(res.power, Level::High, OutputConfig::default());
            let rmt = Rmt::new(res.rmt, Rate::from_mhz(40)).expect("RMT init");
            let tx_config = TxChannelConfig::default().with_clk_divider(1);
            rmt.channel0
                .configure_tx(res.io, tx_config)
                .expect("RMT channel 0")
        }
    }

    impl<'a> From<LedResources<'a>> for Leds<'a> {
        fn from(res: LedResources<'a>) -> Self {
            Leds::new(res.into())
        }
    }
}
