//! Badge firmware: button feedback on the LEDs, motor and screen, with the
//! telemetry panel (battery, clock, motion bars) redrawn incrementally.
//!
//! Button mapping: Start → power, A → A, B → B, Select → C, joystick click →
//! external. The clock starts at `AMBIO_EPOCH` (Unix seconds, default 0).
//!
//! ```sh
//! AMBIO_EPOCH=$(date +%s) cargo run --release --example telemetry --features firmware
//! ```

#![no_std]
#![no_main]

#[allow(clippy::wildcard_imports)]
use ambio_badge::*;
use ambio_badge::config::TICK_MS;
use defmt::info;
use embassy_executor::Spawner;
use embassy_time::{
    Duration,
    Instant,
    Ticker,
    Timer,
};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _;

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

type BadgePendant = Pendant<Screen<'static>, Leds<'static>, Vibration, BadgeSensors>;

fn now_ms() -> u32 {
    // Wraps after ~49 days; every consumer uses wrapping arithmetic.
    Instant::now().as_millis() as u32
}

#[embassy_executor::task]
async fn pendant_task(
    pendant: &'static mut BadgePendant,
    pad: &'static mut ButtonPad,
    backlight: &'static mut Backlight,
) {
    pendant.start(&BOARD_INFO).await;
    info!("Setup complete - starting main loop");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_MS));
    loop {
        let now = now_ms();
        let flags = pad.poll(now);
        let report = pendant.tick(now, &flags).await;
        if let Some(on) = report.backlight {
            backlight.set(on);
        }
        // Ends a finished motor pulse.
        let _ = pendant.tone_mut().is_playing();

        ticker.next().await;
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = ambio_badge::init();
    let resources = split_resources!(peripherals);

    // Framebuffer (~106 KiB) plus the LED pulse buffer.
    esp_alloc::heap_allocator!(size: 160 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let screen: Screen<'static> = resources.display.into();
    let leds: Leds<'static> = resources.leds.into();
    let vibration: Vibration = resources.vibra.into();

    let pendant = mk_static!(
        BadgePendant,
        Pendant::new(screen, leds, vibration, BadgeSensors::new(), now_ms())
    );
    let pad = mk_static!(ButtonPad, resources.buttons.into());
    let backlight = mk_static!(Backlight, resources.backlight.into());
    spawner.must_spawn(pendant_task(pendant, pad, backlight));

    loop {
        Timer::after(Duration::from_secs(600)).await;
    }
}
