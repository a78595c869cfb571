//! ST7789 panel bring-up and the framebuffered [`Screen`] built on it.

use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    Async,
    delay::Delay,
    dma::{
        DmaRxBuf,
        DmaTxBuf,
    },
    dma_buffers,
    gpio::{
        Level,
        Output,
        OutputConfig,
    },
    spi::master::{
        Config,
        Spi,
        SpiDmaBus,
    },
    time::Rate,
};
use mipidsi::{
    Builder,
    interface::SpiInterface,
    models::ST7789,
    options::{
        ColorInversion,
        Orientation,
        Rotation,
    },
};

use crate::{
    DisplayResources,
    config::BACKGROUND,
    surface::FrameSurface,
};

/// Native (portrait) panel size; the panel is mounted rotated to 320×170.
const NATIVE_SIZE: (u16, u16) = (170, 320);

/// The 170-column glass sits 35 columns into the controller's RAM.
const COLUMN_OFFSET: u16 = 35;

const SPI_MHZ: u32 = 80;

/// Bytes per DMA transfer and per mipidsi pixel batch. One dirty region
/// streams through in chunks of this size.
const TRANSFER_BYTES: usize = 32_000;

type Bus<'a> = ExclusiveDevice<SpiDmaBus<'a, Async>, Output<'a>, Delay>;

/// The bare ST7789 as an `embedded-graphics` draw target.
pub type Display<'a> = mipidsi::Display<SpiInterface<'a, Bus<'a>, Output<'a>>, ST7789, Output<'a>>;

/// The display behind a framebuffer: what the feedback engine draws on.
///
/// The framebuffer takes 320 × 170 × 2 bytes of heap.
pub type Screen<'a> = FrameSurface<Display<'a>>;

impl<'a> From<DisplayResources<'a>> for Screen<'a> {
    fn from(res: DisplayResources<'a>) -> Self {
        FrameSurface::new(res.into(), BACKGROUND)
    }
}

impl<'a> From<DisplayResources<'a>> for Display<'a> {
    fn from(res: DisplayResources<'a>) -> Self {
        let mut delay = Delay::new();
        let dc = Output::new(res.dc, Level::Low, OutputConfig::default());
        let mut rst = Output::new(res.rst, Level::Low, OutputConfig::default());
        rst.set_high();

        let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) = dma_buffers!(TRANSFER_BYTES);
        let rx = DmaRxBuf::new(rx_descriptors, rx_buffer).expect("DMA rx buffer");
        let tx = DmaTxBuf::new(tx_descriptors, tx_buffer).expect("DMA tx buffer");
        let spi = Spi::new(res.spi, Config::default().with_frequency(Rate::from_mhz(SPI_MHZ)))
            .expect("SPI2 config")
            .with_sck(res.sck)
            .with_mosi(res.mosi)
            .with_miso(res.miso)
            .with_dma(res.dma)
            .with_buffers(rx, tx)
            .into_async();

        let cs = Output::new(res.cs, Level::High, OutputConfig::default());
        let bus = ExclusiveDevice::new(spi, cs, delay).expect("SPI device");
        let pixel_buffer = crate::mk_static!([u8; TRANSFER_BYTES], [0_u8; TRANSFER_BYTES]);

        let (width, height) = NATIVE_SIZE;
        let display = Builder::new(ST7789, SpiInterface::new(bus, dc, pixel_buffer))
            .reset_pin(rst)
            .display_size(width, height)
            .invert_colors(ColorInversion::Inverted)
            .orientation(Orientation::new().rotate(Rotation::Deg90))
            .display_offset(COLUMN_OFFSET, 0)
            .init(&mut delay)
            .expect("ST7789 init");
        info!("display ready: {}x{} at {} MHz", height, width, SPI_MHZ);
        display
    }
}
