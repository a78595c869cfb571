//! Display surface: the drawing contract the feedback engine relies on, the
//! batch and clip scopes around it, and a framebuffer implementation for any
//! `embedded-graphics` panel.

extern crate alloc;

use alloc::{
    vec,
    vec::Vec,
};
use core::convert::Infallible;

use embedded_graphics::{
    mono_font::{
        MonoFont,
        MonoTextStyle,
        ascii::FONT_6X10,
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
    text::{
        Baseline,
        Text,
    },
};

/// A display that accepts batched, clipped rectangle and text writes.
pub trait Surface {
    fn size(&self) -> Size;

    /// Cell size of one text character.
    fn glyph_size(&self) -> Size;

    /// Background color, used for erasing.
    fn base_color(&self) -> Rgb565;

    /// Slow panels (e-paper) report busy while refreshing.
    fn is_busy(&self) -> bool;

    fn begin_batch(&mut self);
    fn end_batch(&mut self);

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565);

    /// Restrict subsequent writes to `area` until [`clear_clip`](Self::clear_clip).
    fn set_clip(&mut self, area: Rectangle);
    fn clear_clip(&mut self);

    /// Draw `text` with its top-left corner at `origin`, transparent background.
    fn draw_text(&mut self, origin: Point, text: &str, color: Rgb565);

    /// Push everything written so far to the panel.
    fn commit(&mut self);
}

/// Spin until the surface stops reporting busy, yielding between polls.
///
/// There is no timeout. Returns the number of polls spent waiting.
pub async fn wait_while_busy<S: Surface + ?Sized>(surface: &S) -> u32 {
    let mut polls = 0u32;
    while surface.is_busy() {
        polls = polls.saturating_add(1);
        embassy_futures::yield_now().await;
    }
    polls
}

/// An open batched-write scope. Ends the batch when dropped.
///
/// The scope holds the only mutable borrow of the surface, so a second batch
/// cannot be opened while this one is alive.
pub struct Batch<'a, S: Surface> {
    surface: &'a mut S,
}

impl<'a, S: Surface> Batch<'a, S> {
    pub fn begin(surface: &'a mut S) -> Self {
        surface.begin_batch();
        Self { surface }
    }

    pub fn size(&self) -> Size {
        self.surface.size()
    }

    pub fn glyph_size(&self) -> Size {
        self.surface.glyph_size()
    }

    pub fn base_color(&self) -> Rgb565 {
        self.surface.base_color()
    }

    pub fn is_busy(&self) -> bool {
        self.surface.is_busy()
    }

    pub fn fill_rect(&mut self, area: Rectangle, color: Rgb565) {
        self.surface.fill_rect(area, color);
    }

    pub fn draw_text(&mut self, origin: Point, text: &str, color: Rgb565) {
        self.surface.draw_text(origin, text, color);
    }

    /// Open a clip scope inside this batch.
    pub fn clip(&mut self, area: Rectangle) -> Clip<'_, S> {
        self.surface.set_clip(area);
        Clip {
            surface: &mut *self.surface,
        }
    }
}

impl<S: Surface> Drop for Batch<'_, S> {
    fn drop(&mut self) {
        self.surface.end_batch();
    }
}

/// An active clip region. Clears the clip when dropped.
pub struct Clip<'a, S: Surface> {
    surface: &'a mut S,
}

impl<S: Surface> Clip<'_, S> {
    pub fn base_color(&self) -> Rgb565 {
        self.surface.base_color()
    }

    pub fn fill_rect(&mut self, area: Rectangle, color: Rgb565) {
        self.surface.fill_rect(area, color);
    }

    /// See [`wait_while_busy`].
    pub async fn wait_while_busy(&self) -> u32 {
        wait_while_busy(&*self.surface).await
    }
}

impl<S: Surface> Drop for Clip<'_, S> {
    fn drop(&mut self) {
        self.surface.clear_clip();
    }
}

// ── Framebuffer surface ─────────────────────────────────────────────────────

/// Separate dirty regions tracked between commits.
pub const DIRTY_SLOTS: usize = 16;

/// [`Surface`] backed by an in-RAM Rgb565 framebuffer.
///
/// Writes land in the framebuffer and are tracked as a short list of dirty
/// regions. Regions that overlap or touch are merged; when the list is full a
/// new region joins the one it enlarges least. [`commit`] sends each region
/// to the panel on its own. The panel is an LCD, so it is never busy.
///
/// [`commit`]: Surface::commit
pub struct FrameSurface<D> {
    target: D,
    size: Size,
    pixels: Vec<Rgb565>,
    background: Rgb565,
    font: &'static MonoFont<'static>,
    clip: Option<Rectangle>,
    dirty: heapless::Vec<Rectangle, DIRTY_SLOTS>,
    batch_open: bool,
    faults: u32,
}

impl<D> FrameSurface<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    /// Wrap `target`. The framebuffer starts cleared to `background` and is
    /// not flushed until something is drawn.
    pub fn new(target: D, background: Rgb565) -> Self {
        let size = target.size();
        Self {
            pixels: vec![background; size.width as usize * size.height as usize],
            target,
            size,
            background,
            font: &FONT_6X10,
            clip: None,
            dirty: heapless::Vec::new(),
            batch_open: false,
            faults: 0,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    /// Regions written since the last commit.
    pub fn dirty_areas(&self) -> &[Rectangle] {
        &self.dirty
    }

    /// Number of commits the panel rejected.
    pub fn faults(&self) -> u32 {
        self.faults
    }

    /// Framebuffer content at `point`.
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        self.index(point).map(|i| self.pixels[i])
    }

    fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size)
    }

    fn writable(&self) -> Rectangle {
        let bounds = self.bounds();
        self.clip.map_or(bounds, |clip| clip.intersection(&bounds))
    }

    fn index(&self, point: Point) -> Option<usize> {
        if self.bounds().contains(point) {
            Some(point.y as usize * self.size.width as usize + point.x as usize)
        } else {
            None
        }
    }

    fn mark_dirty(&mut self, mut area: Rectangle) {
        let mut i = 0;
        while i < self.dirty.len() {
            if adjoins(&self.dirty[i], &area) {
                area = union(self.dirty.swap_remove(i), area);
                // The grown region may now reach ones already checked.
                i = 0;
            } else {
                i += 1;
            }
        }

        if let Err(area) = self.dirty.push(area) {
            let cheapest = self
                .dirty
                .iter()
                .enumerate()
                .min_by_key(|(_, dirty)| pixel_count(&union(**dirty, area)) - pixel_count(dirty))
                .map(|(i, _)| i);
            if let Some(i) = cheapest {
                let merged = union(self.dirty.swap_remove(i), area);
                self.mark_dirty(merged);
            }
        }
    }
}

impl<D> Surface for FrameSurface<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    fn size(&self) -> Size {
        self.size
    }

    fn glyph_size(&self) -> Size {
        self.font.character_size
    }

    fn base_color(&self) -> Rgb565 {
        self.background
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn begin_batch(&mut self) {
        debug_assert!(!self.batch_open, "batched writes do not nest");
        self.batch_open = true;
    }

    fn end_batch(&mut self) {
        self.batch_open = false;
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) {
        let area = area.intersection(&self.writable());
        if area.is_zero_sized() {
            return;
        }

        let width = self.size.width as usize;
        let columns = area.columns();
        let (x0, x1) = (columns.start as usize, columns.end as usize);
        for y in area.rows() {
            let row = y as usize * width;
            self.pixels[row + x0..row + x1].fill(color);
        }
        self.mark_dirty(area);
    }

    fn set_clip(&mut self, area: Rectangle) {
        self.clip = Some(area);
    }

    fn clear_clip(&mut self) {
        self.clip = None;
    }

    fn draw_text(&mut self, origin: Point, text: &str, color: Rgb565) {
        let mut canvas = Canvas {
            area: self.writable(),
            width: self.size.width as usize,
            pixels: &mut self.pixels,
            touched: None,
        };
        let style = MonoTextStyle::new(self.font, color);
        let _ = Text::with_baseline(text, origin, style, Baseline::Top).draw(&mut canvas);

        let touched = canvas.touched;
        if let Some(touched) = touched {
            self.mark_dirty(touched);
        }
    }

    fn commit(&mut self) {
        let width = self.size.width as usize;
        for area in self.dirty.iter() {
            let pixels = &self.pixels;
            let colors = area
                .points()
                .map(|p| pixels[p.y as usize * width + p.x as usize]);

            if self.target.fill_contiguous(area, colors).is_err() {
                self.faults = self.faults.saturating_add(1);
                error!("display flush failed ({} faults)", self.faults);
            }
        }
        self.dirty.clear();
    }
}

/// True if `a` and `b` overlap or share an edge.
fn adjoins(a: &Rectangle, b: &Rectangle) -> bool {
    let (a0, b0) = (a.top_left, b.top_left);
    let a1 = a0 + a.size;
    let b1 = b0 + b.size;
    a0.x <= b1.x && b0.x <= a1.x && a0.y <= b1.y && b0.y <= a1.y
}

fn pixel_count(area: &Rectangle) -> u64 {
    u64::from(area.size.width) * u64::from(area.size.height)
}

/// Smallest rectangle covering both `a` and `b`.
fn union(a: Rectangle, b: Rectangle) -> Rectangle {
    match (a.bottom_right(), b.bottom_right()) {
        (Some(a_br), Some(b_br)) => Rectangle::with_corners(
            a.top_left.component_min(b.top_left),
            a_br.component_max(b_br),
        ),
        (Some(_), None) => a,
        _ => b,
    }
}

/// Draw target over a framebuffer slice, limited to `area`.
struct Canvas<'a> {
    area: Rectangle,
    width: usize,
    pixels: &'a mut [Rgb565],
    touched: Option<Rectangle>,
}

impl Dimensions for Canvas<'_> {
    fn bounding_box(&self) -> Rectangle {
        self.area
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if !self.area.contains(point) {
                continue;
            }
            self.pixels[point.y as usize * self.width + point.x as usize] = color;
            let dot = Rectangle::new(point, Size::new(1, 1));
            self.touched = Some(match self.touched {
                Some(touched) => union(touched, dot),
                None => dot,
            });
        }
        Ok(())
    }
}
