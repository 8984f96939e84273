//! Raster buffers, loaded images and panel geometry.
//!
//! - [`RasterBuffer`]: Owned RGB888 canvas implementing `DrawTarget`; one per key face
//!   or one for a whole splash panel
//! - [`RasterImage`]: Decoded RGBA asset as handed over by an [`AssetSource`](crate::AssetSource)
//! - [`PanelLayout`]: Key grid, key size and bezel spacing of a deck model
//!
//! # Splash Geometry
//!
//! A splash image is laid out on a canvas that includes the physical gaps between
//! keys, then each key crops its own tile. The picture therefore looks continuous
//! across the bezels instead of being squeezed into the key surfaces only.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::colors::darken;

// =============================================================================
// Panel Geometry
// =============================================================================

/// Physical layout of a deck model.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PanelLayout {
    pub rows: u32,
    pub cols: u32,
    /// Pixel size of one key face.
    pub key_size: Size,
    /// Hidden pixels between neighbouring keys (bezels), horizontal and vertical.
    pub spacing: Size,
}

impl PanelLayout {
    /// Number of physical keys.
    #[inline]
    pub const fn key_count(&self) -> usize { (self.rows * self.cols) as usize }

    /// Size of the full splash canvas including bezel gaps.
    pub const fn canvas_size(&self) -> Size {
        Size::new(
            self.cols * self.key_size.width + self.spacing.width * self.cols.saturating_sub(1),
            self.rows * self.key_size.height + self.spacing.height * self.rows.saturating_sub(1),
        )
    }

    /// Area of a key on the splash canvas, or `None` past the last key.
    pub fn tile(
        &self,
        index: usize,
    ) -> Option<Rectangle> {
        if index >= self.key_count() {
            return None;
        }
        let row = index as u32 / self.cols;
        let col = index as u32 % self.cols;
        let x = col * (self.key_size.width + self.spacing.width);
        let y = row * (self.key_size.height + self.spacing.height);
        Some(Rectangle::new(Point::new(x as i32, y as i32), self.key_size))
    }

    /// Cut a full splash canvas into key faces, in key order.
    pub fn split(
        &self,
        canvas: &RasterBuffer,
    ) -> Vec<RasterBuffer> {
        (0..self.key_count())
            .filter_map(|index| self.tile(index))
            .map(|area| canvas.crop(&area))
            .collect()
    }
}

// =============================================================================
// Loaded Images
// =============================================================================

/// Decoded RGBA image, row-major, 4 bytes per pixel.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl RasterImage {
    /// Wrap decoded pixels. Returns `None` if the byte count does not match.
    pub fn from_rgba(
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Option<Self> {
        if width == 0 || height == 0 || rgba.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self { width, height, rgba })
    }

    /// Image size in pixels.
    #[inline]
    pub const fn size(&self) -> Size { Size::new(self.width, self.height) }

    #[inline]
    fn rgba_at(
        &self,
        x: u32,
        y: u32,
    ) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [self.rgba[idx], self.rgba[idx + 1], self.rgba[idx + 2], self.rgba[idx + 3]]
    }

    /// Largest size with this image's aspect ratio that fits in `bounds`.
    pub fn fit_within(
        &self,
        bounds: Size,
    ) -> Size {
        if bounds.width == 0 || bounds.height == 0 {
            return Size::zero();
        }
        // Compare aspect ratios with integer cross-multiplication.
        let wide = u64::from(self.width) * u64::from(bounds.height) > u64::from(bounds.width) * u64::from(self.height);
        if wide {
            let h = u64::from(bounds.width) * u64::from(self.height) / u64::from(self.width);
            Size::new(bounds.width, (h as u32).max(1))
        } else {
            let w = u64::from(bounds.height) * u64::from(self.width) / u64::from(self.height);
            Size::new((w as u32).max(1), bounds.height)
        }
    }
}

// =============================================================================
// Canvas
// =============================================================================

/// Owned RGB888 canvas.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RasterBuffer {
    size: Size,
    pixels: Vec<Rgb888>,
}

impl RasterBuffer {
    /// Create a canvas filled with one colour.
    pub fn new(
        size: Size,
        fill: Rgb888,
    ) -> Self {
        Self {
            size,
            pixels: vec![fill; size.width as usize * size.height as usize],
        }
    }

    /// Read one pixel. Returns `None` outside the canvas.
    pub fn pixel(
        &self,
        x: u32,
        y: u32,
    ) -> Option<Rgb888> {
        if x < self.size.width && y < self.size.height {
            Some(self.pixels[y as usize * self.size.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[Rgb888] { &self.pixels }

    /// Packed `R, G, B` bytes, row-major, as most device protocols expect.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| [c.r(), c.g(), c.b()]).collect()
    }

    #[inline]
    fn set_pixel(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb888,
    ) {
        if x >= 0 && y >= 0 && (x as u32) < self.size.width && (y as u32) < self.size.height {
            let idx = y as usize * self.size.width as usize + x as usize;
            self.pixels[idx] = color;
        }
    }

    /// Darken every pixel, keeping `keep` out of 256 of each channel.
    pub fn dim(
        &mut self,
        keep: u16,
    ) {
        for pixel in &mut self.pixels {
            *pixel = darken(*pixel, keep);
        }
    }

    /// Copy out a rectangular region. Parts outside the canvas come back black.
    pub fn crop(
        &self,
        area: &Rectangle,
    ) -> Self {
        let mut out = Self::new(area.size, Rgb888::BLACK);
        for y in 0..area.size.height {
            for x in 0..area.size.width {
                let src_x = area.top_left.x + x as i32;
                let src_y = area.top_left.y + y as i32;
                if src_x >= 0
                    && src_y >= 0
                    && let Some(color) = self.pixel(src_x as u32, src_y as u32)
                {
                    out.set_pixel(x as i32, y as i32, color);
                }
            }
        }
        out
    }

    /// Draw `image` scaled to fit inside `area`, centered, keeping its aspect ratio.
    ///
    /// Nearest-neighbour sampling; the alpha channel blends over what is already
    /// on the canvas.
    pub fn blit_fit(
        &mut self,
        image: &RasterImage,
        area: &Rectangle,
    ) {
        let target = image.fit_within(area.size);
        if target == Size::zero() {
            return;
        }
        let offset_x = area.top_left.x + ((area.size.width - target.width) / 2) as i32;
        let offset_y = area.top_left.y + ((area.size.height - target.height) / 2) as i32;

        for ty in 0..target.height {
            let sy = (u64::from(ty) * u64::from(image.height) / u64::from(target.height)) as u32;
            for tx in 0..target.width {
                let sx = (u64::from(tx) * u64::from(image.width) / u64::from(target.width)) as u32;
                let [r, g, b, a] = image.rgba_at(sx, sy);
                let (dx, dy) = (offset_x + tx as i32, offset_y + ty as i32);
                let color = match a {
                    0 => continue,
                    255 => Rgb888::new(r, g, b),
                    _ => {
                        let Some(under) = (dx >= 0 && dy >= 0)
                            .then(|| self.pixel(dx as u32, dy as u32))
                            .flatten()
                        else {
                            continue;
                        };
                        blend(under, Rgb888::new(r, g, b), a)
                    }
                };
                self.set_pixel(dx, dy, color);
            }
        }
    }
}

/// Alpha-blend `over` onto `under` with 8-bit alpha.
fn blend(
    under: Rgb888,
    over: Rgb888,
    alpha: u8,
) -> Rgb888 {
    let a = u16::from(alpha);
    let mix = |u: u8, o: u8| ((u16::from(o) * a + u16::from(u) * (255 - a)) / 255) as u8;
    Rgb888::new(mix(under.r(), over.r()), mix(under.g(), over.g()), mix(under.b(), over.b()))
}

impl OriginDimensions for RasterBuffer {
    fn size(&self) -> Size { self.size }
}

impl DrawTarget for RasterBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let drawable_area = area.intersection(&self.bounding_box());
        if drawable_area.size == Size::zero() {
            return Ok(());
        }

        let width = self.size.width as usize;
        let x_start = drawable_area.top_left.x as usize;
        let x_end = x_start + drawable_area.size.width as usize;
        for y in drawable_area.rows() {
            let row_start = y as usize * width;
            self.pixels[row_start + x_start..row_start + x_end].fill(color);
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
