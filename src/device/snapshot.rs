//! Headless deck backed by an `embedded-graphics-simulator` display.
//!
//! The display has the size of the whole panel including the bezel gaps, so
//! a saved snapshot looks like the physical deck. Key faces are drawn at their
//! tile position; on every flush that changed something the display is
//! written to the snapshot file as PNG, if one was given.
//!
//! The link state is a shared flag so that the console can simulate pulling
//! the USB cable: while it is cleared every operation fails with
//! [`DeckError::Disconnected`].

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettings, SimulatorDisplay};
use haldeck_common::{PanelLayout, RasterBuffer};

use super::{Deck, DeckError};

pub struct SnapshotDeck {
    layout: PanelLayout,
    display: SimulatorDisplay<Rgb888>,
    output: Option<PathBuf>,
    connected: Arc<AtomicBool>,
    brightness: u8,
    dirty: bool,
}

impl SnapshotDeck {
    pub fn new(
        layout: PanelLayout,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            layout,
            display: SimulatorDisplay::new(layout.canvas_size()),
            output,
            connected: Arc::new(AtomicBool::new(true)),
            brightness: 100,
            dirty: false,
        }
    }

    /// Shared link flag; clear it to simulate an unplugged deck.
    pub fn link(&self) -> Arc<AtomicBool> { Arc::clone(&self.connected) }

    #[inline]
    pub fn brightness(&self) -> u8 { self.brightness }

    /// Current colour of a panel pixel.
    pub fn pixel(
        &self,
        point: Point,
    ) -> Rgb888 {
        self.display.get_pixel(point)
    }

    fn ensure_connected(&self) -> Result<(), DeckError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(DeckError::Disconnected)
        }
    }

    fn draw_tile(
        &mut self,
        index: usize,
        image: &RasterBuffer,
    ) -> Result<(), DeckError> {
        let area = self.layout.tile(index).ok_or(DeckError::NoSuchKey(index))?;
        if image.size() != area.size {
            return Err(DeckError::ImageSize {
                expected: area.size,
                actual: image.size(),
            });
        }
        self.display
            .fill_contiguous(&area, image.pixels().iter().copied())
            .ok();
        self.dirty = true;
        Ok(())
    }
}

impl Deck for SnapshotDeck {
    fn layout(&self) -> PanelLayout { self.layout }

    fn set_key_image(
        &mut self,
        index: usize,
        image: &RasterBuffer,
    ) -> Result<(), DeckError> {
        self.ensure_connected()?;
        self.draw_tile(index, image)
    }

    fn set_full_image(
        &mut self,
        canvas: &RasterBuffer,
    ) -> Result<(), DeckError> {
        self.ensure_connected()?;
        for (index, tile) in self.layout.split(canvas).iter().enumerate() {
            self.draw_tile(index, tile)?;
        }
        Ok(())
    }

    fn set_brightness(
        &mut self,
        percent: u8,
    ) -> Result<(), DeckError> {
        self.ensure_connected()?;
        self.brightness = percent.min(100);
        tracing::debug!("brightness {}%", self.brightness);
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), DeckError> { self.ensure_connected() }

    fn keepalive(&mut self) -> Result<(), DeckError> { self.ensure_connected() }

    fn flush(&mut self) -> Result<(), DeckError> {
        self.ensure_connected()?;
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;
        let Some(path) = &self.output else {
            return Ok(());
        };
        self.display
            .to_rgb_output_image(&OutputSettings::default())
            .save_png(path)
            .map_err(|e| DeckError::Io(format!("{}: {e}", path.display())))
    }

    fn reset(&mut self) -> Result<(), DeckError> {
        self.display.clear(Rgb888::BLACK).ok();
        self.dirty = true;
        self.flush()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
