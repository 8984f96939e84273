//! Deck device boundary.
//!
//! The panel talks to hardware only through [`Deck`]: key images, splash
//! canvases, brightness and link maintenance go in; press/release and link
//! notifications come back as [`DeckEvent`]s through the event channel in
//! [`tasks`](crate::tasks).
//!
//! - [`snapshot`]: Headless deck that mirrors the panel into a PNG file

pub mod snapshot;

use clap::ValueEnum;
use embedded_graphics::prelude::Size;
use haldeck_common::{PanelLayout, RasterBuffer};
use thiserror::Error;

pub use self::snapshot::SnapshotDeck;

/// Notifications from the device side.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeckEvent {
    Pressed(usize),
    Released(usize),
    /// The transport went away.
    Disconnected,
    /// The transport came back on its own.
    Reconnected,
}

/// Device failures.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("deck disconnected")]
    Disconnected,
    #[error("key {0} does not exist on this deck")]
    NoSuchKey(usize),
    #[error("image is {actual:?}, deck expects {expected:?}")]
    ImageSize { expected: Size, actual: Size },
    #[error("deck I/O: {0}")]
    Io(String),
}

/// A key panel device.
pub trait Deck {
    /// Key grid and pixel geometry.
    fn layout(&self) -> PanelLayout;

    /// Replace one key face. `image` is exactly one key in size.
    fn set_key_image(
        &mut self,
        index: usize,
        image: &RasterBuffer,
    ) -> Result<(), DeckError>;

    /// Show a full panel canvas (bezel gaps included) across all keys.
    fn set_full_image(
        &mut self,
        canvas: &RasterBuffer,
    ) -> Result<(), DeckError>;

    fn set_brightness(
        &mut self,
        percent: u8,
    ) -> Result<(), DeckError>;

    /// Try to re-open the transport after a disconnect.
    fn reconnect(&mut self) -> Result<(), DeckError>;

    /// Cheap query that keeps the USB link from suspending.
    fn keepalive(&mut self) -> Result<(), DeckError>;

    /// Make everything sent since the last flush visible.
    fn flush(&mut self) -> Result<(), DeckError>;

    /// Blank the panel before the daemon exits.
    fn reset(&mut self) -> Result<(), DeckError>;
}

/// Supported deck models.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum DeckModel {
    /// 2 x 3 keys, 80 px.
    Mini,
    /// 3 x 5 keys, 72 px.
    #[default]
    Original,
    /// 4 x 8 keys, 96 px.
    Xl,
}

/// Bezel gap between keys, as measured on the original deck.
const KEY_SPACING: Size = Size::new(12, 12);

impl DeckModel {
    pub const fn layout(self) -> PanelLayout {
        let (rows, cols, px) = match self {
            Self::Mini => (2, 3, 80),
            Self::Original => (3, 5, 72),
            Self::Xl => (4, 8, 96),
        };
        PanelLayout {
            rows,
            cols,
            key_size: Size::new(px, px),
            spacing: KEY_SPACING,
        }
    }
}
