//! Common types and logic for HalDeck.
//!
//! This crate contains everything about a deck panel that does not touch a
//! signal bus, a USB device or the filesystem:
//!
//! - [`config`]: Validated page/key model built from an already-parsed configuration
//! - [`bindings`]: Signal naming (`<prefix>.page.<N>.<alias>.<suffix>`)
//! - [`debounce`]: Redraw gating for float display keys
//! - [`render`]: Key and splash compositing with per-key caching
//! - [`raster`]: Raster buffers, loaded images and panel geometry
//! - [`colors`], [`styles`]: Colour names and label fonts
//! - [`format`]: Float label templates (`{:.2f}` style)
//! - [`keyspec`]: Keyboard key specifications
//! - [`pages`]: Page identifiers and kinds
//! - [`assets`]: Image loading collaborator interface
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` + `alloc` so the same model and renderer can back a
//! microcontroller macropad. Time is passed in as [`core::time::Duration`]
//! offsets from an arbitrary epoch rather than read from a clock.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

pub mod assets;
pub mod bindings;
pub mod colors;
pub mod config;
pub mod debounce;
pub mod format;
pub mod keyspec;
pub mod pages;
pub mod raster;
pub mod render;
pub mod styles;

// Re-export commonly used items
pub use assets::{AssetError, AssetSource};
pub use config::{ConfigError, ConfigModel, Key, Page};
pub use pages::{PageId, PageKind};
pub use raster::{PanelLayout, RasterBuffer, RasterImage};
pub use render::{Composite, KeyInputs, RenderEngine};
