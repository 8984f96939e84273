//! Image loading collaborator.
//!
//! The renderer never touches the filesystem: it asks an [`AssetSource`] for an
//! image by the name given in configuration and falls back to background and
//! label when the asset is missing or unreadable.

use alloc::string::String;

use thiserror::Error;

use crate::raster::RasterImage;

/// Asset loading failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("asset `{0}` not found")]
    NotFound(String),
    #[error("asset `{name}` could not be decoded: {reason}")]
    Decode { name: String, reason: String },
}

/// Source of raster images referenced by key and splash configuration.
pub trait AssetSource {
    /// Load an image by its configured name.
    fn load(
        &mut self,
        name: &str,
    ) -> Result<RasterImage, AssetError>;
}
