//! Image files from disk.

use std::io;
use std::path::{Path, PathBuf};

use haldeck_common::{AssetError, AssetSource, RasterImage};

/// Loads PNG, JPEG and BMP files with the `image` crate.
///
/// Absolute names are used as given, relative ones are looked up under the
/// assets directory.
#[derive(Clone, Debug)]
pub struct FileAssets {
    root: PathBuf,
}

impl FileAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    #[inline]
    pub fn root(&self) -> &Path { &self.root }

    pub fn path_of(
        &self,
        name: &str,
    ) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() { path.to_path_buf() } else { self.root.join(path) }
    }
}

impl AssetSource for FileAssets {
    fn load(
        &mut self,
        name: &str,
    ) -> Result<RasterImage, AssetError> {
        let path = self.path_of(name);
        let decoded = image::open(&path).map_err(|e| match e {
            image::ImageError::IoError(err) if err.kind() == io::ErrorKind::NotFound => {
                AssetError::NotFound(path.display().to_string())
            }
            other => AssetError::Decode {
                name: path.display().to_string(),
                reason: other.to_string(),
            },
        })?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        tracing::debug!("loaded {} ({}x{})", path.display(), width, height);
        RasterImage::from_rgba(width, height, rgba.into_raw()).ok_or_else(|| AssetError::Decode {
            name: path.display().to_string(),
            reason: "empty image".into(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::fs;

    use embedded_graphics::prelude::Size;

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("haldeck-assets-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_relative_and_absolute_paths() {
        let assets = FileAssets::new("/srv/deck");
        assert_eq!(assets.path_of("estop.png"), Path::new("/srv/deck/estop.png"));
        assert_eq!(assets.path_of("/opt/logo.png"), Path::new("/opt/logo.png"));
    }

    #[test]
    fn test_loads_png() {
        let dir = scratch("png");
        let mut img = image::RgbaImage::new(3, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.save(dir.join("red.png")).unwrap();

        let mut assets = FileAssets::new(&dir);
        let loaded = assets.load("red.png").unwrap();
        assert_eq!(loaded.size(), Size::new(3, 2));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_and_broken_files() {
        let dir = scratch("broken");
        fs::write(dir.join("junk.png"), b"not a png").unwrap();
        let mut assets = FileAssets::new(&dir);
        assert!(matches!(assets.load("absent.png"), Err(AssetError::NotFound(_))));
        assert!(matches!(assets.load("junk.png"), Err(AssetError::Decode { .. })));
        fs::remove_dir_all(dir).ok();
    }
}
