//! Key face and splash compositing.
//!
//! [`RenderEngine`] turns a [`Key`] plus its current observable inputs into a
//! [`RasterBuffer`]. Each physical key on each page keeps its last composite
//! together with the inputs that produced it; when the next request carries the
//! same inputs the cached buffer is returned as-is and nothing is redrawn or
//! loaded. Leaving a page does not drop its entries, so re-entering an
//! unchanged page is served entirely from the cache.
//!
//! # Face Layers (bottom to top)
//!
//! 1. Image (on black, inset by `ImageMargins`) or the face background
//! 2. Label, when there is no image or `DrawLabelOnImage` is set
//! 3. Highlight frame, when the key's `in` signal is true
//! 4. 70 % black veil, when the key's `enable` signal is false
//!
//! Missing or broken images fall back to background and label, and each file
//! name is reported once.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle, StrokeAlignment};
use embedded_graphics::text::Text;

use crate::assets::AssetSource;
use crate::colors::{BLACK, HIGHLIGHT};
use crate::config::{Artwork, Face, Key, KeyKind, SplashPage};
use crate::format::PLACEHOLDER;
use crate::pages::PageId;
use crate::raster::{PanelLayout, RasterBuffer, RasterImage};
use crate::styles::{CENTERED, label_font};

/// Share of each channel kept when a key is disabled (30 % of 256).
const DISABLED_KEEP: u16 = 77;

/// Highlight frame thickness in pixels.
const HIGHLIGHT_WIDTH: u32 = 4;

/// Everything about a key that can change what it looks like.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct KeyInputs {
    /// Pressed state (`out` for momentary keys, physical hold for keyboard keys).
    pub active: bool,
    /// `in` signal.
    pub highlighted: bool,
    /// `enable` signal, `true` when the key has none.
    pub enabled: bool,
    /// Accepted display value, `None` until the first valid reading.
    pub value: Option<f64>,
}

impl Default for KeyInputs {
    fn default() -> Self {
        Self {
            active: false,
            highlighted: false,
            enabled: true,
            value: None,
        }
    }
}

/// Result of a composite request.
#[derive(Debug)]
pub struct Composite<'a> {
    pub image: &'a RasterBuffer,
    /// `false` when the cached buffer was reused.
    pub changed: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
struct CacheKey {
    kind: KeyKind,
    active: bool,
    bucket: Option<i64>,
    label: String,
    highlighted: bool,
    enabled: bool,
}

#[derive(Debug)]
struct CacheEntry {
    key: CacheKey,
    buffer: RasterBuffer,
}

/// What a key face resolves to for one set of inputs.
struct Resolved<'k> {
    face: Face,
    image: Option<&'k str>,
    artwork: Option<&'k Artwork>,
}

/// Compositor with per-key and per-splash caches.
pub struct RenderEngine {
    assets: Box<dyn AssetSource>,
    layout: PanelLayout,
    /// Loaded images by name; `None` records a failed load.
    images: BTreeMap<String, Option<RasterImage>>,
    keys: BTreeMap<(PageId, usize), CacheEntry>,
    splashes: BTreeMap<PageId, RasterBuffer>,
    renders: u64,
}

impl RenderEngine {
    pub fn new(
        assets: Box<dyn AssetSource>,
        layout: PanelLayout,
    ) -> Self {
        Self {
            assets,
            layout,
            images: BTreeMap::new(),
            keys: BTreeMap::new(),
            splashes: BTreeMap::new(),
            renders: 0,
        }
    }

    #[inline]
    pub fn layout(&self) -> PanelLayout { self.layout }

    /// Number of faces actually drawn so far (cache hits excluded).
    #[inline]
    pub fn render_count(&self) -> u64 { self.renders }

    /// Composite key `index` of `page`.
    pub fn composite(
        &mut self,
        page: PageId,
        index: usize,
        key: &Key,
        inputs: &KeyInputs,
    ) -> Composite<'_> {
        let resolved = resolve(key, inputs);
        let cache_key = CacheKey {
            kind: key.kind(),
            active: inputs.active,
            bucket: bucket(key, inputs),
            label: resolved.face.label.clone(),
            highlighted: inputs.highlighted,
            enabled: inputs.enabled,
        };

        let hit = self
            .keys
            .get(&(page, index))
            .is_some_and(|entry| entry.key == cache_key);
        if !hit {
            let buffer = self.draw_key(&resolved, inputs);
            self.keys.insert(
                (page, index),
                CacheEntry {
                    key: cache_key,
                    buffer,
                },
            );
        }

        // Present in both branches: inserted above or matched as a hit.
        let entry = &self.keys[&(page, index)];
        Composite {
            image: &entry.buffer,
            changed: !hit,
        }
    }

    /// Full panel canvas (bezels included) for a splash page.
    pub fn composite_splash(
        &mut self,
        page: PageId,
        splash: &SplashPage,
    ) -> &RasterBuffer {
        if !self.splashes.contains_key(&page) {
            let mut canvas = RasterBuffer::new(self.layout.canvas_size(), splash.background);
            let area = canvas.bounding_box();
            if let Some(image) = self.image(&splash.image) {
                canvas.blit_fit(image, &area);
            }
            self.renders += 1;
            tracing::debug!("splash page {} composited", page);
            self.splashes.insert(page, canvas);
        }
        &self.splashes[&page]
    }

    /// Load an image once; failures are remembered and reported once.
    fn image(
        &mut self,
        name: &str,
    ) -> Option<&RasterImage> {
        if !self.images.contains_key(name) {
            let loaded = match self.assets.load(name) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!("{}; drawing background and label instead", e);
                    None
                }
            };
            self.images.insert(name.into(), loaded);
        }
        self.images.get(name).and_then(Option::as_ref)
    }

    fn draw_key(
        &mut self,
        resolved: &Resolved<'_>,
        inputs: &KeyInputs,
    ) -> RasterBuffer {
        self.renders += 1;
        let size = self.layout.key_size;
        let face = &resolved.face;
        let mut canvas = RasterBuffer::new(size, face.background);

        let mut has_image = false;
        if let (Some(name), Some(artwork)) = (resolved.image, resolved.artwork)
            && let Some(image) = self.image(name)
        {
            canvas.clear(BLACK).ok();
            let m = artwork.margins;
            let inset = Rectangle::new(
                Point::new(m.left as i32, m.top as i32),
                Size::new(
                    size.width.saturating_sub(m.left + m.right),
                    size.height.saturating_sub(m.top + m.bottom),
                ),
            );
            canvas.blit_fit(image, &inset);
            has_image = true;
        }

        if let Some(artwork) = resolved.artwork
            && (!has_image || artwork.draw_label_on_image)
        {
            draw_label(&mut canvas, &face.label, face.label_color, artwork.font_size);
        }

        if inputs.highlighted {
            let frame = PrimitiveStyleBuilder::new()
                .stroke_color(HIGHLIGHT)
                .stroke_width(HIGHLIGHT_WIDTH)
                .stroke_alignment(StrokeAlignment::Inside)
                .build();
            canvas.bounding_box().into_styled(frame).draw(&mut canvas).ok();
        }

        if !inputs.enabled {
            canvas.dim(DISABLED_KEEP);
        }
        canvas
    }
}

/// Pick face, image and label for the key's current state.
fn resolve<'k>(
    key: &'k Key,
    inputs: &KeyInputs,
) -> Resolved<'k> {
    match key {
        Key::Momentary(m) => Resolved {
            face: if inputs.active { m.active.clone() } else { m.inactive.clone() },
            image: m.artwork.images.for_state(inputs.active),
            artwork: Some(&m.artwork),
        },
        Key::Keyboard(k) => Resolved {
            face: if inputs.active { k.active.clone() } else { k.inactive.clone() },
            image: k.artwork.images.for_state(inputs.active),
            artwork: Some(&k.artwork),
        },
        Key::DisplayFloat(d) => {
            let label = match inputs.value {
                Some(value) => d.format.render(value, d.decimal_comma).as_str().into(),
                None => PLACEHOLDER.into(),
            };
            Resolved {
                face: Face {
                    background: d.background,
                    label,
                    label_color: d.label_color,
                },
                image: d.artwork.images.for_state(false),
                artwork: Some(&d.artwork),
            }
        }
        Key::Unused => Resolved {
            face: Face {
                background: BLACK,
                label: String::new(),
                label_color: BLACK,
            },
            image: None,
            artwork: None,
        },
    }
}

/// Display value quantised by the key's `MinStep`.
fn bucket(
    key: &Key,
    inputs: &KeyInputs,
) -> Option<i64> {
    match (key, inputs.value) {
        (Key::DisplayFloat(d), Some(value)) => Some(round(value / d.min_step)),
        _ => None,
    }
}

/// Round half away from zero without `std`.
fn round(x: f64) -> i64 {
    if x >= 0.0 {
        (x + 0.5) as i64
    } else {
        (x - 0.5) as i64
    }
}

/// Centered, possibly multi-line label.
fn draw_label(
    canvas: &mut RasterBuffer,
    label: &str,
    color: Rgb888,
    font_size: u32,
) {
    if label.is_empty() {
        return;
    }
    let font = label_font(font_size);
    let lines = label.lines().count().max(1) as i32;
    let line_height = font.character_size.height as i32;
    let center = canvas.bounding_box().center();
    // First line sits above center so the block as a whole is centered.
    let origin = Point::new(center.x, center.y - (lines - 1) * line_height / 2);
    Text::with_text_style(label, origin, MonoTextStyle::new(font, color), CENTERED)
        .draw(canvas)
        .ok();
}

// =============================================================================
// Unit Tests
// =============================================================================
