//! Label fonts and text styles for key faces.
//!
//! Labels use ProFont, which ships at a fixed set of point sizes. A configured
//! `FontSize` maps to the largest ProFont size that does not exceed it, so a
//! label never grows past what the user asked for.

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::text::{Alignment, Baseline, TextStyle, TextStyleBuilder};
use profont::{
    PROFONT_7_POINT,
    PROFONT_9_POINT,
    PROFONT_10_POINT,
    PROFONT_12_POINT,
    PROFONT_14_POINT,
    PROFONT_18_POINT,
    PROFONT_24_POINT,
};

/// Default label size when a key does not set `FontSize`.
pub const DEFAULT_FONT_SIZE: u32 = 14;

/// Centered horizontally and vertically around the anchor point.
pub const CENTERED: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Middle)
    .build();

/// Available label fonts, smallest first.
const FONTS: [(u32, &MonoFont<'static>); 7] = [
    (7, &PROFONT_7_POINT),
    (9, &PROFONT_9_POINT),
    (10, &PROFONT_10_POINT),
    (12, &PROFONT_12_POINT),
    (14, &PROFONT_14_POINT),
    (18, &PROFONT_18_POINT),
    (24, &PROFONT_24_POINT),
];

/// Pick the label font for a configured point size.
pub fn label_font(size: u32) -> &'static MonoFont<'static> {
    FONTS
        .iter()
        .rev()
        .find(|(points, _)| *points <= size)
        .map_or(FONTS[0].1, |(_, font)| *font)
}
