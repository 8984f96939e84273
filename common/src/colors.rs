//! Colour constants and colour-name parsing for key faces.
//!
//! Stream Deck keys take 24-bit images, so everything is [`Rgb888`]. Standard
//! colours come from the `RgbColor` trait constants; configuration strings are
//! resolved with [`parse_color`].
//!
//! ## Accepted Spellings
//!
//! - Named colours (case-insensitive): `white`, `black`, `red`, `green`, ...
//! - `#rgb` shorthand, each digit doubled (`#f80` → `#ff8800`)
//! - `#rrggbb`

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

// =============================================================================
// Standard Colors (from RgbColor trait)
// =============================================================================

/// Pure black. Unused keys and image letterboxing.
pub const BLACK: Rgb888 = Rgb888::BLACK;

/// Pure white. Default inactive label colour.
pub const WHITE: Rgb888 = Rgb888::WHITE;

/// Pure red.
pub const RED: Rgb888 = Rgb888::RED;

/// Pure yellow.
pub const YELLOW: Rgb888 = Rgb888::YELLOW;

// =============================================================================
// Custom Colors (application-specific)
// =============================================================================

/// Highlight frame drawn when a Momentary key's `in` signal is true.
pub const HIGHLIGHT: Rgb888 = Rgb888::new(255, 140, 0);

/// Colour-name table. Matches the names PIL accepts for the common cases.
const NAMED: &[(&str, Rgb888)] = &[
    ("black", BLACK),
    ("white", WHITE),
    ("red", RED),
    ("green", Rgb888::new(0, 128, 0)),
    ("lime", Rgb888::new(0, 255, 0)),
    ("blue", Rgb888::BLUE),
    ("navy", Rgb888::new(0, 0, 128)),
    ("yellow", YELLOW),
    ("orange", Rgb888::new(255, 165, 0)),
    ("gray", Rgb888::new(128, 128, 128)),
    ("grey", Rgb888::new(128, 128, 128)),
    ("darkgray", Rgb888::new(169, 169, 169)),
    ("darkgrey", Rgb888::new(169, 169, 169)),
    ("silver", Rgb888::new(192, 192, 192)),
    ("cyan", Rgb888::CYAN),
    ("teal", Rgb888::new(0, 128, 128)),
    ("magenta", Rgb888::MAGENTA),
    ("purple", Rgb888::new(128, 0, 128)),
    ("pink", Rgb888::new(255, 192, 203)),
    ("brown", Rgb888::new(165, 42, 42)),
    ("maroon", Rgb888::new(128, 0, 0)),
    ("olive", Rgb888::new(128, 128, 0)),
];

/// Resolve a colour name or hex string. Returns `None` for anything unknown.
pub fn parse_color(text: &str) -> Option<Rgb888> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }
    NAMED
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(text))
        .map(|(_, color)| *color)
}

fn parse_hex(hex: &str) -> Option<Rgb888> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut channels = [0u8; 3];
            for (slot, digit) in channels.iter_mut().zip(hex.chars()) {
                let v = digit.to_digit(16)? as u8;
                *slot = v * 16 + v;
            }
            Some(Rgb888::new(channels[0], channels[1], channels[2]))
        }
        6 => {
            let value = u32::from_str_radix(hex, 16).ok()?;
            Some(Rgb888::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
        }
        _ => None,
    }
}

/// Scale a colour toward black, keeping `keep` out of 256 of each channel.
#[inline]
pub fn darken(
    color: Rgb888,
    keep: u16,
) -> Rgb888 {
    let scale = |c: u8| ((u16::from(c) * keep) >> 8) as u8;
    Rgb888::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors_case_insensitive() {
        assert_eq!(parse_color("White"), Some(WHITE));
        assert_eq!(parse_color(" black "), Some(BLACK));
        assert_eq!(parse_color("GREY"), parse_color("gray"));
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_color("#ff8800"), Some(Rgb888::new(255, 136, 0)));
        assert_eq!(parse_color("#f80"), Some(Rgb888::new(255, 136, 0)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn test_unknown_color() {
        assert_eq!(parse_color("ultraviolet"), None);
    }

    #[test]
    fn test_darken() {
        assert_eq!(darken(WHITE, 0), BLACK);
        assert_eq!(darken(WHITE, 256), WHITE);
        let dimmed = darken(WHITE, 77);
        assert_eq!(dimmed.r(), 76);
    }
}
