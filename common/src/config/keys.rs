//! Key variants and their validation.
//!
//! | `Type`          | Variant                 | Signals                          |
//! |-----------------|-------------------------|----------------------------------|
//! | `momentary`     | [`Key::Momentary`]      | `out`, `in`, optional `enable`   |
//! | `keyboard`      | [`Key::Keyboard`]       | none                             |
//! | `display-float` | [`Key::DisplayFloat`]   | optional `value`                 |
//! | `unused`/absent | [`Key::Unused`]         | none                             |

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;

use embedded_graphics::pixelcolor::Rgb888;

use super::ConfigError;
use super::fields::Fields;
use super::raw::RawSection;
use crate::bindings::{Suffix, default_alias};
use crate::colors::{BLACK, WHITE};
use crate::debounce::{DEFAULT_MIN_INTERVAL, DEFAULT_MIN_STEP};
use crate::format::FloatFormat;
use crate::keyspec::KeySpec;
use crate::styles::DEFAULT_FONT_SIZE;

/// Largest accepted `FontSize`.
const MAX_FONT_SIZE: i64 = 96;

/// Colours and text for one visual state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Face {
    pub background: Rgb888,
    pub label: String,
    pub label_color: Rgb888,
}

/// Space kept free around a key image, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageMargins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl ImageMargins {
    /// Parse `top,right,bottom,left`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(',').map(|p| p.trim().parse::<u32>());
        let margins = Self {
            top: parts.next()?.ok()?,
            right: parts.next()?.ok()?,
            bottom: parts.next()?.ok()?,
            left: parts.next()?.ok()?,
        };
        parts.next().is_none().then_some(margins)
    }
}

/// Images configured for a key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyImages {
    #[default]
    None,
    /// Same image in both states.
    Single(String),
    /// `InactiveImage` + `ActiveImage`.
    Pair { inactive: String, active: String },
}

impl KeyImages {
    /// Image for the given state, if any.
    pub fn for_state(
        &self,
        active: bool,
    ) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Single(name) => Some(name),
            Self::Pair { inactive, active: on } => Some(if active { on } else { inactive }),
        }
    }
}

/// Image and label placement shared by every drawn variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artwork {
    pub images: KeyImages,
    pub margins: ImageMargins,
    pub draw_label_on_image: bool,
    pub font_size: u32,
}

/// Push button mirrored on `out`, highlighted by `in`, optionally gated by `enable`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MomentaryKey {
    pub alias: String,
    pub inactive: Face,
    pub active: Face,
    pub artwork: Artwork,
    pub enable_pin: bool,
}

/// Key that taps a keyboard key on press.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardKey {
    pub key: KeySpec,
    pub inactive: Face,
    pub active: Face,
    pub artwork: Artwork,
}

/// Read-only numeric display fed by the `value` signal.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayFloatKey {
    pub alias: String,
    pub float_pin: bool,
    pub format: FloatFormat,
    pub decimal_comma: bool,
    pub min_step: f64,
    pub min_interval: Duration,
    pub background: Rgb888,
    pub label_color: Rgb888,
    pub artwork: Artwork,
}

/// A validated key. Exactly one variant per physical key and page.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Key {
    Momentary(MomentaryKey),
    Keyboard(KeyboardKey),
    DisplayFloat(DisplayFloatKey),
    #[default]
    Unused,
}

/// Variant discriminant, used in render cache keys and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Momentary,
    Keyboard,
    DisplayFloat,
    Unused,
}

impl Key {
    pub const fn kind(&self) -> KeyKind {
        match self {
            Self::Momentary(_) => KeyKind::Momentary,
            Self::Keyboard(_) => KeyKind::Keyboard,
            Self::DisplayFloat(_) => KeyKind::DisplayFloat,
            Self::Unused => KeyKind::Unused,
        }
    }

    /// Signal alias, for variants that have one.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Momentary(key) => Some(&key.alias),
            Self::DisplayFloat(key) => Some(&key.alias),
            Self::Keyboard(_) | Self::Unused => None,
        }
    }

    /// Signals this key needs, in registration order.
    pub fn suffixes(&self) -> Vec<Suffix> {
        match self {
            Self::Momentary(key) if key.enable_pin => Vec::from([Suffix::Out, Suffix::In, Suffix::Enable]),
            Self::Momentary(_) => Vec::from([Suffix::Out, Suffix::In]),
            Self::DisplayFloat(key) if key.float_pin => Vec::from([Suffix::Value]),
            _ => Vec::new(),
        }
    }

    /// Validate one key section. `index` is the physical key index.
    pub fn from_section(
        section: &RawSection,
        index: usize,
    ) -> Result<Self, ConfigError> {
        let mut fields = Fields::new(section)?;
        let kind = fields.raw("Type").map(str::trim).unwrap_or("unused");
        let key = match kind.to_ascii_lowercase().as_str() {
            "momentary" => Self::Momentary(momentary(&mut fields, index)?),
            "keyboard" => Self::Keyboard(keyboard(&mut fields, index)?),
            "display-float" => Self::DisplayFloat(display_float(&mut fields, index)?),
            "unused" => Self::Unused,
            _ => {
                return Err(ConfigError::UnknownKeyType {
                    section: section.name().into(),
                    value: kind.into(),
                });
            }
        };
        fields.finish()?;
        Ok(key)
    }
}

// =============================================================================
// Variant Builders
// =============================================================================

fn alias(
    fields: &mut Fields<'_>,
    index: usize,
) -> Result<String, ConfigError> {
    let Some(alias) = fields.string("PinAlias") else {
        return Ok(default_alias(index));
    };
    let valid = !alias.is_empty()
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
    if valid {
        Ok(alias)
    } else {
        Err(fields.invalid("PinAlias", &alias, "expected letters, digits, `_` or `-`"))
    }
}

fn faces(
    fields: &mut Fields<'_>,
    index: usize,
) -> Result<(Face, Face), ConfigError> {
    let inactive = Face {
        label: fields.label("InactiveLabel", || format!("{index}.OFF")),
        label_color: fields.color("InactiveLabelColor", WHITE)?,
        background: fields.color("InactiveBackground", BLACK)?,
    };
    let active = Face {
        label: fields.label("ActiveLabel", || format!("{index}.ON")),
        label_color: fields.color("ActiveLabelColor", BLACK)?,
        background: fields.color("ActiveBackground", WHITE)?,
    };
    Ok((inactive, active))
}

fn artwork(
    fields: &mut Fields<'_>,
    allow_pair: bool,
) -> Result<Artwork, ConfigError> {
    let single = fields.string("Image");
    let (inactive, active) = if allow_pair {
        (fields.string("InactiveImage"), fields.string("ActiveImage"))
    } else {
        (None, None)
    };
    let section = || fields.section().into();
    let images = match (single, inactive, active) {
        (None, None, None) => KeyImages::None,
        (Some(name), None, None) => KeyImages::Single(name),
        (None, Some(inactive), Some(active)) => KeyImages::Pair { inactive, active },
        (Some(_), _, _) => return Err(ConfigError::ConflictingImages { section: section() }),
        (None, _, _) => return Err(ConfigError::IncompleteImagePair { section: section() }),
    };

    let margins = match fields.raw("ImageMargins") {
        Some(text) => ImageMargins::parse(text)
            .ok_or_else(|| fields.invalid("ImageMargins", text, "expected `top,right,bottom,left`"))?,
        None => ImageMargins::default(),
    };

    Ok(Artwork {
        images,
        margins,
        draw_label_on_image: fields.bool("DrawLabelOnImage", false)?,
        font_size: fields.integer("FontSize", 1..=MAX_FONT_SIZE, i64::from(DEFAULT_FONT_SIZE))? as u32,
    })
}

fn momentary(
    fields: &mut Fields<'_>,
    index: usize,
) -> Result<MomentaryKey, ConfigError> {
    let alias = alias(fields, index)?;
    let (inactive, active) = faces(fields, index)?;
    Ok(MomentaryKey {
        alias,
        inactive,
        active,
        artwork: artwork(fields, true)?,
        enable_pin: fields.bool("EnablePin", false)?,
    })
}

fn keyboard(
    fields: &mut Fields<'_>,
    index: usize,
) -> Result<KeyboardKey, ConfigError> {
    let text = fields.required("KeyboardKey")?;
    let key = text
        .parse::<KeySpec>()
        .map_err(|e| fields.invalid("KeyboardKey", text, e))?;
    let (inactive, active) = faces(fields, index)?;
    Ok(KeyboardKey {
        key,
        inactive,
        active,
        artwork: artwork(fields, false)?,
    })
}

fn display_float(
    fields: &mut Fields<'_>,
    index: usize,
) -> Result<DisplayFloatKey, ConfigError> {
    let alias = alias(fields, index)?;
    let template = fields.required("Format")?;
    let format = FloatFormat::parse(template).map_err(|e| fields.invalid("Format", template, e))?;
    Ok(DisplayFloatKey {
        alias,
        float_pin: fields.bool("FloatPin", false)?,
        format,
        decimal_comma: fields.bool("DecimalComma", true)?,
        min_step: fields.positive("MinStep", DEFAULT_MIN_STEP)?,
        min_interval: fields.seconds("MinInterval", DEFAULT_MIN_INTERVAL)?,
        background: fields.color_any("DisplayBackground", &["DisplayBackground", "InactiveBackground"], WHITE)?,
        label_color: fields.color_any("DisplayLabelColor", &["DisplayLabelColor", "InactiveLabelColor"], BLACK)?,
        artwork: artwork(fields, false)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::pixelcolor::RgbColor;

    use super::*;
    use crate::keyspec::NamedKey;

    fn key(section: RawSection) -> Result<Key, ConfigError> { Key::from_section(&section, 3) }

    #[test]
    fn test_absent_type_is_unused() {
        assert_eq!(key(RawSection::new("key.03")), Ok(Key::Unused));
    }

    #[test]
    fn test_unknown_type() {
        let err = key(RawSection::new("page.2.key.03").with("Type", "toggle")).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownKeyType {
                section: "page.2.key.03".into(),
                value: "toggle".into(),
            }
        );
    }

    #[test]
    fn test_momentary_defaults() {
        let Ok(Key::Momentary(m)) = key(RawSection::new("key.03").with("Type", "momentary")) else {
            panic!("expected momentary key");
        };
        assert_eq!(m.alias, "03");
        assert_eq!(m.inactive.label, "3.OFF");
        assert_eq!(m.active.label, "3.ON");
        assert_eq!(m.inactive.background, Rgb888::BLACK);
        assert_eq!(m.active.label_color, Rgb888::BLACK);
        assert_eq!(m.artwork.font_size, 14);
        assert!(!m.enable_pin);
        assert_eq!(Key::Momentary(m).suffixes(), [Suffix::Out, Suffix::In]);
    }

    #[test]
    fn test_image_rules() {
        let section = || RawSection::new("key.03").with("Type", "momentary");
        let single = key(section().with("Image", "a.png")).unwrap();
        let Key::Momentary(m) = single else { unreachable!() };
        assert_eq!(m.artwork.images.for_state(true), Some("a.png"));

        let pair = key(section().with("InactiveImage", "off.png").with("ActiveImage", "on.png")).unwrap();
        let Key::Momentary(m) = pair else { unreachable!() };
        assert_eq!(m.artwork.images.for_state(false), Some("off.png"));
        assert_eq!(m.artwork.images.for_state(true), Some("on.png"));

        let both = key(section().with("Image", "a.png").with("ActiveImage", "on.png"));
        assert!(matches!(both, Err(ConfigError::ConflictingImages { .. })));
        let half = key(section().with("InactiveImage", "off.png"));
        assert!(matches!(half, Err(ConfigError::IncompleteImagePair { .. })));
    }

    #[test]
    fn test_image_margins() {
        assert_eq!(
            ImageMargins::parse("1, 2,3 ,4"),
            Some(ImageMargins { top: 1, right: 2, bottom: 3, left: 4 })
        );
        assert_eq!(ImageMargins::parse("1,2,3"), None);
        assert_eq!(ImageMargins::parse("1,2,3,4,5"), None);
        let bad = key(RawSection::new("key.03").with("Type", "momentary").with("ImageMargins", "x"));
        assert!(matches!(bad, Err(ConfigError::InvalidValue { field: "ImageMargins", .. })));
    }

    #[test]
    fn test_keyboard_requires_key() {
        let missing = key(RawSection::new("key.03").with("Type", "keyboard"));
        assert_eq!(
            missing,
            Err(ConfigError::MissingField {
                section: "key.03".into(),
                field: "KeyboardKey",
            })
        );
        let Ok(Key::Keyboard(k)) = key(RawSection::new("key.03").with("Type", "keyboard").with("KeyboardKey", "F5"))
        else {
            panic!("expected keyboard key");
        };
        assert_eq!(k.key, KeySpec::Named(NamedKey::Function(5)));
    }

    #[test]
    fn test_inapplicable_fields() {
        let keyboard_alias = key(
            RawSection::new("key.03")
                .with("Type", "keyboard")
                .with("KeyboardKey", "a")
                .with("PinAlias", "x"),
        );
        assert!(matches!(keyboard_alias, Err(ConfigError::UnknownField { .. })));
        let unused_label = key(RawSection::new("key.03").with("InactiveLabel", "x"));
        assert!(matches!(unused_label, Err(ConfigError::UnknownField { .. })));
    }

    #[test]
    fn test_display_float() {
        let section = RawSection::new("key.03")
            .with("Type", "display-float")
            .with("PinAlias", "Xpos")
            .with("FloatPin", "true")
            .with("Format", "{:.3f}")
            .with("MinInterval", "0.25")
            .with("InactiveBackground", "navy");
        let Ok(Key::DisplayFloat(d)) = key(section) else {
            panic!("expected display key");
        };
        assert_eq!(d.alias, "Xpos");
        assert!(d.decimal_comma);
        assert!((d.min_step - 0.01).abs() < f64::EPSILON);
        assert_eq!(d.min_interval, Duration::from_millis(250));
        assert_eq!(d.background, Rgb888::new(0, 0, 128));
        assert_eq!(d.label_color, Rgb888::BLACK);
        assert_eq!(Key::DisplayFloat(d).suffixes(), [Suffix::Value]);
    }

    #[test]
    fn test_min_interval_out_of_range() {
        let huge = key(
            RawSection::new("key.03")
                .with("Type", "display-float")
                .with("Format", "{:.1f}")
                .with("MinInterval", "1e300"),
        );
        assert!(matches!(huge, Err(ConfigError::InvalidValue { field: "MinInterval", ref value, .. }) if value == "1e300"));
    }

    #[test]
    fn test_display_float_requires_format() {
        let missing = key(RawSection::new("key.03").with("Type", "display-float"));
        assert!(matches!(missing, Err(ConfigError::MissingField { field: "Format", .. })));
        let bad = key(RawSection::new("key.03").with("Type", "display-float").with("Format", "{:d}"));
        assert!(matches!(bad, Err(ConfigError::InvalidValue { field: "Format", .. })));
        let zero = key(
            RawSection::new("key.03")
                .with("Type", "display-float")
                .with("Format", "{:.1f}")
                .with("MinStep", "0"),
        );
        assert!(matches!(zero, Err(ConfigError::InvalidValue { field: "MinStep", .. })));
    }

    #[test]
    fn test_alias_characters() {
        let bad = key(RawSection::new("key.03").with("Type", "momentary").with("PinAlias", "a.b"));
        assert!(matches!(bad, Err(ConfigError::InvalidValue { field: "PinAlias", .. })));
    }
}
