//! Validated, immutable page and key model.
//!
//! [`ConfigModel::build`] turns a [`RawConfig`] into pages of [`Key`]s. All
//! validation happens here, before any signal is registered or any device is
//! touched, and the first problem found is returned as a [`ConfigError`] that
//! names the offending section and field.
//!
//! # Legacy Sections
//!
//! An unqualified `[key.NN]` section defines key `NN` of page 1, unless a
//! `[page.1.key.NN]` section exists as well; in that case the page-qualified
//! one wins and the legacy section is only reported at debug level.

mod fields;
mod keys;
mod raw;

use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use alloc::string::String;
use alloc::vec::Vec;

use embedded_graphics::pixelcolor::Rgb888;
pub use fields::parse_bool;
pub use keys::{
    Artwork, DisplayFloatKey, Face, ImageMargins, Key, KeyImages, KeyKind, KeyboardKey, MomentaryKey,
};
pub use raw::{RawConfig, RawPage, RawSection};
use thiserror::Error;

use self::fields::Fields;
use crate::colors::BLACK;
use crate::pages::{MAX_PAGES, PageId, PageKind};

/// Default signal prefix.
pub const DEFAULT_PREFIX: &str = "haldeck";

/// Default deck brightness in percent.
pub const DEFAULT_BRIGHTNESS: u8 = 30;

/// Configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("[{section}]: unknown key type `{value}`")]
    UnknownKeyType { section: String, value: String },
    #[error("[{section}]: missing required field `{field}`")]
    MissingField { section: String, field: &'static str },
    #[error("[{section}]: unknown or inapplicable field `{field}`")]
    UnknownField { section: String, field: String },
    #[error("[{section}]: field `{field}` given more than once")]
    DuplicateField { section: String, field: String },
    #[error("[{section}]: invalid {field} `{value}`: {reason}")]
    InvalidValue {
        section: String,
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("page {page}: alias `{alias}` used by keys {first} and {second}")]
    DuplicateAlias {
        page: PageId,
        alias: String,
        first: usize,
        second: usize,
    },
    #[error("[{section}]: key index {index} outside 0..{key_count}")]
    KeyOutOfRange {
        section: String,
        index: i64,
        key_count: usize,
    },
    #[error("[{section}]: page {page} outside 1..=20")]
    PageOutOfRange { section: String, page: i64 },
    #[error("[{section}]: `Image` cannot be combined with `InactiveImage`/`ActiveImage`")]
    ConflictingImages { section: String },
    #[error("[{section}]: `InactiveImage` and `ActiveImage` must be given together")]
    IncompleteImagePair { section: String },
    #[error("[{section}]: splash pages must be numbered 11..=20")]
    SplashOnNormalPage { section: String },
    #[error("[{section}]: page {page} is a splash page and cannot hold keys")]
    KeysOnSplashPage { section: String, page: PageId },
    #[error("initial page {0} is not configured")]
    UnconfiguredInitialPage(PageId),
}

/// `[General]` settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct General {
    pub verbose: bool,
    /// Deck brightness, `0..=100`.
    pub brightness: u8,
    /// Signal name prefix.
    pub prefix: String,
    pub initial_page: PageId,
}

/// Full-panel image shown on pages 11..=20.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplashPage {
    pub image: String,
    pub background: Rgb888,
}

/// A configured page.
#[derive(Clone, Debug, PartialEq)]
pub enum Page {
    /// One key per physical key, indexed `0..key_count`.
    Normal(Vec<Key>),
    Splash(SplashPage),
}

impl Page {
    #[inline]
    pub const fn kind(&self) -> PageKind {
        match self {
            Self::Normal(_) => PageKind::Normal,
            Self::Splash(_) => PageKind::Splash,
        }
    }

    /// Keys of a normal page; empty for splash pages.
    pub fn keys(&self) -> &[Key] {
        match self {
            Self::Normal(keys) => keys,
            Self::Splash(_) => &[],
        }
    }
}

/// The validated configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigModel {
    general: General,
    pages: BTreeMap<PageId, Page>,
    key_count: usize,
    shadowed: Vec<String>,
}

impl ConfigModel {
    /// Validate `raw` for a deck with `key_count` keys.
    pub fn build(
        raw: &RawConfig,
        key_count: usize,
    ) -> Result<Self, ConfigError> {
        let general = general(&raw.general)?;
        let mut pages = BTreeMap::new();
        let mut shadowed = Vec::new();

        for (&number, raw_page) in &raw.pages {
            let page = page_id(number, raw_page)?;
            let legacy = if page == PageId::FIRST {
                Some(&raw.legacy_keys)
            } else {
                None
            };
            pages.insert(page, build_page(page, raw_page, legacy, key_count, &mut shadowed)?);
        }

        if let Entry::Vacant(slot) = pages.entry(PageId::FIRST) {
            let empty = RawPage::default();
            slot.insert(build_page(PageId::FIRST, &empty, Some(&raw.legacy_keys), key_count, &mut shadowed)?);
        }

        if !pages.contains_key(&general.initial_page) {
            return Err(ConfigError::UnconfiguredInitialPage(general.initial_page));
        }

        Ok(Self {
            general,
            pages,
            key_count,
            shadowed,
        })
    }

    #[inline]
    pub fn general(&self) -> &General { &self.general }

    #[inline]
    pub fn key_count(&self) -> usize { self.key_count }

    pub fn page(
        &self,
        id: PageId,
    ) -> Option<&Page> {
        self.pages.get(&id)
    }

    /// Configured pages in ascending order.
    pub fn pages(&self) -> impl Iterator<Item = (PageId, &Page)> { self.pages.iter().map(|(id, page)| (*id, page)) }

    /// Legacy `[key.NN]` sections hidden by a page-qualified twin.
    pub fn shadowed_sections(&self) -> &[String] { &self.shadowed }
}

// =============================================================================
// Section Builders
// =============================================================================

fn general(section: &RawSection) -> Result<General, ConfigError> {
    let mut fields = Fields::new(section)?;
    let verbose = fields.bool("Verbose", false)?;
    let brightness = fields.integer("Brightness", 0..=100, i64::from(DEFAULT_BRIGHTNESS))? as u8;
    let prefix = fields.string("Prefix").unwrap_or_else(|| DEFAULT_PREFIX.into());
    if prefix.is_empty() || prefix.contains(char::is_whitespace) {
        return Err(fields.invalid("Prefix", &prefix, "must be a non-empty name without spaces"));
    }
    let initial = fields.integer("InitialPage", 1..=i64::from(MAX_PAGES), 1)?;
    let initial_page = PageId::new(initial).unwrap_or(PageId::FIRST);
    fields.finish()?;
    Ok(General {
        verbose,
        brightness,
        prefix,
        initial_page,
    })
}

/// Name of some section of the page, for error messages.
fn page_section_name(
    number: i64,
    raw_page: &RawPage,
) -> String {
    raw_page
        .section
        .as_ref()
        .or_else(|| raw_page.keys.values().next())
        .map_or_else(|| alloc::format!("page.{number}"), |s| s.name().into())
}

fn page_id(
    number: i64,
    raw_page: &RawPage,
) -> Result<PageId, ConfigError> {
    PageId::new(number).ok_or_else(|| ConfigError::PageOutOfRange {
        section: page_section_name(number, raw_page),
        page: number,
    })
}

fn build_page(
    page: PageId,
    raw_page: &RawPage,
    legacy: Option<&BTreeMap<i64, RawSection>>,
    key_count: usize,
    shadowed: &mut Vec<String>,
) -> Result<Page, ConfigError> {
    let splash = match &raw_page.section {
        Some(section) => page_section(page, section)?,
        None => None,
    };

    if let Some(splash) = splash {
        if let Some(section) = raw_page.keys.values().next() {
            return Err(ConfigError::KeysOnSplashPage {
                section: section.name().into(),
                page,
            });
        }
        return Ok(Page::Splash(splash));
    }

    if page.kind() == PageKind::Splash {
        let section = page_section_name(i64::from(page.get()), raw_page);
        return Err(ConfigError::KeysOnSplashPage { section, page });
    }

    let mut sections: BTreeMap<i64, &RawSection> = raw_page.keys.iter().map(|(i, s)| (*i, s)).collect();
    for (index, section) in legacy.into_iter().flatten() {
        match sections.entry(*index) {
            Entry::Vacant(slot) => {
                slot.insert(section);
            }
            Entry::Occupied(winner) => {
                tracing::debug!(
                    "[{}] shadowed by [{}]",
                    section.name(),
                    winner.get().name()
                );
                shadowed.push(section.name().into());
            }
        }
    }

    let mut keys = alloc::vec![Key::Unused; key_count];
    for (&index, section) in &sections {
        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i < key_count)
            .ok_or_else(|| ConfigError::KeyOutOfRange {
                section: section.name().into(),
                index,
                key_count,
            })?;
        keys[slot] = Key::from_section(section, slot)?;
    }

    check_aliases(page, &keys)?;
    Ok(Page::Normal(keys))
}

/// Validate `[page.N]`. Returns the splash definition for splash pages.
fn page_section(
    page: PageId,
    section: &RawSection,
) -> Result<Option<SplashPage>, ConfigError> {
    let mut fields = Fields::new(section)?;
    let kind = fields.raw("Type").map_or_else(|| "normal".into(), |t| t.trim().to_ascii_lowercase());
    let splash = match kind.as_str() {
        "normal" if page.kind() == PageKind::Normal => None,
        "normal" => {
            return Err(ConfigError::KeysOnSplashPage {
                section: section.name().into(),
                page,
            });
        }
        "splash" if page.kind() == PageKind::Splash => Some(SplashPage {
            image: fields.required("SplashImage")?.trim().into(),
            background: fields.color("SplashBackground", BLACK)?,
        }),
        "splash" => {
            return Err(ConfigError::SplashOnNormalPage {
                section: section.name().into(),
            });
        }
        _ => return Err(fields.invalid("Type", &kind, "expected `normal` or `splash`")),
    };
    fields.finish()?;
    Ok(splash)
}

fn check_aliases(
    page: PageId,
    keys: &[Key],
) -> Result<(), ConfigError> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (index, key) in keys.iter().enumerate() {
        let Some(alias) = key.alias() else { continue };
        if let Some(&first) = seen.get(alias) {
            return Err(ConfigError::DuplicateAlias {
                page,
                alias: alias.into(),
                first,
                second: index,
            });
        }
        seen.insert(alias, index);
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
