//! Parsed-but-unvalidated configuration as handed over by a file loader.
//!
//! Field names are matched case-insensitively; values are kept as the strings
//! the user wrote. Page and key numbers are kept signed so that range checks
//! happen in one place, [`ConfigModel::build`](super::ConfigModel::build).

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// One `[section]` of the configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawSection {
    name: String,
    fields: Vec<(String, String)>,
}

impl RawSection {
    /// Empty section. `name` is used verbatim in error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(
        mut self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.insert(field, value);
        self
    }

    /// Append a field. Duplicates are kept and rejected during validation.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.fields.push((field.into(), value.into()));
    }

    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// Fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    /// Same fields under another section name.
    #[must_use]
    pub fn renamed(
        &self,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: self.fields.clone(),
        }
    }
}

/// Sections belonging to one page number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawPage {
    /// `[page.N]` itself, if present.
    pub section: Option<RawSection>,
    /// `[page.N.key.NN]` sections by key index.
    pub keys: BTreeMap<i64, RawSection>,
}

/// The whole configuration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawConfig {
    /// `[General]`.
    pub general: RawSection,
    /// Page-qualified sections by page number.
    pub pages: BTreeMap<i64, RawPage>,
    /// Unqualified `[key.NN]` sections, meaning page 1 unless shadowed.
    pub legacy_keys: BTreeMap<i64, RawSection>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            general: RawSection::new("General"),
            pages: BTreeMap::new(),
            legacy_keys: BTreeMap::new(),
        }
    }
}

impl RawConfig {
    /// Add a `[page.N.key.NN]` section.
    pub fn insert_key(
        &mut self,
        page: i64,
        index: i64,
        section: RawSection,
    ) {
        self.pages.entry(page).or_default().keys.insert(index, section);
    }

    /// Add a `[page.N]` section.
    pub fn insert_page(
        &mut self,
        page: i64,
        section: RawSection,
    ) {
        self.pages.entry(page).or_default().section = Some(section);
    }
}
