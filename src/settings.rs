//! TOML configuration file loader.
//!
//! Maps the file onto [`RawConfig`] without judging its content; all
//! validation happens in [`ConfigModel::build`](haldeck_common::ConfigModel::build).
//!
//! ```toml
//! [General]
//! Brightness = 40
//!
//! [page.1.key.00]
//! Type = "momentary"
//! PinAlias = "Estop"
//! InactiveImage = "estop_off.png"
//! ActiveImage = "estop_on.png"
//!
//! [page.11]
//! Type = "splash"
//! SplashImage = "logo.png"
//!
//! [key.03]            # legacy spelling of [page.1.key.03]
//! Type = "keyboard"
//! KeyboardKey = "F5"
//! ```
//!
//! Scalar values of any TOML type are accepted and handed over as text;
//! an array of integers becomes a comma separated list (`ImageMargins`).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use haldeck_common::config::{RawConfig, RawSection};
use serde::Deserialize;
use thiserror::Error;
use toml::{Table, Value};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("[{0}]: section names are [General], [page.N], [page.N.key.NN] or [key.NN]")]
    BadSection(String),
    #[error("[{section}]: `{field}` must be a string, number, boolean or list of numbers")]
    BadValue { section: String, field: String },
}

/// Sub-table of `[page.N]` holding its keys.
const KEYS_TABLE: &str = "key";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(rename = "General", alias = "general", default)]
    general: Table,
    #[serde(default)]
    page: BTreeMap<String, Table>,
    #[serde(default)]
    key: BTreeMap<String, Table>,
}

/// Read and map a configuration file.
pub fn load(path: &Path) -> Result<RawConfig, SettingsError> {
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = parse(&text)?;
    tracing::debug!("{} read", path.display());
    Ok(raw)
}

/// Map configuration text.
pub fn parse(text: &str) -> Result<RawConfig, SettingsError> {
    let file: ConfigFile = toml::from_str(text)?;
    let mut raw = RawConfig {
        general: section("General", file.general)?,
        ..RawConfig::default()
    };

    for (page_name, mut table) in file.page {
        let page = number(&page_name, || format!("page.{page_name}"))?;
        if let Some(keys) = table.remove(KEYS_TABLE) {
            let Value::Table(keys) = keys else {
                return Err(SettingsError::BadSection(format!("page.{page_name}.{KEYS_TABLE}")));
            };
            for (key_name, fields) in keys {
                let name = format!("page.{page_name}.key.{key_name}");
                let index = number(&key_name, || name.clone())?;
                let Value::Table(fields) = fields else {
                    return Err(SettingsError::BadSection(name));
                };
                raw.insert_key(page, index, section(&name, fields)?);
            }
        }
        if !table.is_empty() {
            raw.insert_page(page, section(&format!("page.{page_name}"), table)?);
        }
    }

    for (key_name, fields) in file.key {
        let name = format!("key.{key_name}");
        let index = number(&key_name, || name.clone())?;
        raw.legacy_keys.insert(index, section(&name, fields)?);
    }
    Ok(raw)
}

fn number(
    text: &str,
    section: impl FnOnce() -> String,
) -> Result<i64, SettingsError> {
    text.parse().map_err(|_| SettingsError::BadSection(section()))
}

fn section(
    name: &str,
    table: Table,
) -> Result<RawSection, SettingsError> {
    let mut section = RawSection::new(name);
    for (field, value) in table {
        let Some(text) = scalar(&value) else {
            return Err(SettingsError::BadValue {
                section: name.into(),
                field,
            });
        };
        section.insert(field, text);
    }
    Ok(section)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_integer().map(|i| i.to_string()))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(",")),
        Value::Datetime(_) | Value::Table(_) => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
