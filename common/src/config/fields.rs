//! Typed field access over a [`RawSection`] with leftover detection.
//!
//! Every accessor marks the field it reads as consumed. After a variant has
//! read everything it understands, [`Fields::finish`] rejects whatever is left,
//! so a field that does not apply to the resolved key type is an error rather
//! than silently ignored.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::time::Duration;

use embedded_graphics::pixelcolor::Rgb888;

use super::ConfigError;
use super::raw::RawSection;
use crate::colors::parse_color;

pub(crate) struct Fields<'a> {
    section: &'a RawSection,
    consumed: Vec<bool>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(section: &'a RawSection) -> Result<Self, ConfigError> {
        let names: Vec<&str> = section.fields().map(|(name, _)| name).collect();
        for (i, name) in names.iter().enumerate() {
            if names[..i].iter().any(|prev| prev.eq_ignore_ascii_case(name)) {
                return Err(ConfigError::DuplicateField {
                    section: section.name().into(),
                    field: (*name).into(),
                });
            }
        }
        Ok(Self {
            section,
            consumed: vec![false; names.len()],
        })
    }

    pub(crate) fn section(&self) -> &'a str { self.section.name() }

    /// Raw value of `field`, if present.
    pub(crate) fn raw(
        &mut self,
        field: &str,
    ) -> Option<&'a str> {
        let section = self.section;
        section
            .fields()
            .enumerate()
            .find(|(_, (name, _))| name.eq_ignore_ascii_case(field))
            .map(|(i, (_, value))| {
                self.consumed[i] = true;
                value
            })
    }

    /// First present field among `names`. All of them are consumed.
    pub(crate) fn raw_any(
        &mut self,
        names: &[&str],
    ) -> Option<&'a str> {
        let mut found = None;
        for name in names {
            let value = self.raw(name);
            if found.is_none() {
                found = value;
            }
        }
        found
    }

    pub(crate) fn required(
        &mut self,
        field: &'static str,
    ) -> Result<&'a str, ConfigError> {
        self.raw(field).ok_or_else(|| ConfigError::MissingField {
            section: self.section().into(),
            field,
        })
    }

    pub(crate) fn invalid(
        &self,
        field: &'static str,
        value: &str,
        reason: impl ToString,
    ) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section().into(),
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn string(
        &mut self,
        field: &str,
    ) -> Option<String> {
        self.raw(field).map(|v| v.trim().into())
    }

    /// Label text with `\n` markers turned into line breaks.
    pub(crate) fn label(
        &mut self,
        field: &str,
        default: impl FnOnce() -> String,
    ) -> String {
        match self.raw(field) {
            Some(text) => text.replace("\\n", "\n"),
            None => default(),
        }
    }

    pub(crate) fn bool(
        &mut self,
        field: &'static str,
        default: bool,
    ) -> Result<bool, ConfigError> {
        let Some(value) = self.raw(field) else {
            return Ok(default);
        };
        parse_bool(value).ok_or_else(|| self.invalid(field, value, "expected a boolean"))
    }

    pub(crate) fn color(
        &mut self,
        field: &'static str,
        default: Rgb888,
    ) -> Result<Rgb888, ConfigError> {
        self.color_any(field, &[field], default)
    }

    /// Colour read from the first of several accepted names.
    pub(crate) fn color_any(
        &mut self,
        field: &'static str,
        names: &[&str],
        default: Rgb888,
    ) -> Result<Rgb888, ConfigError> {
        let Some(value) = self.raw_any(names) else {
            return Ok(default);
        };
        parse_color(value).ok_or_else(|| self.invalid(field, value, "unknown colour"))
    }

    pub(crate) fn integer(
        &mut self,
        field: &'static str,
        range: core::ops::RangeInclusive<i64>,
        default: i64,
    ) -> Result<i64, ConfigError> {
        let Some(value) = self.raw(field) else {
            return Ok(default);
        };
        match value.trim().parse::<i64>() {
            Ok(n) if range.contains(&n) => Ok(n),
            Ok(_) => Err(self.invalid(field, value, "out of range")),
            Err(e) => Err(self.invalid(field, value, e)),
        }
    }

    /// Strictly positive float.
    pub(crate) fn positive(
        &mut self,
        field: &'static str,
        default: f64,
    ) -> Result<f64, ConfigError> {
        let Some(value) = self.raw(field) else {
            return Ok(default);
        };
        match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
            Ok(_) => Err(self.invalid(field, value, "must be greater than zero")),
            Err(e) => Err(self.invalid(field, value, e)),
        }
    }

    /// Positive number of seconds.
    pub(crate) fn seconds(
        &mut self,
        field: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        let secs = self.positive(field, default.as_secs_f64())?;
        Duration::try_from_secs_f64(secs).map_err(|e| {
            let value = self.raw(field).unwrap_or_default();
            self.invalid(field, value, e)
        })
    }

    /// Reject every field no accessor asked for.
    pub(crate) fn finish(self) -> Result<(), ConfigError> {
        match self
            .section
            .fields()
            .zip(&self.consumed)
            .find(|(_, used)| !**used)
        {
            Some(((name, _), _)) => Err(ConfigError::UnknownField {
                section: self.section().into(),
                field: name.into(),
            }),
            None => Ok(()),
        }
    }
}

/// Boolean spellings accepted in configuration files.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
