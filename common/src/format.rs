//! Float label templates for display keys.
//!
//! A template is free text with exactly one Python-style float placeholder,
//! e.g. `X {:+8.3f} mm`. Supported placeholder spec: `{:[+][width][.precision]f}`;
//! `{}` alone means six decimals, like Python's default for `f`.

use core::fmt::Write;

use heapless::String;
use thiserror::Error;

/// Capacity of a rendered float label.
pub const LABEL_CAPACITY: usize = 48;

/// Text shown when a value cannot be rendered.
pub const PLACEHOLDER: &str = "----";

/// Rendered float label.
pub type FloatLabel = String<LABEL_CAPACITY>;

/// Template parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("template has no `{{...}}` placeholder")]
    MissingPlaceholder,
    #[error("template has more than one placeholder")]
    MultiplePlaceholders,
    #[error("unterminated placeholder")]
    Unterminated,
    #[error("unsupported placeholder spec `{0}`")]
    UnsupportedSpec(alloc::string::String),
}

/// A parsed float template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloatFormat {
    prefix: alloc::string::String,
    suffix: alloc::string::String,
    sign: bool,
    width: usize,
    precision: usize,
}

impl FloatFormat {
    /// Parse a template such as `{:.2f}` or `Z: {:+.3f}`.
    pub fn parse(template: &str) -> Result<Self, FormatError> {
        let open = template.find('{').ok_or(FormatError::MissingPlaceholder)?;
        let close = template[open..]
            .find('}')
            .map(|offset| open + offset)
            .ok_or(FormatError::Unterminated)?;
        let suffix = &template[close + 1..];
        if suffix.contains('{') {
            return Err(FormatError::MultiplePlaceholders);
        }

        let spec = &template[open + 1..close];
        let (sign, width, precision) = parse_spec(spec)?;
        Ok(Self {
            prefix: template[..open].into(),
            suffix: suffix.into(),
            sign,
            width,
            precision,
        })
    }

    /// Number of decimals the template prints.
    #[inline]
    pub const fn precision(&self) -> usize { self.precision }

    /// Render a value. Returns [`PLACEHOLDER`] if the result does not fit.
    pub fn render(
        &self,
        value: f64,
        decimal_comma: bool,
    ) -> FloatLabel {
        let mut out = FloatLabel::new();
        if self.write_label(&mut out, value, decimal_comma).is_err() {
            out.clear();
            let _ = out.push_str(PLACEHOLDER);
        }
        out
    }

    fn write_label(
        &self,
        out: &mut FloatLabel,
        value: f64,
        decimal_comma: bool,
    ) -> core::fmt::Result {
        let mut number = FloatLabel::new();
        if self.sign {
            write!(number, "{value:>+width$.prec$}", width = self.width, prec = self.precision)?;
        } else {
            write!(number, "{value:>width$.prec$}", width = self.width, prec = self.precision)?;
        }

        out.push_str(&self.prefix).map_err(|_| core::fmt::Error)?;
        for c in number.chars() {
            // Only the number's own separator is localised.
            let c = if decimal_comma && c == '.' { ',' } else { c };
            out.push(c).map_err(|_| core::fmt::Error)?;
        }
        out.push_str(&self.suffix).map_err(|_| core::fmt::Error)
    }
}

fn parse_spec(spec: &str) -> Result<(bool, usize, usize), FormatError> {
    let unsupported = || FormatError::UnsupportedSpec(spec.into());
    if spec.is_empty() {
        return Ok((false, 0, 6));
    }
    let body = spec.strip_prefix(':').ok_or_else(unsupported)?;
    let body = body.strip_suffix('f').or_else(|| body.strip_suffix('F')).ok_or_else(unsupported)?;
    let (sign, body) = match body.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (width, precision) = match body.split_once('.') {
        Some((width, precision)) => (width, Some(precision)),
        None => (body, None),
    };
    let width = if width.is_empty() {
        0
    } else {
        width.parse().map_err(|_| unsupported())?
    };
    let precision = match precision {
        Some(p) => p.parse().map_err(|_| unsupported())?,
        None => 6,
    };
    if precision > 12 || width > 24 {
        return Err(unsupported());
    }
    Ok((sign, width, precision))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_decimals() {
        let fmt = FloatFormat::parse("{:.2f}").unwrap();
        assert_eq!(fmt.render(3.14159, false).as_str(), "3.14");
        assert_eq!(fmt.render(3.14159, true).as_str(), "3,14");
    }

    #[test]
    fn test_prefix_suffix_and_sign() {
        let fmt = FloatFormat::parse("X {:+.3f} mm").unwrap();
        assert_eq!(fmt.render(1.5, false).as_str(), "X +1.500 mm");
        assert_eq!(fmt.render(-0.25, false).as_str(), "X -0.250 mm");
    }

    #[test]
    fn test_decimal_comma_leaves_template_text() {
        let fmt = FloatFormat::parse("v. {:.2f} m.").unwrap();
        assert_eq!(fmt.render(1.5, true).as_str(), "v. 1,50 m.");
        assert_eq!(fmt.render(1.5, false).as_str(), "v. 1.50 m.");
    }

    #[test]
    fn test_width_pads_left() {
        let fmt = FloatFormat::parse("{:7.1f}").unwrap();
        assert_eq!(fmt.render(2.0, false).as_str(), "    2.0");
    }

    #[test]
    fn test_default_precision() {
        let fmt = FloatFormat::parse("{}").unwrap();
        assert_eq!(fmt.render(1.0, false).as_str(), "1.000000");
    }

    #[test]
    fn test_rejects_bad_templates() {
        assert_eq!(FloatFormat::parse("value"), Err(FormatError::MissingPlaceholder));
        assert_eq!(FloatFormat::parse("{:.2f"), Err(FormatError::Unterminated));
        assert_eq!(FloatFormat::parse("{:.2f} {:.2f}"), Err(FormatError::MultiplePlaceholders));
        assert!(matches!(FloatFormat::parse("{:d}"), Err(FormatError::UnsupportedSpec(_))));
    }

    #[test]
    fn test_overflow_renders_placeholder() {
        let fmt = FloatFormat::parse("{:.12f}").unwrap();
        assert_eq!(fmt.render(1.0e40, false).as_str(), PLACEHOLDER);
    }
}
