//! Signal naming.
//!
//! Every bound key owns up to four signals named
//! `<prefix>.page.<N>.<alias>.<suffix>`. The prefix is applied by the signal
//! registry, so names produced here are relative (`page.3.Estop.out`).

use alloc::format;
use alloc::string::String;
use core::fmt;

use crate::pages::PageId;

/// Relative name of the externally writable page-select signal.
pub const PAGE_SELECT: &str = "page-select";

/// Relative name of the page-current signal, written only by the panel.
pub const PAGE_CURRENT: &str = "page-current";

/// Per-key signal suffix. Type and direction are fixed by the suffix.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Suffix {
    /// Pressed state, bit, written by the panel.
    Out,
    /// Highlight request, bit, written externally.
    In,
    /// Enable gate, bit, written externally.
    Enable,
    /// Displayed value, float, written externally.
    Value,
}

impl Suffix {
    /// Registration order within one key.
    pub const ALL: [Self; 4] = [Self::Out, Self::In, Self::Enable, Self::Value];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::In => "in",
            Self::Enable => "enable",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for Suffix {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative signal name for one key binding.
pub fn pin_name(
    page: PageId,
    alias: &str,
    suffix: Suffix,
) -> String {
    format!("page.{page}.{alias}.{suffix}")
}

/// Default alias of an unaliased key: its two-digit index.
pub fn default_alias(index: usize) -> String { format!("{index:02}") }
