//! Page identifiers for the multi-page deck.
//!
//! # Pages
//!
//! - Pages `1..=10` are [`PageKind::Normal`]: one interactive key per physical key.
//! - Pages `11..=20` are [`PageKind::Splash`]: a single full-panel image.

use core::fmt;

/// Lowest valid page number.
pub const FIRST_PAGE: u8 = 1;

/// Highest valid page number.
pub const MAX_PAGES: u8 = 20;

/// Highest page number that can hold interactive keys.
pub const LAST_NORMAL_PAGE: u8 = 10;

/// Kind of a page, fixed by its number.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PageKind {
    /// Interactive page with one key per physical key.
    Normal,
    /// Full-panel splash image.
    Splash,
}

/// A validated page number in `1..=20`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PageId(u8);

impl PageId {
    /// Page 1, the default initial page.
    pub const FIRST: Self = Self(FIRST_PAGE);

    /// Validate a page number coming from configuration or a signal write.
    pub fn new(number: i64) -> Option<Self> {
        if (i64::from(FIRST_PAGE)..=i64::from(MAX_PAGES)).contains(&number) {
            Some(Self(number as u8))
        } else {
            None
        }
    }

    /// Page number as written on the signal bus.
    #[inline]
    pub const fn get(self) -> u8 { self.0 }

    /// Kind implied by the page number.
    #[inline]
    pub const fn kind(self) -> PageKind {
        if self.0 <= LAST_NORMAL_PAGE {
            PageKind::Normal
        } else {
            PageKind::Splash
        }
    }

    /// Iterate over every valid page.
    pub fn all() -> impl Iterator<Item = Self> { (FIRST_PAGE..=MAX_PAGES).map(Self) }
}

impl fmt::Display for PageId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_range() {
        assert!(PageId::new(0).is_none());
        assert!(PageId::new(21).is_none());
        assert!(PageId::new(-3).is_none());
        assert_eq!(PageId::new(1), Some(PageId::FIRST));
        assert_eq!(PageId::new(20).map(PageId::get), Some(20));
    }

    #[test]
    fn test_page_kind_split() {
        assert_eq!(PageId::new(10).map(PageId::kind), Some(PageKind::Normal));
        assert_eq!(PageId::new(11).map(PageId::kind), Some(PageKind::Splash));
    }

    #[test]
    fn test_all_pages() {
        assert_eq!(PageId::all().count(), 20);
        assert_eq!(PageId::all().last().map(PageId::get), Some(MAX_PAGES));
    }
}
