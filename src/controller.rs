//! Active page and page-transition bookkeeping.
//!
//! The controller decides *whether* a page change happens; the panel performs
//! it. A request observed on `page-select` yields a [`Transition`] that the
//! panel must hand back through [`PageController::publish`] once every key of
//! the destination page is on the device. Until then [`current`] keeps
//! reporting the page being left.
//!
//! Presses remember the page they happened on, so the matching release is
//! delivered to that page even when the page changed while the key was held.
//!
//! [`current`]: PageController::current

use std::collections::{BTreeMap, BTreeSet};

use haldeck_common::{ConfigModel, PageId};

/// A page change in progress.
#[must_use = "a transition is only complete once published"]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transition {
    pub from: PageId,
    pub to: PageId,
}

#[derive(Debug)]
pub struct PageController {
    current: PageId,
    /// Last value seen on `page-select`; requests are edges against it.
    last_select: i32,
    /// Rejected `page-select` values reported since the last valid request.
    rejected: BTreeSet<i32>,
    /// Page each held key was pressed on.
    origins: BTreeMap<usize, PageId>,
}

impl PageController {
    pub fn new(initial: PageId) -> Self {
        Self {
            current: initial,
            last_select: i32::from(initial.get()),
            rejected: BTreeSet::new(),
            origins: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn current(&self) -> PageId { self.current }

    /// Feed the current `page-select` value. Returns a transition when the
    /// value changed to a configured page other than the current one.
    pub fn observe_select(
        &mut self,
        value: i32,
        model: &ConfigModel,
    ) -> Option<Transition> {
        if value == self.last_select {
            return None;
        }
        self.last_select = value;

        let target = PageId::new(i64::from(value)).filter(|page| model.page(*page).is_some());
        let Some(to) = target else {
            if self.rejected.insert(value) {
                tracing::warn!("page-select {} ignored: no such page", value);
            }
            return None;
        };
        self.rejected.clear();

        (to != self.current).then_some(Transition {
            from: self.current,
            to,
        })
    }

    /// Make the destination of `transition` the current page.
    pub fn publish(
        &mut self,
        transition: Transition,
    ) -> PageId {
        tracing::info!("page {} -> {}", transition.from, transition.to);
        self.current = transition.to;
        self.current
    }

    /// Record a press on the current page and return that page.
    pub fn press(
        &mut self,
        index: usize,
    ) -> PageId {
        self.origins.insert(index, self.current);
        self.current
    }

    /// Page the matching press happened on; `None` for a release without press.
    pub fn release(
        &mut self,
        index: usize,
    ) -> Option<PageId> {
        self.origins.remove(&index)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
