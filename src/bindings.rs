//! Registration of every signal the configured panel needs.
//!
//! Order is fixed so that two runs over the same configuration create the
//! same signal table: `page-select`, `page-current`, then pages ascending,
//! keys ascending, and per key `out`, `in`, `enable`, `value`.

use std::collections::BTreeMap;

use haldeck_common::bindings::{PAGE_CURRENT, PAGE_SELECT, Suffix, pin_name};
use haldeck_common::{ConfigModel, PageId};

use crate::bus::Direction;
use crate::registry::{BoolPin, FloatPin, IntPin, RegistryError, SignalRegistry};

/// Signals owned by one key. Absent handles mean the key has no such signal.
#[derive(Clone, Debug, Default)]
pub struct KeyPins {
    pub out: Option<BoolPin>,
    pub input: Option<BoolPin>,
    pub enable: Option<BoolPin>,
    pub value: Option<FloatPin>,
}

/// Every signal handle of the panel.
#[derive(Debug)]
pub struct PanelPins {
    pub page_select: IntPin,
    pub page_current: IntPin,
    keys: BTreeMap<(PageId, usize), KeyPins>,
}

impl PanelPins {
    /// Handles for a key, `None` for keys without signals.
    pub fn key(
        &self,
        page: PageId,
        index: usize,
    ) -> Option<&KeyPins> {
        self.keys.get(&(page, index))
    }
}

/// Register the panel's signals and seed `page-select`/`page-current`.
pub fn bind_panel(
    registry: &mut SignalRegistry,
    model: &ConfigModel,
) -> Result<PanelPins, RegistryError> {
    let page_select = registry.register_int(PAGE_SELECT, Direction::In)?;
    let page_current = registry.register_int(PAGE_CURRENT, Direction::Out)?;
    let initial = i32::from(model.general().initial_page.get());
    // Seed with the initial page so startup is not seen as a page request.
    registry.write_int(&page_select, initial);

    let mut keys = BTreeMap::new();
    for (page, definition) in model.pages() {
        for (index, key) in definition.keys().iter().enumerate() {
            let Some(alias) = key.alias() else { continue };
            let mut pins = KeyPins::default();
            for suffix in key.suffixes() {
                let name = pin_name(page, alias, suffix);
                match suffix {
                    Suffix::Out => pins.out = Some(registry.register_bool(&name, Direction::Out)?),
                    Suffix::In => pins.input = Some(registry.register_bool(&name, Direction::In)?),
                    Suffix::Enable => pins.enable = Some(registry.register_bool(&name, Direction::In)?),
                    Suffix::Value => pins.value = Some(registry.register_float(&name)?),
                }
            }
            keys.insert((page, index), pins);
        }
    }

    tracing::info!("{} signals registered", registry.owned().len());
    Ok(PanelPins {
        page_select,
        page_current,
        keys,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
