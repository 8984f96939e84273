//! Owned signal bindings.
//!
//! The registry creates the panel's signals on the [`SignalBus`] under its
//! prefix and hands out typed pin handles. Because a handle can only be
//! obtained by registering, reads and writes through it cannot fail on a
//! missing name. A signal nobody has written yet reads as `false`, `0.0` or `0`.
//!
//! Everything registered is removed from the bus again by
//! [`SignalRegistry::release`], which also runs on drop.

use std::sync::Arc;

use thiserror::Error;

use crate::bus::{BusError, Direction, SignalBus, SignalCell, SignalType};

/// Registration failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("signal `{0}` registered twice")]
    Duplicate(String),
    #[error(transparent)]
    Bus(BusError),
}

macro_rules! pin_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            name: String,
            cell: Arc<SignalCell>,
        }

        impl $name {
            /// Full signal name, prefix included.
            #[inline]
            pub fn name(&self) -> &str { &self.name }
        }
    };
}

pin_handle!(
    /// Handle to a registered bit signal.
    BoolPin
);
pin_handle!(
    /// Handle to a registered float signal.
    FloatPin
);
pin_handle!(
    /// Handle to a registered s32 signal.
    IntPin
);

/// Creates and owns the panel's signals.
#[derive(Debug)]
pub struct SignalRegistry {
    bus: SignalBus,
    prefix: String,
    owned: Vec<String>,
}

impl SignalRegistry {
    pub fn new(
        bus: SignalBus,
        prefix: &str,
    ) -> Self {
        Self {
            bus,
            prefix: prefix.into(),
            owned: Vec::new(),
        }
    }

    /// `<prefix>.<name>`.
    pub fn full_name(
        &self,
        name: &str,
    ) -> String {
        format!("{}.{}", self.prefix, name)
    }

    /// Full names of owned signals, in registration order.
    #[inline]
    pub fn owned(&self) -> &[String] { &self.owned }

    fn register(
        &mut self,
        name: &str,
        kind: SignalType,
        direction: Direction,
    ) -> Result<(String, Arc<SignalCell>), RegistryError> {
        let full = self.full_name(name);
        let cell = self.bus.create(&full, kind, direction).map_err(|e| match e {
            BusError::Exists(name) => RegistryError::Duplicate(name),
            other => RegistryError::Bus(other),
        })?;
        tracing::debug!("registered {} {} {:?}", full, kind, direction);
        self.owned.push(full.clone());
        Ok((full, cell))
    }

    pub fn register_bool(
        &mut self,
        name: &str,
        direction: Direction,
    ) -> Result<BoolPin, RegistryError> {
        let (name, cell) = self.register(name, SignalType::Bit, direction)?;
        Ok(BoolPin { name, cell })
    }

    /// Float signals are always written externally.
    pub fn register_float(
        &mut self,
        name: &str,
    ) -> Result<FloatPin, RegistryError> {
        let (name, cell) = self.register(name, SignalType::Float, Direction::In)?;
        Ok(FloatPin { name, cell })
    }

    pub fn register_int(
        &mut self,
        name: &str,
        direction: Direction,
    ) -> Result<IntPin, RegistryError> {
        let (name, cell) = self.register(name, SignalType::S32, direction)?;
        Ok(IntPin { name, cell })
    }

    #[inline]
    pub fn read_bool(
        &self,
        pin: &BoolPin,
    ) -> bool {
        pin.cell.load_bool()
    }

    #[inline]
    pub fn write_bool(
        &self,
        pin: &BoolPin,
        value: bool,
    ) {
        pin.cell.store_bool(value);
    }

    #[inline]
    pub fn read_float(
        &self,
        pin: &FloatPin,
    ) -> f64 {
        pin.cell.load_f64()
    }

    #[inline]
    pub fn read_int(
        &self,
        pin: &IntPin,
    ) -> i32 {
        pin.cell.load_i32()
    }

    #[inline]
    pub fn write_int(
        &self,
        pin: &IntPin,
        value: i32,
    ) {
        pin.cell.store_i32(value);
    }

    /// Remove every owned signal from the bus.
    pub fn release(&mut self) {
        if self.owned.is_empty() {
            return;
        }
        for name in self.owned.drain(..) {
            self.bus.remove(&name);
        }
        tracing::debug!("signals released");
    }
}

impl Drop for SignalRegistry {
    fn drop(&mut self) { self.release(); }
}

// =============================================================================
// Unit Tests
// =============================================================================
