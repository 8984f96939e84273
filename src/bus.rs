//! In-process named signal table.
//!
//! [`SignalBus`] stands in for HAL shared memory: a flat namespace of typed
//! signals that the panel and outside parties (the console, tests, a future
//! HAL bridge) read and write by name. Values live in atomics so a read never
//! waits on the table lock once a cell handle has been obtained; the lock only
//! guards creation, removal and lookup.
//!
//! Direction is recorded from the panel's point of view: [`Direction::In`]
//! signals are written by outsiders, [`Direction::Out`] signals only by the
//! panel. [`SignalBus::set`] refuses to write `Out` signals.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use thiserror::Error;

/// Value type of a signal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SignalType {
    Bit,
    Float,
    S32,
}

impl fmt::Display for SignalType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Bit => "bit",
            Self::Float => "float",
            Self::S32 => "s32",
        })
    }
}

/// Who writes a signal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    /// Written externally, read by the panel.
    In,
    /// Written by the panel, read externally.
    Out,
}

/// A typed signal value.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SignalValue {
    Bit(bool),
    Float(f64),
    S32(i32),
}

impl fmt::Display for SignalValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Bit(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            Self::Float(v) => write!(f, "{v}"),
            Self::S32(v) => write!(f, "{v}"),
        }
    }
}

/// Signal bus failures.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("signal `{0}` does not exist")]
    NotFound(String),
    #[error("signal `{0}` already exists")]
    Exists(String),
    #[error("signal `{0}` is written by the panel only")]
    ReadOnly(String),
    #[error("signal `{name}` is {expected}, got `{value}`")]
    Parse {
        name: String,
        expected: SignalType,
        value: String,
    },
    #[error("signal `{name}` is {expected}, got a {actual} value")]
    TypeMismatch {
        name: String,
        expected: SignalType,
        actual: SignalType,
    },
}

// =============================================================================
// Cells
// =============================================================================

/// Storage for one signal. Every type is kept in 64 bits.
#[derive(Debug)]
pub struct SignalCell {
    kind: SignalType,
    direction: Direction,
    bits: AtomicU64,
}

impl SignalCell {
    fn new(
        kind: SignalType,
        direction: Direction,
    ) -> Self {
        Self {
            kind,
            direction,
            bits: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn kind(&self) -> SignalType { self.kind }

    #[inline]
    pub fn direction(&self) -> Direction { self.direction }

    #[inline]
    pub fn load_bool(&self) -> bool { self.bits.load(Ordering::Acquire) != 0 }

    #[inline]
    pub fn store_bool(
        &self,
        value: bool,
    ) {
        self.bits.store(u64::from(value), Ordering::Release);
    }

    #[inline]
    pub fn load_f64(&self) -> f64 { f64::from_bits(self.bits.load(Ordering::Acquire)) }

    #[inline]
    pub fn store_f64(
        &self,
        value: f64,
    ) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    #[inline]
    pub fn load_i32(&self) -> i32 { self.bits.load(Ordering::Acquire) as u32 as i32 }

    #[inline]
    pub fn store_i32(
        &self,
        value: i32,
    ) {
        self.bits.store(u64::from(value as u32), Ordering::Release);
    }

    /// Current value, typed.
    pub fn value(&self) -> SignalValue {
        match self.kind {
            SignalType::Bit => SignalValue::Bit(self.load_bool()),
            SignalType::Float => SignalValue::Float(self.load_f64()),
            SignalType::S32 => SignalValue::S32(self.load_i32()),
        }
    }
}

// =============================================================================
// Bus
// =============================================================================

/// Shared signal table. Clones refer to the same table.
#[derive(Clone, Debug, Default)]
pub struct SignalBus {
    signals: Arc<RwLock<IndexMap<String, Arc<SignalCell>>>>,
}

impl SignalBus {
    pub fn new() -> Self { Self::default() }

    /// Create a signal, zero-initialised.
    pub(crate) fn create(
        &self,
        name: &str,
        kind: SignalType,
        direction: Direction,
    ) -> Result<Arc<SignalCell>, BusError> {
        let mut signals = self.signals.write();
        if signals.contains_key(name) {
            return Err(BusError::Exists(name.into()));
        }
        let cell = Arc::new(SignalCell::new(kind, direction));
        signals.insert(name.into(), Arc::clone(&cell));
        Ok(cell)
    }

    /// Remove a signal. Returns `false` if it did not exist.
    pub(crate) fn remove(
        &self,
        name: &str,
    ) -> bool {
        self.signals.write().shift_remove(name).is_some()
    }

    fn cell(
        &self,
        name: &str,
    ) -> Result<Arc<SignalCell>, BusError> {
        self.signals
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BusError::NotFound(name.into()))
    }

    /// Read a signal by name.
    pub fn get(
        &self,
        name: &str,
    ) -> Result<SignalValue, BusError> {
        Ok(self.cell(name)?.value())
    }

    /// Write an `In` signal with a typed value.
    pub fn set_value(
        &self,
        name: &str,
        value: SignalValue,
    ) -> Result<(), BusError> {
        let cell = self.cell(name)?;
        if cell.direction() == Direction::Out {
            return Err(BusError::ReadOnly(name.into()));
        }
        match (cell.kind(), value) {
            (SignalType::Bit, SignalValue::Bit(v)) => cell.store_bool(v),
            (SignalType::Float, SignalValue::Float(v)) => cell.store_f64(v),
            (SignalType::Float, SignalValue::S32(v)) => cell.store_f64(f64::from(v)),
            (SignalType::S32, SignalValue::S32(v)) => cell.store_i32(v),
            (expected, other) => {
                return Err(BusError::TypeMismatch {
                    name: name.into(),
                    expected,
                    actual: other.kind(),
                });
            }
        }
        Ok(())
    }

    /// Write an `In` signal from text, parsed according to its type.
    pub fn set(
        &self,
        name: &str,
        text: &str,
    ) -> Result<(), BusError> {
        let kind = self.cell(name)?.kind();
        let text = text.trim();
        let parsed = match kind {
            SignalType::Bit => haldeck_common::config::parse_bool(text).map(SignalValue::Bit),
            SignalType::Float => text.parse().ok().map(SignalValue::Float),
            SignalType::S32 => text.parse().ok().map(SignalValue::S32),
        };
        let value = parsed.ok_or_else(|| BusError::Parse {
            name: name.into(),
            expected: kind,
            value: text.into(),
        })?;
        self.set_value(name, value)
    }

    /// Signal names in creation order.
    pub fn names(&self) -> Vec<String> { self.signals.read().keys().cloned().collect() }

    /// Every signal with its type, direction and current value, in creation order.
    pub fn snapshot(&self) -> Vec<(String, SignalType, Direction, SignalValue)> {
        self.signals
            .read()
            .iter()
            .map(|(name, cell)| (name.clone(), cell.kind(), cell.direction(), cell.value()))
            .collect()
    }
}

impl SignalValue {
    pub fn kind(&self) -> SignalType {
        match self {
            Self::Bit(_) => SignalType::Bit,
            Self::Float(_) => SignalType::Float,
            Self::S32(_) => SignalType::S32,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_read_defaults() {
        let bus = SignalBus::new();
        bus.create("a.bit", SignalType::Bit, Direction::In).unwrap();
        bus.create("a.float", SignalType::Float, Direction::In).unwrap();
        bus.create("a.s32", SignalType::S32, Direction::Out).unwrap();
        assert_eq!(bus.get("a.bit").unwrap(), SignalValue::Bit(false));
        assert_eq!(bus.get("a.float").unwrap(), SignalValue::Float(0.0));
        assert_eq!(bus.get("a.s32").unwrap(), SignalValue::S32(0));
        assert_eq!(bus.names(), ["a.bit", "a.float", "a.s32"]);
    }

    #[test]
    fn test_duplicate_create() {
        let bus = SignalBus::new();
        bus.create("x", SignalType::Bit, Direction::In).unwrap();
        assert!(matches!(bus.create("x", SignalType::Float, Direction::In), Err(BusError::Exists(_))));
    }

    #[test]
    fn test_set_parses_by_type() {
        let bus = SignalBus::new();
        bus.create("b", SignalType::Bit, Direction::In).unwrap();
        bus.create("f", SignalType::Float, Direction::In).unwrap();
        bus.create("i", SignalType::S32, Direction::In).unwrap();
        bus.set("b", "true").unwrap();
        bus.set("f", "-1.25").unwrap();
        bus.set("i", "-7").unwrap();
        assert_eq!(bus.get("b").unwrap(), SignalValue::Bit(true));
        assert_eq!(bus.get("f").unwrap(), SignalValue::Float(-1.25));
        assert_eq!(bus.get("i").unwrap(), SignalValue::S32(-7));
        assert!(matches!(bus.set("i", "1.5"), Err(BusError::Parse { .. })));
        assert!(matches!(bus.set("b", "maybe"), Err(BusError::Parse { .. })));
    }

    #[test]
    fn test_out_signals_are_read_only() {
        let bus = SignalBus::new();
        let cell = bus.create("cur", SignalType::S32, Direction::Out).unwrap();
        assert!(matches!(bus.set("cur", "3"), Err(BusError::ReadOnly(_))));
        cell.store_i32(3);
        assert_eq!(bus.get("cur").unwrap(), SignalValue::S32(3));
    }

    #[test]
    fn test_type_mismatch() {
        let bus = SignalBus::new();
        bus.create("b", SignalType::Bit, Direction::In).unwrap();
        assert!(matches!(
            bus.set_value("b", SignalValue::Float(1.0)),
            Err(BusError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_remove() {
        let bus = SignalBus::new();
        bus.create("x", SignalType::Bit, Direction::In).unwrap();
        assert!(bus.remove("x"));
        assert!(!bus.remove("x"));
        assert!(matches!(bus.get("x"), Err(BusError::NotFound(_))));
    }

    #[test]
    fn test_negative_s32_round_trip() {
        let cell = SignalCell::new(SignalType::S32, Direction::In);
        cell.store_i32(i32::MIN);
        assert_eq!(cell.load_i32(), i32::MIN);
    }
}
