//! Keyboard emulation for keyboard-type keys.
//!
//! A key press on the deck becomes one tap (key down, key up) of the
//! configured keyboard key. Injection goes through [`KeyInjector`]; the
//! default [`LogInjector`] only logs, the `rdev` feature adds [`OsInjector`]
//! which feeds the operating system's input queue.

use haldeck_common::keyspec::KeySpec;
use thiserror::Error;

/// Injection failures.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("key {0:?} cannot be injected on this platform")]
    Unsupported(KeySpec),
    #[error("input injection failed: {0}")]
    Os(String),
}

/// Sink for synthetic keyboard events.
pub trait KeyInjector {
    /// Whether `key` can be injected at all. Checked once at startup.
    fn supports(
        &self,
        _key: KeySpec,
    ) -> bool {
        true
    }

    fn key_down(
        &mut self,
        key: KeySpec,
    ) -> Result<(), InjectError>;

    fn key_up(
        &mut self,
        key: KeySpec,
    ) -> Result<(), InjectError>;
}

/// Logs taps instead of injecting them.
#[derive(Default, Debug)]
pub struct LogInjector;

impl KeyInjector for LogInjector {
    fn key_down(
        &mut self,
        key: KeySpec,
    ) -> Result<(), InjectError> {
        tracing::info!("key down {:?}", key);
        Ok(())
    }

    fn key_up(
        &mut self,
        key: KeySpec,
    ) -> Result<(), InjectError> {
        tracing::info!("key up {:?}", key);
        Ok(())
    }
}

/// Taps keyboard keys through an injector.
pub struct KeyboardEmulator {
    injector: Box<dyn KeyInjector>,
}

impl KeyboardEmulator {
    pub fn new(injector: Box<dyn KeyInjector>) -> Self { Self { injector } }

    #[inline]
    pub fn supports(
        &self,
        key: KeySpec,
    ) -> bool {
        self.injector.supports(key)
    }

    /// Key down followed by key up. The up is not sent if the down failed.
    pub fn tap(
        &mut self,
        key: KeySpec,
    ) -> Result<(), InjectError> {
        self.injector.key_down(key)?;
        self.injector.key_up(key)
    }
}

impl Default for KeyboardEmulator {
    fn default() -> Self { Self::new(Box::new(LogInjector)) }
}

// =============================================================================
// OS injection
// =============================================================================

#[cfg(feature = "rdev")]
pub use self::os::OsInjector;

#[cfg(feature = "rdev")]
mod os {
    use haldeck_common::keyspec::{KeySpec, NamedKey};
    use rdev::{EventType, Key};

    use super::{InjectError, KeyInjector};

    /// Injects into the OS input queue.
    #[derive(Default, Debug)]
    pub struct OsInjector;

    fn function_key(n: u8) -> Option<Key> {
        const KEYS: [Key; 12] = [
            Key::F1,
            Key::F2,
            Key::F3,
            Key::F4,
            Key::F5,
            Key::F6,
            Key::F7,
            Key::F8,
            Key::F9,
            Key::F10,
            Key::F11,
            Key::F12,
        ];
        KEYS.get(usize::from(n).checked_sub(1)?).copied()
    }

    fn letter_key(c: char) -> Option<Key> {
        const KEYS: [Key; 26] = [
            Key::KeyA,
            Key::KeyB,
            Key::KeyC,
            Key::KeyD,
            Key::KeyE,
            Key::KeyF,
            Key::KeyG,
            Key::KeyH,
            Key::KeyI,
            Key::KeyJ,
            Key::KeyK,
            Key::KeyL,
            Key::KeyM,
            Key::KeyN,
            Key::KeyO,
            Key::KeyP,
            Key::KeyQ,
            Key::KeyR,
            Key::KeyS,
            Key::KeyT,
            Key::KeyU,
            Key::KeyV,
            Key::KeyW,
            Key::KeyX,
            Key::KeyY,
            Key::KeyZ,
        ];
        let c = c.to_ascii_lowercase();
        c.is_ascii_lowercase()
            .then(|| KEYS[usize::from(c as u8 - b'a')])
    }

    fn digit_key(c: char) -> Option<Key> {
        const KEYS: [Key; 10] = [
            Key::Num0,
            Key::Num1,
            Key::Num2,
            Key::Num3,
            Key::Num4,
            Key::Num5,
            Key::Num6,
            Key::Num7,
            Key::Num8,
            Key::Num9,
        ];
        c.to_digit(10).map(|d| KEYS[d as usize])
    }

    fn rdev_key(spec: KeySpec) -> Option<Key> {
        match spec {
            KeySpec::Char(' ') => Some(Key::Space),
            KeySpec::Char('-') => Some(Key::Minus),
            KeySpec::Char('=') => Some(Key::Equal),
            KeySpec::Char(',') => Some(Key::Comma),
            KeySpec::Char('.') => Some(Key::Dot),
            KeySpec::Char('/') => Some(Key::Slash),
            KeySpec::Char(';') => Some(Key::SemiColon),
            KeySpec::Char('\'') => Some(Key::Quote),
            KeySpec::Char('[') => Some(Key::LeftBracket),
            KeySpec::Char(']') => Some(Key::RightBracket),
            KeySpec::Char('\\') => Some(Key::BackSlash),
            KeySpec::Char(c) => letter_key(c).or_else(|| digit_key(c)),
            KeySpec::Named(named) => match named {
                NamedKey::Function(n) => function_key(n),
                NamedKey::Space => Some(Key::Space),
                NamedKey::Enter => Some(Key::Return),
                NamedKey::Escape => Some(Key::Escape),
                NamedKey::Tab => Some(Key::Tab),
                NamedKey::Backspace => Some(Key::Backspace),
                NamedKey::Delete => Some(Key::Delete),
                NamedKey::Insert => Some(Key::Insert),
                NamedKey::Home => Some(Key::Home),
                NamedKey::End => Some(Key::End),
                NamedKey::PageUp => Some(Key::PageUp),
                NamedKey::PageDown => Some(Key::PageDown),
                NamedKey::Up => Some(Key::UpArrow),
                NamedKey::Down => Some(Key::DownArrow),
                NamedKey::Left => Some(Key::LeftArrow),
                NamedKey::Right => Some(Key::RightArrow),
                NamedKey::Shift => Some(Key::ShiftLeft),
                NamedKey::Ctrl => Some(Key::ControlLeft),
                NamedKey::Alt => Some(Key::Alt),
                NamedKey::Meta => Some(Key::MetaLeft),
                NamedKey::CapsLock => Some(Key::CapsLock),
                NamedKey::PrintScreen => Some(Key::PrintScreen),
                NamedKey::Pause => Some(Key::Pause),
                NamedKey::Menu => None,
            },
        }
    }

    fn send(
        spec: KeySpec,
        event: fn(Key) -> EventType,
    ) -> Result<(), InjectError> {
        let key = rdev_key(spec).ok_or(InjectError::Unsupported(spec))?;
        rdev::simulate(&event(key)).map_err(|e| InjectError::Os(format!("{e:?}")))
    }

    impl KeyInjector for OsInjector {
        fn supports(
            &self,
            key: KeySpec,
        ) -> bool {
            rdev_key(key).is_some()
        }

        fn key_down(
            &mut self,
            key: KeySpec,
        ) -> Result<(), InjectError> {
            send(key, EventType::KeyPress)
        }

        fn key_up(
            &mut self,
            key: KeySpec,
        ) -> Result<(), InjectError> {
            send(key, EventType::KeyRelease)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_function_keys_beyond_f12_are_unsupported() {
            let injector = OsInjector;
            assert!(injector.supports(KeySpec::Named(NamedKey::Function(12))));
            assert!(!injector.supports(KeySpec::Named(NamedKey::Function(13))));
            assert!(!injector.supports(KeySpec::Named(NamedKey::Menu)));
            assert!(injector.supports(KeySpec::Char('Q')));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
