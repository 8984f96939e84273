//! Keyboard key specifications for keyboard-type keys.
//!
//! Accepts the spellings used by existing deck configurations: a single
//! printable character (`a`, `5`, `/`), or a key name with an optional `Key.`
//! prefix (`Key.f5`, `F5`, `space`, `page_up`). Names are case-insensitive.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Non-character keys.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NamedKey {
    /// Function key `F1`..`F24`.
    Function(u8),
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Shift,
    Ctrl,
    Alt,
    Meta,
    CapsLock,
    Menu,
    PrintScreen,
    Pause,
}

/// What a keyboard key emits when tapped.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeySpec {
    /// A printable character.
    Char(char),
    /// A named, non-printing key.
    Named(NamedKey),
}

/// Key specification parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown keyboard key `{0}`")]
pub struct KeySpecError(pub alloc::string::String);

const NAMES: &[(&str, NamedKey)] = &[
    ("space", NamedKey::Space),
    ("enter", NamedKey::Enter),
    ("return", NamedKey::Enter),
    ("esc", NamedKey::Escape),
    ("escape", NamedKey::Escape),
    ("tab", NamedKey::Tab),
    ("backspace", NamedKey::Backspace),
    ("delete", NamedKey::Delete),
    ("del", NamedKey::Delete),
    ("insert", NamedKey::Insert),
    ("home", NamedKey::Home),
    ("end", NamedKey::End),
    ("page_up", NamedKey::PageUp),
    ("pageup", NamedKey::PageUp),
    ("page_down", NamedKey::PageDown),
    ("pagedown", NamedKey::PageDown),
    ("up", NamedKey::Up),
    ("down", NamedKey::Down),
    ("left", NamedKey::Left),
    ("right", NamedKey::Right),
    ("shift", NamedKey::Shift),
    ("ctrl", NamedKey::Ctrl),
    ("control", NamedKey::Ctrl),
    ("alt", NamedKey::Alt),
    ("cmd", NamedKey::Meta),
    ("meta", NamedKey::Meta),
    ("super", NamedKey::Meta),
    ("caps_lock", NamedKey::CapsLock),
    ("capslock", NamedKey::CapsLock),
    ("menu", NamedKey::Menu),
    ("print_screen", NamedKey::PrintScreen),
    ("pause", NamedKey::Pause),
];

impl FromStr for KeySpec {
    type Err = KeySpecError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = || KeySpecError(text.into());
        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next())
            && !c.is_control()
        {
            return Ok(Self::Char(c));
        }

        let name = trimmed.strip_prefix("Key.").unwrap_or(trimmed);
        if let Some(number) = name.strip_prefix(['f', 'F'])
            && let Ok(n) = number.parse::<u8>()
        {
            return if (1..=24).contains(&n) {
                Ok(Self::Named(NamedKey::Function(n)))
            } else {
                Err(error())
            };
        }

        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, key)| Self::Named(*key))
            .ok_or_else(error)
    }
}

impl fmt::Display for KeySpec {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::Named(NamedKey::Function(n)) => write!(f, "F{n}"),
            Self::Named(key) => write!(f, "{key:?}"),
        }
    }
}
