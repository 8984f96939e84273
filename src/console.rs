//! Interactive stdin console.
//!
//! Stands in for `halcmd` and for a finger on the deck while no real HAL or
//! hardware is attached:
//!
//! ```text
//! setp <signal> <value>   write an externally driven signal
//! getp <signal>           print one signal
//! show                    print every signal
//! press <key>             press a deck key
//! release <key>           release a deck key
//! tap <key>               press and release
//! unplug / plug           pull / reinsert the deck cable
//! quit                    stop the daemon
//! ```
//!
//! The console runs on its own thread and reaches the panel only through the
//! event channel and the shutdown signal.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use thiserror::Error;

use crate::bus::SignalBus;
use crate::device::DeckEvent;
use crate::tasks::{SHUTDOWN, post_event};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Command {
    Set { name: String, value: String },
    Get(String),
    Show,
    Press(usize),
    Release(usize),
    Tap(usize),
    Unplug,
    Plug,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("`{0}` is not a key number")]
    BadKey(String),
}

impl Command {
    /// Parse one console line. Blank lines and `#` comments give `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next().filter(|w| !w.starts_with('#')) else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let key = |usage| match args.as_slice() {
            [index] => index.parse::<usize>().map_err(|_| CommandError::BadKey((*index).into())),
            _ => Err(CommandError::Usage(usage)),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "setp" | "set" => match args.as_slice() {
                [name, value] => Self::Set {
                    name: (*name).into(),
                    value: (*value).into(),
                },
                _ => return Err(CommandError::Usage("setp <signal> <value>")),
            },
            "getp" | "get" => match args.as_slice() {
                [name] => Self::Get((*name).into()),
                _ => return Err(CommandError::Usage("getp <signal>")),
            },
            "show" => Self::Show,
            "press" => Self::Press(key("press <key>")?),
            "release" => Self::Release(key("release <key>")?),
            "tap" => Self::Tap(key("tap <key>")?),
            "unplug" => Self::Unplug,
            "plug" => Self::Plug,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.into())),
        };
        Ok(Some(command))
    }
}

/// Console state shared with the rest of the daemon.
pub struct Console {
    bus: SignalBus,
    /// Cable state of the deck, see [`SnapshotDeck::link`](crate::device::SnapshotDeck::link).
    plugged: Arc<AtomicBool>,
}

impl Console {
    pub fn new(
        bus: SignalBus,
        plugged: Arc<AtomicBool>,
    ) -> Self {
        Self { bus, plugged }
    }

    /// Read commands from stdin on a background thread until EOF or `quit`.
    pub fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new().name("console".into()).spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if !self.execute(command) {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            tracing::debug!("console closed");
        })
    }

    /// Run one command. Returns `false` once the console should stop.
    pub fn execute(
        &self,
        command: Command,
    ) -> bool {
        match command {
            Command::Set { name, value } => {
                if let Err(e) = self.bus.set(&name, &value) {
                    println!("{e}");
                }
            }
            Command::Get(name) => match self.bus.get(&name) {
                Ok(value) => println!("{name} = {value}"),
                Err(e) => println!("{e}"),
            },
            Command::Show => {
                for (name, kind, direction, value) in self.bus.snapshot() {
                    let direction = format!("{direction:?}").to_lowercase();
                    println!("{name} ({kind} {direction}) = {value}");
                }
            }
            Command::Press(index) => post_event(DeckEvent::Pressed(index)),
            Command::Release(index) => post_event(DeckEvent::Released(index)),
            Command::Tap(index) => {
                post_event(DeckEvent::Pressed(index));
                post_event(DeckEvent::Released(index));
            }
            Command::Unplug => {
                self.plugged.store(false, Ordering::Release);
                post_event(DeckEvent::Disconnected);
            }
            Command::Plug => {
                self.plugged.store(true, Ordering::Release);
                post_event(DeckEvent::Reconnected);
            }
            Command::Help => println!("setp getp show press release tap unplug plug quit"),
            Command::Quit => {
                SHUTDOWN.signal(());
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
