//! HalDeck daemon library.
//!
//! Everything that touches the outside world lives here; the key model,
//! compositing and debounce logic come from `haldeck-common`. The binary
//! (`main.rs`) only wires these pieces together.
//!
//! - [`bus`]: In-process named signal table
//! - [`registry`], [`bindings`]: Signal registration for the configured panel
//! - [`panel`], [`controller`], [`link`]: The running panel, page transitions and reconnects
//! - [`device`]: Deck boundary and the headless snapshot deck
//! - [`keyboard`]: Synthetic key taps
//! - [`tasks`]: Async panel loop and its event channel
//! - [`settings`], [`assets`], [`logging`], [`console`]: Default collaborators
//!
//! # Testing
//!
//! ```bash
//! cargo test --workspace
//! cargo test --features rdev     # with OS key injection compiled in
//! ```

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod assets;
pub mod bindings;
pub mod bus;
pub mod console;
pub mod controller;
pub mod device;
pub mod keyboard;
pub mod link;
pub mod logging;
pub mod panel;
pub mod registry;
pub mod settings;
pub mod tasks;
pub mod timing;

pub use bus::SignalBus;
pub use device::{Deck, DeckEvent, DeckModel};
pub use panel::{Panel, PanelError};
