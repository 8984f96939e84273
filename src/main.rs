//! HalDeck daemon.
//!
//! Loads the configuration, registers the panel's signals and keeps the deck
//! in sync with them until Ctrl-C, `quit` on the console, or a deck that does
//! not come back after a disconnect.
//!
//! # Usage
//!
//! ```bash
//! haldeck deck.toml                         # 15-key deck, assets/ next to deck.toml
//! haldeck deck.toml --model xl --snapshot panel.png
//! RUST_LOG=haldeck::panel=trace haldeck deck.toml   # with Verbose = true
//! ```
//!
//! # Exit Codes
//!
//! - `0`: clean shutdown
//! - `1`: configuration error, duplicate signal, or deck lost for good

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use embassy_executor::Spawner;
use haldeck::assets::FileAssets;
use haldeck::console::Console;
use haldeck::device::SnapshotDeck;
use haldeck::keyboard::KeyboardEmulator;
use haldeck::tasks::{SHUTDOWN, run_panel};
use haldeck::{DeckModel, Panel, SignalBus, logging, settings};
use haldeck_common::ConfigModel;

#[derive(Debug, Parser)]
#[command(version, about = "Keeps a Stream Deck style key panel in sync with named HAL signals")]
struct Cli {
    /// Configuration file (TOML).
    config: PathBuf,

    /// Directory for relative image names [default: `assets/` next to the config file]
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Deck model, sets the key grid.
    #[arg(long, value_enum, default_value_t = DeckModel::Original)]
    model: DeckModel,

    /// Write the panel contents to this PNG after every update.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Do not read commands from stdin.
    #[arg(long)]
    no_console: bool,
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    // The executor never returns, so the exit code is set by hand.
    let code = match run(Cli::parse()).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("haldeck: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let layout = cli.model.layout();
    let raw = settings::load(&cli.config)?;
    let model = ConfigModel::build(&raw, layout.key_count())
        .with_context(|| format!("invalid configuration {}", cli.config.display()))?;
    logging::init(model.general().verbose);
    tracing::info!(
        "{} pages, {} keys per page, prefix `{}`",
        model.pages().count(),
        layout.key_count(),
        model.general().prefix
    );

    let assets_dir = cli.assets.unwrap_or_else(|| {
        cli.config
            .parent()
            .map_or_else(|| PathBuf::from("assets"), |dir| dir.join("assets"))
    });
    let assets = FileAssets::new(assets_dir);
    tracing::debug!("images from {}", assets.root().display());
    let deck = SnapshotDeck::new(layout, cli.snapshot);
    let plugged = deck.link();
    let bus = SignalBus::new();

    #[cfg(feature = "rdev")]
    let keyboard = KeyboardEmulator::new(Box::new(haldeck::keyboard::OsInjector));
    #[cfg(not(feature = "rdev"))]
    let keyboard = KeyboardEmulator::default();

    let mut panel = Panel::new(model, bus.clone(), Box::new(assets), deck, keyboard)?;

    ctrlc::set_handler(|| SHUTDOWN.signal(())).context("cannot install Ctrl-C handler")?;
    if !cli.no_console {
        Console::new(bus, plugged)
            .spawn()
            .context("cannot start console")?;
    }

    let result = run_panel(&mut panel).await;
    panel.shutdown();
    result.map_err(anyhow::Error::from)
}
