//! Async panel loop and the statics that feed it.
//!
//! Producers outside the executor (the console thread, device readers, the
//! Ctrl-C handler) never touch the panel: they `try_send` into
//! [`DECK_EVENTS`] or raise [`SHUTDOWN`]. The loop handles one event or one
//! tick at a time, so a page transition always completes before the next
//! event is looked at.

use core::time::Duration;

use embassy_futures::select::{Either3, select3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Ticker};

use crate::device::{Deck, DeckEvent};
use crate::panel::{Panel, PanelError};
use crate::timing::TICK;

// =============================================================================
// Cross-thread Plumbing
// =============================================================================

/// Press/release and link events from device readers and the console.
pub static DECK_EVENTS: EventQueue<EVENT_QUEUE_DEPTH> = Channel::new();

/// Raised once to stop the panel loop.
pub static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();

const EVENT_QUEUE_DEPTH: usize = 64;

pub type EventQueue<const N: usize> = Channel<CriticalSectionRawMutex, DeckEvent, N>;

/// Queue an event on [`DECK_EVENTS`] without blocking.
pub fn post_event(event: DeckEvent) { post_to(&DECK_EVENTS, event); }

/// Queue an event without blocking; drops it when the queue is full.
pub fn post_to<const N: usize>(
    events: &EventQueue<N>,
    event: DeckEvent,
) -> bool {
    let queued = events.try_send(event).is_ok();
    if !queued {
        tracing::warn!("event queue full, {:?} dropped", event);
    }
    queued
}

/// Start the panel and run it until [`SHUTDOWN`] is raised or the deck is
/// lost for good.
///
/// Returns after the in-flight event or tick has been handled; shutting the
/// panel down is left to the caller.
pub async fn run_panel<D: Deck>(panel: &mut Panel<D>) -> Result<(), PanelError> {
    drive_panel(panel, &DECK_EVENTS, &SHUTDOWN).await
}

async fn drive_panel<D: Deck, const N: usize>(
    panel: &mut Panel<D>,
    events: &EventQueue<N>,
    shutdown: &Signal<CriticalSectionRawMutex, ()>,
) -> Result<(), PanelError> {
    let epoch = Instant::now();
    let elapsed = || Duration::from_micros(epoch.elapsed().as_micros());
    let mut ticker = Ticker::every(embassy_time::Duration::from_micros(TICK.as_micros() as u64));

    panel.start(elapsed());
    tracing::debug!("panel loop running, tick {:?}", TICK);
    loop {
        match select3(shutdown.wait(), events.receive(), ticker.next()).await {
            Either3::First(()) => {
                tracing::info!("shutdown requested");
                return Ok(());
            }
            Either3::Second(event) => panel.handle_event(event, elapsed()),
            Either3::Third(()) => panel.tick(elapsed())?,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embassy_time::Timer;
    use haldeck_common::ConfigModel;
    use haldeck_common::config::{RawConfig, RawSection};

    use super::*;
    use crate::assets::FileAssets;
    use crate::bus::{SignalBus, SignalValue};
    use crate::device::{DeckModel, SnapshotDeck};
    use crate::keyboard::KeyboardEmulator;

    fn panel(bus: &SignalBus) -> Panel<SnapshotDeck> {
        let mut raw = RawConfig::default();
        raw.insert_key(
            1,
            0,
            RawSection::new("page.1.key.00")
                .with("Type", "momentary")
                .with("PinAlias", "Estop"),
        );
        let layout = DeckModel::Mini.layout();
        let model = ConfigModel::build(&raw, layout.key_count()).unwrap();
        let deck = SnapshotDeck::new(layout, None);
        let assets = Box::new(FileAssets::new("assets"));
        Panel::new(model, bus.clone(), assets, deck, KeyboardEmulator::default()).unwrap()
    }

    #[test]
    fn test_full_queue_drops_events() {
        let events: EventQueue<2> = Channel::new();
        assert!(post_to(&events, DeckEvent::Pressed(0)));
        assert!(post_to(&events, DeckEvent::Released(0)));
        assert!(!post_to(&events, DeckEvent::Pressed(1)));
        assert_eq!(events.try_receive(), Ok(DeckEvent::Pressed(0)));
        assert_eq!(events.try_receive(), Ok(DeckEvent::Released(0)));
        assert!(events.try_receive().is_err());
    }

    #[test]
    fn test_events_reach_panel_until_shutdown() {
        let bus = SignalBus::new();
        let mut panel = panel(&bus);
        let events: EventQueue<4> = Channel::new();
        let shutdown = Signal::new();

        let control = async {
            events.send(DeckEvent::Pressed(0)).await;
            Timer::after_millis(50).await;
            shutdown.signal(());
        };
        let (result, ()) = block_on(join(drive_panel(&mut panel, &events, &shutdown), control));

        assert!(result.is_ok());
        assert_eq!(bus.get("haldeck.page.1.Estop.out").unwrap(), SignalValue::Bit(true));
        assert_eq!(bus.get("haldeck.page-current").unwrap(), SignalValue::S32(1));
        panel.shutdown();
        assert!(bus.names().is_empty(), "signals released");
    }

    #[test]
    fn test_pending_shutdown_wins_over_events() {
        let bus = SignalBus::new();
        let mut panel = panel(&bus);
        let events: EventQueue<4> = Channel::new();
        let shutdown = Signal::new();
        assert!(post_to(&events, DeckEvent::Pressed(0)));
        shutdown.signal(());

        assert!(block_on(drive_panel(&mut panel, &events, &shutdown)).is_ok());
        assert_eq!(bus.get("haldeck.page.1.Estop.out").unwrap(), SignalValue::Bit(false));
        assert_eq!(events.len(), 1, "event left queued");
    }
}
