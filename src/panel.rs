//! The panel: signals in, key faces out, presses back to signals.
//!
//! [`Panel`] owns everything the running daemon mutates: the registered
//! signals, the render caches, the page controller, the per-key debounce
//! gates and the device. It is driven from outside by two entry points,
//! [`Panel::tick`] for the periodic signal poll and [`Panel::handle_event`]
//! for device events, both taking `now` as an offset from the caller's epoch.
//!
//! # Page Transitions
//!
//! A transition is one ordered batch: reset the `out` signals of the page
//! being left, reseed the destination's display keys, composite and push
//! every destination key (or the splash canvas), flush, and only then write
//! `page-current`. Whoever watches `page-current` therefore never sees a
//! page number whose keys are not on the device yet.
//!
//! # Device Link
//!
//! A failed push marks the link down; pushes are skipped while it is down
//! but signals keep being polled and composited. Reconnects follow the
//! backoff in [`link`](crate::link); once the deck is back the brightness is
//! restored and the active page is pushed again in full.

use core::time::Duration;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use haldeck_common::debounce::DebounceScheduler;
use haldeck_common::keyspec::KeySpec;
use haldeck_common::{AssetSource, ConfigModel, Key, KeyInputs, Page, PageId, RenderEngine};
use thiserror::Error;

use crate::bindings::{PanelPins, bind_panel};
use crate::bus::SignalBus;
use crate::controller::{PageController, Transition};
use crate::device::{Deck, DeckError, DeckEvent};
use crate::keyboard::KeyboardEmulator;
use crate::link::{Exhausted, Link};
use crate::registry::{BoolPin, RegistryError, SignalRegistry};
use crate::timing::KEEPALIVE_INTERVAL;

/// Fatal panel failures.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("deck has {deck} keys, configuration was validated for {config}")]
    KeyCountMismatch { deck: usize, config: usize },
    #[error("page {page} key {index}: `{key}` cannot be injected on this platform")]
    UnsupportedKey { page: PageId, index: usize, key: KeySpec },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    ReconnectExhausted(#[from] Exhausted),
}

pub struct Panel<D: Deck> {
    model: Arc<ConfigModel>,
    registry: SignalRegistry,
    pins: PanelPins,
    engine: RenderEngine,
    deck: D,
    keyboard: KeyboardEmulator,
    pages: PageController,
    link: Link,
    /// Debounce gate per display key with a `value` signal.
    displays: BTreeMap<(PageId, usize), DebounceScheduler>,
    /// Keyboard keys currently held down.
    held: BTreeSet<(PageId, usize)>,
    /// Something was pushed since the last flush.
    unflushed: bool,
    last_keepalive: Duration,
}

impl<D: Deck> Panel<D> {
    /// Register all signals on `bus` and set up the caches. Nothing is sent
    /// to the deck before [`start`](Self::start).
    pub fn new(
        model: ConfigModel,
        bus: SignalBus,
        assets: Box<dyn AssetSource>,
        deck: D,
        keyboard: KeyboardEmulator,
    ) -> Result<Self, PanelError> {
        let layout = deck.layout();
        if layout.key_count() != model.key_count() {
            return Err(PanelError::KeyCountMismatch {
                deck: layout.key_count(),
                config: model.key_count(),
            });
        }

        for (page, definition) in model.pages() {
            for (index, key) in definition.keys().iter().enumerate() {
                if let Key::Keyboard(keyboard_key) = key
                    && !keyboard.supports(keyboard_key.key)
                {
                    return Err(PanelError::UnsupportedKey {
                        page,
                        index,
                        key: keyboard_key.key,
                    });
                }
            }
        }

        let mut registry = SignalRegistry::new(bus, &model.general().prefix);
        let pins = bind_panel(&mut registry, &model)?;

        let mut displays = BTreeMap::new();
        for (page, definition) in model.pages() {
            for (index, key) in definition.keys().iter().enumerate() {
                if let Key::DisplayFloat(display) = key
                    && display.float_pin
                {
                    displays.insert((page, index), DebounceScheduler::new(display.min_step, display.min_interval));
                }
            }
        }

        let pages = PageController::new(model.general().initial_page);
        Ok(Self {
            model: Arc::new(model),
            registry,
            pins,
            engine: RenderEngine::new(assets, layout),
            deck,
            keyboard,
            pages,
            link: Link::Up,
            displays,
            held: BTreeSet::new(),
            unflushed: false,
            last_keepalive: Duration::ZERO,
        })
    }

    #[inline]
    pub fn current_page(&self) -> PageId { self.pages.current() }

    #[inline]
    pub fn deck(&self) -> &D { &self.deck }

    /// Light up the deck with the initial page and publish it.
    pub fn start(
        &mut self,
        now: Duration,
    ) {
        let page = self.pages.current();
        tracing::info!("starting on page {}", page);
        self.last_keepalive = now;
        let brightness = self.model.general().brightness;
        let result = self.deck.set_brightness(brightness);
        self.deliver(result, now);
        self.show_page(page, now);
        self.publish_current(page);
    }

    /// Periodic work: reconnects, page requests, signal poll, keepalive.
    pub fn tick(
        &mut self,
        now: Duration,
    ) -> Result<(), PanelError> {
        self.maintain_link(now)?;

        let select = self.registry.read_int(&self.pins.page_select);
        match self.pages.observe_select(select, &self.model) {
            Some(transition) => self.change_page(transition, now),
            None => self.render_page(self.pages.current(), now, false),
        }

        if self.link.is_up() && now.saturating_sub(self.last_keepalive) >= KEEPALIVE_INTERVAL {
            self.last_keepalive = now;
            let result = self.deck.keepalive();
            self.deliver(result, now);
        }

        self.flush(now);
        Ok(())
    }

    /// React to one device event.
    pub fn handle_event(
        &mut self,
        event: DeckEvent,
        now: Duration,
    ) {
        tracing::debug!("{:?}", event);
        match event {
            DeckEvent::Pressed(index) => {
                let page = self.pages.press(index);
                self.press(page, index);
            }
            DeckEvent::Released(index) => match self.pages.release(index) {
                Some(page) => self.release(page, index),
                None => tracing::debug!("release of key {} without press", index),
            },
            DeckEvent::Disconnected => self.link.lost(now),
            DeckEvent::Reconnected => {
                self.resync(now);
                return;
            }
        }
        self.render_page(self.pages.current(), now, false);
        self.flush(now);
    }

    /// Blank the deck and drop every signal.
    pub fn shutdown(mut self) {
        if self.link.is_up()
            && let Err(e) = self.deck.reset()
        {
            tracing::warn!("deck reset failed: {}", e);
        }
        self.registry.release();
        tracing::info!("panel shut down");
    }

    // =========================================================================
    // Pages
    // =========================================================================

    fn change_page(
        &mut self,
        transition: Transition,
        now: Duration,
    ) {
        self.leave_page(transition.from);
        self.show_page(transition.to, now);
        let page = self.pages.publish(transition);
        self.publish_current(page);
    }

    /// Release everything the page being left still holds.
    fn leave_page(
        &mut self,
        page: PageId,
    ) {
        let model = Arc::clone(&self.model);
        let keys = model.page(page).map_or(&[][..], Page::keys);
        for (index, key) in keys.iter().enumerate() {
            if let Key::Momentary(_) = key
                && let Some(out) = self.pins.key(page, index).and_then(|pins| pins.out.as_ref())
            {
                self.registry.write_bool(out, false);
            }
        }
        self.held.retain(|(held_page, _)| *held_page != page);
    }

    /// Reseed, push in full and flush.
    fn show_page(
        &mut self,
        page: PageId,
        now: Duration,
    ) {
        for ((_, index), gate) in self.displays.range_mut((page, 0)..=(page, usize::MAX)) {
            let pin = self.pins.key(page, *index).and_then(|pins| pins.value.as_ref());
            if let Some(pin) = pin {
                gate.reseed(self.registry.read_float(pin), now);
            }
        }
        self.render_page(page, now, true);
        self.flush(now);
    }

    fn publish_current(
        &mut self,
        page: PageId,
    ) {
        self.registry.write_int(&self.pins.page_current, i32::from(page.get()));
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Composite every key of `page` and push what changed, or everything
    /// when `force` is set.
    fn render_page(
        &mut self,
        page: PageId,
        now: Duration,
        force: bool,
    ) {
        let model = Arc::clone(&self.model);
        match model.page(page) {
            Some(Page::Normal(keys)) => {
                for (index, key) in keys.iter().enumerate() {
                    let inputs = self.inputs(page, index, key, now);
                    let composite = self.engine.composite(page, index, key, &inputs);
                    if (composite.changed || force) && self.link.is_up() {
                        let result = self.deck.set_key_image(index, composite.image);
                        self.unflushed |= self.deliver(result, now);
                    }
                }
            }
            Some(Page::Splash(splash)) if force => {
                let canvas = self.engine.composite_splash(page, splash);
                if self.link.is_up() {
                    let result = self.deck.set_full_image(canvas);
                    self.unflushed |= self.deliver(result, now);
                }
            }
            Some(Page::Splash(_)) | None => {}
        }
    }

    /// Observable inputs of one key right now.
    fn inputs(
        &mut self,
        page: PageId,
        index: usize,
        key: &Key,
        now: Duration,
    ) -> KeyInputs {
        let pins = self.pins.key(page, index);
        match key {
            Key::Momentary(_) => {
                let read = |pin: Option<&BoolPin>, default| {
                    pin.map_or(default, |pin| self.registry.read_bool(pin))
                };
                KeyInputs {
                    active: read(pins.and_then(|p| p.out.as_ref()), false),
                    highlighted: read(pins.and_then(|p| p.input.as_ref()), false),
                    enabled: read(pins.and_then(|p| p.enable.as_ref()), true),
                    value: None,
                }
            }
            // Hold time only shows on the face: the tap went out on press,
            // the active face stays up until the physical release.
            Key::Keyboard(_) => KeyInputs {
                active: self.held.contains(&(page, index)),
                ..KeyInputs::default()
            },
            Key::DisplayFloat(_) => {
                let pin = pins.and_then(|p| p.value.as_ref());
                let value = match (pin, self.displays.get_mut(&(page, index))) {
                    (Some(pin), Some(gate)) => {
                        gate.offer(self.registry.read_float(pin), now);
                        gate.value()
                    }
                    _ => None,
                };
                KeyInputs {
                    value,
                    ..KeyInputs::default()
                }
            }
            Key::Unused => KeyInputs::default(),
        }
    }

    // =========================================================================
    // Presses
    // =========================================================================

    fn key_on(
        &self,
        page: PageId,
        index: usize,
    ) -> Option<Key> {
        self.model.page(page)?.keys().get(index).cloned()
    }

    fn press(
        &mut self,
        page: PageId,
        index: usize,
    ) {
        let Some(key) = self.key_on(page, index) else {
            tracing::debug!("press on key {} of page {} ignored", index, page);
            return;
        };
        match key {
            Key::Momentary(momentary) => {
                let Some(pins) = self.pins.key(page, index) else { return };
                let enabled = pins.enable.as_ref().is_none_or(|pin| self.registry.read_bool(pin));
                if !enabled {
                    tracing::debug!("{} is disabled, press ignored", momentary.alias);
                    return;
                }
                if let Some(out) = &pins.out {
                    self.registry.write_bool(out, true);
                }
            }
            Key::Keyboard(keyboard) => {
                if let Err(e) = self.keyboard.tap(keyboard.key) {
                    tracing::warn!("{}", e);
                }
                self.held.insert((page, index));
            }
            Key::DisplayFloat(_) | Key::Unused => {}
        }
    }

    fn release(
        &mut self,
        page: PageId,
        index: usize,
    ) {
        match self.key_on(page, index) {
            Some(Key::Momentary(_)) => {
                if let Some(out) = self.pins.key(page, index).and_then(|pins| pins.out.as_ref()) {
                    self.registry.write_bool(out, false);
                }
            }
            Some(Key::Keyboard(_)) => {
                self.held.remove(&(page, index));
            }
            _ => {}
        }
    }

    // =========================================================================
    // Device Link
    // =========================================================================

    /// Mark the link down on a failed device call. Returns whether it succeeded.
    fn deliver(
        &mut self,
        result: Result<(), DeckError>,
        now: Duration,
    ) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{}", e);
                self.link.lost(now);
                false
            }
        }
    }

    fn flush(
        &mut self,
        now: Duration,
    ) {
        if !self.unflushed || !self.link.is_up() {
            return;
        }
        let result = self.deck.flush();
        if self.deliver(result, now) {
            self.unflushed = false;
        }
    }

    fn maintain_link(
        &mut self,
        now: Duration,
    ) -> Result<(), PanelError> {
        if !self.link.due(now) {
            return Ok(());
        }
        match self.deck.reconnect() {
            Ok(()) => self.resync(now),
            Err(e) => {
                tracing::debug!("reconnect failed: {}", e);
                self.link.failed(now)?;
            }
        }
        Ok(())
    }

    /// Bring a deck that came back up to date.
    fn resync(
        &mut self,
        now: Duration,
    ) {
        self.link.restored();
        let brightness = self.model.general().brightness;
        let result = self.deck.set_brightness(brightness);
        if self.deliver(result, now) {
            let page = self.pages.current();
            self.render_page(page, now, true);
            self.flush(now);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::*;
    use haldeck_common::colors::HIGHLIGHT;
    use haldeck_common::config::{RawConfig, RawSection};
    use haldeck_common::keyspec::{KeySpec, NamedKey};
    use haldeck_common::{AssetError, PanelLayout, RasterBuffer, RasterImage};

    use super::*;
    use crate::bus::SignalValue;
    use crate::device::DeckModel;
    use crate::keyboard::tests::RecordingInjector;
    use crate::link::backoff_delay;

    #[derive(Clone, Debug, PartialEq)]
    enum Op {
        /// Key face pushed; records `page-current` at push time and the face centre.
        Key { index: usize, page_current: i32, center: Rgb888 },
        Full,
        Brightness(u8),
        Reconnect,
        Keepalive,
        Flush,
        Reset,
    }

    struct RecordingDeck {
        layout: PanelLayout,
        bus: SignalBus,
        ops: Rc<RefCell<Vec<Op>>>,
        online: Rc<Cell<bool>>,
    }

    impl RecordingDeck {
        fn record(
            &self,
            op: Op,
        ) -> Result<(), DeckError> {
            if !self.online.get() {
                return Err(DeckError::Disconnected);
            }
            self.ops.borrow_mut().push(op);
            Ok(())
        }
    }

    impl Deck for RecordingDeck {
        fn layout(&self) -> PanelLayout { self.layout }

        fn set_key_image(
            &mut self,
            index: usize,
            image: &RasterBuffer,
        ) -> Result<(), DeckError> {
            let page_current = match self.bus.get("haldeck.page-current") {
                Ok(SignalValue::S32(v)) => v,
                _ => -1,
            };
            let center = image.pixel(40, 40).unwrap_or(Rgb888::BLACK);
            self.record(Op::Key {
                index,
                page_current,
                center,
            })
        }

        fn set_full_image(
            &mut self,
            _canvas: &RasterBuffer,
        ) -> Result<(), DeckError> {
            self.record(Op::Full)
        }

        fn set_brightness(
            &mut self,
            percent: u8,
        ) -> Result<(), DeckError> {
            self.record(Op::Brightness(percent))
        }

        fn reconnect(&mut self) -> Result<(), DeckError> {
            self.ops.borrow_mut().push(Op::Reconnect);
            if self.online.get() { Ok(()) } else { Err(DeckError::Disconnected) }
        }

        fn keepalive(&mut self) -> Result<(), DeckError> { self.record(Op::Keepalive) }

        fn flush(&mut self) -> Result<(), DeckError> { self.record(Op::Flush) }

        fn reset(&mut self) -> Result<(), DeckError> { self.record(Op::Reset) }
    }

    /// Solid 8x8 images: `off.png` green, `on.png` red.
    struct SolidAssets;

    impl AssetSource for SolidAssets {
        fn load(
            &mut self,
            name: &str,
        ) -> Result<RasterImage, AssetError> {
            let rgba = match name {
                "off.png" => [0, 255, 0, 255],
                "on.png" => [255, 0, 0, 255],
                _ => return Err(AssetError::NotFound(name.into())),
            };
            RasterImage::from_rgba(8, 8, rgba.repeat(64)).ok_or_else(|| AssetError::NotFound(name.into()))
        }
    }

    struct Rig {
        panel: Panel<RecordingDeck>,
        bus: SignalBus,
        ops: Rc<RefCell<Vec<Op>>>,
        online: Rc<Cell<bool>>,
        taps: Rc<RefCell<Vec<(bool, KeySpec)>>>,
    }

    impl Rig {
        fn take(&self) -> Vec<Op> { self.ops.borrow_mut().drain(..).collect() }

        fn keys(&self) -> Vec<Op> {
            self.take()
                .into_iter()
                .filter(|op| matches!(op, Op::Key { .. }))
                .collect()
        }

        fn bit(
            &self,
            name: &str,
        ) -> bool {
            self.bus.get(name).unwrap() == SignalValue::Bit(true)
        }
    }

    fn ms(millis: u64) -> Duration { Duration::from_millis(millis) }

    fn model() -> ConfigModel {
        let mut raw = RawConfig::default();
        raw.insert_key(
            1,
            0,
            RawSection::new("page.1.key.00")
                .with("Type", "momentary")
                .with("PinAlias", "Estop")
                .with("InactiveImage", "off.png")
                .with("ActiveImage", "on.png")
                .with("EnablePin", "true"),
        );
        raw.insert_key(
            1,
            1,
            RawSection::new("page.1.key.01")
                .with("Type", "keyboard")
                .with("KeyboardKey", "F5"),
        );
        raw.insert_key(
            1,
            2,
            RawSection::new("page.1.key.02")
                .with("Type", "display-float")
                .with("PinAlias", "Xpos")
                .with("FloatPin", "true")
                .with("Format", "{:.2f}"),
        );
        raw.insert_key(
            2,
            0,
            RawSection::new("page.2.key.00")
                .with("Type", "momentary")
                .with("PinAlias", "Jog"),
        );
        raw.insert_page(
            12,
            RawSection::new("page.12")
                .with("Type", "splash")
                .with("SplashImage", "on.png"),
        );
        ConfigModel::build(&raw, 6).unwrap()
    }

    fn rig() -> Rig {
        let bus = SignalBus::new();
        let ops = Rc::new(RefCell::new(Vec::new()));
        let online = Rc::new(Cell::new(true));
        let deck = RecordingDeck {
            layout: DeckModel::Mini.layout(),
            bus: bus.clone(),
            ops: Rc::clone(&ops),
            online: Rc::clone(&online),
        };
        let injector = RecordingInjector::default();
        let taps = Rc::clone(&injector.events);
        let keyboard = KeyboardEmulator::new(Box::new(injector));
        let mut panel = Panel::new(model(), bus.clone(), Box::new(SolidAssets), deck, keyboard).unwrap();
        panel.start(Duration::ZERO);
        Rig {
            panel,
            bus,
            ops,
            online,
            taps,
        }
    }

    #[test]
    fn test_start_pushes_then_publishes() {
        let rig = rig();
        let ops = rig.take();
        assert_eq!(ops.first(), Some(&Op::Brightness(30)));
        assert_eq!(ops.last(), Some(&Op::Flush));
        let keys: Vec<_> = ops.iter().filter(|op| matches!(op, Op::Key { .. })).collect();
        assert_eq!(keys.len(), 6);
        assert!(keys.iter().all(|op| matches!(op, Op::Key { page_current: 0, .. })));
        assert_eq!(rig.bus.get("haldeck.page-current").unwrap(), SignalValue::S32(1));
    }

    #[test]
    fn test_key_count_mismatch() {
        let deck = RecordingDeck {
            layout: DeckModel::Original.layout(),
            bus: SignalBus::new(),
            ops: Rc::default(),
            online: Rc::new(Cell::new(true)),
        };
        let result = Panel::new(model(), SignalBus::new(), Box::new(SolidAssets), deck, KeyboardEmulator::default());
        assert!(matches!(result, Err(PanelError::KeyCountMismatch { deck: 15, config: 6 })));
    }

    #[test]
    fn test_keyboard_key_the_injector_cannot_send() {
        let bus = SignalBus::new();
        let deck = RecordingDeck {
            layout: DeckModel::Mini.layout(),
            bus: bus.clone(),
            ops: Rc::default(),
            online: Rc::new(Cell::new(true)),
        };
        let f5 = KeySpec::Named(NamedKey::Function(5));
        let injector = RecordingInjector {
            refuse: vec![f5],
            ..Default::default()
        };
        let keyboard = KeyboardEmulator::new(Box::new(injector));
        let result = Panel::new(model(), bus.clone(), Box::new(SolidAssets), deck, keyboard);
        assert!(matches!(
            result,
            Err(PanelError::UnsupportedKey { index: 1, key, .. }) if key == f5
        ));
        assert!(bus.names().is_empty(), "nothing registered");
    }

    #[test]
    fn test_transition_renders_before_publish() {
        let mut rig = rig();
        rig.take();
        rig.bus.set("haldeck.page-select", "2").unwrap();
        rig.panel.tick(ms(10)).unwrap();

        let ops = rig.take();
        assert_eq!(ops.last(), Some(&Op::Flush));
        let keys: Vec<_> = ops.iter().filter(|op| matches!(op, Op::Key { .. })).collect();
        assert_eq!(keys.len(), 6, "every destination key is pushed");
        assert!(
            keys.iter().all(|op| matches!(op, Op::Key { page_current: 1, .. })),
            "page-current still names the old page while pushing"
        );
        assert_eq!(rig.bus.get("haldeck.page-current").unwrap(), SignalValue::S32(2));
        assert_eq!(rig.panel.current_page(), PageId::new(2).unwrap());
    }

    #[test]
    fn test_estop_out_and_in_end_to_end() {
        let mut rig = rig();
        rig.bus.set("haldeck.page.1.Estop.enable", "1").unwrap();
        rig.panel.tick(ms(10)).unwrap();
        rig.take();

        rig.panel.handle_event(DeckEvent::Pressed(0), ms(20));
        assert!(rig.bit("haldeck.page.1.Estop.out"));
        assert_eq!(
            rig.keys(),
            [Op::Key {
                index: 0,
                page_current: 1,
                center: Rgb888::RED
            }]
        );

        rig.bus.set("haldeck.page.1.Estop.in", "true").unwrap();
        rig.panel.tick(ms(30)).unwrap();
        assert_eq!(rig.keys().len(), 1);

        rig.panel.handle_event(DeckEvent::Released(0), ms(40));
        assert!(!rig.bit("haldeck.page.1.Estop.out"));
        assert_eq!(
            rig.keys(),
            [Op::Key {
                index: 0,
                page_current: 1,
                center: Rgb888::GREEN
            }]
        );
    }

    #[test]
    fn test_highlight_frame_reaches_the_deck() {
        let mut rig = rig();
        rig.bus.set("haldeck.page.1.Estop.enable", "1").unwrap();
        rig.bus.set("haldeck.page.1.Estop.in", "1").unwrap();
        rig.panel.tick(ms(10)).unwrap();
        // The highlight is part of the cached composite that was pushed.
        let inputs = KeyInputs {
            highlighted: true,
            ..KeyInputs::default()
        };
        let model = model();
        let key = &model.page(PageId::FIRST).unwrap().keys()[0];
        let face = rig.panel.engine.composite(PageId::FIRST, 0, key, &inputs);
        assert!(!face.changed, "served from cache");
        assert_eq!(face.image.pixel(0, 0), Some(HIGHLIGHT));
    }

    #[test]
    fn test_disabled_momentary_ignores_press() {
        let mut rig = rig();
        rig.take();
        rig.panel.handle_event(DeckEvent::Pressed(0), ms(10));
        assert!(!rig.bit("haldeck.page.1.Estop.out"));
        assert!(rig.keys().is_empty());
    }

    #[test]
    fn test_keyboard_key_taps_once() {
        let mut rig = rig();
        rig.take();
        rig.panel.handle_event(DeckEvent::Pressed(1), ms(10));
        assert_eq!(rig.keys().len(), 1, "active face while held");
        rig.panel.handle_event(DeckEvent::Released(1), ms(500));
        assert_eq!(rig.keys().len(), 1, "inactive face after release");
        let f5 = KeySpec::Named(NamedKey::Function(5));
        assert_eq!(*rig.taps.borrow(), [(true, f5), (false, f5)]);
    }

    #[test]
    fn test_display_float_is_debounced() {
        let mut rig = rig();
        rig.take();
        rig.bus.set("haldeck.page.1.Xpos.value", "1.5").unwrap();
        rig.panel.tick(ms(200)).unwrap();
        assert_eq!(rig.keys().len(), 1);

        rig.bus.set("haldeck.page.1.Xpos.value", "2.5").unwrap();
        rig.panel.tick(ms(250)).unwrap();
        assert!(rig.keys().is_empty(), "inside MinInterval");
        rig.panel.tick(ms(299)).unwrap();
        assert!(rig.keys().is_empty(), "inside MinInterval");
        rig.panel.tick(ms(300)).unwrap();
        assert_eq!(rig.keys().len(), 1, "MinInterval elapsed");

        rig.bus.set("haldeck.page.1.Xpos.value", "2.504").unwrap();
        rig.panel.tick(ms(500)).unwrap();
        assert!(rig.keys().is_empty(), "below MinStep");
    }

    #[test]
    fn test_leaving_page_resets_out_and_routes_release() {
        let mut rig = rig();
        rig.bus.set("haldeck.page.1.Estop.enable", "1").unwrap();
        rig.panel.handle_event(DeckEvent::Pressed(0), ms(10));
        assert!(rig.bit("haldeck.page.1.Estop.out"));

        rig.bus.set("haldeck.page-select", "2").unwrap();
        rig.panel.tick(ms(20)).unwrap();
        assert!(!rig.bit("haldeck.page.1.Estop.out"), "no stuck button");
        rig.take();

        // The release belongs to page 1: nothing on page 2 reacts.
        rig.panel.handle_event(DeckEvent::Released(0), ms(30));
        assert!(!rig.bit("haldeck.page.2.Jog.out"));
        assert!(rig.keys().is_empty());

        // The slot works normally for presses made on page 2.
        rig.panel.handle_event(DeckEvent::Pressed(0), ms(40));
        assert!(rig.bit("haldeck.page.2.Jog.out"));
        rig.panel.handle_event(DeckEvent::Released(0), ms(50));
        assert!(!rig.bit("haldeck.page.2.Jog.out"));
        assert!(!rig.bit("haldeck.page.1.Estop.out"));
    }

    #[test]
    fn test_rejected_page_select_keeps_page() {
        let mut rig = rig();
        rig.take();
        rig.bus.set("haldeck.page-select", "9").unwrap();
        rig.panel.tick(ms(10)).unwrap();
        rig.bus.set("haldeck.page-select", "40").unwrap();
        rig.panel.tick(ms(20)).unwrap();
        assert!(rig.take().is_empty());
        assert_eq!(rig.panel.current_page(), PageId::FIRST);
        assert_eq!(rig.bus.get("haldeck.page-current").unwrap(), SignalValue::S32(1));
    }

    #[test]
    fn test_splash_page_pushes_full_canvas() {
        let mut rig = rig();
        rig.take();
        rig.bus.set("haldeck.page-select", "12").unwrap();
        rig.panel.tick(ms(10)).unwrap();
        assert_eq!(rig.take(), [Op::Full, Op::Flush]);
        rig.panel.handle_event(DeckEvent::Pressed(3), ms(20));
        rig.panel.handle_event(DeckEvent::Released(3), ms(30));
        rig.panel.tick(ms(40)).unwrap();
        assert!(rig.take().is_empty(), "splash pages ignore presses");
    }

    #[test]
    fn test_disconnect_backoff_and_resync() {
        let mut rig = rig();
        rig.take();
        rig.online.set(false);
        rig.bus.set("haldeck.page.1.Xpos.value", "3").unwrap();
        rig.panel.tick(ms(1000)).unwrap();
        assert!(rig.take().is_empty(), "push failed, link down");

        rig.panel.tick(ms(1249)).unwrap();
        assert!(rig.take().is_empty());
        rig.panel.tick(ms(1250)).unwrap();
        assert_eq!(rig.take(), [Op::Reconnect]);

        rig.online.set(true);
        rig.panel.tick(ms(1250) + backoff_delay(1) - ms(1)).unwrap();
        assert!(rig.take().is_empty());
        rig.panel.tick(ms(1250) + backoff_delay(1)).unwrap();
        let ops = rig.take();
        assert_eq!(ops[..2], [Op::Reconnect, Op::Brightness(30)]);
        assert_eq!(ops.iter().filter(|op| matches!(op, Op::Key { .. })).count(), 6);
        assert_eq!(ops.last(), Some(&Op::Flush));
    }

    #[test]
    fn test_reconnected_event_resyncs() {
        let mut rig = rig();
        rig.take();
        rig.panel.handle_event(DeckEvent::Disconnected, ms(10));
        rig.panel.handle_event(DeckEvent::Pressed(1), ms(20));
        assert!(rig.take().is_empty());
        rig.panel.handle_event(DeckEvent::Reconnected, ms(30));
        let ops = rig.take();
        assert_eq!(ops.first(), Some(&Op::Brightness(30)));
        assert_eq!(ops.iter().filter(|op| matches!(op, Op::Key { .. })).count(), 6);
    }

    #[test]
    fn test_reconnect_exhaustion_is_fatal() {
        let mut rig = rig();
        rig.online.set(false);
        rig.panel.handle_event(DeckEvent::Disconnected, Duration::ZERO);
        let mut result = Ok(());
        for step in 1..=10 {
            result = rig.panel.tick(ms(step * 10_000));
        }
        assert!(matches!(result, Err(PanelError::ReconnectExhausted(_))));
        assert_eq!(rig.take().iter().filter(|op| **op == Op::Reconnect).count(), 10);
    }

    #[test]
    fn test_keepalive_period() {
        let mut rig = rig();
        rig.take();
        rig.panel.tick(ms(29_999)).unwrap();
        assert!(rig.take().is_empty());
        rig.panel.tick(ms(30_000)).unwrap();
        assert_eq!(rig.take(), [Op::Keepalive]);
    }

    #[test]
    fn test_shutdown_resets_and_releases() {
        let rig = rig();
        rig.take();
        let bus = rig.bus.clone();
        let ops = Rc::clone(&rig.ops);
        rig.panel.shutdown();
        assert_eq!(*ops.borrow(), [Op::Reset]);
        assert!(bus.names().is_empty());
    }
}
