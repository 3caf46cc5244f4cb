//! Frame driver - the per-input and per-tick entry points.
//!
//! [`Ui`] ties the tree, the layout engine and the dispatcher together in
//! the order a frame needs them:
//!
//! 1. `handle_input` for every input event, one at a time
//! 2. `tick` once per frame: drain async results, forget dead widgets,
//!    recompute layout if anything is dirty
//! 3. the render builder reads computed layouts and bounds
//!
//! Blocking work (image decode, network) runs elsewhere and posts an
//! [`AsyncResult`] through an [`AsyncSender`]. Results are applied on the
//! next tick, on the simulation thread.
//!
//! # Example
//!
//! ```ignore
//! let mut ui = Ui::new(&Config::default(), size(800.0, 600.0))?;
//! let sender = ui.async_sender();
//! std::thread::spawn(move || {
//!     let _ = sender.send(AsyncResult::loaded(image, size(640.0, 480.0)));
//! });
//!
//! loop {
//!     for input in pending_inputs() {
//!         ui.handle_input(&input);
//!     }
//!     let outcome = ui.tick();
//!     if outcome.redraw {
//!         render(ui.tree());
//!     }
//! }
//! ```

use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::{Config, FrameConfig};
use crate::engine::{WidgetId, WidgetTree};
use crate::error::{Error, Result};
use crate::layout::LayoutEngine;
use crate::state::{EventDispatcher, InputEvent};
use crate::types::Size;

// =============================================================================
// Async results
// =============================================================================

/// Completion of a background load for one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncResult {
    pub widget: WidgetId,
    /// Natural size on success, an error description on failure.
    pub outcome: std::result::Result<Size<f32>, String>,
}

impl AsyncResult {
    pub fn loaded(widget: WidgetId, natural: Size<f32>) -> Self {
        Self { widget, outcome: Ok(natural) }
    }

    pub fn failed(widget: WidgetId, error: impl Into<String>) -> Self {
        Self { widget, outcome: Err(error.into()) }
    }
}

/// Cloneable handle for posting results from worker threads.
#[derive(Debug, Clone)]
pub struct AsyncSender {
    tx: SyncSender<AsyncResult>,
}

impl AsyncSender {
    /// Queue a result without blocking.
    pub fn send(&self, result: AsyncResult) -> Result<()> {
        let widget = result.widget;
        self.tx.try_send(result).map_err(|e| {
            let err = Error::from(e);
            warn!(?widget, %err, "dropped async result");
            err
        })
    }
}

// =============================================================================
// Ui
// =============================================================================

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Something visible changed since the last tick.
    pub redraw: bool,
    /// Redraw again after this long even if nothing changes.
    pub next_redraw_in: Option<Duration>,
    pub layout_ran: bool,
}

pub struct Ui {
    tree: Arc<WidgetTree>,
    engine: LayoutEngine,
    dispatcher: EventDispatcher,
    viewport: Size<f32>,
    frame: FrameConfig,
    results_tx: SyncSender<AsyncResult>,
    results_rx: Receiver<AsyncResult>,
    needs_redraw: bool,
    last_redraw: Option<Instant>,
}

impl std::fmt::Debug for Ui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ui")
            .field("tree", &self.tree)
            .field("engine", &self.engine)
            .field("viewport", &self.viewport)
            .field("needs_redraw", &self.needs_redraw)
            .finish_non_exhaustive()
    }
}

impl Ui {
    /// Build a frame driver over an empty tree.
    pub fn new(config: &Config, viewport: Size<f32>) -> Result<Self> {
        Self::with_tree(Arc::new(WidgetTree::new()), config, viewport)
    }

    /// Build a frame driver over an existing tree. Widgets created after
    /// this start out with the configured font.
    pub fn with_tree(tree: Arc<WidgetTree>, config: &Config, viewport: Size<f32>) -> Result<Self> {
        config.validate()?;
        tree.set_default_font(config.text.font());
        let (results_tx, results_rx) = sync_channel(config.frame.async_queue_capacity);
        Ok(Self {
            tree,
            engine: LayoutEngine::from_config(&config.text),
            dispatcher: EventDispatcher::new(config.dispatch.clone()),
            viewport,
            frame: config.frame.clone(),
            results_tx,
            results_rx,
            needs_redraw: true,
            last_redraw: None,
        })
    }

    pub fn tree(&self) -> &Arc<WidgetTree> {
        &self.tree
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut EventDispatcher {
        &mut self.dispatcher
    }

    pub fn viewport(&self) -> Size<f32> {
        self.viewport
    }

    pub fn async_sender(&self) -> AsyncSender {
        AsyncSender { tx: self.results_tx.clone() }
    }

    /// Resize. Forces a full layout on the next tick.
    pub fn set_viewport(&mut self, viewport: Size<f32>) -> bool {
        if viewport == self.viewport {
            return false;
        }
        debug!(w = viewport.width, h = viewport.height, "viewport changed");
        self.viewport = viewport;
        self.tree.invalidate_tree_layout();
        self.needs_redraw = true;
        true
    }

    /// Route one input event. Returns whether a redraw is needed.
    pub fn handle_input(&mut self, input: &InputEvent) -> bool {
        self.handle_input_at(input, Instant::now())
    }

    /// Like `handle_input` with an explicit timestamp for click sequencing.
    pub fn handle_input_at(&mut self, input: &InputEvent, now: Instant) -> bool {
        if let InputEvent::Resize(viewport) = input {
            return self.set_viewport(*viewport);
        }
        let handled = self.dispatcher.dispatch(&self.tree, input, now);
        let redraw = handled || self.dispatcher.take_changed() || self.tree.is_layout_dirty();
        self.needs_redraw |= redraw;
        redraw
    }

    /// Run the per-frame work.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> TickOutcome {
        let applied = self.drain_async();
        self.dispatcher.prune(&self.tree);
        if self.dispatcher.take_changed() {
            self.needs_redraw = true;
        }

        let report = self.engine.compute_layout(&self.tree, self.viewport);
        if report.skipped && self.needs_redraw {
            // scroll offsets may have moved without a layout
            self.engine.refresh_bounds(&self.tree);
        }

        let idle = self.frame.idle_redraw_ms.map(Duration::from_millis);
        let idle_due = match (idle, self.last_redraw) {
            (Some(every), Some(last)) => now.saturating_duration_since(last) >= every,
            _ => false,
        };
        let redraw = self.needs_redraw || applied > 0 || !report.skipped || idle_due;
        self.needs_redraw = false;
        if redraw {
            self.last_redraw = Some(now);
        }

        TickOutcome {
            redraw,
            next_redraw_in: idle,
            layout_ran: !report.skipped,
        }
    }

    /// Apply queued async results. Returns how many reached a live widget.
    fn drain_async(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(result) = self.results_rx.try_recv() {
            let widget = result.widget;
            let written = self.tree.update(widget, |w| match result.outcome {
                Ok(natural) => {
                    w.set_load_error(None);
                    w.set_natural_size(Some(natural));
                }
                Err(error) => {
                    w.set_load_error(Some(error));
                }
            });
            match written {
                Some(()) => applied += 1,
                None => warn!(?widget, "async result for a widget that no longer exists"),
            }
        }
        if applied > 0 {
            debug!(applied, "applied async results");
        }
        applied
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MEDIA_PLACEHOLDER;
    use crate::state::MouseData;
    use crate::types::{WidgetKind, size};

    fn ui() -> Ui {
        Ui::new(&Config::default(), size(800.0, 600.0)).unwrap()
    }

    #[test]
    fn test_first_tick_lays_out_then_settles() {
        let mut ui = ui();
        ui.tree().create_root(WidgetKind::VStack);

        let first = ui.tick();
        assert!(first.redraw);
        assert!(first.layout_ran);

        let second = ui.tick();
        assert!(!second.redraw);
        assert!(!second.layout_ran);
        assert_eq!(second.next_redraw_in, None);
    }

    #[test]
    fn test_configured_font_sizes_text() {
        let config = Config::from_json_str(r#"{ "text": { "font_size": 20.0, "line_height": 1.5 } }"#).unwrap();
        let mut ui = Ui::new(&config, size(800.0, 600.0)).unwrap();
        let root = ui.tree().create_root(WidgetKind::VStack);
        let label = ui.tree().create(WidgetKind::Text);
        ui.tree().update(label, |w| w.set_text("Hello"));
        ui.tree().add_child(root, label);
        ui.tick();

        assert_eq!(ui.tree().with(label, |w| w.font().size).unwrap(), 20.0);
        assert_eq!(ui.tree().with(label, |w| w.layout_rect().height).unwrap(), 30.0);
    }

    #[test]
    fn test_async_result_sizes_image() {
        let mut ui = ui();
        let root = ui.tree().create_root(WidgetKind::VStack);
        let image = ui.tree().create(WidgetKind::Image);
        ui.tree().add_child(root, image);
        ui.tick();

        ui.async_sender().send(AsyncResult::loaded(image, size(640.0, 480.0))).unwrap();
        let outcome = ui.tick();
        assert!(outcome.layout_ran);
        let rect = ui.tree().with(image, |w| w.layout_rect()).unwrap();
        assert_eq!(rect.height, 480.0);
    }

    #[test]
    fn test_failed_load_uses_placeholder() {
        let mut ui = ui();
        let root = ui.tree().create_root(WidgetKind::HStack);
        let image = ui.tree().create(WidgetKind::Image);
        ui.tree().add_child(root, image);

        ui.async_sender().send(AsyncResult::failed(image, "404")).unwrap();
        ui.tick();
        let rect = ui.tree().with(image, |w| w.layout_rect()).unwrap();
        assert_eq!(rect.width, MEDIA_PLACEHOLDER.width);
        assert!(ui.tree().with(image, |w| w.load_error().is_some()).unwrap());
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let mut ui = ui();
        ui.tree().create_root(WidgetKind::VStack);
        let gone = ui.tree().create(WidgetKind::Image);
        ui.tree().destroy(gone);
        ui.tick();

        ui.async_sender().send(AsyncResult::loaded(gone, size(1.0, 1.0))).unwrap();
        assert!(!ui.tick().redraw);
    }

    #[test]
    fn test_full_queue_reports_error() {
        let mut config = Config::default();
        config.frame.async_queue_capacity = 1;
        let ui = Ui::new(&config, size(100.0, 100.0)).unwrap();
        let id = ui.tree().create(WidgetKind::Image);
        let sender = ui.async_sender();

        sender.send(AsyncResult::loaded(id, size(1.0, 1.0))).unwrap();
        let err = sender.send(AsyncResult::loaded(id, size(1.0, 1.0))).unwrap_err();
        assert!(matches!(err, Error::QueueFull));
    }

    #[test]
    fn test_resize_forces_layout() {
        let mut ui = ui();
        let root = ui.tree().create_root(WidgetKind::VStack);
        ui.tree().update(root, |w| w.set_width_percent(50.0));
        ui.tick();
        assert_eq!(ui.tree().with(root, |w| w.layout_rect().width).unwrap(), 400.0);

        assert!(ui.handle_input(&InputEvent::Resize(size(1000.0, 600.0))));
        assert!(ui.tick().layout_ran);
        assert_eq!(ui.tree().with(root, |w| w.layout_rect().width).unwrap(), 500.0);
    }

    #[test]
    fn test_hover_requests_redraw() {
        let mut ui = ui();
        let root = ui.tree().create_root(WidgetKind::VStack);
        ui.tree().update(root, |w| {
            w.set_fixed_width(100.0);
            w.set_fixed_height(100.0);
        });
        ui.tick();

        let inside = InputEvent::MouseMove(MouseData { x: 10.0, y: 10.0, ..Default::default() });
        assert!(ui.handle_input(&inside));
        assert!(!ui.handle_input(&inside));
        assert!(ui.tick().redraw);
    }

    #[test]
    fn test_idle_redraw() {
        let mut config = Config::default();
        config.frame.idle_redraw_ms = Some(100);
        let mut ui = Ui::new(&config, size(100.0, 100.0)).unwrap();
        ui.tree().create_root(WidgetKind::VStack);

        let t0 = Instant::now();
        assert!(ui.tick_at(t0).redraw);
        let quiet = ui.tick_at(t0 + Duration::from_millis(50));
        assert!(!quiet.redraw);
        assert_eq!(quiet.next_redraw_in, Some(Duration::from_millis(100)));
        assert!(ui.tick_at(t0 + Duration::from_millis(150)).redraw);
    }

    #[test]
    fn test_ui_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Ui>();
        assert_send::<AsyncSender>();
    }
}
