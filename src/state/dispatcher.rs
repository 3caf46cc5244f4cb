//! Event Dispatcher - interaction state shared by the input handlers.
//!
//! The dispatcher owns the little state that outlives a single event: the
//! hover chain, the focused widget, the press in progress and the click
//! sequence tracker. The handlers themselves live next to their concerns:
//!
//! - `mouse` - hit testing, hover diffing, press/release, click sequencing
//! - `scroll` - wheel default action
//! - `focus` - focus changes and traversal
//! - `keyboard` - key routing to the focused widget
//! - `input` - one entry point for raw [`InputEvent`]s
//!
//! All methods take the tree by shared reference and run on the simulation
//! thread. Widget ids held here may go stale when widgets are destroyed;
//! every use tolerates that and [`EventDispatcher::prune`] drops them.
//!
//! [`InputEvent`]: super::input::InputEvent

use std::time::Instant;

use tracing::debug;

use crate::config::DispatchConfig;
use crate::engine::{WidgetId, WidgetTree};
use crate::state::events::MouseButton;
use crate::types::Point;

// =============================================================================
// STATE
// =============================================================================

/// A press between mouse down and mouse up.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Press {
    pub target: WidgetId,
    pub chain: Vec<WidgetId>,
    pub button: MouseButton,
}

/// Running click count for double/triple click detection.
#[derive(Debug, Clone)]
pub(crate) struct ClickTracker {
    pub last_at: Option<Instant>,
    pub last_pos: Point<f32>,
    pub count: u32,
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self {
            last_at: None,
            last_pos: Point { x: 0.0, y: 0.0 },
            count: 0,
        }
    }
}

impl ClickTracker {
    /// Register a click at `pos` and return the running count.
    pub fn register(&mut self, pos: Point<f32>, now: Instant, config: &DispatchConfig) -> u32 {
        let dx = pos.x - self.last_pos.x;
        let dy = pos.y - self.last_pos.y;
        let max = config.double_click_distance;
        let in_sequence = self.last_at.is_some_and(|at| {
            now.saturating_duration_since(at) <= config.double_click_window()
                && dx * dx + dy * dy <= max * max
        });

        self.count = if in_sequence { self.count + 1 } else { 1 };
        self.last_at = Some(now);
        self.last_pos = pos;
        self.count
    }

    /// Start over after a triple click.
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

#[derive(Debug, Default)]
pub struct EventDispatcher {
    pub(crate) config: DispatchConfig,
    pub(crate) hovered: Option<WidgetId>,
    pub(crate) hover_chain: Vec<WidgetId>,
    pub(crate) focused: Option<WidgetId>,
    pub(crate) pressed: Option<Press>,
    pub(crate) clicks: ClickTracker,
    /// Interaction state changed since the last `take_changed`.
    pub(crate) changed: bool,
}

impl EventDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Deepest hovered widget.
    pub fn hovered(&self) -> Option<WidgetId> {
        self.hovered
    }

    /// Root-to-leaf hover chain.
    pub fn hover_chain(&self) -> &[WidgetId] {
        &self.hover_chain
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.focused
    }

    /// Widget under the press in progress.
    pub fn pressed(&self) -> Option<WidgetId> {
        self.pressed.as_ref().map(|p| p.target)
    }

    /// Current click count (0 after a triple click).
    pub fn click_count(&self) -> u32 {
        self.clicks.count
    }

    /// Whether hover, press, focus or scroll state changed since the last
    /// call. Clears the flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Forget widgets that were destroyed or detached.
    pub fn prune(&mut self, tree: &WidgetTree) {
        let live = |id: &WidgetId| tree.with(*id, |w| w.is_attached()).unwrap_or(false);

        if self.hover_chain.iter().any(|id| !live(id)) {
            let keep = self.hover_chain.iter().take_while(|id| live(id)).count();
            self.hover_chain.truncate(keep);
            self.hovered = self.hover_chain.last().copied();
            self.changed = true;
        }
        if self.focused.is_some_and(|id| !live(&id)) {
            debug!(widget = ?self.focused, "focused widget gone");
            self.focused = None;
            self.changed = true;
        }
        if self.pressed.as_ref().is_some_and(|p| !live(&p.target)) {
            self.pressed = None;
            self.changed = true;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
