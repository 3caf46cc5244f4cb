//! Mouse - hit testing, hover tracking, press and click sequencing.
//!
//! Hit testing walks the tree from the root using each widget's computed
//! layout. Children are tried in reverse order (last painted is on top) and
//! the pointer is shifted by the scroll offset of every scrollable container
//! it descends into. Open Select dropdowns are tested before anything else
//! because they float above the rest of the tree.
//!
//! # API
//!
//! - `hit_test(tree, point)` - deepest widget under the pointer plus its chain
//! - `mouse_move(tree, data)` - hover diff, MouseMove, drag continuation
//! - `mouse_down(tree, data)` - press chain, focus, MouseDown
//! - `mouse_up(tree, data, now)` - MouseUp, drag end, Click/DoubleClick/TripleClick
//!
//! # Example
//!
//! ```ignore
//! use spark_ui::state::events::MouseData;
//!
//! let data = MouseData { x: 40.0, y: 12.0, button: MouseButton::Left, ..Default::default() };
//! dispatcher.mouse_down(&tree, data);
//! dispatcher.mouse_up(&tree, data, Instant::now());
//! ```

use std::time::Instant;

use tracing::{debug, trace};

use super::dispatch::{dispatch_bubble_only, dispatch_direct, propagate};
use super::dispatcher::{EventDispatcher, Press};
use super::events::{Event, EventType, MouseData};
use crate::engine::{WidgetId, WidgetTree};
use crate::types::{LayoutRect, Point, Position, WidgetKind, point};

/// Deepest widget under a point and its root-to-target chain.
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub target: WidgetId,
    pub chain: Vec<WidgetId>,
}

/// What the walk needs from one widget, read under a single lock.
struct Probe {
    accepts: bool,
    /// Point in the children's coordinate space.
    inner: Point<f32>,
    children: Vec<WidgetId>,
}

// =============================================================================
// HIT TESTING
// =============================================================================

impl EventDispatcher {
    /// Find the widget under `p` (screen coordinates).
    pub fn hit_test(&self, tree: &WidgetTree, p: Point<f32>) -> Option<HitResult> {
        let root = tree.root()?;
        if let Some(select) = self.dropdown_at(tree, root, p) {
            return Some(HitResult {
                target: select,
                chain: tree.chain(select),
            });
        }

        let mut chain = Vec::new();
        let target = self.walk(tree, root, p, p, &mut chain)?;
        Some(HitResult { target, chain })
    }

    fn walk(
        &self,
        tree: &WidgetTree,
        id: WidgetId,
        p: Point<f32>,
        screen: Point<f32>,
        chain: &mut Vec<WidgetId>,
    ) -> Option<WidgetId> {
        let option_height = self.config.dropdown_option_height;
        let gap = self.config.dropdown_gap;
        let probe = tree.with(id, |w| {
            // Fixed widgets ignore every ancestor scroll
            let p = if w.position() == Position::Fixed { screen } else { p };
            let inner = if w.is_scrollable() {
                point(p.x + w.scroll_offset().x, p.y + w.scroll_offset().y)
            } else {
                p
            };
            Probe {
                accepts: w.is_visible()
                    && !w.is_disabled()
                    && w.accepts_point(p, option_height, gap),
                inner,
                children: w.children().to_vec(),
            }
        })?;
        if !probe.accepts {
            return None;
        }

        chain.push(id);
        for &child in probe.children.iter().rev() {
            let len = chain.len();
            if let Some(target) = self.walk(tree, child, probe.inner, screen, chain) {
                return Some(target);
            }
            chain.truncate(len);
        }
        Some(id)
    }

    /// Topmost open dropdown whose option list contains `p`.
    ///
    /// Only the area below the Select is checked here; the Select's own box
    /// takes part in the ordinary walk.
    fn dropdown_at(&self, tree: &WidgetTree, root: WidgetId, p: Point<f32>) -> Option<WidgetId> {
        let option_height = self.config.dropdown_option_height;
        let gap = self.config.dropdown_gap;

        let mut open = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some((usable, overlay, children)) = tree.with(id, |w| {
                let usable = w.is_visible() && !w.is_disabled();
                let extent = w.dropdown_extent(option_height, gap);
                let overlay = (w.kind() == WidgetKind::Select && extent > 0.0).then(|| {
                    let (bounds, _) = w.computed_bounds();
                    LayoutRect::new(bounds.x, bounds.bottom(), bounds.width, extent)
                });
                (usable, overlay, w.children().to_vec())
            }) else {
                continue;
            };
            if !usable {
                continue;
            }
            if let Some(rect) = overlay {
                open.push((id, rect));
            }
            stack.extend(children.into_iter().rev());
        }

        // later in paint order wins
        open.into_iter().rev().find(|(_, rect)| rect.contains(p)).map(|(id, _)| id)
    }

    // =========================================================================
    // MOVE
    // =========================================================================

    /// Pointer moved. Returns whether any handler consumed the move.
    pub fn mouse_move(&mut self, tree: &WidgetTree, data: MouseData) -> bool {
        let hit = self.hit_test(tree, point(data.x, data.y));
        let new_chain = hit.as_ref().map(|h| h.chain.clone()).unwrap_or_default();
        let target = hit.map(|h| h.target);

        self.update_hover(tree, new_chain, target, data);

        let mut handled = false;
        if let Some(target) = target {
            let mut event = Event::mouse(EventType::MouseMove, target, data);
            handled = propagate(tree, &self.hover_chain, &mut event);
        }

        // drag continuation
        if let Some(press) = self.pressed.as_ref().filter(|p| Some(p.target) != target) {
            let mut event = Event::mouse(EventType::MouseMove, press.target, data);
            handled |= dispatch_direct(tree, press.target, &mut event);
        }
        handled
    }

    /// Diff the hover chain by identity: leave deepest first, enter root
    /// first. Widgets in both chains see nothing.
    fn update_hover(
        &mut self,
        tree: &WidgetTree,
        new_chain: Vec<WidgetId>,
        target: Option<WidgetId>,
        data: MouseData,
    ) {
        if new_chain == self.hover_chain {
            return;
        }

        let old_chain = std::mem::take(&mut self.hover_chain);
        for &id in old_chain.iter().rev().filter(|id| !new_chain.contains(id)) {
            tree.update(id, |w| w.set_hovered(false));
            let mut event = Event::mouse(EventType::MouseLeave, id, data);
            dispatch_direct(tree, id, &mut event);
        }
        for &id in new_chain.iter().filter(|id| !old_chain.contains(id)) {
            tree.update(id, |w| w.set_hovered(true));
            let mut event = Event::mouse(EventType::MouseEnter, id, data);
            dispatch_direct(tree, id, &mut event);
        }

        debug!(from = ?self.hovered, to = ?target, "hover changed");
        self.hover_chain = new_chain;
        self.hovered = target;
        self.changed = true;
    }

    // =========================================================================
    // PRESS / RELEASE
    // =========================================================================

    /// Button pressed. Clicking empty space clears focus.
    pub fn mouse_down(&mut self, tree: &WidgetTree, data: MouseData) -> bool {
        let Some(hit) = self.hit_test(tree, point(data.x, data.y)) else {
            self.clear_focus(tree);
            return false;
        };

        for &id in &hit.chain {
            tree.update(id, |w| w.set_pressed(true));
        }
        let focus_target = hit
            .chain
            .iter()
            .rev()
            .copied()
            .find(|id| tree.with(*id, |w| w.can_take_focus()).unwrap_or(false));
        if focus_target != self.focused {
            self.set_focus(tree, focus_target);
        }

        self.pressed = Some(Press {
            target: hit.target,
            chain: hit.chain.clone(),
            button: data.button,
        });
        self.changed = true;

        let mut event = Event::mouse(EventType::MouseDown, hit.target, data);
        propagate(tree, &hit.chain, &mut event)
    }

    /// Button released.
    pub fn mouse_up(&mut self, tree: &WidgetTree, data: MouseData, now: Instant) -> bool {
        let hit = self.hit_test(tree, point(data.x, data.y));

        let mut handled = false;
        if let Some(hit) = &hit {
            let mut event = Event::mouse(EventType::MouseUp, hit.target, data);
            handled = propagate(tree, &hit.chain, &mut event);
        }

        let Some(press) = self.pressed.take() else {
            return handled;
        };
        for &id in &press.chain {
            tree.update(id, |w| w.set_pressed(false));
        }
        self.changed = true;

        match &hit {
            Some(hit) if hit.target == press.target => {
                if press.button == data.button {
                    handled |= self.click_sequence(tree, &hit.chain, hit.target, data, now);
                }
            }
            // over a descendant: the bubble above already reached it
            Some(hit) if hit.chain.contains(&press.target) => {}
            _ => {
                // drag end: the pressed widget hears about the release once
                let chain = tree.chain(press.target);
                let mut event = Event::mouse(EventType::MouseUp, press.target, data);
                handled |= dispatch_bubble_only(tree, &chain, &mut event);
            }
        }
        handled
    }

    fn click_sequence(
        &mut self,
        tree: &WidgetTree,
        chain: &[WidgetId],
        target: WidgetId,
        mut data: MouseData,
        now: Instant,
    ) -> bool {
        let count = self.clicks.register(point(data.x, data.y), now, &self.config);
        data.click_count = count;
        trace!(widget = ?target, count, "click");

        let mut event = Event::mouse(EventType::Click, target, data);
        let mut handled = propagate(tree, chain, &mut event);

        let follow_up = match count {
            2 => Some(EventType::DoubleClick),
            n if n >= 3 => Some(EventType::TripleClick),
            _ => None,
        };
        if let Some(ty) = follow_up {
            debug!(widget = ?target, count, ?ty, "multi-click");
            let mut event = Event::mouse(ty, target, data);
            handled |= propagate(tree, chain, &mut event);
        }
        if count >= 3 {
            self.clicks.reset();
        }
        handled
    }
}

// =============================================================================
// Tests
// =============================================================================
