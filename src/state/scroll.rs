//! Scroll - offsets of scrollable containers and the wheel default action.
//!
//! Offsets are clamped per axis to `[0, max(0, content - viewport)]`, where
//! the content extent comes from the children's scroll-independent layout
//! rectangles measured from the container's content-box origin and the
//! viewport is the container's content box. Scrolling marks the container
//! `SCROLL` dirty; it never invalidates layout.
//!
//! # API
//!
//! - `content_extent(tree, id)` - size spanned by the children
//! - `max_scroll(tree, id)` - largest valid offset per axis
//! - `scroll_to(tree, id, offset)` / `scroll_by(tree, id, dx, dy)` - clamped writes
//! - `EventDispatcher::wheel(tree, data)` - MouseWheel plus default scrolling

use tracing::debug;

use super::dispatch::propagate;
use super::dispatcher::EventDispatcher;
use super::events::{Event, EventType, MouseData};
use crate::engine::{WidgetId, WidgetTree};
use crate::types::{Point, Size, point, size};

/// Extent of `id`'s visible children relative to its content-box origin.
pub fn content_extent(tree: &WidgetTree, id: WidgetId) -> Size<f32> {
    let Some((origin, children)) = tree.with(id, |w| {
        let rect = w.layout_rect();
        let padding = w.padding();
        (point(rect.x + padding.left, rect.y + padding.top), w.children().to_vec())
    }) else {
        return size(0.0, 0.0);
    };

    let mut extent = size(0.0, 0.0);
    for child in children {
        let Some(rect) = tree.with(child, |w| w.is_visible().then(|| w.layout_rect())).flatten() else {
            continue;
        };
        extent.width = extent.width.max(rect.right() - origin.x);
        extent.height = extent.height.max(rect.bottom() - origin.y);
    }
    extent
}

/// Largest valid scroll offset of `id` per axis.
pub fn max_scroll(tree: &WidgetTree, id: WidgetId) -> Point<f32> {
    let Some(viewport) = tree.with(id, |w| {
        let rect = w.layout_rect();
        let padding = w.padding();
        size(
            rect.width - padding.left - padding.right,
            rect.height - padding.top - padding.bottom,
        )
    }) else {
        return point(0.0, 0.0);
    };
    let content = content_extent(tree, id);
    point(
        (content.width - viewport.width).max(0.0),
        (content.height - viewport.height).max(0.0),
    )
}

/// Set the scroll offset, clamped. Returns whether it changed.
pub fn scroll_to(tree: &WidgetTree, id: WidgetId, offset: Point<f32>) -> bool {
    let max = max_scroll(tree, id);
    let clamped = point(offset.x.clamp(0.0, max.x), offset.y.clamp(0.0, max.y));
    if clamped != offset {
        debug!(widget = ?id, requested = ?offset, ?clamped, "scroll clamped");
    }
    tree.update(id, |w| w.set_scroll_offset(clamped)).unwrap_or(false)
}

/// Scroll by a delta, clamped. Returns whether the offset changed.
pub fn scroll_by(tree: &WidgetTree, id: WidgetId, dx: f32, dy: f32) -> bool {
    let Some(current) = tree.with(id, |w| w.scroll_offset()) else {
        return false;
    };
    scroll_to(tree, id, point(current.x + dx, current.y + dy))
}

impl EventDispatcher {
    /// Wheel turned. Handlers see MouseWheel first; if none consumes it, the
    /// nearest scrollable widget in the hit chain scrolls.
    pub fn wheel(&mut self, tree: &WidgetTree, data: MouseData) -> bool {
        let Some(hit) = self.hit_test(tree, point(data.x, data.y)) else {
            return false;
        };
        let mut event = Event::mouse(EventType::MouseWheel, hit.target, data);
        if propagate(tree, &hit.chain, &mut event) || event.is_default_prevented() {
            return true;
        }

        let scroller = hit
            .chain
            .iter()
            .rev()
            .copied()
            .find(|id| tree.with(*id, |w| w.is_scrollable()).unwrap_or(false));
        let Some(scroller) = scroller else {
            return false;
        };
        let moved = scroll_by(tree, scroller, data.delta_x, data.delta_y);
        self.changed |= moved;
        moved
    }
}

// =============================================================================
// Tests
// =============================================================================
