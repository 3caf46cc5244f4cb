//! Focus - the single focused widget and keyboard traversal.
//!
//! At most one widget in the tree is focused. Changing it fires `Blur` on the
//! old widget and then `Focus` on the new one, both target-then-bubble with
//! the other widget as the related target.
//!
//! # API
//!
//! - `set_focus(tree, Some(id))` / `clear_focus(tree)`
//! - `focus_next(tree)` / `focus_previous(tree)` - tree-order traversal
//! - `focus_radio_sibling(tree, forward)` - arrow-key movement in a radio group
//! - `focusable_widgets(tree)` - traversal order
//!
//! # Example
//!
//! ```ignore
//! dispatcher.focus_next(&tree);
//! assert_eq!(dispatcher.focused(), Some(first_button));
//! ```

use tracing::debug;

use super::dispatch::dispatch_bubble_only;
use super::dispatcher::EventDispatcher;
use super::events::{Event, EventType};
use crate::engine::{WidgetId, WidgetTree};
use crate::types::WidgetKind;

/// Focusable widgets in pre-order, skipping hidden subtrees and disabled
/// widgets.
pub fn focusable_widgets(tree: &WidgetTree) -> Vec<WidgetId> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some((visible, focusable, children)) =
            tree.with(id, |w| (w.is_visible(), w.can_take_focus(), w.children().to_vec()))
        else {
            continue;
        };
        if !visible {
            continue;
        }
        if focusable {
            out.push(id);
        }
        stack.extend(children.into_iter().rev());
    }
    out
}

impl EventDispatcher {
    /// Move focus to `target` (or nowhere). Returns false when nothing
    /// changed or the target cannot take focus.
    pub fn set_focus(&mut self, tree: &WidgetTree, target: Option<WidgetId>) -> bool {
        if target == self.focused {
            return false;
        }
        if target.is_some_and(|id| !tree.with(id, |w| w.can_take_focus()).unwrap_or(false)) {
            return false;
        }

        let previous = std::mem::replace(&mut self.focused, target);
        self.changed = true;
        debug!(from = ?previous, to = ?target, "focus changed");

        if let Some(old) = previous {
            let alive = tree.update(old, |w| w.set_focused(false)).is_some();
            if alive {
                let mut event = Event::focus(EventType::Blur, old, target);
                dispatch_bubble_only(tree, &tree.chain(old), &mut event);
            }
        }
        if let Some(new) = target {
            tree.update(new, |w| w.set_focused(true));
            let mut event = Event::focus(EventType::Focus, new, previous);
            dispatch_bubble_only(tree, &tree.chain(new), &mut event);
        }
        true
    }

    pub fn clear_focus(&mut self, tree: &WidgetTree) -> bool {
        self.set_focus(tree, None)
    }

    /// Focus the next focusable widget, wrapping around.
    pub fn focus_next(&mut self, tree: &WidgetTree) -> bool {
        self.step_focus(tree, true)
    }

    /// Focus the previous focusable widget, wrapping around.
    pub fn focus_previous(&mut self, tree: &WidgetTree) -> bool {
        self.step_focus(tree, false)
    }

    fn step_focus(&mut self, tree: &WidgetTree, forward: bool) -> bool {
        let order = focusable_widgets(tree);
        if order.is_empty() {
            return false;
        }
        let current = self.focused.and_then(|f| order.iter().position(|id| *id == f));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => order.len() - 1,
            (Some(i), true) => (i + 1) % order.len(),
            (Some(i), false) => (i + order.len() - 1) % order.len(),
        };
        self.set_focus(tree, Some(order[next]))
    }

    /// Move focus between the Radio siblings of the focused Radio.
    pub fn focus_radio_sibling(&mut self, tree: &WidgetTree, forward: bool) -> bool {
        let Some(current) = self.focused else {
            return false;
        };
        if tree.kind(current) != Some(WidgetKind::Radio) {
            return false;
        }
        let Some(parent) = tree.parent(current) else {
            return false;
        };

        let group: Vec<WidgetId> = tree
            .children(parent)
            .into_iter()
            .filter(|id| {
                tree.with(*id, |w| w.kind() == WidgetKind::Radio && w.can_take_focus())
                    .unwrap_or(false)
            })
            .collect();
        let Some(i) = group.iter().position(|id| *id == current) else {
            return false;
        };
        let n = group.len();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        self.set_focus(tree, Some(group[next]))
    }
}

// =============================================================================
// Tests
// =============================================================================
