//! Keyboard - key routing to the focused widget.
//!
//! Keys never hit-test. KeyDown/KeyUp go through the full capture, target,
//! bubble chain of the focused widget. When nobody handles a KeyDown and the
//! default was not prevented, the dispatcher applies its own defaults:
//!
//! - `Tab` / `Shift+Tab` - move focus forward / backward
//! - arrow keys on a focused Radio - move within the radio group
//!
//! # Example
//!
//! ```ignore
//! use spark_ui::state::events::KeyData;
//!
//! dispatcher.key_down(&tree, KeyData::named("Tab"));
//! ```

use super::dispatch::propagate;
use super::dispatcher::EventDispatcher;
use super::events::{Event, EventType, KeyData, Modifiers};
use crate::engine::WidgetTree;

impl KeyData {
    /// Non-printing key such as "Enter" or "ArrowUp".
    pub fn named(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    /// Printable character.
    pub fn char(ch: char) -> Self {
        Self {
            key: ch.to_string(),
            ch: Some(ch),
            ..Self::default()
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

impl EventDispatcher {
    /// Route a key press. Returns whether a handler or a default action
    /// consumed it.
    pub fn key_down(&mut self, tree: &WidgetTree, data: KeyData) -> bool {
        let mut prevented = false;
        if let Some(focused) = self.focused.filter(|id| tree.contains(*id)) {
            let mut event = Event::key(EventType::KeyDown, focused, data.clone());
            if propagate(tree, &tree.chain(focused), &mut event) {
                return true;
            }
            prevented = event.is_default_prevented();
        }
        if prevented {
            return false;
        }

        match data.key.as_str() {
            "Tab" if data.modifiers.shift => self.focus_previous(tree),
            "Tab" => self.focus_next(tree),
            "ArrowDown" | "ArrowRight" => self.focus_radio_sibling(tree, true),
            "ArrowUp" | "ArrowLeft" => self.focus_radio_sibling(tree, false),
            _ => false,
        }
    }

    /// Route a key release.
    pub fn key_up(&mut self, tree: &WidgetTree, data: KeyData) -> bool {
        let Some(focused) = self.focused.filter(|id| tree.contains(*id)) else {
            return false;
        };
        let mut event = Event::key(EventType::KeyUp, focused, data);
        propagate(tree, &tree.chain(focused), &mut event)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::WidgetId;
    use crate::state::dispatch::handler;
    use crate::state::events::Phase;
    use crate::types::WidgetKind;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn two_buttons() -> (WidgetTree, WidgetId, WidgetId, WidgetId) {
        let tree = WidgetTree::new();
        let root = tree.create_root(WidgetKind::VStack);
        let a = tree.create(WidgetKind::Button);
        let b = tree.create(WidgetKind::Button);
        tree.add_child(root, a);
        tree.add_child(root, b);
        (tree, root, a, b)
    }

    #[test]
    fn test_keys_go_to_focused_chain() {
        let (tree, root, a, b) = two_buttons();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for id in [root, a, b] {
            let seen = Arc::clone(&seen);
            tree.update(id, |w| {
                w.on(
                    EventType::KeyDown,
                    handler(move |_, e| {
                        seen.lock().push((e.current_target, e.phase, e.key_data().and_then(|k| k.ch)));
                        false
                    }),
                )
            });
        }

        let mut dispatcher = EventDispatcher::default();
        assert!(!dispatcher.key_down(&tree, KeyData::char('x')));
        assert!(seen.lock().is_empty());

        dispatcher.set_focus(&tree, Some(b));
        dispatcher.key_down(&tree, KeyData::char('x'));
        assert_eq!(
            seen.lock().clone(),
            vec![(Some(b), Phase::Target, Some('x')), (Some(root), Phase::Bubble, Some('x'))]
        );
    }

    #[test]
    fn test_tab_moves_focus() {
        let (tree, _, a, b) = two_buttons();
        let mut dispatcher = EventDispatcher::default();

        assert!(dispatcher.key_down(&tree, KeyData::named("Tab")));
        assert_eq!(dispatcher.focused(), Some(a));
        dispatcher.key_down(&tree, KeyData::named("Tab"));
        assert_eq!(dispatcher.focused(), Some(b));
        dispatcher.key_down(&tree, KeyData::named("Tab").with_modifiers(Modifiers::shift()));
        assert_eq!(dispatcher.focused(), Some(a));
    }

    #[test]
    fn test_prevent_default_blocks_tab() {
        let (tree, _, a, _) = two_buttons();
        tree.update(a, |w| {
            w.on(
                EventType::KeyDown,
                handler(|_, e| {
                    e.prevent_default();
                    false
                }),
            )
        });
        let mut dispatcher = EventDispatcher::default();
        dispatcher.set_focus(&tree, Some(a));

        assert!(!dispatcher.key_down(&tree, KeyData::named("Tab")));
        assert_eq!(dispatcher.focused(), Some(a));
    }

    #[test]
    fn test_key_up_without_focus() {
        let (tree, _, _, _) = two_buttons();
        let mut dispatcher = EventDispatcher::default();
        assert!(!dispatcher.key_up(&tree, KeyData::named("Enter")));
    }
}
