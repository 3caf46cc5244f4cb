//! Dispatch - three-phase propagation over a root-to-target chain.
//!
//! Every routed event goes through the helpers here:
//!
//! 1. **Capture** - root down to the target's parent, capture handlers only
//! 2. **Target** - the target itself
//! 3. **Bubble** - the target's parent back up to the root
//!
//! A node that returns `true` (handled) or calls `stop_propagation` ends the
//! walk. At each node, the widget's behaviors are tried first, in order; then
//! its [`Responder`] if one is installed, otherwise the per-type handler.
//!
//! Handlers run with no lock held. The handler slot is taken out of the
//! widget for the duration of the call and put back afterwards, so a handler
//! may freely read or update its own widget through the tree.
//!
//! # API
//!
//! - `propagate(tree, chain, event)` - capture, target, bubble
//! - `dispatch_bubble_only(tree, chain, event)` - target, bubble
//! - `dispatch_direct(tree, target, event)` - target only
//! - `handler(f)` - box a closure as an [`EventHandler`]

use tracing::trace;

use super::events::{Event, EventType, Phase};
use crate::engine::{WidgetId, WidgetTree};
use crate::types::{LayoutRect, Point};

// =============================================================================
// TYPES
// =============================================================================

/// Per-type event callback. Returns true when the event is handled.
pub type EventHandler = Box<dyn FnMut(&WidgetTree, &mut Event) -> bool + Send>;

/// Box a closure as an [`EventHandler`].
pub fn handler<F>(f: F) -> EventHandler
where
    F: FnMut(&WidgetTree, &mut Event) -> bool + Send + 'static,
{
    Box::new(f)
}

/// Replaces the default per-type handler dispatch of one widget.
pub trait Responder: Send {
    /// Called at every phase the widget takes part in.
    fn handle_event(&mut self, tree: &WidgetTree, event: &mut Event) -> bool;

    /// Custom hit shape. `bounds` is the widget's effective rectangle and
    /// `p` is already known to lie inside it.
    fn hit_test(&self, _bounds: LayoutRect, _p: Point<f32>) -> bool {
        true
    }

    /// False makes the widget transparent to the pointer.
    fn can_receive_events(&self) -> bool {
        true
    }
}

/// Interceptor tried before a widget's default handling.
pub trait Behavior: Send {
    fn intercept(&mut self, tree: &WidgetTree, event: &mut Event) -> bool;
}

// =============================================================================
// PROPAGATION
// =============================================================================

/// Full capture/target/bubble dispatch. `chain` runs root to target; the
/// event's target must be its last element. Returns whether any node
/// handled the event.
pub fn propagate(tree: &WidgetTree, chain: &[WidgetId], event: &mut Event) -> bool {
    let Some((&target, ancestors)) = chain.split_last() else {
        return false;
    };

    event.phase = Phase::Capture;
    for &id in ancestors {
        if invoke(tree, id, event) || event.is_propagation_stopped() {
            return finish(event, true);
        }
    }

    bubble_from(tree, target, ancestors, event)
}

/// Target and bubble phases only. Used for focus changes and for drag-end
/// notification of a widget that no longer sits under the pointer.
pub fn dispatch_bubble_only(tree: &WidgetTree, chain: &[WidgetId], event: &mut Event) -> bool {
    let Some((&target, ancestors)) = chain.split_last() else {
        return false;
    };
    bubble_from(tree, target, ancestors, event)
}

/// Deliver to `target` alone (enter/leave, drag continuation).
pub fn dispatch_direct(tree: &WidgetTree, target: WidgetId, event: &mut Event) -> bool {
    event.phase = Phase::Target;
    let handled = invoke(tree, target, event);
    finish(event, handled)
}

fn bubble_from(
    tree: &WidgetTree,
    target: WidgetId,
    ancestors: &[WidgetId],
    event: &mut Event,
) -> bool {
    event.phase = Phase::Target;
    if invoke(tree, target, event) || event.is_propagation_stopped() {
        return finish(event, true);
    }

    event.phase = Phase::Bubble;
    for &id in ancestors.iter().rev() {
        if invoke(tree, id, event) || event.is_propagation_stopped() {
            return finish(event, true);
        }
    }
    finish(event, false)
}

fn finish(event: &mut Event, handled: bool) -> bool {
    event.phase = Phase::None;
    event.current_target = None;
    handled
}

// =============================================================================
// NODE INVOCATION
// =============================================================================

/// What was borrowed out of a widget for one call.
struct Taken {
    behaviors: Vec<Box<dyn Behavior>>,
    responder: Option<Box<dyn Responder>>,
    handler: Option<EventHandler>,
}

/// Run one node's handling for the event's current phase.
fn invoke(tree: &WidgetTree, id: WidgetId, event: &mut Event) -> bool {
    let capture = event.phase == Phase::Capture;
    let ty = event.ty;

    let Some(mut taken) = tree.update_raw(id, |w| {
        let responder = w.responder.take();
        let handler = if responder.is_some() {
            None
        } else if capture {
            w.capture_handlers.remove(&ty)
        } else {
            w.handlers.remove(&ty)
        };
        Taken {
            behaviors: std::mem::take(&mut w.behaviors),
            responder,
            handler,
        }
    }) else {
        return false;
    };

    event.current_target = Some(id);
    trace!(widget = ?id, ?ty, phase = ?event.phase, "dispatch");

    let mut handled = false;
    for behavior in taken.behaviors.iter_mut() {
        if behavior.intercept(tree, event) {
            handled = true;
            break;
        }
    }
    if !handled {
        handled = match (&mut taken.responder, &mut taken.handler) {
            (Some(responder), _) => responder.handle_event(tree, event),
            (None, Some(handler)) => handler(tree, event),
            (None, None) => false,
        };
    }

    restore(tree, id, capture, ty, taken);
    handled
}

/// Put borrowed slots back unless the call installed replacements.
fn restore(tree: &WidgetTree, id: WidgetId, capture: bool, ty: EventType, taken: Taken) {
    tree.update_raw(id, |w| {
        let added = std::mem::replace(&mut w.behaviors, taken.behaviors);
        w.behaviors.extend(added);
        if w.responder.is_none() {
            w.responder = taken.responder;
        }
        if let Some(handler) = taken.handler {
            let slots = if capture { &mut w.capture_handlers } else { &mut w.handlers };
            slots.entry(ty).or_insert(handler);
        }
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::events::MouseData;
    use crate::types::WidgetKind;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<(String, Phase)>>>;

    fn recorder(log: &Log, name: &str, result: bool) -> EventHandler {
        let log = Arc::clone(log);
        let name = name.to_string();
        handler(move |_, e| {
            log.lock().push((name.clone(), e.phase));
            result
        })
    }

    fn three_levels() -> (WidgetTree, Vec<WidgetId>) {
        let tree = WidgetTree::new();
        let root = tree.create_root(WidgetKind::VStack);
        let mid = tree.create(WidgetKind::Container);
        let leaf = tree.create(WidgetKind::Button);
        tree.add_child(root, mid);
        tree.add_child(mid, leaf);
        (tree, vec![root, mid, leaf])
    }

    fn install_all(tree: &WidgetTree, chain: &[WidgetId], log: &Log, ty: EventType) {
        for (id, name) in chain.iter().zip(["root", "mid", "leaf"]) {
            tree.update(*id, |w| {
                w.on(ty, recorder(log, name, false));
                w.on_capture(ty, recorder(log, name, false));
            });
        }
    }

    #[test]
    fn test_phase_order() {
        let (tree, chain) = three_levels();
        let log: Log = Arc::default();
        install_all(&tree, &chain, &log, EventType::MouseDown);

        let mut event = Event::mouse(EventType::MouseDown, chain[2], MouseData::default());
        assert!(!propagate(&tree, &chain, &mut event));

        assert_eq!(
            log.lock().clone(),
            vec![
                ("root".to_owned(), Phase::Capture),
                ("mid".to_owned(), Phase::Capture),
                ("leaf".to_owned(), Phase::Target),
                ("mid".to_owned(), Phase::Bubble),
                ("root".to_owned(), Phase::Bubble),
            ]
        );
        assert_eq!(event.phase, Phase::None);
    }

    #[test]
    fn test_capture_handler_stops_walk() {
        let (tree, chain) = three_levels();
        let log: Log = Arc::default();
        install_all(&tree, &chain, &log, EventType::Click);
        tree.update(chain[1], |w| w.on_capture(EventType::Click, recorder(&log, "mid", true)));

        let mut event = Event::mouse(EventType::Click, chain[2], MouseData::default());
        assert!(propagate(&tree, &chain, &mut event));
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_stop_propagation_in_target() {
        let (tree, chain) = three_levels();
        let log: Log = Arc::default();
        install_all(&tree, &chain, &log, EventType::Click);
        let inner = Arc::clone(&log);
        tree.update(chain[2], |w| {
            w.on(
                EventType::Click,
                handler(move |_, e| {
                    inner.lock().push(("leaf".into(), e.phase));
                    e.stop_propagation();
                    false
                }),
            )
        });

        let mut event = Event::mouse(EventType::Click, chain[2], MouseData::default());
        assert!(propagate(&tree, &chain, &mut event));
        let last = log.lock().last().cloned();
        assert_eq!(last, Some(("leaf".to_owned(), Phase::Target)));
        assert!(event.is_propagation_stopped());
    }

    #[test]
    fn test_bubble_only_skips_capture() {
        let (tree, chain) = three_levels();
        let log: Log = Arc::default();
        install_all(&tree, &chain, &log, EventType::Focus);

        let mut event = Event::focus(EventType::Focus, chain[2], None);
        dispatch_bubble_only(&tree, &chain, &mut event);
        assert!(log.lock().iter().all(|(_, p)| *p != Phase::Capture));
        assert_eq!(log.lock().len(), 3);
    }

    struct Swallow(Arc<Mutex<u32>>);

    impl Responder for Swallow {
        fn handle_event(&mut self, _tree: &WidgetTree, event: &mut Event) -> bool {
            *self.0.lock() += 1;
            event.phase == Phase::Target
        }
    }

    #[test]
    fn test_responder_overrides_handlers() {
        let (tree, chain) = three_levels();
        let log: Log = Arc::default();
        install_all(&tree, &chain, &log, EventType::Click);
        let calls = Arc::new(Mutex::new(0));
        tree.update(chain[2], |w| w.set_responder(Some(Box::new(Swallow(Arc::clone(&calls))))));

        let mut event = Event::mouse(EventType::Click, chain[2], MouseData::default());
        assert!(propagate(&tree, &chain, &mut event));
        assert_eq!(*calls.lock(), 1);
        // root and mid capture ran, leaf's own handler did not
        assert_eq!(log.lock().len(), 2);
        assert!(tree.with(chain[2], |w| w.has_responder()).unwrap());
    }

    struct Block;

    impl Behavior for Block {
        fn intercept(&mut self, _tree: &WidgetTree, event: &mut Event) -> bool {
            event.ty == EventType::KeyDown
        }
    }

    #[test]
    fn test_behavior_intercepts_first() {
        let (tree, chain) = three_levels();
        let log: Log = Arc::default();
        install_all(&tree, &chain, &log, EventType::KeyDown);
        tree.update(chain[2], |w| w.add_behavior(Box::new(Block)));

        let mut event = Event::key(EventType::KeyDown, chain[2], Default::default());
        assert!(propagate(&tree, &chain, &mut event));
        assert!(log.lock().iter().all(|(n, _)| n != "leaf"));
    }

    #[test]
    fn test_handler_can_update_own_widget() {
        let (tree, chain) = three_levels();
        let leaf = chain[2];
        tree.update(leaf, |w| {
            w.on(
                EventType::Click,
                handler(move |tree, e| {
                    tree.update(e.target, |w| w.set_text("clicked"));
                    true
                }),
            )
        });

        let mut event = Event::mouse(EventType::Click, leaf, MouseData::default());
        assert!(dispatch_direct(&tree, leaf, &mut event));
        assert_eq!(tree.with(leaf, |w| w.text().to_owned()).unwrap(), "clicked");
        assert!(tree.with(leaf, |w| w.has_handler(EventType::Click)).unwrap());
    }

    #[test]
    fn test_empty_chain_is_noop() {
        let tree = WidgetTree::new();
        let id = tree.create(WidgetKind::Text);
        let mut event = Event::mouse(EventType::Click, id, MouseData::default());
        assert!(!propagate(&tree, &[], &mut event));
    }
}
