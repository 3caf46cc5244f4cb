//! End-to-end scenarios through the public API: build a tree, tick the
//! frame driver, feed input, check geometry and the events handlers saw.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use spark_ui::state::{KeyData, MouseButton, MouseData};
use spark_ui::{
    Config, EventType, InputEvent, Offsets, Position, Ui, WidgetId, WidgetKind, WidgetTree, handler,
    size,
};

type Log = Arc<Mutex<Vec<(EventType, WidgetId)>>>;

fn ui() -> Ui {
    Ui::new(&Config::default(), size(800.0, 600.0)).unwrap()
}

fn boxed(tree: &WidgetTree, kind: WidgetKind, w: f32, h: f32) -> WidgetId {
    let id = tree.create(kind);
    tree.update(id, |widget| {
        widget.set_fixed_width(w);
        widget.set_fixed_height(h);
    });
    id
}

fn record(tree: &WidgetTree, id: WidgetId, log: &Log, types: &[EventType]) {
    for &ty in types {
        let log = Arc::clone(log);
        tree.update(id, |w| {
            w.on(
                ty,
                handler(move |_, e| {
                    if e.current_target == Some(e.target) {
                        log.lock().push((e.ty, e.target));
                    }
                    false
                }),
            )
        });
    }
}

fn left(x: f32, y: f32) -> MouseData {
    MouseData { x, y, button: MouseButton::Left, ..Default::default() }
}

// =============================================================================
// LAYOUT
// =============================================================================

#[test]
fn test_wrapped_text_pushes_siblings_down() {
    let mut ui = ui();
    let tree = Arc::clone(ui.tree());
    let root = tree.create_root(WidgetKind::VStack);
    tree.update(root, |w| w.set_fixed_width(200.0));
    let texts: Vec<_> = ["Hello", "A much longer sentence that needs two lines", "Bye"]
        .into_iter()
        .map(|s| {
            let id = tree.create(WidgetKind::Text);
            tree.update(id, |w| w.set_text(s));
            tree.add_child(root, id);
            id
        })
        .collect();

    assert!(ui.tick().layout_ran);

    let rects: Vec<_> = texts.iter().map(|id| tree.with(*id, |w| w.layout_rect()).unwrap()).collect();
    let close = |a: f32, b: f32| (a - b).abs() < 0.01;
    assert!(rects.iter().all(|r| close(r.width, 200.0)));
    assert!(close(rects[0].height, 19.6));
    assert!(close(rects[1].height, 39.2));
    assert!(close(rects[1].y, 19.6));
    assert!(close(rects[2].y, 58.8));
    assert!(close(tree.with(root, |w| w.layout_rect().height).unwrap(), 78.4));
}

#[test]
fn test_absolute_child_in_relative_parent() {
    let mut ui = ui();
    let tree = Arc::clone(ui.tree());
    let root = tree.create_root(WidgetKind::VStack);
    tree.update(root, |w| w.set_padding(spark_ui::uniform(20.0)));
    let parent = boxed(&tree, WidgetKind::Container, 300.0, 100.0);
    tree.update(parent, |w| w.set_position(Position::Relative));
    let child = tree.create(WidgetKind::Container);
    tree.update(child, |w| {
        w.set_position(Position::Absolute);
        w.set_offsets(Offsets { left: Some(10.0), right: Some(10.0), top: Some(0.0), bottom: None });
    });
    tree.add_child(root, parent);
    tree.add_child(parent, child);

    ui.tick();
    let p = tree.with(parent, |w| w.layout_rect()).unwrap();
    let c = tree.with(child, |w| w.layout_rect()).unwrap();
    assert_eq!(c.width, 280.0);
    assert_eq!(c.x, p.x + 10.0);
}

// =============================================================================
// EVENTS
// =============================================================================

#[test]
fn test_hover_diff_through_frame_driver() {
    let mut ui = ui();
    let tree = Arc::clone(ui.tree());
    let root = tree.create_root(WidgetKind::VStack);
    let b = boxed(&tree, WidgetKind::Container, 200.0, 100.0);
    let a = boxed(&tree, WidgetKind::Button, 100.0, 50.0);
    let c_parent = boxed(&tree, WidgetKind::Container, 200.0, 100.0);
    let c = boxed(&tree, WidgetKind::Button, 100.0, 50.0);
    tree.add_child(root, b);
    tree.add_child(b, a);
    tree.add_child(root, c_parent);
    tree.add_child(c_parent, c);
    ui.tick();

    let log: Log = Arc::default();
    for id in [root, b, a, c_parent, c] {
        record(&tree, id, &log, &[EventType::MouseEnter, EventType::MouseLeave]);
    }

    ui.handle_input(&InputEvent::MouseMove(left(10.0, 10.0)));
    log.lock().clear();
    ui.handle_input(&InputEvent::MouseMove(left(10.0, 110.0)));

    assert_eq!(
        log.lock().clone(),
        vec![
            (EventType::MouseLeave, a),
            (EventType::MouseLeave, b),
            (EventType::MouseEnter, c_parent),
            (EventType::MouseEnter, c),
        ]
    );
}

#[test]
fn test_triple_click_then_fresh_count() {
    let mut ui = ui();
    let tree = Arc::clone(ui.tree());
    let root = tree.create_root(WidgetKind::VStack);
    let button = boxed(&tree, WidgetKind::Button, 100.0, 40.0);
    tree.add_child(root, button);
    ui.tick();

    let log: Log = Arc::default();
    record(&tree, button, &log, &[EventType::Click, EventType::DoubleClick, EventType::TripleClick]);

    let t0 = Instant::now();
    let mut seen = Vec::new();
    for i in 0..4 {
        let now = t0 + Duration::from_millis(150 * i);
        ui.handle_input_at(&InputEvent::MouseDown(left(20.0, 20.0)), now);
        ui.handle_input_at(&InputEvent::MouseUp(left(21.0, 21.0)), now);
        seen.push(log.lock().drain(..).map(|(ty, _)| ty).collect::<Vec<_>>());
    }
    assert_eq!(
        seen,
        vec![
            vec![EventType::Click],
            vec![EventType::Click, EventType::DoubleClick],
            vec![EventType::Click, EventType::TripleClick],
            vec![EventType::Click],
        ]
    );

    // a slow click starts over
    let late = t0 + Duration::from_secs(5);
    ui.handle_input_at(&InputEvent::MouseDown(left(20.0, 20.0)), late);
    ui.handle_input_at(&InputEvent::MouseUp(left(20.0, 20.0)), late);
    assert_eq!(ui.dispatcher().click_count(), 1);
}

#[test]
fn test_wheel_clamps_to_content() {
    let mut ui = ui();
    let tree = Arc::clone(ui.tree());
    let root = tree.create_root(WidgetKind::VStack);
    let view = boxed(&tree, WidgetKind::ScrollView, 300.0, 200.0);
    let content = boxed(&tree, WidgetKind::Container, 300.0, 1000.0);
    tree.add_child(root, view);
    tree.add_child(view, content);
    ui.tick();

    let wheel = InputEvent::Wheel(MouseData { x: 50.0, y: 50.0, delta_y: 5000.0, ..Default::default() });
    assert!(ui.handle_input(&wheel));
    assert_eq!(tree.with(view, |w| w.scroll_offset().y).unwrap(), 800.0);

    // bounds follow the scroll without another layout
    let outcome = ui.tick();
    assert!(outcome.redraw);
    assert!(!outcome.layout_ran);
    let (bounds, _) = tree.with(content, |w| w.computed_bounds()).unwrap();
    assert_eq!(bounds.y, -800.0);
}

#[test]
fn test_click_focus_then_tab() {
    let mut ui = ui();
    let tree = Arc::clone(ui.tree());
    let root = tree.create_root(WidgetKind::VStack);
    let first = boxed(&tree, WidgetKind::TextField, 200.0, 36.0);
    let second = boxed(&tree, WidgetKind::Button, 200.0, 36.0);
    tree.add_child(root, first);
    tree.add_child(root, second);
    ui.tick();

    let typed = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&typed);
    tree.update(first, |w| {
        w.on(
            EventType::KeyDown,
            handler(move |_, e| match e.key_data().and_then(|k| k.ch) {
                Some(ch) => {
                    sink.lock().push(ch);
                    true
                }
                None => false,
            }),
        )
    });

    ui.handle_input(&InputEvent::MouseDown(left(10.0, 10.0)));
    ui.handle_input(&InputEvent::MouseUp(left(10.0, 10.0)));
    assert_eq!(ui.dispatcher().focused(), Some(first));

    for ch in "hi".chars() {
        ui.handle_input(&InputEvent::KeyDown(KeyData::char(ch)));
    }
    assert_eq!(typed.lock().as_str(), "hi");

    ui.handle_input(&InputEvent::KeyDown(KeyData::named("Tab")));
    assert_eq!(ui.dispatcher().focused(), Some(second));
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Parent and children links agree after any sequence of edits.
    #[test]
    fn prop_tree_links_agree(ops in prop::collection::vec((0usize..12, 0usize..12, any::<bool>()), 1..60)) {
        let tree = WidgetTree::new();
        let root = tree.create_root(WidgetKind::VStack);
        let mut ids = vec![root];
        ids.extend((0..11).map(|_| tree.create(WidgetKind::Container)));

        for (p, c, add) in ops {
            if add {
                tree.add_child(ids[p], ids[c]);
            } else {
                tree.remove_child(ids[p], ids[c]);
            }
        }

        for &id in &ids {
            for child in tree.children(id) {
                prop_assert_eq!(tree.parent(child), Some(id));
            }
            if let Some(parent) = tree.parent(id) {
                prop_assert!(tree.children(parent).contains(&id));
                prop_assert!(!tree.is_ancestor(id, parent));
            }
        }
    }
}
