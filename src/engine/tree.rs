//! Widget Tree - arena of widgets addressed by stable ids.
//!
//! Widgets live in a `SlotMap` behind per-widget `parking_lot` mutexes, so a
//! worker thread can update one widget while the simulation thread walks the
//! rest. Parent and children links are ids, never pointers.
//!
//! Locking discipline:
//! - at most one widget lock is held at any time
//! - walks snapshot a children list under the lock, release it, then recurse
//! - structural edits (add/insert/remove/destroy) are serialized by a
//!   tree-wide structure lock
//!
//! A walk racing a structural change may miss it; it never deadlocks.
//!
//! # API
//!
//! - `create(kind)` / `create_root(kind)` / `set_root(id)`
//! - `with_default_font(font)` / `set_default_font(font)` - font of new widgets
//! - `with(id, f)` / `update(id, f)` - read or mutate one widget
//! - `add_child` / `insert_child` / `remove_child` / `destroy`
//! - `parent`, `children`, `ancestors`, `path_to_root`, `chain`, `descendants`
//! - `invalidate_layout(id)` / `invalidate_tree_layout()`
//! - `is_layout_dirty()` - O(1) check used by the layout fast path

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use slotmap::{SlotMap, new_key_type};
use tracing::trace;

use super::widget::{DirtyFlags, Widget};
use crate::types::{Font, WidgetKind};

new_key_type! {
    /// Stable handle of a widget in a [`WidgetTree`].
    pub struct WidgetId;
}

/// Shared, individually locked widget.
pub type WidgetHandle = Arc<Mutex<Widget>>;

// =============================================================================
// Tree
// =============================================================================

pub struct WidgetTree {
    nodes: RwLock<SlotMap<WidgetId, WidgetHandle>>,
    root: RwLock<Option<WidgetId>>,
    structure: Mutex<()>,
    layout_dirty: AtomicBool,
    /// Font given to widgets at creation.
    default_font: RwLock<Font>,
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WidgetTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetTree")
            .field("len", &self.len())
            .field("root", &self.root())
            .field("layout_dirty", &self.is_layout_dirty())
            .finish()
    }
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::with_default_font(Font::default())
    }

    /// Empty tree whose widgets start out with `font`.
    pub fn with_default_font(font: Font) -> Self {
        Self {
            nodes: RwLock::new(SlotMap::with_key()),
            root: RwLock::new(None),
            structure: Mutex::new(()),
            layout_dirty: AtomicBool::new(false),
            default_font: RwLock::new(font),
        }
    }

    pub fn default_font(&self) -> Font {
        self.default_font.read().clone()
    }

    /// Font for widgets created from now on. Existing widgets keep theirs.
    pub fn set_default_font(&self, font: Font) {
        *self.default_font.write() = font;
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a detached widget.
    pub fn create(&self, kind: WidgetKind) -> WidgetId {
        let font = self.default_font();
        let id = self
            .nodes
            .write()
            .insert_with_key(|id| Arc::new(Mutex::new(Widget::new(id, kind, font))));
        trace!(widget = ?id, ?kind, "created widget");
        id
    }

    /// Create a widget and make it the root.
    pub fn create_root(&self, kind: WidgetKind) -> WidgetId {
        let id = self.create(kind);
        self.set_root(id);
        id
    }

    /// Make `id` the root. It is detached from any parent first.
    pub fn set_root(&self, id: WidgetId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }
        let previous = self.root.write().replace(id);
        if let Some(previous) = previous.filter(|p| *p != id) {
            self.set_attached(previous, false);
        }
        self.set_attached(id, true);
        self.invalidate_layout(id);
        true
    }

    pub fn root(&self) -> Option<WidgetId> {
        *self.root.read()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone the handle out of the arena so the arena lock is released
    /// before the widget lock is taken.
    pub(crate) fn handle(&self, id: WidgetId) -> Option<WidgetHandle> {
        self.nodes.read().get(id).cloned()
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Read one widget.
    pub fn with<R>(&self, id: WidgetId, f: impl FnOnce(&Widget) -> R) -> Option<R> {
        let handle = self.handle(id)?;
        let widget = handle.lock();
        Some(f(&widget))
    }

    /// Mutate one widget. Layout-affecting changes made by `f` invalidate the
    /// widget's subtree and mark its ancestors layout-dirty.
    pub fn update<R>(&self, id: WidgetId, f: impl FnOnce(&mut Widget) -> R) -> Option<R> {
        let handle = self.handle(id)?;
        let (result, touched) = {
            let mut widget = handle.lock();
            widget.layout_touched = false;
            let result = f(&mut widget);
            let touched = std::mem::take(&mut widget.layout_touched);
            (result, touched)
        };
        if touched {
            self.propagate_layout_change(id);
        }
        Some(result)
    }

    /// Like `update` but without layout propagation. Used by the layout
    /// engine, which writes geometry it just resolved.
    pub(crate) fn update_raw<R>(&self, id: WidgetId, f: impl FnOnce(&mut Widget) -> R) -> Option<R> {
        let handle = self.handle(id)?;
        let mut widget = handle.lock();
        let result = f(&mut widget);
        widget.layout_touched = false;
        Some(result)
    }

    fn propagate_layout_change(&self, id: WidgetId) {
        self.invalidate_subtree(id);
        for ancestor in self.ancestors(id) {
            self.update_raw(ancestor, |w| {
                w.dirty |= DirtyFlags::LAYOUT;
                w.layout_epoch = w.layout_epoch.wrapping_add(1);
            });
        }
        self.layout_dirty.store(true, Ordering::Release);
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Append `child` to `parent`, reparenting it if needed.
    ///
    /// Returns false if either widget is missing or the edge would create a
    /// cycle.
    pub fn add_child(&self, parent: WidgetId, child: WidgetId) -> bool {
        self.insert_child(parent, usize::MAX, child)
    }

    /// Insert `child` at `index` (clamped) among `parent`'s children.
    pub fn insert_child(&self, parent: WidgetId, index: usize, child: WidgetId) -> bool {
        let _guard = self.structure.lock();
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.ancestors(parent).contains(&child) {
            trace!(?parent, ?child, "rejected cyclic add_child");
            return false;
        }

        if let Some(old_parent) = self.parent(child) {
            self.detach_from(old_parent, child);
        }
        if self.root() == Some(child) {
            *self.root.write() = None;
        }

        let Some(attached) = self.update_raw(parent, |p| {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
            p.mark_dirty(DirtyFlags::CHILDREN);
            p.attached
        }) else {
            return false;
        };
        self.update_raw(child, |c| c.parent = Some(parent));
        self.set_attached(child, attached);
        self.propagate_layout_change(parent);
        true
    }

    /// Detach `child` from `parent`. Returns false if it is not a child.
    ///
    /// The child and its subtree stay in the arena, detached.
    pub fn remove_child(&self, parent: WidgetId, child: WidgetId) -> bool {
        let _guard = self.structure.lock();
        self.detach_from(parent, child)
    }

    fn detach_from(&self, parent: WidgetId, child: WidgetId) -> bool {
        let removed = self
            .update_raw(parent, |p| {
                let Some(pos) = p.children.iter().position(|c| *c == child) else {
                    return false;
                };
                p.children.remove(pos);
                p.mark_dirty(DirtyFlags::CHILDREN);
                true
            })
            .unwrap_or(false);
        if !removed {
            return false;
        }
        self.update_raw(child, |c| c.parent = None);
        self.set_attached(child, false);
        self.propagate_layout_change(parent);
        true
    }

    /// Remove a widget and its subtree from the arena.
    pub fn destroy(&self, id: WidgetId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }
        if self.root() == Some(id) {
            *self.root.write() = None;
        }
        let mut doomed = self.descendants(id);
        doomed.push(id);
        let _guard = self.structure.lock();
        let mut nodes = self.nodes.write();
        for id in doomed {
            nodes.remove(id);
        }
        self.layout_dirty.store(true, Ordering::Release);
        true
    }

    fn set_attached(&self, id: WidgetId, attached: bool) {
        self.update_raw(id, |w| w.attached = attached);
        for d in self.descendants(id) {
            self.update_raw(d, |w| w.attached = attached);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.with(id, |w| w.parent).flatten()
    }

    /// Snapshot of the children list.
    pub fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        self.with(id, |w| w.children.clone()).unwrap_or_default()
    }

    pub fn kind(&self, id: WidgetId) -> Option<WidgetKind> {
        self.with(id, |w| w.kind())
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            // A racing reparent can briefly produce a loop; bail out.
            if out.contains(&p) || p == id {
                break;
            }
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// `id` followed by its ancestors up to the root.
    pub fn path_to_root(&self, id: WidgetId) -> Vec<WidgetId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut path = vec![id];
        path.extend(self.ancestors(id));
        path
    }

    /// Root-to-`id` chain, the order events propagate through.
    pub fn chain(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut chain = self.path_to_root(id);
        chain.reverse();
        chain
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Strict descendants in pre-order.
    pub fn descendants(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack: Vec<WidgetId> = self.children(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// First widget in pre-order (from the root) with the given debug name.
    pub fn find_by_name(&self, name: &str) -> Option<WidgetId> {
        let root = self.root()?;
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|id| self.with(*id, |w| w.name() == Some(name)).unwrap_or(false))
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Force `id`'s subtree to be recomputed on the next layout.
    pub fn invalidate_layout(&self, id: WidgetId) {
        if self.contains(id) {
            self.propagate_layout_change(id);
        }
    }

    /// Force the whole tree to be recomputed (window resize).
    pub fn invalidate_tree_layout(&self) {
        if let Some(root) = self.root() {
            self.invalidate_subtree(root);
        }
        self.layout_dirty.store(true, Ordering::Release);
    }

    fn invalidate_subtree(&self, id: WidgetId) {
        let mark = |w: &mut Widget| w.invalidate_layout_cache();
        self.update_raw(id, mark);
        for d in self.descendants(id) {
            self.update_raw(d, mark);
        }
    }

    /// True when any widget has unresolved layout-affecting changes.
    pub fn is_layout_dirty(&self) -> bool {
        self.layout_dirty.load(Ordering::Acquire)
    }

    pub(crate) fn clear_layout_dirty(&self) {
        self.layout_dirty.store(false, Ordering::Release);
    }
}

// =============================================================================
// Tests
// =============================================================================
