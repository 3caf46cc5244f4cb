//! Layout Engine - three-pass geometry resolver.
//!
//! ```text
//! snapshot → pass 1 (top-down: sizes, flex, positions)
//!          → pass 2 (bottom-up: content-sized containers adopt child heights)
//!          → pass 3 (top-down: shift later siblings in vertical stacks)
//!          → commit (computed layout + screen-space bounds)
//! ```
//!
//! A text widget only knows its wrapped height once pass 1 has given it a
//! width, while the siblings after it were already placed using its
//! intrinsic height. Pass 2 lets containers grow to fit, pass 3 moves the
//! siblings that follow down by the difference.
//!
//! The whole computation is skipped when the tree reports no layout-dirty
//! widget and the viewport did not change.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::flex::{FlexContainer, FlexItem, arrange};
use super::intrinsic::Intrinsic;
use super::node::{LayoutNode, snapshot};
use super::text_measure::TextServices;
use crate::config::TextConfig;
use crate::engine::{ComputedLayout, DirtyFlags, WidgetId, WidgetTree};
use crate::types::{
    AlignItems, FlexBasis, FlexDirection, FlexWrap, LayoutRect, Point, Position, Size, SizeMode,
    WidgetKind, point,
};

// =============================================================================
// Types
// =============================================================================

/// Space handed from a container to its children during pass 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConstraints {
    /// Content-box width, `None` if not yet known.
    pub available_width: Option<f32>,
    /// Content-box height, `None` when the container sizes to its content.
    pub available_height: Option<f32>,
    /// Content-box origin of the container.
    pub origin: Point<f32>,
    /// Rectangle absolute descendants resolve their offsets against.
    pub containing_block: LayoutRect,
    pub viewport: LayoutRect,
}

/// What a `compute_layout` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutReport {
    /// Nothing was dirty; no work was done.
    pub skipped: bool,
    /// Widgets whose layout was written.
    pub nodes: usize,
    /// Frame number stamped on refreshed bounds.
    pub frame: u64,
}

/// A flex line as placed in pass 1.
#[derive(Debug, Clone)]
struct LineRecord {
    items: Vec<WidgetId>,
    cross_size: f32,
}

pub struct LayoutEngine {
    text: TextServices,
    frame: u64,
    last_viewport: Option<Size<f32>>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(TextServices::default())
    }
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("text", &self.text)
            .field("frame", &self.frame)
            .field("last_viewport", &self.last_viewport)
            .finish()
    }
}

impl LayoutEngine {
    pub fn new(text: TextServices) -> Self {
        Self {
            text,
            frame: 0,
            last_viewport: None,
        }
    }

    pub fn from_config(config: &TextConfig) -> Self {
        Self::new(TextServices::from_config(config))
    }

    pub fn text(&self) -> &TextServices {
        &self.text
    }

    /// Frame number of the last completed layout.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Resolve geometry for every widget reachable from the root.
    pub fn compute_layout(&mut self, tree: &WidgetTree, viewport: Size<f32>) -> LayoutReport {
        if !tree.is_layout_dirty() && self.last_viewport == Some(viewport) {
            trace!("layout clean, skipping");
            return LayoutReport {
                skipped: true,
                nodes: 0,
                frame: self.frame,
            };
        }
        // Cleared before the snapshot so a concurrent change re-arms it.
        tree.clear_layout_dirty();
        self.last_viewport = Some(viewport);
        self.frame += 1;

        let Some(root) = tree.root() else {
            return LayoutReport {
                skipped: false,
                nodes: 0,
                frame: self.frame,
            };
        };

        let nodes = snapshot(tree, root);
        let viewport_rect = LayoutRect::new(0.0, 0.0, viewport.width, viewport.height);
        let mut run = LayoutRun {
            nodes: &nodes,
            intrinsic: Intrinsic::new(&nodes, &self.text),
            rects: HashMap::with_capacity(nodes.len()),
            slot_heights: HashMap::new(),
            lines: HashMap::new(),
            viewport: viewport_rect,
        };

        run.place_root(root);
        run.grow_to_content(root);
        run.reflow(root);

        let count = run.rects.len();
        commit(tree, root, &nodes, &run.rects, self.frame);
        debug!(nodes = count, frame = self.frame, w = viewport.width, h = viewport.height, "layout complete");
        LayoutReport {
            skipped: false,
            nodes: count,
            frame: self.frame,
        }
    }

    /// Recompute screen-space bounds after scrolling, without a layout.
    pub fn refresh_bounds(&self, tree: &WidgetTree) {
        let Some(root) = tree.root() else {
            return;
        };
        let mut stack = vec![(root, point(0.0, 0.0))];
        while let Some((id, scroll)) = stack.pop() {
            let Some((children, child_scroll)) = tree.update_raw(id, |w| {
                let scroll = if w.position() == Position::Fixed { point(0.0, 0.0) } else { scroll };
                w.computed_bounds = w.layout_rect().translate(-scroll.x, -scroll.y);
                w.bounds_frame = self.frame;
                let child_scroll = if w.is_scrollable() {
                    point(scroll.x + w.scroll_offset().x, scroll.y + w.scroll_offset().y)
                } else {
                    scroll
                };
                (w.children().to_vec(), child_scroll)
            }) else {
                continue;
            };
            stack.extend(children.into_iter().map(|c| (c, child_scroll)));
        }
    }
}

/// Write resolved rects back, marking layouts valid and clearing `LAYOUT`.
///
/// A widget invalidated after the snapshot gets the new rect but stays
/// invalid and dirty; the tree flag it raised brings the next layout.
fn commit(
    tree: &WidgetTree,
    root: WidgetId,
    nodes: &HashMap<WidgetId, LayoutNode>,
    rects: &HashMap<WidgetId, LayoutRect>,
    frame: u64,
) {
    let mut stack = vec![(root, point(0.0, 0.0))];
    while let Some((id, scroll)) = stack.pop() {
        let (Some(node), Some(rect)) = (nodes.get(&id), rects.get(&id)) else {
            continue;
        };
        let scroll = if node.position == Position::Fixed { point(0.0, 0.0) } else { scroll };
        tree.update_raw(id, |w| {
            let current = w.layout_epoch == node.epoch;
            w.computed = ComputedLayout {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                valid: current,
            };
            if current {
                w.dirty.remove(DirtyFlags::LAYOUT);
            } else {
                trace!(widget = ?id, "changed during layout, left invalid");
            }
            w.computed_bounds = rect.translate(-scroll.x, -scroll.y);
            w.bounds_frame = frame;
        });
        let child_scroll = if node.scrollable {
            point(scroll.x + node.scroll_offset.x, scroll.y + node.scroll_offset.y)
        } else {
            scroll
        };
        stack.extend(node.children.iter().map(|c| (*c, child_scroll)));
    }
}

// =============================================================================
// Layout Run
// =============================================================================

struct LayoutRun<'a> {
    nodes: &'a HashMap<WidgetId, LayoutNode>,
    intrinsic: Intrinsic<'a>,
    rects: HashMap<WidgetId, LayoutRect>,
    /// Height each flow child was given by its parent's flex arrangement.
    slot_heights: HashMap<WidgetId, f32>,
    /// Flow children per line, in placement order.
    lines: HashMap<WidgetId, Vec<LineRecord>>,
    viewport: LayoutRect,
}

impl LayoutRun<'_> {
    // =========================================================================
    // Pass 1: sizes and positions, top-down
    // =========================================================================

    fn place_root(&mut self, root: WidgetId) {
        let nodes = self.nodes;
        let Some(node) = nodes.get(&root) else {
            return;
        };
        let vp = self.viewport;
        let width = node
            .resolve_width(Some(vp.width))
            .unwrap_or_else(|| node.clamp_width(self.intrinsic.size(root, Some(vp.width)).width));
        let height = node
            .resolve_height(Some(vp.height))
            .unwrap_or_else(|| node.clamp_height(self.intrinsic.size(root, Some(width)).height));
        let rect = apply_relative(node, LayoutRect::new(0.0, 0.0, width, height));
        self.place(root, rect, vp);
    }

    /// Commit `rect` for `id` and lay out its children.
    ///
    /// `containing_block` is inherited by descendants unless `id` is itself
    /// positioned.
    fn place(&mut self, id: WidgetId, mut rect: LayoutRect, containing_block: LayoutRect) {
        let nodes = self.nodes;
        let Some(node) = nodes.get(&id) else {
            return;
        };

        // Wrapped height is only known now that the width is final.
        if node.kind.is_text_bearing() && node.height_is_auto() {
            let needed = node.clamp_height(self.intrinsic.text_block_height(node, rect.width));
            rect.height = rect.height.max(needed);
        }
        trace!(widget = ?id, kind = ?node.kind, x = rect.x, y = rect.y, w = rect.width, h = rect.height, "placed");
        self.rects.insert(id, rect);

        if node.children.is_empty() {
            return;
        }
        let content = rect.inset(node.padding);
        let constraints = LayoutConstraints {
            available_width: Some(content.width),
            available_height: (!node.height_is_auto()).then_some(content.height),
            origin: content.origin(),
            containing_block: if node.position.is_positioned() { rect } else { containing_block },
            viewport: self.viewport,
        };
        self.place_children(id, node, content, &constraints);
    }

    fn place_children(
        &mut self,
        id: WidgetId,
        node: &LayoutNode,
        content: LayoutRect,
        constraints: &LayoutConstraints,
    ) {
        let nodes = self.nodes;
        let mut flow = Vec::new();
        let mut out_of_flow = Vec::new();
        for &c in &node.children {
            let Some(child) = nodes.get(&c) else {
                continue;
            };
            if !child.visible {
                self.collapse(c, constraints.origin);
            } else if child.position.is_out_of_flow() {
                out_of_flow.push(c);
            } else {
                flow.push(c);
            }
        }

        if node.kind == WidgetKind::ZStack {
            self.place_stacked(node, &flow, content, constraints);
            let cross = flow.iter().filter_map(|c| self.rects.get(c)).map(|r| r.height).fold(0.0, f32::max);
            self.lines.insert(id, vec![LineRecord { items: flow, cross_size: cross }]);
        } else if !flow.is_empty() {
            self.place_flex(id, node, &flow, content, constraints);
        }

        for c in out_of_flow {
            let Some(child) = nodes.get(&c) else {
                continue;
            };
            let cb = if child.position == Position::Fixed {
                constraints.viewport
            } else {
                constraints.containing_block
            };
            let rect = self.absolute_rect(c, child, cb, constraints.origin);
            self.place(c, rect, constraints.containing_block);
        }
    }

    /// ZStack: every child at the content origin, overlapping.
    fn place_stacked(
        &mut self,
        node: &LayoutNode,
        flow: &[WidgetId],
        content: LayoutRect,
        constraints: &LayoutConstraints,
    ) {
        let nodes = self.nodes;
        for &c in flow {
            let Some(child) = nodes.get(&c) else {
                continue;
            };
            let stretch = child.align_self.to_align_items().unwrap_or(node.align_items) == AlignItems::Stretch;
            let natural = self.intrinsic.size(c, Some(content.width));
            let w = child
                .resolve_width(constraints.available_width)
                .unwrap_or(if stretch { content.width } else { child.clamp_width(natural.width) });
            let h = child.resolve_height(constraints.available_height).unwrap_or_else(|| {
                if stretch && constraints.available_height.is_some() {
                    content.height
                } else {
                    child.clamp_height(self.intrinsic.size(c, Some(w)).height)
                }
            });
            let rect = apply_relative(child, LayoutRect::new(content.x, content.y, w, h));
            self.slot_heights.insert(c, h);
            self.place(c, rect, constraints.containing_block);
        }
    }

    fn place_flex(
        &mut self,
        id: WidgetId,
        node: &LayoutNode,
        flow: &[WidgetId],
        content: LayoutRect,
        constraints: &LayoutConstraints,
    ) {
        let is_row = node.direction.is_row();
        let (main_size, cross_size) = if is_row {
            (content.width, content.height)
        } else {
            (content.height, content.width)
        };
        let container = FlexContainer {
            direction: node.direction,
            wrap: node.wrap,
            justify: node.justify,
            align_items: node.align_items,
            main_size,
            cross_size,
            gap: node.gap,
            allow_shrink: !node.scrollable,
        };
        let items: Vec<FlexItem> = flow
            .iter()
            .map(|c| self.flex_item(*c, is_row, content, constraints))
            .collect();
        let arrangement = arrange(&container, &items);

        let nodes = self.nodes;
        for (k, &c) in flow.iter().enumerate() {
            let Some(child) = nodes.get(&c) else {
                continue;
            };
            let p = arrangement.placements[k];
            let rect = if is_row {
                LayoutRect::new(content.x + p.main_offset, content.y + p.cross_offset, p.main_size, p.cross_size)
            } else {
                LayoutRect::new(content.x + p.cross_offset, content.y + p.main_offset, p.cross_size, p.main_size)
            };
            self.slot_heights.insert(c, rect.height);
            self.place(c, apply_relative(child, rect), constraints.containing_block);
        }

        let lines = arrangement
            .lines
            .iter()
            .map(|line| LineRecord {
                items: line.items.iter().map(|&k| flow[k]).collect(),
                cross_size: line.cross_size,
            })
            .collect();
        self.lines.insert(id, lines);
    }

    /// Project one flow child onto the container's main/cross axes.
    fn flex_item(
        &mut self,
        c: WidgetId,
        is_row: bool,
        content: LayoutRect,
        constraints: &LayoutConstraints,
    ) -> FlexItem {
        let nodes = self.nodes;
        let Some(child) = nodes.get(&c) else {
            return FlexItem::default();
        };
        let rw = child.resolve_width(constraints.available_width);
        let rh = child.resolve_height(constraints.available_height);
        let (main_mode, main_available) = if is_row {
            (child.width_mode, constraints.available_width)
        } else {
            (child.height_mode, constraints.available_height)
        };

        let basis = match child.basis {
            FlexBasis::Fixed(v) => Some(v),
            FlexBasis::Percent(pct) => Some(main_available.map_or(0.0, |a| a * pct / 100.0)),
            FlexBasis::Full => Some(main_available.unwrap_or(0.0)),
            FlexBasis::Auto => None,
        };

        let (base_main, cross, stretch_cross, min_main, max_main, min_cross, max_cross) = if is_row {
            let base = basis.or(rw).unwrap_or_else(|| {
                if main_mode == SizeMode::Flex {
                    0.0
                } else {
                    child.clamp_width(self.intrinsic.size(c, Some(content.width)).width)
                }
            });
            let wrap_at = if base > 0.0 { base } else { content.width };
            let cross = rh.unwrap_or_else(|| child.clamp_height(self.intrinsic.size(c, Some(wrap_at)).height));
            (base, cross, rh.is_none(), child.min_width, child.max_width, child.min_height, child.max_height)
        } else {
            let width_guess = rw.unwrap_or(content.width);
            let natural = self.intrinsic.size(c, Some(width_guess));
            let base = basis.or(rh).unwrap_or_else(|| {
                if main_mode == SizeMode::Flex {
                    0.0
                } else {
                    child.clamp_height(natural.height)
                }
            });
            let cross = rw.unwrap_or_else(|| child.clamp_width(natural.width));
            (base, cross, rw.is_none(), child.min_height, child.max_height, child.min_width, child.max_width)
        };

        let grow = if main_mode == SizeMode::Flex { child.grow.max(1.0) } else { child.grow };
        FlexItem {
            order: child.order,
            base_main,
            cross,
            stretch_cross,
            grow,
            shrink: child.shrink,
            min_main,
            max_main,
            min_cross,
            max_cross,
            align: child.align_self.to_align_items(),
        }
    }

    /// Absolute/Fixed child resolved against its containing block.
    fn absolute_rect(
        &mut self,
        c: WidgetId,
        child: &LayoutNode,
        cb: LayoutRect,
        static_origin: Point<f32>,
    ) -> LayoutRect {
        let o = child.offsets;
        let width = child
            .resolve_width(Some(cb.width))
            .or_else(|| match (o.left, o.right) {
                (Some(l), Some(r)) => Some(child.clamp_width(cb.width - l - r)),
                _ => None,
            })
            .unwrap_or_else(|| child.clamp_width(self.intrinsic.size(c, Some(cb.width)).width));
        let height = child
            .resolve_height(Some(cb.height))
            .or_else(|| match (o.top, o.bottom) {
                (Some(t), Some(b)) => Some(child.clamp_height(cb.height - t - b)),
                _ => None,
            })
            .unwrap_or_else(|| child.clamp_height(self.intrinsic.size(c, Some(width)).height));
        let x = match (o.left, o.right) {
            (Some(l), _) => cb.x + l,
            (None, Some(r)) => cb.right() - r - width,
            (None, None) => static_origin.x,
        };
        let y = match (o.top, o.bottom) {
            (Some(t), _) => cb.y + t,
            (None, Some(b)) => cb.bottom() - b - height,
            (None, None) => static_origin.y,
        };
        LayoutRect::new(x, y, width, height)
    }

    /// Hidden widgets collapse to an empty rect, subtree included.
    fn collapse(&mut self, id: WidgetId, origin: Point<f32>) {
        let nodes = self.nodes;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            self.rects.insert(next, LayoutRect::new(origin.x, origin.y, 0.0, 0.0));
            if let Some(node) = nodes.get(&next) {
                stack.extend(node.children.iter().copied());
            }
        }
    }

    // =========================================================================
    // Pass 2: content-sized containers, bottom-up
    // =========================================================================

    fn grow_to_content(&mut self, id: WidgetId) {
        let nodes = self.nodes;
        let Some(node) = nodes.get(&id) else {
            return;
        };
        if !node.visible {
            return;
        }
        for c in &node.children {
            self.grow_to_content(*c);
        }
        if !node.kind.is_container() || node.scrollable || !node.height_is_auto() {
            return;
        }
        let Some(lines) = self.lines.get(&id) else {
            return;
        };

        let height_of = |c: &WidgetId| self.rects.get(c).map_or(0.0, |r| r.height);
        let per_line = lines.iter().map(|line| {
            let heights = line.items.iter().map(height_of);
            let gaps = node.gap * line.items.len().saturating_sub(1) as f32;
            if node.kind == WidgetKind::ZStack || node.direction.is_row() {
                heights.fold(0.0, f32::max)
            } else {
                heights.sum::<f32>() + gaps
            }
        });
        let content_height = if node.direction.is_row() && node.kind != WidgetKind::ZStack {
            let line_gaps = node.gap * lines.len().saturating_sub(1) as f32;
            per_line.sum::<f32>() + line_gaps
        } else {
            per_line.fold(0.0, f32::max)
        };

        let derived = node.clamp_height(content_height + node.padding_size().height);
        if let Some(rect) = self.rects.get_mut(&id) {
            if derived > rect.height {
                trace!(widget = ?id, from = rect.height, to = derived, "container grew to content");
                rect.height = derived;
            }
        }
    }

    // =========================================================================
    // Pass 3: reposition, top-down
    // =========================================================================

    fn reflow(&mut self, id: WidgetId) {
        let nodes = self.nodes;
        let Some(node) = nodes.get(&id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let lines = self.lines.get(&id).filter(|_| node.kind != WidgetKind::ZStack).cloned();
        if let Some(lines) = lines {
            match node.direction {
                // Line items are stored top to bottom for both directions.
                FlexDirection::Column | FlexDirection::ColumnReverse => self.shift_column(&lines),
                FlexDirection::Row | FlexDirection::RowReverse if node.wrap == FlexWrap::Wrap => {
                    self.shift_row_lines(&lines)
                }
                _ => {}
            }
        }
        for c in &node.children {
            self.reflow(*c);
        }
    }

    /// Within each column line, push every item down by the growth of the
    /// items before it.
    fn shift_column(&mut self, lines: &[LineRecord]) {
        for line in lines {
            let mut shift = 0.0;
            for c in &line.items {
                if shift > 0.0 {
                    self.shift_subtree(*c, shift);
                }
                let slot = self.slot_heights.get(c).copied().unwrap_or(0.0);
                let actual = self.rects.get(c).map_or(slot, |r| r.height);
                shift += (actual - slot).max(0.0);
            }
        }
    }

    /// Wrapped rows: push later lines down when an earlier line grew.
    fn shift_row_lines(&mut self, lines: &[LineRecord]) {
        let mut shift = 0.0;
        for line in lines {
            if shift > 0.0 {
                for c in &line.items {
                    self.shift_subtree(*c, shift);
                }
            }
            let tallest = line
                .items
                .iter()
                .filter_map(|c| self.rects.get(c))
                .map(|r| r.height)
                .fold(0.0, f32::max);
            shift += (tallest - line.cross_size).max(0.0);
        }
    }

    /// Move `id` and its descendants down by `dy`.
    ///
    /// Fixed descendants stay put, and so do absolute descendants pinned
    /// vertically to a containing block above `id`.
    fn shift_subtree(&mut self, id: WidgetId, dy: f32) {
        let nodes = self.nodes;
        let mut stack = vec![(id, false)];
        while let Some((next, block_inside)) = stack.pop() {
            let Some(node) = nodes.get(&next) else {
                continue;
            };
            if next != id {
                let pinned = node.offsets.top.is_some() || node.offsets.bottom.is_some();
                let anchored_outside = node.position == Position::Absolute && !block_inside && pinned;
                if node.position == Position::Fixed || anchored_outside {
                    continue;
                }
            }
            if let Some(rect) = self.rects.get_mut(&next) {
                rect.y += dy;
            }
            let block_inside = block_inside || node.position.is_positioned();
            stack.extend(node.children.iter().map(|c| (*c, block_inside)));
        }
    }
}

/// Relative offsets shift the flow position. Sticky keeps it.
fn apply_relative(node: &LayoutNode, rect: LayoutRect) -> LayoutRect {
    if node.position != Position::Relative {
        return rect;
    }
    let o = node.offsets;
    let dx = o.left.or(o.right.map(|r| -r)).unwrap_or(0.0);
    let dy = o.top.or(o.bottom.map(|b| -b)).unwrap_or(0.0);
    rect.translate(dx, dy)
}

// =============================================================================
// Tests
// =============================================================================
