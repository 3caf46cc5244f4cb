//! Per-run snapshot of the layout inputs of every widget.
//!
//! The layout engine copies what it needs out of each widget under that
//! widget's lock, releases it, and then computes on plain values. Nothing is
//! locked while the passes run.

use std::collections::HashMap;

use tracing::debug;

use crate::engine::{Widget, WidgetId, WidgetTree};
use crate::types::{
    AlignItems, AlignSelf, Edges, FlexBasis, FlexDirection, FlexWrap, Font, JustifyContent,
    Offsets, Point, Position, Size, SizeMode, WidgetKind,
};

#[derive(Debug, Clone)]
pub(crate) struct LayoutNode {
    pub kind: WidgetKind,
    pub children: Vec<WidgetId>,
    pub visible: bool,

    pub width: f32,
    pub height: f32,
    pub width_mode: SizeMode,
    pub height_mode: SizeMode,
    pub width_percent: f32,
    pub height_percent: f32,
    pub min_width: Option<f32>,
    pub max_width: Option<f32>,
    pub min_height: Option<f32>,
    pub max_height: Option<f32>,
    pub padding: Edges,
    pub gap: f32,

    pub direction: FlexDirection,
    pub justify: JustifyContent,
    pub align_items: AlignItems,
    pub wrap: FlexWrap,

    pub grow: f32,
    pub shrink: f32,
    pub basis: FlexBasis,
    pub align_self: AlignSelf,
    pub order: i32,

    pub position: Position,
    pub offsets: Offsets,

    pub text: String,
    pub font: Font,
    pub natural_size: Option<Size<f32>>,
    pub load_failed: bool,

    pub scrollable: bool,
    pub scroll_offset: Point<f32>,

    /// Widget's layout epoch at capture time.
    pub epoch: u64,
}

impl LayoutNode {
    pub fn capture(w: &Widget) -> Self {
        Self {
            kind: w.kind(),
            children: w.children().to_vec(),
            visible: w.is_visible(),
            width: w.width(),
            height: w.height(),
            width_mode: w.width_mode(),
            height_mode: w.height_mode(),
            width_percent: w.width_percent(),
            height_percent: w.height_percent(),
            min_width: w.min_width(),
            max_width: w.max_width(),
            min_height: w.min_height(),
            max_height: w.max_height(),
            padding: w.padding(),
            gap: w.gap(),
            direction: w.direction(),
            justify: w.justify(),
            align_items: w.align_items(),
            wrap: w.wrap(),
            grow: w.grow(),
            shrink: w.shrink(),
            basis: w.basis(),
            align_self: w.align_self(),
            order: w.order(),
            position: w.position(),
            offsets: w.offsets(),
            text: w.text().to_string(),
            font: w.font().clone(),
            natural_size: w.natural_size(),
            load_failed: w.load_error().is_some(),
            scrollable: w.is_scrollable(),
            scroll_offset: w.scroll_offset(),
            epoch: w.layout_epoch,
        }
    }

    /// Horizontal plus vertical padding.
    pub fn padding_size(&self) -> Size<f32> {
        Size {
            width: self.padding.left + self.padding.right,
            height: self.padding.top + self.padding.bottom,
        }
    }

    /// Height is left to content (auto with no explicit value).
    pub fn height_is_auto(&self) -> bool {
        self.height_mode == SizeMode::Auto && self.height <= 0.0
    }

    pub fn clamp_width(&self, w: f32) -> f32 {
        clamp(w, self.min_width, self.max_width)
    }

    pub fn clamp_height(&self, h: f32) -> f32 {
        clamp(h, self.min_height, self.max_height)
    }

    /// Width from the size mode against `available`, or `None` when it must
    /// come from intrinsic sizing or flex distribution.
    pub fn resolve_width(&self, available: Option<f32>) -> Option<f32> {
        resolve(self.width_mode, self.width, self.width_percent, available, "width")
            .map(|w| self.clamp_width(w))
    }

    pub fn resolve_height(&self, available: Option<f32>) -> Option<f32> {
        resolve(self.height_mode, self.height, self.height_percent, available, "height")
            .map(|h| self.clamp_height(h))
    }

    /// Takes part in the parent's flex flow.
    pub fn in_flow(&self) -> bool {
        self.visible && !self.position.is_out_of_flow()
    }
}

fn resolve(
    mode: SizeMode,
    explicit: f32,
    percent: f32,
    available: Option<f32>,
    axis: &'static str,
) -> Option<f32> {
    match mode {
        SizeMode::Fixed => Some(explicit),
        SizeMode::Auto => (explicit > 0.0).then_some(explicit),
        SizeMode::Flex => None,
        SizeMode::Full | SizeMode::Percent => {
            let fraction = if mode == SizeMode::Full { 1.0 } else { percent / 100.0 };
            match available {
                Some(space) => Some(space * fraction),
                None => {
                    debug!(axis, ?mode, percent, "relative size against unresolved parent, using 0");
                    Some(0.0)
                }
            }
        }
    }
}

pub(crate) fn clamp(value: f32, min: Option<f32>, max: Option<f32>) -> f32 {
    let mut v = value;
    if let Some(max) = max {
        v = v.min(max);
    }
    if let Some(min) = min {
        v = v.max(min);
    }
    v.max(0.0)
}

/// Snapshot the subtree rooted at `root`, one widget lock at a time.
pub(crate) fn snapshot(tree: &WidgetTree, root: WidgetId) -> HashMap<WidgetId, LayoutNode> {
    let mut nodes = HashMap::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(node) = tree.with(id, LayoutNode::capture) else {
            continue;
        };
        stack.extend(node.children.iter().copied());
        nodes.insert(id, node);
    }
    nodes
}
