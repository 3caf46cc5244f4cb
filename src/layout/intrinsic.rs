//! Intrinsic sizing - natural size of a widget from its content.
//!
//! Used whenever a size resolves to nothing (auto with no explicit value).
//! Leaves use text measurement or per-kind constants, containers sum their
//! flow children along the stacking axis and take the max across it.
//! Results are memoized per layout run, keyed by widget and width limit.

use std::collections::HashMap;

use tracing::trace;

use super::node::LayoutNode;
use super::text_measure::TextServices;
use crate::engine::WidgetId;
use crate::types::{FlexWrap, Size, SizeMode, WidgetKind, size};

// =============================================================================
// Control Metrics
// =============================================================================

pub const CHECK_BOX_SIZE: f32 = 18.0;
pub const CHECK_LABEL_GAP: f32 = 8.0;
pub const TOGGLE_SIZE: Size<f32> = size(44.0, 24.0);
pub const SLIDER_TRACK_MIN: f32 = 120.0;
pub const SLIDER_THUMB: f32 = 16.0;
pub const SLIDER_EDGE_PADDING: f32 = 8.0;
pub const SLIDER_HEIGHT: f32 = 32.0;
pub const SELECT_MIN_WIDTH: f32 = 120.0;
pub const SELECT_ARROW: f32 = 20.0;
pub const SELECT_INNER_PADDING: f32 = 12.0;
pub const SELECT_HEIGHT: f32 = 36.0;
pub const TEXT_FIELD_HEIGHT: f32 = 36.0;
pub const TEXT_AREA_HEIGHT: f32 = 100.0;
/// Width of a text field when there is no width to fill.
pub const FIELD_FALLBACK_WIDTH: f32 = 200.0;
pub const BUTTON_MIN: Size<f32> = size(60.0, 32.0);
pub const MEDIA_PLACEHOLDER: Size<f32> = size(24.0, 24.0);

/// Explicit value along one axis, if it does not depend on the parent.
fn explicit(mode: SizeMode, value: f32) -> Option<f32> {
    match mode {
        SizeMode::Fixed => Some(value),
        SizeMode::Auto if value > 0.0 => Some(value),
        _ => None,
    }
}

pub(crate) struct Intrinsic<'a> {
    nodes: &'a HashMap<WidgetId, LayoutNode>,
    text: &'a TextServices,
    memo: HashMap<(WidgetId, u32), Size<f32>>,
}

impl<'a> Intrinsic<'a> {
    pub fn new(nodes: &'a HashMap<WidgetId, LayoutNode>, text: &'a TextServices) -> Self {
        Self {
            nodes,
            text,
            memo: HashMap::new(),
        }
    }

    /// Natural border-box size of `id` given at most `max_width` to fill.
    pub fn size(&mut self, id: WidgetId, max_width: Option<f32>) -> Size<f32> {
        let key = (id, max_width.map_or(u32::MAX, f32::to_bits));
        if let Some(cached) = self.memo.get(&key) {
            return *cached;
        }
        let nodes = self.nodes;
        let Some(node) = nodes.get(&id) else {
            return size(0.0, 0.0);
        };
        let result = if node.kind.is_container() {
            self.container(node, max_width)
        } else {
            self.leaf(node, max_width)
        };
        trace!(widget = ?id, kind = ?node.kind, ?max_width, w = result.width, h = result.height, "intrinsic");
        self.memo.insert(key, result);
        result
    }

    /// Size a child contributes to its container's intrinsic size: explicit
    /// where given, intrinsic otherwise, then clamped.
    pub fn child_size(&mut self, id: WidgetId, max_width: Option<f32>) -> Size<f32> {
        let nodes = self.nodes;
        let Some(node) = nodes.get(&id) else {
            return size(0.0, 0.0);
        };
        let w = explicit(node.width_mode, node.width);
        let h = explicit(node.height_mode, node.height);
        let limit = match (max_width, node.max_width) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let natural = match (w, h) {
            (Some(w), Some(h)) => size(w, h),
            _ => self.size(id, w.or(limit)),
        };
        size(
            node.clamp_width(w.unwrap_or(natural.width)),
            node.clamp_height(h.unwrap_or(natural.height)),
        )
    }

    /// Border-box height of a text-bearing widget laid out at `width`.
    pub fn text_block_height(&self, node: &LayoutNode, width: f32) -> f32 {
        let pad = node.padding_size();
        let lines = self.text.line_count(&node.text, (width - pad.width).max(0.0), &node.font);
        let h = lines as f32 * node.font.line_px() + pad.height;
        if node.kind == WidgetKind::Button {
            h.max(BUTTON_MIN.height)
        } else {
            h
        }
    }

    /// Content size of the text of `node` wrapped at `max_width`.
    fn text_size(&self, node: &LayoutNode, max_width: Option<f32>) -> Size<f32> {
        if node.text.is_empty() {
            return size(0.0, 0.0);
        }
        let limit = max_width.unwrap_or(f32::INFINITY);
        let measured = self.text.measure_width(&node.text, &node.font);
        if measured <= limit && !node.text.contains('\n') {
            return size(measured, node.font.line_px());
        }
        let lines = self.text.wrap(&node.text, limit, &node.font);
        let widest = lines.iter().map(|l| l.width).fold(0.0_f32, f32::max);
        size(widest.min(limit), lines.len() as f32 * node.font.line_px())
    }

    fn leaf(&mut self, node: &LayoutNode, max_width: Option<f32>) -> Size<f32> {
        let pad = node.padding_size();
        let content_max = max_width.map(|m| (m - pad.width).max(0.0));
        let content = match node.kind {
            WidgetKind::Text => self.text_size(node, content_max),
            WidgetKind::Button => {
                let t = self.text_size(node, content_max);
                return size(
                    (t.width + pad.width).max(BUTTON_MIN.width),
                    (t.height + pad.height).max(BUTTON_MIN.height),
                );
            }
            WidgetKind::Checkbox | WidgetKind::Radio => {
                let label = self.text_size(node, None);
                if label.width > 0.0 {
                    size(
                        CHECK_BOX_SIZE + CHECK_LABEL_GAP + label.width,
                        CHECK_BOX_SIZE.max(label.height),
                    )
                } else {
                    size(CHECK_BOX_SIZE, CHECK_BOX_SIZE)
                }
            }
            WidgetKind::Toggle => TOGGLE_SIZE,
            WidgetKind::Slider => size(
                SLIDER_TRACK_MIN + SLIDER_THUMB + 2.0 * SLIDER_EDGE_PADDING,
                SLIDER_HEIGHT,
            ),
            WidgetKind::Select => {
                let label = self.text_size(node, None);
                size(
                    label.width.max(SELECT_MIN_WIDTH) + SELECT_ARROW + 2.0 * SELECT_INNER_PADDING,
                    SELECT_HEIGHT,
                )
            }
            WidgetKind::TextField => {
                return size(max_width.unwrap_or(FIELD_FALLBACK_WIDTH), TEXT_FIELD_HEIGHT);
            }
            WidgetKind::TextArea => {
                return size(max_width.unwrap_or(FIELD_FALLBACK_WIDTH), TEXT_AREA_HEIGHT);
            }
            WidgetKind::Image | WidgetKind::Video | WidgetKind::Audio => match node.natural_size {
                Some(natural) => natural,
                None if node.load_failed => MEDIA_PLACEHOLDER,
                None => size(0.0, 0.0),
            },
            // Containers never reach here.
            _ => size(0.0, 0.0),
        };
        size(content.width + pad.width, content.height + pad.height)
    }

    fn container(&mut self, node: &LayoutNode, max_width: Option<f32>) -> Size<f32> {
        let pad = node.padding_size();
        if node.kind == WidgetKind::ScrollView {
            return pad;
        }
        let content_max = max_width.map(|m| (m - pad.width).max(0.0));
        let nodes = self.nodes;
        let flow: Vec<WidgetId> = node
            .children
            .iter()
            .copied()
            .filter(|c| nodes.get(c).is_some_and(LayoutNode::in_flow))
            .collect();
        let sizes: Vec<Size<f32>> = flow.iter().map(|c| self.child_size(*c, content_max)).collect();
        let gaps = node.gap * sizes.len().saturating_sub(1) as f32;

        let content = if node.kind == WidgetKind::ZStack {
            size(
                sizes.iter().map(|s| s.width).fold(0.0, f32::max),
                sizes.iter().map(|s| s.height).fold(0.0, f32::max),
            )
        } else if node.direction.is_row() {
            match content_max {
                Some(limit) if node.wrap != FlexWrap::NoWrap => wrapped_row(&sizes, limit, node.gap),
                _ => size(
                    sizes.iter().map(|s| s.width).sum::<f32>() + gaps,
                    sizes.iter().map(|s| s.height).fold(0.0, f32::max),
                ),
            }
        } else {
            size(
                sizes.iter().map(|s| s.width).fold(0.0, f32::max),
                sizes.iter().map(|s| s.height).sum::<f32>() + gaps,
            )
        };
        size(content.width + pad.width, content.height + pad.height)
    }
}

/// Greedy row wrapping: widest line by the sum of line heights.
fn wrapped_row(sizes: &[Size<f32>], limit: f32, gap: f32) -> Size<f32> {
    let mut widest: f32 = 0.0;
    let mut total_height = 0.0;
    let mut line_width = 0.0;
    let mut line_height: f32 = 0.0;
    let mut line_len = 0;
    for s in sizes {
        let needed = if line_len == 0 { s.width } else { line_width + gap + s.width };
        if line_len > 0 && needed > limit {
            widest = widest.max(line_width);
            total_height += line_height + gap;
            line_width = s.width;
            line_height = s.height;
            line_len = 1;
        } else {
            line_width = needed;
            line_height = line_height.max(s.height);
            line_len += 1;
        }
    }
    widest = widest.max(line_width);
    total_height += line_height;
    size(widest, total_height)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::WidgetTree;
    use crate::layout::node::snapshot;
    use crate::types::uniform;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_control_constants() {
        let tree = WidgetTree::new();
        let root = tree.create_root(WidgetKind::VStack);
        let kinds = [
            (WidgetKind::Toggle, size(44.0, 24.0)),
            (WidgetKind::Slider, size(152.0, 32.0)),
            (WidgetKind::Select, size(164.0, 36.0)),
            (WidgetKind::TextField, size(300.0, 36.0)),
            (WidgetKind::TextArea, size(300.0, 100.0)),
            (WidgetKind::Checkbox, size(18.0, 18.0)),
            (WidgetKind::Button, size(60.0, 32.0)),
            (WidgetKind::Image, size(0.0, 0.0)),
        ];
        let ids: Vec<_> = kinds
            .iter()
            .map(|(k, _)| {
                let id = tree.create(*k);
                tree.add_child(root, id);
                id
            })
            .collect();
        let nodes = snapshot(&tree, root);
        let text = TextServices::default();
        let mut intrinsic = Intrinsic::new(&nodes, &text);
        for (id, (kind, want)) in ids.iter().zip(kinds) {
            let got = intrinsic.size(*id, Some(300.0));
            assert!(approx(got.width, want.width) && approx(got.height, want.height), "{kind:?}: {got:?}");
        }
    }

    #[test]
    fn test_labelled_controls() {
        let tree = WidgetTree::new();
        let root = tree.create_root(WidgetKind::VStack);
        let check = tree.create(WidgetKind::Checkbox);
        let button = tree.create(WidgetKind::Button);
        tree.add_child(root, check);
        tree.add_child(root, button);
        // "Accept" = 6 cells of 8.4px.
        tree.update(check, |w| w.set_text("Accept"));
        tree.update(button, |w| {
            w.set_text("A fairly long label");
            w.set_padding(uniform(8.0));
        });

        let nodes = snapshot(&tree, root);
        let text = TextServices::default();
        let mut intrinsic = Intrinsic::new(&nodes, &text);

        let c = intrinsic.size(check, None);
        assert!(approx(c.width, 18.0 + 8.0 + 50.4));
        assert!(approx(c.height, 19.6));

        let b = intrinsic.size(button, None);
        assert!(approx(b.width, 19.0 * 8.4 + 16.0));
        assert!(approx(b.height, 32.0 + 3.6));
    }

    #[test]
    fn test_media_placeholder_on_error() {
        let tree = WidgetTree::new();
        let root = tree.create_root(WidgetKind::VStack);
        let img = tree.create(WidgetKind::Image);
        let loaded = tree.create(WidgetKind::Image);
        tree.add_child(root, img);
        tree.add_child(root, loaded);
        tree.update(img, |w| w.set_load_error(Some("404".into())));
        tree.update(loaded, |w| w.set_natural_size(Some(size(640.0, 480.0))));

        let nodes = snapshot(&tree, root);
        let text = TextServices::default();
        let mut intrinsic = Intrinsic::new(&nodes, &text);
        assert_eq!(intrinsic.size(img, None), MEDIA_PLACEHOLDER);
        assert_eq!(intrinsic.size(loaded, None), size(640.0, 480.0));
    }

    #[test]
    fn test_container_sums_and_maxes() {
        let tree = WidgetTree::new();
        let col = tree.create_root(WidgetKind::VStack);
        let row = tree.create(WidgetKind::HStack);
        let a = tree.create(WidgetKind::Container);
        let b = tree.create(WidgetKind::Container);
        let hidden = tree.create(WidgetKind::Container);
        tree.add_child(col, row);
        for (id, w, h) in [(a, 40.0, 10.0), (b, 60.0, 30.0), (hidden, 500.0, 500.0)] {
            tree.add_child(row, id);
            tree.update(id, |n| {
                n.set_fixed_width(w);
                n.set_fixed_height(h);
            });
        }
        tree.update(hidden, |w| w.set_visible(false));
        tree.update(row, |w| {
            w.set_gap(5.0);
            w.set_padding(uniform(2.0));
        });

        let nodes = snapshot(&tree, col);
        let text = TextServices::default();
        let mut intrinsic = Intrinsic::new(&nodes, &text);
        assert_eq!(intrinsic.size(row, None), size(40.0 + 5.0 + 60.0 + 4.0, 34.0));
        assert_eq!(intrinsic.size(col, None), size(109.0, 34.0));
    }

    #[test]
    fn test_wrapped_row_lines() {
        let sizes = [size(60.0, 10.0), size(60.0, 20.0), size(60.0, 5.0)];
        assert_eq!(wrapped_row(&sizes, 130.0, 5.0), size(125.0, 30.0));
    }
}
