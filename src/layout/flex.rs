//! Flex distribution for one container.
//!
//! Pure function of the container's main/cross sizes and each flow child's
//! basis. The layout engine builds the inputs, calls [`arrange`], and maps the
//! main/cross results back to x/y.
//!
//! Steps:
//! 1. Stable sort by `order`
//! 2. Break into lines (greedy, at least one item per line)
//! 3. Per line: grow or shrink, then min/max clamp
//! 4. Justify along the main axis, align along the cross axis
//! 5. Mirror for reverse directions, reverse lines for `WrapReverse`

use super::node::clamp;
use crate::types::{AlignItems, FlexDirection, FlexWrap, JustifyContent};

/// Container-side inputs, already projected onto main/cross.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexContainer {
    pub direction: FlexDirection,
    pub wrap: FlexWrap,
    pub justify: JustifyContent,
    pub align_items: AlignItems,
    /// Content-box main size. Infinite when the container sizes to content.
    pub main_size: f32,
    /// Content-box cross size. Infinite when the container sizes to content.
    pub cross_size: f32,
    pub gap: f32,
    /// Scroll containers let children overflow instead of shrinking them.
    pub allow_shrink: bool,
}

impl Default for FlexContainer {
    fn default() -> Self {
        Self {
            direction: FlexDirection::Column,
            wrap: FlexWrap::NoWrap,
            justify: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            main_size: f32::INFINITY,
            cross_size: f32::INFINITY,
            gap: 0.0,
            allow_shrink: true,
        }
    }
}

/// Item-side inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexItem {
    pub order: i32,
    /// Hypothetical main size before grow/shrink.
    pub base_main: f32,
    /// Cross size before stretching.
    pub cross: f32,
    /// The cross size is not explicit, so `Stretch` may fill the line.
    pub stretch_cross: bool,
    pub grow: f32,
    pub shrink: f32,
    pub min_main: Option<f32>,
    pub max_main: Option<f32>,
    pub min_cross: Option<f32>,
    pub max_cross: Option<f32>,
    /// `align-self` override.
    pub align: Option<AlignItems>,
}

impl Default for FlexItem {
    fn default() -> Self {
        Self {
            order: 0,
            base_main: 0.0,
            cross: 0.0,
            stretch_cross: true,
            grow: 0.0,
            shrink: 1.0,
            min_main: None,
            max_main: None,
            min_cross: None,
            max_cross: None,
            align: None,
        }
    }
}

/// Where one item ended up, relative to the container's content origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub main_offset: f32,
    pub cross_offset: f32,
    pub main_size: f32,
    pub cross_size: f32,
    pub line: usize,
}

/// One flex line, with item indices in placement order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlexLine {
    pub items: Vec<usize>,
    pub cross_offset: f32,
    pub cross_size: f32,
    /// Main size consumed by items and gaps after grow/shrink.
    pub main_used: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlexArrangement {
    /// Indexed like the input slice.
    pub placements: Vec<Placement>,
    pub lines: Vec<FlexLine>,
    /// Widest line along the main axis.
    pub main_extent: f32,
    /// Sum of line cross sizes plus gaps.
    pub cross_extent: f32,
}

// =============================================================================
// Line Breaking
// =============================================================================

/// Greedy packing in `sorted` order. Never produces an empty line.
fn break_lines(container: &FlexContainer, items: &[FlexItem], sorted: &[usize]) -> Vec<Vec<usize>> {
    let wraps = container.wrap != FlexWrap::NoWrap && container.main_size.is_finite();
    let mut lines: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut used = 0.0;

    for &i in sorted {
        let size = items[i].base_main;
        let needed = if current.is_empty() { size } else { used + container.gap + size };
        if wraps && !current.is_empty() && needed > container.main_size {
            lines.push(std::mem::take(&mut current));
            used = size;
        } else {
            used = needed;
        }
        current.push(i);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// =============================================================================
// Arrange
// =============================================================================

pub fn arrange(container: &FlexContainer, items: &[FlexItem]) -> FlexArrangement {
    let mut out = FlexArrangement {
        placements: vec![Placement::default(); items.len()],
        ..Default::default()
    };
    if items.is_empty() {
        return out;
    }

    let mut sorted: Vec<usize> = (0..items.len()).collect();
    sorted.sort_by_key(|&i| items[i].order);

    let line_groups = break_lines(container, items, &sorted);
    let line_count = line_groups.len();
    let gap = container.gap;

    for (line_index, group) in line_groups.into_iter().enumerate() {
        // Main sizes: grow or shrink the free space.
        let gaps = gap * (group.len().saturating_sub(1)) as f32;
        let base_total: f32 = group.iter().map(|&i| items[i].base_main).sum();
        let free = if container.main_size.is_finite() {
            container.main_size - base_total - gaps
        } else {
            0.0
        };
        let total_grow: f32 = group.iter().map(|&i| items[i].grow).sum();
        let total_shrink: f32 = group.iter().map(|&i| items[i].shrink).sum();

        for &i in &group {
            let item = &items[i];
            let mut main = item.base_main;
            if free > 0.0 && total_grow > 0.0 {
                main += free * item.grow / total_grow;
            } else if free < 0.0 && total_shrink > 0.0 && container.allow_shrink {
                main = (main + free * item.shrink / total_shrink).max(0.0);
            }
            let p = &mut out.placements[i];
            p.main_size = clamp(main, item.min_main, item.max_main);
            p.line = line_index;
        }

        // Cross size of the line.
        let max_item_cross = group
            .iter()
            .map(|&i| clamp(items[i].cross, items[i].min_cross, items[i].max_cross))
            .fold(0.0_f32, f32::max);
        let line_cross = if container.wrap == FlexWrap::NoWrap && container.cross_size.is_finite() {
            container.cross_size
        } else {
            max_item_cross
        };

        for &i in &group {
            let item = &items[i];
            let align = item.align.unwrap_or(container.align_items);
            let p = &mut out.placements[i];
            p.cross_size = if align == AlignItems::Stretch && item.stretch_cross {
                clamp(line_cross, item.min_cross, item.max_cross)
            } else {
                clamp(item.cross, item.min_cross, item.max_cross)
            };
            p.cross_offset = match align {
                AlignItems::Center => (line_cross - p.cross_size) / 2.0,
                AlignItems::End => line_cross - p.cross_size,
                AlignItems::Start | AlignItems::Stretch | AlignItems::Baseline => 0.0,
            };
        }

        // Justify.
        let used: f32 = group.iter().map(|&i| out.placements[i].main_size).sum::<f32>() + gaps;
        let remaining = if container.main_size.is_finite() {
            (container.main_size - used).max(0.0)
        } else {
            0.0
        };
        let n = group.len() as f32;
        let (lead, spacing) = match container.justify {
            JustifyContent::Start => (0.0, gap),
            JustifyContent::End => (remaining, gap),
            JustifyContent::Center => (remaining / 2.0, gap),
            JustifyContent::Between if group.len() > 1 => (0.0, gap + remaining / (n - 1.0)),
            JustifyContent::Between => (0.0, gap),
            JustifyContent::Around => {
                let around = remaining / n;
                (around / 2.0, gap + around)
            }
            JustifyContent::Evenly => {
                let even = remaining / (n + 1.0);
                (even, gap + even)
            }
        };

        let extent = if container.main_size.is_finite() { container.main_size } else { used };
        let reverse = container.direction.is_reverse();
        let mut cursor = lead;
        for &i in &group {
            let p = &mut out.placements[i];
            p.main_offset = if reverse { extent - cursor - p.main_size } else { cursor };
            cursor += p.main_size + spacing;
        }

        let mut items_in_order = group;
        if reverse {
            items_in_order.reverse();
        }
        out.main_extent = out.main_extent.max(used);
        out.lines.push(FlexLine {
            items: items_in_order,
            cross_offset: 0.0,
            cross_size: line_cross,
            main_used: used,
        });
    }

    // Stack lines along the cross axis.
    let mut order: Vec<usize> = (0..line_count).collect();
    if container.wrap == FlexWrap::WrapReverse {
        order.reverse();
    }
    let mut cross_cursor = 0.0;
    for (k, &li) in order.iter().enumerate() {
        if k > 0 {
            cross_cursor += gap;
        }
        let line = &mut out.lines[li];
        line.cross_offset = cross_cursor;
        for &i in &line.items {
            out.placements[i].cross_offset += cross_cursor;
        }
        cross_cursor += line.cross_size;
    }
    out.cross_extent = cross_cursor;
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn row(main: f32, cross: f32) -> FlexContainer {
        FlexContainer {
            direction: FlexDirection::Row,
            main_size: main,
            cross_size: cross,
            ..Default::default()
        }
    }

    fn item(base: f32, cross: f32) -> FlexItem {
        FlexItem { base_main: base, cross, ..Default::default() }
    }

    fn offsets(a: &FlexArrangement) -> Vec<f32> {
        a.placements.iter().map(|p| p.main_offset).collect()
    }

    #[test]
    fn test_grow_splits_free_space() {
        let items = [
            FlexItem { grow: 1.0, ..item(0.0, 10.0) },
            FlexItem { grow: 3.0, ..item(0.0, 10.0) },
            item(100.0, 10.0),
        ];
        let a = arrange(&row(500.0, 50.0), &items);
        assert_eq!(a.placements[0].main_size, 100.0);
        assert_eq!(a.placements[1].main_size, 300.0);
        assert_eq!(offsets(&a), vec![0.0, 100.0, 400.0]);
    }

    #[test]
    fn test_shrink_respects_min() {
        let items = [
            FlexItem { min_main: Some(80.0), ..item(100.0, 10.0) },
            item(100.0, 10.0),
        ];
        let a = arrange(&row(150.0, 50.0), &items);
        assert_eq!(a.placements[0].main_size, 80.0);
        assert_eq!(a.placements[1].main_size, 75.0);
    }

    #[test]
    fn test_scroll_container_does_not_shrink() {
        let container = FlexContainer { allow_shrink: false, ..row(100.0, 50.0) };
        let a = arrange(&container, &[item(80.0, 10.0), item(80.0, 10.0)]);
        assert_eq!(a.placements[1].main_size, 80.0);
        assert_eq!(a.main_extent, 160.0);
    }

    #[test]
    fn test_justify_modes() {
        let items = [item(100.0, 10.0), item(100.0, 10.0)];
        let cases = [
            (JustifyContent::Start, vec![0.0, 100.0]),
            (JustifyContent::End, vec![200.0, 300.0]),
            (JustifyContent::Center, vec![100.0, 200.0]),
            (JustifyContent::Between, vec![0.0, 300.0]),
            (JustifyContent::Around, vec![50.0, 250.0]),
            (JustifyContent::Evenly, vec![200.0 / 3.0, 200.0 / 3.0 * 2.0 + 100.0]),
        ];
        for (justify, expected) in cases {
            let container = FlexContainer { justify, ..row(400.0, 50.0) };
            let got = offsets(&arrange(&container, &items));
            for (g, e) in got.iter().zip(&expected) {
                assert!((g - e).abs() < 1e-3, "{justify:?}: {got:?} vs {expected:?}");
            }
        }
    }

    #[test]
    fn test_align_and_stretch() {
        let container = FlexContainer { align_items: AlignItems::Center, ..row(300.0, 60.0) };
        let items = [
            FlexItem { stretch_cross: false, ..item(50.0, 20.0) },
            FlexItem { align: Some(AlignItems::Stretch), ..item(50.0, 20.0) },
            FlexItem { align: Some(AlignItems::End), ..item(50.0, 20.0) },
            FlexItem { align: Some(AlignItems::Baseline), ..item(50.0, 20.0) },
        ];
        let a = arrange(&container, &items);
        assert_eq!(a.placements[0].cross_offset, 20.0);
        assert_eq!(a.placements[1].cross_size, 60.0);
        assert_eq!(a.placements[2].cross_offset, 40.0);
        assert_eq!(a.placements[3].cross_offset, 0.0);
    }

    #[test]
    fn test_wrap_into_lines() {
        let container = FlexContainer { wrap: FlexWrap::Wrap, gap: 10.0, ..row(250.0, 500.0) };
        let items = [item(100.0, 30.0), item(100.0, 40.0), item(100.0, 20.0), item(300.0, 10.0)];
        let a = arrange(&container, &items);
        assert_eq!(a.lines.len(), 3);
        assert_eq!(a.lines[0].items, vec![0, 1]);
        assert_eq!(a.lines[0].cross_size, 40.0);
        assert_eq!(a.lines[1].cross_offset, 50.0);
        assert_eq!(a.lines[2].items, vec![3]);
        assert_eq!(a.placements[2].cross_offset, 50.0);
        assert_eq!(a.cross_extent, 40.0 + 10.0 + 20.0 + 10.0 + 10.0);
    }

    #[test]
    fn test_wrap_reverse_flips_lines() {
        let container = FlexContainer { wrap: FlexWrap::WrapReverse, ..row(100.0, 500.0) };
        let a = arrange(&container, &[item(100.0, 30.0), item(100.0, 20.0)]);
        assert_eq!(a.placements[1].cross_offset, 0.0);
        assert_eq!(a.placements[0].cross_offset, 20.0);
    }

    #[test]
    fn test_order_then_reverse() {
        let container = FlexContainer { direction: FlexDirection::RowReverse, ..row(300.0, 50.0) };
        let items = [
            FlexItem { order: 2, ..item(50.0, 10.0) },
            FlexItem { order: 1, ..item(100.0, 10.0) },
        ];
        let a = arrange(&container, &items);
        // Sorted: [1, 0]; mirrored from the right edge.
        assert_eq!(a.placements[1].main_offset, 200.0);
        assert_eq!(a.placements[0].main_offset, 150.0);
        assert_eq!(a.lines[0].items, vec![0, 1]);
    }

    #[test]
    fn test_unbounded_main_does_not_grow() {
        let items = [FlexItem { grow: 1.0, ..item(40.0, 10.0) }, item(60.0, 10.0)];
        let a = arrange(&row(f32::INFINITY, f32::INFINITY), &items);
        assert_eq!(a.placements[0].main_size, 40.0);
        assert_eq!(a.main_extent, 100.0);
        assert_eq!(a.lines[0].cross_size, 10.0);
    }

    proptest! {
        #[test]
        fn test_grow_is_proportional(
            grows in prop::collection::vec(0.0f32..5.0, 1..6),
            bases in prop::collection::vec(0.0f32..50.0, 6),
            extra in 1.0f32..500.0,
        ) {
            let items: Vec<FlexItem> = grows
                .iter()
                .zip(&bases)
                .map(|(g, b)| FlexItem { grow: *g, ..item(*b, 10.0) })
                .collect();
            let total_grow: f32 = grows.iter().sum();
            prop_assume!(total_grow > 0.01);
            let base_total: f32 = items.iter().map(|i| i.base_main).sum();
            let a = arrange(&row(base_total + extra, 10.0), &items);

            let mut sum = 0.0;
            for (i, it) in items.iter().enumerate() {
                let got = a.placements[i].main_size - it.base_main;
                let want = extra * it.grow / total_grow;
                prop_assert!((got - want).abs() < 1e-2);
                sum += got;
            }
            prop_assert!((sum - extra).abs() < 1e-2);
        }

        #[test]
        fn test_shrink_is_proportional(
            shrinks in prop::collection::vec(0.1f32..5.0, 1..6),
            deficit in 1.0f32..50.0,
        ) {
            // Bases large enough that nothing floors at zero.
            let items: Vec<FlexItem> = shrinks
                .iter()
                .map(|s| FlexItem { shrink: *s, ..item(500.0, 10.0) })
                .collect();
            let total: f32 = shrinks.iter().sum();
            let base_total = 500.0 * items.len() as f32;
            let a = arrange(&row(base_total - deficit, 10.0), &items);

            let mut sum = 0.0;
            for (i, it) in items.iter().enumerate() {
                let cut = it.base_main - a.placements[i].main_size;
                prop_assert!((cut - deficit * it.shrink / total).abs() < 1e-2);
                sum += cut;
            }
            prop_assert!((sum - deficit).abs() < 1e-2);
        }

        #[test]
        fn test_wrap_lines_fit_and_keep_order(
            sizes in prop::collection::vec(1.0f32..200.0, 1..20),
            main in 50.0f32..400.0,
            gap in 0.0f32..20.0,
        ) {
            let container = FlexContainer { wrap: FlexWrap::Wrap, gap, ..row(main, 1000.0) };
            let items: Vec<FlexItem> = sizes
                .iter()
                .map(|s| FlexItem { shrink: 0.0, ..item(*s, 10.0) })
                .collect();
            let a = arrange(&container, &items);

            let flattened: Vec<usize> = a.lines.iter().flat_map(|l| l.items.clone()).collect();
            prop_assert_eq!(flattened, (0..items.len()).collect::<Vec<_>>());
            for line in &a.lines {
                prop_assert!(!line.items.is_empty());
                if line.items.len() > 1 {
                    prop_assert!(line.main_used <= main + 1e-3);
                }
            }
        }
    }
}
