//! Core types for the widget tree, layout engine and event dispatcher.
//!
//! Everything here is a plain value: closed enums describing how a widget
//! participates in layout, plus the small geometry vocabulary shared by all
//! modules. Geometry primitives come from `taffy::geometry` so that edge sets
//! and sizes line up with the rest of the Rust layout ecosystem.

pub use taffy::geometry::{Point, Rect, Size};

// =============================================================================
// Geometry
// =============================================================================

/// Four-sided spacing (padding) in pixels.
pub type Edges = Rect<f32>;

/// Optional per-edge offsets (top/right/bottom/left) for positioned widgets.
pub type Offsets = Rect<Option<f32>>;

/// Build an edge set from CSS order (top, right, bottom, left).
pub const fn edges(top: f32, right: f32, bottom: f32, left: f32) -> Edges {
    Rect { left, right, top, bottom }
}

/// Same value on all four sides.
pub const fn uniform(value: f32) -> Edges {
    edges(value, value, value, value)
}

/// No spacing on any side.
pub const ZERO_EDGES: Edges = uniform(0.0);

/// No offsets set on any edge.
pub const NO_OFFSETS: Offsets = Rect {
    left: None,
    right: None,
    top: None,
    bottom: None,
};

/// Build a point.
pub const fn point(x: f32, y: f32) -> Point<f32> {
    Point { x, y }
}

/// Build a size.
pub const fn size(width: f32, height: f32) -> Size<f32> {
    Size { width, height }
}

/// Axis-aligned rectangle in window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutRect {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point<f32> {
        point(self.x, self.y)
    }

    pub fn size(&self) -> Size<f32> {
        size(self.width, self.height)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Point<f32>) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink by padding. Never produces negative sizes.
    pub fn inset(&self, padding: Edges) -> Self {
        Self::new(
            self.x + padding.left,
            self.y + padding.top,
            (self.width - padding.left - padding.right).max(0.0),
            (self.height - padding.top - padding.bottom).max(0.0),
        )
    }
}

// =============================================================================
// Widget Kinds
// =============================================================================

/// Closed set of widget kinds the core knows how to size and hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WidgetKind {
    #[default]
    Container,
    VStack,
    HStack,
    ZStack,
    ScrollView,
    Text,
    Button,
    Image,
    Video,
    Audio,
    TextField,
    TextArea,
    Checkbox,
    Toggle,
    Radio,
    Slider,
    Select,
}

impl WidgetKind {
    /// Kinds whose children take part in flex layout.
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Container | Self::VStack | Self::HStack | Self::ZStack | Self::ScrollView
        )
    }

    /// Kinds whose intrinsic size comes from their text content.
    pub const fn is_text_bearing(&self) -> bool {
        matches!(self, Self::Text | Self::Button)
    }

    /// Kinds that accept keyboard focus unless told otherwise.
    pub const fn is_focusable_by_default(&self) -> bool {
        matches!(
            self,
            Self::Button
                | Self::TextField
                | Self::TextArea
                | Self::Checkbox
                | Self::Toggle
                | Self::Radio
                | Self::Slider
                | Self::Select
        )
    }

    pub const fn default_direction(&self) -> FlexDirection {
        match self {
            Self::HStack => FlexDirection::Row,
            _ => FlexDirection::Column,
        }
    }
}

// =============================================================================
// Sizing
// =============================================================================

/// How a widget resolves one axis of its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeMode {
    /// The explicit value, always.
    Fixed,
    /// The explicit value if set, otherwise intrinsic.
    #[default]
    Auto,
    /// 100% of the available space.
    Full,
    /// A percentage of the available space.
    Percent,
    /// Resolved during sibling flex distribution.
    Flex,
}

/// Hypothetical main-axis size before grow/shrink.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FlexBasis {
    #[default]
    Auto,
    Fixed(f32),
    Percent(f32),
    Full,
}

// =============================================================================
// Flex Enums
// =============================================================================

/// Main axis of a flex container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
    ColumnReverse,
    RowReverse,
}

impl FlexDirection {
    /// Check if this is a row direction (Row or RowReverse).
    pub const fn is_row(&self) -> bool {
        matches!(self, Self::Row | Self::RowReverse)
    }

    /// Check if this is a reverse direction (ColumnReverse or RowReverse).
    pub const fn is_reverse(&self) -> bool {
        matches!(self, Self::ColumnReverse | Self::RowReverse)
    }
}

/// Flex wrap behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexWrap {
    #[default]
    NoWrap,
    Wrap,
    WrapReverse,
}

/// Main axis distribution of free space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JustifyContent {
    #[default]
    Start,
    End,
    Center,
    Between,
    Around,
    Evenly,
}

/// Cross axis alignment of items within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignItems {
    Start,
    End,
    Center,
    #[default]
    Stretch,
    /// Treated as `Start`; the core has no baseline information.
    Baseline,
}

/// Per-item override for the container's `AlignItems`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignSelf {
    #[default]
    Auto,
    Start,
    End,
    Center,
    Stretch,
    Baseline,
}

impl AlignSelf {
    /// Convert to AlignItems, returning None if Auto.
    pub const fn to_align_items(&self) -> Option<AlignItems> {
        match self {
            Self::Auto => None,
            Self::Start => Some(AlignItems::Start),
            Self::End => Some(AlignItems::End),
            Self::Center => Some(AlignItems::Center),
            Self::Stretch => Some(AlignItems::Stretch),
            Self::Baseline => Some(AlignItems::Baseline),
        }
    }
}

// =============================================================================
// Positioning
// =============================================================================

/// Position mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    /// Laid out as Static; pinning is applied at render time.
    Sticky,
}

impl Position {
    /// Anything but Static is a containing block for absolute descendants.
    pub const fn is_positioned(&self) -> bool {
        !matches!(self, Self::Static)
    }

    /// Absolute and Fixed widgets do not take part in flex flow.
    pub const fn is_out_of_flow(&self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

// =============================================================================
// Text
// =============================================================================

/// Font selection used by the text collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    /// Font size in pixels.
    pub size: f32,
    /// Line height as a multiple of `size`.
    pub line_height: f32,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 14.0,
            line_height: 1.4,
        }
    }
}

impl Font {
    /// Height of one laid out line in pixels.
    pub fn line_px(&self) -> f32 {
        self.size * self.line_height
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_is_half_open() {
        let r = LayoutRect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(point(10.0, 10.0)));
        assert!(r.contains(point(29.9, 29.9)));
        assert!(!r.contains(point(30.0, 15.0)));
        assert!(!r.contains(point(15.0, 30.0)));
        assert!(!r.contains(point(9.9, 15.0)));
    }

    #[test]
    fn test_rect_inset_clamps() {
        let r = LayoutRect::new(0.0, 0.0, 10.0, 10.0);
        let inner = r.inset(uniform(8.0));
        assert_eq!(inner.x, 8.0);
        assert_eq!(inner.width, 0.0);
        assert_eq!(inner.height, 0.0);
    }

    #[test]
    fn test_position_classes() {
        assert!(!Position::Static.is_positioned());
        assert!(Position::Sticky.is_positioned());
        assert!(Position::Fixed.is_out_of_flow());
        assert!(!Position::Relative.is_out_of_flow());
    }

    #[test]
    fn test_align_self_override() {
        assert_eq!(AlignSelf::Auto.to_align_items(), None);
        assert_eq!(AlignSelf::Center.to_align_items(), Some(AlignItems::Center));
    }

    #[test]
    fn test_default_direction() {
        assert_eq!(WidgetKind::HStack.default_direction(), FlexDirection::Row);
        assert_eq!(WidgetKind::VStack.default_direction(), FlexDirection::Column);
        assert!(WidgetKind::ScrollView.is_container());
        assert!(!WidgetKind::Text.is_container());
    }

    #[test]
    fn test_font_line_px() {
        let font = Font::default();
        assert!((font.line_px() - 19.6).abs() < 1e-4);
    }
}
