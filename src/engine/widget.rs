//! Widget - a single node of the retained tree.
//!
//! A widget owns its geometry inputs, interaction flags, event handler slots
//! and the layout cache written by the layout engine. Every setter compares
//! the old and new value and only raises dirty bits on an actual change;
//! size/position affecting bits also invalidate the computed layout.
//!
//! Widgets are never shared directly. They live in the [`WidgetTree`] arena
//! behind a per-widget lock and are mutated through [`WidgetTree::update`],
//! which propagates layout invalidation to ancestors and descendants.
//!
//! [`WidgetTree`]: super::WidgetTree
//! [`WidgetTree::update`]: super::WidgetTree::update

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;

use super::WidgetId;
use crate::state::dispatch::{Behavior, EventHandler, Responder};
use crate::state::events::EventType;
use crate::types::{
    AlignItems, AlignSelf, Edges, FlexBasis, FlexDirection, FlexWrap, Font, JustifyContent,
    LayoutRect, Offsets, Point, Position, Size, SizeMode, WidgetKind, NO_OFFSETS, ZERO_EDGES,
};

// =============================================================================
// Dirty Mask
// =============================================================================

bitflags! {
    /// Which properties changed since the last layout/render sync.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirtyFlags: u16 {
        const POSITION = 1 << 0;
        const SIZE = 1 << 1;
        const BACKGROUND = 1 << 2;
        const TEXT = 1 << 3;
        const STYLE = 1 << 4;
        const VISIBILITY = 1 << 5;
        const STATE = 1 << 6;
        const SCROLL = 1 << 7;
        const CHILDREN = 1 << 8;
        const LAYOUT = 1 << 9;

        /// Bits that force the layout engine to recompute geometry.
        const LAYOUT_AFFECTING = Self::POSITION.bits()
            | Self::SIZE.bits()
            | Self::TEXT.bits()
            | Self::VISIBILITY.bits()
            | Self::CHILDREN.bits()
            | Self::LAYOUT.bits();
    }
}

bitflags! {
    /// Interaction flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WidgetState: u8 {
        const HOVERED = 1 << 0;
        const FOCUSED = 1 << 1;
        const PRESSED = 1 << 2;
        const DISABLED = 1 << 3;
        const VISIBLE = 1 << 4;
    }
}

impl Default for WidgetState {
    fn default() -> Self {
        Self::VISIBLE
    }
}

// =============================================================================
// Computed Layout
// =============================================================================

/// Geometry written by the layout engine.
///
/// `valid` is false whenever this widget or an ancestor has unresolved
/// size/position-affecting changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComputedLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub valid: bool,
}

impl ComputedLayout {
    pub fn rect(&self) -> LayoutRect {
        LayoutRect::new(self.x, self.y, self.width, self.height)
    }
}

/// Replace `field` with `value`, returning whether anything changed.
fn replace<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        false
    } else {
        *field = value;
        true
    }
}

// =============================================================================
// Widget
// =============================================================================

/// A node of the widget tree.
pub struct Widget {
    pub(crate) id: WidgetId,
    kind: WidgetKind,
    name: Option<String>,

    pub(crate) parent: Option<WidgetId>,
    pub(crate) children: Vec<WidgetId>,
    pub(crate) attached: bool,

    // Size inputs
    width: f32,
    height: f32,
    width_mode: SizeMode,
    height_mode: SizeMode,
    width_percent: f32,
    height_percent: f32,
    min_width: Option<f32>,
    max_width: Option<f32>,
    min_height: Option<f32>,
    max_height: Option<f32>,
    padding: Edges,
    gap: f32,

    // Flex container
    direction: FlexDirection,
    justify: JustifyContent,
    align_items: AlignItems,
    wrap: FlexWrap,

    // Flex item
    grow: f32,
    shrink: f32,
    basis: FlexBasis,
    align_self: AlignSelf,
    order: i32,

    // Positioning
    position: Position,
    offsets: Offsets,

    // Content
    text: String,
    font: Font,
    natural_size: Option<Size<f32>>,
    load_error: Option<String>,
    option_count: usize,
    open: bool,

    // Visual (not layout affecting)
    opacity: f32,
    background: Option<u32>,

    // Scrolling
    scrollable: bool,
    scroll_offset: Point<f32>,

    focusable: bool,
    state: WidgetState,

    pub(crate) computed: ComputedLayout,
    pub(crate) computed_bounds: LayoutRect,
    pub(crate) bounds_frame: u64,
    pub(crate) dirty: DirtyFlags,
    /// Set by setters, consumed by `WidgetTree::update` to propagate invalidation.
    pub(crate) layout_touched: bool,
    /// Bumped on every layout invalidation. The layout engine only marks the
    /// cache valid if this is unchanged since its snapshot.
    pub(crate) layout_epoch: u64,

    pub(crate) handlers: HashMap<EventType, EventHandler>,
    pub(crate) capture_handlers: HashMap<EventType, EventHandler>,
    pub(crate) responder: Option<Box<dyn Responder>>,
    pub(crate) behaviors: Vec<Box<dyn Behavior>>,
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("computed", &self.computed)
            .field("dirty", &self.dirty)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Widget {
    /// Construct a detached widget with defaults (opacity 1, visible).
    pub(crate) fn new(id: WidgetId, kind: WidgetKind, font: Font) -> Self {
        Self {
            id,
            kind,
            name: None,
            parent: None,
            children: Vec::new(),
            attached: false,
            width: 0.0,
            height: 0.0,
            width_mode: SizeMode::Auto,
            height_mode: SizeMode::Auto,
            width_percent: 0.0,
            height_percent: 0.0,
            min_width: None,
            max_width: None,
            min_height: None,
            max_height: None,
            padding: ZERO_EDGES,
            gap: 0.0,
            direction: kind.default_direction(),
            justify: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            wrap: FlexWrap::NoWrap,
            grow: 0.0,
            shrink: 1.0,
            basis: FlexBasis::Auto,
            align_self: AlignSelf::Auto,
            order: 0,
            position: Position::Static,
            offsets: NO_OFFSETS,
            text: String::new(),
            font,
            natural_size: None,
            load_error: None,
            option_count: 0,
            open: false,
            opacity: 1.0,
            background: None,
            scrollable: kind == WidgetKind::ScrollView,
            scroll_offset: Point { x: 0.0, y: 0.0 },
            focusable: kind.is_focusable_by_default(),
            state: WidgetState::default(),
            computed: ComputedLayout::default(),
            computed_bounds: LayoutRect::ZERO,
            bounds_frame: 0,
            dirty: DirtyFlags::all(),
            layout_touched: true,
            layout_epoch: 0,
            handlers: HashMap::new(),
            capture_handlers: HashMap::new(),
            responder: None,
            behaviors: Vec::new(),
        }
    }

    /// Raise dirty bits. Layout-affecting bits invalidate the layout cache.
    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
        if flags.intersects(DirtyFlags::LAYOUT_AFFECTING) {
            self.invalidate_layout_cache();
            self.layout_touched = true;
        }
    }

    pub(crate) fn invalidate_layout_cache(&mut self) {
        self.dirty |= DirtyFlags::LAYOUT;
        self.computed.valid = false;
        self.layout_epoch = self.layout_epoch.wrapping_add(1);
    }

    /// Return and clear every dirty bit except `LAYOUT`, which belongs to the
    /// layout engine. Called by the render command builder after a sync.
    pub fn take_render_dirty(&mut self) -> DirtyFlags {
        let taken = self.dirty - DirtyFlags::LAYOUT;
        self.dirty &= DirtyFlags::LAYOUT;
        taken
    }

    // =========================================================================
    // Identity / structure
    // =========================================================================

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    /// Reachable from the tree root.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn computed(&self) -> ComputedLayout {
        self.computed
    }

    /// Scroll-independent layout rectangle.
    pub fn layout_rect(&self) -> LayoutRect {
        self.computed.rect()
    }

    /// Screen-space bounds and the frame they were last refreshed in.
    pub fn computed_bounds(&self) -> (LayoutRect, u64) {
        (self.computed_bounds, self.bounds_frame)
    }

    // =========================================================================
    // Size
    // =========================================================================

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn width_mode(&self) -> SizeMode {
        self.width_mode
    }

    pub fn height_mode(&self) -> SizeMode {
        self.height_mode
    }

    pub fn width_percent(&self) -> f32 {
        self.width_percent
    }

    pub fn height_percent(&self) -> f32 {
        self.height_percent
    }

    pub fn set_width(&mut self, width: f32) -> bool {
        let changed = replace(&mut self.width, width);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_height(&mut self, height: f32) -> bool {
        let changed = replace(&mut self.height, height);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_width_mode(&mut self, mode: SizeMode) -> bool {
        let changed = replace(&mut self.width_mode, mode);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_height_mode(&mut self, mode: SizeMode) -> bool {
        let changed = replace(&mut self.height_mode, mode);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    /// Explicit width with `SizeMode::Fixed`.
    pub fn set_fixed_width(&mut self, width: f32) -> bool {
        let a = self.set_width_mode(SizeMode::Fixed);
        let b = self.set_width(width);
        a || b
    }

    /// Explicit height with `SizeMode::Fixed`.
    pub fn set_fixed_height(&mut self, height: f32) -> bool {
        let a = self.set_height_mode(SizeMode::Fixed);
        let b = self.set_height(height);
        a || b
    }

    /// Width as a percentage of the available width.
    pub fn set_width_percent(&mut self, percent: f32) -> bool {
        let a = self.set_width_mode(SizeMode::Percent);
        let b = replace(&mut self.width_percent, percent);
        if b {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        a || b
    }

    /// Height as a percentage of the available height.
    pub fn set_height_percent(&mut self, percent: f32) -> bool {
        let a = self.set_height_mode(SizeMode::Percent);
        let b = replace(&mut self.height_percent, percent);
        if b {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        a || b
    }

    pub fn min_width(&self) -> Option<f32> {
        self.min_width
    }

    pub fn max_width(&self) -> Option<f32> {
        self.max_width
    }

    pub fn min_height(&self) -> Option<f32> {
        self.min_height
    }

    pub fn max_height(&self) -> Option<f32> {
        self.max_height
    }

    pub fn set_min_width(&mut self, value: Option<f32>) -> bool {
        let changed = replace(&mut self.min_width, value);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_max_width(&mut self, value: Option<f32>) -> bool {
        let changed = replace(&mut self.max_width, value);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_min_height(&mut self, value: Option<f32>) -> bool {
        let changed = replace(&mut self.min_height, value);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_max_height(&mut self, value: Option<f32>) -> bool {
        let changed = replace(&mut self.max_height, value);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn padding(&self) -> Edges {
        self.padding
    }

    pub fn set_padding(&mut self, padding: Edges) -> bool {
        let changed = replace(&mut self.padding, padding);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn gap(&self) -> f32 {
        self.gap
    }

    pub fn set_gap(&mut self, gap: f32) -> bool {
        let changed = replace(&mut self.gap, gap);
        if changed {
            self.mark_dirty(DirtyFlags::LAYOUT);
        }
        changed
    }

    // =========================================================================
    // Flex container
    // =========================================================================

    pub fn direction(&self) -> FlexDirection {
        self.direction
    }

    pub fn justify(&self) -> JustifyContent {
        self.justify
    }

    pub fn align_items(&self) -> AlignItems {
        self.align_items
    }

    pub fn wrap(&self) -> FlexWrap {
        self.wrap
    }

    pub fn set_direction(&mut self, direction: FlexDirection) -> bool {
        let changed = replace(&mut self.direction, direction);
        if changed {
            self.mark_dirty(DirtyFlags::LAYOUT);
        }
        changed
    }

    pub fn set_justify(&mut self, justify: JustifyContent) -> bool {
        let changed = replace(&mut self.justify, justify);
        if changed {
            self.mark_dirty(DirtyFlags::LAYOUT);
        }
        changed
    }

    pub fn set_align_items(&mut self, align: AlignItems) -> bool {
        let changed = replace(&mut self.align_items, align);
        if changed {
            self.mark_dirty(DirtyFlags::LAYOUT);
        }
        changed
    }

    pub fn set_wrap(&mut self, wrap: FlexWrap) -> bool {
        let changed = replace(&mut self.wrap, wrap);
        if changed {
            self.mark_dirty(DirtyFlags::LAYOUT);
        }
        changed
    }

    // =========================================================================
    // Flex item
    // =========================================================================

    pub fn grow(&self) -> f32 {
        self.grow
    }

    pub fn shrink(&self) -> f32 {
        self.shrink
    }

    pub fn basis(&self) -> FlexBasis {
        self.basis
    }

    pub fn align_self(&self) -> AlignSelf {
        self.align_self
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_grow(&mut self, grow: f32) -> bool {
        let changed = replace(&mut self.grow, grow.max(0.0));
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_shrink(&mut self, shrink: f32) -> bool {
        let changed = replace(&mut self.shrink, shrink.max(0.0));
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_basis(&mut self, basis: FlexBasis) -> bool {
        let changed = replace(&mut self.basis, basis);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    pub fn set_align_self(&mut self, align: AlignSelf) -> bool {
        let changed = replace(&mut self.align_self, align);
        if changed {
            self.mark_dirty(DirtyFlags::POSITION);
        }
        changed
    }

    pub fn set_order(&mut self, order: i32) -> bool {
        let changed = replace(&mut self.order, order);
        if changed {
            self.mark_dirty(DirtyFlags::POSITION);
        }
        changed
    }

    // =========================================================================
    // Positioning
    // =========================================================================

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn offsets(&self) -> Offsets {
        self.offsets
    }

    pub fn set_position(&mut self, position: Position) -> bool {
        let changed = replace(&mut self.position, position);
        if changed {
            self.mark_dirty(DirtyFlags::POSITION);
        }
        changed
    }

    pub fn set_offsets(&mut self, offsets: Offsets) -> bool {
        let changed = replace(&mut self.offsets, offsets);
        if changed {
            self.mark_dirty(DirtyFlags::POSITION);
        }
        changed
    }

    // =========================================================================
    // Content
    // =========================================================================

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let changed = replace(&mut self.text, text.into());
        if changed {
            self.mark_dirty(DirtyFlags::TEXT);
        }
        changed
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn set_font(&mut self, font: Font) -> bool {
        let changed = replace(&mut self.font, font);
        if changed {
            self.mark_dirty(DirtyFlags::TEXT);
        }
        changed
    }

    pub fn set_font_size(&mut self, size: f32) -> bool {
        let changed = replace(&mut self.font.size, size);
        if changed {
            self.mark_dirty(DirtyFlags::TEXT);
        }
        changed
    }

    pub fn set_line_height(&mut self, line_height: f32) -> bool {
        let changed = replace(&mut self.font.line_height, line_height);
        if changed {
            self.mark_dirty(DirtyFlags::TEXT);
        }
        changed
    }

    /// Natural size reported by an async media load.
    pub fn natural_size(&self) -> Option<Size<f32>> {
        self.natural_size
    }

    pub fn set_natural_size(&mut self, natural: Option<Size<f32>>) -> bool {
        let changed = replace(&mut self.natural_size, natural);
        if changed {
            self.mark_dirty(DirtyFlags::SIZE);
        }
        changed
    }

    /// Error captured from an async load. Only its presence is significant.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn set_load_error(&mut self, error: Option<String>) -> bool {
        let changed = replace(&mut self.load_error, error);
        if changed {
            // Placeholder sizing differs from a loaded image.
            self.mark_dirty(DirtyFlags::SIZE | DirtyFlags::BACKGROUND);
        }
        changed
    }

    /// Number of options of a Select.
    pub fn option_count(&self) -> usize {
        self.option_count
    }

    pub fn set_option_count(&mut self, count: usize) -> bool {
        let changed = replace(&mut self.option_count, count);
        if changed {
            self.mark_dirty(DirtyFlags::STATE);
        }
        changed
    }

    /// Whether a Select's dropdown is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) -> bool {
        let changed = replace(&mut self.open, open);
        if changed {
            self.mark_dirty(DirtyFlags::STATE);
        }
        changed
    }

    // =========================================================================
    // Visual
    // =========================================================================

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) -> bool {
        let changed = replace(&mut self.opacity, opacity.clamp(0.0, 1.0));
        if changed {
            self.mark_dirty(DirtyFlags::STYLE);
        }
        changed
    }

    /// Background color as packed RGBA.
    pub fn background(&self) -> Option<u32> {
        self.background
    }

    pub fn set_background(&mut self, rgba: Option<u32>) -> bool {
        let changed = replace(&mut self.background, rgba);
        if changed {
            self.mark_dirty(DirtyFlags::BACKGROUND);
        }
        changed
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    pub fn set_scrollable(&mut self, scrollable: bool) -> bool {
        let changed = replace(&mut self.scrollable, scrollable);
        if changed {
            self.mark_dirty(DirtyFlags::LAYOUT);
        }
        changed
    }

    pub fn scroll_offset(&self) -> Point<f32> {
        self.scroll_offset
    }

    /// Raw scroll offset write. Clamping lives in `state::scroll`.
    pub fn set_scroll_offset(&mut self, offset: Point<f32>) -> bool {
        let changed = replace(&mut self.scroll_offset, offset);
        if changed {
            self.mark_dirty(DirtyFlags::SCROLL);
        }
        changed
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    pub fn state(&self) -> WidgetState {
        self.state
    }

    fn set_state_flag(&mut self, flag: WidgetState, on: bool, dirty: DirtyFlags) -> bool {
        if self.state.contains(flag) == on {
            return false;
        }
        self.state.set(flag, on);
        self.mark_dirty(dirty);
        true
    }

    pub fn is_visible(&self) -> bool {
        self.state.contains(WidgetState::VISIBLE)
    }

    pub fn set_visible(&mut self, visible: bool) -> bool {
        self.set_state_flag(WidgetState::VISIBLE, visible, DirtyFlags::VISIBILITY)
    }

    pub fn is_disabled(&self) -> bool {
        self.state.contains(WidgetState::DISABLED)
    }

    pub fn set_disabled(&mut self, disabled: bool) -> bool {
        self.set_state_flag(WidgetState::DISABLED, disabled, DirtyFlags::STATE)
    }

    pub fn is_hovered(&self) -> bool {
        self.state.contains(WidgetState::HOVERED)
    }

    pub fn set_hovered(&mut self, hovered: bool) -> bool {
        self.set_state_flag(WidgetState::HOVERED, hovered, DirtyFlags::STATE)
    }

    pub fn is_pressed(&self) -> bool {
        self.state.contains(WidgetState::PRESSED)
    }

    pub fn set_pressed(&mut self, pressed: bool) -> bool {
        self.set_state_flag(WidgetState::PRESSED, pressed, DirtyFlags::STATE)
    }

    pub fn is_focused(&self) -> bool {
        self.state.contains(WidgetState::FOCUSED)
    }

    pub fn set_focused(&mut self, focused: bool) -> bool {
        self.set_state_flag(WidgetState::FOCUSED, focused, DirtyFlags::STATE)
    }

    pub fn is_focusable(&self) -> bool {
        self.focusable
    }

    pub fn set_focusable(&mut self, focusable: bool) -> bool {
        replace(&mut self.focusable, focusable)
    }

    /// Visible, enabled and focusable.
    pub fn can_take_focus(&self) -> bool {
        self.focusable && self.is_visible() && !self.is_disabled()
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    /// Install the target/bubble handler for an event type, replacing any
    /// previous one.
    pub fn on(&mut self, ty: EventType, handler: EventHandler) {
        self.handlers.insert(ty, handler);
    }

    /// Install a capture-phase handler for an event type.
    pub fn on_capture(&mut self, ty: EventType, handler: EventHandler) {
        self.capture_handlers.insert(ty, handler);
    }

    pub fn remove_handler(&mut self, ty: EventType) -> bool {
        self.handlers.remove(&ty).is_some()
    }

    pub fn has_handler(&self, ty: EventType) -> bool {
        self.handlers.contains_key(&ty)
    }

    /// Replace default per-type dispatch with a responder.
    pub fn set_responder(&mut self, responder: Option<Box<dyn Responder>>) {
        self.responder = responder;
    }

    pub fn has_responder(&self) -> bool {
        self.responder.is_some()
    }

    /// Append an interceptor tried before default handling.
    pub fn add_behavior(&mut self, behavior: Box<dyn Behavior>) {
        self.behaviors.push(behavior);
    }

    // =========================================================================
    // Hit testing
    // =========================================================================

    /// Extra height below the widget covered by an open dropdown.
    pub fn dropdown_extent(&self, option_height: f32, gap: f32) -> f32 {
        if self.kind == WidgetKind::Select && self.open {
            gap + self.option_count as f32 * option_height
        } else {
            0.0
        }
    }

    /// Layout rect extended by an open dropdown.
    pub fn effective_bounds(&self, option_height: f32, gap: f32) -> LayoutRect {
        let mut rect = self.layout_rect();
        rect.height += self.dropdown_extent(option_height, gap);
        rect
    }

    /// Whether a point (already adjusted for ancestor scrolling) hits this
    /// widget. Does not look at visibility; the hit tester checks that first.
    pub fn accepts_point(&self, p: Point<f32>, option_height: f32, gap: f32) -> bool {
        let bounds = self.effective_bounds(option_height, gap);
        if !bounds.contains(p) {
            return false;
        }
        match &self.responder {
            Some(responder) => responder.can_receive_events() && responder.hit_test(bounds, p),
            None => true,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
