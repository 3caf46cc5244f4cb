//! Events - the values handlers receive.
//!
//! An [`Event`] lives on the dispatcher's stack for exactly one dispatch
//! call and is handed to handlers as `&mut Event`. Handlers must not keep it
//! (the borrow checker enforces this); copy out what is needed instead.
//!
//! # API
//!
//! - `Event::mouse(ty, target, data)` / `Event::key(..)` / `Event::focus(..)`
//! - `stop_propagation()` - no further nodes see the event
//! - `prevent_default()` - skip the dispatcher's default action (scrolling,
//!   focus traversal)

use crate::engine::WidgetId;

// =============================================================================
// TYPES
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }

    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    #[default]
    None,
}

/// Event type, also the key of per-widget handler slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
    MouseWheel,
    Click,
    DoubleClick,
    TripleClick,
    KeyDown,
    KeyUp,
    Focus,
    Blur,
}

/// Where in the propagation path the event currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    None,
    Capture,
    Target,
    Bubble,
}

// =============================================================================
// PAYLOADS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseData {
    pub x: f32,
    pub y: f32,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    /// Wheel delta in pixels (positive scrolls content up/left).
    pub delta_x: f32,
    pub delta_y: f32,
    /// 1 for single clicks, 2 for double, ...
    pub click_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyData {
    /// Key name ("a", "Enter", "Tab", "ArrowUp", ...)
    pub key: String,
    /// Printable character, if any.
    pub ch: Option<char>,
    pub repeat: bool,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FocusData {
    /// Blur: the widget gaining focus. Focus: the widget losing it.
    pub related_target: Option<WidgetId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Mouse(MouseData),
    Key(KeyData),
    Focus(FocusData),
}

// =============================================================================
// EVENT
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub ty: EventType,
    pub target: WidgetId,
    pub current_target: Option<WidgetId>,
    pub phase: Phase,
    propagation_stopped: bool,
    default_prevented: bool,
    pub payload: EventPayload,
}

impl Event {
    fn new(ty: EventType, target: WidgetId, payload: EventPayload) -> Self {
        Self {
            ty,
            target,
            current_target: None,
            phase: Phase::None,
            propagation_stopped: false,
            default_prevented: false,
            payload,
        }
    }

    pub fn mouse(ty: EventType, target: WidgetId, data: MouseData) -> Self {
        Self::new(ty, target, EventPayload::Mouse(data))
    }

    pub fn key(ty: EventType, target: WidgetId, data: KeyData) -> Self {
        Self::new(ty, target, EventPayload::Key(data))
    }

    pub fn focus(ty: EventType, target: WidgetId, related_target: Option<WidgetId>) -> Self {
        Self::new(ty, target, EventPayload::Focus(FocusData { related_target }))
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn mouse_data(&self) -> Option<&MouseData> {
        match &self.payload {
            EventPayload::Mouse(m) => Some(m),
            _ => None,
        }
    }

    pub fn key_data(&self) -> Option<&KeyData> {
        match &self.payload {
            EventPayload::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn focus_data(&self) -> Option<&FocusData> {
        match &self.payload {
            EventPayload::Focus(f) => Some(f),
            _ => None,
        }
    }
}
