//! Input Module - raw input and the crossterm bridge.
//!
//! [`InputEvent`] is what the frame driver feeds the dispatcher, one event
//! at a time. Terminal events from crossterm convert into it with cell
//! coordinates scaled to pixels by the configured cell size.
//!
//! # API
//!
//! - `InputEvent::from_crossterm(&event, &config)` - convert, `None` for
//!   events the core does not consume (focus gained, paste, ...)
//! - `EventDispatcher::dispatch(tree, &input, now)` - route one event
//!
//! # Example
//!
//! ```ignore
//! use spark_ui::state::input::InputEvent;
//!
//! if let Some(input) = InputEvent::from_crossterm(&crossterm::event::read()?, &config.dispatch) {
//!     dispatcher.dispatch(&tree, &input, Instant::now());
//! }
//! ```

use std::time::Instant;

use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyModifiers,
    MouseButton as CrosstermMouseButton, MouseEvent as CrosstermMouseEvent, MouseEventKind,
};

use super::dispatcher::EventDispatcher;
use super::events::{KeyData, Modifiers, MouseButton, MouseData};
use crate::config::DispatchConfig;
use crate::engine::WidgetTree;
use crate::types::{Size, size};

// =============================================================================
// INPUT EVENT ENUM
// =============================================================================

/// One raw input event, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseMove(MouseData),
    MouseDown(MouseData),
    MouseUp(MouseData),
    Wheel(MouseData),
    KeyDown(KeyData),
    KeyUp(KeyData),
    /// New viewport size.
    Resize(Size<f32>),
}

impl InputEvent {
    /// Convert a crossterm event.
    pub fn from_crossterm(event: &CrosstermEvent, config: &DispatchConfig) -> Option<Self> {
        match event {
            CrosstermEvent::Mouse(mouse) => Some(convert_mouse_event(mouse, config)),
            CrosstermEvent::Key(key) => convert_key_event(key),
            CrosstermEvent::Resize(cols, rows) => Some(Self::Resize(size(
                f32::from(*cols) * config.cell_width,
                f32::from(*rows) * config.cell_height,
            ))),
            _ => None,
        }
    }
}

// =============================================================================
// MOUSE EVENT CONVERSION
// =============================================================================

fn convert_mouse_event(event: &CrosstermMouseEvent, config: &DispatchConfig) -> InputEvent {
    let mut data = MouseData {
        x: f32::from(event.column) * config.cell_width,
        y: f32::from(event.row) * config.cell_height,
        modifiers: convert_modifiers(event.modifiers),
        ..MouseData::default()
    };
    let line = config.wheel_line_px;

    match event.kind {
        MouseEventKind::Down(btn) => {
            data.button = convert_mouse_button(btn);
            InputEvent::MouseDown(data)
        }
        MouseEventKind::Up(btn) => {
            data.button = convert_mouse_button(btn);
            InputEvent::MouseUp(data)
        }
        MouseEventKind::Drag(btn) => {
            data.button = convert_mouse_button(btn);
            InputEvent::MouseMove(data)
        }
        MouseEventKind::Moved => InputEvent::MouseMove(data),
        MouseEventKind::ScrollDown => InputEvent::Wheel(MouseData { delta_y: line, ..data }),
        MouseEventKind::ScrollUp => InputEvent::Wheel(MouseData { delta_y: -line, ..data }),
        MouseEventKind::ScrollRight => InputEvent::Wheel(MouseData { delta_x: line, ..data }),
        MouseEventKind::ScrollLeft => InputEvent::Wheel(MouseData { delta_x: -line, ..data }),
    }
}

fn convert_mouse_button(btn: CrosstermMouseButton) -> MouseButton {
    match btn {
        CrosstermMouseButton::Left => MouseButton::Left,
        CrosstermMouseButton::Right => MouseButton::Right,
        CrosstermMouseButton::Middle => MouseButton::Middle,
    }
}

// =============================================================================
// KEY EVENT CONVERSION
// =============================================================================

fn convert_key_event(event: &CrosstermKeyEvent) -> Option<InputEvent> {
    let mut modifiers = convert_modifiers(event.modifiers);
    let (key, ch) = match event.code {
        KeyCode::Char(c) => (c.to_string(), Some(c)),
        KeyCode::Enter => ("Enter".to_string(), None),
        KeyCode::Tab => ("Tab".to_string(), None),
        KeyCode::BackTab => {
            modifiers.shift = true;
            ("Tab".to_string(), None)
        }
        KeyCode::Backspace => ("Backspace".to_string(), None),
        KeyCode::Delete => ("Delete".to_string(), None),
        KeyCode::Esc => ("Escape".to_string(), None),
        KeyCode::Up => ("ArrowUp".to_string(), None),
        KeyCode::Down => ("ArrowDown".to_string(), None),
        KeyCode::Left => ("ArrowLeft".to_string(), None),
        KeyCode::Right => ("ArrowRight".to_string(), None),
        KeyCode::Home => ("Home".to_string(), None),
        KeyCode::End => ("End".to_string(), None),
        KeyCode::PageUp => ("PageUp".to_string(), None),
        KeyCode::PageDown => ("PageDown".to_string(), None),
        KeyCode::Insert => ("Insert".to_string(), None),
        KeyCode::F(n) => (format!("F{n}"), None),
        _ => return None,
    };

    let data = KeyData {
        key,
        ch,
        repeat: event.kind == KeyEventKind::Repeat,
        modifiers,
    };
    Some(match event.kind {
        KeyEventKind::Release => InputEvent::KeyUp(data),
        KeyEventKind::Press | KeyEventKind::Repeat => InputEvent::KeyDown(data),
    })
}

fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        shift: mods.contains(KeyModifiers::SHIFT),
        meta: mods.intersects(KeyModifiers::META | KeyModifiers::SUPER),
    }
}

// =============================================================================
// EVENT ROUTING
// =============================================================================

impl EventDispatcher {
    /// Route one input event. Returns whether a handler or default action
    /// consumed it. Resizes are left to the frame driver.
    pub fn dispatch(&mut self, tree: &WidgetTree, input: &InputEvent, now: Instant) -> bool {
        match input {
            InputEvent::MouseMove(data) => self.mouse_move(tree, *data),
            InputEvent::MouseDown(data) => self.mouse_down(tree, *data),
            InputEvent::MouseUp(data) => self.mouse_up(tree, *data, now),
            InputEvent::Wheel(data) => self.wheel(tree, *data),
            InputEvent::KeyDown(data) => self.key_down(tree, data.clone()),
            InputEvent::KeyUp(data) => self.key_up(tree, data.clone()),
            InputEvent::Resize(_) => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
