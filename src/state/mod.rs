//! State Module - the event dispatcher.
//!
//! Turns raw pointer and keyboard input into targeted, phase-propagated
//! widget events using the geometry cached by the layout engine:
//!
//! - **Events** - event values, types, phases and payloads
//! - **Dispatch** - capture/target/bubble propagation, responders, behaviors
//! - **Mouse** - hit testing, hover diffing, press and click sequencing
//! - **Scroll** - clamped scroll offsets and the wheel default action
//! - **Focus** - single focused widget, Tab traversal, radio groups
//! - **Keyboard** - key routing to the focused widget
//! - **Input** - raw input events and the crossterm bridge

pub mod dispatch;
mod dispatcher;
pub mod events;
mod focus;
pub mod input;
mod keyboard;
mod mouse;
pub mod scroll;

pub use dispatch::{Behavior, EventHandler, Responder, handler};
pub use dispatcher::EventDispatcher;
pub use events::{Event, EventType, KeyData, Modifiers, MouseButton, MouseData, Phase};
pub use focus::focusable_widgets;
pub use input::InputEvent;
pub use mouse::HitResult;
