//! Engine - the widget tree.
//!
//! - Widget: node record, property setters, dirty mask, layout cache
//! - WidgetTree: arena of widgets, structural ops, invalidation, walks
//!
//! # Architecture
//!
//! Widgets are NOT linked by pointers. They are slots in an arena:
//!
//! ```text
//! WidgetId(1v1): VStack (parent=None, children=[2v1, 3v1])
//! WidgetId(2v1): Text   (parent=1v1,  text="Hello")
//! WidgetId(3v1): Button (parent=1v1,  text="OK")
//! ```
//!
//! Ids are generational, so a handle to a destroyed widget never aliases a
//! newer one.

mod tree;
mod widget;

pub use tree::*;
pub use widget::*;
