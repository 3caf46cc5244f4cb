//! Frame Pipeline
//!
//! Drives one frame at a time over the widget tree:
//!
//! ```text
//! input events → EventDispatcher → (widget state, dirty bits)
//! tick         → async results → LayoutEngine → computed layout + bounds
//! ```
//!
//! The render builder runs after `tick` and only reads.

mod frame;

pub use frame::{AsyncResult, AsyncSender, TickOutcome, Ui};
