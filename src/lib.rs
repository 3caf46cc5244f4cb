//! # spark-ui
//!
//! Layout and interaction core for a retained-mode UI toolkit.
//!
//! ## Architecture
//!
//! Widgets live in an arena ([`WidgetTree`]) and are addressed by stable
//! [`WidgetId`]s. Geometry is resolved by a three-pass flexbox-style
//! [`LayoutEngine`]; input is turned into phase-propagated widget events by
//! the [`EventDispatcher`]. [`Ui`] runs them in frame order:
//!
//! ```text
//! input → EventDispatcher → dirty bits → LayoutEngine → render builder
//! ```
//!
//! ## Modules
//!
//! - [`types`] - geometry values and closed enums
//! - [`engine`] - widget tree, widgets, dirty tracking
//! - [`layout`] - layout engine, flex distribution, text collaborators
//! - [`state`] - events, dispatch, hit testing, focus, scrolling, input
//! - [`pipeline`] - frame driver and async results
//! - [`config`] - tunables, loaded from JSON
//!
//! ## Example
//!
//! ```ignore
//! use spark_ui::{Config, Ui, WidgetKind, size};
//!
//! let mut ui = Ui::new(&Config::default(), size(800.0, 600.0))?;
//! let tree = ui.tree().clone();
//! let root = tree.create_root(WidgetKind::VStack);
//! let label = tree.create(WidgetKind::Text);
//! tree.update(label, |w| w.set_text("Hello"));
//! tree.add_child(root, label);
//!
//! ui.tick();
//! let rect = tree.with(label, |w| w.layout_rect());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod state;
pub mod types;

pub use types::*;

pub use config::{Config, DispatchConfig, FrameConfig, TextConfig};
pub use engine::{ComputedLayout, DirtyFlags, Widget, WidgetId, WidgetState, WidgetTree};
pub use error::{Error, Result};
pub use layout::{LayoutEngine, LayoutReport, TextServices};
pub use pipeline::{AsyncResult, AsyncSender, TickOutcome, Ui};
pub use state::{Event, EventDispatcher, EventType, InputEvent, handler};
