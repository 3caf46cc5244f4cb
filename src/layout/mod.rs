//! Layout Module
//!
//! Flexbox-inspired geometry for the widget tree.
//!
//! # Architecture
//!
//! 1. Snapshot the layout inputs of every attached widget
//! 2. Pass 1 resolves sizes top-down, running flex distribution per container
//! 3. Pass 2 grows content-sized containers to fit wrapped text
//! 4. Pass 3 shifts later siblings in vertical stacks
//! 5. Results are written back as each widget's computed layout and
//!    screen-space bounds
//!
//! Text width and line breaking come from injected collaborators
//! ([`TextMeasurer`], [`LineBreaker`]) bundled in [`TextServices`].
//!
//! # Example
//!
//! ```ignore
//! use spark_ui::layout::LayoutEngine;
//!
//! let mut engine = LayoutEngine::default();
//! let report = engine.compute_layout(&tree, size(800.0, 600.0));
//! assert!(!report.skipped);
//! ```

mod engine;
pub mod flex;
mod intrinsic;
mod node;
mod text_measure;

pub use engine::{LayoutConstraints, LayoutEngine, LayoutReport};
pub use intrinsic::{
    BUTTON_MIN, CHECK_BOX_SIZE, CHECK_LABEL_GAP, MEDIA_PLACEHOLDER, SELECT_HEIGHT,
    SELECT_MIN_WIDTH, SLIDER_HEIGHT, TEXT_AREA_HEIGHT, TEXT_FIELD_HEIGHT, TOGGLE_SIZE,
};
pub use text_measure::{
    LineBreaker, LineSegment, MonospaceMeasurer, TextMeasurer, TextServices, WordWrapBreaker,
};
