//! Headless backend for the Trellis rendering engine.
//!
//! [`HeadlessToolkit`] keeps widgets in memory, which makes it suitable for
//! tests and for driving models without a display. [`default_registry`]
//! provides a renderer for every element kind.

mod contributions;
mod error;
mod toolkit;

pub mod renderers;

pub use contributions::Contributions;
pub use error::ToolkitError;
pub use renderers::default_registry;
pub use toolkit::{HeadlessToolkit, Widget, WidgetKind};

use trellis_engine::{EngineBuilder, RenderingEngine};

/// An engine builder with a fresh toolkit and the default renderers.
#[must_use]
pub fn engine_builder() -> EngineBuilder<HeadlessToolkit> {
    RenderingEngine::builder(HeadlessToolkit::new()).registry(default_registry())
}
