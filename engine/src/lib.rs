//! Trellis rendering engine.
//!
//! The engine keeps a tree of native widgets and a hierarchy of scoped
//! contexts in sync with an abstract element model:
//!
//! - elements are rendered by per-kind [`Renderer`]s looked up in a
//!   [`RendererRegistry`]
//! - model changes queued by [`ElementTree`](trellis_core::ElementTree)
//!   mutations are turned into incremental creates and removals
//! - failures of one element are contained by an [`ErrorBoundary`]
//! - [`RenderingEngine::run`] pumps the [`Toolkit`]'s event loop
//!
//! The engine is single-threaded: all model and widget access happens on the
//! thread that owns the engine.

mod boundary;
mod collaborators;
mod config;
mod engine;
mod error;
mod registry;
mod renderer;
mod toolkit;
mod zorder;

#[cfg(test)]
pub(crate) mod testing;

pub use boundary::{ErrorBoundary, catch_panic};
pub use collaborators::{
    ContributionFactory, DefaultIdleAdvisor, IdleAdvisor, LoopControl, NoContributions,
    StylingEngine,
};
pub use config::EngineConfig;
pub use engine::{EngineBuilder, ExitCode, RenderingEngine};
pub use error::{FatalError, RenderError};
pub use registry::{DEFAULT_CUSTOM_RENDERER_KEY, RendererRegistry};
pub use renderer::{Renderer, STYLE_OVERRIDE_KEY};
pub use toolkit::{NativeEvent, NativeEventKind, Toolkit};
pub use zorder::{fix_children_z_order, fix_z_order};

pub use trellis_core as model;
