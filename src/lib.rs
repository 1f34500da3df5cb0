//! # Trellis
//!
//! A model-driven rendering engine. An application describes its user
//! interface as a tree of abstract elements (windows, sashes, stacks, parts,
//! placeholders, menus); the engine renders that tree into native widgets,
//! keeps it rendered while the model changes, and gives every window, part
//! and perspective a scoped context for dependency lookup.
//!
//! ```no_run
//! use trellis::prelude::*;
//!
//! trellis::logging::install_tracing();
//! let config = trellis::config::from_env().expect("valid configuration");
//! let mut engine = trellis::headless::engine_builder().config(config).build();
//!
//! let app = engine.tree_mut().insert(UIElement::application());
//! engine.tree_mut().add_child(app, UIElement::window().with_label("Main")).expect("window");
//! let run_context = engine.contexts_mut().create_root("run");
//! let exit = engine.run(app, run_context).expect("no fatal error");
//! assert_eq!(exit, ExitCode::Ok);
//! ```

pub mod config;
pub mod logging;

#[doc(inline)]
pub use trellis_core as model;
#[doc(inline)]
pub use trellis_engine as engine;
#[cfg(feature = "headless")]
#[doc(inline)]
pub use trellis_headless as headless;

pub use trellis_engine::{
    EngineConfig, ExitCode, FatalError, RenderError, Renderer, RendererRegistry, RenderingEngine,
    Toolkit,
};

/// Commonly used types.
pub mod prelude {
    pub use trellis_core::{
        ContainerStyle, ContextHierarchy, ContextId, ElementId, ElementTree, KindTag, ModelEvent,
        UIElement, WidgetHandle,
    };
    pub use trellis_engine::{
        ContributionFactory, EngineConfig, ExitCode, FatalError, NativeEvent, NativeEventKind,
        RenderError, Renderer, RendererRegistry, RenderingEngine, Toolkit,
    };
}
