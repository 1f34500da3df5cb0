//! Model layer of the Trellis rendering engine.
//!
//! This crate holds everything the engine synchronizes *from*:
//!
//! - [`ElementTree`] - arena of [`UIElement`]s, the live abstract UI model
//! - [`ModelEvent`] - change notifications queued by model mutations
//! - [`ContextHierarchy`] - arena of scoped key/value contexts
//!
//! Parent links, placeholder references and context links are plain arena keys,
//! never owning pointers, so tearing a subtree down is a matter of removing keys.

extern crate alloc;

pub mod context;
pub mod element;
pub mod error;
pub mod event;
pub mod id;
pub mod tree;
pub mod value;

pub use context::ContextHierarchy;
pub use element::{
    ContainerData, ContainerStyle, Contribution, ElementKind, KindTag, LeafData, LeafRole,
    PersistedState, RendererId, UIElement, WindowData,
};
pub use error::{ContextError, ModelError};
pub use event::{ChildSlot, ModelEvent};
pub use id::{ContextId, ElementId, WidgetHandle};
pub use tree::ElementTree;
pub use value::{AnyValue, downcast, keys, value};
