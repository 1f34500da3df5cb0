//! Error types for the element model and the context hierarchy.

use alloc::string::String;
use thiserror::Error;

use crate::{ContextId, ElementId};

/// Errors produced by [`ContextHierarchy`](crate::ContextHierarchy) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was disposed and can no longer be used.
    #[error("context {0:?} has been disposed")]
    Disposed(ContextId),

    /// No context on the parent chain declared the key modifiable.
    #[error("no context declares `{key}` as modifiable")]
    NotModifiable {
        /// The key that was written.
        key: String,
    },

    /// Reparenting would make a context its own ancestor.
    #[error("context {0:?} cannot become a descendant of itself")]
    Cycle(ContextId),
}

/// Errors produced by [`ElementTree`](crate::ElementTree) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The element is not (or no longer) part of the tree.
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    /// The element cannot hold children in the requested slot.
    #[error("element {0:?} cannot hold children here")]
    NotAContainer(ElementId),

    /// The element is not a child of the given container.
    #[error("element {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The container.
        parent: ElementId,
        /// The element that was expected to be a child.
        child: ElementId,
    },

    /// The element is not a placeholder.
    #[error("element {0:?} is not a placeholder")]
    NotAPlaceholder(ElementId),

    /// The mutation would make an element its own ancestor.
    #[error("element {0:?} cannot become a descendant of itself")]
    Cycle(ElementId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn not_modifiable_mentions_the_key() {
        let error = ContextError::NotModifiable {
            key: "selection".into(),
        };
        assert_eq!(error.to_string(), "no context declares `selection` as modifiable");
    }
}
