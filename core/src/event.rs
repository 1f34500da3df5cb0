//! Model change notifications.
//!
//! [`ElementTree`](crate::ElementTree) mutators queue these; the rendering engine
//! drains the queue and reacts to each one.

use alloc::vec::Vec;

use crate::ElementId;

/// Which child list of a parent changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildSlot {
    /// The ordered children of a container.
    Children,
    /// The detached windows of a window or the windows of an application.
    Windows,
}

/// A change made to the model by its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelEvent {
    /// `to_be_rendered` flipped.
    ToBeRenderedChanged {
        /// The affected element.
        element: ElementId,
        /// The new value.
        to_be_rendered: bool,
    },
    /// `visible` flipped.
    VisibleChanged {
        /// The affected element.
        element: ElementId,
        /// The new value.
        visible: bool,
    },
    /// Children were added to or removed from a parent.
    ChildrenChanged {
        /// The parent.
        parent: ElementId,
        /// The list that changed.
        slot: ChildSlot,
        /// Added children, in model order.
        added: Vec<ElementId>,
        /// Removed children, in their former order.
        removed: Vec<ElementId>,
    },
    /// A container's selected child changed.
    SelectionChanged {
        /// The container.
        container: ElementId,
        /// Previously selected child.
        old: Option<ElementId>,
        /// Newly selected child.
        new: Option<ElementId>,
    },
    /// A window's trim bars changed.
    TrimBarsChanged {
        /// The window.
        window: ElementId,
        /// Added trim bars.
        added: Vec<ElementId>,
        /// Removed trim bars.
        removed: Vec<ElementId>,
    },
}

impl ModelEvent {
    /// The element the event is primarily about.
    #[must_use]
    pub const fn subject(&self) -> ElementId {
        match self {
            Self::ToBeRenderedChanged { element, .. } | Self::VisibleChanged { element, .. } => {
                *element
            }
            Self::ChildrenChanged { parent, .. } => *parent,
            Self::SelectionChanged { container, .. } => *container,
            Self::TrimBarsChanged { window, .. } => *window,
        }
    }

    /// Topic name of the event, as used in log output.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::ToBeRenderedChanged { .. } => "element.to_be_rendered_changed",
            Self::VisibleChanged { .. } => "element.visible_changed",
            Self::ChildrenChanged { .. } => "container.children_changed",
            Self::SelectionChanged { .. } => "container.selection_changed",
            Self::TrimBarsChanged { .. } => "trim_bars_changed",
        }
    }
}
