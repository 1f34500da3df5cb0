//! Identifiers shared by the element arena, the context arena and native toolkits.

use core::fmt;

slotmap::new_key_type! {
    /// Key of an element stored in an [`ElementTree`](crate::ElementTree).
    pub struct ElementId;

    /// Key of a context stored in a [`ContextHierarchy`](crate::ContextHierarchy).
    pub struct ContextId;
}

/// Opaque handle to a native widget.
///
/// Handles are minted by the native toolkit; the model only stores them on behalf
/// of the engine and never interprets the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetHandle(u64);

impl WidgetHandle {
    /// Wraps a toolkit-specific raw handle.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_handle_round_trips_raw_value() {
        let handle = WidgetHandle::from_raw(42);
        assert_eq!(handle.raw(), 42);
        assert_eq!(handle.to_string(), "widget#42");
    }
}
