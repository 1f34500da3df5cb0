//! Type-erased values stored in contexts and element transient data.

use alloc::rc::Rc;
use core::any::Any;

/// A shared, type-erased value.
///
/// Everything runs on the UI thread, so values are reference counted with [`Rc`]
/// rather than `Arc`.
pub type AnyValue = Rc<dyn Any>;

/// Wraps a concrete value into an [`AnyValue`].
#[must_use]
pub fn value<T: Any>(value: T) -> AnyValue {
    Rc::new(value)
}

/// Downcasts a shared value to a concrete type, cloning the `Rc`.
#[must_use]
pub fn downcast<T: Any>(value: &AnyValue) -> Option<Rc<T>> {
    Rc::clone(value).downcast::<T>().ok()
}

/// Well-known context keys under which an element registers itself.
///
/// Registering these on the element's own context shadows whatever an ancestor
/// context registered, so a lookup from a part never answers with its window.
pub mod keys {
    /// The element that owns the context.
    pub const ELEMENT: &str = "trellis.element";
    /// The application element.
    pub const APPLICATION: &str = "trellis.application";
    /// The nearest window element.
    pub const WINDOW: &str = "trellis.window";
    /// The nearest leaf (part) element.
    pub const PART: &str = "trellis.part";
    /// The nearest perspective container.
    pub const PERSPECTIVE: &str = "trellis.perspective";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_matches_only_the_stored_type() {
        let stored = value(7_u32);
        assert_eq!(downcast::<u32>(&stored).as_deref(), Some(&7));
        assert!(downcast::<i64>(&stored).is_none());
    }
}
