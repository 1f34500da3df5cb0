//! Error containment for render, removal and reaction steps.

use core::cell::Cell;
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use crate::{FatalError, RenderError};

/// Runs `op`, turning a panic into [`RenderError::Panicked`].
///
/// # Errors
///
/// Returns the error of `op`, or the panic message.
pub fn catch_panic<R>(op: impl FnOnce() -> Result<R, RenderError>) -> Result<R, RenderError> {
    panic::catch_unwind(AssertUnwindSafe(op))
        .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".into())
}

/// Contains non-fatal failures of a single element's processing.
///
/// Clones share the count of contained failures.
#[derive(Debug, Default, Clone)]
pub struct ErrorBoundary {
    contained: Rc<Cell<usize>>,
}

impl ErrorBoundary {
    /// Creates a boundary with no recorded failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` for `subject`.
    ///
    /// Success yields `Some`. A non-fatal error or a panic is logged and yields
    /// `None`.
    ///
    /// # Errors
    ///
    /// Fatal errors are returned as [`FatalError`].
    pub fn run<R>(
        &self,
        subject: &str,
        op: impl FnOnce() -> Result<R, RenderError>,
    ) -> Result<Option<R>, FatalError> {
        match catch_panic(op) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_fatal() => {
                tracing::error!(element = %subject, error = %error, "fatal error, aborting");
                Err(FatalError::new(subject, error.to_string()))
            }
            Err(error) => {
                self.contained.set(self.contained.get() + 1);
                tracing::error!(element = %subject, error = %error, "failed to process element");
                Ok(None)
            }
        }
    }

    /// Number of failures contained so far.
    #[must_use]
    pub fn contained(&self) -> usize {
        self.contained.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes_through() {
        let boundary = ErrorBoundary::new();
        assert_eq!(boundary.run("part", || Ok(3)), Ok(Some(3)));
        assert_eq!(boundary.contained(), 0);
    }

    #[test]
    fn ordinary_errors_are_contained() {
        let boundary = ErrorBoundary::new();
        let outcome: Result<Option<()>, _> =
            boundary.run("part", || Err(RenderError::renderer("no layout")));
        assert_eq!(outcome, Ok(None));
        assert_eq!(boundary.contained(), 1);
    }

    #[test]
    fn panics_are_contained() {
        let boundary = ErrorBoundary::new();
        let shared = boundary.clone();
        let outcome: Result<Option<()>, _> = boundary.run("part", || panic!("renderer exploded"));
        assert_eq!(outcome, Ok(None));
        assert_eq!(shared.contained(), 1);
    }

    #[test]
    fn fatal_errors_escape() {
        let boundary = ErrorBoundary::new();
        let outcome: Result<Option<()>, _> =
            boundary.run("window (main)", || Err(RenderError::Fatal("no display".into())));
        let fatal = outcome.expect_err("fatal errors propagate");
        assert_eq!(fatal.subject(), "window (main)");
        assert_eq!(boundary.contained(), 0);
    }

    #[test]
    fn panic_messages_are_kept() {
        let error = catch_panic::<()>(|| panic!("index {} out of range", 4))
            .expect_err("panic becomes an error");
        assert!(matches!(error, RenderError::Panicked(message) if message == "index 4 out of range"));
    }
}
