//! Errors raised while rendering.

use thiserror::Error;
use trellis_core::{ContextError, KindTag, ModelError};

/// Failure of a single render, removal or reaction step.
///
/// Everything except [`RenderError::Fatal`] is contained by the engine's error
/// boundary: it is logged and the rest of the tree keeps rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The model rejected an operation.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The context hierarchy rejected an operation.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// No renderer is registered for the element's kind.
    #[error("no renderer registered for {}", .0.name())]
    NoRenderer(KindTag),

    /// A contribution or custom renderer could not be created.
    #[error("failed to create contribution `{uri}`: {reason}")]
    Contribution {
        /// URI of the contribution.
        uri: String,
        /// Reason reported by the factory.
        reason: String,
    },

    /// The toolkit refused an operation.
    #[error("toolkit error: {0}")]
    Toolkit(String),

    /// A renderer hook failed.
    #[error("renderer failed: {0}")]
    Renderer(String),

    /// A renderer hook panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// Unrecoverable; aborts the run loop.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl RenderError {
    /// Whether this error must propagate past the error boundary.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// A renderer failure with the given message.
    pub fn renderer(message: impl Into<String>) -> Self {
        Self::Renderer(message.into())
    }

    /// A toolkit failure with the given message.
    pub fn toolkit(message: impl Into<String>) -> Self {
        Self::Toolkit(message.into())
    }
}

/// A fatal failure that escaped the error boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fatal error while processing {subject}: {message}")]
pub struct FatalError {
    subject: String,
    message: String,
}

impl FatalError {
    /// Creates a fatal error for the given subject.
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// What was being processed when the error occurred.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The underlying message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<FatalError> for RenderError {
    fn from(error: FatalError) -> Self {
        Self::Fatal(error.to_string())
    }
}
