use thiserror::Error;
use trellis_core::WidgetHandle;
use trellis_engine::RenderError;

/// Errors raised by [`HeadlessToolkit`](crate::HeadlessToolkit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolkitError {
    /// The widget was disposed.
    #[error("{0} has been disposed")]
    Disposed(WidgetHandle),
    /// The widget was never created by this toolkit.
    #[error("{0} is unknown to this toolkit")]
    Unknown(WidgetHandle),
    /// Reparenting would make a widget its own ancestor.
    #[error("{0} cannot be moved below itself")]
    Cycle(WidgetHandle),
}

impl From<ToolkitError> for RenderError {
    fn from(error: ToolkitError) -> Self {
        Self::Toolkit(error.to_string())
    }
}
