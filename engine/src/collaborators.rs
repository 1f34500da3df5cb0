//! Services the engine calls out to.

use core::time::Duration;
use std::rc::Rc;

use trellis_core::{ContextHierarchy, ContextId, Contribution};

use crate::{RenderError, Renderer, Toolkit};

/// Creates contributed objects and custom renderers from URIs.
pub trait ContributionFactory<T: Toolkit> {
    /// Creates the backing object of a part.
    ///
    /// `context` is the element's own context; implementations resolve their
    /// dependencies from it.
    ///
    /// # Errors
    ///
    /// Fails when the URI cannot be resolved or the object cannot be built.
    fn create(
        &self,
        uri: &str,
        contexts: &ContextHierarchy,
        context: Option<ContextId>,
    ) -> Result<Rc<dyn Contribution>, RenderError>;

    /// Creates a custom renderer.
    ///
    /// # Errors
    ///
    /// Fails when the URI cannot be resolved or the renderer cannot be built.
    fn create_renderer(
        &self,
        uri: &str,
        contexts: &ContextHierarchy,
        context: Option<ContextId>,
    ) -> Result<Rc<dyn Renderer<T>>, RenderError>;
}

/// Factory that knows no contributions at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContributions;

impl<T: Toolkit> ContributionFactory<T> for NoContributions {
    fn create(
        &self,
        uri: &str,
        _contexts: &ContextHierarchy,
        _context: Option<ContextId>,
    ) -> Result<Rc<dyn Contribution>, RenderError> {
        Err(RenderError::Contribution {
            uri: uri.into(),
            reason: "no contribution factory installed".into(),
        })
    }

    fn create_renderer(
        &self,
        uri: &str,
        _contexts: &ContextHierarchy,
        _context: Option<ContextId>,
    ) -> Result<Rc<dyn Renderer<T>>, RenderError> {
        Err(RenderError::Contribution {
            uri: uri.into(),
            reason: "no contribution factory installed".into(),
        })
    }
}

/// Applies styling to widgets after structural changes.
pub trait StylingEngine<T: Toolkit> {
    /// Styles `widget` and its native children.
    fn style(&self, toolkit: &mut T, widget: trellis_core::WidgetHandle);
}

/// What the run loop does after an uncaught error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Keep pumping events.
    Continue,
    /// Shut the toolkit down and leave the loop.
    Terminate,
}

/// Hooks into the run loop's idle and error paths.
pub trait IdleAdvisor<T: Toolkit> {
    /// Called when no native event is pending and deferred work is drained.
    fn on_idle(&mut self, toolkit: &mut T, sleep: Duration) {
        toolkit.sleep(sleep);
    }

    /// Called with errors that escaped native event dispatch.
    fn on_exception(&mut self, error: &RenderError) -> LoopControl {
        tracing::error!(error = %error, "unhandled error in the event loop");
        LoopControl::Continue
    }
}

/// Sleeps on idle and logs uncaught errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultIdleAdvisor;

impl<T: Toolkit> IdleAdvisor<T> for DefaultIdleAdvisor {}
