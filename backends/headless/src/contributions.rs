//! URI-keyed contribution factory.

use core::fmt;
use std::{collections::HashMap, rc::Rc};

use trellis_core::{ContextHierarchy, ContextId, Contribution};
use trellis_engine::{ContributionFactory, RenderError, Renderer};

use crate::HeadlessToolkit;

type ObjectFactory =
    Box<dyn Fn(&ContextHierarchy, Option<ContextId>) -> Result<Rc<dyn Contribution>, RenderError>>;
type RendererFactory = Box<dyn Fn() -> Rc<dyn Renderer<HeadlessToolkit>>>;

/// Creates contributions and custom renderers from closures registered per URI.
#[derive(Default)]
pub struct Contributions {
    objects: HashMap<String, ObjectFactory>,
    renderers: HashMap<String, RendererFactory>,
}

impl fmt::Debug for Contributions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contributions")
            .field("objects", &self.objects.keys().collect::<Vec<_>>())
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Contributions {
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the object factory for `uri`.
    #[must_use]
    pub fn object(
        mut self,
        uri: impl Into<String>,
        factory: impl Fn(&ContextHierarchy, Option<ContextId>) -> Result<Rc<dyn Contribution>, RenderError>
        + 'static,
    ) -> Self {
        self.objects.insert(uri.into(), Box::new(factory));
        self
    }

    /// Registers the custom renderer factory for `uri`.
    #[must_use]
    pub fn renderer(
        mut self,
        uri: impl Into<String>,
        factory: impl Fn() -> Rc<dyn Renderer<HeadlessToolkit>> + 'static,
    ) -> Self {
        self.renderers.insert(uri.into(), Box::new(factory));
        self
    }
}

fn unknown(uri: &str) -> RenderError {
    RenderError::Contribution {
        uri: uri.into(),
        reason: "nothing registered under this URI".into(),
    }
}

impl ContributionFactory<HeadlessToolkit> for Contributions {
    fn create(
        &self,
        uri: &str,
        contexts: &ContextHierarchy,
        context: Option<ContextId>,
    ) -> Result<Rc<dyn Contribution>, RenderError> {
        let factory = self.objects.get(uri).ok_or_else(|| unknown(uri))?;
        factory(contexts, context)
    }

    fn create_renderer(
        &self,
        uri: &str,
        _contexts: &ContextHierarchy,
        _context: Option<ContextId>,
    ) -> Result<Rc<dyn Renderer<HeadlessToolkit>>, RenderError> {
        self.renderers
            .get(uri)
            .map(|factory| factory())
            .ok_or_else(|| unknown(uri))
    }
}
