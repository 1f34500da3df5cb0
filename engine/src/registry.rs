//! Renderer lookup.
//!
//! Default renderers are keyed by [`KindTag`]. An element can ask for a custom
//! renderer by storing a contribution URI under the configured persisted state
//! key; custom renderers are created once per URI and shared afterwards.

use core::fmt;
use std::{collections::HashMap, rc::Rc};

use trellis_core::{ContextHierarchy, ContextId, KindTag, RendererId, UIElement};

use crate::{ContributionFactory, RenderError, Renderer, Toolkit};

/// Persisted state key naming an element's custom renderer, unless configured
/// otherwise.
pub const DEFAULT_CUSTOM_RENDERER_KEY: &str = "custom_renderer";

/// Owns every renderer instance and resolves elements to them.
pub struct RendererRegistry<T: Toolkit> {
    defaults: HashMap<KindTag, Rc<dyn Renderer<T>>>,
    custom: HashMap<String, Rc<dyn Renderer<T>>>,
    custom_key: String,
}

impl<T: Toolkit> fmt::Debug for RendererRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.defaults.keys().copied().collect();
        kinds.sort_unstable();
        f.debug_struct("RendererRegistry")
            .field("kinds", &kinds)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .field("custom_key", &self.custom_key)
            .finish()
    }
}

impl<T: Toolkit> Default for RendererRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Toolkit> RendererRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            defaults: HashMap::new(),
            custom: HashMap::new(),
            custom_key: DEFAULT_CUSTOM_RENDERER_KEY.into(),
        }
    }

    /// Registers the default renderer for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: KindTag, renderer: impl Renderer<T>) -> &mut Self {
        self.register_rc(kind, Rc::new(renderer))
    }

    /// Registers a shared renderer instance for `kind`.
    pub fn register_rc(&mut self, kind: KindTag, renderer: Rc<dyn Renderer<T>>) -> &mut Self {
        self.defaults.insert(kind, renderer);
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, kind: KindTag, renderer: impl Renderer<T>) -> Self {
        self.register(kind, renderer);
        self
    }

    /// Changes the persisted state key that names custom renderers.
    pub fn set_custom_renderer_key(&mut self, key: impl Into<String>) {
        self.custom_key = key.into();
    }

    /// The persisted state key that names custom renderers.
    #[must_use]
    pub fn custom_renderer_key(&self) -> &str {
        &self.custom_key
    }

    /// Whether a default renderer is registered for `kind`.
    #[must_use]
    pub fn has_default(&self, kind: KindTag) -> bool {
        self.defaults.contains_key(&kind)
    }

    /// Number of custom renderers created so far.
    #[must_use]
    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    /// The renderer instance an element recorded.
    #[must_use]
    pub fn get(&self, id: &RendererId) -> Option<Rc<dyn Renderer<T>>> {
        match id {
            RendererId::Kind(kind) => self.defaults.get(kind),
            RendererId::Custom(uri) => self.custom.get(uri),
        }
        .cloned()
    }

    /// Finds the renderer for `element`, creating a custom renderer through
    /// `factory` the first time its URI is seen.
    ///
    /// # Errors
    ///
    /// Fails when no default renderer exists for the kind or the factory cannot
    /// create the custom renderer.
    pub fn resolve(
        &mut self,
        element: &UIElement,
        factory: &dyn ContributionFactory<T>,
        contexts: &ContextHierarchy,
        context: Option<ContextId>,
    ) -> Result<(RendererId, Rc<dyn Renderer<T>>), RenderError> {
        if let Some(uri) = element.persisted_state().get(&self.custom_key) {
            let renderer = match self.custom.get(uri) {
                Some(renderer) => Rc::clone(renderer),
                None => {
                    let renderer = factory.create_renderer(uri, contexts, context)?;
                    tracing::debug!(uri = %uri, "created custom renderer");
                    self.custom.insert(uri.clone(), Rc::clone(&renderer));
                    renderer
                }
            };
            return Ok((RendererId::Custom(uri.clone()), renderer));
        }

        let kind = element.kind_tag();
        self.defaults
            .get(&kind)
            .map(|renderer| (RendererId::Kind(kind), Rc::clone(renderer)))
            .ok_or(RenderError::NoRenderer(kind))
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use trellis_core::{Contribution, ElementId, WidgetHandle};

    use super::*;
    use crate::{RenderingEngine, testing::TestToolkit};

    #[derive(Debug)]
    struct Fixed;

    impl Renderer<TestToolkit> for Fixed {
        fn create_widget(
            &self,
            _engine: &mut RenderingEngine<TestToolkit>,
            _element: ElementId,
            _parent: Option<WidgetHandle>,
        ) -> Result<Option<WidgetHandle>, RenderError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        renderers: Cell<usize>,
    }

    impl ContributionFactory<TestToolkit> for CountingFactory {
        fn create(
            &self,
            uri: &str,
            _contexts: &ContextHierarchy,
            _context: Option<ContextId>,
        ) -> Result<Rc<dyn Contribution>, RenderError> {
            Err(RenderError::Contribution {
                uri: uri.into(),
                reason: "unused".into(),
            })
        }

        fn create_renderer(
            &self,
            _uri: &str,
            _contexts: &ContextHierarchy,
            _context: Option<ContextId>,
        ) -> Result<Rc<dyn Renderer<TestToolkit>>, RenderError> {
            self.renderers.set(self.renderers.get() + 1);
            Ok(Rc::new(Fixed))
        }
    }

    #[test]
    fn resolves_defaults_by_kind() {
        let mut registry = RendererRegistry::new().with(KindTag::Sash, Fixed);
        let contexts = ContextHierarchy::new();
        let sash = UIElement::container(trellis_core::ContainerStyle::Sash);
        let (id, _) = registry
            .resolve(&sash, &CountingFactory::default(), &contexts, None)
            .expect("sash renderer");
        assert_eq!(id, RendererId::Kind(KindTag::Sash));

        let menu = UIElement::menu();
        let missing = registry.resolve(&menu, &CountingFactory::default(), &contexts, None);
        assert!(matches!(missing, Err(RenderError::NoRenderer(KindTag::Menu))));
    }

    #[test]
    fn custom_renderers_are_created_once_per_uri() {
        let mut registry = RendererRegistry::<TestToolkit>::new();
        let factory = CountingFactory::default();
        let contexts = ContextHierarchy::new();
        let a = UIElement::part("bundle://a").with_persisted("custom_renderer", "bundle://R");
        let b = UIElement::part("bundle://b").with_persisted("custom_renderer", "bundle://R");

        let (first_id, first) = registry
            .resolve(&a, &factory, &contexts, None)
            .expect("custom renderer");
        let (second_id, second) = registry
            .resolve(&b, &factory, &contexts, None)
            .expect("cached renderer");

        assert_eq!(factory.renderers.get(), 1);
        assert_eq!(first_id, RendererId::Custom("bundle://R".into()));
        assert_eq!(first_id, second_id);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(registry.custom_count(), 1);
        assert!(registry.get(&first_id).is_some());
    }

    #[test]
    fn custom_renderer_key_is_configurable() {
        let mut registry = RendererRegistry::<TestToolkit>::new().with(KindTag::Part, Fixed);
        registry.set_custom_renderer_key("renderer");
        let factory = CountingFactory::default();
        let contexts = ContextHierarchy::new();
        let part = UIElement::part("bundle://a").with_persisted("custom_renderer", "bundle://R");

        let (id, _) = registry
            .resolve(&part, &factory, &contexts, None)
            .expect("default renderer");
        assert_eq!(id, RendererId::Kind(KindTag::Part));
        assert_eq!(factory.renderers.get(), 0);
    }
}
