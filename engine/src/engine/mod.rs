//! The rendering engine.
//!
//! [`RenderingEngine`] owns the model, the context hierarchy, the toolkit and
//! the renderer registry. It renders elements on demand, tears them down,
//! reacts to model events and pumps the toolkit's event loop.

mod reactions;
mod run;

use core::fmt;
use std::{
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use trellis_core::{
    ContextHierarchy, ContextId, Contribution, ElementId, ElementTree, KindTag, ModelError,
    UIElement, WidgetHandle, keys, value,
};

pub use run::ExitCode;

use crate::{
    ContributionFactory, DefaultIdleAdvisor, EngineConfig, ErrorBoundary, FatalError,
    IdleAdvisor, NoContributions, RenderError, Renderer, RendererRegistry, StylingEngine, Toolkit,
    catch_panic,
};

type Deferred<T> = Box<dyn FnOnce(&mut RenderingEngine<T>) -> Result<(), RenderError>>;

/// Keeps native widgets and contexts in sync with an [`ElementTree`].
pub struct RenderingEngine<T: Toolkit> {
    tree: ElementTree,
    contexts: ContextHierarchy,
    toolkit: T,
    registry: RendererRegistry<T>,
    contributions: Rc<dyn ContributionFactory<T>>,
    styling: Option<Box<dyn StylingEngine<T>>>,
    idle: Box<dyn IdleAdvisor<T>>,
    boundary: ErrorBoundary,
    config: EngineConfig,
    removing: Option<ElementId>,
    widget_index: HashMap<WidgetHandle, ElementId>,
    deferred: VecDeque<Deferred<T>>,
    running: bool,
    exit: ExitCode,
    root: Option<ElementId>,
}

impl<T: Toolkit> fmt::Debug for RenderingEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingEngine")
            .field("elements", &self.tree.len())
            .field("contexts", &self.contexts.len())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("removing", &self.removing)
            .field("deferred", &self.deferred.len())
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RenderingEngine`].
pub struct EngineBuilder<T: Toolkit> {
    toolkit: T,
    tree: ElementTree,
    contexts: ContextHierarchy,
    registry: RendererRegistry<T>,
    contributions: Rc<dyn ContributionFactory<T>>,
    styling: Option<Box<dyn StylingEngine<T>>>,
    idle: Box<dyn IdleAdvisor<T>>,
    config: EngineConfig,
}

impl<T: Toolkit> fmt::Debug for EngineBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("elements", &self.tree.len())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Toolkit> EngineBuilder<T> {
    /// Uses a pre-built model.
    #[must_use]
    pub fn tree(mut self, tree: ElementTree) -> Self {
        self.tree = tree;
        self
    }

    /// Uses a pre-built context hierarchy.
    #[must_use]
    pub fn contexts(mut self, contexts: ContextHierarchy) -> Self {
        self.contexts = contexts;
        self
    }

    /// Sets the renderer registry.
    #[must_use]
    pub fn registry(mut self, registry: RendererRegistry<T>) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the factory for contributed objects and custom renderers.
    #[must_use]
    pub fn contributions(mut self, factory: impl ContributionFactory<T> + 'static) -> Self {
        self.contributions = Rc::new(factory);
        self
    }

    /// Sets the styling engine.
    #[must_use]
    pub fn styling(mut self, styling: impl StylingEngine<T> + 'static) -> Self {
        self.styling = Some(Box::new(styling));
        self
    }

    /// Sets the idle advisor.
    #[must_use]
    pub fn idle_advisor(mut self, advisor: impl IdleAdvisor<T> + 'static) -> Self {
        self.idle = Box::new(advisor);
        self
    }

    /// Sets the engine configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> RenderingEngine<T> {
        let mut registry = self.registry;
        registry.set_custom_renderer_key(self.config.custom_renderer_key.clone());
        RenderingEngine {
            tree: self.tree,
            contexts: self.contexts,
            toolkit: self.toolkit,
            registry,
            contributions: self.contributions,
            styling: self.styling,
            idle: self.idle,
            boundary: ErrorBoundary::new(),
            config: self.config,
            removing: None,
            widget_index: HashMap::new(),
            deferred: VecDeque::new(),
            running: false,
            exit: ExitCode::Ok,
            root: None,
        }
    }
}

impl<T: Toolkit> RenderingEngine<T> {
    /// Starts building an engine around `toolkit`.
    #[must_use]
    pub fn builder(toolkit: T) -> EngineBuilder<T> {
        EngineBuilder {
            toolkit,
            tree: ElementTree::new(),
            contexts: ContextHierarchy::new(),
            registry: RendererRegistry::new(),
            contributions: Rc::new(NoContributions),
            styling: None,
            idle: Box::new(DefaultIdleAdvisor),
            config: EngineConfig::default(),
        }
    }

    /// An engine with default collaborators.
    #[must_use]
    pub fn new(toolkit: T, registry: RendererRegistry<T>) -> Self {
        Self::builder(toolkit).registry(registry).build()
    }

    /// The model.
    #[must_use]
    pub const fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Mutable access to the model.
    ///
    /// Events raised by mutations are handled on the next
    /// [`process_model_events`](Self::process_model_events).
    pub const fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    /// The context hierarchy.
    #[must_use]
    pub const fn contexts(&self) -> &ContextHierarchy {
        &self.contexts
    }

    /// Mutable access to the context hierarchy.
    pub const fn contexts_mut(&mut self) -> &mut ContextHierarchy {
        &mut self.contexts
    }

    /// The toolkit.
    #[must_use]
    pub const fn toolkit(&self) -> &T {
        &self.toolkit
    }

    /// Mutable access to the toolkit.
    pub const fn toolkit_mut(&mut self) -> &mut T {
        &mut self.toolkit
    }

    /// The renderer registry.
    #[must_use]
    pub const fn registry(&self) -> &RendererRegistry<T> {
        &self.registry
    }

    /// Mutable access to the renderer registry.
    pub const fn registry_mut(&mut self) -> &mut RendererRegistry<T> {
        &mut self.registry
    }

    /// The contribution factory.
    #[must_use]
    pub fn contributions(&self) -> Rc<dyn ContributionFactory<T>> {
        Rc::clone(&self.contributions)
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The root passed to [`run`](Self::run), once running.
    #[must_use]
    pub const fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// The element whose removal is in progress, if any.
    #[must_use]
    pub const fn removal_in_flight(&self) -> Option<ElementId> {
        self.removing
    }

    /// Number of failures the error boundary contained so far.
    #[must_use]
    pub fn contained_failures(&self) -> usize {
        self.boundary.contained()
    }

    /// The element rendered into `widget`.
    #[must_use]
    pub fn element_for_widget(&self, widget: WidgetHandle) -> Option<ElementId> {
        self.widget_index.get(&widget).copied()
    }

    /// The renderer that rendered `element`.
    #[must_use]
    pub fn renderer_of(&self, element: ElementId) -> Option<Rc<dyn Renderer<T>>> {
        self.tree
            .get(element)?
            .renderer()
            .and_then(|id| self.registry.get(id))
    }

    /// The context of `element`, or of its nearest logical ancestor with one.
    #[must_use]
    pub fn context_for(&self, element: ElementId) -> Option<ContextId> {
        self.tree
            .get(element)?
            .context()
            .or_else(|| self.parent_context(element))
    }

    /// The context of the nearest logical ancestor of `element` that has one.
    #[must_use]
    pub fn parent_context(&self, element: ElementId) -> Option<ContextId> {
        self.tree
            .ancestors(element)
            .find_map(|ancestor| self.tree.get(ancestor)?.context())
    }

    fn describe(&self, element: ElementId) -> String {
        self.tree
            .get(element)
            .map_or_else(|| format!("{element:?}"), UIElement::describe)
    }

    fn element_mut(&mut self, element: ElementId) -> Result<&mut UIElement, RenderError> {
        self.tree
            .get_mut(element)
            .ok_or(RenderError::Model(ModelError::UnknownElement(element)))
    }

    /// Whether children of `element` can be rendered right now.
    fn is_displayed(&self, element: ElementId) -> bool {
        self.tree.get(element).is_some_and(|el| {
            el.widget().is_some()
                || (el.kind_tag() == KindTag::Application && el.context().is_some())
        })
    }

    /// Renders `element` under its logical parent.
    ///
    /// The parent widget comes from the parent renderer's
    /// [`get_ui_container`](Renderer::get_ui_container), the parent context from
    /// the nearest ancestor with a context.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned; everything else is contained and yields
    /// `Ok(None)`.
    pub fn create(&mut self, element: ElementId) -> Result<Option<WidgetHandle>, FatalError> {
        let parent_widget = self.tree.logical_parent(element).and_then(|parent| {
            self.renderer_of(parent)
                .and_then(|renderer| renderer.get_ui_container(self, element))
        });
        let parent_context = self.parent_context(element);
        self.create_in(element, parent_widget, parent_context)
    }

    /// Renders `element` under an explicit parent widget and parent context.
    ///
    /// Elements that are not to be rendered, and any element while a removal is
    /// in flight, are skipped. An element that already has a widget is
    /// re-attached instead of rendered again. When a hook fails after the
    /// widget exists, the element is torn down again and stays unrendered.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned; everything else is contained and yields
    /// `Ok(None)`.
    pub fn create_in(
        &mut self,
        element: ElementId,
        parent_widget: Option<WidgetHandle>,
        parent_context: Option<ContextId>,
    ) -> Result<Option<WidgetHandle>, FatalError> {
        let Some(el) = self.tree.get(element) else {
            tracing::warn!(element = ?element, "asked to render an unknown element");
            return Ok(None);
        };
        if !el.to_be_rendered() {
            return Ok(None);
        }
        if let Some(removing) = self.removing {
            tracing::debug!(
                element = %el.describe(),
                removing = %self.describe(removing),
                "creation suppressed while a removal is in flight"
            );
            return Ok(None);
        }

        let subject = el.describe();
        let had_context = el.context().is_some();
        let had_widget = el.widget().is_some();
        let boundary = self.boundary.clone();
        let outcome = boundary.run(&subject, || {
            self.render(element, parent_widget, parent_context)
        });

        // A hook failed after the widget was recorded: undo the partial render.
        let mut discarded = Ok(());
        if !had_widget
            && !matches!(outcome, Ok(Some(Some(_))))
            && self.tree.get(element).and_then(UIElement::widget).is_some()
        {
            tracing::debug!(element = %subject, "discarding partially rendered element");
            discarded = self.remove(element);
        }

        let rendered = self.tree.get(element).and_then(UIElement::widget).is_some();
        if !rendered && !had_context {
            self.rollback_context(element);
        }
        let widget = outcome?.flatten();
        discarded?;
        Ok(widget)
    }

    fn render(
        &mut self,
        element: ElementId,
        parent_widget: Option<WidgetHandle>,
        parent_context: Option<ContextId>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        if let Some(widget) = self.tree.element(element)?.widget() {
            self.reattach(element, widget, parent_widget, parent_context)?;
            return Ok(Some(widget));
        }

        let el = self.tree.element(element)?;
        if el.is_context_bearing() && el.context().is_none() {
            self.create_context(element, parent_context)?;
        }
        // Context creation may have triggered rendering of this very element.
        if let Some(widget) = self.tree.element(element)?.widget() {
            self.reattach(element, widget, parent_widget, parent_context)?;
            return Ok(Some(widget));
        }

        let (renderer_id, renderer) = self.resolve_renderer(element)?;
        let Some(widget) = renderer.create_widget(self, element, parent_widget)? else {
            tracing::debug!(element = %self.describe(element), "renderer produced no widget");
            return Ok(None);
        };

        let el = self.element_mut(element)?;
        el.set_widget(Some(widget));
        el.set_renderer(Some(renderer_id));
        self.widget_index.insert(widget, element);

        renderer.bind_widget(self, element, widget)?;
        renderer.hook_controller_logic(self, element)?;
        if self.tree.element(element)?.is_container() {
            renderer.process_contents(self, element)?;
        }
        renderer.post_process(self, element)?;
        self.notify_rendered(element)?;

        tracing::debug!(element = %self.describe(element), widget = %widget, "rendered");
        Ok(Some(widget))
    }

    fn resolve_renderer(
        &mut self,
        element: ElementId,
    ) -> Result<(trellis_core::RendererId, Rc<dyn Renderer<T>>), RenderError> {
        let context = self.context_for(element);
        let el = self.tree.element(element)?;
        self.registry
            .resolve(el, self.contributions.as_ref(), &self.contexts, context)
    }

    /// Puts an existing widget back under `parent_widget` and its contexts under
    /// `parent_context`.
    fn reattach(
        &mut self,
        element: ElementId,
        widget: WidgetHandle,
        parent_widget: Option<WidgetHandle>,
        parent_context: Option<ContextId>,
    ) -> Result<(), RenderError> {
        if self.tree.element(element)?.visible() {
            self.toolkit.set_visible(widget, true);
        }
        if let Some(parent_widget) = parent_widget
            && self.toolkit.native_parent(widget) != Some(parent_widget)
        {
            self.toolkit.release_slot(widget);
            self.toolkit.set_native_parent(widget, parent_widget)?;
        }
        if let Some(parent_context) = parent_context {
            self.reparent_contexts(element, parent_context)?;
        }
        tracing::trace!(element = %self.describe(element), widget = %widget, "re-attached");
        self.notify_rendered(element)
    }

    /// Moves the contexts owned by `element` under `parent_context`.
    ///
    /// An element without a context of its own moves the contexts of its
    /// nearest context-bearing descendants.
    ///
    /// # Errors
    ///
    /// Fails when `parent_context` is disposed or would become its own ancestor.
    pub fn reparent_contexts(
        &mut self,
        element: ElementId,
        parent_context: ContextId,
    ) -> Result<(), RenderError> {
        for context in self.owned_contexts(element) {
            if context == parent_context || !self.contexts.contains(context) {
                continue;
            }
            if self.contexts.parent(context)? != Some(parent_context) {
                self.contexts.set_parent(context, parent_context)?;
            }
        }
        Ok(())
    }

    fn owned_contexts(&self, element: ElementId) -> Vec<ContextId> {
        let mut owned = Vec::new();
        let mut pending = vec![element];
        while let Some(next) = pending.pop() {
            let Some(el) = self.tree.get(next) else {
                continue;
            };
            if let Some(context) = el.context() {
                owned.push(context);
                continue;
            }
            pending.extend(self.display_children(next));
        }
        owned
    }

    /// Everything displayed below `element`: children, window extras and the
    /// shared element of a placeholder currently showing it.
    fn display_children(&self, element: ElementId) -> Vec<ElementId> {
        let Some(el) = self.tree.get(element) else {
            return Vec::new();
        };
        let mut children = el.children().to_vec();
        if let Some(window) = el.window_data() {
            children.extend_from_slice(window.windows());
            children.extend_from_slice(window.trim_bars());
            children.extend(window.main_menu());
        }
        if let Some(shared) = el.placeholder_ref()
            && self.tree.get(shared).and_then(UIElement::cur_shared_ref) == Some(element)
        {
            children.push(shared);
        }
        children
    }

    fn create_context(
        &mut self,
        element: ElementId,
        parent_context: Option<ContextId>,
    ) -> Result<ContextId, RenderError> {
        let el = self.tree.element(element)?;
        let name = format!("{} context", el.describe());
        let variables = el.variables().to_vec();
        let properties = el.properties().clone();

        let context = match parent_context {
            Some(parent) => self.contexts.create_child(parent, name)?,
            None => self.contexts.create_root(name),
        };
        self.element_mut(element)?.set_context(Some(context));
        self.register_element(context, element)?;
        for variable in variables {
            self.contexts.declare_modifiable(context, variable)?;
        }
        for (key, property) in properties {
            self.contexts.set(context, key, value(property))?;
        }
        tracing::debug!(element = %self.describe(element), context = ?context, "created context");
        Ok(context)
    }

    /// Registers `element` on `context` under the generic element key and the
    /// key of its kind.
    fn register_element(&mut self, context: ContextId, element: ElementId) -> Result<(), RenderError> {
        self.contexts.set(context, keys::ELEMENT, value(element))?;
        let kind_key = match self.tree.element(element)?.kind_tag() {
            KindTag::Application => Some(keys::APPLICATION),
            KindTag::Window => Some(keys::WINDOW),
            KindTag::Part => Some(keys::PART),
            KindTag::Perspective => Some(keys::PERSPECTIVE),
            _ => None,
        };
        if let Some(kind_key) = kind_key {
            self.contexts.set(context, kind_key, value(element))?;
        }
        Ok(())
    }

    fn rollback_context(&mut self, element: ElementId) {
        let Some(context) = self.tree.get_mut(element).and_then(|el| {
            let context = el.context();
            el.set_context(None);
            context
        }) else {
            return;
        };
        if self.contexts.contains(context)
            && let Err(error) = self.contexts.dispose(context)
        {
            tracing::warn!(element = %self.describe(element), error = %error, "failed to roll back context");
        }
        tracing::debug!(element = %self.describe(element), "rolled back context of unrendered element");
    }

    fn notify_rendered(&mut self, element: ElementId) -> Result<(), RenderError> {
        if let Some(parent) = self.tree.logical_parent(element)
            && let Some(renderer) = self.renderer_of(parent)
        {
            renderer.child_rendered(self, parent, element)?;
        }
        Ok(())
    }

    /// Renders every renderable child of `container`, in model order.
    ///
    /// # Errors
    ///
    /// Propagates fatal errors only.
    pub fn create_children(&mut self, container: ElementId) -> Result<(), RenderError> {
        let children = self.tree.children(container).to_vec();
        for child in children {
            if self.tree.get(child).is_some_and(UIElement::to_be_rendered) {
                self.create(child)?;
            }
        }
        Ok(())
    }

    /// Creates the contributed object of `element` through the contribution
    /// factory and attaches it.
    ///
    /// # Errors
    ///
    /// Fails when the element has no contribution URI or the factory fails.
    /// A panicking factory is reported as [`RenderError::Panicked`].
    pub fn create_contribution(
        &mut self,
        element: ElementId,
    ) -> Result<Rc<dyn Contribution>, RenderError> {
        let uri = self
            .tree
            .element(element)?
            .leaf()
            .and_then(|leaf| leaf.contribution_uri())
            .map(String::from)
            .ok_or_else(|| RenderError::Contribution {
                uri: String::new(),
                reason: format!("{} has no contribution URI", self.describe(element)),
            })?;
        let context = self.context_for(element);
        let factory = Rc::clone(&self.contributions);
        let object = catch_panic(|| factory.create(&uri, &self.contexts, context))?;
        self.element_mut(element)?.set_object(Some(Rc::clone(&object)));
        tracing::debug!(element = %self.describe(element), uri = %uri, "created contribution");
        Ok(object)
    }

    /// Tears down the widgets and contexts of `element` and its subtree.
    ///
    /// While a removal is in flight, any attempt to render is ignored.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned.
    pub fn remove(&mut self, element: ElementId) -> Result<(), FatalError> {
        let Some(el) = self.tree.get(element) else {
            return Ok(());
        };
        let subject = el.describe();
        let outermost = self.removing.is_none();
        if outermost {
            self.removing = Some(element);
        }
        let boundary = self.boundary.clone();
        let outcome = boundary.run(&subject, || self.unrender(element));
        if outermost {
            self.removing = None;
        }
        outcome.map(drop)
    }

    fn unrender(&mut self, element: ElementId) -> Result<(), RenderError> {
        if let Some(parent) = self.tree.logical_parent(element)
            && let Some(renderer) = self.renderer_of(parent)
        {
            renderer.hide_child(self, parent, element)?;
        }

        if let Some(renderer) = self.renderer_of(element) {
            self.remove_descendants(element)?;
            self.release_contribution(element)?;
            renderer.dispose_widget(self, element)?;

            let el = self.element_mut(element)?;
            let widget = el.widget();
            el.set_widget(None);
            el.set_renderer(None);
            if let Some(widget) = widget {
                self.widget_index.remove(&widget);
            }
            self.dispose_context(element)?;
            tracing::debug!(element = %self.describe(element), "removed");
        }

        if let Some(shared) = self.tree.element(element)?.placeholder_ref()
            && self.tree.get(shared).and_then(UIElement::cur_shared_ref) == Some(element)
        {
            self.tree.set_cur_shared_ref(shared, None)?;
        }
        Ok(())
    }

    fn remove_descendants(&mut self, element: ElementId) -> Result<(), RenderError> {
        let el = self.tree.element(element)?;
        let children = el.children().to_vec();
        let selected = el.selected().filter(|selected| children.contains(selected));
        let extras: Vec<ElementId> = el
            .window_data()
            .map(|window| {
                window
                    .windows()
                    .iter()
                    .chain(window.trim_bars())
                    .chain(window.shared_elements())
                    .copied()
                    .chain(window.main_menu())
                    .collect()
            })
            .unwrap_or_default();

        for &child in children.iter().filter(|&&child| Some(child) != selected) {
            self.remove(child)?;
        }
        if let Some(selected) = selected {
            self.remove(selected)?;
        }
        for extra in extras {
            self.remove(extra)?;
        }
        Ok(())
    }

    fn release_contribution(&mut self, element: ElementId) -> Result<(), RenderError> {
        let el = self.element_mut(element)?;
        if !el.is_contribution_bearing() {
            return Ok(());
        }
        if let Some(object) = el.take_object() {
            object.persist_state(el.persisted_state_mut());
            object.on_dispose();
        }
        Ok(())
    }

    fn dispose_context(&mut self, element: ElementId) -> Result<(), RenderError> {
        let el = self.element_mut(element)?;
        if !el.is_context_bearing() {
            return Ok(());
        }
        let Some(context) = el.context() else {
            return Ok(());
        };
        el.set_context(None);
        if self.contexts.contains(context) {
            self.contexts.dispose(context)?;
        }
        Ok(())
    }

    /// Activates the context branch of `element` and focuses its widget when
    /// its renderer asks for it. Unrendered elements are ignored.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned.
    pub fn focus(&mut self, element: ElementId) -> Result<(), FatalError> {
        let subject = self.describe(element);
        let boundary = self.boundary.clone();
        boundary
            .run(&subject, || {
                let Some(renderer) = self.renderer_of(element) else {
                    tracing::debug!(element = %subject, "ignoring focus of unrendered element");
                    return Ok(());
                };
                if let Some(context) = self.context_for(element) {
                    self.contexts.activate(context)?;
                }
                if renderer.requires_focus(self, element)
                    && let Some(widget) = self.tree.element(element)?.widget()
                    && !self.toolkit.set_focus(widget)
                {
                    tracing::debug!(element = %subject, "widget refused focus");
                }
                Ok(())
            })
            .map(drop)
    }
}
