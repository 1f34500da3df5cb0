//! The renderer service provider interface.
//!
//! A renderer turns one kind of element into native widgets. The engine drives
//! every renderer through the same sequence:
//!
//! 1. [`create_widget`](Renderer::create_widget)
//! 2. [`bind_widget`](Renderer::bind_widget), after the engine recorded the widget
//! 3. [`hook_controller_logic`](Renderer::hook_controller_logic)
//! 4. [`process_contents`](Renderer::process_contents), containers only
//! 5. [`post_process`](Renderer::post_process)
//!
//! and tears down with [`dispose_widget`](Renderer::dispose_widget). Parents hear
//! about their children through [`child_rendered`](Renderer::child_rendered),
//! [`hide_child`](Renderer::hide_child) and [`show_child`](Renderer::show_child).
//!
//! Every hook receives the engine mutably so renderers can recurse into
//! [`RenderingEngine::create`] for nested content.

use trellis_core::{ElementId, WidgetHandle};

use crate::{NativeEvent, RenderError, RenderingEngine, Toolkit};

/// Persisted state key holding a style override for the element's widget.
pub const STYLE_OVERRIDE_KEY: &str = "style_override";

/// Produces and maintains native widgets for one kind of element.
#[allow(unused_variables)]
pub trait Renderer<T: Toolkit>: 'static {
    /// Creates the native widget for `element` under `parent`.
    ///
    /// Returning `Ok(None)` means the element has no widget (yet); the engine
    /// skips the remaining steps.
    ///
    /// # Errors
    ///
    /// Any error aborts rendering of this element only.
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<T>,
        element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError>;

    /// Runs after the engine recorded `widget` on the element.
    ///
    /// # Errors
    ///
    /// Any error aborts rendering of this element only.
    fn bind_widget(
        &self,
        engine: &mut RenderingEngine<T>,
        element: ElementId,
        widget: WidgetHandle,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    /// Installs listeners that translate native events into model changes.
    ///
    /// # Errors
    ///
    /// Any error aborts rendering of this element only.
    fn hook_controller_logic(
        &self,
        engine: &mut RenderingEngine<T>,
        element: ElementId,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    /// Renders the children of a container. Renders every renderable child by
    /// default.
    ///
    /// # Errors
    ///
    /// Propagates fatal errors from nested rendering.
    fn process_contents(
        &self,
        engine: &mut RenderingEngine<T>,
        container: ElementId,
    ) -> Result<(), RenderError> {
        engine.create_children(container)
    }

    /// Runs after the element and its contents are rendered.
    ///
    /// # Errors
    ///
    /// Any error aborts rendering of this element only.
    fn post_process(
        &self,
        engine: &mut RenderingEngine<T>,
        element: ElementId,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    /// Tears the element's widget down. Disposes the widget by default.
    ///
    /// # Errors
    ///
    /// Any error aborts removal of this element only.
    fn dispose_widget(
        &self,
        engine: &mut RenderingEngine<T>,
        element: ElementId,
    ) -> Result<(), RenderError> {
        if let Some(widget) = engine.tree().element(element)?.widget() {
            engine.toolkit_mut().dispose(widget);
        }
        Ok(())
    }

    /// `child` of `container` has been rendered or re-attached.
    ///
    /// # Errors
    ///
    /// Any error is contained to the child's rendering.
    fn child_rendered(
        &self,
        engine: &mut RenderingEngine<T>,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    /// `child` of `container` is about to be removed.
    ///
    /// # Errors
    ///
    /// Any error is contained to the child's removal.
    fn hide_child(
        &self,
        engine: &mut RenderingEngine<T>,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    /// `child` became the selected child of `container`.
    ///
    /// # Errors
    ///
    /// Any error is contained to the selection change.
    fn show_child(
        &self,
        engine: &mut RenderingEngine<T>,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    /// The native widget `child` should be parented into. Called on the
    /// renderer of `child`'s logical parent; defaults to that parent's widget.
    fn get_ui_container(&self, engine: &RenderingEngine<T>, child: ElementId) -> Option<WidgetHandle> {
        let tree = engine.tree();
        tree.logical_parent(child)
            .and_then(|parent| tree.get(parent))
            .and_then(|parent| parent.widget())
    }

    /// Whether focusing the element should give its widget keyboard focus.
    fn requires_focus(&self, engine: &RenderingEngine<T>, element: ElementId) -> bool {
        true
    }

    /// Style bits replacing the renderer's default style for this element.
    fn get_style_override(&self, engine: &RenderingEngine<T>, element: ElementId) -> Option<i32> {
        engine
            .tree()
            .get(element)?
            .persisted_state()
            .get(STYLE_OVERRIDE_KEY)?
            .parse()
            .ok()
    }

    /// The image to show for the element.
    fn get_image(&self, engine: &RenderingEngine<T>, element: ElementId) -> Option<String> {
        engine.tree().get(element)?.icon_uri().map(String::from)
    }

    /// Handles a native event targeting the element's widget.
    ///
    /// # Errors
    ///
    /// Errors are handed to the idle advisor's exception hook.
    fn handle_event(
        &self,
        engine: &mut RenderingEngine<T>,
        element: ElementId,
        event: &NativeEvent,
    ) -> Result<(), RenderError> {
        Ok(())
    }
}
