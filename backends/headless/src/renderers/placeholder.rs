use trellis_core::{ElementId, UIElement, WidgetHandle};
use trellis_engine::{RenderError, Renderer, RenderingEngine, Toolkit};

use super::{build_widget, is_live, require_parent, widget_of};
use crate::{HeadlessToolkit, WidgetKind};

/// Renders placeholders and moves their shared element into them.
///
/// A shared element is displayed by one placeholder at a time. Rendering a
/// placeholder takes the shared element over from whichever placeholder showed
/// it before; removing the placeholder that currently shows it parks the shared
/// widget in limbo instead of disposing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl Renderer<HeadlessToolkit> for PlaceholderRenderer {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        let parent = require_parent(engine, element, parent)?;
        build_widget(self, engine, element, WidgetKind::Composite, Some(parent)).map(Some)
    }

    fn bind_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        placeholder: ElementId,
        _widget: WidgetHandle,
    ) -> Result<(), RenderError> {
        let Some(shared) = engine.tree().element(placeholder)?.placeholder_ref() else {
            return Ok(());
        };
        if !engine.tree().element(shared)?.to_be_rendered() {
            return Ok(());
        }
        let previous = engine.tree_mut().set_cur_shared_ref(shared, Some(placeholder))?;
        if let Some(previous) = previous
            && previous != placeholder
        {
            tracing::debug!(
                shared = %engine.tree().element(shared)?.describe(),
                "shared element moves to another placeholder"
            );
        }
        engine.create(shared)?;
        Ok(())
    }

    fn child_rendered(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        _placeholder: ElementId,
        shared: ElementId,
    ) -> Result<(), RenderError> {
        let visible = engine.tree().element(shared)?.visible();
        if let Some(widget) = widget_of(engine, shared) {
            engine.toolkit_mut().set_visible(widget, visible);
        }
        Ok(())
    }

    fn dispose_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        placeholder: ElementId,
    ) -> Result<(), RenderError> {
        let shared = engine
            .tree()
            .element(placeholder)?
            .placeholder_ref()
            .filter(|&shared| {
                engine.tree().get(shared).and_then(UIElement::cur_shared_ref) == Some(placeholder)
            });

        if let Some(shared) = shared
            && let Some(widget) = widget_of(engine, shared)
            && is_live(engine, widget)
        {
            let limbo = engine.toolkit_mut().limbo();
            engine.toolkit_mut().set_native_parent(widget, limbo)?;
            engine.toolkit_mut().set_visible(widget, false);
            // The shared element's contexts outlive the placeholder's branch.
            if let Some(owner) = engine.tree().parent(shared)
                && let Some(context) = engine.context_for(owner)
            {
                engine.reparent_contexts(shared, context)?;
            }
            tracing::debug!(shared = %engine.tree().element(shared)?.describe(), "parked shared element in limbo");
        }

        if let Some(widget) = widget_of(engine, placeholder) {
            engine.toolkit_mut().dispose(widget);
        }
        Ok(())
    }
}
