use trellis_core::{ElementId, UIElement, WidgetHandle};
use trellis_engine::{
    NativeEvent, NativeEventKind, RenderError, Renderer, RenderingEngine, Toolkit,
};

use super::{build_widget, is_live, require_parent, widget_of};
use crate::{HeadlessToolkit, WidgetKind};

/// Renders stacks into tab folders.
///
/// Only the selected child is rendered eagerly; other children are rendered
/// the first time they are selected and stay rendered afterwards. A stack
/// without a selection selects its first renderable child.
#[derive(Debug, Default, Clone, Copy)]
pub struct StackRenderer;

impl StackRenderer {
    fn sync_visibility(engine: &mut RenderingEngine<HeadlessToolkit>, stack: ElementId) {
        let selected = engine.tree().get(stack).and_then(UIElement::selected);
        let children = engine.tree().children(stack).to_vec();
        for child in children {
            if let Some(widget) = widget_of(engine, child)
                && is_live(engine, widget)
            {
                engine
                    .toolkit_mut()
                    .set_visible(widget, Some(child) == selected);
            }
        }
    }
}

impl Renderer<HeadlessToolkit> for StackRenderer {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        let parent = require_parent(engine, element, parent)?;
        build_widget(self, engine, element, WidgetKind::TabFolder, Some(parent)).map(Some)
    }

    fn hook_controller_logic(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
    ) -> Result<(), RenderError> {
        if let Some(folder) = widget_of(engine, element) {
            engine.toolkit_mut().enable_events(folder);
        }
        Ok(())
    }

    fn process_contents(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        stack: ElementId,
    ) -> Result<(), RenderError> {
        let el = engine.tree().element(stack)?;
        let children = el.children().to_vec();
        let mut selected = el.selected();
        if selected.is_none() {
            selected = children
                .iter()
                .copied()
                .find(|&child| engine.tree().get(child).is_some_and(UIElement::to_be_rendered));
            if selected.is_some() {
                engine.tree_mut().set_selected(stack, selected)?;
            }
        }

        for child in children {
            if Some(child) == selected || widget_of(engine, child).is_some() {
                engine.create(child)?;
            }
        }
        Ok(())
    }

    fn child_rendered(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        stack: ElementId,
        _child: ElementId,
    ) -> Result<(), RenderError> {
        Self::sync_visibility(engine, stack);
        Ok(())
    }

    fn show_child(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        stack: ElementId,
        _child: ElementId,
    ) -> Result<(), RenderError> {
        Self::sync_visibility(engine, stack);
        if let Some(folder) = widget_of(engine, stack) {
            engine.toolkit_mut().layout(folder);
        }
        Ok(())
    }

    fn hide_child(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        _stack: ElementId,
        child: ElementId,
    ) -> Result<(), RenderError> {
        if let Some(widget) = widget_of(engine, child)
            && is_live(engine, widget)
        {
            engine.toolkit_mut().set_visible(widget, false);
        }
        Ok(())
    }

    fn handle_event(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        stack: ElementId,
        event: &NativeEvent,
    ) -> Result<(), RenderError> {
        if let NativeEventKind::Selected(index) = event.kind
            && let Some(&child) = engine.tree().children(stack).get(index)
        {
            engine.tree_mut().set_selected(stack, Some(child))?;
        }
        Ok(())
    }

    fn requires_focus(&self, _engine: &RenderingEngine<HeadlessToolkit>, _element: ElementId) -> bool {
        false
    }
}
