use trellis_core::{ElementId, WidgetHandle, downcast, value};
use trellis_engine::{NativeEvent, NativeEventKind, RenderError, Renderer, RenderingEngine, Toolkit};

use super::{build_widget, require_parent, widget_of};
use crate::{HeadlessToolkit, WidgetKind};

/// Transient data key counting how often an item was activated.
pub const ACTIVATIONS_KEY: &str = "trellis.headless.activations";

/// Renders parts into composites and creates their contributed objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartRenderer;

impl Renderer<HeadlessToolkit> for PartRenderer {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        let parent = require_parent(engine, element, parent)?;
        let widget = build_widget(self, engine, element, WidgetKind::Composite, Some(parent))?;
        if let Err(error) = engine.create_contribution(element) {
            engine.toolkit_mut().dispose(widget);
            return Err(error);
        }
        Ok(Some(widget))
    }

    fn hook_controller_logic(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
    ) -> Result<(), RenderError> {
        if let Some(widget) = widget_of(engine, element) {
            engine.toolkit_mut().enable_events(widget);
        }
        Ok(())
    }

    fn handle_event(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        event: &NativeEvent,
    ) -> Result<(), RenderError> {
        match event.kind {
            NativeEventKind::Activated => engine.focus(element).map_err(RenderError::from),
            _ => Ok(()),
        }
    }
}

/// Renders menu and tool items.
#[derive(Debug, Default, Clone, Copy)]
pub struct ItemRenderer;

impl Renderer<HeadlessToolkit> for ItemRenderer {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        let parent = require_parent(engine, element, parent)?;
        build_widget(self, engine, element, WidgetKind::Item, Some(parent)).map(Some)
    }

    fn hook_controller_logic(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
    ) -> Result<(), RenderError> {
        if let Some(widget) = widget_of(engine, element) {
            engine.toolkit_mut().enable_events(widget);
        }
        Ok(())
    }

    fn requires_focus(&self, _engine: &RenderingEngine<HeadlessToolkit>, _element: ElementId) -> bool {
        false
    }

    fn handle_event(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        event: &NativeEvent,
    ) -> Result<(), RenderError> {
        if event.kind != NativeEventKind::Activated {
            return Ok(());
        }
        let Some(el) = engine.tree_mut().get_mut(element) else {
            return Ok(());
        };
        let data = el.transient_data_mut();
        let count = data
            .get(ACTIVATIONS_KEY)
            .and_then(downcast::<usize>)
            .map_or(0, |count| *count);
        data.insert(ACTIVATIONS_KEY.into(), value(count + 1));
        Ok(())
    }
}
