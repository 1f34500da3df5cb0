use trellis_core::{ElementId, UIElement, WidgetHandle};
use trellis_engine::{NativeEvent, NativeEventKind, RenderError, Renderer, RenderingEngine};

use super::build_widget;
use crate::{HeadlessToolkit, WidgetKind};

/// Renders windows into shells.
///
/// A detached window is parented to the shell of the window holding it. The
/// main menu, the content, the trim bars and the detached windows are rendered
/// in that order.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowRenderer;

impl Renderer<HeadlessToolkit> for WindowRenderer {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        build_widget(self, engine, element, WidgetKind::Shell, parent).map(Some)
    }

    fn hook_controller_logic(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
    ) -> Result<(), RenderError> {
        if let Some(shell) = engine.tree().element(element)?.widget() {
            engine.toolkit_mut().enable_events(shell);
        }
        Ok(())
    }

    fn process_contents(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        window: ElementId,
    ) -> Result<(), RenderError> {
        let data = engine
            .tree()
            .element(window)?
            .window_data()
            .cloned()
            .unwrap_or_default();

        if let Some(menu) = data.main_menu() {
            engine.create(menu)?;
        }
        engine.create_children(window)?;
        for &bar in data.trim_bars() {
            engine.create(bar)?;
        }
        for &detached in data.windows() {
            if engine.tree().get(detached).is_some_and(UIElement::to_be_rendered) {
                engine.create(detached)?;
            }
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
            NativeEventKind::CloseRequested => {
                tracing::debug!(window = %engine.tree().element(element)?.describe(), "close requested");
                engine.tree_mut().set_to_be_rendered(element, false)?;
                Ok(())
            }
            NativeEventKind::Activated => engine.focus(element).map_err(RenderError::from),
            _ => Ok(()),
        }
    }
}
