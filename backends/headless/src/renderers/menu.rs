use trellis_core::{ElementId, WidgetHandle};
use trellis_engine::{RenderError, Renderer, RenderingEngine};

use super::{build_widget, require_parent};
use crate::{HeadlessToolkit, WidgetKind};

/// Renders menus. A menu directly under a shell becomes its menu bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct MenuRenderer;

impl Renderer<HeadlessToolkit> for MenuRenderer {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        let parent = require_parent(engine, element, parent)?;
        let kind = match engine.toolkit().widget(parent).map(crate::Widget::kind) {
            Some(WidgetKind::Shell) => WidgetKind::MenuBar,
            _ => WidgetKind::Menu,
        };
        build_widget(self, engine, element, kind, Some(parent)).map(Some)
    }

    fn requires_focus(&self, _engine: &RenderingEngine<HeadlessToolkit>, _element: ElementId) -> bool {
        false
    }
}
