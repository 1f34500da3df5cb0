use trellis_core::{ElementId, KindTag, WidgetHandle};
use trellis_engine::{RenderError, Renderer, RenderingEngine};

use super::{build_widget, require_parent};
use crate::{HeadlessToolkit, WidgetKind};

/// Renders containers that show all of their children: sashes, perspectives
/// and trim bars.
#[derive(Debug, Default, Clone, Copy)]
pub struct SashRenderer;

impl Renderer<HeadlessToolkit> for SashRenderer {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        let parent = require_parent(engine, element, parent)?;
        let kind = match engine.tree().element(element)?.kind_tag() {
            KindTag::TrimBar => WidgetKind::ToolBar,
            _ => WidgetKind::Composite,
        };
        build_widget(self, engine, element, kind, Some(parent)).map(Some)
    }

    fn requires_focus(&self, _engine: &RenderingEngine<HeadlessToolkit>, _element: ElementId) -> bool {
        false
    }
}
