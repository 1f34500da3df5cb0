//! Renderers for every element kind.

mod menu;
mod part;
mod placeholder;
mod sash;
mod stack;
mod window;

pub use menu::MenuRenderer;
pub use part::{ACTIVATIONS_KEY, ItemRenderer, PartRenderer};
pub use placeholder::PlaceholderRenderer;
pub use sash::SashRenderer;
pub use stack::StackRenderer;
pub use window::WindowRenderer;

use trellis_core::{ElementId, KindTag, UIElement, WidgetHandle};
use trellis_engine::{RenderError, Renderer, RendererRegistry, RenderingEngine, Toolkit};

use crate::{HeadlessToolkit, WidgetKind};

/// A registry with a renderer for every kind except the application root.
#[must_use]
pub fn default_registry() -> RendererRegistry<HeadlessToolkit> {
    RendererRegistry::new()
        .with(KindTag::Window, WindowRenderer)
        .with(KindTag::Sash, SashRenderer)
        .with(KindTag::Perspective, SashRenderer)
        .with(KindTag::TrimBar, SashRenderer)
        .with(KindTag::Stack, StackRenderer)
        .with(KindTag::PerspectiveStack, StackRenderer)
        .with(KindTag::Part, PartRenderer)
        .with(KindTag::Item, ItemRenderer)
        .with(KindTag::Placeholder, PlaceholderRenderer)
        .with(KindTag::Menu, MenuRenderer)
}

fn require_parent(
    engine: &RenderingEngine<HeadlessToolkit>,
    element: ElementId,
    parent: Option<WidgetHandle>,
) -> Result<WidgetHandle, RenderError> {
    parent.ok_or_else(|| {
        let name = engine
            .tree()
            .get(element)
            .map_or_else(|| format!("{element:?}"), UIElement::describe);
        RenderError::renderer(format!("{name} needs a parent widget"))
    })
}

/// Creates a widget of `kind` and copies label, image, style and visibility
/// from the element.
fn build_widget<R: Renderer<HeadlessToolkit>>(
    renderer: &R,
    engine: &mut RenderingEngine<HeadlessToolkit>,
    element: ElementId,
    kind: WidgetKind,
    parent: Option<WidgetHandle>,
) -> Result<WidgetHandle, RenderError> {
    let el = engine.tree().element(element)?;
    let label = el.label().map(String::from);
    let visible = el.visible();
    let image = renderer.get_image(engine, element);
    let style = renderer.get_style_override(engine, element);

    let toolkit = engine.toolkit_mut();
    let widget = toolkit.create(kind, parent)?;
    toolkit.set_label(widget, label.as_deref());
    toolkit.set_image(widget, image);
    if let Some(style) = style {
        toolkit.set_style(widget, style);
    }
    toolkit.set_visible(widget, visible);
    Ok(widget)
}

fn widget_of(engine: &RenderingEngine<HeadlessToolkit>, element: ElementId) -> Option<WidgetHandle> {
    engine.tree().get(element).and_then(UIElement::widget)
}

fn is_live(engine: &RenderingEngine<HeadlessToolkit>, widget: WidgetHandle) -> bool {
    !engine.toolkit().is_disposed(widget)
}
