//! Reactions to model events.

use trellis_core::{ElementId, ElementTree, ModelEvent, UIElement};

use super::RenderingEngine;
use crate::{
    FatalError, RenderError, Toolkit,
    zorder::{fix_children_z_order, fix_z_order},
};

impl<T: Toolkit> RenderingEngine<T> {
    /// Handles every queued model event, including events raised while
    /// handling. Returns how many events were handled.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned; each event is handled inside its own
    /// error boundary.
    pub fn process_model_events(&mut self) -> Result<usize, FatalError> {
        let mut handled = 0;
        while let Some(event) = self.tree.pop_event() {
            self.handle_model_event(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Mutates the model with `f`, then handles the events it raised.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut ElementTree) -> R) -> Result<R, FatalError> {
        let result = f(&mut self.tree);
        self.process_model_events()?;
        Ok(result)
    }

    fn handle_model_event(&mut self, event: ModelEvent) -> Result<(), FatalError> {
        let subject = format!("{} on {}", event.topic(), self.describe(event.subject()));
        tracing::trace!(event = ?event, "model event");
        let boundary = self.boundary.clone();
        boundary.run(&subject, || self.react(event)).map(drop)
    }

    fn react(&mut self, event: ModelEvent) -> Result<(), RenderError> {
        match event {
            ModelEvent::ToBeRenderedChanged {
                element,
                to_be_rendered,
            } => self.on_to_be_rendered_changed(element, to_be_rendered),
            ModelEvent::VisibleChanged { element, visible } => {
                self.on_visible_changed(element, visible)
            }
            ModelEvent::ChildrenChanged {
                parent,
                added,
                removed,
                ..
            } => self.on_children_changed(parent, &added, &removed),
            ModelEvent::SelectionChanged { container, new, .. } => {
                self.on_selection_changed(container, new)
            }
            ModelEvent::TrimBarsChanged {
                window,
                added,
                removed,
            } => self.on_children_changed(window, &added, &removed),
            _ => Ok(()),
        }
    }

    /// Whether `child` of `parent` should render right now.
    fn wants_render(&self, parent: ElementId, child: ElementId) -> bool {
        let Some(el) = self.tree.get(child) else {
            return false;
        };
        if !el.to_be_rendered() || self.awaits_placeholder(child) {
            return false;
        }
        match self.tree.get(parent) {
            Some(parent_el) if parent_el.is_lazy_stack() => {
                parent_el.selected() == Some(child)
            }
            _ => true,
        }
    }

    /// Whether `element` is a shared element no placeholder is showing.
    fn awaits_placeholder(&self, element: ElementId) -> bool {
        self.tree.is_shared(element)
            && self
                .tree
                .get(element)
                .is_some_and(|el| el.cur_shared_ref().is_none())
    }

    /// Whether `child`, just detached from `old_parent`, now sits under
    /// another displayed parent that will render it.
    fn moved_to_displayed_parent(&self, old_parent: ElementId, child: ElementId) -> bool {
        self.tree.parent(child).is_some_and(|new_parent| {
            new_parent != old_parent
                && self.is_displayed(new_parent)
                && self.wants_render(new_parent, child)
        })
    }

    fn on_to_be_rendered_changed(
        &mut self,
        element: ElementId,
        to_be_rendered: bool,
    ) -> Result<(), RenderError> {
        let Some(parent) = self.tree.logical_parent(element) else {
            return Ok(());
        };
        if !self.is_displayed(parent) {
            return Ok(());
        }
        if to_be_rendered {
            if self.wants_render(parent, element) && self.create(element)?.is_some() {
                fix_z_order(&self.tree, &mut self.toolkit, element);
            }
        } else {
            self.remove(element)?;
        }
        Ok(())
    }

    fn on_visible_changed(&mut self, element: ElementId, visible: bool) -> Result<(), RenderError> {
        let el = self.tree.element(element)?;
        match el.widget() {
            Some(widget) => self.toolkit.set_visible(widget, visible),
            None if visible && el.to_be_rendered() => {
                if let Some(parent) = self.tree.logical_parent(element)
                    && self.is_displayed(parent)
                    && self.wants_render(parent, element)
                {
                    self.create(element)?;
                }
            }
            None => {}
        }
        let Some(parent) = self.tree.logical_parent(element) else {
            return Ok(());
        };
        fix_children_z_order(&self.tree, &mut self.toolkit, parent);
        if let Some(parent_widget) = self.tree.get(parent).and_then(UIElement::widget) {
            self.toolkit.layout(parent_widget);
        }
        Ok(())
    }

    fn on_children_changed(
        &mut self,
        parent: ElementId,
        added: &[ElementId],
        removed: &[ElementId],
    ) -> Result<(), RenderError> {
        if !self.is_displayed(parent) {
            return Ok(());
        }

        for &child in removed {
            if !self.tree.contains(child) {
                continue;
            }
            // The child is already detached from the model, so the parent has to
            // be told explicitly.
            if let Some(renderer) = self.renderer_of(parent) {
                renderer.hide_child(self, parent, child)?;
            }
            if self.moved_to_displayed_parent(parent, child)
                && self.tree.get(child).and_then(UIElement::widget).is_some()
            {
                tracing::debug!(element = %self.describe(child), "moving rendered element");
                self.create(child)?;
                continue;
            }
            self.remove(child)?;
        }

        let mut created = false;
        for &child in added {
            if self.wants_render(parent, child) && self.create(child)?.is_some() {
                created = true;
            }
        }
        if created {
            fix_children_z_order(&self.tree, &mut self.toolkit, parent);
            self.restyle(parent);
        }

        if let Some(widget) = self.tree.get(parent).and_then(UIElement::widget) {
            self.toolkit.layout(widget);
        }
        Ok(())
    }

    fn restyle(&mut self, element: ElementId) {
        if !self.config.style_after_structural_change {
            return;
        }
        if let Some(styling) = &self.styling
            && let Some(widget) = self.tree.get(element).and_then(UIElement::widget)
        {
            styling.style(&mut self.toolkit, widget);
        }
    }

    fn on_selection_changed(
        &mut self,
        container: ElementId,
        selected: Option<ElementId>,
    ) -> Result<(), RenderError> {
        let Some(selected) = selected else {
            return Ok(());
        };
        if self.tree.get(container).and_then(UIElement::widget).is_none() {
            return Ok(());
        }
        let Some(el) = self.tree.get(selected) else {
            return Ok(());
        };
        if !el.to_be_rendered() {
            return Ok(());
        }
        if el.widget().is_none() {
            self.create(selected)?;
        }
        if let Some(renderer) = self.renderer_of(container) {
            renderer.show_child(self, container, selected)?;
        }
        Ok(())
    }
}
