//! In-memory toolkit and renderer used by the unit tests of this crate.

use std::collections::{HashMap, HashSet, VecDeque};

use trellis_core::{ElementId, KindTag, WidgetHandle};

use crate::{NativeEvent, RenderError, Renderer, RendererRegistry, RenderingEngine, Toolkit};

#[derive(Debug, Default)]
struct Node {
    parent: Option<WidgetHandle>,
    children: Vec<WidgetHandle>,
    visible: bool,
}

#[derive(Debug, Default)]
pub struct TestToolkit {
    nodes: HashMap<WidgetHandle, Node>,
    disposed: HashSet<WidgetHandle>,
    next: u64,
    pub focused: Option<WidgetHandle>,
    pub events: VecDeque<NativeEvent>,
    limbo: Option<WidgetHandle>,
    shut_down: bool,
}

impl TestToolkit {
    pub fn spawn(&mut self, parent: Option<WidgetHandle>) -> WidgetHandle {
        self.next += 1;
        let widget = WidgetHandle::from_raw(self.next);
        self.nodes.insert(
            widget,
            Node {
                parent,
                children: Vec::new(),
                visible: true,
            },
        );
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(widget);
        }
        widget
    }

    pub fn children_of(&self, widget: WidgetHandle) -> Vec<WidgetHandle> {
        self.nodes
            .get(&widget)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    pub fn reverse_children(&mut self, widget: WidgetHandle) {
        if let Some(node) = self.nodes.get_mut(&widget) {
            node.children.reverse();
        }
    }

    pub fn live(&self) -> usize {
        self.nodes.len()
    }

    fn detach(&mut self, widget: WidgetHandle) {
        let parent = self.nodes.get(&widget).and_then(|node| node.parent);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&child| child != widget);
        }
    }
}

impl Toolkit for TestToolkit {
    fn native_parent(&self, widget: WidgetHandle) -> Option<WidgetHandle> {
        self.nodes.get(&widget)?.parent
    }

    fn set_native_parent(
        &mut self,
        widget: WidgetHandle,
        parent: WidgetHandle,
    ) -> Result<(), RenderError> {
        if !self.nodes.contains_key(&widget) || !self.nodes.contains_key(&parent) {
            return Err(RenderError::toolkit("reparenting a disposed widget"));
        }
        self.detach(widget);
        if let Some(node) = self.nodes.get_mut(&widget) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(widget);
        }
        Ok(())
    }

    fn release_slot(&mut self, _widget: WidgetHandle) {}

    fn set_visible(&mut self, widget: WidgetHandle, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&widget) {
            node.visible = visible;
        }
    }

    fn is_visible(&self, widget: WidgetHandle) -> bool {
        self.nodes.get(&widget).is_some_and(|node| node.visible)
    }

    fn is_disposed(&self, widget: WidgetHandle) -> bool {
        self.disposed.contains(&widget)
    }

    fn dispose(&mut self, widget: WidgetHandle) {
        self.detach(widget);
        let mut pending = vec![widget];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                pending.extend(node.children);
                self.disposed.insert(next);
            }
        }
    }

    fn move_to_top(&mut self, widget: WidgetHandle) {
        let Some(parent) = self.native_parent(widget) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&child| child != widget);
            node.children.insert(0, widget);
        }
    }

    fn move_below(&mut self, widget: WidgetHandle, sibling: WidgetHandle) {
        let Some(parent) = self.native_parent(widget) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&child| child != widget);
            let index = node
                .children
                .iter()
                .position(|&child| child == sibling)
                .map_or(node.children.len(), |index| index + 1);
            node.children.insert(index, widget);
        }
    }

    fn set_focus(&mut self, widget: WidgetHandle) -> bool {
        self.focused = Some(widget);
        true
    }

    fn layout(&mut self, _widget: WidgetHandle) {}

    fn limbo(&mut self) -> WidgetHandle {
        if let Some(limbo) = self.limbo {
            return limbo;
        }
        let limbo = self.spawn(None);
        self.set_visible(limbo, false);
        self.limbo = Some(limbo);
        limbo
    }

    fn read_and_dispatch(&mut self) -> Result<Option<NativeEvent>, RenderError> {
        Ok(self.events.pop_front())
    }

    fn sleep(&mut self, _timeout: core::time::Duration) {}

    fn shutdown(&mut self) {
        self.shut_down = true;
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

/// Creates a plain widget under the parent for every element.
#[derive(Debug, Default)]
pub struct BoxRenderer;

impl Renderer<TestToolkit> for BoxRenderer {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<TestToolkit>,
        _element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        Ok(Some(engine.toolkit_mut().spawn(parent)))
    }
}

pub fn box_registry() -> RendererRegistry<TestToolkit> {
    let mut registry = RendererRegistry::new();
    for kind in [
        KindTag::Window,
        KindTag::Sash,
        KindTag::Stack,
        KindTag::PerspectiveStack,
        KindTag::Perspective,
        KindTag::TrimBar,
        KindTag::Part,
        KindTag::Item,
        KindTag::Placeholder,
        KindTag::Menu,
    ] {
        registry.register(kind, BoxRenderer);
    }
    registry
}
