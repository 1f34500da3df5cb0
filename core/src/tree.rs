//! Arena holding the element model.
//!
//! Parent links, placeholder references and the shared-element back-pointer are
//! plain [`ElementId`]s into the arena, so there are no reference cycles to break
//! when an element goes away.

use alloc::{collections::VecDeque, vec, vec::Vec};

use slotmap::SlotMap;

use crate::{
    ChildSlot, ElementId, ModelError, ModelEvent, UIElement, element::ContainerData,
};

/// The element model.
#[derive(Debug, Default)]
pub struct ElementTree {
    elements: SlotMap<ElementId, UIElement>,
    events: VecDeque<ModelEvent>,
}

impl ElementTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a detached element and returns its id. Raises no event.
    pub fn insert(&mut self, element: UIElement) -> ElementId {
        self.elements.insert(element)
    }

    /// Number of elements in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether `id` refers to a live element.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Borrows an element.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&UIElement> {
        self.elements.get(id)
    }

    /// Mutably borrows an element. Changes made this way raise no events.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut UIElement> {
        self.elements.get_mut(id)
    }

    /// Borrows an element, failing on an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownElement`] when `id` is not in the tree.
    pub fn element(&self, id: ElementId) -> Result<&UIElement, ModelError> {
        self.elements.get(id).ok_or(ModelError::UnknownElement(id))
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut UIElement, ModelError> {
        self.elements
            .get_mut(id)
            .ok_or(ModelError::UnknownElement(id))
    }

    /// Iterates over every element.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &UIElement)> {
        self.elements.iter()
    }

    /// The model parent.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(UIElement::parent)
    }

    /// The parent the element is displayed under.
    ///
    /// A shared element shown by a placeholder is displayed under that
    /// placeholder; everything else under its model parent.
    #[must_use]
    pub fn logical_parent(&self, id: ElementId) -> Option<ElementId> {
        let element = self.get(id)?;
        element.cur_shared_ref().or_else(|| element.parent())
    }

    /// Whether `id` is registered as a shared element of its window.
    #[must_use]
    pub fn is_shared(&self, id: ElementId) -> bool {
        self.parent(id)
            .and_then(|window| self.get(window))
            .and_then(UIElement::window_data)
            .is_some_and(|window| window.shared_elements().contains(&id))
    }

    /// Walks the logical ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut next = self.logical_parent(id);
        core::iter::from_fn(move || {
            let current = next?;
            next = self.logical_parent(current);
            Some(current)
        })
    }

    /// Children in model order; empty for unknown ids and childless kinds.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map_or(&[], UIElement::children)
    }

    /// Appends a new element to `parent`'s children.
    ///
    /// # Errors
    ///
    /// Fails when `parent` is unknown or cannot hold children.
    pub fn add_child(
        &mut self,
        parent: ElementId,
        element: UIElement,
    ) -> Result<ElementId, ModelError> {
        let index = self.element(parent)?.children().len();
        self.insert_child(parent, index, element)
    }

    /// Inserts a new element at `index` among `parent`'s children.
    ///
    /// # Errors
    ///
    /// Fails when `parent` is unknown or cannot hold children.
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        index: usize,
        element: UIElement,
    ) -> Result<ElementId, ModelError> {
        if !self.element(parent)?.is_container() {
            return Err(ModelError::NotAContainer(parent));
        }
        let child = self.insert(element);
        self.attach_child(parent, child, Some(index))?;
        Ok(child)
    }

    /// Moves an existing element under `parent`, detaching it from its old parent.
    ///
    /// # Errors
    ///
    /// Fails on unknown ids, non-containers, or when `child` is an ancestor of `parent`.
    pub fn attach_child(
        &mut self,
        parent: ElementId,
        child: ElementId,
        index: Option<usize>,
    ) -> Result<(), ModelError> {
        self.element(child)?;
        if !self.element(parent)?.is_container() {
            return Err(ModelError::NotAContainer(parent));
        }
        if parent == child || self.is_model_ancestor(child, parent) {
            return Err(ModelError::Cycle(child));
        }
        if let Some(old_parent) = self.parent(child) {
            if old_parent == parent {
                return Ok(());
            }
            self.detach(old_parent, child)?;
        }

        let data = self
            .element_mut(parent)?
            .container_mut()
            .ok_or(ModelError::NotAContainer(parent))?;
        let at = index.unwrap_or(data.children.len()).min(data.children.len());
        data.children.insert(at, child);
        self.element_mut(child)?.parent = Some(parent);
        self.events.push_back(ModelEvent::ChildrenChanged {
            parent,
            slot: ChildSlot::Children,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Detaches `child` from `parent`. The element stays in the arena.
    ///
    /// Clears the selection if the removed child was selected.
    ///
    /// # Errors
    ///
    /// Fails when `child` is not in `parent`'s children or windows.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), ModelError> {
        self.detach(parent, child)
    }

    fn detach(&mut self, parent: ElementId, child: ElementId) -> Result<(), ModelError> {
        let parent_element = self.element_mut(parent)?;
        let mut slot = None;
        let mut cleared_selection = false;
        if let Some(data) = parent_element.container_mut()
            && let Some(position) = data.children.iter().position(|&c| c == child)
        {
            data.children.remove(position);
            if data.selected == Some(child) {
                data.selected = None;
                cleared_selection = true;
            }
            slot = Some(ChildSlot::Children);
        }
        if slot.is_none()
            && let Some(window) = parent_element.window_data_mut()
        {
            if let Some(position) = window.windows.iter().position(|&w| w == child) {
                window.windows.remove(position);
                slot = Some(ChildSlot::Windows);
            } else if let Some(position) = window.trim_bars.iter().position(|&t| t == child) {
                window.trim_bars.remove(position);
                self.element_mut(child)?.parent = None;
                self.events.push_back(ModelEvent::TrimBarsChanged {
                    window: parent,
                    added: Vec::new(),
                    removed: vec![child],
                });
                return Ok(());
            }
        }
        let slot = slot.ok_or(ModelError::NotAChild { parent, child })?;
        self.element_mut(child)?.parent = None;
        if cleared_selection {
            self.events.push_back(ModelEvent::SelectionChanged {
                container: parent,
                old: Some(child),
                new: None,
            });
        }
        self.events.push_back(ModelEvent::ChildrenChanged {
            parent,
            slot,
            added: Vec::new(),
            removed: vec![child],
        });
        Ok(())
    }

    fn is_model_ancestor(&self, candidate: ElementId, of: ElementId) -> bool {
        let mut current = self.parent(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Removes a detached element and all of its descendants from the arena.
    ///
    /// Returns the removed elements.
    pub fn delete(&mut self, id: ElementId) -> Vec<UIElement> {
        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(element) = self.elements.remove(next) {
                pending.extend_from_slice(element.children());
                if let Some(window) = element.window_data() {
                    pending.extend_from_slice(window.windows());
                    pending.extend_from_slice(window.trim_bars());
                    pending.extend_from_slice(window.shared_elements());
                    pending.extend(window.main_menu());
                }
                removed.push(element);
            }
        }
        removed
    }

    /// Changes the selected child of a container.
    ///
    /// # Errors
    ///
    /// Fails when `selected` is not a child of `container`.
    pub fn set_selected(
        &mut self,
        container: ElementId,
        selected: Option<ElementId>,
    ) -> Result<(), ModelError> {
        let data: &mut ContainerData = self
            .element_mut(container)?
            .container_mut()
            .ok_or(ModelError::NotAContainer(container))?;
        if let Some(child) = selected
            && !data.children.contains(&child)
        {
            return Err(ModelError::NotAChild {
                parent: container,
                child,
            });
        }
        let old = core::mem::replace(&mut data.selected, selected);
        if old != selected {
            self.events.push_back(ModelEvent::SelectionChanged {
                container,
                old,
                new: selected,
            });
        }
        Ok(())
    }

    /// Changes `to_be_rendered`; raises an event only on an actual change.
    ///
    /// # Errors
    ///
    /// Fails when `id` is unknown.
    pub fn set_to_be_rendered(&mut self, id: ElementId, value: bool) -> Result<(), ModelError> {
        let element = self.element_mut(id)?;
        if element.to_be_rendered != value {
            element.to_be_rendered = value;
            self.events.push_back(ModelEvent::ToBeRenderedChanged {
                element: id,
                to_be_rendered: value,
            });
        }
        Ok(())
    }

    /// Changes `visible`; raises an event only on an actual change.
    ///
    /// # Errors
    ///
    /// Fails when `id` is unknown.
    pub fn set_visible(&mut self, id: ElementId, value: bool) -> Result<(), ModelError> {
        let element = self.element_mut(id)?;
        if element.visible != value {
            element.visible = value;
            self.events.push_back(ModelEvent::VisibleChanged {
                element: id,
                visible: value,
            });
        }
        Ok(())
    }

    /// Adds a window to an application or a detached window to a window.
    ///
    /// # Errors
    ///
    /// Fails when `parent` is neither an application nor a window.
    pub fn add_window(
        &mut self,
        parent: ElementId,
        window: UIElement,
    ) -> Result<ElementId, ModelError> {
        let parent_element = self.element(parent)?;
        if parent_element.window_data().is_none() {
            return self.add_child(parent, window);
        }
        let child = self.insert(window);
        self.element_mut(parent)?
            .window_data_mut()
            .ok_or(ModelError::NotAContainer(parent))?
            .windows
            .push(child);
        self.element_mut(child)?.parent = Some(parent);
        self.events.push_back(ModelEvent::ChildrenChanged {
            parent,
            slot: ChildSlot::Windows,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(child)
    }

    /// Adds a trim bar to a window.
    ///
    /// # Errors
    ///
    /// Fails when `window` is not a window.
    pub fn add_trim_bar(
        &mut self,
        window: ElementId,
        bar: UIElement,
    ) -> Result<ElementId, ModelError> {
        if self.element(window)?.window_data().is_none() {
            return Err(ModelError::NotAContainer(window));
        }
        let child = self.insert(bar);
        self.element_mut(window)?
            .window_data_mut()
            .ok_or(ModelError::NotAContainer(window))?
            .trim_bars
            .push(child);
        self.element_mut(child)?.parent = Some(window);
        self.events.push_back(ModelEvent::TrimBarsChanged {
            window,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(child)
    }

    /// Detaches a trim bar from its window.
    ///
    /// # Errors
    ///
    /// Fails when `bar` is not one of `window`'s trim bars.
    pub fn remove_trim_bar(&mut self, window: ElementId, bar: ElementId) -> Result<(), ModelError> {
        let data = self
            .element_mut(window)?
            .window_data_mut()
            .ok_or(ModelError::NotAContainer(window))?;
        let position = data
            .trim_bars
            .iter()
            .position(|&b| b == bar)
            .ok_or(ModelError::NotAChild {
                parent: window,
                child: bar,
            })?;
        data.trim_bars.remove(position);
        self.element_mut(bar)?.parent = None;
        self.events.push_back(ModelEvent::TrimBarsChanged {
            window,
            added: Vec::new(),
            removed: vec![bar],
        });
        Ok(())
    }

    /// Registers an element that placeholders of this window may display.
    ///
    /// # Errors
    ///
    /// Fails when `window` is not a window.
    pub fn add_shared_element(
        &mut self,
        window: ElementId,
        element: UIElement,
    ) -> Result<ElementId, ModelError> {
        if self.element(window)?.window_data().is_none() {
            return Err(ModelError::NotAContainer(window));
        }
        let shared = self.insert(element);
        self.element_mut(window)?
            .window_data_mut()
            .ok_or(ModelError::NotAContainer(window))?
            .shared_elements
            .push(shared);
        self.element_mut(shared)?.parent = Some(window);
        Ok(shared)
    }

    /// Installs the main menu of a window.
    ///
    /// # Errors
    ///
    /// Fails when `window` is not a window.
    pub fn set_main_menu(
        &mut self,
        window: ElementId,
        menu: UIElement,
    ) -> Result<ElementId, ModelError> {
        if self.element(window)?.window_data().is_none() {
            return Err(ModelError::NotAContainer(window));
        }
        let menu = self.insert(menu);
        self.element_mut(menu)?.parent = Some(window);
        let previous = self
            .element_mut(window)?
            .window_data_mut()
            .ok_or(ModelError::NotAContainer(window))?
            .main_menu
            .replace(menu);
        if let Some(previous) = previous
            && let Some(old) = self.get_mut(previous)
        {
            old.parent = None;
        }
        Ok(menu)
    }

    /// Points a placeholder at a shared element.
    ///
    /// # Errors
    ///
    /// Fails when `placeholder` is not a placeholder.
    pub fn set_placeholder_ref(
        &mut self,
        placeholder: ElementId,
        shared: Option<ElementId>,
    ) -> Result<(), ModelError> {
        if let Some(shared) = shared {
            self.element(shared)?;
        }
        match self.element_mut(placeholder)?.kind_mut() {
            crate::ElementKind::Placeholder(reference) => {
                *reference = shared;
                Ok(())
            }
            _ => Err(ModelError::NotAPlaceholder(placeholder)),
        }
    }

    /// Records which placeholder displays a shared element. Engine bookkeeping.
    ///
    /// Setting a new placeholder replaces the previous one; there is only ever
    /// one back-pointer per shared element.
    ///
    /// # Errors
    ///
    /// Fails when `shared` is unknown.
    pub fn set_cur_shared_ref(
        &mut self,
        shared: ElementId,
        placeholder: Option<ElementId>,
    ) -> Result<Option<ElementId>, ModelError> {
        let element = self.element_mut(shared)?;
        Ok(core::mem::replace(&mut element.cur_shared_ref, placeholder))
    }

    /// Whether model events are waiting to be drained.
    #[must_use]
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Takes the next queued model event.
    pub fn pop_event(&mut self) -> Option<ModelEvent> {
        self.events.pop_front()
    }

    /// Takes every queued model event.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ModelEvent> + '_ {
        self.events.drain(..)
    }
}
