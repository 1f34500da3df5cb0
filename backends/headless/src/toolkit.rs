//! An in-memory widget toolkit.
//!
//! Widgets are plain records in a map. Native children are kept in stacking
//! order, topmost first, so tests can assert on z-order directly.

use core::time::Duration;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use trellis_core::WidgetHandle;
use trellis_engine::{NativeEvent, RenderError, Toolkit};

use crate::ToolkitError;

/// What a widget is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// A top-level or detached window.
    Shell,
    /// A plain container.
    Composite,
    /// A container showing one child at a time behind tabs.
    TabFolder,
    /// A row of tool items.
    ToolBar,
    /// The menu bar of a shell.
    MenuBar,
    /// A drop-down or popup menu.
    Menu,
    /// A menu or tool item.
    Item,
    /// The hidden parking container.
    Limbo,
}

/// State of one widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    kind: WidgetKind,
    parent: Option<WidgetHandle>,
    children: Vec<WidgetHandle>,
    visible: bool,
    label: Option<String>,
    image: Option<String>,
    style: i32,
}

impl Widget {
    /// What the widget is.
    #[must_use]
    pub const fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// The native parent.
    #[must_use]
    pub const fn parent(&self) -> Option<WidgetHandle> {
        self.parent
    }

    /// Native children, topmost first.
    #[must_use]
    pub fn children(&self) -> &[WidgetHandle] {
        &self.children
    }

    /// Whether the widget is shown.
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.visible
    }

    /// The label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The image URI.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Style bits.
    #[must_use]
    pub const fn style(&self) -> i32 {
        self.style
    }
}

/// Toolkit keeping every widget in memory.
#[derive(Debug, Default)]
pub struct HeadlessToolkit {
    widgets: BTreeMap<WidgetHandle, Widget>,
    disposed: HashSet<WidgetHandle>,
    next: u64,
    interactive: HashSet<WidgetHandle>,
    top_right: HashMap<WidgetHandle, WidgetHandle>,
    focus: Option<WidgetHandle>,
    events: VecDeque<NativeEvent>,
    limbo: Option<WidgetHandle>,
    layouts: usize,
    sleeps: usize,
    shut_down: bool,
}

impl HeadlessToolkit {
    /// Creates an empty toolkit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a widget at the bottom of `parent`'s stacking order.
    ///
    /// # Errors
    ///
    /// Fails when `parent` is unknown or disposed.
    pub fn create(
        &mut self,
        kind: WidgetKind,
        parent: Option<WidgetHandle>,
    ) -> Result<WidgetHandle, ToolkitError> {
        if let Some(parent) = parent {
            self.check(parent)?;
        }
        self.next += 1;
        let handle = WidgetHandle::from_raw(self.next);
        self.widgets.insert(
            handle,
            Widget {
                kind,
                parent,
                children: Vec::new(),
                visible: true,
                label: None,
                image: None,
                style: 0,
            },
        );
        if let Some(parent) = parent.and_then(|p| self.widgets.get_mut(&p)) {
            parent.children.push(handle);
        }
        tracing::trace!(widget = %handle, kind = ?kind, "created widget");
        Ok(handle)
    }

    fn check(&self, widget: WidgetHandle) -> Result<&Widget, ToolkitError> {
        if self.disposed.contains(&widget) {
            return Err(ToolkitError::Disposed(widget));
        }
        self.widgets.get(&widget).ok_or(ToolkitError::Unknown(widget))
    }

    fn check_mut(&mut self, widget: WidgetHandle) -> Result<&mut Widget, ToolkitError> {
        if self.disposed.contains(&widget) {
            return Err(ToolkitError::Disposed(widget));
        }
        self.widgets.get_mut(&widget).ok_or(ToolkitError::Unknown(widget))
    }

    /// A live widget.
    #[must_use]
    pub fn widget(&self, widget: WidgetHandle) -> Option<&Widget> {
        self.widgets.get(&widget)
    }

    /// Native children of `widget`, topmost first.
    #[must_use]
    pub fn children_of(&self, widget: WidgetHandle) -> Vec<WidgetHandle> {
        self.widgets
            .get(&widget)
            .map(|w| w.children.clone())
            .unwrap_or_default()
    }

    /// Number of live widgets, limbo included.
    #[must_use]
    pub fn live_widgets(&self) -> usize {
        self.widgets.len()
    }

    /// Sets the label of `widget`.
    pub fn set_label(&mut self, widget: WidgetHandle, label: Option<&str>) {
        if let Ok(w) = self.check_mut(widget) {
            w.label = label.map(String::from);
        }
    }

    /// Sets the image of `widget`.
    pub fn set_image(&mut self, widget: WidgetHandle, image: Option<String>) {
        if let Ok(w) = self.check_mut(widget) {
            w.image = image;
        }
    }

    /// Sets the style bits of `widget`.
    pub fn set_style(&mut self, widget: WidgetHandle, style: i32) {
        if let Ok(w) = self.check_mut(widget) {
            w.style = style;
        }
    }

    /// Lets `widget` receive user events.
    pub fn enable_events(&mut self, widget: WidgetHandle) {
        if self.check(widget).is_ok() {
            self.interactive.insert(widget);
        }
    }

    /// Queues a user event. Returns `false` when the target does not take events.
    pub fn post(&mut self, event: NativeEvent) -> bool {
        if !self.interactive.contains(&event.widget) {
            return false;
        }
        self.events.push_back(event);
        true
    }

    /// Whether events are waiting.
    #[must_use]
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Puts `control` into the top-right slot of `folder`.
    ///
    /// # Errors
    ///
    /// Fails when either widget is unknown or disposed.
    pub fn set_top_right(
        &mut self,
        folder: WidgetHandle,
        control: WidgetHandle,
    ) -> Result<(), ToolkitError> {
        self.check(folder)?;
        self.check(control)?;
        self.top_right.insert(folder, control);
        Ok(())
    }

    /// The control in the top-right slot of `folder`.
    #[must_use]
    pub fn top_right(&self, folder: WidgetHandle) -> Option<WidgetHandle> {
        self.top_right.get(&folder).copied()
    }

    /// The focused widget.
    #[must_use]
    pub const fn focused(&self) -> Option<WidgetHandle> {
        self.focus
    }

    /// The limbo container, if it was ever needed.
    #[must_use]
    pub const fn limbo_widget(&self) -> Option<WidgetHandle> {
        self.limbo
    }

    /// Number of layout passes requested.
    #[must_use]
    pub const fn layouts(&self) -> usize {
        self.layouts
    }

    /// Number of idle sleeps.
    #[must_use]
    pub const fn sleeps(&self) -> usize {
        self.sleeps
    }

    fn detach(&mut self, widget: WidgetHandle) {
        let parent = self.widgets.get(&widget).and_then(|w| w.parent);
        if let Some(parent) = parent.and_then(|p| self.widgets.get_mut(&p)) {
            parent.children.retain(|&child| child != widget);
        }
    }

    fn siblings_mut(&mut self, widget: WidgetHandle) -> Option<&mut Vec<WidgetHandle>> {
        let parent = self.widgets.get(&widget)?.parent?;
        self.widgets.get_mut(&parent).map(|p| &mut p.children)
    }
}

impl Toolkit for HeadlessToolkit {
    fn native_parent(&self, widget: WidgetHandle) -> Option<WidgetHandle> {
        self.widgets.get(&widget)?.parent
    }

    fn set_native_parent(
        &mut self,
        widget: WidgetHandle,
        parent: WidgetHandle,
    ) -> Result<(), RenderError> {
        self.check(widget)?;
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == widget {
                return Err(ToolkitError::Cycle(widget).into());
            }
            ancestor = self.check(current)?.parent;
        }
        self.detach(widget);
        self.check_mut(widget)?.parent = Some(parent);
        self.check_mut(parent)?.children.push(widget);
        Ok(())
    }

    fn release_slot(&mut self, widget: WidgetHandle) {
        self.top_right.retain(|_, control| *control != widget);
    }

    fn set_visible(&mut self, widget: WidgetHandle, visible: bool) {
        if let Ok(w) = self.check_mut(widget) {
            w.visible = visible;
        }
    }

    fn is_visible(&self, widget: WidgetHandle) -> bool {
        self.check(widget).is_ok_and(|w| w.visible)
    }

    fn is_disposed(&self, widget: WidgetHandle) -> bool {
        self.disposed.contains(&widget)
    }

    fn dispose(&mut self, widget: WidgetHandle) {
        self.detach(widget);
        let mut pending = vec![widget];
        while let Some(next) = pending.pop() {
            let Some(w) = self.widgets.remove(&next) else {
                continue;
            };
            pending.extend(w.children);
            self.disposed.insert(next);
            self.interactive.remove(&next);
            self.top_right.retain(|folder, control| *folder != next && *control != next);
            if self.focus == Some(next) {
                self.focus = None;
            }
            if self.limbo == Some(next) {
                self.limbo = None;
            }
        }
        tracing::trace!(widget = %widget, "disposed widget");
    }

    fn move_to_top(&mut self, widget: WidgetHandle) {
        if let Some(siblings) = self.siblings_mut(widget) {
            siblings.retain(|&w| w != widget);
            siblings.insert(0, widget);
        }
    }

    fn move_below(&mut self, widget: WidgetHandle, sibling: WidgetHandle) {
        if let Some(siblings) = self.siblings_mut(widget) {
            if !siblings.contains(&sibling) {
                return;
            }
            siblings.retain(|&w| w != widget);
            let index = siblings
                .iter()
                .position(|&w| w == sibling)
                .map_or(siblings.len(), |index| index + 1);
            siblings.insert(index, widget);
        }
    }

    fn set_focus(&mut self, widget: WidgetHandle) -> bool {
        let accepts = self.check(widget).is_ok_and(|w| w.visible);
        if accepts {
            self.focus = Some(widget);
        }
        accepts
    }

    fn layout(&mut self, _widget: WidgetHandle) {
        self.layouts += 1;
    }

    fn limbo(&mut self) -> WidgetHandle {
        if let Some(limbo) = self.limbo {
            return limbo;
        }
        self.next += 1;
        let limbo = WidgetHandle::from_raw(self.next);
        self.widgets.insert(
            limbo,
            Widget {
                kind: WidgetKind::Limbo,
                parent: None,
                children: Vec::new(),
                visible: false,
                label: None,
                image: None,
                style: 0,
            },
        );
        self.limbo = Some(limbo);
        limbo
    }

    fn read_and_dispatch(&mut self) -> Result<Option<NativeEvent>, RenderError> {
        while let Some(event) = self.events.pop_front() {
            if !self.disposed.contains(&event.widget) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn sleep(&mut self, _timeout: Duration) {
        self.sleeps += 1;
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

#[cfg(test)]
mod tests {
    use trellis_engine::NativeEventKind;

    use super::*;

    #[test]
    fn new_widgets_stack_at_the_bottom() {
        let mut toolkit = HeadlessToolkit::new();
        let shell = toolkit.create(WidgetKind::Shell, None).expect("shell");
        let a = toolkit.create(WidgetKind::Composite, Some(shell)).expect("a");
        let b = toolkit.create(WidgetKind::Composite, Some(shell)).expect("b");
        assert_eq!(toolkit.children_of(shell), vec![a, b]);

        toolkit.move_to_top(b);
        assert_eq!(toolkit.children_of(shell), vec![b, a]);
        toolkit.move_below(b, a);
        assert_eq!(toolkit.children_of(shell), vec![a, b]);
    }

    #[test]
    fn dispose_takes_children_and_slots_along() {
        let mut toolkit = HeadlessToolkit::new();
        let shell = toolkit.create(WidgetKind::Shell, None).expect("shell");
        let folder = toolkit.create(WidgetKind::TabFolder, Some(shell)).expect("folder");
        let bar = toolkit.create(WidgetKind::ToolBar, Some(folder)).expect("bar");
        toolkit.set_top_right(folder, bar).expect("slot");
        assert!(toolkit.set_focus(bar));

        toolkit.dispose(folder);

        assert!(toolkit.is_disposed(bar));
        assert_eq!(toolkit.top_right(folder), None);
        assert_eq!(toolkit.focused(), None);
        assert!(toolkit.children_of(shell).is_empty());
        assert!(toolkit.create(WidgetKind::Item, Some(folder)).is_err());
    }

    #[test]
    fn reparenting_below_itself_is_rejected() {
        let mut toolkit = HeadlessToolkit::new();
        let outer = toolkit.create(WidgetKind::Composite, None).expect("outer");
        let inner = toolkit.create(WidgetKind::Composite, Some(outer)).expect("inner");
        assert!(toolkit.set_native_parent(outer, inner).is_err());
        assert_eq!(toolkit.native_parent(inner), Some(outer));
    }

    #[test]
    fn only_interactive_widgets_take_events() {
        let mut toolkit = HeadlessToolkit::new();
        let shell = toolkit.create(WidgetKind::Shell, None).expect("shell");
        let event = NativeEvent::new(shell, NativeEventKind::Activated);
        assert!(!toolkit.post(event.clone()));

        toolkit.enable_events(shell);
        assert!(toolkit.post(event.clone()));
        assert_eq!(toolkit.read_and_dispatch().expect("event"), Some(event));
        assert_eq!(toolkit.read_and_dispatch().expect("empty"), None);
    }

    #[test]
    fn limbo_is_created_once_and_hidden() {
        let mut toolkit = HeadlessToolkit::new();
        let limbo = toolkit.limbo();
        assert_eq!(toolkit.limbo(), limbo);
        assert!(!toolkit.is_visible(limbo));
        assert_eq!(toolkit.widget(limbo).map(Widget::kind), Some(WidgetKind::Limbo));
    }
}
