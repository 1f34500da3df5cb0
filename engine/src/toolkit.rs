//! The native toolkit abstraction the engine drives.

use core::time::Duration;

use trellis_core::WidgetHandle;

use crate::RenderError;

/// What happened to a native widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEventKind {
    /// The widget was activated (clicked, focused by the user).
    Activated,
    /// The user asked to close the widget's shell.
    CloseRequested,
    /// The user picked the item at the given index (tab, list entry).
    Selected(usize),
    /// Toolkit specific event.
    Custom(String),
}

/// An event read from the toolkit's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEvent {
    /// Widget the event targets.
    pub widget: WidgetHandle,
    /// What happened.
    pub kind: NativeEventKind,
}

impl NativeEvent {
    /// Creates an event for `widget`.
    #[must_use]
    pub const fn new(widget: WidgetHandle, kind: NativeEventKind) -> Self {
        Self { widget, kind }
    }
}

/// Operations the engine needs from the native widget toolkit.
///
/// Creating concrete widgets is left to renderers, which know their toolkit
/// type; this trait only covers what the engine itself touches when it reuses,
/// reorders, focuses and tears down widgets.
pub trait Toolkit: 'static {
    /// The native parent of `widget`.
    fn native_parent(&self, widget: WidgetHandle) -> Option<WidgetHandle>;

    /// Moves `widget` under `parent`.
    ///
    /// # Errors
    ///
    /// Fails when either widget is disposed or unknown.
    fn set_native_parent(
        &mut self,
        widget: WidgetHandle,
        parent: WidgetHandle,
    ) -> Result<(), RenderError>;

    /// Releases any special layout slot `widget` occupies in its current parent.
    fn release_slot(&mut self, widget: WidgetHandle);

    /// Shows or hides `widget`.
    fn set_visible(&mut self, widget: WidgetHandle, visible: bool);

    /// Whether `widget` is currently shown.
    fn is_visible(&self, widget: WidgetHandle) -> bool;

    /// Whether `widget` has been disposed.
    fn is_disposed(&self, widget: WidgetHandle) -> bool;

    /// Disposes `widget` and its native children.
    fn dispose(&mut self, widget: WidgetHandle);

    /// Moves `widget` to the top of its siblings' stacking order.
    fn move_to_top(&mut self, widget: WidgetHandle);

    /// Moves `widget` directly below `sibling` in the stacking order.
    fn move_below(&mut self, widget: WidgetHandle, sibling: WidgetHandle);

    /// Gives keyboard focus to `widget`. Returns whether it took focus.
    fn set_focus(&mut self, widget: WidgetHandle) -> bool;

    /// Lays out the children of `widget` again.
    fn layout(&mut self, widget: WidgetHandle);

    /// The hidden container that parks widgets no placeholder displays.
    fn limbo(&mut self) -> WidgetHandle;

    /// Reads the next pending native event, if any.
    ///
    /// # Errors
    ///
    /// Fails when the toolkit's event source is broken.
    fn read_and_dispatch(&mut self) -> Result<Option<NativeEvent>, RenderError>;

    /// Blocks until an event arrives or `timeout` elapses.
    fn sleep(&mut self, timeout: Duration) {
        std::thread::sleep(timeout);
    }

    /// Asks the toolkit to shut down.
    fn shutdown(&mut self);

    /// Whether the toolkit has shut down.
    fn is_shut_down(&self) -> bool;
}
