//! Abstract UI elements.
//!
//! An element is a node of the model tree. Its [`ElementKind`] carries the
//! kind-specific data (child lists, the placeholder reference, the contribution
//! of a part); everything else is shared by all kinds.
//!
//! Fields the engine owns (`widget`, `renderer`, `context`) are written through
//! plain setters that do not raise model events. Changes a model owner makes go
//! through [`ElementTree`](crate::ElementTree) so that the engine hears about them.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
    string::String,
    vec::Vec,
};
use core::fmt::{self, Debug};
use std::collections::HashMap;

use crate::{AnyValue, ContextId, ElementId, WidgetHandle};

/// Persisted key/value state of an element.
pub type PersistedState = BTreeMap<String, String>;

/// Layout role of a [`ElementKind::Container`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContainerStyle {
    /// Tiles all of its children.
    Sash,
    /// Shows one child at a time; children are rendered lazily.
    Stack,
    /// Stack of perspectives; rendered lazily like [`ContainerStyle::Stack`].
    PerspectiveStack,
    /// A perspective; owns a context.
    Perspective,
    /// A window trim bar.
    TrimBar,
}

/// Role of a [`ElementKind::Leaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LeafRole {
    /// A part: owns a context and a contributed object.
    Part,
    /// A plain item (menu item, tool item).
    Item,
}

/// Flat tag describing an element's kind, used to pick the default renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KindTag {
    /// [`ElementKind::Application`].
    Application,
    /// [`ElementKind::Window`].
    Window,
    /// Container with [`ContainerStyle::Sash`].
    Sash,
    /// Container with [`ContainerStyle::Stack`].
    Stack,
    /// Container with [`ContainerStyle::PerspectiveStack`].
    PerspectiveStack,
    /// Container with [`ContainerStyle::Perspective`].
    Perspective,
    /// Container with [`ContainerStyle::TrimBar`].
    TrimBar,
    /// Leaf with [`LeafRole::Part`].
    Part,
    /// Leaf with [`LeafRole::Item`].
    Item,
    /// [`ElementKind::Placeholder`].
    Placeholder,
    /// [`ElementKind::Menu`].
    Menu,
}

impl KindTag {
    /// Human readable name, used for context names and log fields.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Window => "window",
            Self::Sash => "sash",
            Self::Stack => "stack",
            Self::PerspectiveStack => "perspective-stack",
            Self::Perspective => "perspective",
            Self::TrimBar => "trim-bar",
            Self::Part => "part",
            Self::Item => "item",
            Self::Placeholder => "placeholder",
            Self::Menu => "menu",
        }
    }
}

/// Identifies which renderer instance serves an element.
///
/// The registry owns renderer instances; elements only remember how to find theirs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RendererId {
    /// The default renderer for a kind.
    Kind(KindTag),
    /// A custom renderer created from a contribution URI.
    Custom(String),
}

/// Ordered children plus the selected child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerData {
    pub(crate) children: Vec<ElementId>,
    pub(crate) selected: Option<ElementId>,
}

impl ContainerData {
    /// The children in model order.
    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// The selected child, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<ElementId> {
        self.selected
    }
}

/// Data specific to windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowData {
    pub(crate) content: ContainerData,
    pub(crate) windows: Vec<ElementId>,
    pub(crate) trim_bars: Vec<ElementId>,
    pub(crate) shared_elements: Vec<ElementId>,
    pub(crate) main_menu: Option<ElementId>,
}

impl WindowData {
    /// Detached sub-windows.
    #[must_use]
    pub fn windows(&self) -> &[ElementId] {
        &self.windows
    }

    /// Trim bars around the window content.
    #[must_use]
    pub fn trim_bars(&self) -> &[ElementId] {
        &self.trim_bars
    }

    /// Elements shown through placeholders.
    #[must_use]
    pub fn shared_elements(&self) -> &[ElementId] {
        &self.shared_elements
    }

    /// The main menu.
    #[must_use]
    pub const fn main_menu(&self) -> Option<ElementId> {
        self.main_menu
    }
}

/// Backing object of a contribution-bearing element.
pub trait Contribution: Debug {
    /// Saves state into the element before the object is detached.
    fn persist_state(&self, _state: &mut PersistedState) {}

    /// Called once when the object is detached from its element.
    fn on_dispose(&self) {}
}

/// Data specific to leaves.
#[derive(Clone)]
pub struct LeafData {
    pub(crate) role: LeafRole,
    pub(crate) contribution_uri: Option<String>,
    pub(crate) object: Option<Rc<dyn Contribution>>,
}

impl LeafData {
    /// Part or plain item.
    #[must_use]
    pub const fn role(&self) -> LeafRole {
        self.role
    }

    /// URI the contributed object is created from.
    #[must_use]
    pub fn contribution_uri(&self) -> Option<&str> {
        self.contribution_uri.as_deref()
    }

    /// The contributed object, once created.
    #[must_use]
    pub const fn object(&self) -> Option<&Rc<dyn Contribution>> {
        self.object.as_ref()
    }
}

impl Debug for LeafData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafData")
            .field("role", &self.role)
            .field("contribution_uri", &self.contribution_uri)
            .field("has_object", &self.object.is_some())
            .finish()
    }
}

/// The variant part of an element.
#[derive(Debug, Clone)]
pub enum ElementKind {
    /// The application root; its children are windows.
    Application(ContainerData),
    /// A top-level or detached window.
    Window(WindowData),
    /// A layout container.
    Container(ContainerStyle, ContainerData),
    /// A part or an item.
    Leaf(LeafData),
    /// Stand-in for a shared element.
    Placeholder(Option<ElementId>),
    /// A menu; its children are menus and items.
    Menu(ContainerData),
}

/// A node of the abstract UI model.
pub struct UIElement {
    element_id: Option<String>,
    kind: ElementKind,
    pub(crate) parent: Option<ElementId>,
    pub(crate) to_be_rendered: bool,
    pub(crate) visible: bool,
    renderer: Option<RendererId>,
    widget: Option<WidgetHandle>,
    context: Option<ContextId>,
    pub(crate) cur_shared_ref: Option<ElementId>,
    label: Option<String>,
    icon_uri: Option<String>,
    variables: Vec<String>,
    properties: BTreeMap<String, String>,
    transient_data: HashMap<String, AnyValue>,
    persisted_state: PersistedState,
    tags: BTreeSet<String>,
}

impl Debug for UIElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UIElement")
            .field("element_id", &self.element_id)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("to_be_rendered", &self.to_be_rendered)
            .field("visible", &self.visible)
            .field("renderer", &self.renderer)
            .field("widget", &self.widget)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl UIElement {
    /// Creates an element of the given kind, renderable and visible.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            element_id: None,
            kind,
            parent: None,
            to_be_rendered: true,
            visible: true,
            renderer: None,
            widget: None,
            context: None,
            cur_shared_ref: None,
            label: None,
            icon_uri: None,
            variables: Vec::new(),
            properties: BTreeMap::new(),
            transient_data: HashMap::new(),
            persisted_state: PersistedState::new(),
            tags: BTreeSet::new(),
        }
    }

    /// An application root.
    #[must_use]
    pub fn application() -> Self {
        Self::new(ElementKind::Application(ContainerData::default()))
    }

    /// A window.
    #[must_use]
    pub fn window() -> Self {
        Self::new(ElementKind::Window(WindowData::default()))
    }

    /// A container with the given style.
    #[must_use]
    pub fn container(style: ContainerStyle) -> Self {
        Self::new(ElementKind::Container(style, ContainerData::default()))
    }

    /// A part whose object is created from `contribution_uri`.
    #[must_use]
    pub fn part(contribution_uri: impl Into<String>) -> Self {
        Self::new(ElementKind::Leaf(LeafData {
            role: LeafRole::Part,
            contribution_uri: Some(contribution_uri.into()),
            object: None,
        }))
    }

    /// A plain item.
    #[must_use]
    pub fn item() -> Self {
        Self::new(ElementKind::Leaf(LeafData {
            role: LeafRole::Item,
            contribution_uri: None,
            object: None,
        }))
    }

    /// A placeholder, optionally already pointing at a shared element.
    #[must_use]
    pub fn placeholder(reference: Option<ElementId>) -> Self {
        Self::new(ElementKind::Placeholder(reference))
    }

    /// A menu.
    #[must_use]
    pub fn menu() -> Self {
        Self::new(ElementKind::Menu(ContainerData::default()))
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the icon URI.
    #[must_use]
    pub fn with_icon(mut self, uri: impl Into<String>) -> Self {
        self.icon_uri = Some(uri.into());
        self
    }

    /// Declares a key as modifiable on the element's context.
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>) -> Self {
        self.variables.push(key.into());
        self
    }

    /// Adds a string property copied into the element's context.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Adds a persisted state entry.
    #[must_use]
    pub fn with_persisted(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.persisted_state.insert(key.into(), value.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Starts out with `to_be_rendered == false`.
    #[must_use]
    pub const fn not_rendered(mut self) -> Self {
        self.to_be_rendered = false;
        self
    }

    /// Starts out invisible.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// The model identifier.
    #[must_use]
    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// The kind-specific data.
    #[must_use]
    pub const fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub(crate) const fn kind_mut(&mut self) -> &mut ElementKind {
        &mut self.kind
    }

    /// The flat kind tag.
    #[must_use]
    pub const fn kind_tag(&self) -> KindTag {
        match &self.kind {
            ElementKind::Application(_) => KindTag::Application,
            ElementKind::Window(_) => KindTag::Window,
            ElementKind::Container(style, _) => match style {
                ContainerStyle::Sash => KindTag::Sash,
                ContainerStyle::Stack => KindTag::Stack,
                ContainerStyle::PerspectiveStack => KindTag::PerspectiveStack,
                ContainerStyle::Perspective => KindTag::Perspective,
                ContainerStyle::TrimBar => KindTag::TrimBar,
            },
            ElementKind::Leaf(leaf) => match leaf.role {
                LeafRole::Part => KindTag::Part,
                LeafRole::Item => KindTag::Item,
            },
            ElementKind::Placeholder(_) => KindTag::Placeholder,
            ElementKind::Menu(_) => KindTag::Menu,
        }
    }

    /// A short `kind (id)` label for logs and context names.
    #[must_use]
    pub fn describe(&self) -> String {
        self.element_id.as_deref().map_or_else(
            || String::from(self.kind_tag().name()),
            |id| alloc::format!("{} ({id})", self.kind_tag().name()),
        )
    }

    /// The model parent.
    #[must_use]
    pub const fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Whether the model wants this element rendered.
    #[must_use]
    pub const fn to_be_rendered(&self) -> bool {
        self.to_be_rendered
    }

    /// Whether the element is visible.
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.visible
    }

    /// Renderer that produced the current widget.
    #[must_use]
    pub const fn renderer(&self) -> Option<&RendererId> {
        self.renderer.as_ref()
    }

    /// Records the renderer. Engine bookkeeping; raises no model event.
    pub fn set_renderer(&mut self, renderer: Option<RendererId>) {
        self.renderer = renderer;
    }

    /// The native widget.
    #[must_use]
    pub const fn widget(&self) -> Option<WidgetHandle> {
        self.widget
    }

    /// Records the widget. Engine bookkeeping; raises no model event.
    pub const fn set_widget(&mut self, widget: Option<WidgetHandle>) {
        self.widget = widget;
    }

    /// The element's own context.
    #[must_use]
    pub const fn context(&self) -> Option<ContextId> {
        self.context
    }

    /// Records the context. Engine bookkeeping; raises no model event.
    pub const fn set_context(&mut self, context: Option<ContextId>) {
        self.context = context;
    }

    /// For a shared element, the placeholder currently displaying it.
    #[must_use]
    pub const fn cur_shared_ref(&self) -> Option<ElementId> {
        self.cur_shared_ref
    }

    /// The label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The icon URI.
    #[must_use]
    pub fn icon_uri(&self) -> Option<&str> {
        self.icon_uri.as_deref()
    }

    /// Keys declared modifiable on the element's context.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// String properties copied into the element's context.
    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Runtime-only data attached by renderers.
    #[must_use]
    pub const fn transient_data(&self) -> &HashMap<String, AnyValue> {
        &self.transient_data
    }

    /// Mutable runtime-only data.
    pub const fn transient_data_mut(&mut self) -> &mut HashMap<String, AnyValue> {
        &mut self.transient_data
    }

    /// Persisted state.
    #[must_use]
    pub const fn persisted_state(&self) -> &PersistedState {
        &self.persisted_state
    }

    /// Mutable persisted state.
    pub const fn persisted_state_mut(&mut self) -> &mut PersistedState {
        &mut self.persisted_state
    }

    /// Tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Mutable tags.
    pub const fn tags_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.tags
    }

    /// Whether rendering this element creates a context for it.
    #[must_use]
    pub const fn is_context_bearing(&self) -> bool {
        matches!(
            self.kind_tag(),
            KindTag::Application | KindTag::Window | KindTag::Part | KindTag::Perspective
        )
    }

    /// Whether this element has a contributed backing object.
    #[must_use]
    pub const fn is_contribution_bearing(&self) -> bool {
        matches!(self.kind_tag(), KindTag::Part)
    }

    /// Whether this element renders only its selected child eagerly.
    #[must_use]
    pub const fn is_lazy_stack(&self) -> bool {
        matches!(self.kind_tag(), KindTag::Stack | KindTag::PerspectiveStack)
    }

    /// The child list and selection, for every kind that has one.
    #[must_use]
    pub const fn container_data(&self) -> Option<&ContainerData> {
        match &self.kind {
            ElementKind::Application(data)
            | ElementKind::Container(_, data)
            | ElementKind::Menu(data) => Some(data),
            ElementKind::Window(window) => Some(&window.content),
            ElementKind::Leaf(_) | ElementKind::Placeholder(_) => None,
        }
    }

    pub(crate) const fn container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.kind {
            ElementKind::Application(data)
            | ElementKind::Container(_, data)
            | ElementKind::Menu(data) => Some(data),
            ElementKind::Window(window) => Some(&mut window.content),
            ElementKind::Leaf(_) | ElementKind::Placeholder(_) => None,
        }
    }

    /// Whether the element holds children.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        self.container_data().is_some()
    }

    /// Children in model order; empty for leaves and placeholders.
    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        self.container_data().map_or(&[], ContainerData::children)
    }

    /// Selected child.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.container_data().and_then(ContainerData::selected)
    }

    /// Window data, if this is a window.
    #[must_use]
    pub const fn window_data(&self) -> Option<&WindowData> {
        match &self.kind {
            ElementKind::Window(window) => Some(window),
            _ => None,
        }
    }

    pub(crate) const fn window_data_mut(&mut self) -> Option<&mut WindowData> {
        match &mut self.kind {
            ElementKind::Window(window) => Some(window),
            _ => None,
        }
    }

    /// Leaf data, if this is a leaf.
    #[must_use]
    pub const fn leaf(&self) -> Option<&LeafData> {
        match &self.kind {
            ElementKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Attaches or clears the contributed object. Engine bookkeeping.
    pub fn set_object(&mut self, object: Option<Rc<dyn Contribution>>) {
        if let ElementKind::Leaf(leaf) = &mut self.kind {
            leaf.object = object;
        }
    }

    /// Takes the contributed object out of the element.
    pub fn take_object(&mut self) -> Option<Rc<dyn Contribution>> {
        match &mut self.kind {
            ElementKind::Leaf(leaf) => leaf.object.take(),
            _ => None,
        }
    }

    /// The shared element a placeholder stands for.
    #[must_use]
    pub const fn placeholder_ref(&self) -> Option<ElementId> {
        match &self.kind {
            ElementKind::Placeholder(reference) => *reference,
            _ => None,
        }
    }
}
