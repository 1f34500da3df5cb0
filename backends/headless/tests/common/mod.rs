#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use trellis_core::{
    ContextId, Contribution, ElementId, PersistedState, UIElement, WidgetHandle, keys,
};
use trellis_engine::{EngineConfig, RenderError, RenderingEngine, StylingEngine};
use trellis_headless::{Contributions, HeadlessToolkit, engine_builder};

pub type Engine = RenderingEngine<HeadlessToolkit>;

pub const DOC: &str = "bundle://doc";
pub const BROKEN: &str = "bundle://broken";
pub const PANICS: &str = "bundle://panics";

/// Counts what happened to contributed documents.
#[derive(Debug, Default)]
pub struct Tally {
    pub created: Cell<usize>,
    pub persisted: Cell<usize>,
    pub disposed: Cell<usize>,
    pub parts: RefCell<Vec<ElementId>>,
}

#[derive(Debug)]
pub struct Doc {
    tally: Rc<Tally>,
}

impl Contribution for Doc {
    fn persist_state(&self, state: &mut PersistedState) {
        self.tally.persisted.set(self.tally.persisted.get() + 1);
        state.insert("doc".into(), "saved".into());
    }

    fn on_dispose(&self) {
        self.tally.disposed.set(self.tally.disposed.get() + 1);
    }
}

pub fn contributions(tally: &Rc<Tally>) -> Contributions {
    let tally = Rc::clone(tally);
    Contributions::new()
        .object(DOC, move |contexts, context| {
            let context =
                context.ok_or_else(|| RenderError::renderer("parts are created with a context"))?;
            if let Some(part) = contexts.lookup_as::<ElementId>(context, keys::PART)? {
                tally.parts.borrow_mut().push(*part);
            }
            tally.created.set(tally.created.get() + 1);
            Ok(Rc::new(Doc {
                tally: Rc::clone(&tally),
            }) as Rc<dyn Contribution>)
        })
        .object(BROKEN, |_, _| Err(RenderError::renderer("broken document")))
        .object(PANICS, |_, _| panic!("document constructor panicked"))
}

pub fn one_shot() -> EngineConfig {
    EngineConfig {
        one_shot: true,
        ..EngineConfig::default()
    }
}

pub fn engine(tally: &Rc<Tally>) -> Engine {
    engine_builder()
        .contributions(contributions(tally))
        .config(one_shot())
        .build()
}

/// Runs the loop once over `app` with a fresh run context.
pub fn start(engine: &mut Engine, app: ElementId) -> ContextId {
    let run_context = engine.contexts_mut().create_root("run");
    engine.run(app, run_context).expect("no fatal error");
    run_context
}

/// Runs the loop once more, handling whatever events are queued.
pub fn pump(engine: &mut Engine, app: ElementId, run_context: ContextId) {
    engine.run(app, run_context).expect("no fatal error");
}

pub fn widget(engine: &Engine, element: ElementId) -> Option<WidgetHandle> {
    engine.tree().get(element).and_then(UIElement::widget)
}

pub fn context(engine: &Engine, element: ElementId) -> Option<ContextId> {
    engine.tree().get(element).and_then(UIElement::context)
}

pub fn add(engine: &mut Engine, parent: ElementId, element: UIElement) -> ElementId {
    engine
        .tree_mut()
        .add_child(parent, element)
        .expect("valid parent")
}

/// Applies a model mutation and handles the events it raised.
pub fn update<R>(
    engine: &mut Engine,
    f: impl FnOnce(&mut trellis_core::ElementTree) -> Result<R, trellis_core::ModelError>,
) -> R {
    engine
        .update(f)
        .expect("no fatal error")
        .expect("valid mutation")
}

/// Remembers every widget it styled.
#[derive(Debug, Default, Clone)]
pub struct RecordingStyler(pub Rc<RefCell<Vec<WidgetHandle>>>);

impl StylingEngine<HeadlessToolkit> for RecordingStyler {
    fn style(&self, _toolkit: &mut HeadlessToolkit, widget: WidgetHandle) {
        self.0.borrow_mut().push(widget);
    }
}
