mod common;

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

use common::{DOC, Tally, add, context, pump, start, widget};
use trellis_core::{ContainerStyle, ElementId, UIElement, WidgetHandle, downcast};
use trellis_engine::{
    DEFAULT_CUSTOM_RENDERER_KEY, EngineConfig, ExitCode, FatalError, IdleAdvisor, LoopControl, NativeEvent, NativeEventKind,
    RenderError, Renderer, RenderingEngine, Toolkit,
};
use trellis_headless::{HeadlessToolkit, WidgetKind, engine_builder, renderers::ACTIVATIONS_KEY};

const GRUMPY: &str = "bundle://grumpy";
const DOOMED: &str = "bundle://doomed";

/// Renders a clickable composite whose events always fail.
struct Grumpy;

impl Renderer<HeadlessToolkit> for Grumpy {
    fn create_widget(
        &self,
        engine: &mut RenderingEngine<HeadlessToolkit>,
        _element: ElementId,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        let widget = engine.toolkit_mut().create(WidgetKind::Composite, parent)?;
        engine.toolkit_mut().enable_events(widget);
        Ok(Some(widget))
    }

    fn handle_event(
        &self,
        _engine: &mut RenderingEngine<HeadlessToolkit>,
        _element: ElementId,
        _event: &NativeEvent,
    ) -> Result<(), RenderError> {
        Err(RenderError::renderer("grumpy widget rejects input"))
    }
}

/// Fails every render with an unrecoverable error.
struct Doomed;

impl Renderer<HeadlessToolkit> for Doomed {
    fn create_widget(
        &self,
        _engine: &mut RenderingEngine<HeadlessToolkit>,
        _element: ElementId,
        _parent: Option<WidgetHandle>,
    ) -> Result<Option<WidgetHandle>, RenderError> {
        Err(FatalError::new("doomed part", "graphics device lost").into())
    }
}

#[derive(Default, Clone)]
struct Advisor {
    idles: Rc<Cell<usize>>,
    idle_limit: usize,
    errors: Rc<RefCell<Vec<String>>>,
    terminate: bool,
}

impl IdleAdvisor<HeadlessToolkit> for Advisor {
    fn on_idle(&mut self, toolkit: &mut HeadlessToolkit, sleep: Duration) {
        toolkit.sleep(sleep);
        self.idles.set(self.idles.get() + 1);
        if self.idles.get() >= self.idle_limit {
            toolkit.shutdown();
        }
    }

    fn on_exception(&mut self, error: &RenderError) -> LoopControl {
        self.errors.borrow_mut().push(error.to_string());
        if self.terminate {
            LoopControl::Terminate
        } else {
            LoopControl::Continue
        }
    }
}

#[test]
fn one_shot_run_renders_and_returns() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let run_context = engine.contexts_mut().create_root("run");

    let exit = engine.run(app, run_context).expect("no fatal error");

    assert_eq!(exit, ExitCode::Ok);
    assert!(!engine.is_running());
    assert!(widget(&engine, window).is_some());
    assert_eq!(engine.root(), Some(app));
    assert_eq!(context(&engine, app), Some(run_context));
}

#[test]
fn loop_runs_until_the_advisor_shuts_the_toolkit_down() {
    let tally = Rc::new(Tally::default());
    let advisor = Advisor {
        idle_limit: 3,
        ..Advisor::default()
    };
    let mut engine = engine_builder()
        .contributions(common::contributions(&tally))
        .idle_advisor(advisor.clone())
        .config(EngineConfig::default())
        .build();
    let app = engine.tree_mut().insert(UIElement::application());
    add(&mut engine, app, UIElement::window());

    let run_context = engine.contexts_mut().create_root("run");
    let exit = engine.run(app, run_context).expect("no fatal error");

    assert_eq!(exit, ExitCode::Ok);
    assert_eq!(advisor.idles.get(), 3);
    assert_eq!(engine.toolkit().sleeps(), 3);
    assert!(engine.toolkit().is_shut_down());
}

#[test]
fn deferred_tasks_run_before_idling() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let part = add(&mut engine, window, UIElement::part(DOC));
    let run_context = start(&mut engine, app);

    engine.async_exec(move |engine| {
        engine.tree_mut().set_visible(part, false)?;
        Ok(())
    });
    assert_eq!(engine.pending_tasks(), 1);
    pump(&mut engine, app, run_context);

    assert_eq!(engine.pending_tasks(), 0);
    let handle = widget(&engine, part).expect("part widget");
    assert!(!engine.toolkit().is_visible(handle));
}

#[test]
fn close_request_unrenders_the_window() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    add(&mut engine, window, UIElement::part(DOC));
    let run_context = start(&mut engine, app);
    let shell = widget(&engine, window).expect("shell");

    assert!(
        engine
            .toolkit_mut()
            .post(NativeEvent::new(shell, NativeEventKind::CloseRequested))
    );
    pump(&mut engine, app, run_context);

    assert!(engine.tree().get(window).is_some_and(|el| !el.to_be_rendered()));
    assert!(widget(&engine, window).is_none());
    assert_eq!(tally.persisted.get(), 1);
}

#[test]
fn activating_a_part_focuses_it() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let sash = add(&mut engine, window, UIElement::container(ContainerStyle::Sash));
    add(&mut engine, sash, UIElement::part(DOC));
    let part = add(&mut engine, sash, UIElement::part(DOC));
    let run_context = start(&mut engine, app);
    let handle = widget(&engine, part).expect("part widget");

    engine
        .toolkit_mut()
        .post(NativeEvent::new(handle, NativeEventKind::Activated));
    pump(&mut engine, app, run_context);

    assert_eq!(engine.toolkit().focused(), Some(handle));
    let part_ctx = context(&engine, part).expect("part context");
    assert_eq!(engine.contexts().active_leaf(run_context), Ok(part_ctx));
    assert_eq!(
        engine.contexts().active_branch(run_context),
        Ok(vec![
            run_context,
            context(&engine, window).expect("window context"),
            part_ctx
        ])
    );
}

#[test]
fn activating_an_item_counts_without_stealing_focus() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let menu = engine
        .tree_mut()
        .set_main_menu(window, UIElement::menu())
        .expect("menu");
    let item = add(&mut engine, menu, UIElement::item().with_label("Quit"));
    let run_context = start(&mut engine, app);
    let handle = widget(&engine, item).expect("item widget");

    for _ in 0..2 {
        engine
            .toolkit_mut()
            .post(NativeEvent::new(handle, NativeEventKind::Activated));
    }
    pump(&mut engine, app, run_context);

    let count = engine
        .tree()
        .get(item)
        .and_then(|el| el.transient_data().get(ACTIVATIONS_KEY))
        .and_then(downcast::<usize>)
        .map(|count| *count);
    assert_eq!(count, Some(2));
    assert_ne!(engine.toolkit().focused(), Some(handle));
}

#[test]
fn exception_hook_can_terminate_the_loop() {
    let tally = Rc::new(Tally::default());
    let advisor = Advisor {
        terminate: true,
        ..Advisor::default()
    };
    let factory = common::contributions(&tally).renderer(GRUMPY, || Rc::new(Grumpy));
    let mut engine = engine_builder()
        .contributions(factory)
        .idle_advisor(advisor.clone())
        .config(common::one_shot())
        .build();
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let grumpy = add(
        &mut engine,
        window,
        UIElement::part(DOC).with_persisted(DEFAULT_CUSTOM_RENDERER_KEY, GRUMPY),
    );
    let run_context = start(&mut engine, app);
    let handle = widget(&engine, grumpy).expect("grumpy widget");

    engine
        .toolkit_mut()
        .post(NativeEvent::new(handle, NativeEventKind::Activated));
    let exit = engine.run(app, run_context).expect("not fatal");

    assert_eq!(exit, ExitCode::Terminated);
    assert_eq!(advisor.errors.borrow().len(), 1);
    assert!(advisor.errors.borrow()[0].contains("grumpy widget rejects input"));
    assert!(engine.toolkit().is_shut_down());
}

#[test]
fn errors_reaching_the_hook_do_not_stop_the_loop_by_default() {
    let tally = Rc::new(Tally::default());
    let advisor = Advisor::default();
    let factory = common::contributions(&tally).renderer(GRUMPY, || Rc::new(Grumpy));
    let mut engine = engine_builder()
        .contributions(factory)
        .idle_advisor(advisor.clone())
        .config(common::one_shot())
        .build();
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let grumpy = add(
        &mut engine,
        window,
        UIElement::part(DOC).with_persisted(DEFAULT_CUSTOM_RENDERER_KEY, GRUMPY),
    );
    let run_context = start(&mut engine, app);
    let handle = widget(&engine, grumpy).expect("grumpy widget");
    let shell = widget(&engine, window).expect("shell");

    let toolkit = engine.toolkit_mut();
    assert!(toolkit.post(NativeEvent::new(handle, NativeEventKind::Activated)));
    assert!(toolkit.post(NativeEvent::new(shell, NativeEventKind::CloseRequested)));
    let exit = engine.run(app, run_context).expect("not fatal");

    assert_eq!(exit, ExitCode::Ok);
    assert_eq!(advisor.errors.borrow().len(), 1);
    assert!(widget(&engine, window).is_none());
}

#[test]
fn fatal_errors_end_the_run() {
    let tally = Rc::new(Tally::default());
    let factory = common::contributions(&tally).renderer(DOOMED, || Rc::new(Doomed));
    let mut engine = engine_builder()
        .contributions(factory)
        .config(common::one_shot())
        .build();
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    add(
        &mut engine,
        window,
        UIElement::part(DOC).with_persisted(DEFAULT_CUSTOM_RENDERER_KEY, DOOMED),
    );
    let run_context = engine.contexts_mut().create_root("run");

    let error = engine.run(app, run_context).expect_err("fatal error");

    assert!(error.message().contains("graphics device lost"));
    assert_eq!(engine.contained_failures(), 0);
}

#[test]
fn stop_removes_windows_and_persists_parts() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let first = add(&mut engine, app, UIElement::window());
    let second = add(&mut engine, app, UIElement::window());
    add(&mut engine, first, UIElement::part(DOC));
    add(&mut engine, second, UIElement::part(DOC));
    start(&mut engine, app);

    engine.stop().expect("no fatal error");

    assert!(widget(&engine, first).is_none());
    assert!(widget(&engine, second).is_none());
    assert_eq!(tally.persisted.get(), 2);
    assert_eq!(tally.disposed.get(), 2);
    assert!(engine.toolkit().is_shut_down());
    assert!(!engine.is_running());
    // the model itself is untouched
    assert!(engine.tree().get(first).is_some_and(UIElement::to_be_rendered));
}
