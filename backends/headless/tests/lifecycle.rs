mod common;

use std::{cell::Cell, rc::Rc};

use common::{BROKEN, DOC, Tally, add, context, start, update, widget};
use trellis_core::{ContainerStyle, RendererId, UIElement};
use trellis_engine::Toolkit;
use trellis_headless::{Contributions, WidgetKind, engine_builder, renderers::PartRenderer};

#[test]
fn create_then_remove_leaves_nothing_behind() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window().with_label("Main"));
    let sash = add(&mut engine, window, UIElement::container(ContainerStyle::Sash));
    let a = add(&mut engine, sash, UIElement::part(DOC).with_id("a"));
    let b = add(&mut engine, sash, UIElement::part(DOC).with_id("b"));

    let run_context = start(&mut engine, app);

    for id in [window, sash, a, b] {
        assert!(widget(&engine, id).is_some());
    }
    // run + window + two parts
    assert_eq!(engine.contexts().len(), 4);
    assert_eq!(tally.created.get(), 2);
    let shell = widget(&engine, window).expect("shell");
    assert_eq!(engine.toolkit().widget(shell).and_then(|w| w.label()), Some("Main"));

    update(&mut engine, |tree| tree.set_to_be_rendered(window, false));

    for id in [window, sash, a, b] {
        let el = engine.tree().get(id).expect("still in the model");
        assert!(el.widget().is_none());
        assert!(el.renderer().is_none());
        assert!(el.context().is_none());
    }
    assert_eq!(engine.contexts().len(), 1);
    assert!(engine.contexts().contains(run_context));
    assert_eq!(engine.toolkit().live_widgets(), 0);
    assert_eq!(tally.disposed.get(), 2);
    assert_eq!(tally.persisted.get(), 2);
    assert_eq!(
        engine.tree().get(a).and_then(|el| el.persisted_state().get("doc")).map(String::as_str),
        Some("saved")
    );
}

#[test]
fn creating_a_rendered_element_again_changes_nothing() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let part = add(&mut engine, window, UIElement::part(DOC));
    start(&mut engine, app);
    let before = widget(&engine, part);
    let live = engine.toolkit().live_widgets();
    let contexts = engine.contexts().len();

    assert_eq!(engine.create(part).expect("no fatal error"), before);
    assert_eq!(engine.create(window).expect("no fatal error"), widget(&engine, window));

    assert_eq!(engine.toolkit().live_widgets(), live);
    assert_eq!(engine.contexts().len(), contexts);
    assert_eq!(tally.created.get(), 1);
}

#[test]
fn contexts_follow_the_element_hierarchy() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let perspective = add(
        &mut engine,
        window,
        UIElement::container(ContainerStyle::Perspective).with_variable("selection"),
    );
    let part = add(
        &mut engine,
        perspective,
        UIElement::part(DOC).with_property("title", "Outline"),
    );

    let run_context = start(&mut engine, app);

    let window_ctx = context(&engine, window).expect("window context");
    let perspective_ctx = context(&engine, perspective).expect("perspective context");
    let part_ctx = context(&engine, part).expect("part context");
    let contexts = engine.contexts();
    assert_eq!(contexts.parent(window_ctx), Ok(Some(run_context)));
    assert_eq!(contexts.parent(perspective_ctx), Ok(Some(window_ctx)));
    assert_eq!(contexts.parent(part_ctx), Ok(Some(perspective_ctx)));
    assert_eq!(
        contexts
            .lookup_as::<String>(part_ctx, "title")
            .expect("live")
            .as_deref()
            .map(String::as_str),
        Some("Outline")
    );
    assert_eq!(*tally.parts.borrow(), vec![part]);

    engine
        .contexts_mut()
        .modify(part_ctx, "selection", trellis_core::value(7_u32))
        .expect("declared by the perspective");
    assert!(
        engine
            .contexts()
            .get_local(perspective_ctx, "selection")
            .expect("live")
            .is_some()
    );
}

#[test]
fn failing_contribution_leaves_the_part_unrendered() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let sash = add(&mut engine, window, UIElement::container(ContainerStyle::Sash));
    let broken = add(&mut engine, sash, UIElement::part(BROKEN));
    let fine = add(&mut engine, sash, UIElement::part(DOC));

    start(&mut engine, app);

    assert!(widget(&engine, broken).is_none());
    assert!(context(&engine, broken).is_none());
    assert!(widget(&engine, fine).is_some());
    assert_eq!(engine.contained_failures(), 1);
    // run + window + the part that rendered
    assert_eq!(engine.contexts().len(), 3);
    let sash_widget = widget(&engine, sash).expect("sash");
    assert_eq!(engine.toolkit().children_of(sash_widget).len(), 1);
}

#[test]
fn custom_renderers_are_created_once_and_shared() {
    let tally = Rc::new(Tally::default());
    let built = Rc::new(Cell::new(0));
    let counter = Rc::clone(&built);
    let factory = common::contributions(&tally).renderer("bundle://fancy", move || {
        counter.set(counter.get() + 1);
        Rc::new(PartRenderer)
    });
    let mut engine = engine_builder()
        .contributions(factory)
        .config(common::one_shot())
        .build();
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let first = add(
        &mut engine,
        window,
        UIElement::part(DOC).with_persisted("custom_renderer", "bundle://fancy"),
    );
    let second = add(
        &mut engine,
        window,
        UIElement::part(DOC).with_persisted("custom_renderer", "bundle://fancy"),
    );

    start(&mut engine, app);

    assert_eq!(built.get(), 1);
    let custom = RendererId::Custom("bundle://fancy".into());
    for part in [first, second] {
        assert!(widget(&engine, part).is_some());
        assert_eq!(engine.tree().get(part).and_then(|el| el.renderer()), Some(&custom));
    }
    assert_eq!(engine.registry().custom_count(), 1);
}

#[test]
fn unknown_custom_renderer_is_contained() {
    let tally = Rc::new(Tally::default());
    let mut engine = engine_builder()
        .contributions(Contributions::new())
        .config(common::one_shot())
        .build();
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let part = add(
        &mut engine,
        window,
        UIElement::part(DOC).with_persisted("custom_renderer", "bundle://missing"),
    );

    start(&mut engine, app);

    assert!(widget(&engine, window).is_some());
    assert!(widget(&engine, part).is_none());
    assert_eq!(tally.created.get(), 0);
}

#[test]
fn removing_a_window_removes_menu_trim_and_detached_windows() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let menu = engine
        .tree_mut()
        .set_main_menu(window, UIElement::menu())
        .expect("menu");
    let entry = add(&mut engine, menu, UIElement::item().with_label("Open"));
    let bar = engine
        .tree_mut()
        .add_trim_bar(window, UIElement::container(ContainerStyle::TrimBar))
        .expect("trim bar");
    let detached = engine
        .tree_mut()
        .add_window(window, UIElement::window())
        .expect("detached");
    let detached_part = add(&mut engine, detached, UIElement::part(DOC));

    start(&mut engine, app);

    let shell = widget(&engine, window).expect("shell");
    let toolkit = engine.toolkit();
    let kind = |id| widget(&engine, id).and_then(|w| toolkit.widget(w)).map(|w| w.kind());
    assert_eq!(kind(menu), Some(WidgetKind::MenuBar));
    assert_eq!(kind(entry), Some(WidgetKind::Item));
    assert_eq!(kind(bar), Some(WidgetKind::ToolBar));
    assert_eq!(kind(detached), Some(WidgetKind::Shell));
    let detached_shell = widget(&engine, detached).expect("detached shell");
    assert_eq!(toolkit.native_parent(detached_shell), Some(shell));

    engine.remove(window).expect("no fatal error");

    for id in [window, menu, entry, bar, detached, detached_part] {
        assert!(widget(&engine, id).is_none());
    }
    assert_eq!(engine.toolkit().live_widgets(), 0);
    assert_eq!(tally.disposed.get(), 1);
}

#[test]
fn style_override_and_image_reach_the_widget() {
    let tally = Rc::new(Tally::default());
    let mut engine = common::engine(&tally);
    let app = engine.tree_mut().insert(UIElement::application());
    let window = add(&mut engine, app, UIElement::window());
    let part = add(
        &mut engine,
        window,
        UIElement::part(DOC)
            .with_icon("icons/outline.png")
            .with_persisted("style_override", "2048"),
    );

    start(&mut engine, app);

    let handle = widget(&engine, part).expect("part widget");
    let native = engine.toolkit().widget(handle).expect("live");
    assert_eq!(native.style(), 2048);
    assert_eq!(native.image(), Some("icons/outline.png"));
}
