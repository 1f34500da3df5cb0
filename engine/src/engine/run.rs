//! The event loop.

use trellis_core::{ContextId, ElementId, KindTag, UIElement};

use super::RenderingEngine;
use crate::{FatalError, LoopControl, NativeEvent, RenderError, Toolkit, boundary::catch_panic};

/// How the run loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// [`RenderingEngine::stop`] was called, or a one-shot run finished.
    Ok,
    /// The idle advisor's exception hook asked to terminate.
    Terminated,
}

impl<T: Toolkit> RenderingEngine<T> {
    /// Renders `root` and pumps the toolkit's event loop until stopped.
    ///
    /// `run_context` becomes the context of the application root; every
    /// renderable window of the application is created under it. A window may
    /// also be passed as `root` directly.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised while rendering or reacting.
    pub fn run(&mut self, root: ElementId, run_context: ContextId) -> Result<ExitCode, FatalError> {
        self.bootstrap(root, run_context)?;
        self.running = true;
        self.exit = ExitCode::Ok;
        tracing::info!(root = %self.describe(root), "event loop started");

        while self.running && !self.toolkit.is_shut_down() {
            match catch_panic(|| self.toolkit.read_and_dispatch()) {
                Ok(Some(event)) => {
                    let outcome = catch_panic(|| self.dispatch_native(&event));
                    self.settle(outcome)?;
                }
                Ok(None) => {
                    let outcome = catch_panic(|| self.drain_deferred());
                    self.settle(outcome)?;
                    self.process_model_events()?;
                    if self.config.one_shot {
                        break;
                    }
                    if self.running && !self.toolkit.is_shut_down() {
                        let sleep = self.config.idle_sleep();
                        self.idle.on_idle(&mut self.toolkit, sleep);
                    }
                }
                Err(error) => self.settle(Err(error))?,
            }
        }

        self.running = false;
        tracing::info!(exit = ?self.exit, "event loop finished");
        Ok(self.exit)
    }

    fn bootstrap(&mut self, root: ElementId, run_context: ContextId) -> Result<(), FatalError> {
        let subject = self.describe(root);
        let fatal = |error: RenderError| FatalError::new(subject.clone(), error.to_string());

        let kind = self.tree.element(root).map_err(|e| fatal(e.into()))?.kind_tag();
        let discarded = self.tree.drain_events().count();
        if discarded > 0 {
            tracing::debug!(count = discarded, "discarded model events queued before start");
        }
        self.root = Some(root);

        match kind {
            KindTag::Application => {
                self.element_mut(root).map_err(&fatal)?.set_context(Some(run_context));
                self.register_element(run_context, root).map_err(&fatal)?;
                let windows = self.tree.children(root).to_vec();
                for window in windows {
                    if self.tree.get(window).is_some_and(UIElement::to_be_rendered) {
                        self.create_in(window, None, Some(run_context))?;
                    }
                }
            }
            _ => {
                self.create_in(root, None, Some(run_context))?;
            }
        }
        Ok(())
    }

    /// Routes a native event to the renderer of the element owning its widget,
    /// then handles the model events that caused.
    fn dispatch_native(&mut self, event: &NativeEvent) -> Result<(), RenderError> {
        let Some(element) = self.element_for_widget(event.widget) else {
            tracing::trace!(widget = %event.widget, "event for a widget without element");
            return Ok(());
        };
        if let Some(renderer) = self.renderer_of(element) {
            renderer.handle_event(self, element, event)?;
        }
        self.process_model_events()?;
        Ok(())
    }

    fn drain_deferred(&mut self) -> Result<(), RenderError> {
        let pending = self.deferred.len();
        for _ in 0..pending {
            let Some(task) = self.deferred.pop_front() else {
                break;
            };
            task(self)?;
        }
        Ok(())
    }

    /// Routes an error that escaped dispatch to the idle advisor.
    fn settle(&mut self, outcome: Result<(), RenderError>) -> Result<(), FatalError> {
        let Err(error) = outcome else {
            return Ok(());
        };
        if error.is_fatal() {
            tracing::error!(error = %error, "fatal error in the event loop");
            return Err(FatalError::new("event loop", error.to_string()));
        }
        if self.idle.on_exception(&error) == LoopControl::Terminate {
            tracing::warn!(error = %error, "terminating the event loop");
            self.exit = ExitCode::Terminated;
            self.running = false;
            self.toolkit.shutdown();
        }
        Ok(())
    }

    /// Queues `task` to run on the loop thread once no native event is pending.
    pub fn async_exec(
        &mut self,
        task: impl FnOnce(&mut Self) -> Result<(), RenderError> + 'static,
    ) {
        self.deferred.push_back(Box::new(task));
    }

    /// Number of tasks queued with [`async_exec`](Self::async_exec).
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }

    /// Whether the loop is pumping.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Stops the loop: removes the rendered windows of the root, which
    /// persists the state of their parts, and shuts the toolkit down.
    ///
    /// # Errors
    ///
    /// Returns fatal errors raised while removing windows.
    pub fn stop(&mut self) -> Result<(), FatalError> {
        if let Some(root) = self.root {
            let windows = match self.tree.get(root).map(UIElement::kind_tag) {
                Some(KindTag::Application) => self.tree.children(root).to_vec(),
                Some(_) => vec![root],
                None => Vec::new(),
            };
            for window in windows {
                if self.tree.get(window).and_then(UIElement::widget).is_some() {
                    self.remove(window)?;
                }
            }
        }
        self.running = false;
        self.exit = ExitCode::Ok;
        self.toolkit.shutdown();
        tracing::info!("engine stopped");
        Ok(())
    }
}
