//! Trailing-edge debouncing for query edits.
//!
//! A [`Debouncer`] owns at most one armed timer. Scheduling again before the
//! timer fires aborts it, so a burst of edits collapses into a single handler
//! call carrying the last arguments. Timers run on tokio's clock, which lets
//! tests drive them with `tokio::time::pause`/`advance`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

type Handler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

pub struct Debouncer<T> {
    label: &'static str,
    quiet: Duration,
    handler: Handler<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(label: &'static str, quiet: Duration, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            label,
            quiet,
            handler: Arc::new(move |args| handler(args).boxed()),
            pending: Mutex::new(None),
        }
    }

    /// Arms the timer with `args`, replacing any call still waiting.
    ///
    /// Must be called from within a tokio runtime. Once the quiet period
    /// elapses the handler runs on its own task, so a later `schedule` or
    /// [`cancel_pending`](Self::cancel_pending) never interrupts a handler
    /// that has already started.
    pub fn schedule(&self, args: T) {
        let handler = Arc::clone(&self.handler);
        let deadline = tokio::time::Instant::now() + self.quiet;
        let label = self.label;
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            trace!(channel = label, "debounce timer fired");
            tokio::spawn(handler(args));
        });
        if let Some(previous) = self.pending.lock().replace(timer) {
            if !previous.is_finished() {
                trace!(channel = label, "superseding pending call");
            }
            previous.abort();
        }
    }

    /// Drops the waiting call, if any. Returns whether one was waiting.
    pub fn cancel_pending(&self) -> bool {
        match self.pending.lock().take() {
            Some(timer) => {
                let was_waiting = !timer.is_finished();
                timer.abort();
                was_waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.get_mut().take() {
            timer.abort();
        }
    }
}
