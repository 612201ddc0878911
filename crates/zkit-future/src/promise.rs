//! Write-once completion.
//!
//! # Completion order
//!
//! `complete` runs in three steps:
//!
//! 1. The outcome is stored.
//! 2. Synchronous completers (registered through [`PromiseBuilder`]) run on
//!    the completing thread, last registered first.
//! 3. The done latch is released and asynchronous listeners (registered
//!    through [`Promise::on_complete`]) are handed to a single background
//!    task, which runs them in registration order.
//!
//! A panic in any listener is caught and handed to the panic handler, or
//! logged when there is none. It never reaches the thread that called
//! `complete`.

use std::any::Any;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::FutureError;
use crate::future::Future;
use crate::outcome::Outcome;

type Listener<T> = Box<dyn FnOnce(&Outcome<T>) + Send>;
type PanicHandler<T> = Arc<dyn Fn(Panic<T>) + Send + Sync>;

/// A recovered listener panic together with the outcome being delivered.
pub struct Panic<T> {
    pub recovered: Box<dyn Any + Send>,
    pub outcome: Outcome<T>,
}

impl<T> Panic<T> {
    /// The panic message, when the payload is a string.
    pub fn message(&self) -> Option<&str> {
        panic_message(self.recovered.as_ref())
    }
}

impl<T: fmt::Debug> fmt::Debug for Panic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panic")
            .field("message", &self.message())
            .field("outcome", &self.outcome)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

struct State<T> {
    outcome: Option<Outcome<T>>,
    completers: Vec<Listener<T>>,
    listeners: Vec<Listener<T>>,
    panic_handler: Option<PanicHandler<T>>,
}

/// State shared by a promise and every future derived from it.
pub(crate) struct Shared<T> {
    completed: AtomicBool,
    done: CancellationToken,
    state: Mutex<State<T>>,
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(completers: Vec<Listener<T>>) -> Self {
        Self {
            completed: AtomicBool::new(false),
            done: CancellationToken::new(),
            state: Mutex::new(State {
                outcome: None,
                completers,
                listeners: Vec::new(),
                panic_handler: None,
            }),
        }
    }

    // Listeners never run under the lock, so a poisoned lock still holds
    // consistent state.
    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn done_token(&self) -> &CancellationToken {
        &self.done
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.is_cancelled()
    }

    /// The stored outcome, once the done latch is released.
    pub(crate) fn outcome(&self) -> Option<Outcome<T>> {
        if !self.is_done() {
            return None;
        }
        self.state().outcome.clone()
    }

    fn complete(&self, outcome: Outcome<T>) -> bool {
        if self.completed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let (completers, handler) = {
            let mut state = self.state();
            state.outcome = Some(outcome.clone());
            (mem::take(&mut state.completers), state.panic_handler.clone())
        };
        for completer in completers.into_iter().rev() {
            guarded(|| completer(&outcome), &outcome, handler.as_ref());
        }

        let (listeners, handler) = {
            let mut state = self.state();
            self.done.cancel();
            (mem::take(&mut state.listeners), state.panic_handler.clone())
        };
        if !listeners.is_empty() {
            schedule(listeners, outcome, handler);
        }
        true
    }

    fn on_complete(&self, listener: Listener<T>) {
        let mut state = self.state();
        if !self.is_done() {
            state.listeners.push(listener);
            return;
        }
        let outcome = state.outcome.clone().unwrap_or_default();
        let handler = state.panic_handler.clone();
        drop(state);
        schedule(vec![listener], outcome, handler);
    }

    fn on_panic(&self, handler: PanicHandler<T>) {
        let mut state = self.state();
        if !self.is_done() {
            state.panic_handler = Some(handler);
        }
    }
}

/// Run `f`, routing a panic to `handler`.
fn guarded<T, F>(f: F, outcome: &Outcome<T>, handler: Option<&PanicHandler<T>>)
where
    T: Clone,
    F: FnOnce(),
{
    let Err(recovered) = panic::catch_unwind(AssertUnwindSafe(f)) else {
        return;
    };
    match handler {
        Some(handler) => {
            let p = Panic {
                recovered,
                outcome: outcome.clone(),
            };
            if panic::catch_unwind(AssertUnwindSafe(|| handler(p))).is_err() {
                error!("promise panic handler panicked");
            }
        }
        None => {
            error!(
                panic = panic_message(recovered.as_ref()).unwrap_or("<non-string payload>"),
                "promise listener panicked"
            );
        }
    }
}

/// Run a batch of listeners off the completing thread.
fn schedule<T>(listeners: Vec<Listener<T>>, outcome: Outcome<T>, handler: Option<PanicHandler<T>>)
where
    T: Clone + Send + Sync + 'static,
{
    let count = listeners.len();
    let batch = move || {
        for listener in listeners {
            guarded(|| listener(&outcome), &outcome, handler.as_ref());
        }
    };
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(batch);
        }
        Err(_) => {
            if let Err(e) = thread::Builder::new()
                .name("promise-listeners".into())
                .spawn(batch)
            {
                error!(error = %e, listeners = count, "failed to start listener thread");
                return;
            }
        }
    }
    debug!(listeners = count, "scheduled completion listeners");
}

/// The writing side of a [`Future`].
///
/// Clones share the same state; whichever clone completes first wins.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> PromiseBuilder<T> {
        PromiseBuilder {
            completers: Vec::new(),
        }
    }

    /// A promise already completed with neither value nor error.
    pub fn completed() -> Self {
        let promise = Self::new();
        promise.complete(Outcome::nil());
        promise
    }

    pub fn future(&self) -> Future<T> {
        Future::from_shared(Arc::clone(&self.shared))
    }

    pub fn is_completed(&self) -> bool {
        self.shared.is_done()
    }

    /// Complete with `outcome`. Only the first call has any effect.
    pub fn complete(&self, outcome: Outcome<T>) {
        if !self.shared.complete(outcome) {
            debug!("promise already completed");
        }
    }

    pub fn value(&self, value: T) -> &Self {
        self.complete(Outcome::ok(value));
        self
    }

    pub fn error(&self, error: FutureError) -> &Self {
        self.complete(Outcome::err(error));
        self
    }

    /// Complete with [`FutureError::Canceled`].
    pub fn cancel(&self) -> &Self {
        self.error(FutureError::Canceled)
    }

    /// Run `listener` in the background once the promise completes.
    ///
    /// If it has already completed, the listener is scheduled right away;
    /// the caller is never blocked either way.
    pub fn on_complete<F>(&self, listener: F) -> &Self
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        self.shared.on_complete(Box::new(listener));
        self
    }

    /// Install the panic handler, replacing any previous one. Has no effect
    /// once the promise has completed.
    pub fn on_panic<F>(&self, handler: F) -> &Self
    where
        F: Fn(Panic<T>) + Send + Sync + 'static,
    {
        self.shared.on_panic(Arc::new(handler));
        self
    }

    /// A detached handle that completes this promise.
    pub fn completer(&self) -> impl Fn(Outcome<T>) + Clone + Send + Sync + 'static {
        let promise = self.clone();
        move |outcome| promise.complete(outcome)
    }
}

impl<T> Default for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("completed", &self.shared.done.is_cancelled())
            .finish()
    }
}

/// Configures synchronous completers before a [`Promise`] exists.
pub struct PromiseBuilder<T> {
    completers: Vec<Listener<T>>,
}

impl<T> PromiseBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run `f` on the completing thread before `complete` returns.
    ///
    /// Completers should not block.
    pub fn on_completion<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        self.completers.push(Box::new(f));
        self
    }

    /// [`on_completion`](Self::on_completion), only when `condition` holds.
    pub fn on_completion_if<F>(self, condition: bool, f: F) -> Self
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        if condition {
            self.on_completion(f)
        } else {
            self
        }
    }

    pub fn build(self) -> Promise<T> {
        Promise {
            shared: Arc::new(Shared::new(self.completers)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn completes_exactly_once() {
        let promise = Promise::new();
        promise.value("x");
        promise.value("y");
        promise.cancel();
        let future = promise.future();
        assert_eq!(future.value(), Some("x"));
        assert_eq!(future.err(), None);
    }

    #[tokio::test]
    async fn async_listeners_run_once_in_registration_order() {
        let promise = Promise::<&'static str>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        for i in 0..3 {
            let calls = Arc::clone(&calls);
            let tx = tx.clone();
            promise.on_complete(move |outcome| {
                calls.fetch_add(1, Ordering::SeqCst);
                tx.send((i, outcome.clone())).unwrap();
            });
        }

        promise.complete(Outcome::ok("x"));
        promise.complete(Outcome::ok("x"));

        let received: Vec<_> = (0..3).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
        assert_eq!(
            received,
            vec![(0, Outcome::ok("x")), (1, Outcome::ok("x")), (2, Outcome::ok("x"))]
        );
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn listener_after_completion_is_scheduled() {
        let promise = Promise::new();
        promise.value(7);
        let (tx, rx) = mpsc::channel();
        promise.on_complete(move |outcome| tx.send(outcome.value).unwrap());
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Some(7));
    }

    #[test]
    fn sync_completers_run_in_reverse_before_complete_returns() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut builder = Promise::<i32>::builder();
        for i in 1..=3 {
            let order = Arc::clone(&order);
            builder = builder.on_completion(move |_| order.lock().unwrap().push(i));
        }
        let skipped = Arc::clone(&order);
        let promise = builder
            .on_completion_if(false, move |_| skipped.lock().unwrap().push(99))
            .build();

        promise.value(0);
        assert_eq!(*order.lock().unwrap(), vec![3, 2, 1]);
    }

    #[test]
    fn completer_panic_goes_to_handler() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_after = Arc::clone(&ran);
        let promise = Promise::<i32>::builder()
            .on_completion(move |_| ran_after.store(true, Ordering::SeqCst))
            .on_completion(|_| panic!("completer failed"))
            .build();

        let (tx, rx) = mpsc::channel();
        promise.on_panic(move |p| {
            tx.send((p.message().map(str::to_string), p.outcome)).unwrap();
        });
        promise.value(5);

        let (message, outcome) = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(message.as_deref(), Some("completer failed"));
        assert_eq!(outcome, Outcome::ok(5));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn listener_panic_does_not_stop_batch() {
        let promise = Promise::new();
        let (tx, rx) = mpsc::channel();
        promise.on_panic({
            let tx = tx.clone();
            move |p: Panic<i32>| tx.send(format!("panic: {}", p.message().unwrap_or(""))).unwrap()
        });
        promise.on_complete(|_| panic!("first"));
        promise.on_complete(move |outcome| tx.send(format!("value: {:?}", outcome.value)).unwrap());
        promise.value(1);

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "panic: first");
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "value: Some(1)");
    }

    #[test]
    fn unhandled_panic_is_contained() {
        let promise = Promise::<()>::builder()
            .on_completion(|_| panic!("nobody listening"))
            .build();
        promise.value(());
        assert!(promise.is_completed());
    }

    #[test]
    fn panic_handler_fixed_at_completion() {
        let promise = Promise::new();
        let (tx, rx) = mpsc::channel();
        promise.on_panic(move |_: Panic<i32>| tx.send("original").unwrap());
        promise.value(1);

        let replaced = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&replaced);
        promise.on_panic(move |_| flag.store(true, Ordering::SeqCst));
        promise.on_complete(|_| panic!("late"));

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "original");
        assert!(!replaced.load(Ordering::SeqCst));
    }

    #[test]
    fn completed_promise() {
        let promise = Promise::<String>::completed();
        assert!(promise.is_completed());
        assert_eq!(promise.future().outcome(), Some(Outcome::nil()));
    }

    #[test]
    fn cancel_and_error() {
        let canceled = Promise::<i32>::new();
        canceled.cancel();
        assert_eq!(canceled.future().err(), Some(FutureError::Canceled));

        let failed = Promise::<i32>::new();
        failed.error(FutureError::msg("boom"));
        assert_eq!(failed.future().err().unwrap().to_string(), "boom");
    }

    #[test]
    fn completer_handle() {
        let promise = Promise::new();
        let complete = promise.completer();
        let handle = thread::spawn(move || complete(Outcome::ok("done")));
        handle.join().unwrap();
        assert_eq!(promise.future().value(), Some("done"));
    }
}
