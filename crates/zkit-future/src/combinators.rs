//! Waiting on, joining and transforming futures.

use tokio::task::JoinSet;
use tracing::warn;

use crate::context::Context;
use crate::error::FutureError;
use crate::future::Future;
use crate::merge::Merger;
use crate::outcome::Outcome;
use crate::promise::Promise;

enum Waited<T> {
    Completed(Outcome<T>),
    Preempted(FutureError),
}

/// Wait for every future and merge their outcomes.
pub async fn block<T, A, M, I>(merger: M, futures: I) -> Outcome<A>
where
    T: Clone + Send + Sync + 'static,
    M: Merger<T, A>,
    I: IntoIterator<Item = Future<T>>,
{
    block_context(&Context::background(), merger, futures).await
}

/// Wait for every future, or until `ctx` is done, merging as they finish.
///
/// The merger sees each future exactly once: its outcome if it completed,
/// or the context's error if the wait was preempted first. Merges happen on
/// the calling task one at a time, in completion order. A preempted wait
/// only updates the error of the merged result.
pub async fn block_context<T, A, M, I>(ctx: &Context, mut merger: M, futures: I) -> Outcome<A>
where
    T: Clone + Send + Sync + 'static,
    M: Merger<T, A>,
    I: IntoIterator<Item = Future<T>>,
{
    let mut waiters = JoinSet::new();
    for future in futures {
        let ctx = ctx.clone();
        waiters.spawn(async move {
            tokio::select! {
                biased;
                _ = future.done() => Waited::Completed(future.outcome().unwrap_or_default()),
                err = ctx.done() => match future.outcome() {
                    Some(outcome) => Waited::Completed(outcome),
                    None => Waited::Preempted(err),
                },
            }
        });
    }

    let mut merged = Outcome::nil();
    while let Some(joined) = waiters.join_next().await {
        match joined {
            Ok(Waited::Completed(outcome)) => merged = merger.merge(outcome),
            Ok(Waited::Preempted(err)) => merged.error = merger.merge(Outcome::err(err)).error,
            Err(e) => {
                warn!(error = %e, "future waiter failed");
                merged.error = merger.merge(Outcome::err(FutureError::other(e))).error;
            }
        }
    }
    merged
}

/// Non-blocking [`block`]: the merged outcome arrives through the returned
/// future.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn join<T, A, M, I>(merger: M, futures: I) -> Future<A>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    M: Merger<T, A> + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    join_context(Context::background(), merger, futures)
}

/// Non-blocking [`block_context`].
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn join_context<T, A, M, I>(ctx: Context, merger: M, futures: I) -> Future<A>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    M: Merger<T, A> + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    let futures: Vec<_> = futures.into_iter().collect();
    let promise = Promise::new();
    let completer = promise.clone();
    tokio::spawn(async move {
        completer.complete(block_context(&ctx, merger, futures).await);
    });
    promise.future()
}

/// A value that may itself be a future, for [`flatten`].
#[derive(Clone, Debug)]
pub enum Nested<T> {
    Future(Future<T>),
    Value(T),
}

/// Unwrap one level of future.
///
/// A nested future is returned as is. An error, or no value at all, passes
/// through unchanged. A plain value is reported alongside
/// [`FutureError::InvalidFlatten`].
pub fn flatten<T>(outcome: Outcome<Nested<T>>) -> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    match outcome {
        Outcome {
            value: Some(Nested::Future(future)),
            error: None,
        } => future,
        Outcome {
            value: Some(Nested::Value(value)),
            error: None,
        } => Future::fixture(Some(value), Some(FutureError::InvalidFlatten)),
        Outcome { value, error } => {
            let value = match value {
                Some(Nested::Value(value)) => Some(value),
                _ => None,
            };
            Future::fixture(value, error)
        }
    }
}

/// Transform the eventual outcome of `future`.
///
/// Lazy: nothing waits until the returned future is awaited. Use
/// [`join_map`] to get a [`Future`] that can go straight into [`join`] or
/// [`block`].
pub async fn map<T, U, F>(ctx: &Context, future: &Future<T>, mapper: F) -> Future<U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    F: FnOnce(Outcome<T>) -> Future<U>,
{
    mapper(future.block_context(ctx).await)
}

/// [`map`] with [`flatten`] as the mapper.
pub async fn flat_map<T>(ctx: &Context, future: &Future<Nested<T>>) -> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    map(ctx, future, flatten).await
}

/// Non-blocking [`map`]: the mapper runs on a spawned task and the mapped
/// outcome completes the returned future.
///
/// Waiting on the mapped future is bounded by `ctx` too.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn join_map<T, U, F>(ctx: Context, future: Future<T>, mapper: F) -> Future<U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    F: FnOnce(Outcome<T>) -> Future<U> + Send + 'static,
{
    let promise = Promise::new();
    let completer = promise.clone();
    tokio::spawn(async move {
        let mapped = map(&ctx, &future, mapper).await;
        completer.complete(mapped.block_context(&ctx).await);
    });
    promise.future()
}

/// Non-blocking [`flat_map`].
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn join_flat_map<T>(ctx: Context, future: Future<Nested<T>>) -> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    join_map(ctx, future, flatten)
}
