//! Write-once promises and the futures that observe them.
//!
//! A [`Promise`] is completed exactly once with an [`Outcome`], a value and
//! an error, either of which may be absent. Any number of [`Future`] handles
//! wait on it, each bounded by its own cancellation token or [`Context`].
//!
//! # Architecture
//!
//! - **Completion** is gated by an atomic flag and published through a
//!   `tokio_util` cancellation token used as a one-shot latch. Waiters select
//!   on that latch and their own cancellation; completion wins ties.
//! - **Listeners** come in two kinds. Synchronous completers run on the
//!   completing thread before `complete` returns. Asynchronous listeners run
//!   as one batch on Tokio's blocking pool, or on a fresh thread outside a
//!   runtime.
//! - **Panics** in listeners are caught and routed to a single handler.
//! - **Combinators** ([`block`], [`join`], [`flatten`], [`map`],
//!   [`join_map`]) build on the same primitives. Mergers are called from one
//!   task, never concurrently.
//!
//! # Modules
//!
//! - [`error`] -- [`FutureError`]
//! - [`outcome`] -- [`Outcome`]
//! - [`context`] -- [`Context`], a token plus an optional deadline
//! - [`future`] -- [`Future`] and fixed-value constructors
//! - [`promise`] -- [`Promise`], [`PromiseBuilder`], [`Panic`]
//! - [`merge`] -- [`Merger`], [`Discard`], [`FirstError`]
//! - [`combinators`] -- Blocking, joining, flattening and mapping
//! - [`must`] -- [`must()`] and [`Lazy`]

pub mod combinators;
pub mod context;
pub mod error;
pub mod future;
pub mod merge;
pub mod must;
pub mod outcome;
pub mod promise;

pub use combinators::{
    block, block_context, flat_map, flatten, join, join_context, join_flat_map, join_map, map,
    Nested,
};
pub use context::Context;
pub use error::{FutureError, Result};
pub use future::Future;
pub use merge::{Discard, FirstError, Merger};
pub use must::{must, Lazy};
pub use outcome::Outcome;
pub use promise::{Panic, Promise, PromiseBuilder};

pub use tokio_util::sync::CancellationToken;
