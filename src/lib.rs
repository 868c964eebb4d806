//! Sender/receiver composition primitives with a compile-time
//! completion-signature algebra and lock-free race combinators.
//!
//! A sender describes an asynchronous operation without running it; a
//! receiver is the continuation it completes into, one consuming method
//! per completion channel (value, error, stopped). [`connect`] binds the
//! two into an operation state, and [`OperationState::start`] launches
//! it. What a sender may deliver is knowable before anything runs: its
//! completion signature set is a type-level list resolved, projected and
//! materialized entirely at compile time by the [`signature`] module.
//!
//! # Operations
//!
//! This library provides the following operations on tuples of senders:
//!
//! - [`when_any::WhenAny`]: Wait for the first sender to complete, with
//!   any outcome.
//! - [`when_any::FirstSuccessful`]: Wait for the first sender to
//!   complete with a value; failures are held until the end.
//! - [`when_any::stop_when`]: Run a sender until a trigger completes.
//!
//! Along with leaf senders ([`just`], [`just_error`], [`just_stopped`]),
//! adaptors ([`then`], [`upon_stopped`]), [`scheduler`]s to move work
//! off-thread, and [`sync_wait`] to block on a result.
//!
//! # Examples
//!
//! Race two senders; the first value wins and the loser is cancelled
//! through its stop token:
//!
//! ```rust
//! use sender_concurrency::prelude::*;
//! use sender_concurrency::{just, just_error, sync_wait};
//!
//! let race = (just_error("boom"), just((42,))).first_successful();
//! assert_eq!(sync_wait(race).into_value(), Some((42,)));
//! ```

#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]
#![allow(non_snake_case)]

pub mod completion;
pub mod ext;
pub mod just;
pub mod scheduler;
pub mod signature;
pub mod stop;
pub mod sync_wait;
pub mod then;
pub mod traits;
pub mod upon_stopped;
pub mod when_any;

/// The sender concurrency prelude.
pub mod prelude {
    pub use super::ext::SenderExt as _;
    pub use super::when_any::FirstSuccessful as _;
    pub use super::when_any::WhenAny as _;
}

pub use completion::{Completion, Either, Never};
pub use just::{just, just_error, just_stopped, Just, JustError, JustStopped};
pub use scheduler::{InlineScheduler, Scheduler, ThreadScheduler};
pub use stop::{StopCallback, StopSource, StopToken};
pub use sync_wait::sync_wait;
pub use then::then;
pub use traits::{
    connect, EmptyEnv, Environment, ErrorReceiver, OperationState, Receiver, Sender, SenderIn,
    SenderTo, StoppedReceiver, ValueReceiver,
};
pub use upon_stopped::upon_stopped;
pub use when_any::{first_successful, stop_when, when_any};
