//! The sender/receiver protocol: how an operation is described, bound to
//! its continuation, and started.
//!
//! A [`Sender`] is an inert description of an asynchronous operation. A
//! [`Receiver`] is its continuation: one consuming operation per
//! completion channel, of which exactly one runs, exactly once.
//! [`connect`] binds the two into an [`OperationState`], which owns every
//! resource the operation needs and exposes a single [`start`][OperationState::start].

use core::pin::Pin;

use crate::signature::SignatureList;
use crate::stop::StopToken;

/// The context a receiver provides to the operations completing into it.
///
/// Environments are cheap handles: combinators clone them freely. The one
/// capability modeled here is cooperative cancellation; environments
/// without a stop token return `None` and cost nothing.
pub trait Environment: Clone {
    /// The stop token observed by operations running under this
    /// environment, if it supports cancellation.
    fn stop_token(&self) -> Option<StopToken>;
}

/// An environment with no capabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyEnv;

impl Environment for EmptyEnv {
    fn stop_token(&self) -> Option<StopToken> {
        None
    }
}

/// A completion target for a connected operation.
///
/// Channel support is expressed through the [`ValueReceiver`],
/// [`ErrorReceiver`] and [`StoppedReceiver`] subtraits; implement one per
/// completion signature the receiver accepts. All three consume the
/// receiver, so "exactly one channel fires, exactly once" is enforced by
/// move semantics rather than by runtime checks.
pub trait Receiver {
    /// The environment exposed to the operation completing into this
    /// receiver.
    type Env: Environment;

    /// Returns this receiver's environment.
    fn env(&self) -> Self::Env;
}

/// A receiver accepting a value completion with payload tuple `Args`.
pub trait ValueReceiver<Args>: Receiver {
    /// Consumes the receiver with a successful result.
    fn set_value(self, args: Args);
}

/// A receiver accepting an error completion with payload `E`.
pub trait ErrorReceiver<E>: Receiver {
    /// Consumes the receiver with a failure.
    fn set_error(self, error: E);
}

/// A receiver accepting a stopped completion.
pub trait StoppedReceiver: Receiver {
    /// Consumes the receiver with a cancellation notice.
    fn set_stopped(self);
}

/// A sender with an environment-independent signature declaration.
///
/// Most senders know their completion signatures without consulting the
/// receiver; they declare them here and forward the [`SenderIn`] query
/// to the declaration for every environment:
///
/// ```
/// use sender_concurrency::signature::{Cons, Nil, ValueSignature};
/// use sender_concurrency::{Sender, SenderIn};
///
/// struct Ping;
///
/// impl Sender for Ping {
///     type Signatures = Cons<ValueSignature<()>, Nil>;
/// }
///
/// impl<Env> SenderIn<Env> for Ping {
///     type Signatures = <Ping as Sender>::Signatures;
/// }
/// ```
///
/// Senders whose signatures depend on the environment skip this trait
/// and answer [`SenderIn`] directly, per environment. A type providing
/// neither simply is not a sender.
pub trait Sender {
    /// Everything this sender may deliver.
    type Signatures: SignatureList;
}

/// The signature query: what can this sender deliver under environment
/// `Env`?
///
/// Combinators always resolve through this trait, never through
/// [`Sender`] directly, so environment-dependent senders compose like any
/// other.
pub trait SenderIn<Env> {
    /// Everything this sender may deliver under `Env`.
    type Signatures: SignatureList;
}

/// A sender that can be connected to the receiver `R`.
///
/// This holds exactly when `R` implements the channel trait for every
/// signature the sender may deliver under `R`'s environment; a receiver
/// missing a channel is a missing-impl compile error at the `connect`
/// call site.
///
/// Connecting consumes the sender. Multi-shot senders are [`Clone`] and
/// may be connected repeatedly from copies; single-shot senders (holding
/// move-only payloads) can be connected once.
pub trait SenderTo<R: Receiver>: SenderIn<R::Env> {
    /// The operation state produced by connecting to `R`.
    type Operation: OperationState;

    /// Binds this sender to `receiver`, producing an inert operation
    /// state. No work runs until [`OperationState::start`].
    fn connect(self, receiver: R) -> Self::Operation;
}

/// Binds a sender to a receiver. Free-function form of
/// [`SenderTo::connect`].
pub fn connect<S, R>(sender: S, receiver: R) -> S::Operation
where
    S: SenderTo<R>,
    R: Receiver,
{
    sender.connect(receiver)
}

/// The live state of a connected operation.
///
/// An operation state is pinned for its whole life: it may lend its own
/// address out to child operations and callbacks. `start` must be called
/// at most once; it never blocks, and it eventually causes exactly one of
/// the receiver's completion operations to run, on an unspecified call
/// stack. The state must be kept alive until that completion has
/// returned.
pub trait OperationState {
    /// Launches the operation.
    fn start(self: Pin<&mut Self>);
}
