//! Runtime carriers for completions: the three-channel [`Completion`]
//! outcome, channel holders that store a completion for later replay,
//! and the [`Either`]/[`Never`] chain types the general materialization
//! path produces.

use crate::signature::{
    ApplyRow, ErrorSignaturesOf, Materialized, SlotVariant, ValueSignaturesOf,
};
use crate::traits::{EmptyEnv, ErrorReceiver, Receiver, StoppedReceiver, ValueReceiver};

/// An uninhabited type: the materialization of an empty channel.
#[derive(Debug, Clone, Copy)]
pub enum Never {}

/// One of two alternatives. Right-nested chains of `Either`, terminated
/// by [`Never`], are how a channel with several signatures materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either<A, B> {
    /// The first alternative.
    Left(A),
    /// The second alternative.
    Right(B),
}

/// A terminal outcome: exactly one of the three completion channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion<V, E> {
    /// The value channel, with its payload.
    Value(V),
    /// The error channel, with its payload.
    Error(E),
    /// The stopped channel.
    Stopped,
}

impl<V, E> Completion<V, E> {
    /// Returns the value payload, if this is a value completion.
    pub fn into_value(self) -> Option<V> {
        match self {
            Completion::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the error payload, if this is an error completion.
    pub fn into_error(self) -> Option<E> {
        match self {
            Completion::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Whether this is a stopped completion.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Completion::Stopped)
    }
}

/// A stored value completion, replayable into any receiver accepting its
/// payload tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueHolder<Args>(pub Args);

/// A stored error completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorHolder<E>(pub E);

/// A stored stopped completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoppedHolder;

/// Replays a stored completion into a receiver, consuming both.
///
/// Implemented by the channel holders, by [`Either`] chains of them, by
/// [`Never`] (vacuously; an empty channel never has anything to replay)
/// and by [`Completion`] over replayable halves.
pub trait DeliverTo<R> {
    /// Invokes exactly one completion operation on `receiver`.
    fn deliver(self, receiver: R);
}

impl<R: Receiver> DeliverTo<R> for Never {
    fn deliver(self, _receiver: R) {
        match self {}
    }
}

impl<Args, R: ValueReceiver<Args>> DeliverTo<R> for ValueHolder<Args> {
    fn deliver(self, receiver: R) {
        receiver.set_value(self.0);
    }
}

impl<E, R: ErrorReceiver<E>> DeliverTo<R> for ErrorHolder<E> {
    fn deliver(self, receiver: R) {
        receiver.set_error(self.0);
    }
}

impl<R: StoppedReceiver> DeliverTo<R> for StoppedHolder {
    fn deliver(self, receiver: R) {
        receiver.set_stopped();
    }
}

impl<A, B, R> DeliverTo<R> for Either<A, B>
where
    A: DeliverTo<R>,
    B: DeliverTo<R>,
{
    fn deliver(self, receiver: R) {
        match self {
            Either::Left(a) => a.deliver(receiver),
            Either::Right(b) => b.deliver(receiver),
        }
    }
}

impl<V, E, R> DeliverTo<R> for Completion<V, E>
where
    V: DeliverTo<R>,
    E: DeliverTo<R>,
    R: StoppedReceiver,
{
    fn deliver(self, receiver: R) {
        match self {
            Completion::Value(value) => value.deliver(receiver),
            Completion::Error(error) => error.deliver(receiver),
            Completion::Stopped => receiver.set_stopped(),
        }
    }
}

/// The row family producing [`ValueHolder`] rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueHolderRow;

impl<Args> ApplyRow<Args> for ValueHolderRow {
    type Out = ValueHolder<Args>;
}

/// The row family producing [`ErrorHolder`] rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorHolderRow;

impl<E> ApplyRow<(E,)> for ErrorHolderRow {
    type Out = ErrorHolder<E>;
}

/// The holder for a sender's single value signature, or [`Never`] if it
/// has none.
pub type ValueSlotOf<S, Env = EmptyEnv> =
    Materialized<ValueSignaturesOf<S, Env>, ValueHolderRow, SlotVariant>;

/// The holder for a sender's single error signature, or [`Never`] if it
/// has none.
pub type ErrorSlotOf<S, Env = EmptyEnv> =
    Materialized<ErrorSignaturesOf<S, Env>, ErrorHolderRow, SlotVariant>;

/// A storable, replayable completion of the sender `S` under `Env`.
pub type CompletionOf<S, Env = EmptyEnv> = Completion<ValueSlotOf<S, Env>, ErrorSlotOf<S, Env>>;
