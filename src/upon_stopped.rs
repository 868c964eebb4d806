//! Convert a stopped completion into a value.

use core::fmt::{self, Debug};

use crate::signature::{
    Concat, Cons, ErrorSignaturesOf, Nil, ValueSignature, ValueSignaturesOf,
};
use crate::traits::{
    ErrorReceiver, Receiver, SenderIn, SenderTo, StoppedReceiver, ValueReceiver,
};

/// Replaces a stopped completion of `sender` with the value produced by
/// `fun`, forwarding values and errors untouched.
///
/// Useful at the edge of a cancellation scope, where "it was stopped" is
/// itself a result. The stopped signature disappears from the advertised
/// set and a value signature carrying `fun`'s output takes its place.
///
/// # Examples
///
/// ```
/// use sender_concurrency::{just_stopped, sync_wait, upon_stopped};
///
/// let recovered = upon_stopped(just_stopped(), || 42);
/// assert_eq!(sync_wait(recovered).into_value(), Some((42,)));
/// ```
pub fn upon_stopped<S, F>(sender: S, fun: F) -> UponStopped<S, F> {
    UponStopped { sender, fun }
}

/// Sender for the [`upon_stopped`] function.
#[derive(Clone)]
#[must_use = "senders do nothing unless connected to a receiver and started"]
pub struct UponStopped<S, F> {
    sender: S,
    fun: F,
}

impl<S: Debug, F> Debug for UponStopped<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UponStopped")
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

impl<S, F, Out, Env> SenderIn<Env> for UponStopped<S, F>
where
    S: SenderIn<Env>,
    F: FnOnce() -> Out,
    ValueSignaturesOf<S, Env>: Concat<ErrorSignaturesOf<S, Env>>,
    <ValueSignaturesOf<S, Env> as Concat<ErrorSignaturesOf<S, Env>>>::Output:
        Concat<Cons<ValueSignature<(Out,)>, Nil>>,
{
    type Signatures =
        <<ValueSignaturesOf<S, Env> as Concat<ErrorSignaturesOf<S, Env>>>::Output as Concat<
            Cons<ValueSignature<(Out,)>, Nil>,
        >>::Output;
}

impl<S, F, R> SenderTo<R> for UponStopped<S, F>
where
    R: Receiver,
    Self: SenderIn<R::Env>,
    S: SenderTo<UponStoppedReceiver<F, R>>,
{
    type Operation = <S as SenderTo<UponStoppedReceiver<F, R>>>::Operation;

    fn connect(self, receiver: R) -> Self::Operation {
        self.sender.connect(UponStoppedReceiver {
            fun: self.fun,
            receiver,
        })
    }
}

/// The receiver [`UponStopped`] interposes between its child and the
/// outer receiver.
pub struct UponStoppedReceiver<F, R> {
    fun: F,
    receiver: R,
}

impl<F, R: Debug> Debug for UponStoppedReceiver<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UponStoppedReceiver")
            .field("receiver", &self.receiver)
            .finish_non_exhaustive()
    }
}

impl<F, R: Receiver> Receiver for UponStoppedReceiver<F, R> {
    type Env = R::Env;

    fn env(&self) -> R::Env {
        self.receiver.env()
    }
}

impl<F, R, Args> ValueReceiver<Args> for UponStoppedReceiver<F, R>
where
    R: ValueReceiver<Args>,
{
    fn set_value(self, args: Args) {
        self.receiver.set_value(args);
    }
}

impl<F, R, E> ErrorReceiver<E> for UponStoppedReceiver<F, R>
where
    R: ErrorReceiver<E>,
{
    fn set_error(self, error: E) {
        self.receiver.set_error(error);
    }
}

impl<F, R, Out> StoppedReceiver for UponStoppedReceiver<F, R>
where
    F: FnOnce() -> Out,
    R: ValueReceiver<(Out,)>,
{
    fn set_stopped(self) {
        self.receiver.set_value(((self.fun)(),));
    }
}
