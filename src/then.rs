//! Map the value channel of a sender through a function.

use core::fmt::{self, Debug};

use crate::signature::{
    ApplyVariant, Concat, Cons, ErrorSignaturesOf, MapRows, StoppedSignaturesOf, TupleRow,
    UniformVariant, ValuePayloadOf, ValueSignature, ValueSignaturesOf,
};
use crate::traits::{
    ErrorReceiver, Receiver, SenderIn, SenderTo, StoppedReceiver, ValueReceiver,
};

/// Applies `fun` to the value delivered by `sender`, forwarding errors
/// and stops untouched.
///
/// The input sender must have a uniform value channel; its payload tuple
/// is passed to `fun` whole, and the result becomes the single element
/// of the new value payload.
///
/// # Examples
///
/// ```
/// use sender_concurrency::{just, sync_wait, then};
///
/// let doubled = then(just((21,)), |(n,): (i32,)| n * 2);
/// assert_eq!(sync_wait(doubled).into_value(), Some((42,)));
/// ```
pub fn then<S, F>(sender: S, fun: F) -> Then<S, F> {
    Then { sender, fun }
}

/// Sender for the [`then`] function.
///
/// Signature resolution is environment-dependent: the inner sender is
/// resolved under the outer receiver's environment, so `Then` answers
/// the [`SenderIn`] query directly rather than declaring a fixed set.
#[derive(Clone)]
#[must_use = "senders do nothing unless connected to a receiver and started"]
pub struct Then<S, F> {
    sender: S,
    fun: F,
}

impl<S: Debug, F> Debug for Then<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Then")
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

impl<S, F, Out, Env> SenderIn<Env> for Then<S, F>
where
    S: SenderIn<Env>,
    F: FnOnce(ValuePayloadOf<S, Env>) -> Out,
    ValueSignaturesOf<S, Env>: MapRows<TupleRow>,
    UniformVariant: ApplyVariant<<ValueSignaturesOf<S, Env> as MapRows<TupleRow>>::Output>,
    ErrorSignaturesOf<S, Env>: Concat<StoppedSignaturesOf<S, Env>>,
{
    type Signatures = Cons<
        ValueSignature<(Out,)>,
        <ErrorSignaturesOf<S, Env> as Concat<StoppedSignaturesOf<S, Env>>>::Output,
    >;
}

impl<S, F, R> SenderTo<R> for Then<S, F>
where
    R: Receiver,
    Self: SenderIn<R::Env>,
    S: SenderIn<R::Env>,
    ValueSignaturesOf<S, R::Env>: MapRows<TupleRow>,
    UniformVariant: ApplyVariant<<ValueSignaturesOf<S, R::Env> as MapRows<TupleRow>>::Output>,
    S: SenderTo<ThenReceiver<F, R>>,
{
    type Operation = <S as SenderTo<ThenReceiver<F, R>>>::Operation;

    fn connect(self, receiver: R) -> Self::Operation {
        self.sender.connect(ThenReceiver {
            fun: self.fun,
            receiver,
        })
    }
}

/// The receiver [`Then`] interposes between its child and the outer
/// receiver.
pub struct ThenReceiver<F, R> {
    fun: F,
    receiver: R,
}

impl<F, R: Debug> Debug for ThenReceiver<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThenReceiver")
            .field("receiver", &self.receiver)
            .finish_non_exhaustive()
    }
}

impl<F, R: Receiver> Receiver for ThenReceiver<F, R> {
    type Env = R::Env;

    fn env(&self) -> R::Env {
        self.receiver.env()
    }
}

impl<F, R, Args, Out> ValueReceiver<Args> for ThenReceiver<F, R>
where
    F: FnOnce(Args) -> Out,
    R: ValueReceiver<(Out,)>,
{
    fn set_value(self, args: Args) {
        let out = (self.fun)(args);
        self.receiver.set_value((out,));
    }
}

impl<F, R, E> ErrorReceiver<E> for ThenReceiver<F, R>
where
    R: ErrorReceiver<E>,
{
    fn set_error(self, error: E) {
        self.receiver.set_error(error);
    }
}

impl<F, R> StoppedReceiver for ThenReceiver<F, R>
where
    R: StoppedReceiver,
{
    fn set_stopped(self) {
        self.receiver.set_stopped();
    }
}
