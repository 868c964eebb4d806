//! Leaf senders completing immediately, inline at start.

use core::pin::Pin;

use pin_project::pin_project;

use crate::signature::{Cons, ErrorSignature, Nil, StoppedSignature, ValueSignature};
use crate::traits::{
    ErrorReceiver, OperationState, Sender, SenderIn, SenderTo, StoppedReceiver, ValueReceiver,
};

/// A sender delivering `args` on the value channel as soon as it starts.
///
/// Multi-shot when the payload is [`Clone`]: clone the sender, connect
/// each copy. The payload is always a tuple, matching the payload list
/// of the single value signature it advertises.
///
/// # Examples
///
/// ```
/// use sender_concurrency::{just, sync_wait};
///
/// let outcome = sync_wait(just((1u8, "hi")));
/// assert_eq!(outcome.into_value(), Some((1, "hi")));
/// ```
pub fn just<Args>(args: Args) -> Just<Args> {
    Just { args }
}

/// A sender delivering `error` on the error channel as soon as it
/// starts.
pub fn just_error<E>(error: E) -> JustError<E> {
    JustError { error }
}

/// A sender completing stopped as soon as it starts.
pub fn just_stopped() -> JustStopped {
    JustStopped
}

/// Sender for the [`just`] function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "senders do nothing unless connected to a receiver and started"]
pub struct Just<Args> {
    args: Args,
}

impl<Args> Sender for Just<Args> {
    type Signatures = Cons<ValueSignature<Args>, Nil>;
}

impl<Args, Env> SenderIn<Env> for Just<Args> {
    type Signatures = <Self as Sender>::Signatures;
}

impl<Args, R> SenderTo<R> for Just<Args>
where
    R: ValueReceiver<Args>,
{
    type Operation = JustOp<Args, R>;

    fn connect(self, receiver: R) -> JustOp<Args, R> {
        JustOp {
            inner: Some((self.args, receiver)),
        }
    }
}

/// Operation state for the [`just`] sender.
#[pin_project]
#[must_use = "operation states do nothing unless started"]
#[derive(Debug)]
pub struct JustOp<Args, R> {
    inner: Option<(Args, R)>,
}

impl<Args, R> OperationState for JustOp<Args, R>
where
    R: ValueReceiver<Args>,
{
    fn start(self: Pin<&mut Self>) {
        let this = self.project();
        if let Some((args, receiver)) = this.inner.take() {
            receiver.set_value(args);
        }
    }
}

/// Sender for the [`just_error`] function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "senders do nothing unless connected to a receiver and started"]
pub struct JustError<E> {
    error: E,
}

impl<E> Sender for JustError<E> {
    type Signatures = Cons<ErrorSignature<E>, Nil>;
}

impl<E, Env> SenderIn<Env> for JustError<E> {
    type Signatures = <Self as Sender>::Signatures;
}

impl<E, R> SenderTo<R> for JustError<E>
where
    R: ErrorReceiver<E>,
{
    type Operation = JustErrorOp<E, R>;

    fn connect(self, receiver: R) -> JustErrorOp<E, R> {
        JustErrorOp {
            inner: Some((self.error, receiver)),
        }
    }
}

/// Operation state for the [`just_error`] sender.
#[pin_project]
#[must_use = "operation states do nothing unless started"]
#[derive(Debug)]
pub struct JustErrorOp<E, R> {
    inner: Option<(E, R)>,
}

impl<E, R> OperationState for JustErrorOp<E, R>
where
    R: ErrorReceiver<E>,
{
    fn start(self: Pin<&mut Self>) {
        let this = self.project();
        if let Some((error, receiver)) = this.inner.take() {
            receiver.set_error(error);
        }
    }
}

/// Sender for the [`just_stopped`] function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[must_use = "senders do nothing unless connected to a receiver and started"]
pub struct JustStopped;

impl Sender for JustStopped {
    type Signatures = Cons<StoppedSignature, Nil>;
}

impl<Env> SenderIn<Env> for JustStopped {
    type Signatures = <Self as Sender>::Signatures;
}

impl<R> SenderTo<R> for JustStopped
where
    R: StoppedReceiver,
{
    type Operation = JustStoppedOp<R>;

    fn connect(self, receiver: R) -> JustStoppedOp<R> {
        JustStoppedOp {
            receiver: Some(receiver),
        }
    }
}

/// Operation state for the [`just_stopped`] sender.
#[pin_project]
#[must_use = "operation states do nothing unless started"]
#[derive(Debug)]
pub struct JustStoppedOp<R> {
    receiver: Option<R>,
}

impl<R> OperationState for JustStoppedOp<R>
where
    R: StoppedReceiver,
{
    fn start(self: Pin<&mut Self>) {
        let this = self.project();
        if let Some(receiver) = this.receiver.take() {
            receiver.set_stopped();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traits::{connect, EmptyEnv, Environment, Receiver};
    use std::pin::pin;

    struct Sink<'a> {
        value: &'a mut i32,
    }

    impl Receiver for Sink<'_> {
        type Env = EmptyEnv;

        fn env(&self) -> EmptyEnv {
            EmptyEnv
        }
    }

    impl ValueReceiver<(i32,)> for Sink<'_> {
        fn set_value(self, (value,): (i32,)) {
            *self.value = value;
        }
    }

    #[test]
    fn completes_inline_at_start() {
        let mut value = 0;
        {
            let mut op = pin!(connect(just((42,)), Sink { value: &mut value }));
            op.as_mut().start();
        }
        assert_eq!(value, 42);
    }

    #[test]
    fn nothing_runs_before_start() {
        let mut value = 0;
        let _op = connect(just((42,)), Sink { value: &mut value });
        drop(_op);
        assert_eq!(value, 0);
    }

    #[test]
    fn multi_shot_by_clone() {
        let sender = just((7,));
        for _ in 0..2 {
            let mut value = 0;
            let mut op = pin!(connect(sender.clone(), Sink { value: &mut value }));
            op.as_mut().start();
            assert_eq!(value, 7);
        }
    }

    #[test]
    fn empty_env_has_no_token() {
        assert!(EmptyEnv.stop_token().is_none());
    }
}
