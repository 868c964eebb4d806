//! Execution contexts senders can be started on.
//!
//! A scheduler is a factory of senders: [`Scheduler::schedule`] returns
//! a sender that completes with `()` on the scheduler's context, and
//! work is chained behind it with [`then`][crate::then::then]. The
//! thread scheduler is also where cooperative cancellation becomes
//! observable: its completion checks the receiver's stop token, so a
//! race that has already been decided turns pending schedules into
//! stopped completions instead of values.

use core::pin::Pin;
use std::thread;

use pin_project::pin_project;

use crate::signature::{Cons, Nil, StoppedSignature, ValueSignature};
use crate::traits::{
    Environment, OperationState, Sender, SenderIn, SenderTo, StoppedReceiver, ValueReceiver,
};

/// A factory of senders completing on some execution context.
pub trait Scheduler: Clone {
    /// The sender produced by [`schedule`][Scheduler::schedule].
    type Sender: Sender;

    /// Returns a sender completing with `()` on this scheduler's
    /// context.
    fn schedule(&self) -> Self::Sender;
}

/// The degenerate scheduler: its senders complete inline, on the thread
/// calling start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    type Sender = InlineSchedule;

    fn schedule(&self) -> InlineSchedule {
        InlineSchedule
    }
}

/// Sender of the [`InlineScheduler`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[must_use = "senders do nothing unless connected to a receiver and started"]
pub struct InlineSchedule;

impl Sender for InlineSchedule {
    type Signatures = Cons<ValueSignature<()>, Nil>;
}

impl<Env> SenderIn<Env> for InlineSchedule {
    type Signatures = <Self as Sender>::Signatures;
}

impl<R> SenderTo<R> for InlineSchedule
where
    R: ValueReceiver<()>,
{
    type Operation = InlineScheduleOp<R>;

    fn connect(self, receiver: R) -> InlineScheduleOp<R> {
        InlineScheduleOp {
            receiver: Some(receiver),
        }
    }
}

/// Operation state of the [`InlineScheduler`]'s sender.
#[pin_project]
#[must_use = "operation states do nothing unless started"]
#[derive(Debug)]
pub struct InlineScheduleOp<R> {
    receiver: Option<R>,
}

impl<R> OperationState for InlineScheduleOp<R>
where
    R: ValueReceiver<()>,
{
    fn start(self: Pin<&mut Self>) {
        let this = self.project();
        if let Some(receiver) = this.receiver.take() {
            receiver.set_value(());
        }
    }
}

/// A scheduler completing each schedule on a freshly spawned thread.
///
/// Before completing, the spawned thread consults the receiver's stop
/// token; a schedule whose context has already been cancelled completes
/// stopped instead of delivering `()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    type Sender = ThreadSchedule;

    fn schedule(&self) -> ThreadSchedule {
        ThreadSchedule
    }
}

/// Sender of the [`ThreadScheduler`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[must_use = "senders do nothing unless connected to a receiver and started"]
pub struct ThreadSchedule;

impl Sender for ThreadSchedule {
    type Signatures = Cons<ValueSignature<()>, Cons<StoppedSignature, Nil>>;
}

impl<Env> SenderIn<Env> for ThreadSchedule {
    type Signatures = <Self as Sender>::Signatures;
}

impl<R> SenderTo<R> for ThreadSchedule
where
    R: ValueReceiver<()> + StoppedReceiver + Send + 'static,
{
    type Operation = ThreadScheduleOp<R>;

    fn connect(self, receiver: R) -> ThreadScheduleOp<R> {
        ThreadScheduleOp {
            receiver: Some(receiver),
        }
    }
}

/// Operation state of the [`ThreadScheduler`]'s sender.
#[pin_project]
#[must_use = "operation states do nothing unless started"]
#[derive(Debug)]
pub struct ThreadScheduleOp<R> {
    receiver: Option<R>,
}

impl<R> OperationState for ThreadScheduleOp<R>
where
    R: ValueReceiver<()> + StoppedReceiver + Send + 'static,
{
    fn start(self: Pin<&mut Self>) {
        let this = self.project();
        if let Some(receiver) = this.receiver.take() {
            // The receiver moves to the worker; nothing borrows the
            // operation state, so the thread may outlive it.
            thread::spawn(move || {
                let cancelled = receiver
                    .env()
                    .stop_token()
                    .is_some_and(|token| token.stop_requested());
                if cancelled {
                    receiver.set_stopped();
                } else {
                    receiver.set_value(());
                }
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traits::{connect, EmptyEnv, Receiver};
    use std::pin::pin;
    use std::sync::mpsc;

    struct Notify {
        tx: mpsc::Sender<bool>,
    }

    impl Receiver for Notify {
        type Env = EmptyEnv;

        fn env(&self) -> EmptyEnv {
            EmptyEnv
        }
    }

    impl ValueReceiver<()> for Notify {
        fn set_value(self, (): ()) {
            let _ = self.tx.send(true);
        }
    }

    impl StoppedReceiver for Notify {
        fn set_stopped(self) {
            let _ = self.tx.send(false);
        }
    }

    #[test]
    fn thread_schedule_completes_off_thread() {
        let (tx, rx) = mpsc::channel();
        let mut op = pin!(connect(ThreadScheduler.schedule(), Notify { tx }));
        op.as_mut().start();
        assert!(rx.recv().unwrap());
    }

    #[test]
    fn inline_schedule_completes_before_start_returns() {
        let (tx, rx) = mpsc::channel();
        let mut op = pin!(connect(InlineScheduler.schedule(), Notify { tx }));
        op.as_mut().start();
        assert!(rx.try_recv().unwrap());
    }
}
