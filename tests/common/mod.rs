#![allow(dead_code)]

//! Receivers and senders shared by the integration tests.

use core::pin::Pin;
use std::sync::mpsc;
use std::thread;

use sender_concurrency::completion::Completion;
use sender_concurrency::signature::{Cons, Nil, ValueSignature};
use sender_concurrency::{
    Environment, ErrorReceiver, OperationState, Receiver, Sender, SenderIn, SenderTo, StopSource,
    StopToken, StoppedReceiver, ValueReceiver,
};

/// A test environment optionally carrying a stop token.
#[derive(Clone)]
pub struct TestEnv {
    token: Option<StopToken>,
}

impl Environment for TestEnv {
    fn stop_token(&self) -> Option<StopToken> {
        self.token.clone()
    }
}

/// A receiver forwarding whichever completion it gets into an mpsc
/// channel, so tests can block on or poll for the outcome.
pub struct TestReceiver<V, E> {
    tx: mpsc::Sender<Completion<V, E>>,
    token: Option<StopToken>,
}

impl<V, E> Receiver for TestReceiver<V, E> {
    type Env = TestEnv;

    fn env(&self) -> TestEnv {
        TestEnv {
            token: self.token.clone(),
        }
    }
}

impl<V, E> ValueReceiver<V> for TestReceiver<V, E> {
    fn set_value(self, args: V) {
        self.tx.send(Completion::Value(args)).unwrap();
    }
}

impl<V, E> ErrorReceiver<E> for TestReceiver<V, E> {
    fn set_error(self, error: E) {
        self.tx.send(Completion::Error(error)).unwrap();
    }
}

impl<V, E> StoppedReceiver for TestReceiver<V, E> {
    fn set_stopped(self) {
        self.tx.send(Completion::Stopped).unwrap();
    }
}

/// A receiver without a stop token.
pub fn receiver<V, E>() -> (TestReceiver<V, E>, mpsc::Receiver<Completion<V, E>>) {
    let (tx, rx) = mpsc::channel();
    (TestReceiver { tx, token: None }, rx)
}

/// A receiver whose environment observes `source`.
pub fn stoppable_receiver<V, E>(
    source: &StopSource,
) -> (TestReceiver<V, E>, mpsc::Receiver<Completion<V, E>>) {
    let (tx, rx) = mpsc::channel();
    (
        TestReceiver {
            tx,
            token: Some(source.token()),
        },
        rx,
    )
}

/// A sender that completes with `value` on a worker thread, but only
/// once the paired gate has been opened. Lets tests hold a child
/// in-flight while they poke at the race from outside.
pub struct GateSender {
    value: i32,
    gate: mpsc::Receiver<()>,
}

/// Creates a [`GateSender`] and the handle that opens its gate.
pub fn gate_sender(value: i32) -> (GateSender, mpsc::Sender<()>) {
    let (open, gate) = mpsc::channel();
    (GateSender { value, gate }, open)
}

impl Sender for GateSender {
    type Signatures = Cons<ValueSignature<(i32,)>, Nil>;
}

impl<Env> SenderIn<Env> for GateSender {
    type Signatures = <Self as Sender>::Signatures;
}

impl<R> SenderTo<R> for GateSender
where
    R: ValueReceiver<(i32,)> + Send + Unpin + 'static,
{
    type Operation = GateOp<R>;

    fn connect(self, receiver: R) -> GateOp<R> {
        GateOp {
            inner: Some((self.value, self.gate, receiver)),
        }
    }
}

pub struct GateOp<R> {
    inner: Option<(i32, mpsc::Receiver<()>, R)>,
}

impl<R> OperationState for GateOp<R>
where
    R: ValueReceiver<(i32,)> + Send + Unpin + 'static,
{
    fn start(self: Pin<&mut Self>) {
        let this = Pin::into_inner(self);
        if let Some((value, gate, receiver)) = this.inner.take() {
            thread::spawn(move || {
                let _ = gate.recv();
                receiver.set_value((value,));
            });
        }
    }
}
