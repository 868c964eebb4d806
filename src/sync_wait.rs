//! Block the calling thread until a sender delivers its completion.

use core::fmt;
use std::pin::pin;
use std::sync::mpsc;

use crate::completion::Completion;
use crate::signature::{
    ApplyVariant, ErrorPayloadOf, ErrorSignaturesOf, IdentityRow, MapRows, TupleRow,
    UniformVariant, ValuePayloadOf, ValueSignaturesOf,
};
use crate::traits::{
    connect, EmptyEnv, ErrorReceiver, OperationState, Receiver, SenderIn, SenderTo,
    StoppedReceiver, ValueReceiver,
};

/// Connects `sender` to a blocking receiver, starts the operation and
/// waits for whichever completion arrives.
///
/// The sender resolves under [`EmptyEnv`]; a sender that needs a stop
/// token to make progress will block forever here. The value and error
/// channels must each be uniform, since a single return type has to
/// carry either.
///
/// # Examples
///
/// ```
/// use sender_concurrency::{just, sync_wait};
///
/// assert_eq!(sync_wait(just((42,))).into_value(), Some((42,)));
/// ```
pub fn sync_wait<S>(sender: S) -> Completion<ValuePayloadOf<S>, ErrorPayloadOf<S>>
where
    S: SenderIn<EmptyEnv>,
    ValueSignaturesOf<S>: MapRows<TupleRow>,
    ErrorSignaturesOf<S>: MapRows<IdentityRow>,
    UniformVariant: ApplyVariant<<ValueSignaturesOf<S> as MapRows<TupleRow>>::Output>,
    UniformVariant: ApplyVariant<<ErrorSignaturesOf<S> as MapRows<IdentityRow>>::Output>,
    S: SenderTo<SyncWaitReceiver<ValuePayloadOf<S>, ErrorPayloadOf<S>>>,
{
    let (tx, rx) = mpsc::channel();
    let mut op = pin!(connect(sender, SyncWaitReceiver { tx }));
    op.as_mut().start();
    match rx.recv() {
        Ok(completion) => completion,
        // The channel closing without a completion means the sender
        // dropped its receiver; observed as a stop.
        Err(mpsc::RecvError) => Completion::Stopped,
    }
}

/// The receiver [`sync_wait`] connects: each channel forwards into an
/// mpsc channel the blocked caller drains.
pub struct SyncWaitReceiver<V, E> {
    tx: mpsc::Sender<Completion<V, E>>,
}

impl<V, E> fmt::Debug for SyncWaitReceiver<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncWaitReceiver").finish_non_exhaustive()
    }
}

impl<V, E> Receiver for SyncWaitReceiver<V, E> {
    type Env = EmptyEnv;

    fn env(&self) -> EmptyEnv {
        EmptyEnv
    }
}

impl<V, E> ValueReceiver<V> for SyncWaitReceiver<V, E> {
    fn set_value(self, args: V) {
        let _ = self.tx.send(Completion::Value(args));
    }
}

impl<V, E> ErrorReceiver<E> for SyncWaitReceiver<V, E> {
    fn set_error(self, error: E) {
        let _ = self.tx.send(Completion::Error(error));
    }
}

impl<V, E> StoppedReceiver for SyncWaitReceiver<V, E> {
    fn set_stopped(self) {
        let _ = self.tx.send(Completion::Stopped);
    }
}
