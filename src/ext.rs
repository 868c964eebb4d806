//! Suffix-style composition for senders.

use crate::then::{then, Then};
use crate::upon_stopped::{upon_stopped, UponStopped};
use crate::when_any::{stop_when, StopWhen, WhenAny};

/// Adaptor methods available on every sender, mirroring the free
/// functions for pipeline-style composition.
///
/// # Examples
///
/// ```
/// use sender_concurrency::prelude::*;
/// use sender_concurrency::{just, sync_wait};
///
/// let pipeline = just((20,)).then(|(n,): (i32,)| n + 1).then(|(n,): (i32,)| n * 2);
/// assert_eq!(sync_wait(pipeline).into_value(), Some((42,)));
/// ```
pub trait SenderExt: Sized {
    /// Maps this sender's value through `fun`. See
    /// [`then`][crate::then::then].
    fn then<F>(self, fun: F) -> Then<Self, F> {
        then(self, fun)
    }

    /// Replaces a stopped completion with `fun`'s output. See
    /// [`upon_stopped`][crate::upon_stopped::upon_stopped].
    fn upon_stopped<F>(self, fun: F) -> UponStopped<Self, F> {
        upon_stopped(self, fun)
    }

    /// Runs this sender until `trigger` completes. See
    /// [`stop_when`][crate::when_any::stop_when].
    fn stop_when<T>(self, trigger: T) -> StopWhen<Self, T>
    where
        (Self, T): WhenAny<Sender = StopWhen<Self, T>>,
    {
        stop_when(self, trigger)
    }
}

impl<S> SenderExt for S {}
