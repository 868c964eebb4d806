//! Race a heterogeneous set of senders, delivering the winning
//! completion to the outer receiver exactly once.
//!
//! Three policies decide what counts as winning:
//!
//! - [`WhenAny`]/[`when_any`]: the first completion of any kind wins.
//! - [`FirstSuccessful`]/[`first_successful`]: the first value wins;
//!   errors and stops are held, and the last-reported one surfaces only
//!   if no child ever succeeds.
//! - [`stop_when`]: a two-sender specialization racing a primary against
//!   a stop trigger.
//!
//! Whichever policy decides, the winner requests a stop on the shared
//! stop source and every other child is expected to cancel
//! cooperatively; delivery waits until the last child has finished, so
//! no child outlives its race.

use crate::traits::Sender;

pub mod engine;
pub(crate) mod tuple;

pub use engine::{FirstCompletionPolicy, FirstSuccessfulPolicy, RacePolicy, StopEnv};
pub use tuple::{
    Slots1, Slots10, Slots11, Slots12, Slots2, Slots3, Slots4, Slots5, Slots6, Slots7, Slots8,
    Slots9, WhenAny0, WhenAny1, WhenAny10, WhenAny11, WhenAny12, WhenAny2, WhenAny3, WhenAny4,
    WhenAny5, WhenAny6, WhenAny7, WhenAny8, WhenAny9, WhenAnyOp0, WhenAnyOp1, WhenAnyOp10,
    WhenAnyOp11, WhenAnyOp12, WhenAnyOp2, WhenAnyOp3, WhenAnyOp4, WhenAnyOp5, WhenAnyOp6,
    WhenAnyOp7, WhenAnyOp8, WhenAnyOp9,
};

/// Race a tuple of senders, first completion wins.
///
/// The resulting sender advertises every child's value and error
/// signatures plus stopped; when several children complete, the first
/// decision taken is delivered and the rest are cancelled. An empty
/// tuple yields a sender that only ever completes stopped, and only in
/// response to the outer environment's stop token.
///
/// # Examples
///
/// ```
/// use sender_concurrency::when_any::WhenAny;
/// use sender_concurrency::{just, sync_wait};
///
/// let race = (just((42,)), just((17,))).when_any();
/// let outcome = sync_wait(race);
/// assert_eq!(outcome.into_value(), Some((42,)));
/// ```
pub trait WhenAny {
    /// The sender produced by racing this tuple.
    type Sender: Sender;

    /// Combines the tuple's senders into a first-completion race.
    fn when_any(self) -> Self::Sender;
}

/// Race a tuple of senders, first value wins.
///
/// Failures do not decide the race: an error or stopped completion is
/// held while the remaining children keep running. Only when every
/// child has finished without a value does the held failure surface,
/// preferring the last-reported error over stopped.
///
/// # Examples
///
/// ```
/// use sender_concurrency::when_any::FirstSuccessful;
/// use sender_concurrency::{just, just_error, sync_wait};
///
/// let race = (just_error(42i32), just((17,))).first_successful();
/// let outcome = sync_wait(race);
/// assert_eq!(outcome.into_value(), Some((17,)));
/// ```
pub trait FirstSuccessful {
    /// The sender produced by racing this tuple.
    type Sender: Sender;

    /// Combines the tuple's senders into a first-successful race.
    fn first_successful(self) -> Self::Sender;
}

/// Free-function form of [`WhenAny::when_any`].
pub fn when_any<T: WhenAny>(senders: T) -> T::Sender {
    senders.when_any()
}

/// Free-function form of [`FirstSuccessful::first_successful`].
pub fn first_successful<T: FirstSuccessful>(senders: T) -> T::Sender {
    senders.first_successful()
}

/// The sender produced by [`stop_when`].
pub type StopWhen<S, T> = WhenAny2<FirstCompletionPolicy, S, T>;

/// Runs `sender` until `trigger` completes.
///
/// A two-sender first-completion race: the primary completing first
/// delivers its outcome and cancels the trigger; the trigger completing
/// first, typically with stopped, decides the race and cancels the
/// primary. Also available as a suffix through
/// [`SenderExt::stop_when`][crate::ext::SenderExt::stop_when].
///
/// # Examples
///
/// ```
/// use sender_concurrency::when_any::stop_when;
/// use sender_concurrency::{just, sync_wait};
///
/// let guarded = stop_when(just((42,)), just((17,)));
/// assert_eq!(sync_wait(guarded).into_value(), Some((42,)));
/// ```
pub fn stop_when<S, T>(sender: S, trigger: T) -> StopWhen<S, T>
where
    (S, T): WhenAny<Sender = StopWhen<S, T>>,
{
    (sender, trigger).when_any()
}
