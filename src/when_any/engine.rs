//! The shared runtime of the race combinators: one decision word, one
//! pending count, per-child completion slots, and the forwarding
//! receivers that funnel child completions through a policy.
//!
//! The decision word packs a two-bit tag and a child index. A final
//! decision is made by a single compare-and-exchange; provisional
//! decisions (the first-successful policy holding a failure) may be
//! overwritten by later children but never displace a final one. Each
//! child writes only its own slot, so the slots need no synchronization
//! beyond the release/acquire pairing of the decision word and the
//! pending count: the thread that sees the count hit zero also sees the
//! winner's slot fully written.

use core::marker::PhantomData;
use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::completion::{Completion, ErrorHolder, ValueHolder};
use crate::stop::{StopSource, StopToken};
use crate::traits::{
    Environment, ErrorReceiver, Receiver, StoppedReceiver, ValueReceiver,
};

const TAG_MASK: usize = 0b11;
const UNDECIDED: usize = 0;
const TAG_FINAL: usize = 0b01;
const TAG_ERROR: usize = 0b10;
const TAG_STOPPED: usize = 0b11;

fn encode(tag: usize, index: usize) -> usize {
    (index << 2) | tag
}

/// The channel a child completed on, as seen by the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// The child delivered a value.
    Value,
    /// The child delivered an error.
    Error,
    /// The child finished stopped.
    Stopped,
}

/// An eligibility rule for race outcomes: which child completions decide
/// the race outright, and which are merely held.
pub trait RacePolicy: 'static {
    /// Publishes child `index`'s completion on `channel` into the
    /// decision word. Returns `true` iff this call decided the race
    /// finally (the caller then cancels the remaining children).
    #[doc(hidden)]
    fn publish(state: &AtomicUsize, index: usize, channel: Channel) -> bool;
}

/// Every completion, on any channel, decides the race.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstCompletionPolicy;

impl RacePolicy for FirstCompletionPolicy {
    fn publish(state: &AtomicUsize, index: usize, _channel: Channel) -> bool {
        decide_final(state, index)
    }
}

/// Only values decide the race; errors and stopped completions are held
/// as pending failures. If no child ever succeeds, the race resolves to
/// the last-reported error, or stopped if no child erred.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstSuccessfulPolicy;

impl RacePolicy for FirstSuccessfulPolicy {
    fn publish(state: &AtomicUsize, index: usize, channel: Channel) -> bool {
        match channel {
            Channel::Value => decide_final(state, index),
            Channel::Error => {
                hold_provisional(state, index, TAG_ERROR);
                false
            }
            Channel::Stopped => {
                hold_provisional(state, index, TAG_STOPPED);
                false
            }
        }
    }
}

fn decide_final(state: &AtomicUsize, index: usize) -> bool {
    let mut current = state.load(Ordering::Relaxed);
    loop {
        if current & TAG_MASK == TAG_FINAL {
            return false;
        }
        match state.compare_exchange_weak(
            current,
            encode(TAG_FINAL, index),
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return true,
            Err(observed) => current = observed,
        }
    }
}

fn hold_provisional(state: &AtomicUsize, index: usize, tag: usize) {
    let mut current = state.load(Ordering::Relaxed);
    loop {
        let displaceable = match current & TAG_MASK {
            // An error may displace an earlier held error (later reports
            // win) or a held stop; a held stop only displaces a held
            // stop.
            UNDECIDED => true,
            TAG_STOPPED => true,
            TAG_ERROR => tag == TAG_ERROR,
            _ => false,
        };
        if !displaceable {
            return;
        }
        match state.compare_exchange_weak(
            current,
            encode(tag, index),
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}

/// A per-child completion cell. Written at most once, by the owning
/// child's forwarding receiver; read at most once, by the delivering
/// thread, after the pending count reached zero.
pub struct ChildSlot<C> {
    cell: UnsafeCell<Option<C>>,
}

// The single-writer/single-reader protocol above makes the cell safe to
// share once the contained completion can cross threads.
unsafe impl<C: Send> Send for ChildSlot<C> {}
unsafe impl<C: Send> Sync for ChildSlot<C> {}

impl<C> ChildSlot<C> {
    pub(crate) fn new() -> Self {
        Self {
            cell: UnsafeCell::new(None),
        }
    }

    /// # Safety
    ///
    /// Only the owning child's receiver may call this, at most once.
    pub(crate) unsafe fn store(&self, completion: C) {
        *self.cell.get() = Some(completion);
    }

    /// # Safety
    ///
    /// Only the delivering thread may call this, after every child has
    /// published and decremented.
    pub(crate) unsafe fn take(&self) -> Option<C> {
        (*self.cell.get()).take()
    }
}

impl<C> fmt::Debug for ChildSlot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildSlot").finish_non_exhaustive()
    }
}

/// Heterogeneous per-child slot storage, with delivery dispatched on the
/// winning child's index. Implemented by the macro-generated slot structs
/// in [`tuple`][super::tuple].
pub trait SlotSet<R> {
    /// Takes the completion stored for child `index` and replays it into
    /// `receiver`.
    #[doc(hidden)]
    fn deliver(&self, index: usize, receiver: R);
}

/// Associates a race sender with the slot collection its children write
/// into, so a forwarding receiver's type can be spelled from the sender
/// alone.
pub trait SlotStorage {
    /// The per-child slot collection backing the race.
    type Slots;
}

/// State shared between a race operation and its forwarding receivers.
///
/// Owned by the combinator's operation state; children hold it through
/// [`Arc`], allocated once at connect time. Nothing on the completion
/// path allocates or locks.
pub struct RaceShared<Slots, R> {
    state: AtomicUsize,
    pending: AtomicUsize,
    pub(crate) slots: Slots,
    receiver: UnsafeCell<Option<R>>,
    pub(crate) stop: StopSource,
}

// Slots and receiver cells follow the single-writer protocol documented
// on ChildSlot; the receiver cell is touched only by the delivering
// thread.
unsafe impl<Slots: Send, R: Send> Send for RaceShared<Slots, R> {}
unsafe impl<Slots: Send, R: Send> Sync for RaceShared<Slots, R> {}

impl<Slots, R> RaceShared<Slots, R> {
    pub(crate) fn new(children: usize, slots: Slots, receiver: R) -> Self {
        Self {
            state: AtomicUsize::new(UNDECIDED),
            pending: AtomicUsize::new(children),
            slots,
            receiver: UnsafeCell::new(Some(receiver)),
            stop: StopSource::new(),
        }
    }

    /// Records child `index`'s completion (already stored in its slot)
    /// and, if this was the last outstanding child, delivers the winner.
    pub(crate) fn complete<P: RacePolicy>(&self, index: usize, channel: Channel)
    where
        Slots: SlotSet<R>,
    {
        if P::publish(&self.state, index, channel) {
            // Cancel the losers; cooperative, so they finish in their
            // own time and each still decrements `pending`.
            self.stop.request_stop();
        }
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.finish();
        }
    }

    fn finish(&self)
    where
        Slots: SlotSet<R>,
    {
        let state = self.state.load(Ordering::Acquire);
        debug_assert_ne!(state, UNDECIDED, "race finished without a decision");
        let receiver = unsafe { (*self.receiver.get()).take() };
        if let Some(receiver) = receiver {
            self.slots.deliver(state >> 2, receiver);
        }
    }
}

impl<Slots, R> fmt::Debug for RaceShared<Slots, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaceShared")
            .field("state", &self.state.load(Ordering::Relaxed))
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// The environment the race engine hands to its children: the shared
/// stop token and nothing else.
#[derive(Clone, Debug)]
pub struct StopEnv {
    token: StopToken,
}

impl StopEnv {
    pub(crate) fn new(token: StopToken) -> Self {
        Self { token }
    }
}

impl Environment for StopEnv {
    fn stop_token(&self) -> Option<StopToken> {
        Some(self.token.clone())
    }
}

/// The forwarding receiver connected to child `index`, closing over the
/// shared race state and the child's own slot.
pub struct ChildReceiver<P, C, Slots, R> {
    shared: Arc<RaceShared<Slots, R>>,
    slot: *const ChildSlot<C>,
    index: usize,
    _policy: PhantomData<P>,
}

// The raw slot pointer targets memory kept alive by `shared`; sending
// the receiver across threads is safe whenever its parts are.
unsafe impl<P, C: Send, Slots: Send, R: Send> Send for ChildReceiver<P, C, Slots, R> {}

impl<P, C, Slots, R> ChildReceiver<P, C, Slots, R> {
    pub(crate) fn new(
        shared: Arc<RaceShared<Slots, R>>,
        slot: *const ChildSlot<C>,
        index: usize,
    ) -> Self {
        Self {
            shared,
            slot,
            index,
            _policy: PhantomData,
        }
    }
}

impl<P, C, Slots, R> ChildReceiver<P, C, Slots, R>
where
    P: RacePolicy,
    Slots: SlotSet<R>,
{
    fn finish(self, completion: C, channel: Channel) {
        unsafe { (*self.slot).store(completion) };
        self.shared.complete::<P>(self.index, channel);
    }
}

impl<P, C, Slots, R> fmt::Debug for ChildReceiver<P, C, Slots, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildReceiver")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl<P, C, Slots, R> Receiver for ChildReceiver<P, C, Slots, R> {
    type Env = StopEnv;

    fn env(&self) -> StopEnv {
        StopEnv::new(self.shared.stop.token())
    }
}

impl<P, Args, E, Slots, R> ValueReceiver<Args>
    for ChildReceiver<P, Completion<ValueHolder<Args>, E>, Slots, R>
where
    P: RacePolicy,
    Slots: SlotSet<R>,
{
    fn set_value(self, args: Args) {
        // A completion arriving after a stop request is observed as the
        // child acknowledging cancellation.
        if self.shared.stop.stop_requested() {
            self.finish(Completion::Stopped, Channel::Stopped);
        } else {
            self.finish(Completion::Value(ValueHolder(args)), Channel::Value);
        }
    }
}

impl<P, V, E, Slots, R> ErrorReceiver<E>
    for ChildReceiver<P, Completion<V, ErrorHolder<E>>, Slots, R>
where
    P: RacePolicy,
    Slots: SlotSet<R>,
{
    fn set_error(self, error: E) {
        if self.shared.stop.stop_requested() {
            self.finish(Completion::Stopped, Channel::Stopped);
        } else {
            self.finish(Completion::Error(ErrorHolder(error)), Channel::Error);
        }
    }
}

impl<P, V, E, Slots, R> StoppedReceiver for ChildReceiver<P, Completion<V, E>, Slots, R>
where
    P: RacePolicy,
    Slots: SlotSet<R>,
{
    fn set_stopped(self) {
        self.finish(Completion::Stopped, Channel::Stopped);
    }
}

/// Shared state of the zero-child race: the only way it completes is the
/// outer stop request, forwarded directly as a stopped completion.
pub struct ZeroShared<R> {
    delivered: AtomicBool,
    receiver: UnsafeCell<Option<R>>,
}

unsafe impl<R: Send> Send for ZeroShared<R> {}
unsafe impl<R: Send> Sync for ZeroShared<R> {}

impl<R> ZeroShared<R> {
    pub(crate) fn new(receiver: R) -> Self {
        Self {
            delivered: AtomicBool::new(false),
            receiver: UnsafeCell::new(Some(receiver)),
        }
    }

    pub(crate) fn deliver_stopped(&self)
    where
        R: StoppedReceiver,
    {
        if self.delivered.swap(true, Ordering::AcqRel) {
            return;
        }
        let receiver = unsafe { (*self.receiver.get()).take() };
        if let Some(receiver) = receiver {
            receiver.set_stopped();
        }
    }
}

impl<R> fmt::Debug for ZeroShared<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZeroShared")
            .field("delivered", &self.delivered.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn final_decision_is_single_shot() {
        let state = AtomicUsize::new(UNDECIDED);
        assert!(decide_final(&state, 3));
        assert!(!decide_final(&state, 5));
        assert_eq!(state.load(Ordering::Relaxed) >> 2, 3);
    }

    #[test]
    fn later_errors_displace_earlier_holds() {
        let state = AtomicUsize::new(UNDECIDED);
        hold_provisional(&state, 0, TAG_STOPPED);
        hold_provisional(&state, 1, TAG_ERROR);
        hold_provisional(&state, 2, TAG_ERROR);
        // A held stop never displaces a held error.
        hold_provisional(&state, 3, TAG_STOPPED);
        let observed = state.load(Ordering::Relaxed);
        assert_eq!(observed & TAG_MASK, TAG_ERROR);
        assert_eq!(observed >> 2, 2);
    }

    #[test]
    fn value_beats_held_failure() {
        let state = AtomicUsize::new(UNDECIDED);
        hold_provisional(&state, 0, TAG_ERROR);
        assert!(decide_final(&state, 1));
        let observed = state.load(Ordering::Relaxed);
        assert_eq!(observed & TAG_MASK, TAG_FINAL);
        assert_eq!(observed >> 2, 1);
    }
}
