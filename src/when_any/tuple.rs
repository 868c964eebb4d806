use super::engine::{
    ChildReceiver, ChildSlot, FirstCompletionPolicy, FirstSuccessfulPolicy, RacePolicy, RaceShared,
    SlotSet, SlotStorage, StopEnv, ZeroShared,
};
use super::{FirstSuccessful as FirstSuccessfulTrait, WhenAny as WhenAnyTrait};
use crate::completion::{CompletionOf, DeliverTo, ErrorHolderRow, ValueHolderRow};
use crate::signature::{
    ApplyVariant, Concat, Cons, ErrorSignaturesOf, GatherSignatures, MapRows, Nil, SlotVariant,
    StoppedSignature, ValueSignaturesOf,
};
use crate::stop::{StopCallback, StopSource, StopToken};
use crate::traits::{
    connect, Environment, OperationState, Receiver, Sender, SenderIn, SenderTo, StoppedReceiver,
};

use core::fmt::{self, Debug};
use core::marker::PhantomData;
use core::pin::Pin;
use std::sync::Arc;

use pin_project::pin_project;

/// Children encoded as the right-nested pair chain the signature gather
/// walks: `(A, (B, ()))` for two.
macro_rules! pair_chain {
    () => { () };
    ($head:ident $(, $rest:ident)*) => { ($head, pair_chain!($($rest),*)) };
}

macro_rules! tuple_len {
    () => { 0 };
    ($head:ident $(, $rest:ident)*) => { 1 + tuple_len!($($rest),*) };
}

type GatheredOf<Children> = <Children as GatherSignatures<StopEnv>>::Gathered;
type StoppedOnly = Cons<StoppedSignature, Nil>;

/// The forwarding receiver connected to child `S` of race sender `W`.
///
/// Naming the slot collection through [`SlotStorage`] keeps the sibling
/// senders out of the per-child macro repetition; only `W` carries them.
type ReceiverFor<P, S, W, R> =
    ChildReceiver<P, CompletionOf<S, StopEnv>, <W as SlotStorage>::Slots, R>;

macro_rules! impl_when_any_tuple {
    ($StructName:ident $OpName:ident $SlotsName:ident ($($F:ident)+)) => {
        /// A sender racing a tuple of child senders under a policy.
        ///
        /// Created by the [`WhenAny`] and [`FirstSuccessful`] traits on
        /// tuples. See their documentation for more.
        ///
        /// [`WhenAny`]: crate::when_any::WhenAny
        /// [`FirstSuccessful`]: crate::when_any::FirstSuccessful
        #[must_use = "senders do nothing unless connected to a receiver and started"]
        #[allow(non_snake_case)]
        pub struct $StructName<P, $($F),*> {
            $($F: $F,)*
            _policy: PhantomData<P>,
        }

        impl<P, $($F),*> Debug for $StructName<P, $($F),*>
        where $(
            $F: Debug,
        )* {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple("WhenAny")
                    $(.field(&self.$F))*
                    .finish()
            }
        }

        impl<P, $($F),*> Clone for $StructName<P, $($F),*>
        where $(
            $F: Clone,
        )* {
            fn clone(&self) -> Self {
                Self {
                    $($F: self.$F.clone(),)*
                    _policy: PhantomData,
                }
            }
        }

        impl<P, $($F),*> Sender for $StructName<P, $($F),*>
        where
            P: RacePolicy,
            $($F: SenderIn<StopEnv>,)*
            pair_chain!($($F),*): GatherSignatures<StopEnv>,
            GatheredOf<pair_chain!($($F),*)>: Concat<StoppedOnly>,
        {
            type Signatures =
                <GatheredOf<pair_chain!($($F),*)> as Concat<StoppedOnly>>::Output;
        }

        impl<P, Env, $($F),*> SenderIn<Env> for $StructName<P, $($F),*>
        where
            Self: Sender,
        {
            type Signatures = <Self as Sender>::Signatures;
        }

        /// Per-child completion storage for the matching race operation.
        #[allow(non_snake_case)]
        pub struct $SlotsName<$($F),*> {
            $($F: ChildSlot<$F>,)*
        }

        impl<$($F),*> Debug for $SlotsName<$($F),*> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct("Slots").finish_non_exhaustive()
            }
        }

        impl<R, $($F),*> SlotSet<R> for $SlotsName<$($F),*>
        where $(
            $F: DeliverTo<R>,
        )* {
            fn deliver(&self, index: usize, receiver: R) {
                #[repr(usize)]
                enum Indexes {
                    $($F),*
                }

                $(
                    if index == Indexes::$F as usize {
                        // The winner always stored its completion before
                        // the final pending decrement.
                        if let Some(completion) = unsafe { self.$F.take() } {
                            completion.deliver(receiver);
                        }
                        return;
                    }
                )*
            }
        }

        impl<P, $($F),*> SlotStorage for $StructName<P, $($F),*>
        where
            $($F: SenderIn<StopEnv>,)*
            $(ValueSignaturesOf<$F, StopEnv>: MapRows<ValueHolderRow>,)*
            $(SlotVariant: ApplyVariant<
                <ValueSignaturesOf<$F, StopEnv> as MapRows<ValueHolderRow>>::Output,
            >,)*
            $(ErrorSignaturesOf<$F, StopEnv>: MapRows<ErrorHolderRow>,)*
            $(SlotVariant: ApplyVariant<
                <ErrorSignaturesOf<$F, StopEnv> as MapRows<ErrorHolderRow>>::Output,
            >,)*
        {
            type Slots = $SlotsName<$(CompletionOf<$F, StopEnv>),*>;
        }

        impl<P, R, $($F),*> SenderTo<R> for $StructName<P, $($F),*>
        where
            P: RacePolicy,
            R: Receiver,
            Self: SenderIn<R::Env>,
            $($F: SenderIn<StopEnv>,)*
            $(ValueSignaturesOf<$F, StopEnv>: MapRows<ValueHolderRow>,)*
            $(SlotVariant: ApplyVariant<
                <ValueSignaturesOf<$F, StopEnv> as MapRows<ValueHolderRow>>::Output,
            >,)*
            $(ErrorSignaturesOf<$F, StopEnv>: MapRows<ErrorHolderRow>,)*
            $(SlotVariant: ApplyVariant<
                <ErrorSignaturesOf<$F, StopEnv> as MapRows<ErrorHolderRow>>::Output,
            >,)*
            $($F: SenderTo<ReceiverFor<P, $F, Self, R>>,)*
            $(CompletionOf<$F, StopEnv>: DeliverTo<R>,)*
        {
            type Operation = $OpName<
                $(<$F as SenderTo<ReceiverFor<P, $F, Self, R>>>::Operation),*
            >;

            #[allow(non_snake_case)]
            fn connect(self, receiver: R) -> Self::Operation {
                let outer_stop = receiver.env().stop_token();
                let shared = Arc::new(RaceShared::new(
                    tuple_len!($($F),*),
                    $SlotsName {
                        $($F: ChildSlot::new(),)*
                    },
                    receiver,
                ));
                let race_stop = shared.stop.clone();

                #[repr(usize)]
                enum Indexes {
                    $($F),*
                }

                let Self { $($F,)* _policy: _ } = self;
                $(
                    let $F = connect(
                        $F,
                        ChildReceiver::<P, _, _, _>::new(
                            Arc::clone(&shared),
                            &shared.slots.$F,
                            Indexes::$F as usize,
                        ),
                    );
                )*
                $OpName {
                    outer_stop,
                    stop_guard: None,
                    race_stop,
                    $($F,)*
                }
            }
        }

        /// The operation state of a connected race.
        ///
        /// Pinned because the child operations it owns are; the shared
        /// race state itself lives on the heap and is unaffected by
        /// moves before connect.
        #[pin_project]
        #[must_use = "operation states do nothing unless started"]
        #[allow(non_snake_case)]
        pub struct $OpName<$($F),*> {
            outer_stop: Option<StopToken>,
            stop_guard: Option<StopCallback>,
            race_stop: StopSource,
            $(#[pin] $F: $F,)*
        }

        impl<$($F),*> Debug for $OpName<$($F),*> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct("WhenAnyOp").finish_non_exhaustive()
            }
        }

        impl<$($F),*> OperationState for $OpName<$($F),*>
        where $(
            $F: OperationState,
        )* {
            fn start(self: Pin<&mut Self>) {
                let this = self.project();
                // Register before starting any child, so a stop already
                // requested on the outer token cancels the whole race
                // before the first child runs.
                if let Some(token) = this.outer_stop.take() {
                    let stop = this.race_stop.clone();
                    *this.stop_guard = Some(token.on_stop(move || stop.request_stop()));
                }
                $(this.$F.start();)*
            }
        }

        impl<$($F),*> WhenAnyTrait for ($($F,)*)
        where
            $($F: SenderIn<StopEnv>,)*
            $StructName<FirstCompletionPolicy, $($F),*>: Sender,
        {
            type Sender = $StructName<FirstCompletionPolicy, $($F),*>;

            #[allow(non_snake_case)]
            fn when_any(self) -> Self::Sender {
                let ($($F,)*) = self;
                $StructName {
                    $($F,)*
                    _policy: PhantomData,
                }
            }
        }

        impl<$($F),*> FirstSuccessfulTrait for ($($F,)*)
        where
            $($F: SenderIn<StopEnv>,)*
            $StructName<FirstSuccessfulPolicy, $($F),*>: Sender,
        {
            type Sender = $StructName<FirstSuccessfulPolicy, $($F),*>;

            #[allow(non_snake_case)]
            fn first_successful(self) -> Self::Sender {
                let ($($F,)*) = self;
                $StructName {
                    $($F,)*
                    _policy: PhantomData,
                }
            }
        }
    };
}

impl_when_any_tuple! { WhenAny1 WhenAnyOp1 Slots1 (A) }
impl_when_any_tuple! { WhenAny2 WhenAnyOp2 Slots2 (A B) }
impl_when_any_tuple! { WhenAny3 WhenAnyOp3 Slots3 (A B C) }
impl_when_any_tuple! { WhenAny4 WhenAnyOp4 Slots4 (A B C D) }
impl_when_any_tuple! { WhenAny5 WhenAnyOp5 Slots5 (A B C D E) }
impl_when_any_tuple! { WhenAny6 WhenAnyOp6 Slots6 (A B C D E F) }
impl_when_any_tuple! { WhenAny7 WhenAnyOp7 Slots7 (A B C D E F G) }
impl_when_any_tuple! { WhenAny8 WhenAnyOp8 Slots8 (A B C D E F G H) }
impl_when_any_tuple! { WhenAny9 WhenAnyOp9 Slots9 (A B C D E F G H I) }
impl_when_any_tuple! { WhenAny10 WhenAnyOp10 Slots10 (A B C D E F G H I J) }
impl_when_any_tuple! { WhenAny11 WhenAnyOp11 Slots11 (A B C D E F G H I J K) }
impl_when_any_tuple! { WhenAny12 WhenAnyOp12 Slots12 (A B C D E F G H I J K L) }

/// The zero-child race: a sender that never completes on its own.
///
/// Its only signature is stopped, and its only path to completion is the
/// outer environment's stop token firing.
#[must_use = "senders do nothing unless connected to a receiver and started"]
pub struct WhenAny0<P> {
    _policy: PhantomData<P>,
}

impl<P> WhenAny0<P> {
    pub(crate) fn new() -> Self {
        Self {
            _policy: PhantomData,
        }
    }
}

impl<P> Debug for WhenAny0<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WhenAny").finish()
    }
}

impl<P> Clone for WhenAny0<P> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<P> Copy for WhenAny0<P> {}

impl<P: RacePolicy> Sender for WhenAny0<P> {
    type Signatures = StoppedOnly;
}

impl<P: RacePolicy, Env> SenderIn<Env> for WhenAny0<P> {
    type Signatures = <Self as Sender>::Signatures;
}

impl<P, R> SenderTo<R> for WhenAny0<P>
where
    P: RacePolicy,
    R: StoppedReceiver + Send + 'static,
{
    type Operation = WhenAnyOp0<R>;

    fn connect(self, receiver: R) -> WhenAnyOp0<R> {
        let outer_stop = receiver.env().stop_token();
        WhenAnyOp0 {
            outer_stop,
            stop_guard: None,
            shared: Arc::new(ZeroShared::new(receiver)),
        }
    }
}

/// The operation state of a connected zero-child race.
#[must_use = "operation states do nothing unless started"]
#[derive(Debug)]
pub struct WhenAnyOp0<R> {
    outer_stop: Option<StopToken>,
    stop_guard: Option<StopCallback>,
    shared: Arc<ZeroShared<R>>,
}

impl<R> OperationState for WhenAnyOp0<R>
where
    R: StoppedReceiver + Send + 'static,
{
    fn start(self: Pin<&mut Self>) {
        let this = Pin::into_inner(self);
        if let Some(token) = this.outer_stop.take() {
            let shared = Arc::clone(&this.shared);
            this.stop_guard = Some(token.on_stop(move || shared.deliver_stopped()));
        }
    }
}

impl WhenAnyTrait for () {
    type Sender = WhenAny0<FirstCompletionPolicy>;

    fn when_any(self) -> Self::Sender {
        WhenAny0::new()
    }
}

impl FirstSuccessfulTrait for () {
    type Sender = WhenAny0<FirstSuccessfulPolicy>;

    fn first_successful(self) -> Self::Sender {
        WhenAny0::new()
    }
}
