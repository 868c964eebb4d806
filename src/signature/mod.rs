//! The completion-signature algebra.
//!
//! A completion signature is a channel (value, error, stopped) paired
//! with an ordered payload type list; the set of signatures a sender may
//! deliver is a type-level list of them. Everything in this module is
//! pure type computation: resolving, projecting, gathering and
//! materializing signature sets costs nothing at runtime, and a
//! malformed use (a sender with no resolvable set, a restricted
//! materialization against the wrong arity) is a compile error, never a
//! runtime one.
//!
//! # Examples
//!
//! ```
//! use sender_concurrency::signature::{SignatureList, SignaturesOf, ValueSignaturesOf};
//! use sender_concurrency::{just, EmptyEnv};
//!
//! type S = sender_concurrency::Just<(u8, &'static str)>;
//! // Resolution is idempotent and order-stable.
//! const LEN: usize = <SignaturesOf<S, EmptyEnv> as SignatureList>::LEN;
//! assert_eq!(LEN, 1);
//! const STOPPED: bool = <SignaturesOf<S, EmptyEnv> as SignatureList>::SENDS_STOPPED;
//! assert!(!STOPPED);
//! # let _ = just((1u8, "hi"));
//! ```

use core::fmt;
use core::marker::PhantomData;

mod list;
mod materialize;

pub use list::{Concat, Cons, Nil, SignatureList};
pub use materialize::{
    ApplyRow, ApplyVariant, EitherChain, EitherVariant, IdentityRow, IdentityVariant, MapRows,
    Materialized, SlotVariant, TupleRow, UniformList, UniformTail, UniformVariant,
};

use crate::traits::{EmptyEnv, SenderIn};

/// A value completion carrying the payload tuple `Args`.
pub struct ValueSignature<Args>(PhantomData<fn() -> Args>);

/// An error completion carrying the payload `E`.
pub struct ErrorSignature<E>(PhantomData<fn() -> E>);

/// A stopped completion. Carries no payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoppedSignature;

impl<Args> fmt::Debug for ValueSignature<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueSignature")
    }
}

impl<E> fmt::Debug for ErrorSignature<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorSignature")
    }
}

/// One way a sender can terminate: a channel plus an ordered payload
/// list, the latter always normalized to a tuple.
pub trait Signature {
    /// The payload tuple delivered along this signature.
    type Payload;
}

impl<Args> Signature for ValueSignature<Args> {
    type Payload = Args;
}

impl<E> Signature for ErrorSignature<E> {
    type Payload = (E,);
}

impl Signature for StoppedSignature {
    type Payload = ();
}

/// Builds a signature list type from a flat list of signatures.
///
/// ```
/// use sender_concurrency::signature::{StoppedSignature, ValueSignature};
/// use sender_concurrency::signatures;
///
/// type Sigs = signatures![ValueSignature<(i32,)>, StoppedSignature];
/// ```
#[macro_export]
macro_rules! signatures {
    [] => { $crate::signature::Nil };
    [$head:ty $(, $rest:ty)* $(,)?] => {
        $crate::signature::Cons<$head, $crate::signatures![$($rest),*]>
    };
}

/// Resolves a sender's completion signature set under an environment.
///
/// This consults the [`SenderIn`] query, which either answers directly
/// (environment-dependent senders) or forwards to the sender's declared
/// [`Sender::Signatures`][crate::traits::Sender] set. A type with
/// neither source fails this projection at compile time.
pub type SignaturesOf<S, Env = EmptyEnv> = <S as SenderIn<Env>>::Signatures;

/// The value-channel projection of a sender's signature set.
pub type ValueSignaturesOf<S, Env = EmptyEnv> = <SignaturesOf<S, Env> as SignatureList>::Values;

/// The error-channel projection of a sender's signature set.
pub type ErrorSignaturesOf<S, Env = EmptyEnv> = <SignaturesOf<S, Env> as SignatureList>::Errors;

/// The stopped-channel projection of a sender's signature set.
pub type StoppedSignaturesOf<S, Env = EmptyEnv> = <SignaturesOf<S, Env> as SignatureList>::Stopped;

/// The value-channel signatures of a sender, materialized through a row
/// and a variant family.
pub type ValueTypesOf<S, Env = EmptyEnv, Row = TupleRow, Var = EitherVariant> =
    Materialized<ValueSignaturesOf<S, Env>, Row, Var>;

/// The error-channel signatures of a sender, materialized through a row
/// and a variant family.
pub type ErrorTypesOf<S, Env = EmptyEnv, Row = TupleRow, Var = EitherVariant> =
    Materialized<ErrorSignaturesOf<S, Env>, Row, Var>;

/// The stopped-channel signatures of a sender, materialized through a
/// row and a variant family.
pub type StoppedTypesOf<S, Env = EmptyEnv, Row = TupleRow, Var = EitherVariant> =
    Materialized<StoppedSignaturesOf<S, Env>, Row, Var>;

/// The payload tuple shared by all of a sender's value signatures.
///
/// Defined when the value channel is uniform (possibly with duplicates);
/// [`Never`][crate::completion::Never] when it is empty.
pub type ValuePayloadOf<S, Env = EmptyEnv> =
    Materialized<ValueSignaturesOf<S, Env>, TupleRow, UniformVariant>;

/// The error payload shared by all of a sender's error signatures.
///
/// Defined when the error channel is uniform;
/// [`Never`][crate::completion::Never] when it is empty.
pub type ErrorPayloadOf<S, Env = EmptyEnv> =
    Materialized<ErrorSignaturesOf<S, Env>, IdentityRow, UniformVariant>;

/// Whether a sender can terminate on the stopped channel under `Env`.
pub const fn sends_stopped<S, Env>() -> bool
where
    S: SenderIn<Env>,
{
    <<S as SenderIn<Env>>::Signatures as SignatureList>::SENDS_STOPPED
}

/// Gathers the value and error signatures of several senders into one
/// list, in child order.
///
/// Senders are encoded as a right-nested pair chain (`(A, (B, (C, ())))`
/// for three children), which is what the race combinator macros emit
/// internally. The stopped channel is deliberately not gathered:
/// combinators that cancel children substitute their own stopped
/// signature.
pub trait GatherSignatures<Env> {
    /// The concatenation of every child's value and error projections.
    type Gathered: SignatureList;
}

impl<Env> GatherSignatures<Env> for () {
    type Gathered = Nil;
}

impl<Env, Head, Tail> GatherSignatures<Env> for (Head, Tail)
where
    Head: SenderIn<Env>,
    Tail: GatherSignatures<Env>,
    ValueSignaturesOf<Head, Env>: Concat<ErrorSignaturesOf<Head, Env>>,
    ChildContribution<Head, Env>: Concat<Tail::Gathered>,
{
    type Gathered = <ChildContribution<Head, Env> as Concat<Tail::Gathered>>::Output;
}

/// One sender's contribution to a gathered set: its value signatures
/// followed by its error signatures.
pub type ChildContribution<S, Env> =
    <ValueSignaturesOf<S, Env> as Concat<ErrorSignaturesOf<S, Env>>>::Output;

#[cfg(test)]
mod test {
    use super::*;

    fn same_type<A, B>()
    where
        A: IsSame<B>,
    {
    }

    trait IsSame<B> {}
    impl<A> IsSame<A> for A {}

    type Declared = signatures![
        ValueSignature<(i32,)>,
        ErrorSignature<f32>,
        StoppedSignature,
    ];

    #[test]
    fn projections_partition_by_channel() {
        same_type::<<Declared as SignatureList>::Values, signatures![ValueSignature<(i32,)>]>();
        same_type::<<Declared as SignatureList>::Errors, signatures![ErrorSignature<f32>]>();
        same_type::<<Declared as SignatureList>::Stopped, signatures![StoppedSignature]>();
        assert_eq!(<Declared as SignatureList>::LEN, 3);
        assert!(<Declared as SignatureList>::SENDS_STOPPED);
        assert!(!<Nil as SignatureList>::SENDS_STOPPED);
    }

    #[test]
    fn concat_preserves_order() {
        type Lhs = signatures![ValueSignature<()>];
        type Rhs = signatures![ValueSignature<(u8,)>, StoppedSignature];
        same_type::<
            <Lhs as Concat<Rhs>>::Output,
            signatures![ValueSignature<()>, ValueSignature<(u8,)>, StoppedSignature],
        >();
    }
}
