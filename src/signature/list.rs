//! Type-level signature lists and the operations defined on them.
//!
//! A signature set is encoded as a right-nested [`Cons`] chain terminated
//! by [`Nil`]. All operations here are trait recursion over that shape:
//! channel projection and the stopped-capability flag live on
//! [`SignatureList`] itself, set union is [`Concat`].

use core::fmt;
use core::marker::PhantomData;

use super::{ErrorSignature, StoppedSignature, ValueSignature};

/// The empty signature list.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Nil;

/// A signature list with head `H` and tail `T`.
pub struct Cons<H, T>(PhantomData<fn() -> (H, T)>);

impl fmt::Debug for Nil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nil")
    }
}

impl<H, T> fmt::Debug for Cons<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cons")
    }
}

/// A deduplicated-by-construction set of completion signatures.
///
/// Channel projections preserve declaration order within a channel; the
/// set itself carries no semantic order. Duplicate entries impose no
/// additional requirement on any consumer (one receiver impl per distinct
/// signature serves them all), which is how set semantics are realized
/// without type-level equality.
pub trait SignatureList {
    /// The value-channel projection of this list.
    type Values: SignatureList;
    /// The error-channel projection of this list.
    type Errors: SignatureList;
    /// The stopped-channel projection of this list.
    type Stopped: SignatureList;
    /// Number of entries, duplicates included.
    const LEN: usize;
    /// Whether the stopped channel has at least one signature.
    const SENDS_STOPPED: bool;
}

impl SignatureList for Nil {
    type Values = Nil;
    type Errors = Nil;
    type Stopped = Nil;
    const LEN: usize = 0;
    const SENDS_STOPPED: bool = false;
}

impl<Args, T: SignatureList> SignatureList for Cons<ValueSignature<Args>, T> {
    type Values = Cons<ValueSignature<Args>, T::Values>;
    type Errors = T::Errors;
    type Stopped = T::Stopped;
    const LEN: usize = 1 + T::LEN;
    const SENDS_STOPPED: bool = T::SENDS_STOPPED;
}

impl<E, T: SignatureList> SignatureList for Cons<ErrorSignature<E>, T> {
    type Values = T::Values;
    type Errors = Cons<ErrorSignature<E>, T::Errors>;
    type Stopped = T::Stopped;
    const LEN: usize = 1 + T::LEN;
    const SENDS_STOPPED: bool = T::SENDS_STOPPED;
}

impl<T: SignatureList> SignatureList for Cons<StoppedSignature, T> {
    type Values = T::Values;
    type Errors = T::Errors;
    type Stopped = Cons<StoppedSignature, T::Stopped>;
    const LEN: usize = 1 + T::LEN;
    const SENDS_STOPPED: bool = true;
}

/// List concatenation: the gather primitive combinators use to merge
/// their children's signature sets.
pub trait Concat<Rhs: SignatureList>: SignatureList {
    /// `self` followed by `Rhs`.
    type Output: SignatureList;
}

impl<Rhs: SignatureList> Concat<Rhs> for Nil {
    type Output = Rhs;
}

impl<Args, T, Rhs> Concat<Rhs> for Cons<ValueSignature<Args>, T>
where
    T: Concat<Rhs>,
    Rhs: SignatureList,
{
    type Output = Cons<ValueSignature<Args>, T::Output>;
}

impl<E, T, Rhs> Concat<Rhs> for Cons<ErrorSignature<E>, T>
where
    T: Concat<Rhs>,
    Rhs: SignatureList,
{
    type Output = Cons<ErrorSignature<E>, T::Output>;
}

impl<T, Rhs> Concat<Rhs> for Cons<StoppedSignature, T>
where
    T: Concat<Rhs>,
    Rhs: SignatureList,
{
    type Output = Cons<StoppedSignature, T::Output>;
}
