//! Materializing signature lists into concrete container types.
//!
//! A *row family* decides what one signature's payload tuple becomes; a
//! *variant family* decides how the rows for a whole channel are folded
//! together. Families are zero-sized marker types; the application traits
//! [`ApplyRow`] and [`ApplyVariant`] are the extension points.
//!
//! Two kinds of families exist:
//!
//! - general ones ([`TupleRow`], [`EitherVariant`]) accept any arity,
//!   including zero signatures (an empty channel materializes to
//!   [`Never`]);
//! - restricted ones ([`IdentityRow`], [`IdentityVariant`],
//!   [`UniformVariant`]) only apply to degenerate shapes and reject
//!   everything else at compile time, as an unsatisfied bound. They are
//!   ergonomic shortcuts, not general mechanisms.

use super::list::{Cons, Nil};
use super::Signature;
use crate::completion::{Either, Never};

/// A row family: maps one payload tuple to a row type.
pub trait ApplyRow<Args> {
    /// The row produced for payload `Args`.
    type Out;
}

/// The identity row family: a signature's row is its payload tuple.
#[derive(Clone, Copy, Debug, Default)]
pub struct TupleRow;

impl<Args> ApplyRow<Args> for TupleRow {
    type Out = Args;
}

/// The unwrapping row family: defined only for single-element payloads,
/// whose row is the bare element. Applying it to any other arity fails to
/// compile.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityRow;

impl<T> ApplyRow<(T,)> for IdentityRow {
    type Out = T;
}

/// Maps every signature in a list through a row family.
pub trait MapRows<Row> {
    /// The resulting list of row types.
    type Output;
}

impl<Row> MapRows<Row> for Nil {
    type Output = Nil;
}

impl<Row, H, T> MapRows<Row> for Cons<H, T>
where
    H: Signature,
    Row: ApplyRow<H::Payload>,
    T: MapRows<Row>,
{
    type Output = Cons<<Row as ApplyRow<H::Payload>>::Out, T::Output>;
}

/// A variant family: folds a list of rows into one container type.
pub trait ApplyVariant<L> {
    /// The container holding any one of the rows in `L`.
    type Out;
}

/// Folds a row list into a right-nested [`Either`] chain terminated by
/// [`Never`]. One variant arm per row, in list order.
pub trait EitherChain {
    /// The chain type.
    type Chain;
}

impl EitherChain for Nil {
    type Chain = Never;
}

impl<H, T: EitherChain> EitherChain for Cons<H, T> {
    type Chain = Either<H, T::Chain>;
}

/// The general variant family: any number of rows, as an [`Either`]
/// chain. Zero rows materialize to the uninhabited [`Never`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EitherVariant;

impl<L: EitherChain> ApplyVariant<L> for EitherVariant {
    type Out = L::Chain;
}

/// The unwrapping variant family: defined only for exactly one row, which
/// it yields bare. Zero or several rows fail to compile.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityVariant;

impl<H> ApplyVariant<Cons<H, Nil>> for IdentityVariant {
    type Out = H;
}

/// A row list whose rows are all one type, exposed as `Row`.
///
/// The equality between head and tail rows is delegated to
/// [`UniformTail`], whose recursive step recurses on the bare tail type.
/// When the list is still open that tail is an inference variable, which
/// trait selection defers as ambiguous instead of unifying the tail with
/// ever-longer chains; encodings that recurse on `Cons<..>` head shapes
/// do not terminate there.
pub trait UniformList {
    /// The row type every element of the list shares.
    type Row;
}

impl<H, T> UniformList for Cons<H, T>
where
    T: UniformTail<H>,
{
    type Row = H;
}

/// A row list whose rows, if any, are all `Row`.
pub trait UniformTail<Row> {}

impl<Row> UniformTail<Row> for Nil {}

impl<Row, T> UniformTail<Row> for Cons<Row, T> where T: UniformTail<Row> {}

/// The collapsing variant family: defined when every row in the list is
/// the same type, which it yields bare; this is where duplicate
/// signatures visibly collapse. Zero rows yield [`Never`]; rows of two or
/// more distinct types fail to compile.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformVariant;

impl ApplyVariant<Nil> for UniformVariant {
    type Out = Never;
}

impl<H, T> ApplyVariant<Cons<H, T>> for UniformVariant
where
    Cons<H, T>: UniformList,
{
    type Out = <Cons<H, T> as UniformList>::Row;
}

/// The slot variant family: at most one row, yielded bare, with zero rows
/// materializing to [`Never`]. Used for per-child storage in the race
/// engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlotVariant;

impl ApplyVariant<Nil> for SlotVariant {
    type Out = Never;
}

impl<H> ApplyVariant<Cons<H, Nil>> for SlotVariant {
    type Out = H;
}

/// Applies a row family and then a variant family to a signature list.
pub type Materialized<L, Row, Var> = <Var as ApplyVariant<<L as MapRows<Row>>::Output>>::Out;
