//! Genotype representations.
//!
//! A genotype is the representation-specific payload of an
//! [`Individual`](crate::Individual). The population driver is generic over
//! the [`Genotype`] trait, so representations plug in without any runtime
//! type inspection.
//!
//! # Representations
//!
//! - [`linear`]: fixed-length placement arrays (cutting stock)
//! - [`tree`]: binary expression trees for genetic programming

pub mod linear;
pub mod tree;

use crate::error::Result;
use rand::Rng;

/// The capability set every representation provides.
///
/// All variation operators are pure: they borrow their inputs and return a
/// new genotype.
///
/// # Implementing
///
/// ```ignore
/// #[derive(Clone, Debug, PartialEq)]
/// struct Bits(Vec<bool>);
///
/// impl Genotype for Bits {
///     type Params = usize;
///     fn initialize<R: Rng>(count: usize, len: &usize, rng: &mut R) -> Result<Vec<Self>> {
///         Ok((0..count).map(|_| Bits((0..*len).map(|_| rng.random_bool(0.5)).collect())).collect())
///     }
///     // ...
/// }
/// ```
pub trait Genotype: Clone + std::fmt::Debug + Send + Sync + Sized {
    /// Domain parameters shared by initialization and the operators.
    type Params: Clone + std::fmt::Debug + Send + Sync;

    /// Creates `count` random genotypes.
    fn initialize<R: Rng>(count: usize, params: &Self::Params, rng: &mut R) -> Result<Vec<Self>>;

    /// Recombines `self` with `other` into a new genotype.
    fn recombine<R: Rng>(&self, other: &Self, params: &Self::Params, rng: &mut R) -> Result<Self>;

    /// Returns a mutated copy of `self`.
    fn mutate<R: Rng>(&self, params: &Self::Params, rng: &mut R) -> Result<Self>;

    /// Encodes the genotype as text.
    fn serialize(&self) -> String;

    /// Decodes text produced by [`serialize`](Genotype::serialize).
    fn deserialize(text: &str) -> Result<Self>;
}
