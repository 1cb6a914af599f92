//! Tree genotype for genetic programming.
//!
//! Genes are binary expression trees over domain terminals, random numeric
//! constants and the operators `+ - * / RAND`. The engine provides:
//!
//! - [`build`]: full, grow and ramped half-and-half construction
//! - [`variation`]: subtree crossover and subtree mutation under a depth limit
//! - text (de)serialization in the pipe-depth format (see [`Tree::serialize`])
//! - evaluation against terminal [`Bindings`]
//!
//! # References
//!
//! - Koza (1992), *Genetic Programming: On the Programming of Computers by
//!   Means of Natural Selection*
//! - Poli, Langdon & McPhee (2008), *A Field Guide to Genetic Programming*

pub mod build;
mod codec;
mod eval;
mod node;
pub mod variation;

pub use eval::Bindings;
pub use node::{Node, NodeId, Operator, Primitive, Tree};

use super::Genotype;
use crate::error::{EvolveError, Result};
use rand::Rng;

/// Parameters for tree construction and variation.
///
/// # Examples
///
/// ```
/// use u_evolve::genotype::tree::TreeParams;
///
/// let params = TreeParams::default()
///     .with_terminals(["G", "P", "F", "W"])
///     .with_constant_range(-5.0, 5.0)
///     .with_max_depth(6)
///     .with_prob_full(0.5);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeParams {
    /// Terminal symbols. One extra draw slot produces a random constant.
    pub terminals: Vec<String>,

    /// Closed range random constants are drawn from.
    pub constant_range: (f64, f64),

    /// Maximum tree height, for initialization and every child produced.
    pub max_depth: usize,

    /// Probability that ramped half-and-half uses the full method.
    pub prob_full: f64,

    /// Retry ceiling for depth-constrained splice searches.
    ///
    /// Crossover and mutation fail with
    /// [`EvolveError::ConstraintUnsatisfiable`] after this many rejected
    /// candidates.
    pub max_attempts: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            terminals: ["G", "P", "F", "W"].map(String::from).to_vec(),
            constant_range: (-10.0, 10.0),
            max_depth: 5,
            prob_full: 0.5,
            max_attempts: 10_000,
        }
    }
}

impl TreeParams {
    /// Sets the terminal symbols.
    pub fn with_terminals<I, S>(mut self, terminals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminals = terminals.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the constant range; bounds are reordered if reversed.
    pub fn with_constant_range(mut self, lo: f64, hi: f64) -> Self {
        self.constant_range = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self
    }

    /// Sets the maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the full-method probability.
    pub fn with_prob_full(mut self, p: f64) -> Self {
        self.prob_full = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the retry ceiling.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Validates the parameters.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(EvolveError::invalid("max_depth must be at least 1"));
        }
        let (lo, hi) = self.constant_range;
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(EvolveError::invalid(
                "constant_range must be finite with lo <= hi",
            ));
        }
        if !(0.0..=1.0).contains(&self.prob_full) {
            return Err(EvolveError::invalid("prob_full must be within [0, 1]"));
        }
        if self.max_attempts == 0 {
            return Err(EvolveError::invalid("max_attempts must be at least 1"));
        }
        if let Some(t) = self.terminals.iter().find(|t| !is_round_trip_symbol(t)) {
            return Err(EvolveError::invalid(format!(
                "terminal symbol {t:?} must be non-empty, single-line, not start with '|' \
                 and not read back as a number or an operator"
            )));
        }
        Ok(())
    }
}

/// Whether a terminal symbol serializes to a line that parses back as the
/// same terminal.
fn is_round_trip_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol.starts_with('|')
        && !symbol.contains(['\n', '\r'])
        && Primitive::parse(symbol) == Primitive::terminal(symbol)
}

impl Genotype for Tree {
    type Params = TreeParams;

    fn initialize<R: Rng>(count: usize, params: &TreeParams, rng: &mut R) -> Result<Vec<Self>> {
        params.validate()?;
        Ok(build::ramped_half_and_half(count, params, rng))
    }

    fn recombine<R: Rng>(&self, other: &Self, params: &TreeParams, rng: &mut R) -> Result<Self> {
        variation::subtree_crossover(self, other, params, rng)
    }

    fn mutate<R: Rng>(&self, params: &TreeParams, rng: &mut R) -> Result<Self> {
        variation::subtree_mutation(self, params, rng)
    }

    fn serialize(&self) -> String {
        Tree::serialize(self)
    }

    fn deserialize(text: &str) -> Result<Self> {
        Tree::deserialize(text)
    }
}
