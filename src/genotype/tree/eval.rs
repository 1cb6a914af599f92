//! Tree evaluation against terminal bindings.

use super::node::{NodeId, Operator, Primitive, Tree};
use crate::error::{EvolveError, Result};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

/// Supplies values for terminal symbols.
pub trait Bindings {
    /// Value bound to `symbol`, if any.
    fn lookup(&self, symbol: &str) -> Option<f64>;
}

impl Bindings for HashMap<String, f64> {
    fn lookup(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).copied()
    }
}

impl Bindings for BTreeMap<String, f64> {
    fn lookup(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).copied()
    }
}

impl Bindings for [(&str, f64)] {
    fn lookup(&self, symbol: &str) -> Option<f64> {
        self.iter().find(|(s, _)| *s == symbol).map(|&(_, v)| v)
    }
}

impl Tree {
    /// Folds the tree into a number.
    ///
    /// `/` by an exact zero yields 0. `RAND` draws uniformly between its two
    /// child values, whichever is larger.
    ///
    /// # Errors
    /// [`EvolveError::InvalidArgument`] if a terminal symbol is unbound.
    pub fn evaluate<B, R>(&self, bindings: &B, rng: &mut R) -> Result<f64>
    where
        B: Bindings + ?Sized,
        R: Rng,
    {
        self.evaluate_node(self.root(), bindings, rng)
    }

    /// Scores each candidate and returns the index of the first maximum,
    /// or `None` when there are no candidates.
    ///
    /// This is how a tree acts as a controller: each candidate binds the
    /// terminals for one possible successor state.
    pub fn choose_best<B, R>(&self, candidates: &[B], rng: &mut R) -> Result<Option<usize>>
    where
        B: Bindings,
        R: Rng,
    {
        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let score = self.evaluate(candidate, rng)?;
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((i, score));
            }
        }
        Ok(best.map(|(i, _)| i))
    }

    fn evaluate_node<B, R>(&self, id: NodeId, bindings: &B, rng: &mut R) -> Result<f64>
    where
        B: Bindings + ?Sized,
        R: Rng,
    {
        let node = self.node(id);
        let op = match node.primitive() {
            Primitive::Constant(value) => return Ok(*value),
            Primitive::Terminal(symbol) => {
                return bindings
                    .lookup(symbol)
                    .ok_or_else(|| EvolveError::invalid(format!("unbound terminal '{symbol}'")))
            }
            Primitive::Operator(op) => *op,
        };

        let (Some(l), Some(r)) = (node.left(), node.right()) else {
            return Err(EvolveError::invalid(format!("operator '{op}' is missing a child")));
        };
        let a = self.evaluate_node(l, bindings, rng)?;
        let b = self.evaluate_node(r, bindings, rng)?;

        Ok(match op {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            Operator::Rand => {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                if (hi - lo).is_finite() {
                    rng.random_range(lo..=hi)
                } else if lo.is_finite() && hi.is_finite() {
                    // Span overflows; sample the halved interval instead.
                    2.0 * rng.random_range(lo / 2.0..=hi / 2.0)
                } else {
                    lo + (hi - lo) * rng.random::<f64>()
                }
            }
        })
    }
}
