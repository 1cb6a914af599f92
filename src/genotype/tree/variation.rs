//! Subtree crossover and subtree mutation under a depth limit.
//!
//! Both operators borrow their parents and return a new tree. Candidate
//! splice points are drawn uniformly and rejected while the result would
//! exceed `max_depth`; after `max_attempts` rejections the operator fails
//! with [`EvolveError::ConstraintUnsatisfiable`].

use super::build;
use super::node::Tree;
use super::TreeParams;
use crate::error::{EvolveError, Result};
use rand::Rng;

/// Replaces a random subtree of `first` with a random subtree of `second`.
///
/// A pair `(cut, donor)` is accepted when `depth(cut) + height(donor) <=
/// max_depth`. Cutting at the root yields a copy of the donor subtree.
pub fn subtree_crossover<R: Rng>(
    first: &Tree,
    second: &Tree,
    params: &TreeParams,
    rng: &mut R,
) -> Result<Tree> {
    let cuts = first.enumerate();
    let donors = second.enumerate();

    for _ in 0..params.max_attempts {
        let (cut, cut_depth) = cuts[rng.random_range(0..cuts.len())];
        let (donor, _) = donors[rng.random_range(0..donors.len())];

        if cut_depth + second.node(donor).height() > params.max_depth {
            continue;
        }

        let child = if cut_depth == 0 {
            second.subtree(donor)
        } else {
            let mut child = first.clone();
            child.splice(cut, second, donor);
            child
        };
        debug_assert!(child.is_consistent());
        return Ok(child);
    }

    Err(EvolveError::ConstraintUnsatisfiable {
        operation: "subtree crossover",
        attempts: params.max_attempts,
    })
}

/// Replaces a random non-root subtree with a freshly grown one.
///
/// Single-node trees come back unchanged: there is no non-root node to
/// replace.
pub fn subtree_mutation<R: Rng>(parent: &Tree, params: &TreeParams, rng: &mut R) -> Result<Tree> {
    let mut mutant = parent.clone();
    if mutant.size() == 1 {
        return Ok(mutant);
    }

    let candidates: Vec<_> = mutant
        .enumerate()
        .into_iter()
        .filter(|&(_, depth)| depth != 0)
        .collect();

    for _ in 0..params.max_attempts {
        let (point, depth) = candidates[rng.random_range(0..candidates.len())];
        let fresh = build::grow(params.max_depth, params, rng);

        if depth + fresh.height() > params.max_depth {
            continue;
        }

        mutant.splice(point, &fresh, fresh.root());
        debug_assert!(mutant.is_consistent());
        return Ok(mutant);
    }

    Err(EvolveError::ConstraintUnsatisfiable {
        operation: "subtree mutation",
        attempts: params.max_attempts,
    })
}
