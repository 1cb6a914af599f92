//! Seeded random number generation.
//!
//! Every stochastic operation in the crate takes `&mut R where R: Rng`;
//! runs are reproducible when all draws come from one generator created
//! here.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Creates the generator used for a run.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Creates a generator from `seed`, or from OS entropy when `None`.
pub fn rng_from_option(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => create_rng(seed),
        None => create_rng(rand::random()),
    }
}
