//! Selection operators.
//!
//! Every operator maps a population to `n` indices into it. Fitness is
//! **maximized**. Operators never touch the population; selecting the same
//! individual twice yields the same index twice, and the caller decides
//! whether to clone.
//!
//! # Operators
//!
//! | Variant | Replacement | Pressure |
//! |---------|-------------|----------|
//! | [`Selection::UniformRandom`] | with | none |
//! | [`Selection::KTournament`] | with | tunable by `k` |
//! | [`Selection::KTournamentWithoutReplacement`] | without | tunable by `k` |
//! | [`Selection::FitnessProportionate`] | with | proportional |
//! | [`Selection::StochasticUniversalSampling`] | with | proportional, low spread |
//! | [`Selection::Truncation`] | without | maximal |
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Baker (1987), "Reducing Bias and Inefficiency in the Selection Algorithm"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use crate::error::{EvolveError, Result};
use crate::individual::HasFitness;
use rand::seq::index;
use rand::Rng;
use std::fmt;

/// Selection strategy.
///
/// # Examples
///
/// ```
/// use u_evolve::Selection;
///
/// // Parent selection with moderate pressure
/// let parents = Selection::KTournament(3);
///
/// // Survival selection that never clones
/// let survival = Selection::KTournamentWithoutReplacement(4);
/// assert_ne!(parents, survival);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Each slot filled uniformly at random.
    UniformRandom,

    /// Per slot, the fittest of `k` distinct random individuals.
    ///
    /// The first contestant drawn wins ties. Slots are independent, so
    /// an individual may win several times.
    ///
    /// # Complexity
    /// O(k) per slot
    KTournament(usize),

    /// Tournaments over a shrinking pool: each winner is removed, so no
    /// index appears twice.
    ///
    /// Requires `n + k - 1 <= population size`.
    KTournamentWithoutReplacement(usize),

    /// Roulette wheel over fitness.
    ///
    /// If any fitness is negative, weights are shifted by the minimum so
    /// the worst individual gets weight 0 and is never drawn. If all
    /// fitness values are equal and negative, every weight is 1. Weights
    /// are scaled by the largest one, so huge finite fitness values cannot
    /// overflow the wheel. Infinite fitness is rejected.
    ///
    /// # Complexity
    /// O(n) setup, O(log n) per slot
    FitnessProportionate,

    /// Baker's stochastic universal sampling with the same weights as
    /// [`FitnessProportionate`](Selection::FitnessProportionate): `n`
    /// evenly spaced pointers from one random offset.
    StochasticUniversalSampling,

    /// The `n` fittest, in ascending fitness order. Ties keep their
    /// population order.
    ///
    /// # Complexity
    /// O(n log n)
    Truncation,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::KTournament(3)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::UniformRandom => write!(f, "uniform random"),
            Selection::KTournament(k) => write!(f, "{k}-tournament with replacement"),
            Selection::KTournamentWithoutReplacement(k) => {
                write!(f, "{k}-tournament without replacement")
            }
            Selection::FitnessProportionate => write!(f, "fitness proportionate"),
            Selection::StochasticUniversalSampling => write!(f, "stochastic universal sampling"),
            Selection::Truncation => write!(f, "truncation"),
        }
    }
}

impl Selection {
    /// Selects `n` indices into `population`.
    ///
    /// # Errors
    /// [`EvolveError::InvalidArgument`] when the request cannot be met:
    /// tournament `k < 2` or `k` above the population size, `n` above the
    /// population size for operators without replacement, `n > 0` on an
    /// empty population, an individual without fitness, or infinite
    /// fitness for the proportional operators.
    pub fn select<T: HasFitness, R: Rng>(
        &self,
        population: &[T],
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        match *self {
            Selection::UniformRandom => uniform_random(population, n, rng),
            Selection::KTournament(k) => k_tournament(population, n, k, rng),
            Selection::KTournamentWithoutReplacement(k) => {
                k_tournament_without_replacement(population, n, k, rng)
            }
            Selection::FitnessProportionate => fitness_proportionate(population, n, rng),
            Selection::StochasticUniversalSampling => {
                stochastic_universal_sampling(population, n, rng)
            }
            Selection::Truncation => truncation(population, n),
        }
    }

    /// Whether the operator can return the same index twice.
    pub fn with_replacement(&self) -> bool {
        !matches!(
            self,
            Selection::KTournamentWithoutReplacement(_) | Selection::Truncation
        )
    }

    /// Checks the strategy's own parameters.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Selection::KTournament(k) | Selection::KTournamentWithoutReplacement(k) => {
                check_k(k)
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Uniform random selection with replacement.
pub fn uniform_random<T: HasFitness, R: Rng>(
    population: &[T],
    n: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    check_non_empty(population.len())?;
    Ok((0..n).map(|_| rng.random_range(0..population.len())).collect())
}

/// `n` independent `k`-tournaments; contestants are distinct within a
/// tournament.
pub fn k_tournament<T: HasFitness, R: Rng>(
    population: &[T],
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    check_k(k)?;
    if n == 0 {
        return Ok(Vec::new());
    }
    let fitness = fitness_values(population)?;
    check_k_fits(k, fitness.len())?;

    Ok((0..n)
        .map(|_| {
            let contestants = index::sample(rng, fitness.len(), k);
            first_best(contestants.iter(), |i| fitness[i])
        })
        .collect())
}

/// `n` tournaments; each winner leaves the pool.
///
/// The pool is kept as a swap-remove vector, so a removal is O(1).
pub fn k_tournament_without_replacement<T: HasFitness, R: Rng>(
    population: &[T],
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    check_k(k)?;
    if n == 0 {
        return Ok(Vec::new());
    }
    let fitness = fitness_values(population)?;
    let size = fitness.len();
    check_k_fits(k, size)?;
    check_n_fits(n, size)?;
    if n + k - 1 > size {
        return Err(EvolveError::invalid(format!(
            "n + k - 1 = {} exceeds population size {size}",
            n + k - 1
        )));
    }

    let mut pool: Vec<usize> = (0..size).collect();
    let mut winners = Vec::with_capacity(n);
    for _ in 0..n {
        let slots = index::sample(rng, pool.len(), k);
        let slot = first_best(slots.iter(), |s| fitness[pool[s]]);
        winners.push(pool.swap_remove(slot));
    }
    Ok(winners)
}

/// Roulette wheel selection with replacement.
///
/// Falls back to uniform draws when the total weight is zero.
///
/// # Errors
/// [`EvolveError::InvalidArgument`] on missing, NaN or infinite fitness.
pub fn fitness_proportionate<T: HasFitness, R: Rng>(
    population: &[T],
    n: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let fitness = fitness_values(population)?;
    check_non_empty(fitness.len())?;
    check_finite(&fitness)?;
    let Some(wheel) = Wheel::new(&fitness) else {
        return Ok((0..n).map(|_| rng.random_range(0..fitness.len())).collect());
    };
    Ok((0..n)
        .map(|_| wheel.spin(rng.random_range(0.0..wheel.total())))
        .collect())
}

/// Stochastic universal sampling: one spin, `n` equally spaced pointers.
///
/// Falls back to uniform draws when the total weight is zero.
pub fn stochastic_universal_sampling<T: HasFitness, R: Rng>(
    population: &[T],
    n: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let fitness = fitness_values(population)?;
    check_non_empty(fitness.len())?;
    check_finite(&fitness)?;
    let Some(wheel) = Wheel::new(&fitness) else {
        return Ok((0..n).map(|_| rng.random_range(0..fitness.len())).collect());
    };
    let step = wheel.total() / n as f64;
    let offset = rng.random_range(0.0..step);
    Ok((0..n)
        .map(|i| wheel.spin(offset + i as f64 * step))
        .collect())
}

/// The `n` fittest individuals.
///
/// Output is in ascending fitness order, ties in population order.
pub fn truncation<T: HasFitness>(population: &[T], n: usize) -> Result<Vec<usize>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let fitness = fitness_values(population)?;
    check_n_fits(n, fitness.len())?;

    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));
    Ok(order.split_off(order.len() - n))
}

// ============================================================================
// Helpers
// ============================================================================

/// Cumulative fitness-proportionate weights.
struct Wheel {
    cumulative: Vec<f64>,
}

impl Wheel {
    /// Builds the wheel from finite fitness values, or `None` when the
    /// total weight is zero.
    ///
    /// Weights are divided by the largest weight, so the total lies in
    /// `[1, len]` and stays finite.
    fn new(fitness: &[f64]) -> Option<Self> {
        let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let max = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Halving both terms keeps `f - min` finite for any finite pair.
        let weights: Vec<f64> = match (min < 0.0, min == max) {
            (true, true) => vec![1.0; fitness.len()],
            (true, false) => fitness.iter().map(|&f| f / 2.0 - min / 2.0).collect(),
            (false, _) => fitness.to_vec(),
        };
        let top = weights.iter().copied().fold(0.0, f64::max);
        if top <= 0.0 {
            return None;
        }

        let mut total = 0.0;
        let cumulative = weights
            .iter()
            .map(|&w| {
                total += w / top;
                total
            })
            .collect();
        Some(Self { cumulative })
    }

    fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Index whose slice of the wheel contains `point`. Zero-weight slices
    /// are empty and never hit.
    fn spin(&self, point: f64) -> usize {
        let idx = self.cumulative.partition_point(|&c| c <= point);
        if idx < self.cumulative.len() {
            return idx;
        }
        // Floating-point overshoot: last slice with positive weight.
        let top = self.total();
        self.cumulative.partition_point(|&c| c < top)
    }
}

/// Position of the first maximum among `candidates`.
fn first_best<I, F>(candidates: I, fitness: F) -> usize
where
    I: Iterator<Item = usize>,
    F: Fn(usize) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for c in candidates {
        let f = fitness(c);
        if best.map_or(true, |(_, top)| f > top) {
            best = Some((c, f));
        }
    }
    best.map_or(0, |(c, _)| c)
}

fn fitness_values<T: HasFitness>(population: &[T]) -> Result<Vec<f64>> {
    population
        .iter()
        .enumerate()
        .map(|(i, ind)| match ind.fitness() {
            Some(f) if !f.is_nan() => Ok(f),
            Some(_) => Err(EvolveError::invalid(format!("individual {i} has NaN fitness"))),
            None => Err(EvolveError::invalid(format!("individual {i} has no fitness"))),
        })
        .collect()
}

fn check_finite(fitness: &[f64]) -> Result<()> {
    if let Some(i) = fitness.iter().position(|f| f.is_infinite()) {
        return Err(EvolveError::invalid(format!(
            "individual {i} has infinite fitness {}",
            fitness[i]
        )));
    }
    Ok(())
}

fn check_k(k: usize) -> Result<()> {
    if k < 2 {
        return Err(EvolveError::invalid(format!("tournament size k = {k} must be at least 2")));
    }
    Ok(())
}

fn check_k_fits(k: usize, size: usize) -> Result<()> {
    if k > size {
        return Err(EvolveError::invalid(format!(
            "tournament size k = {k} exceeds population size {size}"
        )));
    }
    Ok(())
}

fn check_n_fits(n: usize, size: usize) -> Result<()> {
    if n > size {
        return Err(EvolveError::invalid(format!(
            "cannot select {n} without replacement from {size}"
        )));
    }
    Ok(())
}

fn check_non_empty(size: usize) -> Result<()> {
    if size == 0 {
        return Err(EvolveError::invalid("cannot select from an empty population"));
    }
    Ok(())
}
