//! Population-based evolution.
//!
//! A [`Population`] holds `mu` individuals of one [`Genotype`] and advances
//! them one generation at a time:
//!
//! 1. [`generate_children`](Population::generate_children): parent selection
//!    plus variation produce `num_children` new individuals
//! 2. [`evaluate_children`](Population::evaluate_children): every child is
//!    evaluated once
//! 3. [`survival`](Population::survival): parents and children compete for
//!    the `mu` places of the next generation
//!
//! [`EvolutionRunner`] repeats these steps until the evaluation budget is
//! spent, the search stagnates, or the run is cancelled.
//!
//! Besides the `log` facade, a population records its own textual log so a
//! run can be inspected without installing a logger.
//!
//! # References
//!
//! - Eiben & Smith (2015), "Introduction to Evolutionary Computing", Ch. 5
//! - Koza (1992), "Genetic Programming", Ch. 6

mod config;
mod runner;
mod stats;

pub use config::{FitnessMode, PopulationConfig, Variation};
pub use runner::{EvolutionRunner, RunResult};
pub use stats::GenerationStats;

use crate::error::{EvolveError, Result};
use crate::evaluation::{evaluate_population, retain_best_logs, Evaluator};
use crate::genotype::Genotype;
use crate::individual::Individual;
use crate::multi_objective::assign_fitnesses;
use rand::seq::SliceRandom;
use rand::Rng;

/// A population of `mu` individuals plus the children of the current
/// generation.
#[derive(Debug, Clone)]
pub struct Population<G: Genotype> {
    individuals: Vec<Individual<G>>,
    children: Vec<Individual<G>>,
    best: Option<Individual<G>>,
    evaluations: usize,
    log: Vec<String>,
    params: G::Params,
    config: PopulationConfig,
}

impl<G: Genotype> Population<G> {
    /// Creates `mu` random, unevaluated individuals.
    ///
    /// # Errors
    /// Invalid configuration or genotype parameters.
    pub fn new<R: Rng>(params: G::Params, config: PopulationConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let individuals = Individual::<G>::initialization(config.mu, &params, rng)?;

        let log = vec![
            format!("mu: {}", config.mu),
            format!("num_children: {}", config.num_children),
            format!("mutation rate: {}", config.mutation_rate),
            format!("parent selection: {}", config.parent_selection),
            format!("survival selection: {}", config.survival_selection),
            format!("initial population size: {}", individuals.len()),
        ];
        log::debug!("initialized population of {}", individuals.len());

        Ok(Self {
            individuals,
            children: Vec::new(),
            best: None,
            evaluations: 0,
            log,
            params,
            config,
        })
    }

    /// Current members of the population.
    pub fn individuals(&self) -> &[Individual<G>] {
        &self.individuals
    }

    /// Children produced since the last survival.
    pub fn children(&self) -> &[Individual<G>] {
        &self.children
    }

    /// Highest evaluator fitness seen so far, with its log.
    ///
    /// Recorded before any Pareto re-ranking, so it reflects the evaluator's
    /// own fitness in every mode.
    pub fn best(&self) -> Option<&Individual<G>> {
        self.best.as_ref()
    }

    /// Number of evaluations performed.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Textual log of the run so far.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Appends a line to the textual log.
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    /// The configuration in use.
    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    /// Consumes the population, returning its members and log.
    pub fn into_parts(self) -> (Vec<Individual<G>>, Vec<String>) {
        (self.individuals, self.log)
    }

    /// Evaluates the initial members.
    ///
    /// In Pareto mode the population is then ranked so the first parent
    /// selection sees level-based fitness.
    pub fn evaluate_individuals<E, R>(&mut self, evaluator: &E, rng: &mut R) -> Result<usize>
    where
        E: Evaluator<G> + ?Sized,
        R: Rng,
    {
        let count = evaluate_population(evaluator, &mut self.individuals, rng, self.config.parallel)?;
        self.evaluations += count;
        record_best(&mut self.best, &self.individuals);
        if let FitnessMode::Pareto { crowding } = self.config.fitness_mode {
            assign_fitnesses(&mut self.individuals, crowding)?;
        }
        if self.config.retain_best_logs_only {
            retain_best_logs(&mut self.individuals);
        }
        Ok(count)
    }

    /// Replaces the children with `num_children` new ones.
    ///
    /// Parents are chosen by the parent selection (`2 * num_children`
    /// draws) and shuffled. No parent is modified.
    ///
    /// # Errors
    /// Selection or variation failures, or
    /// [`EvolveError::ConstraintUnsatisfiable`] when exclusive variation
    /// needs two distinct parents but every draw picked the same individual.
    pub fn generate_children<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let n = self.config.num_children;
        let mut parents = self
            .config
            .parent_selection
            .select(&self.individuals, 2 * n, rng)?;
        parents.shuffle(rng);

        let rate = self.config.mutation_rate;
        let mut children = Vec::with_capacity(n);
        let mut recombinations = 0usize;
        let mut mutations = 0usize;

        match self.config.variation {
            Variation::Paired => {
                for pair in parents.chunks_exact(2) {
                    let child = self.individuals[pair[0]].recombine(
                        &self.individuals[pair[1]],
                        &self.params,
                        rng,
                    )?;
                    recombinations += 1;
                    let child = if rng.random_bool(rate) {
                        mutations += 1;
                        child.mutate(&self.params, rng)?
                    } else {
                        child
                    };
                    children.push(child);
                }
            }
            Variation::Exclusive => {
                // Each child consumes one parent for a mutation, two for a
                // recombination, so the 2n drawn parents always suffice.
                let mut cursor = 0;
                while children.len() < n {
                    let first = parents[cursor];
                    if rng.random_bool(rate) {
                        children.push(self.individuals[first].mutate(&self.params, rng)?);
                        mutations += 1;
                        cursor += 1;
                    } else {
                        let second = distinct_partner(&mut parents, cursor).ok_or(
                            EvolveError::ConstraintUnsatisfiable {
                                operation: "distinct parent pairing",
                                attempts: parents.len(),
                            },
                        )?;
                        children.push(self.individuals[first].recombine(
                            &self.individuals[second],
                            &self.params,
                            rng,
                        )?);
                        recombinations += 1;
                        cursor += 2;
                    }
                }
            }
        }

        self.log.push(format!("children: {}", children.len()));
        self.log.push(format!("recombinations: {recombinations}"));
        self.log.push(format!("mutations: {mutations}"));
        log::debug!(
            "generated {} children ({recombinations} recombinations, {mutations} mutations)",
            children.len()
        );

        self.children = children;
        Ok(())
    }

    /// Evaluates the current children.
    pub fn evaluate_children<E, R>(&mut self, evaluator: &E, rng: &mut R) -> Result<usize>
    where
        E: Evaluator<G> + ?Sized,
        R: Rng,
    {
        let count = evaluate_population(evaluator, &mut self.children, rng, self.config.parallel)?;
        self.evaluations += count;
        record_best(&mut self.best, &self.children);
        Ok(count)
    }

    /// Reduces parents plus children to `mu` survivors.
    ///
    /// In Pareto mode the merged pool is re-ranked first. An individual
    /// selected more than once is cloned; the last copy is moved.
    ///
    /// # Errors
    /// Ranking or selection failures. The population is left unchanged.
    pub fn survival<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let mut pool = std::mem::take(&mut self.individuals);
        pool.append(&mut self.children);
        let pre = pool.len();

        let chosen = match self.rank_and_select(&mut pool, rng) {
            Ok(chosen) => chosen,
            Err(e) => {
                let children = pool.split_off(self.config.mu.min(pool.len()));
                self.individuals = pool;
                self.children = children;
                return Err(e);
            }
        };

        self.individuals = take_selected(pool, &chosen);
        if self.config.retain_best_logs_only {
            retain_best_logs(&mut self.individuals);
        }

        self.log.push(format!("pre-survival population size: {pre}"));
        self.log
            .push(format!("post-survival population size: {}", self.individuals.len()));
        Ok(())
    }

    /// Statistics of the current members.
    pub fn stats(&self) -> Result<GenerationStats> {
        GenerationStats::from_population(&self.individuals, self.evaluations)
    }

    fn rank_and_select<R: Rng>(&self, pool: &mut [Individual<G>], rng: &mut R) -> Result<Vec<usize>> {
        if let FitnessMode::Pareto { crowding } = self.config.fitness_mode {
            assign_fitnesses(pool, crowding)?;
        }
        self.config.survival_selection.select(pool, self.config.mu, rng)
    }
}

/// Partner for `parents[cursor]` that is a different population slot.
///
/// Prefers `parents[cursor + 1]`, then swaps in the next unused parent that
/// differs, then reuses an already consumed one.
fn distinct_partner(parents: &mut [usize], cursor: usize) -> Option<usize> {
    let first = parents[cursor];
    let next = cursor + 1;
    if parents[next] != first {
        return Some(parents[next]);
    }
    if let Some(j) = (next + 1..parents.len()).find(|&j| parents[j] != first) {
        parents.swap(next, j);
        return Some(parents[next]);
    }
    parents[..cursor].iter().copied().find(|&p| p != first)
}

/// Builds the survivor list, cloning repeated picks and moving the last one.
fn take_selected<T: Clone>(pool: Vec<T>, chosen: &[usize]) -> Vec<T> {
    let mut remaining = vec![0usize; pool.len()];
    for &i in chosen {
        remaining[i] += 1;
    }
    let mut slots: Vec<Option<T>> = pool.into_iter().map(Some).collect();
    chosen
        .iter()
        .filter_map(|&i| {
            remaining[i] -= 1;
            if remaining[i] == 0 {
                slots[i].take()
            } else {
                slots[i].clone()
            }
        })
        .collect()
}

fn record_best<G: Clone>(best: &mut Option<Individual<G>>, candidates: &[Individual<G>]) {
    let top = candidates
        .iter()
        .filter(|ind| ind.fitness.is_some_and(|f| !f.is_nan()))
        .max_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(top) = top {
        if best.as_ref().map_or(true, |b| top.fitness > b.fitness) {
            *best = Some(top.clone());
        }
    }
}
