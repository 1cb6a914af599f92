//! Generation loop execution.
//!
//! [`EvolutionRunner`] orchestrates a complete run:
//! initialization → evaluation → (children → evaluation → survival) × N.

use super::{GenerationStats, Population, PopulationConfig};
use crate::error::{EvolveError, Result};
use crate::evaluation::Evaluator;
use crate::genotype::Genotype;
use crate::individual::Individual;
use crate::random::rng_from_option;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Result of an evolutionary run.
#[derive(Debug, Clone)]
pub struct RunResult<G> {
    /// Individual with the highest evaluator fitness seen during the run.
    pub best: Individual<G>,

    /// Members of the final population.
    pub population: Vec<Individual<G>>,

    /// Statistics after initialization and after every generation.
    pub stats: Vec<GenerationStats>,

    /// Textual log of the run.
    pub log: Vec<String>,

    /// Number of completed generations.
    pub generations: usize,

    /// Total number of evaluations.
    pub evaluations: usize,

    /// Whether the run stopped because the best fitness stagnated.
    pub stagnated: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,
}

/// Executes the generation loop.
///
/// # Usage
///
/// ```
/// use rand::rngs::StdRng;
/// use u_evolve::genotype::linear::{Layout, LinearParams};
/// use u_evolve::{Evaluation, EvolutionRunner, PopulationConfig, Result};
///
/// // Maximize the sum of x coordinates.
/// let evaluator = |genes: &Layout, _: &mut StdRng| -> Result<Evaluation> {
///     Ok(Evaluation::new(genes.placements().iter().map(|p| p.x as f64).sum()))
/// };
/// let config = PopulationConfig::default()
///     .with_mu(20)
///     .with_num_children(10)
///     .with_max_evaluations(500)
///     .with_seed(42);
/// let result = EvolutionRunner::run(&evaluator, &LinearParams::new(5), &config).unwrap();
/// assert!(result.evaluations <= 500);
/// ```
pub struct EvolutionRunner;

impl EvolutionRunner {
    /// Runs until the evaluation budget, the stagnation limit or the time
    /// limit stops it.
    ///
    /// # Errors
    /// Invalid configuration or parameters, or the first failure of
    /// selection, variation or the evaluator. Evaluator failures are not
    /// retried.
    pub fn run<G, E>(evaluator: &E, params: &G::Params, config: &PopulationConfig) -> Result<RunResult<G>>
    where
        G: Genotype,
        E: Evaluator<G> + ?Sized,
    {
        Self::run_with_cancel(evaluator, params, config, None)
    }

    /// Runs with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the run stops
    /// before the next generation and returns the best individual found so
    /// far.
    pub fn run_with_cancel<G, E>(
        evaluator: &E,
        params: &G::Params,
        config: &PopulationConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<RunResult<G>>
    where
        G: Genotype,
        E: Evaluator<G> + ?Sized,
    {
        let start = Instant::now();
        let mut rng = rng_from_option(config.seed);

        // 1. Initialize and evaluate
        let mut population: Population<G> = Population::new(params.clone(), config.clone(), &mut rng)?;
        population.evaluate_individuals(evaluator, &mut rng)?;

        let initial = population.stats()?;
        log::info!(
            "initial population: best fitness {}, mean fitness {}",
            initial.best_fitness,
            initial.mean_fitness
        );
        for line in initial.log_lines() {
            population.push_log(line);
        }
        let mut stats = vec![initial];

        let mut best_fitness = best_fitness_of(&population)?;
        let mut stagnation_counter = 0usize;
        let mut generations = 0usize;
        let mut stagnated = false;
        let mut cancelled = false;

        // 2. Generation loop
        while population.evaluations() + config.num_children <= config.max_evaluations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if let Some(limit) = config.time_limit_ms {
                if start.elapsed().as_millis() >= u128::from(limit) {
                    log::info!("time limit of {limit} ms reached");
                    break;
                }
            }

            population.generate_children(&mut rng)?;
            population.evaluate_children(evaluator, &mut rng)?;
            population.survival(&mut rng)?;
            generations += 1;

            let gen_stats = population.stats()?;
            log::info!(
                "generation {generations}: evaluations {}, best fitness {}, mean fitness {}",
                gen_stats.evaluations,
                gen_stats.best_fitness,
                gen_stats.mean_fitness
            );
            for line in gen_stats.log_lines() {
                population.push_log(line);
            }
            stats.push(gen_stats);

            let gen_best = best_fitness_of(&population)?;
            if gen_best > best_fitness {
                best_fitness = gen_best;
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                log::warn!("stopping after {stagnation_counter} generations without improvement");
                stagnated = true;
                break;
            }
        }

        let best = population
            .best()
            .cloned()
            .ok_or_else(|| EvolveError::invalid("no evaluated individuals"))?;
        let evaluations = population.evaluations();
        log::info!(
            "finished after {generations} generations and {evaluations} evaluations, best fitness {:?}",
            best.fitness
        );

        let (population, log) = population.into_parts();
        Ok(RunResult {
            best,
            population,
            stats,
            log,
            generations,
            evaluations,
            stagnated,
            cancelled,
        })
    }
}

fn best_fitness_of<G: Genotype>(population: &Population<G>) -> Result<f64> {
    population
        .best()
        .and_then(|b| b.fitness)
        .ok_or_else(|| EvolveError::invalid("no evaluated individuals"))
}

// ============================================================================
// Tests
// ============================================================================
