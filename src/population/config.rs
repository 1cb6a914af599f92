//! Population driver configuration.
//!
//! [`PopulationConfig`] holds all parameters that control the generation
//! loop.

use crate::error::{EvolveError, Result};
use crate::selection::Selection;

/// How children are produced from the selected parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variation {
    /// Recombine consecutive parent pairs, then mutate each child with
    /// probability `mutation_rate`. The usual scheme for linear genotypes.
    #[default]
    Paired,

    /// Each child is either a mutant of one parent (probability
    /// `mutation_rate`) or the recombination of two distinct parents, never
    /// both. The usual scheme for genetic programming.
    Exclusive,
}

/// How fitness reaches survival selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitnessMode {
    /// The evaluator's fitness is used as is.
    #[default]
    Scalar,

    /// Fitness is reassigned from non-domination level (and optionally
    /// crowding) over the whole pool before survival.
    Pareto {
        /// Apply the crowding penalty within each level.
        crowding: bool,
    },
}

/// Configuration for the population driver.
///
/// # Defaults
///
/// ```
/// use u_evolve::PopulationConfig;
///
/// let config = PopulationConfig::default();
/// assert_eq!(config.mu, 100);
/// assert_eq!(config.num_children, 50);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::{PopulationConfig, Selection, Variation};
///
/// let config = PopulationConfig::default()
///     .with_mu(200)
///     .with_num_children(100)
///     .with_parent_selection(Selection::KTournament(5))
///     .with_survival_selection(Selection::Truncation)
///     .with_variation(Variation::Exclusive)
///     .with_mutation_rate(0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationConfig {
    /// Number of individuals that survive each generation.
    pub mu: usize,

    /// Number of children produced per generation (lambda).
    pub num_children: usize,

    /// Mutation probability per child (0.0–1.0).
    ///
    /// Under [`Variation::Paired`] a recombined child is additionally
    /// mutated with this probability; under [`Variation::Exclusive`] it is
    /// the chance a child is a mutant instead of a recombinant.
    pub mutation_rate: f64,

    /// Strategy for choosing `2 * num_children` parents.
    pub parent_selection: Selection,

    /// Strategy for reducing `mu + num_children` back to `mu`.
    pub survival_selection: Selection,

    /// Child production scheme.
    pub variation: Variation,

    /// Scalar or Pareto fitness.
    pub fitness_mode: FitnessMode,

    /// Evaluation budget, including the initial population.
    pub max_evaluations: usize,

    /// Generations without a new best fitness before stopping.
    ///
    /// Set to 0 to disable stagnation-based termination.
    pub stagnation_limit: usize,

    /// Whether to evaluate children in parallel using rayon.
    ///
    /// Only effective with the `parallel` feature.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Wall-clock limit in milliseconds, checked between generations.
    pub time_limit_ms: Option<u64>,

    /// Drop replay logs from every individual that holds neither the best
    /// fitness nor the best base fitness after each evaluation.
    pub retain_best_logs_only: bool,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            mu: 100,
            num_children: 50,
            mutation_rate: 0.1,
            parent_selection: Selection::KTournament(3),
            survival_selection: Selection::Truncation,
            variation: Variation::default(),
            fitness_mode: FitnessMode::default(),
            max_evaluations: 10_000,
            stagnation_limit: 0,
            parallel: false,
            seed: None,
            time_limit_ms: None,
            retain_best_logs_only: true,
        }
    }
}

impl PopulationConfig {
    /// Sets mu.
    pub fn with_mu(mut self, mu: usize) -> Self {
        self.mu = mu;
        self
    }

    /// Sets the number of children per generation.
    pub fn with_num_children(mut self, n: usize) -> Self {
        self.num_children = n;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the parent selection strategy.
    pub fn with_parent_selection(mut self, sel: Selection) -> Self {
        self.parent_selection = sel;
        self
    }

    /// Sets the survival selection strategy.
    pub fn with_survival_selection(mut self, sel: Selection) -> Self {
        self.survival_selection = sel;
        self
    }

    /// Sets the variation scheme.
    pub fn with_variation(mut self, variation: Variation) -> Self {
        self.variation = variation;
        self
    }

    /// Sets the fitness mode.
    pub fn with_fitness_mode(mut self, mode: FitnessMode) -> Self {
        self.fitness_mode = mode;
        self
    }

    /// Sets the evaluation budget.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = n;
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Keeps or drops the replay logs of non-best individuals.
    pub fn with_retain_best_logs_only(mut self, retain: bool) -> Self {
        self.retain_best_logs_only = retain;
        self
    }

    /// Preset for genetic programming: exclusive variation, fitness
    /// proportionate parents, survival tournaments without replacement.
    pub fn genetic_programming() -> Self {
        Self {
            mu: 500,
            num_children: 200,
            mutation_rate: 0.05,
            parent_selection: Selection::FitnessProportionate,
            survival_selection: Selection::KTournamentWithoutReplacement(5),
            variation: Variation::Exclusive,
            max_evaluations: 2_000,
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Checks the selection requests every generation will make against
    /// the population sizes, so a valid configuration never fails inside
    /// selection.
    pub fn validate(&self) -> Result<()> {
        if self.mu == 0 {
            return Err(EvolveError::invalid("mu must be at least 1"));
        }
        if self.num_children == 0 {
            return Err(EvolveError::invalid("num_children must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvolveError::invalid("mutation_rate must be within [0, 1]"));
        }
        if self.max_evaluations < self.mu {
            return Err(EvolveError::invalid(
                "max_evaluations must cover the initial population",
            ));
        }
        if self.time_limit_ms == Some(0) {
            return Err(EvolveError::invalid("time_limit_ms must be positive or None"));
        }
        self.parent_selection.validate()?;
        self.survival_selection.validate()?;

        check_request(self.parent_selection, self.mu, 2 * self.num_children, "parent")?;
        check_request(
            self.survival_selection,
            self.mu + self.num_children,
            self.mu,
            "survival",
        )?;

        if self.variation == Variation::Exclusive && self.mu < 2 && self.mutation_rate < 1.0 {
            return Err(EvolveError::invalid(
                "exclusive variation needs mu >= 2 to find distinct parents",
            ));
        }
        Ok(())
    }
}

/// Whether `selection` can pick `n` from a pool of `size`.
fn check_request(selection: Selection, size: usize, n: usize, role: &str) -> Result<()> {
    let fits = match selection {
        Selection::KTournament(k) => k <= size,
        Selection::KTournamentWithoutReplacement(k) => n + k - 1 <= size,
        Selection::Truncation => n <= size,
        _ => true,
    };
    if fits {
        Ok(())
    } else {
        Err(EvolveError::invalid(format!(
            "{role} selection ({selection}) cannot pick {n} from {size}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PopulationConfig::default();
        assert_eq!(config.mu, 100);
        assert_eq!(config.num_children, 50);
        assert_eq!(config.parent_selection, Selection::KTournament(3));
        assert_eq!(config.survival_selection, Selection::Truncation);
        assert_eq!(config.variation, Variation::Paired);
        assert_eq!(config.fitness_mode, FitnessMode::Scalar);
        assert!((config.mutation_rate - 0.1).abs() < 1e-10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = PopulationConfig::default()
            .with_mu(20)
            .with_num_children(10)
            .with_mutation_rate(1.5)
            .with_variation(Variation::Exclusive)
            .with_fitness_mode(FitnessMode::Pareto { crowding: true })
            .with_max_evaluations(500)
            .with_stagnation_limit(7)
            .with_parallel(true)
            .with_seed(42)
            .with_time_limit_ms(1_000)
            .with_retain_best_logs_only(false);

        assert_eq!(config.mu, 20);
        assert_eq!(config.num_children, 10);
        assert_eq!(config.mutation_rate, 1.0);
        assert_eq!(config.fitness_mode, FitnessMode::Pareto { crowding: true });
        assert_eq!(config.max_evaluations, 500);
        assert_eq!(config.stagnation_limit, 7);
        assert!(config.parallel);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.time_limit_ms, Some(1_000));
        assert!(!config.retain_best_logs_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_genetic_programming_preset() {
        let config = PopulationConfig::genetic_programming();
        assert_eq!(config.variation, Variation::Exclusive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sizes() {
        assert!(PopulationConfig::default().with_mu(0).validate().is_err());
        assert!(PopulationConfig::default().with_num_children(0).validate().is_err());
        assert!(PopulationConfig::default()
            .with_max_evaluations(10)
            .validate()
            .is_err());
        assert!(PopulationConfig::default()
            .with_time_limit_ms(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_selection_requests() {
        // Parents drawn without replacement: 2 * 30 + 2 - 1 > 50.
        let config = PopulationConfig::default()
            .with_mu(50)
            .with_num_children(30)
            .with_parent_selection(Selection::KTournamentWithoutReplacement(2));
        assert!(config.validate().is_err());

        // Survival tournament larger than the merged pool.
        let config = PopulationConfig::default()
            .with_mu(5)
            .with_num_children(5)
            .with_survival_selection(Selection::KTournament(11));
        assert!(config.validate().is_err());

        // mu + k - 1 > mu + lambda.
        let config = PopulationConfig::default()
            .with_mu(10)
            .with_num_children(2)
            .with_survival_selection(Selection::KTournamentWithoutReplacement(4));
        assert!(config.validate().is_err());

        let config = PopulationConfig::default()
            .with_parent_selection(Selection::KTournament(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_exclusive_needs_two() {
        let config = PopulationConfig::default()
            .with_mu(1)
            .with_num_children(1)
            .with_max_evaluations(10)
            .with_parent_selection(Selection::UniformRandom)
            .with_variation(Variation::Exclusive);
        assert!(config.validate().is_err());
        assert!(config.with_mutation_rate(1.0).validate().is_ok());
    }
}
