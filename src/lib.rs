//! Representation-agnostic evolutionary computation core.
//!
//! Provides the building blocks shared by evolutionary algorithms and a
//! generic population driver on top of them:
//!
//! - **Selection**: uniform random, k-tournament with and without
//!   replacement, fitness proportionate, stochastic universal sampling and
//!   truncation, all returning indices into the population.
//! - **Genotypes**: a [`Genotype`] trait with two representations, binary
//!   expression trees for genetic programming ([`Tree`]) and fixed-length
//!   placement arrays for cutting stock ([`Layout`]).
//! - **Multi-objective ranking**: non-dominated sorting, crowding distance,
//!   level-based fitness assignment and exact hypervolume.
//! - **Evaluation**: an [`Evaluator`] trait plus adapters for external game
//!   and layout simulators with parsimony and penalty handling.
//! - **Population driver**: `mu + lambda` generation loop with paired or
//!   exclusive variation, scalar or Pareto fitness, evaluation budget,
//!   stagnation and cancellation.
//!
//! All fitness values are **maximized**.
//!
//! # Features
//!
//! - `parallel`: evaluate individuals with rayon
//! - `serde`: derive `Serialize`/`Deserialize` on configuration and data types
//!
//! # Example
//!
//! ```
//! use rand::rngs::StdRng;
//! use u_evolve::{Evaluation, EvolutionRunner, PopulationConfig, Result, Tree, TreeParams, Variation};
//!
//! // Prefer small trees.
//! let evaluator = |genes: &Tree, _: &mut StdRng| -> Result<Evaluation> {
//!     Ok(Evaluation::new(-(genes.size() as f64)))
//! };
//! let config = PopulationConfig::default()
//!     .with_mu(20)
//!     .with_num_children(10)
//!     .with_variation(Variation::Exclusive)
//!     .with_max_evaluations(200)
//!     .with_seed(1);
//! let result = EvolutionRunner::run(&evaluator, &TreeParams::default(), &config).unwrap();
//! assert!(result.best.fitness.unwrap() <= -1.0);
//! ```

pub mod error;
pub mod evaluation;
pub mod genotype;
pub mod individual;
pub mod multi_objective;
pub mod population;
pub mod random;
pub mod selection;

pub use error::{EvolveError, Result};
pub use evaluation::{
    Evaluation, Evaluator, GameSimulator, LayoutEvaluator, LayoutScore, Parsimony,
    ParsimonyEvaluator, PenaltyEvaluator,
};
pub use genotype::linear::{Layout, LinearParams, Placement};
pub use genotype::tree::{Tree, TreeParams};
pub use genotype::Genotype;
pub use individual::{HasFitness, Individual};
pub use population::{
    EvolutionRunner, FitnessMode, GenerationStats, Population, PopulationConfig, RunResult,
    Variation,
};
pub use selection::Selection;
