//! Candidate solutions and their fitness bookkeeping.

use crate::error::Result;
use crate::evaluation::Evaluation;
use crate::genotype::Genotype;
use rand::Rng;

/// Anything selection operators can rank.
///
/// Fitness is **maximized**: higher is better. `None` means the value has
/// not been assigned yet; selection rejects such individuals.
pub trait HasFitness {
    /// Returns the fitness, if evaluated.
    fn fitness(&self) -> Option<f64>;
}

/// One candidate solution: a genotype plus the fields an evaluator and the
/// multi-objective ranking write.
///
/// Variation never touches an existing individual. [`recombine`] and
/// [`mutate`] borrow their parents and return a new, unevaluated child.
///
/// [`recombine`]: Individual::recombine
/// [`mutate`]: Individual::mutate
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Individual<G> {
    /// Representation-specific payload.
    pub genes: G,

    /// Fitness used by selection (after any penalty).
    pub fitness: Option<f64>,

    /// Fitness before penalties are applied.
    pub base_fitness: Option<f64>,

    /// Number of constraint violations, for constrained problems.
    pub violations: Option<usize>,

    /// Objective values, all maximized.
    pub objectives: Option<Vec<f64>>,

    /// Non-domination level, 1 being the best front.
    pub level: Option<usize>,

    /// Crowding distance within the individual's level.
    pub crowding: Option<f64>,

    /// Replay log produced by the evaluator.
    pub log: Option<String>,
}

impl<G> Individual<G> {
    /// Wraps genes in an unevaluated individual.
    pub fn new(genes: G) -> Self {
        Self {
            genes,
            fitness: None,
            base_fitness: None,
            violations: None,
            objectives: None,
            level: None,
            crowding: None,
            log: None,
        }
    }

    /// Copies an evaluator's output into this individual.
    pub fn apply(&mut self, evaluation: Evaluation) {
        self.fitness = Some(evaluation.fitness);
        self.base_fitness = evaluation.base_fitness;
        self.violations = evaluation.violations;
        self.objectives = evaluation.objectives;
        self.log = evaluation.log;
    }

    /// Whether a fitness has been assigned.
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }
}

impl<G: Genotype> Individual<G> {
    /// Creates `count` random individuals.
    pub fn initialization<R: Rng>(count: usize, params: &G::Params, rng: &mut R) -> Result<Vec<Self>> {
        Ok(G::initialize(count, params, rng)?
            .into_iter()
            .map(Individual::new)
            .collect())
    }

    /// Produces a child from `self` and `mate`. Neither parent is modified.
    pub fn recombine<R: Rng>(&self, mate: &Self, params: &G::Params, rng: &mut R) -> Result<Self> {
        Ok(Individual::new(self.genes.recombine(&mate.genes, params, rng)?))
    }

    /// Produces a mutated copy of `self`.
    pub fn mutate<R: Rng>(&self, params: &G::Params, rng: &mut R) -> Result<Self> {
        Ok(Individual::new(self.genes.mutate(params, rng)?))
    }

    /// Serializes the genes.
    pub fn serialize(&self) -> String {
        self.genes.serialize()
    }

    /// Rebuilds an unevaluated individual from serialized genes.
    pub fn deserialize(text: &str) -> Result<Self> {
        Ok(Individual::new(G::deserialize(text)?))
    }
}

impl<G> HasFitness for Individual<G> {
    fn fitness(&self) -> Option<f64> {
        self.fitness
    }
}
