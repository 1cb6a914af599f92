//! Fitness evaluation.
//!
//! An [`Evaluator`] turns genes into an [`Evaluation`]. The adapters in this
//! module wrap the two external simulators the framework is used with:
//!
//! - [`ParsimonyEvaluator`]: a [`GameSimulator`] plays a match with a tree
//!   controller; fitness is the score minus a size penalty
//! - [`PenaltyEvaluator`]: a [`LayoutEvaluator`] scores a cutting-stock
//!   layout; fitness is the unconstrained score minus a penalty per
//!   constraint violation
//!
//! [`evaluate_population`] drives an evaluator over a population, optionally
//! in parallel (feature `parallel`). Each individual gets its own generator
//! seeded from the shared one in population order, so both paths produce the
//! same results.

use crate::error::Result;
use crate::genotype::linear::Layout;
use crate::genotype::tree::Tree;
use crate::individual::Individual;
use crate::random::create_rng;
use rand::rngs::StdRng;
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Output of one evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Fitness seen by selection.
    pub fitness: f64,
    /// Fitness before penalties.
    pub base_fitness: Option<f64>,
    /// Constraint violations.
    pub violations: Option<usize>,
    /// Objective values for Pareto ranking, all maximized.
    pub objectives: Option<Vec<f64>>,
    /// Replay log.
    pub log: Option<String>,
}

impl Evaluation {
    /// An evaluation carrying only a fitness.
    pub fn new(fitness: f64) -> Self {
        Self {
            fitness,
            ..Self::default()
        }
    }

    /// Sets the pre-penalty fitness.
    pub fn with_base_fitness(mut self, base: f64) -> Self {
        self.base_fitness = Some(base);
        self
    }

    /// Sets the violation count.
    pub fn with_violations(mut self, violations: usize) -> Self {
        self.violations = Some(violations);
        self
    }

    /// Sets the objective vector.
    pub fn with_objectives(mut self, objectives: Vec<f64>) -> Self {
        self.objectives = Some(objectives);
        self
    }

    /// Attaches a replay log.
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }
}

/// Computes the fitness of a genotype.
///
/// Implemented for any `Fn(&G, &mut StdRng) -> Result<Evaluation>` closure.
pub trait Evaluator<G>: Send + Sync {
    /// Evaluates `genes`. Stochastic evaluators draw from `rng` only.
    fn evaluate(&self, genes: &G, rng: &mut StdRng) -> Result<Evaluation>;
}

impl<G, F> Evaluator<G> for F
where
    F: Fn(&G, &mut StdRng) -> Result<Evaluation> + Send + Sync,
{
    fn evaluate(&self, genes: &G, rng: &mut StdRng) -> Result<Evaluation> {
        self(genes, rng)
    }
}

// ============================================================================
// Game controllers
// ============================================================================

/// An external game engine that plays one match with a tree controller.
pub trait GameSimulator: Send + Sync {
    /// Plays a game and returns `(score, replay_log)`.
    fn play_game(&self, controller: &Tree, rng: &mut StdRng) -> Result<(f64, String)>;
}

/// How [`ParsimonyEvaluator`] applies the size pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parsimony {
    /// Subtract `coefficient * size` from the score.
    #[default]
    Penalty,
    /// Report `[score, -size]` as objectives for Pareto ranking.
    Objective,
}

/// Scores tree controllers by game score with parsimony pressure.
#[derive(Debug, Clone)]
pub struct ParsimonyEvaluator<S> {
    simulator: S,
    coefficient: f64,
    mode: Parsimony,
}

impl<S: GameSimulator> ParsimonyEvaluator<S> {
    /// Penalizes each node by `coefficient`.
    pub fn new(simulator: S, coefficient: f64) -> Self {
        Self {
            simulator,
            coefficient,
            mode: Parsimony::Penalty,
        }
    }

    /// Sets how size pressure is applied.
    pub fn with_mode(mut self, mode: Parsimony) -> Self {
        self.mode = mode;
        self
    }
}

impl<S: GameSimulator> Evaluator<Tree> for ParsimonyEvaluator<S> {
    fn evaluate(&self, genes: &Tree, rng: &mut StdRng) -> Result<Evaluation> {
        let (score, log) = self.simulator.play_game(genes, rng)?;
        let size = genes.size() as f64;
        let evaluation = Evaluation::new(score - self.coefficient * size)
            .with_base_fitness(score)
            .with_log(log);
        Ok(match self.mode {
            Parsimony::Penalty => evaluation,
            Parsimony::Objective => evaluation.with_objectives(vec![score, -size]),
        })
    }
}

// ============================================================================
// Cutting stock
// ============================================================================

/// Raw score of a layout from the external placement routines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutScore {
    /// Score ignoring constraint violations.
    pub fitness: f64,
    /// Overlapping or out-of-bounds cells.
    pub violations: usize,
    /// Optional per-objective scores, all maximized.
    pub objectives: Option<Vec<f64>>,
}

/// The external placement and geometry routines.
pub trait LayoutEvaluator: Send + Sync {
    /// Places every shape and scores the result.
    fn evaluate_layout(&self, layout: &Layout) -> Result<LayoutScore>;
}

/// Penalty-based constraint handling for layouts.
///
/// `fitness = score - penalty * violations`. `base_fitness` is the score of
/// valid layouts and `failure_fitness` otherwise.
#[derive(Debug, Clone)]
pub struct PenaltyEvaluator<L> {
    layout: L,
    penalty: f64,
    failure_fitness: f64,
}

impl<L: LayoutEvaluator> PenaltyEvaluator<L> {
    /// Creates the adapter.
    pub fn new(layout: L, penalty: f64, failure_fitness: f64) -> Self {
        Self {
            layout,
            penalty,
            failure_fitness,
        }
    }
}

impl<L: LayoutEvaluator> Evaluator<Layout> for PenaltyEvaluator<L> {
    fn evaluate(&self, genes: &Layout, _rng: &mut StdRng) -> Result<Evaluation> {
        let score = self.layout.evaluate_layout(genes)?;
        let base = if score.violations == 0 {
            score.fitness
        } else {
            self.failure_fitness
        };
        Ok(Evaluation {
            fitness: score.fitness - self.penalty * score.violations as f64,
            base_fitness: Some(base),
            violations: Some(score.violations),
            objectives: score.objectives,
            log: None,
        })
    }
}

// ============================================================================
// Population-level helpers
// ============================================================================

/// Evaluates every individual and returns the number of evaluations.
///
/// Seeds are drawn from `rng` in population order before any evaluation
/// runs. With `parallel` set and the `parallel` feature enabled, rayon
/// evaluates the individuals concurrently; results are identical either way.
///
/// # Errors
/// The first evaluator failure, in population order.
pub fn evaluate_population<G, E, R>(
    evaluator: &E,
    population: &mut [Individual<G>],
    rng: &mut R,
    parallel: bool,
) -> Result<usize>
where
    G: Send + Sync,
    E: Evaluator<G> + ?Sized,
    R: Rng,
{
    let seeds: Vec<u64> = (0..population.len()).map(|_| rng.random()).collect();
    let evaluate_one = |ind: &Individual<G>, seed: u64| {
        let mut local = create_rng(seed);
        evaluator.evaluate(&ind.genes, &mut local)
    };

    #[cfg(feature = "parallel")]
    let results: Vec<Result<Evaluation>> = if parallel {
        population
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(ind, &seed)| evaluate_one(ind, seed))
            .collect()
    } else {
        population
            .iter()
            .zip(&seeds)
            .map(|(ind, &seed)| evaluate_one(ind, seed))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<Evaluation>> = {
        let _ = parallel;
        population
            .iter()
            .zip(&seeds)
            .map(|(ind, &seed)| evaluate_one(ind, seed))
            .collect()
    };

    for (ind, result) in population.iter_mut().zip(results) {
        ind.apply(result?);
    }
    Ok(population.len())
}

/// Drops the replay log of every individual that holds neither the maximal
/// fitness nor the maximal base fitness.
pub fn retain_best_logs<G>(population: &mut [Individual<G>]) {
    let max_fit = population.iter().filter_map(|i| i.fitness).reduce(f64::max);
    let max_base = population.iter().filter_map(|i| i.base_fitness).reduce(f64::max);

    for ind in population.iter_mut() {
        let holds_max = |value: Option<f64>, max: Option<f64>| value.is_some() && value == max;
        if !holds_max(ind.fitness, max_fit) && !holds_max(ind.base_fitness, max_base) {
            ind.log = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvolveError;
    use crate::genotype::linear::Placement;
    use crate::genotype::tree::{Operator, Primitive};

    /// Plays by evaluating the controller on fixed bindings plus noise.
    struct MockGame;

    impl GameSimulator for MockGame {
        fn play_game(&self, controller: &Tree, rng: &mut StdRng) -> Result<(f64, String)> {
            let noise: f64 = rng.random_range(0.0..1.0);
            let bindings: &[(&str, f64)] = &[("G", 2.0), ("P", 3.0), ("F", 1.0), ("W", 0.5)];
            let score = controller.evaluate(bindings, rng)? + noise;
            Ok((score, format!("score {score}")))
        }
    }

    /// Counts shapes placed left of x = 5 as violations.
    struct MockStock;

    impl LayoutEvaluator for MockStock {
        fn evaluate_layout(&self, layout: &Layout) -> Result<LayoutScore> {
            let violations = layout.placements().iter().filter(|p| p.x < 5).count();
            let width = layout.placements().iter().map(|p| p.x).max().unwrap_or(0);
            Ok(LayoutScore {
                fitness: -(width as f64),
                violations,
                objectives: Some(vec![-(width as f64), -(violations as f64)]),
            })
        }
    }

    fn controller() -> Tree {
        Tree::branch(
            Operator::Add,
            Tree::leaf(Primitive::terminal("G")),
            Tree::leaf(Primitive::terminal("P")),
        )
    }

    fn trees(n: usize) -> Vec<Individual<Tree>> {
        (0..n).map(|_| Individual::new(controller())).collect()
    }

    #[test]
    fn test_parsimony_penalty() {
        let eval = ParsimonyEvaluator::new(MockGame, 0.5);
        let mut rng = create_rng(1);
        let e = eval.evaluate(&controller(), &mut rng).unwrap();
        let base = e.base_fitness.unwrap();
        assert!((5.0..6.0).contains(&base));
        assert!((e.fitness - (base - 1.5)).abs() < 1e-12);
        assert!(e.log.as_deref().unwrap().starts_with("score"));
        assert!(e.objectives.is_none());
    }

    #[test]
    fn test_parsimony_as_objective() {
        let eval = ParsimonyEvaluator::new(MockGame, 0.0).with_mode(Parsimony::Objective);
        let mut rng = create_rng(1);
        let e = eval.evaluate(&controller(), &mut rng).unwrap();
        let objectives = e.objectives.unwrap();
        assert_eq!(objectives[1], -3.0);
        assert_eq!(Some(objectives[0]), e.base_fitness);
    }

    #[test]
    fn test_penalty_evaluator() {
        let eval = PenaltyEvaluator::new(MockStock, 2.0, -100.0);
        let mut rng = create_rng(0);

        let valid = Layout(vec![Placement::new(6, 0, 0), Placement::new(8, 1, 2)]);
        let e = eval.evaluate(&valid, &mut rng).unwrap();
        assert_eq!(e.fitness, -8.0);
        assert_eq!(e.base_fitness, Some(-8.0));
        assert_eq!(e.violations, Some(0));

        let invalid = Layout(vec![Placement::new(1, 0, 0), Placement::new(8, 1, 2)]);
        let e = eval.evaluate(&invalid, &mut rng).unwrap();
        assert_eq!(e.fitness, -10.0);
        assert_eq!(e.base_fitness, Some(-100.0));
        assert_eq!(e.violations, Some(1));
        assert_eq!(e.objectives, Some(vec![-8.0, -1.0]));
    }

    #[test]
    fn test_closure_evaluator() {
        let eval = |genes: &Layout, _: &mut StdRng| -> Result<Evaluation> {
            Ok(Evaluation::new(genes.len() as f64))
        };
        let mut pop = vec![Individual::new(Layout(vec![Placement::new(0, 0, 0); 3]))];
        let mut rng = create_rng(0);
        assert_eq!(evaluate_population(&eval, &mut pop, &mut rng, false).unwrap(), 1);
        assert_eq!(pop[0].fitness, Some(3.0));
    }

    #[test]
    fn test_evaluate_population_is_deterministic() {
        let eval = ParsimonyEvaluator::new(MockGame, 0.1);
        let mut a = trees(16);
        let mut b = trees(16);
        evaluate_population(&eval, &mut a, &mut create_rng(9), false).unwrap();
        evaluate_population(&eval, &mut b, &mut create_rng(9), true).unwrap();
        assert_eq!(a, b);
        // Different seeds per individual.
        assert_ne!(a[0].fitness, a[1].fitness);
    }

    #[test]
    fn test_evaluation_error_propagates() {
        let eval = |_: &Tree, _: &mut StdRng| -> Result<Evaluation> {
            Err(EvolveError::Evaluation("simulator crashed".into()))
        };
        let mut pop = trees(3);
        let err = evaluate_population(&eval, &mut pop, &mut create_rng(0), false).unwrap_err();
        assert_eq!(err, EvolveError::Evaluation("simulator crashed".into()));
    }

    #[test]
    fn test_retain_best_logs() {
        let mut pop = trees(4);
        let values = [(5.0, 7.0), (6.0, 6.0), (4.0, 8.0), (3.0, 3.0)];
        for (ind, (fit, base)) in pop.iter_mut().zip(values) {
            ind.apply(Evaluation::new(fit).with_base_fitness(base).with_log("replay"));
        }
        retain_best_logs(&mut pop);
        let kept: Vec<bool> = pop.iter().map(|i| i.log.is_some()).collect();
        assert_eq!(kept, vec![false, true, true, false]);
    }
}
