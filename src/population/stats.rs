//! Per-generation statistics.

use crate::error::{EvolveError, Result};
use crate::individual::Individual;
use crate::multi_objective::{hypervolume, non_dominated_sort};

/// Summary of a population after one generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationStats {
    /// Evaluations performed so far.
    pub evaluations: usize,
    /// Highest fitness in the population.
    pub best_fitness: f64,
    /// Mean fitness.
    pub mean_fitness: f64,
    /// Highest base fitness, when the evaluator reports one.
    pub best_base_fitness: Option<f64>,
    /// Mean base fitness over individuals that have one.
    pub mean_base_fitness: Option<f64>,
    /// Individuals with zero violations, when violations are reported.
    pub valid: Option<usize>,
    /// Size of the first non-dominated front, when every individual has
    /// objectives.
    pub front_size: Option<usize>,
    /// Hypervolume of the first front against the default reference.
    pub hypervolume: Option<f64>,
}

impl GenerationStats {
    /// Computes statistics over `population`.
    ///
    /// # Errors
    /// [`EvolveError::InvalidArgument`] if no individual is evaluated or
    /// objective vectors differ in length.
    pub fn from_population<G>(population: &[Individual<G>], evaluations: usize) -> Result<Self> {
        let fitness: Vec<f64> = population.iter().filter_map(|i| i.fitness).collect();
        let (best_fitness, mean_fitness) = max_and_mean(&fitness)
            .ok_or_else(|| EvolveError::invalid("no evaluated individuals"))?;

        let base: Vec<f64> = population.iter().filter_map(|i| i.base_fitness).collect();
        let base_summary = max_and_mean(&base);

        let valid = population
            .iter()
            .any(|i| i.violations.is_some())
            .then(|| population.iter().filter(|i| i.violations == Some(0)).count());

        let objectives: Option<Vec<Vec<f64>>> =
            population.iter().map(|i| i.objectives.clone()).collect();
        let (front_size, hypervolume) = match objectives {
            Some(objectives) if !objectives.is_empty() => {
                let sorted = non_dominated_sort(&objectives)?;
                let front: Vec<Vec<f64>> = sorted.fronts[0]
                    .iter()
                    .map(|&i| objectives[i].clone())
                    .collect();
                (Some(front.len()), Some(hypervolume(&front, None)?))
            }
            _ => (None, None),
        };

        Ok(Self {
            evaluations,
            best_fitness,
            mean_fitness,
            best_base_fitness: base_summary.map(|(best, _)| best),
            mean_base_fitness: base_summary.map(|(_, mean)| mean),
            valid,
            front_size,
            hypervolume,
        })
    }

    /// The statistics as log lines.
    pub fn log_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("evaluations: {}", self.evaluations),
            format!("local best fitness: {}", self.best_fitness),
            format!("local mean fitness: {}", self.mean_fitness),
        ];
        if let (Some(best), Some(mean)) = (self.best_base_fitness, self.mean_base_fitness) {
            lines.push(format!("local best base fitness: {best}"));
            lines.push(format!("local mean base fitness: {mean}"));
        }
        if let Some(valid) = self.valid {
            lines.push(format!("number of valid solutions: {valid}"));
        }
        if let (Some(size), Some(hv)) = (self.front_size, self.hypervolume) {
            lines.push(format!("pareto front size: {size}"));
            lines.push(format!("hypervolume: {hv}"));
        }
        lines
    }
}

fn max_and_mean(values: &[f64]) -> Option<(f64, f64)> {
    let max = values.iter().copied().reduce(f64::max)?;
    Some((max, values.iter().sum::<f64>() / values.len() as f64))
}
