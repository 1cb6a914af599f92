//! Pareto ranking for multi-objective fitness assignment.
//!
//! All objectives are **maximized**. Fronts are numbered from 1, the
//! non-dominated set being level 1.
//!
//! # Algorithms
//!
//! - [`non_dominated_sort`]: fast non-dominated sorting (Deb et al., 2002)
//! - [`crowding_distance`]: crowding distance within one front
//! - [`assign_fitnesses`]: rank plus crowding penalty, written into a
//!   population
//! - [`hypervolume`]: WFG exact hypervolume (While et al., 2012)
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - IEEE Transactions on Evolutionary Computation, 6(2), 182-197

mod hypervolume;

pub use hypervolume::hypervolume;

use crate::error::{EvolveError, Result};
use crate::individual::Individual;

/// Result of non-dominated sorting.
#[derive(Debug, Clone, PartialEq)]
pub struct NondominatedSortResult {
    /// Level of each solution, 1 being the non-dominated front.
    pub levels: Vec<usize>,

    /// Indices grouped by front: `fronts[0]` holds the level-1 indices.
    /// Each front lists its members in ascending index order.
    pub fronts: Vec<Vec<usize>>,
}

impl NondominatedSortResult {
    /// Highest level present, 0 for an empty input.
    pub fn max_level(&self) -> usize {
        self.fronts.len()
    }
}

/// Whether `a` dominates `b`: no worse in every objective and strictly
/// better in at least one.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    dominance_cmp(a, b) == Dominance::Left
}

/// Fast non-dominated sorting.
///
/// # Algorithm (Deb et al., 2002)
///
/// 1. For each pair of solutions, determine dominance
/// 2. Solutions dominated by no other form level 1
/// 3. Remove that front, repeat to find subsequent levels
///
/// # Complexity
///
/// O(m * n²) where m = number of objectives, n = number of solutions
///
/// # Errors
///
/// [`EvolveError::InvalidArgument`] if the objective vectors differ in
/// length or are empty.
///
/// # Example
///
/// ```
/// use u_evolve::multi_objective::non_dominated_sort;
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
///     vec![2.0, 2.0], // dominated by (3, 3)
/// ];
///
/// let result = non_dominated_sort(&objectives).unwrap();
/// assert_eq!(result.levels, vec![1, 1, 1, 2]);
/// ```
pub fn non_dominated_sort(objectives: &[Vec<f64>]) -> Result<NondominatedSortResult> {
    let n = objectives.len();
    if n == 0 {
        return Ok(NondominatedSortResult {
            levels: Vec::new(),
            fronts: Vec::new(),
        });
    }
    check_dimensions(objectives)?;

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut levels = vec![0usize; n];
    let mut first_front = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            match dominance_cmp(&objectives[i], &objectives[j]) {
                Dominance::Left => {
                    dominated_by[i].push(j);
                    domination_count[j] += 1;
                }
                Dominance::Right => {
                    dominated_by[j].push(i);
                    domination_count[i] += 1;
                }
                Dominance::Neither => {}
            }
        }

        // Every j < i has already been compared against i.
        if domination_count[i] == 0 {
            levels[i] = 1;
            first_front.push(i);
        }
    }

    let mut fronts = vec![first_front];
    loop {
        let mut next_front = Vec::new();
        if let Some(current) = fronts.last() {
            for &i in current {
                for &j in &dominated_by[i] {
                    domination_count[j] -= 1;
                    if domination_count[j] == 0 {
                        levels[j] = fronts.len() + 1;
                        next_front.push(j);
                    }
                }
            }
        }

        if next_front.is_empty() {
            break;
        }
        // Discovery order follows the previous front; crowding ties need
        // population order.
        next_front.sort_unstable();
        fronts.push(next_front);
    }

    Ok(NondominatedSortResult { levels, fronts })
}

#[derive(Debug, PartialEq)]
enum Dominance {
    Left,
    Right,
    Neither,
}

fn dominance_cmp(a: &[f64], b: &[f64]) -> Dominance {
    let mut a_better_in_some = false;
    let mut b_better_in_some = false;

    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va > vb {
            a_better_in_some = true;
        } else if vb > va {
            b_better_in_some = true;
        }
    }

    match (a_better_in_some, b_better_in_some) {
        (true, false) => Dominance::Left,
        (false, true) => Dominance::Right,
        _ => Dominance::Neither,
    }
}

/// Crowding distance of each member of one front.
///
/// Per objective, members are stably sorted; the two extremes get
/// `f64::INFINITY` and each interior member adds `(next - prev) / (max -
/// min)`. An objective with zero range contributes nothing to interior
/// members.
///
/// # Complexity
///
/// O(m * n * log n)
///
/// # Errors
///
/// [`EvolveError::InvalidArgument`] if the objective vectors differ in
/// length or are empty.
///
/// # Example
///
/// ```
/// use u_evolve::multi_objective::crowding_distance;
///
/// let front = vec![vec![1.0, 5.0], vec![3.0, 3.0], vec![5.0, 1.0]];
/// let distances = crowding_distance(&front).unwrap();
/// assert!(distances[0].is_infinite());
/// assert_eq!(distances[1], 2.0);
/// assert!(distances[2].is_infinite());
/// ```
pub fn crowding_distance(front: &[Vec<f64>]) -> Result<Vec<f64>> {
    let n = front.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    check_dimensions(front)?;
    if n <= 2 {
        return Ok(vec![f64::INFINITY; n]);
    }

    let m = front[0].len();
    let mut distances = vec![0.0f64; n];

    #[allow(clippy::needless_range_loop)] // obj is a column index into 2D data
    for obj in 0..m {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| front[a][obj].total_cmp(&front[b][obj]));

        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;

        let range = front[order[n - 1]][obj] - front[order[0]][obj];
        if range > 0.0 {
            for i in 1..(n - 1) {
                let prev = front[order[i - 1]][obj];
                let next = front[order[i + 1]][obj];
                distances[order[i]] += (next - prev) / range;
            }
        }
    }

    Ok(distances)
}

/// Ranks a population by non-domination and writes `level`, `crowding` and
/// `fitness` into every individual.
///
/// `fitness = max_level + 1 - level`, so level 1 scores highest. With
/// `crowding` enabled, members with finite crowding lose
/// `1 - 0.999 * crowding / m`; extremes keep the full level score. Without
/// it, crowding is recorded as 0.
///
/// # Errors
///
/// [`EvolveError::InvalidArgument`] if an individual has no objectives or
/// the objective counts differ.
pub fn assign_fitnesses<G>(population: &mut [Individual<G>], crowding: bool) -> Result<()> {
    if population.is_empty() {
        return Ok(());
    }
    let objectives = population
        .iter()
        .enumerate()
        .map(|(i, ind)| {
            ind.objectives
                .clone()
                .ok_or_else(|| EvolveError::invalid(format!("individual {i} has no objectives")))
        })
        .collect::<Result<Vec<_>>>()?;

    let sorted = non_dominated_sort(&objectives)?;
    let max_level = sorted.max_level();
    let m = objectives[0].len() as f64;

    let mut distances = vec![0.0f64; population.len()];
    if crowding {
        for front in &sorted.fronts {
            let members: Vec<Vec<f64>> = front.iter().map(|&i| objectives[i].clone()).collect();
            for (&i, d) in front.iter().zip(crowding_distance(&members)?) {
                distances[i] = d;
            }
        }
    }

    for (i, ind) in population.iter_mut().enumerate() {
        let level = sorted.levels[i];
        let mut fitness = (max_level + 1 - level) as f64;
        if crowding && distances[i].is_finite() {
            debug_assert!((0.0..=m).contains(&distances[i]));
            fitness -= 1.0 - 0.999 * distances[i] / m;
        }
        ind.level = Some(level);
        ind.crowding = Some(distances[i]);
        ind.fitness = Some(fitness);
    }
    Ok(())
}

fn check_dimensions(objectives: &[Vec<f64>]) -> Result<()> {
    let m = objectives[0].len();
    if m == 0 {
        return Err(EvolveError::invalid("objective vectors must not be empty"));
    }
    if let Some(i) = objectives.iter().position(|o| o.len() != m) {
        return Err(EvolveError::invalid(format!(
            "objective vector {i} has {} values, expected {m}",
            objectives[i].len()
        )));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
