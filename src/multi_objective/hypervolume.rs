//! Exact hypervolume by the WFG algorithm.
//!
//! The hypervolume of a point set is the measure of the region dominated by
//! the set and bounded by a reference point. WFG computes it as a sum of
//! exclusive contributions, each being a point's box minus the hypervolume
//! of the "limit set" of later points clipped to that box.
//!
//! # References
//!
//! - While, Bradstreet & Barone (2012), "A Fast Way of Calculating Exact
//!   Hypervolumes", IEEE Transactions on Evolutionary Computation, 16(1)

use crate::error::{EvolveError, Result};

/// Hypervolume of `points` (maximized objectives) against `reference`.
///
/// Duplicate points are removed first. The reference defaults to `-1` in
/// every objective, which suits objectives whose minimum is 0.
///
/// # Errors
///
/// [`EvolveError::InvalidArgument`] if the points or the reference differ in
/// dimension.
///
/// # Example
///
/// ```
/// use u_evolve::multi_objective::hypervolume;
///
/// let front = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
/// // Two 2x3 boxes from (-1, -1) overlapping in a 2x2 square.
/// assert_eq!(hypervolume(&front, None).unwrap(), 8.0);
/// ```
pub fn hypervolume(points: &[Vec<f64>], reference: Option<&[f64]>) -> Result<f64> {
    let Some(first) = points.first() else {
        return Ok(0.0);
    };
    let m = first.len();
    if points.iter().any(|p| p.len() != m) {
        return Err(EvolveError::invalid("points differ in dimension"));
    }
    let reference = match reference {
        Some(r) if r.len() != m => {
            return Err(EvolveError::invalid(format!(
                "reference has {} values, points have {m}",
                r.len()
            )))
        }
        Some(r) => r.to_vec(),
        None => vec![-1.0; m],
    };

    let mut set = points.to_vec();
    sort_dedup(&mut set);
    Ok(wfg(&set, &reference))
}

fn wfg(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    (0..points.len())
        .map(|k| exclusive(points, k, reference))
        .sum()
}

fn exclusive(points: &[Vec<f64>], k: usize, reference: &[f64]) -> f64 {
    inclusive(&points[k], reference) - wfg(&limit_set(points, k), reference)
}

fn inclusive(point: &[f64], reference: &[f64]) -> f64 {
    point
        .iter()
        .zip(reference)
        .map(|(p, r)| (p - r).abs())
        .product()
}

/// Later points clipped to point `k`'s box, keeping only the
/// non-dominated ones.
fn limit_set(points: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let clipped: Vec<Vec<f64>> = points[k + 1..]
        .iter()
        .map(|q| points[k].iter().zip(q).map(|(a, b)| a.min(*b)).collect())
        .collect();

    let mut kept: Vec<Vec<f64>> = clipped
        .iter()
        .enumerate()
        .filter(|&(i, p)| {
            !clipped
                .iter()
                .enumerate()
                .any(|(j, q)| i != j && super::dominates(q, p))
        })
        .map(|(_, p)| p.clone())
        .collect();
    sort_dedup(&mut kept);
    kept
}

fn sort_dedup(points: &mut Vec<Vec<f64>>) {
    points.sort_by(|a, b| {
        a.iter()
            .zip(b)
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    points.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(hypervolume(&[], None).unwrap(), 0.0);
    }

    #[test]
    fn test_single_point_box() {
        let hv = hypervolume(&[vec![2.0, 3.0]], Some(&[0.0, 0.0][..])).unwrap();
        assert_eq!(hv, 6.0);
        // Default reference is -1 per objective.
        assert_eq!(hypervolume(&[vec![2.0, 3.0]], None).unwrap(), 12.0);
    }

    #[test]
    fn test_duplicates_count_once() {
        let once = hypervolume(&[vec![1.0, 1.0]], Some(&[0.0, 0.0][..])).unwrap();
        let twice = hypervolume(&[vec![1.0, 1.0], vec![1.0, 1.0]], Some(&[0.0, 0.0][..])).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dominated_point_adds_nothing() {
        let reference = [0.0, 0.0];
        let base = hypervolume(&[vec![3.0, 3.0]], Some(&reference[..])).unwrap();
        let with_inner = hypervolume(&[vec![1.0, 2.0], vec![3.0, 3.0]], Some(&reference[..])).unwrap();
        assert_eq!(base, with_inner);
    }

    #[test]
    fn test_staircase_two_objectives() {
        // Union of [0,1]x[0,3], [0,2]x[0,2], [0,3]x[0,1] = 3 + 2 + 1.
        let front = vec![vec![1.0, 3.0], vec![2.0, 2.0], vec![3.0, 1.0]];
        let hv = hypervolume(&front, Some(&[0.0, 0.0][..])).unwrap();
        assert!((hv - 6.0).abs() < 1e-12, "{hv}");
    }

    #[test]
    fn test_three_objectives() {
        // Unit cubes offset along each axis from a shared 1x1x1 core:
        // (2,1,1), (1,2,1), (1,1,2) -> 3 * 2 - 3 * 1 + 1 = 4.
        let front = vec![vec![2.0, 1.0, 1.0], vec![1.0, 2.0, 1.0], vec![1.0, 1.0, 2.0]];
        let hv = hypervolume(&front, Some(&[0.0, 0.0, 0.0][..])).unwrap();
        assert!((hv - 4.0).abs() < 1e-12, "{hv}");
    }

    #[test]
    fn test_order_independent() {
        let a = vec![vec![1.0, 4.0, 2.0], vec![3.0, 1.0, 3.0], vec![2.0, 2.0, 1.0], vec![4.0, 3.0, 0.5]];
        let mut b = a.clone();
        b.reverse();
        let r = [0.0, 0.0, 0.0];
        let ha = hypervolume(&a, Some(&r[..])).unwrap();
        let hb = hypervolume(&b, Some(&r[..])).unwrap();
        assert!((ha - hb).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_errors() {
        assert!(hypervolume(&[vec![1.0, 2.0], vec![1.0]], None).is_err());
        assert!(matches!(
            hypervolume(&[vec![1.0, 2.0]], Some(&[0.0][..])),
            Err(EvolveError::InvalidArgument(_))
        ));
    }
}
