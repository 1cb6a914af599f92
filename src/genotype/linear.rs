//! Fixed-length placement genotype for 2D cutting stock.
//!
//! Genes hold one [`Placement`] per shape: an integer translation and one of
//! four quarter-turn rotations. Shape geometry and overlap checks live in the
//! layout evaluator; this module only knows how to create, vary and encode
//! placements.
//!
//! # Operators
//!
//! - [`uniform_crossover`]: each locus from either parent with p = 0.5
//! - [`one_point_crossover`]: prefix from the first parent, suffix from the
//!   second, cut point uniform over the loci that keep both parents present
//! - [`locus_mutation`]: each locus re-drawn independently
//!
//! # Text format
//!
//! One `x,y,rotation` line per locus, in shape order:
//!
//! ```text
//! 3,7,0
//! 12,1,3
//! ```

use super::Genotype;
use crate::error::{EvolveError, Result};
use rand::Rng;
use std::fmt;

/// Position and rotation of one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    /// Horizontal translation.
    pub x: i64,
    /// Vertical translation.
    pub y: i64,
    /// Quarter turns, `0..=3`.
    pub rotation: u8,
}

impl Placement {
    /// Creates a placement.
    pub fn new(x: i64, y: i64, rotation: u8) -> Self {
        Self { x, y, rotation }
    }

    /// Draws a uniform placement within the parameter bounds.
    pub fn random<R: Rng>(params: &LinearParams, rng: &mut R) -> Self {
        let (x0, x1) = params.x_range;
        let (y0, y1) = params.y_range;
        Self {
            x: rng.random_range(x0..x1),
            y: rng.random_range(y0..y1),
            rotation: rng.random_range(0..4),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.rotation)
    }
}

/// Recombination method for [`Layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Crossover {
    /// Each locus from either parent with equal probability.
    #[default]
    Uniform,
    /// A single cut point; prefix from the first parent.
    OnePoint,
}

/// Parameters for the placement genotype.
///
/// # Examples
///
/// ```
/// use u_evolve::genotype::linear::{Crossover, LinearParams};
///
/// let params = LinearParams::new(20)
///     .with_bounds((0, 50), (0, 15))
///     .with_crossover(Crossover::OnePoint)
///     .with_mutation_rate(0.1);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearParams {
    /// Number of shapes, i.e. genotype length.
    pub shape_count: usize,
    /// Half-open range of `x`.
    pub x_range: (i64, i64),
    /// Half-open range of `y`.
    pub y_range: (i64, i64),
    /// Recombination method.
    pub crossover: Crossover,
    /// Probability that mutation re-draws a given locus.
    pub mutation_rate: f64,
}

impl LinearParams {
    /// Parameters for `shape_count` shapes on a 10x10 stock.
    pub fn new(shape_count: usize) -> Self {
        Self {
            shape_count,
            x_range: (0, 10),
            y_range: (0, 10),
            crossover: Crossover::default(),
            mutation_rate: 0.1,
        }
    }

    /// Sets the translation bounds.
    pub fn with_bounds(mut self, x_range: (i64, i64), y_range: (i64, i64)) -> Self {
        self.x_range = x_range;
        self.y_range = y_range;
        self
    }

    /// Sets the recombination method.
    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the per-locus mutation probability.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Validates the parameters.
    pub fn validate(&self) -> Result<()> {
        if self.shape_count == 0 {
            return Err(EvolveError::invalid("shape_count must be at least 1"));
        }
        if self.x_range.0 >= self.x_range.1 || self.y_range.0 >= self.y_range.1 {
            return Err(EvolveError::invalid("bounds must be non-empty half-open ranges"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvolveError::invalid("mutation_rate must be within [0, 1]"));
        }
        Ok(())
    }
}

impl Default for LinearParams {
    fn default() -> Self {
        Self::new(10)
    }
}

/// One placement per shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout(pub Vec<Placement>);

impl Layout {
    /// Placements in shape order.
    pub fn placements(&self) -> &[Placement] {
        &self.0
    }

    /// Number of loci.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no loci.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Placement>> for Layout {
    fn from(placements: Vec<Placement>) -> Self {
        Self(placements)
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Uniform crossover: every locus comes from either parent with p = 0.5.
///
/// # Errors
/// [`EvolveError::InvalidArgument`] if the parents differ in length.
pub fn uniform_crossover<R: Rng>(first: &Layout, second: &Layout, rng: &mut R) -> Result<Layout> {
    check_lengths(first, second)?;
    Ok(Layout(
        first
            .0
            .iter()
            .zip(&second.0)
            .map(|(a, b)| if rng.random_bool(0.5) { *a } else { *b })
            .collect(),
    ))
}

/// One-point crossover with the cut drawn uniformly from `1..len`.
///
/// The first locus always comes from `first` and the last from `second`.
/// Single-locus parents yield a copy of `first`.
///
/// # Errors
/// [`EvolveError::InvalidArgument`] if the parents differ in length.
pub fn one_point_crossover<R: Rng>(
    first: &Layout,
    second: &Layout,
    rng: &mut R,
) -> Result<Layout> {
    check_lengths(first, second)?;
    let n = first.len();
    if n < 2 {
        return Ok(first.clone());
    }
    let cut = rng.random_range(1..n);
    let mut genes = Vec::with_capacity(n);
    genes.extend_from_slice(&first.0[..cut]);
    genes.extend_from_slice(&second.0[cut..]);
    Ok(Layout(genes))
}

/// Re-draws each locus independently with probability `params.mutation_rate`.
pub fn locus_mutation<R: Rng>(parent: &Layout, params: &LinearParams, rng: &mut R) -> Layout {
    Layout(
        parent
            .0
            .iter()
            .map(|&p| {
                if rng.random_bool(params.mutation_rate) {
                    Placement::random(params, rng)
                } else {
                    p
                }
            })
            .collect(),
    )
}

fn check_lengths(first: &Layout, second: &Layout) -> Result<()> {
    if first.len() != second.len() {
        return Err(EvolveError::invalid(format!(
            "parents differ in length: {} vs {}",
            first.len(),
            second.len()
        )));
    }
    Ok(())
}

fn parse_placement(line: &str, line_no: usize) -> Result<Placement> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [x, y, rotation] = fields.as_slice() else {
        return Err(EvolveError::malformed(
            line_no,
            format!("expected 3 comma-separated fields, found {}", fields.len()),
        ));
    };
    let int = |field: &str, name: &str| {
        field
            .parse::<i64>()
            .map_err(|e| EvolveError::malformed(line_no, format!("bad {name} '{field}': {e}")))
    };
    let x = int(*x, "x")?;
    let y = int(*y, "y")?;
    let rotation = match rotation.parse::<u8>() {
        Ok(r) if r < 4 => r,
        _ => {
            return Err(EvolveError::malformed(
                line_no,
                format!("rotation must be 0..=3, found '{rotation}'"),
            ))
        }
    };
    Ok(Placement { x, y, rotation })
}

impl Genotype for Layout {
    type Params = LinearParams;

    fn initialize<R: Rng>(count: usize, params: &LinearParams, rng: &mut R) -> Result<Vec<Self>> {
        params.validate()?;
        Ok((0..count)
            .map(|_| {
                Layout(
                    (0..params.shape_count)
                        .map(|_| Placement::random(params, rng))
                        .collect(),
                )
            })
            .collect())
    }

    fn recombine<R: Rng>(&self, other: &Self, params: &LinearParams, rng: &mut R) -> Result<Self> {
        match params.crossover {
            Crossover::Uniform => uniform_crossover(self, other, rng),
            Crossover::OnePoint => one_point_crossover(self, other, rng),
        }
    }

    fn mutate<R: Rng>(&self, params: &LinearParams, rng: &mut R) -> Result<Self> {
        params.validate()?;
        Ok(locus_mutation(self, params, rng))
    }

    fn serialize(&self) -> String {
        self.0.iter().map(|p| format!("{p}\n")).collect()
    }

    fn deserialize(text: &str) -> Result<Self> {
        let placements = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| parse_placement(line, i + 1))
            .collect::<Result<Vec<_>>>()?;
        if placements.is_empty() {
            return Err(EvolveError::malformed(1, "no placements"));
        }
        Ok(Layout(placements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn params() -> LinearParams {
        LinearParams::new(20).with_bounds((0, 40), (0, 15))
    }

    fn pair<R: Rng>(params: &LinearParams, rng: &mut R) -> (Layout, Layout) {
        loop {
            let mut v = Layout::initialize(2, params, rng).unwrap();
            let b = v.pop().unwrap();
            let a = v.pop().unwrap();
            if a.0.iter().zip(&b.0).all(|(x, y)| x != y) {
                return (a, b);
            }
        }
    }

    #[test]
    fn test_initialize_within_bounds() {
        let mut rng = create_rng(42);
        let params = params();
        let pop = Layout::initialize(50, &params, &mut rng).unwrap();
        assert_eq!(pop.len(), 50);
        for layout in &pop {
            assert_eq!(layout.len(), 20);
            for p in layout.placements() {
                assert!((0..40).contains(&p.x));
                assert!((0..15).contains(&p.y));
                assert!(p.rotation < 4);
            }
        }
    }

    #[test]
    fn test_initialize_rejects_bad_params() {
        let mut rng = create_rng(0);
        let empty = LinearParams::new(0);
        assert!(Layout::initialize(1, &empty, &mut rng).is_err());
        let flat = LinearParams::new(5).with_bounds((3, 3), (0, 5));
        assert!(Layout::initialize(1, &flat, &mut rng).is_err());
    }

    #[test]
    fn test_uniform_crossover_is_balanced() {
        let mut rng = create_rng(7);
        let params = params();
        let mut from_first = vec![0usize; params.shape_count];
        let trials = 4000;
        for _ in 0..trials {
            let (a, b) = pair(&params, &mut rng);
            let child = uniform_crossover(&a, &b, &mut rng).unwrap();
            assert_eq!(child.len(), a.len());
            for (i, gene) in child.0.iter().enumerate() {
                assert!(gene == &a.0[i] || gene == &b.0[i]);
                if gene == &a.0[i] {
                    from_first[i] += 1;
                }
            }
        }
        for count in from_first {
            let ratio = count as f64 / trials as f64;
            assert!((0.4..0.6).contains(&ratio), "ratio {ratio}");
        }
    }

    #[test]
    fn test_one_point_cut_is_uniform_over_valid_loci() {
        let mut rng = create_rng(11);
        let params = params().with_crossover(Crossover::OnePoint);
        let n = params.shape_count;
        let mut cuts = vec![0usize; n];
        let trials = 19_000;
        for _ in 0..trials {
            let (a, b) = pair(&params, &mut rng);
            let child = a.recombine(&b, &params, &mut rng).unwrap();
            let cut = (0..n).find(|&i| child.0[i] != a.0[i]).unwrap();
            assert!(child.0[..cut] == a.0[..cut]);
            assert!(child.0[cut..] == b.0[cut..]);
            cuts[cut] += 1;
        }
        assert_eq!(cuts[0], 0);
        let expected = trials as f64 / (n - 1) as f64;
        for &c in &cuts[1..] {
            assert!((c as f64 - expected).abs() < expected * 0.3, "cuts {cuts:?}");
        }
    }

    #[test]
    fn test_one_point_single_locus() {
        let mut rng = create_rng(1);
        let a = Layout(vec![Placement::new(1, 1, 0)]);
        let b = Layout(vec![Placement::new(2, 2, 1)]);
        assert_eq!(one_point_crossover(&a, &b, &mut rng).unwrap(), a);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let mut rng = create_rng(0);
        let a = Layout(vec![Placement::new(0, 0, 0); 3]);
        let b = Layout(vec![Placement::new(0, 0, 0); 4]);
        assert!(matches!(
            uniform_crossover(&a, &b, &mut rng),
            Err(EvolveError::InvalidArgument(_))
        ));
        assert!(one_point_crossover(&a, &b, &mut rng).is_err());
    }

    #[test]
    fn test_variation_leaves_parents_untouched() {
        let mut rng = create_rng(3);
        for crossover in [Crossover::Uniform, Crossover::OnePoint] {
            let params = params().with_crossover(crossover);
            for _ in 0..200 {
                let (a, b) = pair(&params, &mut rng);
                let (a0, b0) = (a.clone(), b.clone());
                let _ = a.recombine(&b, &params, &mut rng).unwrap();
                let _ = a.mutate(&params, &mut rng).unwrap();
                assert_eq!(a, a0);
                assert_eq!(b, b0);
            }
        }
    }

    #[test]
    fn test_mutation_usually_changes_without_locus_bias() {
        let mut rng = create_rng(5);
        let params = params().with_mutation_rate(0.1);
        let trials = 5000;
        let mut unchanged = 0;
        let mut per_locus = vec![0usize; params.shape_count];
        for _ in 0..trials {
            let parent = Layout::initialize(1, &params, &mut rng).unwrap().remove(0);
            let child = parent.mutate(&params, &mut rng).unwrap();
            assert_eq!(child.len(), parent.len());
            let mut changed = false;
            for (i, (c, p)) in child.0.iter().zip(&parent.0).enumerate() {
                if c != p {
                    per_locus[i] += 1;
                    changed = true;
                }
            }
            if !changed {
                unchanged += 1;
            }
        }
        assert!((unchanged as f64) / (trials as f64) < 0.2, "unchanged {unchanged}");
        let mean = per_locus.iter().sum::<usize>() as f64 / per_locus.len() as f64;
        for &c in &per_locus {
            assert!((c as f64 - mean).abs() < mean * 0.25, "per locus {per_locus:?}");
        }
    }

    #[test]
    fn test_zero_mutation_rate_is_identity() {
        let mut rng = create_rng(9);
        let params = params().with_mutation_rate(0.0);
        let parent = Layout::initialize(1, &params, &mut rng).unwrap().remove(0);
        assert_eq!(parent.mutate(&params, &mut rng).unwrap(), parent);
    }

    #[test]
    fn test_serialize_format() {
        let layout = Layout(vec![Placement::new(3, 7, 0), Placement::new(-2, 1, 3)]);
        let text = layout.serialize();
        assert_eq!(text, "3,7,0\n-2,1,3\n");
        assert_eq!(Layout::deserialize(&text).unwrap(), layout);
    }

    #[test]
    fn test_deserialize_malformed() {
        let cases = [
            ("", 1),
            ("1,2\n", 1),
            ("1,2,0\nx,2,0\n", 2),
            ("1,2,0\n1,2,4\n", 2),
            ("1,2,0,5\n", 1),
        ];
        for (text, line) in cases {
            match Layout::deserialize(text) {
                Err(EvolveError::MalformedInput { line: got, .. }) => assert_eq!(got, line, "{text:?}"),
                other => panic!("expected MalformedInput for {text:?}, got {other:?}"),
            }
        }
    }
}
