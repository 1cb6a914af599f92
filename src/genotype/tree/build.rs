//! Random tree construction: full, grow, and ramped half-and-half.

use super::node::{Node, NodeId, Operator, Primitive, Tree};
use super::TreeParams;
use rand::Rng;

/// Growth strategy for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Every leaf sits exactly at the depth limit.
    Full,
    /// Each node above the limit is a leaf with probability 1/2.
    Grow,
}

/// Builds a tree with `method` and the given depth limit.
pub fn build<R: Rng>(method: Method, depth_limit: usize, params: &TreeParams, rng: &mut R) -> Tree {
    let mut tree = Tree {
        nodes: Vec::new(),
        root: NodeId(0),
    };
    build_node(&mut tree, None, 0, depth_limit, method, params, rng);
    tree
}

/// Full-method tree of exactly `depth_limit` height.
pub fn full<R: Rng>(depth_limit: usize, params: &TreeParams, rng: &mut R) -> Tree {
    build(Method::Full, depth_limit, params, rng)
}

/// Grow-method tree of height at most `depth_limit`.
pub fn grow<R: Rng>(depth_limit: usize, params: &TreeParams, rng: &mut R) -> Tree {
    build(Method::Grow, depth_limit, params, rng)
}

/// Ramped half-and-half: a fresh depth limit in `[1, max_depth]` and a
/// full/grow choice per tree.
pub fn ramped_half_and_half<R: Rng>(count: usize, params: &TreeParams, rng: &mut R) -> Vec<Tree> {
    (0..count)
        .map(|_| {
            let use_full = rng.random_range(0.0..=1.0) <= params.prob_full;
            let depth_limit = rng.random_range(1..=params.max_depth);
            let method = if use_full { Method::Full } else { Method::Grow };
            build(method, depth_limit, params, rng)
        })
        .collect()
}

/// Draws a leaf primitive. The slot after the last symbol stands for a
/// random constant.
pub fn random_terminal<R: Rng>(params: &TreeParams, rng: &mut R) -> Primitive {
    let slot = rng.random_range(0..=params.terminals.len());
    match params.terminals.get(slot) {
        Some(symbol) => Primitive::Terminal(symbol.clone()),
        None => {
            let (lo, hi) = params.constant_range;
            Primitive::Constant(rng.random_range(lo..=hi))
        }
    }
}

fn build_node<R: Rng>(
    tree: &mut Tree,
    parent: Option<NodeId>,
    depth: usize,
    depth_limit: usize,
    method: Method,
    params: &TreeParams,
    rng: &mut R,
) -> NodeId {
    let leaf = depth >= depth_limit || (method == Method::Grow && rng.random_bool(0.5));
    let id = NodeId(tree.nodes.len());

    if leaf {
        let primitive = random_terminal(params, rng);
        tree.nodes.push(Node::leaf(primitive, parent));
        return id;
    }

    let op = Operator::ALL[rng.random_range(0..Operator::ALL.len())];
    tree.nodes.push(Node::leaf(Primitive::Operator(op), parent));
    let left = build_node(tree, Some(id), depth + 1, depth_limit, method, params, rng);
    let right = build_node(tree, Some(id), depth + 1, depth_limit, method, params, rng);
    tree.nodes[id.0].left = Some(left);
    tree.nodes[id.0].right = Some(right);
    tree.refresh(id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn params() -> TreeParams {
        TreeParams::default().with_max_depth(4)
    }

    #[test]
    fn test_full_has_exact_height_and_size() {
        let mut rng = create_rng(42);
        for depth in 0..=5 {
            let tree = full(depth, &params(), &mut rng);
            assert_eq!(tree.height(), depth);
            assert_eq!(tree.size(), (1 << (depth + 1)) - 1);
            assert!(tree.is_consistent());
            for (id, d) in tree.preorder() {
                assert_eq!(tree.node(id).is_leaf(), d == depth);
            }
        }
    }

    #[test]
    fn test_grow_respects_limit() {
        let mut rng = create_rng(7);
        let mut saw_leaf_above_limit = false;
        for _ in 0..500 {
            let tree = grow(4, &params(), &mut rng);
            assert!(tree.height() <= 4);
            assert!(tree.is_consistent());
            saw_leaf_above_limit |= tree.height() < 4;
        }
        assert!(saw_leaf_above_limit, "grow should produce shallow trees too");
    }

    #[test]
    fn test_grow_at_depth_zero_is_leaf() {
        let mut rng = create_rng(1);
        let tree = grow(0, &params(), &mut rng);
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn test_terminal_draws_include_constants() {
        let mut rng = create_rng(3);
        let params = TreeParams::default()
            .with_terminals(["G", "P"])
            .with_constant_range(-2.0, 2.0);
        let mut symbols = 0;
        let mut constants = 0;
        for _ in 0..3000 {
            match random_terminal(&params, &mut rng) {
                Primitive::Terminal(s) => {
                    assert!(s == "G" || s == "P");
                    symbols += 1;
                }
                Primitive::Constant(v) => {
                    assert!((-2.0..=2.0).contains(&v));
                    constants += 1;
                }
                Primitive::Operator(_) => panic!("terminal draw produced an operator"),
            }
        }
        // Three equally likely slots: two symbols, one constant.
        assert!((800..1200).contains(&constants), "constants: {constants}");
        assert!((1800..2200).contains(&symbols), "symbols: {symbols}");
    }

    #[test]
    fn test_operators_are_drawn_uniformly() {
        let mut rng = create_rng(11);
        let mut counts = [0usize; 5];
        for _ in 0..400 {
            let tree = full(3, &params(), &mut rng);
            for (id, _) in tree.preorder() {
                if let Primitive::Operator(op) = tree.node(id).primitive() {
                    let i = Operator::ALL.iter().position(|o| o == op).unwrap();
                    counts[i] += 1;
                }
            }
        }
        let total: usize = counts.iter().sum();
        for &c in &counts {
            let share = c as f64 / total as f64;
            assert!((0.15..0.25).contains(&share), "counts: {counts:?}");
        }
    }

    #[test]
    fn test_ramped_half_and_half_mixes_methods_and_depths() {
        let mut rng = create_rng(5);
        let params = params().with_prob_full(0.5);
        let trees = ramped_half_and_half(400, &params, &mut rng);
        assert_eq!(trees.len(), 400);

        let mut heights = [0usize; 5];
        for tree in &trees {
            assert!(tree.height() <= params.max_depth);
            assert!(tree.is_consistent());
            heights[tree.height()] += 1;
        }
        // Full trees of every depth limit 1..=4 appear.
        for h in 1..=4 {
            assert!(heights[h] > 0, "no tree of height {h}: {heights:?}");
        }
    }

    #[test]
    fn test_prob_full_one_gives_only_full_trees() {
        let mut rng = create_rng(9);
        let params = params().with_prob_full(1.0);
        for tree in ramped_half_and_half(100, &params, &mut rng) {
            assert_eq!(tree.size(), (1 << (tree.height() + 1)) - 1);
        }
    }
}
