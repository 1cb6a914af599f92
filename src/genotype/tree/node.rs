//! Arena-backed binary expression trees.
//!
//! Nodes live in a `Vec<Node>` owned by their [`Tree`]; children and the
//! parent back reference are [`NodeId`] indices into that vector. The arena
//! is kept in pre-order (every parent precedes its children), which lets
//! derived fields be refreshed with a single reverse sweep.

use std::fmt;

/// Internal operator symbols. Every operator takes exactly two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    Add,
    Sub,
    Mul,
    /// Protected division: an exact-zero denominator yields 0.
    Div,
    /// Uniform draw between the two child values.
    Rand,
}

impl Operator {
    /// All operators, in the order construction draws from.
    pub const ALL: [Operator; 5] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Rand,
    ];

    /// Text form used by serialization.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rand => "RAND",
        }
    }

    /// Parses an operator symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Operator::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    /// A domain symbol, resolved through bindings at evaluation time.
    Terminal(String),
    /// A numeric constant.
    Constant(f64),
    /// An internal operator.
    Operator(Operator),
}

impl Primitive {
    /// Shorthand for a terminal symbol.
    pub fn terminal(symbol: impl Into<String>) -> Self {
        Primitive::Terminal(symbol.into())
    }

    /// Leaves carry no children.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Primitive::Operator(_))
    }

    /// Parses a primitive: floats first, then operator symbols, otherwise a
    /// terminal symbol.
    pub fn parse(text: &str) -> Self {
        if let Ok(value) = text.parse::<f64>() {
            return Primitive::Constant(value);
        }
        match Operator::from_symbol(text) {
            Some(op) => Primitive::Operator(op),
            None => Primitive::Terminal(text.to_string()),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Terminal(symbol) => f.write_str(symbol),
            // Debug keeps the decimal point on integral values ("3.0").
            Primitive::Constant(value) => write!(f, "{value:?}"),
            Primitive::Operator(op) => write!(f, "{op}"),
        }
    }
}

/// Index of a node inside its tree's arena.
///
/// Ids are only meaningful for the tree that produced them, and only until
/// that tree is structurally edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A tree node with its derived subtree metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) primitive: Primitive,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) size: usize,
    pub(crate) height: usize,
}

impl Node {
    pub(crate) fn leaf(primitive: Primitive, parent: Option<NodeId>) -> Self {
        Self {
            primitive,
            left: None,
            right: None,
            parent,
            size: 1,
            height: 0,
        }
    }

    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Longest edge count from this node down to a leaf.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }
}

/// A binary expression tree; the genes of a GP individual.
///
/// `Clone` is a deep structural copy: the arena is owned, so no node is
/// ever shared between two trees.
#[derive(Debug, Clone)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

impl Tree {
    /// A single-node tree.
    pub fn leaf(primitive: Primitive) -> Self {
        Self {
            nodes: vec![Node::leaf(primitive, None)],
            root: NodeId(0),
        }
    }

    /// Joins two trees under a new operator root.
    pub fn branch(op: Operator, left: Tree, right: Tree) -> Self {
        let mut nodes = Vec::with_capacity(1 + left.len() + right.len());
        nodes.push(Node::leaf(Primitive::Operator(op), None));
        let mut tree = Self {
            nodes,
            root: NodeId(0),
        };
        let l = tree.copy_from(&left, left.root, Some(NodeId(0)));
        let r = tree.copy_from(&right, right.root, Some(NodeId(0)));
        tree.nodes[0].left = Some(l);
        tree.nodes[0].right = Some(r);
        tree.refresh(NodeId(0));
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Primitive at the root.
    pub fn primitive(&self) -> &Primitive {
        &self.node(self.root).primitive
    }

    /// Node count (the root's `size`).
    pub fn size(&self) -> usize {
        self.node(self.root).size
    }

    /// The root's `height`.
    pub fn height(&self) -> usize {
        self.node(self.root).height
    }

    /// Number of nodes held in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk yielding `(node, depth)`.
    pub fn preorder(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            let node = self.node(id);
            if let (Some(l), Some(r)) = (node.left, node.right) {
                stack.push((r, depth + 1));
                stack.push((l, depth + 1));
            }
        }
        out
    }

    /// Level-by-level numbering of every node as `(node, depth)`.
    ///
    /// Each level is drained from the back of the queue, so siblings come
    /// out in LIFO order. The numbering only serves as a uniform index for
    /// picking crossover and mutation points.
    pub fn enumerate(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.size());
        let mut queue = vec![self.root];
        let mut depth = 0;
        while !queue.is_empty() {
            let mut next = Vec::with_capacity(queue.len() * 2);
            while let Some(id) = queue.pop() {
                out.push((id, depth));
                let node = self.node(id);
                if let (Some(l), Some(r)) = (node.left, node.right) {
                    next.push(l);
                    next.push(r);
                }
            }
            queue = next;
            depth += 1;
        }
        out
    }

    /// Distance from the root to `id`.
    pub fn depth_of(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.node(id).parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.node(parent).parent;
        }
        depth
    }

    /// Deep copy of the subtree rooted at `id` as a standalone tree.
    pub fn subtree(&self, id: NodeId) -> Tree {
        let mut tree = Tree {
            nodes: Vec::with_capacity(self.node(id).size),
            root: NodeId(0),
        };
        tree.copy_from(self, id, None);
        tree
    }

    /// Replaces the subtree at `at` with a deep copy of `donor`'s subtree at
    /// `donor_id`, then refreshes every ancestor up to the root.
    ///
    /// Replacing the root makes the copy the whole tree.
    pub fn splice(&mut self, at: NodeId, donor: &Tree, donor_id: NodeId) {
        let Some(parent) = self.node(at).parent else {
            *self = donor.subtree(donor_id);
            return;
        };

        let grafted = self.copy_from(donor, donor_id, Some(parent));
        let slot = &mut self.nodes[parent.0];
        if slot.left == Some(at) {
            slot.left = Some(grafted);
        } else {
            slot.right = Some(grafted);
        }
        self.update_ancestors(parent);
        self.compact();
    }

    /// Structural check: parent links, arity and derived fields of every
    /// reachable node agree with a from-scratch recomputation.
    pub fn is_consistent(&self) -> bool {
        if self.node(self.root).parent.is_some() {
            return false;
        }
        self.check_subtree(self.root).is_some()
    }

    fn check_subtree(&self, id: NodeId) -> Option<(usize, usize)> {
        let node = self.node(id);
        let (size, height) = match (node.left, node.right) {
            (None, None) if node.primitive.is_leaf() => (1, 0),
            (Some(l), Some(r)) if !node.primitive.is_leaf() => {
                if self.node(l).parent != Some(id) || self.node(r).parent != Some(id) {
                    return None;
                }
                let (ls, lh) = self.check_subtree(l)?;
                let (rs, rh) = self.check_subtree(r)?;
                (1 + ls + rs, 1 + lh.max(rh))
            }
            _ => return None,
        };
        (node.size == size && node.height == height).then_some((size, height))
    }

    /// Appends a deep copy of `src`'s subtree at `src_id` to this arena in
    /// pre-order and returns the new subtree root.
    pub(crate) fn copy_from(&mut self, src: &Tree, src_id: NodeId, parent: Option<NodeId>) -> NodeId {
        let source = src.node(src_id);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            primitive: source.primitive.clone(),
            left: None,
            right: None,
            parent,
            size: source.size,
            height: source.height,
        });
        if let (Some(l), Some(r)) = (source.left, source.right) {
            let left = self.copy_from(src, l, Some(id));
            let right = self.copy_from(src, r, Some(id));
            self.nodes[id.0].left = Some(left);
            self.nodes[id.0].right = Some(right);
        }
        id
    }

    /// Recomputes `size`/`height` of one internal node from its children.
    pub(crate) fn refresh(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        if let (Some(l), Some(r)) = (node.left, node.right) {
            let (l, r) = (&self.nodes[l.0], &self.nodes[r.0]);
            let size = 1 + l.size + r.size;
            let height = 1 + l.height.max(r.height);
            let node = &mut self.nodes[id.0];
            node.size = size;
            node.height = height;
        }
    }

    /// Refreshes `from` and every ancestor up to the root.
    pub(crate) fn update_ancestors(&mut self, from: NodeId) {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            self.refresh(id);
            cursor = self.nodes[id.0].parent;
        }
    }

    /// Refreshes every node; requires pre-order arena layout.
    pub(crate) fn refresh_all(&mut self) {
        for i in (0..self.nodes.len()).rev() {
            self.refresh(NodeId(i));
        }
    }

    /// Drops nodes no longer reachable from the root and restores
    /// pre-order layout.
    fn compact(&mut self) {
        if self.nodes.len() == self.size() {
            return;
        }
        let mut packed = Tree {
            nodes: Vec::with_capacity(self.size()),
            root: NodeId(0),
        };
        packed.copy_from(self, self.root, None);
        *self = packed;
    }
}

/// Structural equality: same shape and same primitives, regardless of
/// arena layout.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        let a = self.preorder();
        let b = other.preorder();
        a.len() == b.len()
            && a.iter().zip(b.iter()).all(|(&(x, dx), &(y, dy))| {
                dx == dy && self.node(x).primitive == other.node(y).primitive
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(symbol: &str) -> Tree {
        Tree::leaf(Primitive::terminal(symbol))
    }

    fn c(value: f64) -> Tree {
        Tree::leaf(Primitive::Constant(value))
    }

    /// (* (+ G 3.0) P)
    fn sample() -> Tree {
        Tree::branch(
            Operator::Mul,
            Tree::branch(Operator::Add, t("G"), c(3.0)),
            t("P"),
        )
    }

    #[test]
    fn test_leaf_metadata() {
        let leaf = t("P");
        assert_eq!(leaf.size(), 1);
        assert_eq!(leaf.height(), 0);
        assert!(leaf.node(leaf.root()).is_leaf());
        assert!(leaf.is_consistent());
    }

    #[test]
    fn test_branch_metadata() {
        let tree = sample();
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.height(), 2);
        assert!(tree.is_consistent());
        let root = tree.node(tree.root());
        let left = tree.node(root.left().unwrap());
        assert_eq!(left.size(), 3);
        assert_eq!(left.height(), 1);
        assert_eq!(left.parent(), Some(tree.root()));
    }

    #[test]
    fn test_operator_symbols_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Operator::from_symbol("%"), None);
    }

    #[test]
    fn test_primitive_parse() {
        assert_eq!(Primitive::parse("3.5"), Primitive::Constant(3.5));
        assert_eq!(Primitive::parse("-2"), Primitive::Constant(-2.0));
        assert_eq!(Primitive::parse("RAND"), Primitive::Operator(Operator::Rand));
        assert_eq!(Primitive::parse("G"), Primitive::terminal("G"));
    }

    #[test]
    fn test_primitive_display() {
        assert_eq!(Primitive::Constant(3.0).to_string(), "3.0");
        assert_eq!(Primitive::Constant(-0.25).to_string(), "-0.25");
        assert_eq!(Primitive::Operator(Operator::Div).to_string(), "/");
        assert_eq!(Primitive::terminal("W").to_string(), "W");
    }

    #[test]
    fn test_enumerate_covers_every_node_with_depth() {
        let tree = sample();
        let numbered = tree.enumerate();
        assert_eq!(numbered.len(), tree.size());
        for &(id, depth) in &numbered {
            assert_eq!(tree.depth_of(id), depth);
        }
        assert_eq!(numbered[0], (tree.root(), 0));
    }

    #[test]
    fn test_subtree_is_detached_copy() {
        let tree = sample();
        let left = tree.node(tree.root()).left().unwrap();
        let sub = tree.subtree(left);
        assert_eq!(sub, Tree::branch(Operator::Add, t("G"), c(3.0)));
        assert!(sub.node(sub.root()).parent().is_none());
        assert!(sub.is_consistent());
    }

    #[test]
    fn test_splice_updates_ancestors() {
        let mut tree = sample();
        let donor = Tree::branch(
            Operator::Sub,
            Tree::branch(Operator::Div, t("W"), t("F")),
            c(1.0),
        );
        // Replace the constant 3.0 at depth 2.
        let (target, _) = tree
            .preorder()
            .into_iter()
            .find(|&(id, _)| tree.node(id).primitive() == &Primitive::Constant(3.0))
            .unwrap();
        tree.splice(target, &donor, donor.root());

        assert!(tree.is_consistent());
        assert_eq!(tree.size(), 9);
        assert_eq!(tree.height(), 4);
        assert_eq!(tree.len(), 9, "orphaned nodes are dropped");
    }

    #[test]
    fn test_splice_at_root_replaces_tree() {
        let mut tree = sample();
        let donor = sample();
        let inner = donor.node(donor.root()).left().unwrap();
        tree.splice(tree.root(), &donor, inner);
        assert_eq!(tree, Tree::branch(Operator::Add, t("G"), c(3.0)));
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_structural_equality_ignores_layout() {
        let a = sample();
        let mut b = sample();
        let leaf = b.node(b.root()).right().unwrap();
        let same = t("P");
        b.splice(leaf, &same, same.root());
        assert_eq!(a, b);
        assert_ne!(a, t("P"));
    }

    #[test]
    fn test_is_consistent_detects_stale_fields() {
        let mut tree = sample();
        tree.nodes[0].size = 4;
        assert!(!tree.is_consistent());
    }
}
