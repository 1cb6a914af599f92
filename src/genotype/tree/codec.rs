//! Text encoding of trees.
//!
//! One node per line in pre-order, depth encoded as a run of `|`:
//!
//! ```text
//! +
//! |G
//! |3.0
//! ```
//!
//! The last line is followed by a newline.

use super::node::{Node, NodeId, Primitive, Tree};
use crate::error::{EvolveError, Result};
use std::fmt;
use std::str::FromStr;

impl Tree {
    /// Encodes the tree in the pipe-depth format.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Decodes the pipe-depth format, rebuilding parent links and derived
    /// fields.
    ///
    /// Each line attaches to the nearest shallower node still open on a
    /// stack: as the left child of the previous line's node, or as the right
    /// child of an ancestor reached by popping finished subtrees.
    pub fn deserialize(text: &str) -> Result<Tree> {
        let mut lines: Vec<&str> = text.split('\n').collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        let Some((first, rest)) = lines.split_first() else {
            return Err(EvolveError::malformed(1, "empty tree text"));
        };

        let (root_depth, root_primitive) = parse_line(first, 1)?;
        if root_depth != 0 {
            return Err(EvolveError::malformed(1, "root must be at depth 0"));
        }

        let mut tree = Tree {
            nodes: vec![Node::leaf(root_primitive, None)],
            root: NodeId(0),
        };
        let mut stack: Vec<(NodeId, usize)> = vec![(tree.root, 0)];

        for (offset, line) in rest.iter().enumerate() {
            let line_no = offset + 2;
            let (depth, primitive) = parse_line(line, line_no)?;

            let Some((mut parent, mut parent_depth)) = stack.pop() else {
                return Err(EvolveError::malformed(line_no, "no open node to attach to"));
            };
            let mut right_child = false;
            while parent_depth >= depth {
                let Some(next) = stack.pop() else {
                    return Err(EvolveError::malformed(
                        line_no,
                        format!("depth {depth} has no parent"),
                    ));
                };
                (parent, parent_depth) = next;
                right_child = true;
            }
            if depth != parent_depth + 1 {
                return Err(EvolveError::malformed(
                    line_no,
                    format!("depth jumps from {parent_depth} to {depth}"),
                ));
            }

            let id = NodeId(tree.nodes.len());
            tree.nodes.push(Node::leaf(primitive, Some(parent)));
            let slot = &mut tree.nodes[parent.0];
            if !right_child {
                slot.left = Some(id);
            } else if slot.left.is_some() && slot.right.is_none() {
                slot.right = Some(id);
            } else {
                return Err(EvolveError::malformed(line_no, "node has more than two children"));
            }

            stack.push((parent, parent_depth));
            stack.push((id, depth));
        }

        check_arity(&tree)?;
        tree.refresh_all();
        Ok(tree)
    }
}

/// Splits a line into its `|` depth prefix and primitive.
fn parse_line(line: &str, line_no: usize) -> Result<(usize, Primitive)> {
    let body = line.trim_start_matches('|');
    let depth = line.len() - body.len();
    if body.is_empty() {
        return Err(EvolveError::malformed(line_no, "missing primitive"));
    }
    Ok((depth, Primitive::parse(body)))
}

/// Operators need two children, leaves none. Arena order is pre-order, so
/// the arena index plus one is the source line.
fn check_arity(tree: &Tree) -> Result<()> {
    for (i, node) in tree.nodes.iter().enumerate() {
        let children = usize::from(node.left.is_some()) + usize::from(node.right.is_some());
        let expected = if node.primitive.is_leaf() { 0 } else { 2 };
        if children != expected {
            return Err(EvolveError::malformed(
                i + 1,
                format!(
                    "'{}' has {children} children, expected {expected}",
                    node.primitive
                ),
            ));
        }
    }
    Ok(())
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, depth) in self.preorder() {
            writeln!(f, "{}{}", "|".repeat(depth), self.node(id).primitive)?;
        }
        Ok(())
    }
}

impl FromStr for Tree {
    type Err = EvolveError;

    fn from_str(s: &str) -> Result<Self> {
        Tree::deserialize(s)
    }
}
