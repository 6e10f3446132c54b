use std::cmp::Ordering;

use crate::policy::Augment;
use crate::tree::{Id, NIL, RbForest, idx};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("root {0} is red")]
    RedRoot(Id),
    #[error("root {0} has a parent")]
    RootHasParent(Id),
    #[error("red node {0} has a red child")]
    RedRed(Id),
    #[error("children of node {0} have different black heights")]
    BlackHeight(Id),
    #[error("node {child} does not point back to its parent {parent}")]
    ParentLink { parent: Id, child: Id },
    #[error("node {0} is reachable twice")]
    RepeatedNode(Id),
    #[error("stored subtree size of node {0} is stale")]
    Size(Id),
    #[error("stored black height of node {0} is stale")]
    BlackHeightField(Id),
    #[error("stored aggregate of node {0} is stale")]
    Augmentation(Id),
    #[error("nodes {0} and {1} are out of order")]
    Order(Id, Id),
}

impl<P: Augment> RbForest<P> {
    /// Re-derives every structural invariant of the tree rooted at `root`
    /// from scratch. Meant for tests; costs a full traversal.
    pub fn validate(&self, root: Id) -> Result<(), InvariantViolation> {
        if root == NIL {
            return Ok(());
        }
        if self.node(root).p != NIL {
            return Err(InvariantViolation::RootHasParent(root));
        }
        if self.node(root).red {
            return Err(InvariantViolation::RedRoot(root));
        }
        let mut seen = vec![false; self.nodes.len()];
        self.validate_subtree(root, &mut seen).map(|_| ())
    }

    /// Returns the black height of the subtree.
    fn validate_subtree(&self, x: Id, seen: &mut [bool]) -> Result<u8, InvariantViolation> {
        if x == NIL {
            return Ok(0);
        }
        if std::mem::replace(&mut seen[idx(x)], true) {
            return Err(InvariantViolation::RepeatedNode(x));
        }
        let nx = self.node(x);
        let mut heights = [0; 2];
        for (dir, &c) in nx.ch.iter().enumerate() {
            if c == NIL {
                continue;
            }
            if self.node(c).p != x {
                return Err(InvariantViolation::ParentLink { parent: x, child: c });
            }
            if nx.red && self.node(c).red {
                return Err(InvariantViolation::RedRed(x));
            }
            heights[dir] = self.validate_subtree(c, seen)?;
        }
        if heights[0] != heights[1] {
            return Err(InvariantViolation::BlackHeight(x));
        }
        let black_height = heights[0] + u8::from(!nx.red);
        if nx.black_height != black_height {
            return Err(InvariantViolation::BlackHeightField(x));
        }
        if nx.size as usize != self.size(nx.ch[0]) + self.size(nx.ch[1]) + 1 {
            return Err(InvariantViolation::Size(x));
        }
        let agg = self
            .policy
            .agg_merge(&self.agg(nx.ch[0]), &nx.key, &self.agg(nx.ch[1]));
        if agg != nx.agg {
            return Err(InvariantViolation::Augmentation(x));
        }
        Ok(black_height)
    }

    /// Checks that in-order keys never decrease under `cmp`.
    pub fn validate_order<F>(&self, root: Id, mut cmp: F) -> Result<(), InvariantViolation>
    where
        F: FnMut(&P::Key, &P::Key) -> Ordering,
    {
        let mut prev = NIL;
        for x in self.iter(root) {
            if prev != NIL && cmp(self.key(prev), self.key(x)) == Ordering::Greater {
                return Err(InvariantViolation::Order(prev, x));
            }
            prev = x;
        }
        Ok(())
    }
}
