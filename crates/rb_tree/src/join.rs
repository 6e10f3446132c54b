use crate::policy::Augment;
use crate::tree::{Id, NIL, RbForest};

impl<P: Augment> RbForest<P> {
    /// Joins two trees around a detached `pivot`: every node of `left`, then
    /// `pivot`, then every node of `right`. Returns the new root.
    ///
    /// Runs in time proportional to the black height difference of the two
    /// trees, which is what makes a split built from repeated joins
    /// logarithmic overall.
    pub fn join(&mut self, left: Id, pivot: Id, right: Id) -> Id {
        debug_assert!(left == NIL || self.parent(left) == NIL);
        debug_assert!(right == NIL || self.parent(right) == NIL);
        self.blacken(left);
        self.blacken(right);
        self.isolate(pivot);
        let bl = self.bh(left);
        let br = self.bh(right);

        if bl == br {
            self.node_mut(pivot).ch = [left, right];
            if left != NIL {
                self.node_mut(left).p = pivot;
            }
            if right != NIL {
                self.node_mut(right).p = pivot;
            }
            self.set_red(pivot, false);
            self.pull(pivot);
            return pivot;
        }

        // Walk the inner spine of the taller tree down to a black node whose
        // black height matches the shorter tree, then hang the pivot there.
        let (tall, short, dir, target) = if bl > br {
            (left, right, 1, br)
        } else {
            (right, left, 0, bl)
        };
        let mut parent = NIL;
        let mut cur = tall;
        while cur != NIL && (self.is_red(cur) || self.bh(cur) != target) {
            parent = cur;
            cur = self.node(cur).ch[dir];
        }
        debug_assert!(parent != NIL);

        let mut ch = [NIL, NIL];
        ch[dir] = short;
        ch[1 - dir] = cur;
        self.node_mut(pivot).ch = ch;
        if cur != NIL {
            self.node_mut(cur).p = pivot;
        }
        if short != NIL {
            self.node_mut(short).p = pivot;
        }
        self.node_mut(parent).ch[dir] = pivot;
        self.node_mut(pivot).p = parent;
        self.set_red(pivot, true);
        self.pull(pivot);
        let root = self.fix_insertion(pivot);
        self.blacken(root);
        root
    }

    /// Joins two trees without a pivot. Returns the new root.
    pub fn concatenate(&mut self, left: Id, right: Id) -> Id {
        if left == NIL {
            return right;
        }
        if right == NIL {
            return left;
        }
        let pivot = self.max(left);
        let left = self.remove(pivot);
        self.join(left, pivot, right)
    }

    /// Cuts the tree containing `x` into the nodes strictly before `x` and the
    /// nodes from `x` onward. Returns both roots.
    pub fn split(&mut self, x: Id) -> (Id, Id) {
        let [mut left, mut right] = self.node(x).ch;
        let mut cur = x;
        let mut p = self.node(x).p;
        if left != NIL {
            self.node_mut(left).p = NIL;
        }
        if right != NIL {
            self.node_mut(right).p = NIL;
        }
        self.isolate(x);

        while p != NIL {
            let next = self.node(p).p;
            let from_right = self.node(p).ch[1] == cur;
            let other = self.node(p).ch[usize::from(!from_right)];
            if other != NIL {
                self.node_mut(other).p = NIL;
            }
            self.isolate(p);
            if from_right {
                left = self.join(other, p, left);
            } else {
                right = self.join(right, p, other);
            }
            cur = p;
            p = next;
        }

        let right = self.join(NIL, x, right);
        self.blacken(left);
        (left, right)
    }

    /// Builds a balanced tree over detached nodes in the given order.
    pub fn build(&mut self, order: &[Id]) -> Id {
        if order.is_empty() {
            return NIL;
        }
        let red_depth = order.len().ilog2();
        let root = self.build_range(order, 0, red_depth);
        self.node_mut(root).p = NIL;
        root
    }

    fn build_range(&mut self, order: &[Id], depth: u32, red_depth: u32) -> Id {
        if order.is_empty() {
            return NIL;
        }
        let mid = (order.len() - 1) / 2;
        let x = order[mid];
        let l = self.build_range(&order[..mid], depth + 1, red_depth);
        let r = self.build_range(&order[mid + 1..], depth + 1, red_depth);
        self.node_mut(x).ch = [l, r];
        if l != NIL {
            self.node_mut(l).p = x;
        }
        if r != NIL {
            self.node_mut(r).p = x;
        }
        self.set_red(x, depth > 0 && depth == red_depth);
        self.pull(x);
        x
    }
}
