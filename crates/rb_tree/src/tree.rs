use std::cmp::Ordering;

use crate::policy::Augment;

pub type Id = u32;
pub const NIL: Id = Id::MAX;

#[inline(always)]
pub(crate) fn idx(x: Id) -> usize {
    x as usize
}

pub(crate) struct Node<P: Augment> {
    pub(crate) ch: [Id; 2],
    pub(crate) p: Id,
    pub(crate) red: bool,
    pub(crate) black_height: u8,
    pub(crate) size: u32,
    pub(crate) key: P::Key,
    pub(crate) agg: P::Agg,
}

/// Arena of red-black trees with parent links.
///
/// A tree is named by the id of its root; `NIL` is the empty tree and doubles
/// as the shared leaf. Node ids stay valid across every structural operation
/// (rotations, removal by successor swap, split, join), so callers can keep
/// them as stable handles into a sequence.
pub struct RbForest<P: Augment> {
    pub(crate) nodes: Vec<Node<P>>,
    pub(crate) free: Vec<Id>,
    pub(crate) policy: P,
}

impl<P: Augment> RbForest<P> {
    pub fn new(policy: P) -> Self {
        Self::with_capacity(policy, 0)
    }

    pub fn with_capacity(policy: P, capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Number of live nodes across all trees.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every node. Previously returned ids become invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
    }

    #[inline(always)]
    pub(crate) fn node(&self, x: Id) -> &Node<P> {
        debug_assert!(x != NIL);
        debug_assert!(idx(x) < self.nodes.len());
        if cfg!(debug_assertions) {
            &self.nodes[idx(x)]
        } else {
            // SAFETY: `Id` values are only created from valid indices and `NIL` is checked.
            unsafe { self.nodes.get_unchecked(idx(x)) }
        }
    }

    #[inline(always)]
    pub(crate) fn node_mut(&mut self, x: Id) -> &mut Node<P> {
        debug_assert!(x != NIL);
        debug_assert!(idx(x) < self.nodes.len());
        if cfg!(debug_assertions) {
            &mut self.nodes[idx(x)]
        } else {
            // SAFETY: `Id` values are only created from valid indices and `NIL` is checked.
            unsafe { self.nodes.get_unchecked_mut(idx(x)) }
        }
    }

    /// Allocates a solitary black node holding `key`.
    pub fn alloc(&mut self, key: P::Key) -> Id {
        let unit = self.policy.agg_unit();
        let agg = self.policy.agg_merge(&unit, &key, &unit);
        let node = Node {
            ch: [NIL, NIL],
            p: NIL,
            red: false,
            black_height: 1,
            size: 1,
            key,
            agg,
        };
        if let Some(x) = self.free.pop() {
            *self.node_mut(x) = node;
            x
        } else {
            debug_assert!(self.nodes.len() < NIL as usize);
            let x = self.nodes.len() as Id;
            self.nodes.push(node);
            x
        }
    }

    /// Returns a detached node to the free list and hands back its key.
    pub fn release(&mut self, x: Id) -> P::Key {
        debug_assert!(self.node(x).p == NIL && self.node(x).ch == [NIL, NIL]);
        self.free.push(x);
        std::mem::take(&mut self.node_mut(x).key)
    }

    /// Releases every node of the tree rooted at `root`.
    pub fn release_tree(&mut self, root: Id) {
        if root == NIL {
            return;
        }
        debug_assert!(self.node(root).p == NIL);
        let mut stack = vec![root];
        while let Some(x) = stack.pop() {
            let [l, r] = self.node(x).ch;
            if l != NIL {
                stack.push(l);
            }
            if r != NIL {
                stack.push(r);
            }
            self.isolate(x);
            self.release(x);
        }
    }

    pub fn key(&self, x: Id) -> &P::Key {
        &self.node(x).key
    }

    /// Mutable access to a key. Call [`RbForest::update`] afterwards so the
    /// aggregates above `x` see the change.
    pub fn key_mut(&mut self, x: Id) -> &mut P::Key {
        &mut self.node_mut(x).key
    }

    /// Aggregate of the subtree rooted at `x`.
    pub fn agg(&self, x: Id) -> P::Agg {
        if x == NIL {
            self.policy.agg_unit()
        } else {
            self.node(x).agg.clone()
        }
    }

    pub fn agg_ref(&self, x: Id) -> &P::Agg {
        &self.node(x).agg
    }

    #[inline(always)]
    pub fn size(&self, x: Id) -> usize {
        if x == NIL { 0 } else { self.node(x).size as usize }
    }

    #[inline(always)]
    pub fn is_red(&self, x: Id) -> bool {
        x != NIL && self.node(x).red
    }

    #[inline(always)]
    pub fn parent(&self, x: Id) -> Id {
        self.node(x).p
    }

    #[inline(always)]
    pub fn left(&self, x: Id) -> Id {
        self.node(x).ch[0]
    }

    #[inline(always)]
    pub fn right(&self, x: Id) -> Id {
        self.node(x).ch[1]
    }

    #[inline(always)]
    pub(crate) fn bh(&self, x: Id) -> u8 {
        if x == NIL { 0 } else { self.node(x).black_height }
    }

    #[inline(always)]
    pub(crate) fn side(&self, p: Id, x: Id) -> usize {
        if self.node(p).ch[0] == x { 0 } else { 1 }
    }

    /// Recomputes size, black height and aggregate of `x` from its children.
    /// Returns whether anything changed.
    pub(crate) fn pull(&mut self, x: Id) -> bool {
        let (l, r) = {
            let nx = self.node(x);
            (nx.ch[0], nx.ch[1])
        };
        let size = self.size(l) as u32 + self.size(r) as u32 + 1;
        let black_height = self.bh(l).max(self.bh(r)) + u8::from(!self.node(x).red);
        let agg = {
            let unit = self.policy.agg_unit();
            let la = if l == NIL { &unit } else { &self.node(l).agg };
            let ra = if r == NIL { &unit } else { &self.node(r).agg };
            self.policy.agg_merge(la, &self.node(x).key, ra)
        };
        let nx = self.node_mut(x);
        let changed = nx.size != size || nx.black_height != black_height || nx.agg != agg;
        nx.size = size;
        nx.black_height = black_height;
        nx.agg = agg;
        changed
    }

    /// Recomputes `x` and its ancestors, stopping at the first node whose
    /// fields come out unchanged.
    pub fn update(&mut self, mut x: Id) {
        while x != NIL && self.pull(x) {
            x = self.node(x).p;
        }
    }

    /// Recomputes every node from `x` to its root and returns the root.
    pub(crate) fn pull_path(&mut self, mut x: Id) -> Id {
        let mut last = NIL;
        while x != NIL {
            self.pull(x);
            last = x;
            x = self.node(x).p;
        }
        last
    }

    pub(crate) fn set_red(&mut self, x: Id, red: bool) {
        self.node_mut(x).red = red;
    }

    /// Changes the colour of a node whose children are up to date.
    pub(crate) fn recolor(&mut self, x: Id, red: bool) {
        if self.node(x).red != red {
            self.set_red(x, red);
            self.pull(x);
        }
    }

    /// Makes a root black.
    pub(crate) fn blacken(&mut self, x: Id) {
        if self.is_red(x) {
            self.recolor(x, false);
        }
    }

    pub(crate) fn isolate(&mut self, x: Id) {
        let nx = self.node_mut(x);
        nx.ch = [NIL, NIL];
        nx.p = NIL;
    }

    /// `dir == 0` rotates left: the right child of `x` takes its place.
    pub(crate) fn rotate(&mut self, x: Id, dir: usize) {
        let y = self.node(x).ch[1 - dir];
        debug_assert!(y != NIL);
        let b = self.node(y).ch[dir];
        let p = self.node(x).p;
        if p != NIL {
            let s = self.side(p, x);
            self.node_mut(p).ch[s] = y;
        }
        self.node_mut(y).p = p;
        self.node_mut(x).ch[1 - dir] = b;
        if b != NIL {
            self.node_mut(b).p = x;
        }
        self.node_mut(y).ch[dir] = x;
        self.node_mut(x).p = y;
        self.pull(x);
        self.pull(y);
    }

    pub fn root(&self, mut x: Id) -> Id {
        if x == NIL {
            return NIL;
        }
        while self.node(x).p != NIL {
            x = self.node(x).p;
        }
        x
    }

    pub fn min(&self, mut x: Id) -> Id {
        if x == NIL {
            return NIL;
        }
        while self.node(x).ch[0] != NIL {
            x = self.node(x).ch[0];
        }
        x
    }

    pub fn max(&self, mut x: Id) -> Id {
        if x == NIL {
            return NIL;
        }
        while self.node(x).ch[1] != NIL {
            x = self.node(x).ch[1];
        }
        x
    }

    fn step(&self, mut x: Id, dir: usize) -> Id {
        let c = self.node(x).ch[dir];
        if c != NIL {
            let mut y = c;
            while self.node(y).ch[1 - dir] != NIL {
                y = self.node(y).ch[1 - dir];
            }
            return y;
        }
        loop {
            let p = self.node(x).p;
            if p == NIL || self.node(p).ch[1 - dir] == x {
                return p;
            }
            x = p;
        }
    }

    pub fn successor(&self, x: Id) -> Id {
        self.step(x, 1)
    }

    pub fn predecessor(&self, x: Id) -> Id {
        self.step(x, 0)
    }

    /// Node at zero-based position `k` of the tree rooted at `root`.
    pub fn select(&self, root: Id, mut k: usize) -> Id {
        let mut x = root;
        while x != NIL {
            let ls = self.size(self.node(x).ch[0]);
            match k.cmp(&ls) {
                Ordering::Less => x = self.node(x).ch[0],
                Ordering::Equal => return x,
                Ordering::Greater => {
                    k -= ls + 1;
                    x = self.node(x).ch[1];
                }
            }
        }
        NIL
    }

    /// Zero-based position of `x` within its tree.
    pub fn rank(&self, mut x: Id) -> usize {
        let mut r = self.size(self.node(x).ch[0]);
        loop {
            let p = self.node(x).p;
            if p == NIL {
                return r;
            }
            if self.node(p).ch[1] == x {
                r += self.size(self.node(p).ch[0]) + 1;
            }
            x = p;
        }
    }

    fn depth(&self, mut x: Id) -> usize {
        let mut d = 0;
        while self.node(x).p != NIL {
            x = self.node(x).p;
            d += 1;
        }
        d
    }

    /// Lowest common ancestor plus the children of it leading to `a` and `b`
    /// (`NIL` when the ancestor is the node itself).
    fn lca_with_branches(&self, mut a: Id, mut b: Id) -> Option<(Id, Id, Id)> {
        let mut da = self.depth(a);
        let mut db = self.depth(b);
        let (mut ca, mut cb) = (NIL, NIL);
        while da > db {
            ca = a;
            a = self.node(a).p;
            da -= 1;
        }
        while db > da {
            cb = b;
            b = self.node(b).p;
            db -= 1;
        }
        while a != b {
            if self.node(a).p == NIL {
                return None;
            }
            ca = a;
            cb = b;
            a = self.node(a).p;
            b = self.node(b).p;
        }
        Some((a, ca, cb))
    }

    /// Lowest common ancestor, or `None` for nodes of different trees.
    pub fn lca(&self, a: Id, b: Id) -> Option<Id> {
        self.lca_with_branches(a, b).map(|(l, _, _)| l)
    }

    /// Relative in-order position of two nodes of the same tree.
    ///
    /// Runs in time proportional to the depth of the nodes. Red-black depth
    /// is logarithmic, but this routine does not rely on it.
    pub fn compare_order(&self, a: Id, b: Id) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let Some((l, ca, cb)) = self.lca_with_branches(a, b) else {
            debug_assert!(false, "compare_order on nodes of different trees");
            return Ordering::Equal;
        };
        if l == a {
            if self.node(a).ch[0] == cb {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        } else if l == b {
            if self.node(b).ch[0] == ca {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        } else if self.node(l).ch[0] == ca {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    pub fn iter(&self, root: Id) -> Iter<'_, P> {
        Iter {
            forest: self,
            next: self.min(root),
        }
    }

    /// Inserts detached `x` so that it ends up at position `index`.
    /// Returns the new root.
    pub fn insert_at(&mut self, root: Id, mut index: usize, x: Id) -> Id {
        debug_assert!(index <= self.size(root));
        if root == NIL {
            self.prepare_leaf(x, false);
            return x;
        }
        let mut cur = root;
        let dir = loop {
            let ls = self.size(self.node(cur).ch[0]);
            let dir = if index <= ls {
                0
            } else {
                index -= ls + 1;
                1
            };
            let next = self.node(cur).ch[dir];
            if next == NIL {
                break dir;
            }
            cur = next;
        };
        self.attach_leaf(cur, dir, x)
    }

    /// Inserts detached `x` by key order. `cmp` compares the new key with an
    /// existing one. Equal keys go to the right when duplicates are allowed;
    /// otherwise nothing is inserted and the flag comes back false.
    pub fn insert_by<F>(&mut self, root: Id, x: Id, allow_duplicates: bool, mut cmp: F) -> (Id, bool)
    where
        F: FnMut(&P::Key, &P::Key) -> Ordering,
    {
        if root == NIL {
            self.prepare_leaf(x, false);
            return (x, true);
        }
        let mut cur = root;
        let dir = loop {
            let dir = match cmp(&self.node(x).key, &self.node(cur).key) {
                Ordering::Less => 0,
                Ordering::Equal if !allow_duplicates => return (root, false),
                _ => 1,
            };
            let next = self.node(cur).ch[dir];
            if next == NIL {
                break dir;
            }
            cur = next;
        };
        (self.attach_leaf(cur, dir, x), true)
    }

    fn prepare_leaf(&mut self, x: Id, red: bool) {
        self.isolate(x);
        self.set_red(x, red);
        self.pull(x);
    }

    fn attach_leaf(&mut self, parent: Id, dir: usize, x: Id) -> Id {
        self.prepare_leaf(x, true);
        self.node_mut(parent).ch[dir] = x;
        self.node_mut(x).p = parent;
        self.fix_insertion(x)
    }

    /// Restores the red-black shape after `x` was attached red. Every node of
    /// the subtree under `x` must be up to date. Returns the root.
    pub(crate) fn fix_insertion(&mut self, mut x: Id) -> Id {
        loop {
            let p = self.node(x).p;
            if p == NIL {
                self.recolor(x, false);
                return x;
            }
            if !self.node(p).red {
                break;
            }
            let g = self.node(p).p;
            debug_assert!(g != NIL);
            let pd = self.side(g, p);
            let u = self.node(g).ch[1 - pd];
            if self.is_red(u) {
                self.recolor(u, false);
                self.set_red(p, false);
                self.pull(p);
                self.set_red(g, true);
                self.pull(g);
                x = g;
                continue;
            }
            let mut p = p;
            if self.side(p, x) != pd {
                self.rotate(p, pd);
                p = x;
            }
            self.set_red(p, false);
            self.set_red(g, true);
            self.rotate(g, 1 - pd);
            x = p;
            break;
        }
        self.pull_path(x)
    }

    /// Swaps the tree positions and colours of `x` and its in-order successor.
    /// Sizes and aggregates along the touched path are left stale.
    fn swap_with_successor(&mut self, x: Id) {
        let [xl, xr] = self.node(x).ch;
        let y = self.min(xr);
        let xp = self.node(x).p;
        let yp = self.node(y).p;
        let yr = self.node(y).ch[1];

        let (xred, yred) = (self.node(x).red, self.node(y).red);
        self.set_red(x, yred);
        self.set_red(y, xred);

        if xp != NIL {
            let s = self.side(xp, x);
            self.node_mut(xp).ch[s] = y;
        }
        self.node_mut(y).p = xp;
        self.node_mut(y).ch[0] = xl;
        self.node_mut(xl).p = y;
        if yp == x {
            self.node_mut(y).ch[1] = x;
            self.node_mut(x).p = y;
        } else {
            self.node_mut(y).ch[1] = xr;
            self.node_mut(xr).p = y;
            self.node_mut(yp).ch[0] = x;
            self.node_mut(x).p = yp;
        }
        self.node_mut(x).ch = [NIL, yr];
        if yr != NIL {
            self.node_mut(yr).p = x;
        }
    }

    /// Unlinks `x` from its tree and returns the new root of the remaining
    /// nodes. `x` comes back as a solitary black node that can be reused.
    pub fn remove(&mut self, x: Id) -> Id {
        if self.node(x).ch[0] != NIL && self.node(x).ch[1] != NIL {
            self.swap_with_successor(x);
        }
        let [l, r] = self.node(x).ch;
        let child = if l != NIL { l } else { r };
        let mut p = self.node(x).p;

        if child != NIL {
            // A lone child of a node with one empty side is a red leaf.
            if p != NIL {
                let s = self.side(p, x);
                self.node_mut(p).ch[s] = child;
            }
            self.node_mut(child).p = p;
            self.set_red(child, false);
            self.pull(child);
            self.reset_solitary(x);
            return if p == NIL { child } else { self.pull_path(p) };
        }

        if p == NIL {
            self.reset_solitary(x);
            return NIL;
        }
        if !self.node(x).red {
            self.fix_double_black(x);
            p = self.node(x).p;
        }
        let s = self.side(p, x);
        self.node_mut(p).ch[s] = NIL;
        self.reset_solitary(x);
        let root = self.pull_path(p);
        self.blacken(root);
        root
    }

    fn reset_solitary(&mut self, x: Id) {
        self.isolate(x);
        self.set_red(x, false);
        self.pull(x);
    }

    /// Rebalances around black non-root `n`, which is about to lose one unit
    /// of black height on its side. `n` stays in place.
    fn fix_double_black(&mut self, mut n: Id) {
        loop {
            let p = self.node(n).p;
            if p == NIL {
                return;
            }
            let d = self.side(p, n);
            let mut s = self.node(p).ch[1 - d];
            debug_assert!(s != NIL);
            if self.node(s).red {
                self.set_red(s, false);
                self.set_red(p, true);
                self.rotate(p, d);
                s = self.node(p).ch[1 - d];
            }
            let near = self.node(s).ch[d];
            let far = self.node(s).ch[1 - d];
            if !self.is_red(near) && !self.is_red(far) {
                self.recolor(s, true);
                if self.node(p).red {
                    self.set_red(p, false);
                    return;
                }
                n = p;
                continue;
            }
            if !self.is_red(far) {
                self.set_red(near, false);
                self.set_red(s, true);
                self.rotate(s, 1 - d);
                s = near;
            }
            let pred = self.node(p).red;
            self.set_red(s, pred);
            self.set_red(p, false);
            let far = self.node(s).ch[1 - d];
            self.recolor(far, false);
            self.rotate(p, d);
            return;
        }
    }
}

pub struct Iter<'a, P: Augment> {
    forest: &'a RbForest<P>,
    next: Id,
}

impl<P: Augment> Iterator for Iter<'_, P> {
    type Item = Id;

    fn next(&mut self) -> Option<Id> {
        if self.next == NIL {
            return None;
        }
        let x = self.next;
        self.next = self.forest.successor(x);
        Some(x)
    }
}
