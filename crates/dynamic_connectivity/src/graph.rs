use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use rb_tree::{Id, NIL};

use crate::adjacency::{EId, EdgeArena, List};
use crate::config::Config;
use crate::error::ConnectivityError;
use crate::euler_tour::{Combine, EulerTourForest, VId};

pub(crate) struct VertexInfo<V> {
    /// Top-level representation.
    pub(crate) vertex: VId,
    pub(crate) edges: HashMap<V, EId>,
}

/// Fully dynamic connectivity over an undirected graph whose vertices are
/// arbitrary hashable values.
///
/// Edges are organised in levels. The top level holds a spanning forest of
/// the whole graph; an edge sinks a level each time it is scanned while
/// looking for a replacement, and a tree at level `i` never has more than
/// `2^i` vertices. Each forest is stored as Euler tours in a red-black tree
/// whose subtree summaries say where pending edges are and fold vertex
/// augmentations, so `connected` and component aggregates are a root lookup
/// away.
///
/// Updates take `O(log² V)` amortized time with high probability. Vertices
/// come into existence with their first edge or augmentation and are
/// forgotten once they have neither.
///
/// ```
/// use dynamic_connectivity::DynamicConnectivity;
///
/// let mut graph = DynamicConnectivity::with_augmentation(|a: &u32, b: &u32| a + b);
/// graph.add_edge("a", "b").unwrap();
/// graph.add_edge("b", "c").unwrap();
/// graph.set_vertex_augmentation("a", 3).unwrap();
/// graph.set_vertex_augmentation("c", 4).unwrap();
/// assert!(graph.connected(&"a", &"c"));
/// assert_eq!(graph.get_component_augmentation(&"b").unwrap(), Some(7));
///
/// graph.remove_edge(&"b", &"c").unwrap();
/// assert!(!graph.connected(&"a", &"c"));
/// assert_eq!(graph.get_component_augmentation(&"b").unwrap(), Some(3));
/// ```
pub struct DynamicConnectivity<V, T: Clone + PartialEq = ()> {
    pub(crate) vertex_info: HashMap<V, VertexInfo<V>>,
    pub(crate) forest: EulerTourForest<T>,
    pub(crate) edges: EdgeArena,
    /// Level of the top representations; trees at level `i` hold at most
    /// `2^i` vertices.
    pub(crate) max_log_vertex_count: u32,
    pub(crate) augmented: bool,
    pub(crate) config: Config,
    pub(crate) edge_count: usize,
}

impl<V: Hash + Eq + Clone> DynamicConnectivity<V, ()> {
    /// An unaugmented graph. Augmentation calls fail with
    /// [`ConnectivityError::NotAugmented`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, None)
    }
}

impl<V: Hash + Eq + Clone> Default for DynamicConnectivity<V, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, T> DynamicConnectivity<V, T>
where
    V: Hash + Eq + Clone,
    T: Clone + PartialEq,
{
    /// A graph whose components fold vertex augmentations with `combine`,
    /// which must be associative and commutative.
    pub fn with_augmentation<F>(combine: F) -> Self
    where
        F: Fn(&T, &T) -> T + Send + Sync + 'static,
    {
        Self::with_config_and_augmentation(Config::default(), combine)
    }

    pub fn with_config_and_augmentation<F>(config: Config, combine: F) -> Self
    where
        F: Fn(&T, &T) -> T + Send + Sync + 'static,
    {
        Self::build(config, Some(Box::new(combine)))
    }

    fn build(config: Config, combine: Option<Combine<T>>) -> Self {
        Self {
            vertex_info: HashMap::new(),
            augmented: combine.is_some(),
            forest: EulerTourForest::new(combine),
            edges: EdgeArena::default(),
            max_log_vertex_count: 0,
            config,
            edge_count: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_info.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_augmented(&self) -> bool {
        self.augmented
    }

    fn check_augmented(&self) -> Result<(), ConnectivityError> {
        if self.augmented {
            Ok(())
        } else {
            Err(ConnectivityError::NotAugmented)
        }
    }

    fn reserve_vertices<'a>(
        &self,
        vertices: impl IntoIterator<Item = &'a V>,
    ) -> Result<(), ConnectivityError>
    where
        V: 'a,
    {
        let missing = vertices
            .into_iter()
            .filter(|v| !self.vertex_info.contains_key(*v))
            .count();
        let max = self.config.max_vertex_count();
        if self.vertex_info.len() + missing > max {
            return Err(ConnectivityError::TooManyVertices { max });
        }
        Ok(())
    }

    fn ensure_info(&mut self, vertex: &V) -> VId {
        if let Some(info) = self.vertex_info.get(vertex) {
            return info.vertex;
        }
        let top = self.forest.add_vertex(NIL);
        self.vertex_info.insert(
            vertex.clone(),
            VertexInfo {
                vertex: top,
                edges: HashMap::new(),
            },
        );
        if self.vertex_info.len() > 1 << self.max_log_vertex_count {
            self.max_log_vertex_count += 1;
        }
        top
    }

    /// Forgets `vertex` if nothing refers to it any more.
    fn release_if_unused(&mut self, vertex: &V) {
        let Some(info) = self.vertex_info.get(vertex) else {
            return;
        };
        if !info.edges.is_empty() || self.forest.augmentation(info.vertex).is_some() {
            return;
        }
        let top = info.vertex;
        self.vertex_info.remove(vertex);
        self.forest.release_chain(top);
        let len = self.vertex_info.len();
        if len << self.config.rebuild_change() <= 1 << self.max_log_vertex_count {
            self.rebuild();
        }
    }

    /// Adds the edge `u - v`. Returns `Ok(false)` if it was already present.
    pub fn add_edge(&mut self, u: V, v: V) -> Result<bool, ConnectivityError> {
        if u == v {
            return Err(ConnectivityError::SelfLoop);
        }
        if self.contains_edge(&u, &v) {
            return Ok(false);
        }
        self.reserve_vertices([&u, &v])?;
        let vu = self.ensure_info(&u);
        let vv = self.ensure_info(&v);

        let e = self.edges.alloc(vu, vv);
        if self.forest.root(vu) == self.forest.root(vv) {
            self.edges.link(&mut self.forest.vertices, e, List::Graph);
        } else {
            self.edges.link(&mut self.forest.vertices, e, List::Forest);
            let t = self.forest.add_forest_edge(vu, vv);
            self.edges.get_mut(e).tour_edge = t;
        }
        self.forest.refresh(vu);
        self.forest.refresh(vv);

        if let Some(info) = self.vertex_info.get_mut(&u) {
            info.edges.insert(v.clone(), e);
        }
        if let Some(info) = self.vertex_info.get_mut(&v) {
            info.edges.insert(u, e);
        }
        self.edge_count += 1;
        Ok(true)
    }

    /// Removes the edge `u - v`. Returns `Ok(false)` if there was none.
    pub fn remove_edge(&mut self, u: &V, v: &V) -> Result<bool, ConnectivityError> {
        if u == v {
            return Err(ConnectivityError::SelfLoop);
        }
        let Some(e) = self
            .vertex_info
            .get_mut(u)
            .and_then(|info| info.edges.remove(v))
        else {
            return Ok(false);
        };
        if let Some(info) = self.vertex_info.get_mut(v) {
            info.edges.remove(u);
        }
        self.edge_count -= 1;

        let [a, b] = self.edges.get(e).vertex;
        let mut t = self.edges.get(e).tour_edge;
        self.edges.unlink(&mut self.forest.vertices, e);
        self.edges.release(e);
        self.forest.refresh(a);
        self.forest.refresh(b);

        if t != NIL {
            while t != NIL {
                let higher = self.forest.tour_edge(t).higher;
                self.forest.remove_forest_edge(t);
                t = higher;
            }
            self.reconnect(a, b);
        }

        self.release_if_unused(u);
        self.release_if_unused(v);
        Ok(true)
    }

    /// Looks for a replacement after the forest edge between the level
    /// representations `a` and `b` was cut at every level, starting at the
    /// edge's level and moving up.
    fn reconnect(&mut self, mut a: VId, mut b: VId) {
        let mut replacement = NIL;
        let mut depth = 0usize;
        while a != NIL {
            let root_a = self.forest.root(a);
            let root_b = self.forest.root(b);
            let size_a = self.forest.tree.size(root_a);
            let size_b = self.forest.tree.size(root_b);
            if self.forest.summary(root_a).has_graph_edge
                && self.forest.summary(root_b).has_graph_edge
            {
                let (small, other) = if size_a < size_b {
                    (root_a, root_b)
                } else {
                    (root_b, root_a)
                };
                self.push_forest_edges(small);
                replacement = self.find_replacement_edge(small, other);
                if replacement != NIL {
                    break;
                }
            }

            let higher_a = self.forest.vertex(a).higher;
            let higher_b = self.forest.vertex(b).higher;
            // Lower representations alone in their tour carry no edges.
            if size_a == 1 && higher_a != NIL {
                self.forest.vertex_mut(higher_a).lower = NIL;
                self.forest.release_chain(a);
            }
            if size_b == 1 && higher_b != NIL {
                self.forest.vertex_mut(higher_b).lower = NIL;
                self.forest.release_chain(b);
            }
            a = higher_a;
            b = higher_b;
            depth += 1;
        }

        if replacement == NIL {
            log::trace!("no replacement edge after {depth} levels");
            return;
        }
        log::trace!("replacement edge found {depth} levels above the cut");
        let [mut x, mut y] = self.edges.get(replacement).vertex;
        self.edges
            .relink(&mut self.forest.vertices, replacement, [x, y], List::Forest);
        self.forest.refresh(x);
        self.forest.refresh(y);
        let mut lower = NIL;
        while x != NIL {
            let t = self.forest.add_forest_edge(x, y);
            if lower == NIL {
                self.edges.get_mut(replacement).tour_edge = t;
            } else {
                self.forest.tour_edge_mut(lower).higher = t;
            }
            lower = t;
            x = self.forest.vertex(x).higher;
            y = self.forest.vertex(y).higher;
        }
    }

    fn key_flag(&self, x: Id, list: List) -> bool {
        let key = self.forest.tree.key(x);
        match list {
            List::Graph => key.has_graph_edge,
            List::Forest => key.has_forest_edge,
        }
    }

    fn subtree_flag(&self, x: Id, list: List) -> bool {
        if x == NIL {
            return false;
        }
        let summary = self.forest.tree.agg_ref(x);
        match list {
            List::Graph => summary.has_graph_edge,
            List::Forest => summary.has_forest_edge,
        }
    }

    /// Leftmost flagged visit of a subtree whose summary is flagged.
    fn descend_flagged(&self, mut x: Id, list: List) -> Id {
        loop {
            let l = self.forest.tree.left(x);
            if self.subtree_flag(l, list) {
                x = l;
            } else if self.key_flag(x, list) {
                return x;
            } else {
                x = self.forest.tree.right(x);
                debug_assert!(self.subtree_flag(x, list));
            }
        }
    }

    fn first_flagged(&self, root: Id, list: List) -> Id {
        if self.subtree_flag(root, list) {
            self.descend_flagged(root, list)
        } else {
            NIL
        }
    }

    /// Next flagged visit after `x` in tour order, reading flags as they are
    /// now.
    fn next_flagged(&self, x: Id, list: List) -> Id {
        let r = self.forest.tree.right(x);
        if self.subtree_flag(r, list) {
            return self.descend_flagged(r, list);
        }
        let mut n = x;
        loop {
            let p = self.forest.tree.parent(n);
            if p == NIL {
                return NIL;
            }
            if self.forest.tree.left(p) == n {
                if self.key_flag(p, list) {
                    return p;
                }
                let r = self.forest.tree.right(p);
                if self.subtree_flag(r, list) {
                    return self.descend_flagged(r, list);
                }
            }
            n = p;
        }
    }

    /// Moves `e` from the level of its endpoints to the level below.
    fn push_down(&mut self, e: EId, list: List) -> [VId; 2] {
        let [a, b] = self.edges.get(e).vertex;
        let la = self.forest.ensure_lower(a);
        let lb = self.forest.ensure_lower(b);
        self.edges.relink(&mut self.forest.vertices, e, [la, lb], list);
        [la, lb]
    }

    /// Pushes every forest edge of the tree rooted at `root` one level down.
    fn push_forest_edges(&mut self, root: Id) {
        let mut node = self.first_flagged(root, List::Forest);
        let mut pushed = 0usize;
        while node != NIL {
            let v = self.forest.tree.key(node).vertex;
            let mut e = self.forest.vertex(v).forest_head;
            while e != NIL {
                let next = self.edges.next_at(e, v);
                let w = self.edges.other(e, v);
                let [la, lb] = self.push_down(e, List::Forest);
                let t = self.forest.add_forest_edge(la, lb);
                let higher = self.edges.get(e).tour_edge;
                self.forest.tour_edge_mut(t).higher = higher;
                self.edges.get_mut(e).tour_edge = t;
                self.forest.refresh(w);
                self.forest.refresh(la);
                self.forest.refresh(lb);
                pushed += 1;
                e = next;
            }
            self.forest.refresh(v);
            node = self.next_flagged(node, List::Forest);
        }
        log::trace!("pushed {pushed} forest edges down");
    }

    /// Scans the non-forest edges of the tree rooted at `root`. An edge that
    /// reaches the tree rooted at `other` is returned; every edge scanned
    /// before it is pushed one level down.
    fn find_replacement_edge(&mut self, root: Id, other: Id) -> EId {
        let mut node = self.first_flagged(root, List::Graph);
        while node != NIL {
            let v = self.forest.tree.key(node).vertex;
            let mut e = self.forest.vertex(v).graph_head;
            while e != NIL {
                let next = self.edges.next_at(e, v);
                let w = self.edges.other(e, v);
                if self.forest.root(w) == other {
                    self.forest.refresh(v);
                    return e;
                }
                let [la, lb] = self.push_down(e, List::Graph);
                self.forest.refresh(w);
                self.forest.refresh(la);
                self.forest.refresh(lb);
                e = next;
            }
            self.forest.refresh(v);
            node = self.next_flagged(node, List::Graph);
        }
        NIL
    }

    /// Whether `u` and `v` are in the same component. Every value is
    /// connected to itself, tracked or not.
    pub fn connected(&self, u: &V, v: &V) -> bool {
        if u == v {
            return true;
        }
        match (self.vertex_info.get(u), self.vertex_info.get(v)) {
            (Some(iu), Some(iv)) => self.forest.root(iu.vertex) == self.forest.root(iv.vertex),
            _ => false,
        }
    }

    pub fn contains_edge(&self, u: &V, v: &V) -> bool {
        self.vertex_info
            .get(u)
            .is_some_and(|info| info.edges.contains_key(v))
    }

    /// Snapshot of the neighbours of `v`, in no particular order.
    pub fn adjacent_vertices(&self, v: &V) -> Vec<V> {
        self.vertex_info
            .get(v)
            .map(|info| info.edges.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of vertices in the component of `v`; 1 for an untracked value.
    pub fn component_size(&self, v: &V) -> usize {
        match self.vertex_info.get(v) {
            Some(info) => (self.forest.tree.size(self.forest.root(info.vertex)) + 1) / 2,
            None => 1,
        }
    }

    /// Sets the augmentation of `v`, returning the previous one.
    pub fn set_vertex_augmentation(
        &mut self,
        v: V,
        value: T,
    ) -> Result<Option<T>, ConnectivityError> {
        self.check_augmented()?;
        self.reserve_vertices([&v])?;
        let top = self.ensure_info(&v);
        Ok(self.forest.set_augmentation(top, Some(value)))
    }

    /// Clears the augmentation of `v`, returning it.
    pub fn remove_vertex_augmentation(&mut self, v: &V) -> Result<Option<T>, ConnectivityError> {
        self.check_augmented()?;
        let Some(info) = self.vertex_info.get(v) else {
            return Ok(None);
        };
        let old = self.forest.set_augmentation(info.vertex, None);
        self.release_if_unused(v);
        Ok(old)
    }

    pub fn get_vertex_augmentation(&self, v: &V) -> Result<Option<&T>, ConnectivityError> {
        self.check_augmented()?;
        Ok(self
            .vertex_info
            .get(v)
            .and_then(|info| self.forest.augmentation(info.vertex)))
    }

    /// Combination of the augmentations of every vertex connected to `v`, or
    /// `None` if none of them has one.
    pub fn get_component_augmentation(&self, v: &V) -> Result<Option<T>, ConnectivityError> {
        self.check_augmented()?;
        Ok(self.vertex_info.get(v).and_then(|info| {
            let root = self.forest.root(info.vertex);
            self.forest.summary(root).augmentation.clone()
        }))
    }

    pub fn vertex_has_augmentation(&self, v: &V) -> Result<bool, ConnectivityError> {
        Ok(self.get_vertex_augmentation(v)?.is_some())
    }

    pub fn component_has_augmentation(&self, v: &V) -> Result<bool, ConnectivityError> {
        self.check_augmented()?;
        Ok(self.vertex_info.get(v).is_some_and(|info| {
            let root = self.forest.root(info.vertex);
            self.forest.summary(root).augmentation.is_some()
        }))
    }

    /// Drops every vertex and edge.
    pub fn clear(&mut self) {
        self.vertex_info = HashMap::new();
        self.forest.clear();
        self.edges.clear();
        self.max_log_vertex_count = 0;
        self.edge_count = 0;
    }
}

impl<V, T: Clone + PartialEq> fmt::Debug for DynamicConnectivity<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicConnectivity")
            .field("vertices", &self.vertex_info.len())
            .field("edges", &self.edge_count)
            .field("max_log_vertex_count", &self.max_log_vertex_count)
            .field("augmented", &self.augmented)
            .finish()
    }
}
