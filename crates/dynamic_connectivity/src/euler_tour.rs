use std::cmp::Ordering;

use rb_tree::{Augment, Id, NIL, RbForest};

/// Index of a per-level vertex representation.
pub(crate) type VId = u32;
/// Index of a per-level forest edge (one link of an edge's level chain).
pub(crate) type TId = u32;

pub(crate) type Combine<T> = Box<dyn Fn(&T, &T) -> T + Send + Sync>;

/// One occurrence of a vertex in an Euler tour.
///
/// Only the canonical visit of a vertex (see [`LevelVertex::visit`]) carries
/// the adjacency flags and the augmentation; every other visit keeps them
/// cleared so that subtree summaries count each vertex once.
pub(crate) struct Visit<T> {
    pub(crate) vertex: VId,
    pub(crate) has_graph_edge: bool,
    pub(crate) has_forest_edge: bool,
    pub(crate) augmentation: Option<T>,
}

impl<T> Default for Visit<T> {
    fn default() -> Self {
        Self {
            vertex: NIL,
            has_graph_edge: false,
            has_forest_edge: false,
            augmentation: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary<T> {
    pub(crate) has_graph_edge: bool,
    pub(crate) has_forest_edge: bool,
    pub(crate) augmentation: Option<T>,
}

pub(crate) struct VisitAugment<T> {
    combine: Option<Combine<T>>,
}

impl<T: Clone + PartialEq> Augment for VisitAugment<T> {
    type Key = Visit<T>;
    type Agg = Summary<T>;

    fn agg_unit(&self) -> Self::Agg {
        Summary {
            has_graph_edge: false,
            has_forest_edge: false,
            augmentation: None,
        }
    }

    fn agg_merge(&self, left: &Self::Agg, key: &Self::Key, right: &Self::Agg) -> Self::Agg {
        let augmentation = match &self.combine {
            None => None,
            Some(combine) => [&left.augmentation, &key.augmentation, &right.augmentation]
                .into_iter()
                .flatten()
                .fold(None, |acc: Option<T>, value| {
                    Some(match acc {
                        None => value.clone(),
                        Some(acc) => combine(&acc, value),
                    })
                }),
        };
        Summary {
            has_graph_edge: left.has_graph_edge || key.has_graph_edge || right.has_graph_edge,
            has_forest_edge: left.has_forest_edge || key.has_forest_edge || right.has_forest_edge,
            augmentation,
        }
    }
}

/// A vertex as seen by one level.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LevelVertex {
    pub(crate) lower: VId,
    pub(crate) higher: VId,
    /// Canonical visit of this vertex in its level's tour.
    pub(crate) visit: Id,
    pub(crate) graph_head: u32,
    pub(crate) forest_head: u32,
}

impl LevelVertex {
    const VACANT: Self = Self {
        lower: NIL,
        higher: NIL,
        visit: NIL,
        graph_head: NIL,
        forest_head: NIL,
    };
}

/// A forest edge at one level.
///
/// `visit` holds the two visits that precede the traversal of the edge in
/// each direction. They are node ids, so they survive rerooting.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TourEdge {
    pub(crate) visit: [Id; 2],
    pub(crate) higher: TId,
}

/// Euler tours of every level, stored in one shared tree arena.
///
/// A tree with `n` vertices is a tour of `2n - 1` visits whose first and last
/// visits belong to the same vertex.
pub(crate) struct EulerTourForest<T: Clone + PartialEq> {
    pub(crate) tree: RbForest<VisitAugment<T>>,
    pub(crate) vertices: Vec<LevelVertex>,
    free_vertices: Vec<VId>,
    pub(crate) tour_edges: Vec<TourEdge>,
    free_tour_edges: Vec<TId>,
}

impl<T: Clone + PartialEq> EulerTourForest<T> {
    pub(crate) fn new(combine: Option<Combine<T>>) -> Self {
        Self {
            tree: RbForest::new(VisitAugment { combine }),
            vertices: Vec::new(),
            free_vertices: Vec::new(),
            tour_edges: Vec::new(),
            free_tour_edges: Vec::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.tree.clear();
        self.vertices.clear();
        self.free_vertices.clear();
        self.tour_edges.clear();
        self.free_tour_edges.clear();
    }

    #[inline(always)]
    pub(crate) fn vertex(&self, v: VId) -> &LevelVertex {
        &self.vertices[v as usize]
    }

    #[inline(always)]
    pub(crate) fn vertex_mut(&mut self, v: VId) -> &mut LevelVertex {
        &mut self.vertices[v as usize]
    }

    #[inline(always)]
    pub(crate) fn tour_edge(&self, t: TId) -> &TourEdge {
        &self.tour_edges[t as usize]
    }

    #[inline(always)]
    pub(crate) fn tour_edge_mut(&mut self, t: TId) -> &mut TourEdge {
        &mut self.tour_edges[t as usize]
    }

    /// Number of live per-level vertex representations.
    pub(crate) fn vertex_slots(&self) -> usize {
        self.vertices.len() - self.free_vertices.len()
    }

    fn alloc_visit(&mut self, v: VId) -> Id {
        self.tree.alloc(Visit {
            vertex: v,
            ..Visit::default()
        })
    }

    /// Creates a representation whose tour is a single visit.
    pub(crate) fn add_vertex(&mut self, higher: VId) -> VId {
        let v = match self.free_vertices.pop() {
            Some(v) => v,
            None => {
                self.vertices.push(LevelVertex::VACANT);
                (self.vertices.len() - 1) as VId
            }
        };
        let visit = self.alloc_visit(v);
        *self.vertex_mut(v) = LevelVertex {
            higher,
            visit,
            ..LevelVertex::VACANT
        };
        v
    }

    /// Returns the representation one level down, creating it if needed.
    pub(crate) fn ensure_lower(&mut self, v: VId) -> VId {
        let lower = self.vertex(v).lower;
        if lower != NIL {
            return lower;
        }
        let lower = self.add_vertex(v);
        self.vertex_mut(v).lower = lower;
        lower
    }

    /// Frees a representation slot without touching its tour.
    pub(crate) fn free_vertex_slot(&mut self, v: VId) {
        *self.vertex_mut(v) = LevelVertex::VACANT;
        self.free_vertices.push(v);
    }

    /// Frees `v` and every representation below it. Each of them must be
    /// alone in its tour.
    pub(crate) fn release_chain(&mut self, mut v: VId) {
        while v != NIL {
            let LevelVertex { lower, visit, .. } = *self.vertex(v);
            debug_assert_eq!(self.tree.size(self.tree.root(visit)), 1);
            self.tree.release(visit);
            self.free_vertex_slot(v);
            v = lower;
        }
    }

    pub(crate) fn root(&self, v: VId) -> Id {
        self.tree.root(self.vertex(v).visit)
    }

    pub(crate) fn summary(&self, root: Id) -> &Summary<T> {
        self.tree.agg_ref(root)
    }

    /// Copies the adjacency state of `v` into its canonical visit and
    /// propagates the change toward the root.
    pub(crate) fn refresh(&mut self, v: VId) {
        let LevelVertex {
            visit,
            graph_head,
            forest_head,
            ..
        } = *self.vertex(v);
        let key = self.tree.key_mut(visit);
        key.has_graph_edge = graph_head != NIL;
        key.has_forest_edge = forest_head != NIL;
        self.tree.update(visit);
    }

    /// Makes `node`, another visit of `v`, the canonical one.
    fn move_visit(&mut self, v: VId, node: Id) {
        let old = self.vertex(v).visit;
        if old == node {
            return;
        }
        debug_assert_eq!(self.tree.key(node).vertex, v);
        let moved = std::mem::take(self.tree.key_mut(old));
        self.tree.key_mut(old).vertex = v;
        self.tree.update(old);
        *self.tree.key_mut(node) = moved;
        self.tree.update(node);
        self.vertex_mut(v).visit = node;
    }

    pub(crate) fn augmentation(&self, v: VId) -> Option<&T> {
        self.tree.key(self.vertex(v).visit).augmentation.as_ref()
    }

    pub(crate) fn set_augmentation(&mut self, v: VId, value: Option<T>) -> Option<T> {
        let visit = self.vertex(v).visit;
        let old = std::mem::replace(&mut self.tree.key_mut(visit).augmentation, value);
        self.tree.update(visit);
        old
    }

    fn alloc_tour_edge(&mut self, visit: [Id; 2]) -> TId {
        let edge = TourEdge { visit, higher: NIL };
        match self.free_tour_edges.pop() {
            Some(t) => {
                *self.tour_edge_mut(t) = edge;
                t
            }
            None => {
                self.tour_edges.push(edge);
                (self.tour_edges.len() - 1) as TId
            }
        }
    }

    pub(crate) fn release_tour_edge(&mut self, t: TId) {
        *self.tour_edge_mut(t) = TourEdge {
            visit: [NIL, NIL],
            higher: NIL,
        };
        self.free_tour_edges.push(t);
    }

    /// Links the trees of `v1` and `v2`, which must differ.
    ///
    /// The tour of `v2` is rotated to start and end at `v2`, then spliced in
    /// right before the canonical visit of `v1` behind a fresh `v1` visit.
    pub(crate) fn add_forest_edge(&mut self, v1: VId, v2: VId) -> TId {
        debug_assert_ne!(self.root(v1), self.root(v2));
        let mut root2 = self.root(v2);
        let max = self.tree.max(root2);
        let last = if self.tree.key(max).vertex == v2 {
            max
        } else {
            let tail = self.tree.key(max).vertex;
            if self.vertex(tail).visit == max {
                let min = self.tree.min(root2);
                self.move_visit(tail, min);
            }
            self.tree.remove(max);
            self.tree.release(max);
            let pivot = self.vertex(v2).visit;
            let (before, after) = self.tree.split(pivot);
            root2 = self.tree.concatenate(after, before);
            let last = self.alloc_visit(v2);
            root2 = self.tree.join(root2, last, NIL);
            last
        };

        let pivot = self.vertex(v1).visit;
        let (before, after) = self.tree.split(pivot);
        let first = self.alloc_visit(v1);
        let left = self.tree.join(before, first, root2);
        self.tree.concatenate(left, after);
        self.alloc_tour_edge([first, last])
    }

    /// Cuts a forest edge, leaving two tours, and frees the tour edge.
    pub(crate) fn remove_forest_edge(&mut self, t: TId) {
        let [a, b] = self.tour_edge(t).visit;
        let (first, second) = match self.tree.compare_order(a, b) {
            Ordering::Less => (a, b),
            _ => (b, a),
        };
        // `first` and the visit after `second` belong to the same vertex and
        // end up adjacent once the subtree tour is cut out; `first` goes.
        let after_second = self.tree.successor(second);
        debug_assert_ne!(after_second, NIL);
        let u = self.tree.key(first).vertex;
        if self.vertex(u).visit == first {
            self.move_visit(u, after_second);
        }
        let (before, _) = self.tree.split(first);
        let (_, after) = self.tree.split(after_second);
        self.tree.concatenate(before, after);
        self.tree.remove(first);
        self.tree.release(first);
        self.release_tour_edge(t);
    }
}
