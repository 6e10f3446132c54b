use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use rb_tree::NIL;

use crate::adjacency::List;
use crate::error::ValidationError;
use crate::euler_tour::VId;
use crate::graph::DynamicConnectivity;

impl<V, T> DynamicConnectivity<V, T>
where
    V: Hash + Eq + Clone,
    T: Clone + PartialEq,
{
    fn bottom(&self, mut v: VId) -> VId {
        while self.forest.vertex(v).lower != NIL {
            v = self.forest.vertex(v).lower;
        }
        v
    }

    fn top_vertices(&self) -> Vec<VId> {
        self.vertex_info.values().map(|info| info.vertex).collect()
    }

    /// Shrinks the number of levels to fit the current vertex count by
    /// folding the levels right below the top into it.
    pub(crate) fn rebuild(&mut self) {
        if self.vertex_info.is_empty() {
            self.max_log_vertex_count = 0;
            self.forest.clear();
            self.edges.clear();
            return;
        }
        let len = self.vertex_info.len();
        let mut delete_count = 0usize;
        while self.max_log_vertex_count > 0 && 2 * len <= 1 << self.max_log_vertex_count {
            self.max_log_vertex_count -= 1;
            delete_count += 1;
        }
        if delete_count == 0 {
            return;
        }

        // Drop the tour edges of the folded levels from every chain.
        let forest_edges: Vec<_> = self
            .edges
            .live()
            .filter(|&e| self.edges.get(e).tour_edge != NIL)
            .collect();
        let mut chain = Vec::new();
        for e in forest_edges {
            chain.clear();
            let mut t = self.edges.get(e).tour_edge;
            while t != NIL {
                chain.push(t);
                t = self.forest.tour_edge(t).higher;
            }
            let top = chain.len() - 1;
            let keep_below = top - delete_count.min(top);
            for &t in &chain[keep_below..top] {
                self.forest.release_tour_edge(t);
            }
            let mut higher = chain[top];
            for &t in chain[..keep_below].iter().rev() {
                self.forest.tour_edge_mut(t).higher = higher;
                higher = t;
            }
            self.edges.get_mut(e).tour_edge = higher;
        }

        let mut doomed_roots = Vec::new();
        let mut doomed_vertices = Vec::new();
        for top in self.top_vertices() {
            let mut lower = self.forest.vertex(top).lower;
            for _ in 0..delete_count {
                if lower == NIL {
                    break;
                }
                self.edges.collapse(&mut self.forest.vertices, lower, top);
                doomed_roots.push(self.forest.root(lower));
                doomed_vertices.push(lower);
                lower = self.forest.vertex(lower).lower;
            }
            self.forest.vertex_mut(top).lower = lower;
            if lower != NIL {
                self.forest.vertex_mut(lower).higher = top;
            }
            self.forest.refresh(top);
        }

        doomed_roots.sort_unstable();
        doomed_roots.dedup();
        for root in doomed_roots {
            self.forest.tree.release_tree(root);
        }
        for v in doomed_vertices {
            self.forest.free_vertex_slot(v);
        }
        log::debug!(
            "rebuilt levels: {len} vertices, folded {delete_count} levels, top level now {}",
            self.max_log_vertex_count
        );
    }

    /// Pushes every edge as low as the level invariants allow so that later
    /// deletions scan fewer edges. Queries are unaffected. Takes
    /// `O(V log² V + E log V log log V)` time.
    pub fn optimize(&mut self) {
        log::debug!(
            "optimizing {} vertices and {} edges",
            self.vertex_info.len(),
            self.edge_count
        );
        self.rebuild();
        self.optimize_forest_edges();
        self.optimize_graph_edges();
    }

    /// Moves each forest edge to the lowest level at which the two trees it
    /// joins still fit the size bound of that level.
    fn optimize_forest_edges(&mut self) {
        for top in self.top_vertices() {
            let mut v = self.bottom(top);
            let mut level = self.max_log_vertex_count;
            let mut x = v;
            while x != top {
                x = self.forest.vertex(x).higher;
                level = level.saturating_sub(1);
            }

            while v != NIL {
                let mut e = self.forest.vertex(v).forest_head;
                while e != NIL {
                    let next = self.edges.next_at(e, v);
                    if self.edges.end(e, v) != 0 {
                        e = next;
                        continue;
                    }
                    let w = self.edges.get(e).vertex[1];
                    let (mut lv, mut lw) = (v, w);
                    let mut lower_level = level.saturating_sub(1);
                    while lower_level > 0 {
                        let tour_size = |x: VId| match self.forest.vertex(x).lower {
                            NIL => 1,
                            lower => self.forest.tree.size(self.forest.root(lower)),
                        };
                        let combined = 1 + tour_size(lv) + tour_size(lw);
                        // `n` vertices take `2n - 1` visits.
                        if combined > 2 * (1usize << lower_level) - 1 {
                            break;
                        }
                        lv = self.forest.ensure_lower(lv);
                        lw = self.forest.ensure_lower(lw);
                        let t = self.forest.add_forest_edge(lv, lw);
                        let higher = self.edges.get(e).tour_edge;
                        self.forest.tour_edge_mut(t).higher = higher;
                        self.edges.get_mut(e).tour_edge = t;
                        lower_level -= 1;
                    }
                    if lv != v {
                        self.edges
                            .relink(&mut self.forest.vertices, e, [lv, lw], List::Forest);
                        for x in [v, w, lv, lw] {
                            self.forest.refresh(x);
                        }
                    }
                    e = next;
                }
                v = self.forest.vertex(v).higher;
                level += 1;
            }
        }
    }

    /// Moves each non-forest edge to the lowest level at which its endpoints
    /// are connected, found by binary search over the levels both endpoints
    /// reach.
    fn optimize_graph_edges(&mut self) {
        for top in self.top_vertices() {
            let mut v = self.bottom(top);
            while v != NIL {
                let mut e = self.forest.vertex(v).graph_head;
                while e != NIL {
                    let next = self.edges.next_at(e, v);
                    if self.edges.end(e, v) != 0 {
                        e = next;
                        continue;
                    }
                    let w = self.edges.get(e).vertex[1];
                    let mut max_down = 0usize;
                    let (mut x, mut y) = (self.forest.vertex(v).lower, self.forest.vertex(w).lower);
                    while x != NIL && y != NIL {
                        max_down += 1;
                        x = self.forest.vertex(x).lower;
                        y = self.forest.vertex(y).lower;
                    }
                    let (mut lv, mut lw) = (v, w);
                    while max_down > 0 {
                        let down = max_down.div_ceil(2);
                        let (mut x, mut y) = (lv, lw);
                        for _ in 0..down {
                            x = self.forest.vertex(x).lower;
                            y = self.forest.vertex(y).lower;
                        }
                        if self.forest.root(x) == self.forest.root(y) {
                            lv = x;
                            lw = y;
                            max_down -= down;
                        } else {
                            max_down = down - 1;
                        }
                    }
                    if lv != v {
                        self.edges
                            .relink(&mut self.forest.vertices, e, [lv, lw], List::Graph);
                        for x in [v, w, lv, lw] {
                            self.forest.refresh(x);
                        }
                    }
                    e = next;
                }
                v = self.forest.vertex(v).higher;
            }
        }
        log::debug!("optimize finished at top level {}", self.max_log_vertex_count);
    }

    /// Re-derives every structural invariant from scratch. Costs
    /// `O((V log V + E) log V)`; meant for tests.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut roots = HashSet::new();
        // Representation -> (top representation, depth below it).
        let mut placement: HashMap<VId, (VId, usize)> = HashMap::new();
        for info in self.vertex_info.values() {
            let top = info.vertex;
            if self.forest.vertex(top).higher != NIL {
                return Err(ValidationError::LevelLink);
            }
            let mut v = top;
            let mut depth = 0;
            loop {
                let lv = self.forest.vertex(v);
                if lv.visit == NIL || self.forest.tree.key(lv.visit).vertex != v {
                    return Err(ValidationError::CanonicalVisit);
                }
                let key = self.forest.tree.key(lv.visit);
                if key.has_graph_edge != (lv.graph_head != NIL)
                    || key.has_forest_edge != (lv.forest_head != NIL)
                    || (depth > 0 && key.augmentation.is_some())
                {
                    return Err(ValidationError::CanonicalVisit);
                }
                let root = self.forest.root(v);
                let level = (self.max_log_vertex_count as usize)
                    .checked_sub(depth)
                    .ok_or(ValidationError::LevelDepth { depth })?;
                let vertices = (self.forest.tree.size(root) + 1) / 2;
                if vertices > 1 << level {
                    return Err(ValidationError::LevelSize { vertices, level });
                }
                roots.insert(root);
                placement.insert(v, (top, depth));
                if lv.lower == NIL {
                    break;
                }
                if self.forest.vertex(lv.lower).higher != v {
                    return Err(ValidationError::LevelLink);
                }
                v = lv.lower;
                depth += 1;
            }
        }
        if placement.len() != self.forest.vertex_slots() {
            return Err(ValidationError::LevelLink);
        }

        let mut visits = 0;
        for &root in &roots {
            self.forest.tree.validate(root)?;
            let size = self.forest.tree.size(root);
            let mut canonical = 0;
            for x in self.forest.tree.iter(root) {
                let key = self.forest.tree.key(x);
                if !placement.contains_key(&key.vertex) {
                    return Err(ValidationError::CanonicalVisit);
                }
                if self.forest.vertex(key.vertex).visit == x {
                    canonical += 1;
                } else if key.has_graph_edge || key.has_forest_edge || key.augmentation.is_some() {
                    return Err(ValidationError::CanonicalVisit);
                }
            }
            if size + 1 != 2 * canonical {
                return Err(ValidationError::TourSize {
                    visits: size,
                    vertices: canonical,
                });
            }
            visits += size;
        }
        if visits != self.forest.tree.len() {
            return Err(ValidationError::TourSize {
                visits: self.forest.tree.len(),
                vertices: placement.len(),
            });
        }

        let mut recorded = 0;
        for (key, info) in &self.vertex_info {
            for (other, &e) in &info.edges {
                recorded += 1;
                let other_info = self.vertex_info.get(other).ok_or(ValidationError::EdgeList)?;
                if other_info.edges.get(key) != Some(&e) {
                    return Err(ValidationError::EdgeList);
                }
                let [a, b] = self.edges.get(e).vertex;
                let (Some(&(top_a, da)), Some(&(top_b, db))) = (placement.get(&a), placement.get(&b))
                else {
                    return Err(ValidationError::EdgeList);
                };
                let tops = [info.vertex, other_info.vertex];
                if da != db || !(tops == [top_a, top_b] || tops == [top_b, top_a]) {
                    return Err(ValidationError::EdgeList);
                }
                let mut t = self.edges.get(e).tour_edge;
                if t == NIL {
                    if self.forest.root(a) != self.forest.root(b) {
                        return Err(ValidationError::GraphEdgeSpansTrees);
                    }
                    continue;
                }
                let (mut x, mut y) = (a, b);
                while t != NIL {
                    let ends = self.forest.tour_edge(t).visit.map(|n| self.forest.tree.key(n).vertex);
                    if !(ends == [x, y] || ends == [y, x]) {
                        return Err(ValidationError::TourChain);
                    }
                    t = self.forest.tour_edge(t).higher;
                    x = self.forest.vertex(x).higher;
                    y = self.forest.vertex(y).higher;
                }
                if x != NIL || y != NIL {
                    return Err(ValidationError::TourChain);
                }
            }
        }
        if recorded % 2 != 0 || recorded / 2 != self.edge_count {
            return Err(ValidationError::EdgeCount {
                stored: self.edge_count,
                actual: recorded / 2,
            });
        }

        let mut listed = 0;
        for &v in placement.keys() {
            let lv = self.forest.vertex(v);
            for (head, list) in [(lv.graph_head, List::Graph), (lv.forest_head, List::Forest)] {
                let mut e = head;
                while e != NIL {
                    let is_forest = self.edges.get(e).tour_edge != NIL;
                    if is_forest != (list == List::Forest) {
                        return Err(ValidationError::EdgeList);
                    }
                    listed += 1;
                    e = self.edges.next_at(e, v);
                }
            }
        }
        if listed != 2 * self.edge_count {
            return Err(ValidationError::EdgeList);
        }
        Ok(())
    }
}
