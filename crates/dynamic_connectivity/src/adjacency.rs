use rb_tree::NIL;

use crate::euler_tour::{LevelVertex, TId, VId};

/// Index of a graph edge.
pub(crate) type EId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum List {
    Graph,
    Forest,
}

/// An undirected edge, threaded through one adjacency list of each endpoint
/// at the level the edge currently lives on.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ConnEdge {
    pub(crate) vertex: [VId; 2],
    prev: [EId; 2],
    next: [EId; 2],
    /// Lowest link of the tour edge chain, `NIL` for a non-forest edge.
    pub(crate) tour_edge: TId,
}

impl ConnEdge {
    const VACANT: Self = Self {
        vertex: [NIL, NIL],
        prev: [NIL, NIL],
        next: [NIL, NIL],
        tour_edge: NIL,
    };
}

fn head_mut(v: &mut LevelVertex, list: List) -> &mut EId {
    match list {
        List::Graph => &mut v.graph_head,
        List::Forest => &mut v.forest_head,
    }
}

#[derive(Default)]
pub(crate) struct EdgeArena {
    edges: Vec<ConnEdge>,
    free: Vec<EId>,
}

impl EdgeArena {
    pub(crate) fn clear(&mut self) {
        self.edges.clear();
        self.free.clear();
    }

    #[inline(always)]
    pub(crate) fn get(&self, e: EId) -> &ConnEdge {
        &self.edges[e as usize]
    }

    #[inline(always)]
    pub(crate) fn get_mut(&mut self, e: EId) -> &mut ConnEdge {
        &mut self.edges[e as usize]
    }

    pub(crate) fn alloc(&mut self, u: VId, v: VId) -> EId {
        let edge = ConnEdge {
            vertex: [u, v],
            ..ConnEdge::VACANT
        };
        match self.free.pop() {
            Some(e) => {
                *self.get_mut(e) = edge;
                e
            }
            None => {
                self.edges.push(edge);
                (self.edges.len() - 1) as EId
            }
        }
    }

    pub(crate) fn release(&mut self, e: EId) {
        *self.get_mut(e) = ConnEdge::VACANT;
        self.free.push(e);
    }

    /// Which end of `e` sits at `v`.
    #[inline(always)]
    pub(crate) fn end(&self, e: EId, v: VId) -> usize {
        let vertex = self.get(e).vertex;
        debug_assert!(vertex[0] == v || vertex[1] == v);
        usize::from(vertex[0] != v)
    }

    /// The endpoint of `e` opposite to `v`.
    pub(crate) fn other(&self, e: EId, v: VId) -> VId {
        self.get(e).vertex[1 - self.end(e, v)]
    }

    /// Following edge in the adjacency list of `v`.
    pub(crate) fn next_at(&self, e: EId, v: VId) -> EId {
        self.get(e).next[self.end(e, v)]
    }

    fn link_end(&mut self, vertices: &mut [LevelVertex], e: EId, end: usize, list: List) {
        let v = self.get(e).vertex[end];
        let head = head_mut(&mut vertices[v as usize], list);
        let old = std::mem::replace(head, e);
        if old != NIL {
            let old_end = self.end(old, v);
            self.get_mut(old).prev[old_end] = e;
        }
        let edge = self.get_mut(e);
        edge.prev[end] = NIL;
        edge.next[end] = old;
    }

    /// Pushes `e` onto the front of `list` at both endpoints.
    pub(crate) fn link(&mut self, vertices: &mut [LevelVertex], e: EId, list: List) {
        self.link_end(vertices, e, 0, list);
        self.link_end(vertices, e, 1, list);
    }

    fn unlink_end(&mut self, vertices: &mut [LevelVertex], e: EId, end: usize) {
        let ConnEdge {
            vertex, prev, next, ..
        } = *self.get(e);
        let v = vertex[end];
        if prev[end] != NIL {
            let prev_end = self.end(prev[end], v);
            self.get_mut(prev[end]).next[prev_end] = next[end];
        } else {
            let lv = &mut vertices[v as usize];
            if lv.graph_head == e {
                lv.graph_head = next[end];
            } else {
                debug_assert_eq!(lv.forest_head, e);
                lv.forest_head = next[end];
            }
        }
        if next[end] != NIL {
            let next_end = self.end(next[end], v);
            self.get_mut(next[end]).prev[next_end] = prev[end];
        }
        let edge = self.get_mut(e);
        edge.prev[end] = NIL;
        edge.next[end] = NIL;
    }

    /// Takes `e` out of whichever list holds it at both endpoints.
    pub(crate) fn unlink(&mut self, vertices: &mut [LevelVertex], e: EId) {
        self.unlink_end(vertices, e, 0);
        self.unlink_end(vertices, e, 1);
    }

    /// Moves `e` to a new pair of endpoints (same order) and list.
    pub(crate) fn relink(
        &mut self,
        vertices: &mut [LevelVertex],
        e: EId,
        endpoints: [VId; 2],
        list: List,
    ) {
        self.unlink(vertices, e);
        self.get_mut(e).vertex = endpoints;
        self.link(vertices, e, list);
    }

    /// Moves both adjacency lists of `lower` onto `upper`, rewriting the
    /// edge endpoints that pointed at `lower`.
    pub(crate) fn collapse(&mut self, vertices: &mut [LevelVertex], lower: VId, upper: VId) {
        for list in [List::Graph, List::Forest] {
            loop {
                let e = *head_mut(&mut vertices[lower as usize], list);
                if e == NIL {
                    break;
                }
                let end = self.end(e, lower);
                self.unlink_end(vertices, e, end);
                self.get_mut(e).vertex[end] = upper;
                self.link_end(vertices, e, end, list);
            }
        }
    }

    /// Ids of every edge currently allocated.
    pub(crate) fn live(&self) -> impl Iterator<Item = EId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.vertex[0] != NIL)
            .map(|(e, _)| e as EId)
    }
}
