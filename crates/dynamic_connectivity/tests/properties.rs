//! Property tests: connectivity answers against a from-scratch BFS.

use std::collections::{BTreeSet, VecDeque};

use dynamic_connectivity::{ConnectivityError, DynamicConnectivity};
use proptest::prelude::*;

const N: usize = 12;

#[derive(Clone, Debug)]
enum Op {
    Add(usize, usize),
    Remove(usize, usize),
    Optimize,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (0..N, 0..N).prop_map(|(u, v)| Op::Add(u, v)),
        4 => (0..N, 0..N).prop_map(|(u, v)| Op::Remove(u, v)),
        1 => Just(Op::Optimize),
    ]
}

fn labels(adj: &[BTreeSet<usize>]) -> Vec<usize> {
    let mut label = vec![usize::MAX; adj.len()];
    for s in 0..adj.len() {
        if label[s] != usize::MAX {
            continue;
        }
        label[s] = s;
        let mut queue = VecDeque::from([s]);
        while let Some(u) = queue.pop_front() {
            for &v in &adj[u] {
                if label[v] == usize::MAX {
                    label[v] = s;
                    queue.push_back(v);
                }
            }
        }
    }
    label
}

/// Applies `ops` to both the graph and a plain adjacency set.
fn replay(ops: &[Op]) -> (DynamicConnectivity<usize>, Vec<BTreeSet<usize>>) {
    let mut g = DynamicConnectivity::new();
    let mut adj = vec![BTreeSet::new(); N];
    for op in ops {
        match *op {
            Op::Add(u, v) if u != v => {
                let fresh = adj[u].insert(v);
                adj[v].insert(u);
                assert_eq!(g.add_edge(u, v).unwrap(), fresh);
            }
            Op::Remove(u, v) if u != v => {
                let present = adj[u].remove(&v);
                adj[v].remove(&u);
                assert_eq!(g.remove_edge(&u, &v).unwrap(), present);
            }
            Op::Add(u, v) => {
                assert_eq!(g.add_edge(u, v), Err(ConnectivityError::SelfLoop));
            }
            Op::Remove(u, v) => {
                assert_eq!(g.remove_edge(&u, &v), Err(ConnectivityError::SelfLoop));
            }
            Op::Optimize => g.optimize(),
        }
    }
    (g, adj)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn connected_matches_bfs(ops in proptest::collection::vec(op_strategy(), 0..120)) {
        let (g, adj) = replay(&ops);
        prop_assert!(g.validate().is_ok());
        let label = labels(&adj);
        for u in 0..N {
            for v in 0..N {
                prop_assert_eq!(g.connected(&u, &v), label[u] == label[v]);
            }
        }
    }

    #[test]
    fn connected_is_an_equivalence(ops in proptest::collection::vec(op_strategy(), 0..80)) {
        let (g, _) = replay(&ops);
        for x in 0..N {
            prop_assert!(g.connected(&x, &x));
            for y in 0..N {
                prop_assert_eq!(g.connected(&x, &y), g.connected(&y, &x));
                for z in 0..N {
                    if g.connected(&x, &y) && g.connected(&y, &z) {
                        prop_assert!(g.connected(&x, &z));
                    }
                }
            }
        }
    }

    #[test]
    fn add_then_remove_restores_connectivity(
        ops in proptest::collection::vec(op_strategy(), 0..80),
        u in 0..N,
        v in 0..N,
    ) {
        prop_assume!(u != v);
        let (mut g, adj) = replay(&ops);
        prop_assume!(!adj[u].contains(&v));
        let before = g.connected(&u, &v);
        prop_assert!(g.add_edge(u, v).unwrap());
        prop_assert!(g.connected(&u, &v));
        prop_assert!(g.remove_edge(&u, &v).unwrap());
        prop_assert_eq!(g.connected(&u, &v), before);
        prop_assert!(!g.remove_edge(&u, &v).unwrap());
        prop_assert!(g.validate().is_ok());
    }

    #[test]
    fn component_max_matches_bfs_fold(
        ops in proptest::collection::vec(op_strategy(), 0..100),
        values in proptest::collection::vec(proptest::option::of(0u32..1_000), N),
    ) {
        let (plain, adj) = replay(&ops);
        let mut g = DynamicConnectivity::with_augmentation(|a: &u32, b: &u32| *a.max(b));
        for u in 0..N {
            for &v in adj[u].range(u + 1..) {
                g.add_edge(u, v).unwrap();
            }
            if let Some(x) = values[u] {
                g.set_vertex_augmentation(u, x).unwrap();
            }
        }
        prop_assert_eq!(g.edge_count(), plain.edge_count());
        let label = labels(&adj);
        for u in 0..N {
            let expected = (0..N)
                .filter(|&v| label[v] == label[u])
                .filter_map(|v| values[v])
                .max();
            prop_assert_eq!(g.get_component_augmentation(&u).unwrap(), expected);
            prop_assert_eq!(g.component_has_augmentation(&u).unwrap(), expected.is_some());
        }
    }
}
