//! Arena-backed red-black trees with parent links, order statistics and a
//! pluggable subtree aggregate.

mod join;
pub mod policy;
mod tree;
mod validate;

pub use policy::{Augment, Max, Plain, Sum};
pub use tree::{Id, Iter, NIL, RbForest};
pub use validate::InvariantViolation;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::cmp::Ordering;

    fn keys_of<P: Augment<Key = i64>>(f: &RbForest<P>, root: Id) -> Vec<i64> {
        f.iter(root).map(|x| *f.key(x)).collect()
    }

    #[test]
    fn insert_and_select() {
        let mut f = RbForest::new(Sum);
        let mut root = NIL;
        for (i, v) in [5, 1, 4].into_iter().enumerate() {
            let x = f.alloc(v);
            root = f.insert_at(root, i, x);
        }
        let x = f.alloc(9);
        root = f.insert_at(root, 1, x);
        assert_eq!(keys_of(&f, root), vec![5, 9, 1, 4]);
        assert_eq!(f.agg(root), 19);
        assert_eq!(*f.key(f.select(root, 2)), 1);
        assert_eq!(f.select(root, 4), NIL);
        assert_eq!(f.rank(x), 1);
        assert_eq!(f.len(), 4);
        f.validate(root).unwrap();
    }

    #[test]
    fn random_positional_ops_match_vec() {
        let mut rng = StdRng::seed_from_u64(0x5EED_2026);
        let mut f = RbForest::new(Sum);
        let mut root = NIL;
        let mut ids: Vec<Id> = Vec::new();
        let mut naive: Vec<i64> = Vec::new();

        for step in 0..4_000 {
            let op = rng.random_range(0..6);
            match op {
                0 | 1 => {
                    let i = rng.random_range(0..=naive.len());
                    let v = rng.random_range(-1_000..=1_000);
                    let x = f.alloc(v);
                    root = f.insert_at(root, i, x);
                    ids.insert(i, x);
                    naive.insert(i, v);
                }
                2 if !naive.is_empty() => {
                    let i = rng.random_range(0..naive.len());
                    let x = ids.remove(i);
                    let v = naive.remove(i);
                    root = f.remove(x);
                    assert_eq!(f.parent(x), NIL);
                    assert_eq!(f.release(x), v);
                }
                3 if !naive.is_empty() => {
                    let i = rng.random_range(0..naive.len());
                    let (l, r) = f.split(ids[i]);
                    assert_eq!(f.size(l), i);
                    assert_eq!(f.min(r), ids[i]);
                    assert_eq!(f.agg(l), naive[..i].iter().sum::<i64>());
                    f.validate(l).unwrap();
                    f.validate(r).unwrap();
                    root = f.concatenate(l, r);
                }
                4 if !naive.is_empty() => {
                    let i = rng.random_range(0..naive.len());
                    let v = rng.random_range(-1_000..=1_000);
                    *f.key_mut(ids[i]) = v;
                    f.update(ids[i]);
                    naive[i] = v;
                }
                5 if naive.len() >= 2 => {
                    let i = rng.random_range(0..naive.len());
                    let j = rng.random_range(0..naive.len());
                    assert_eq!(f.compare_order(ids[i], ids[j]), i.cmp(&j));
                    assert_eq!(f.rank(ids[j]), j);
                    assert_eq!(f.select(root, i), ids[i]);
                }
                _ => {}
            }
            assert_eq!(f.size(root), naive.len());
            assert_eq!(f.agg(root), naive.iter().sum::<i64>());
            if step % 64 == 0 {
                f.validate(root).unwrap();
                assert_eq!(keys_of(&f, root), naive);
            }
        }
        f.validate(root).unwrap();
        assert_eq!(keys_of(&f, root), naive);
    }

    #[test]
    fn random_split_join_across_many_trees() {
        let mut rng = StdRng::seed_from_u64(0x5EED_2026);
        let mut f = RbForest::new(Max);
        let mut trees: Vec<(Id, Vec<Id>)> = Vec::new();
        for _ in 0..24 {
            let n = rng.random_range(0..40);
            let ids: Vec<Id> = (0..n).map(|_| f.alloc(rng.random_range(0..10_000))).collect();
            let root = f.build(&ids);
            f.validate(root).unwrap();
            trees.push((root, ids));
        }

        for _ in 0..3_000 {
            let a = rng.random_range(0..trees.len());
            match rng.random_range(0..3) {
                0 => {
                    let (root, ids) = trees.swap_remove(a);
                    if ids.is_empty() {
                        trees.push((root, ids));
                        continue;
                    }
                    let i = rng.random_range(0..ids.len());
                    let (l, r) = f.split(ids[i]);
                    f.validate(l).unwrap();
                    f.validate(r).unwrap();
                    trees.push((l, ids[..i].to_vec()));
                    trees.push((r, ids[i..].to_vec()));
                }
                1 if trees.len() >= 2 => {
                    let (ra, mut ia) = trees.swap_remove(a);
                    let b = rng.random_range(0..trees.len());
                    let (rb, ib) = trees.swap_remove(b);
                    let pivot = f.alloc(rng.random_range(0..10_000));
                    let root = f.join(ra, pivot, rb);
                    ia.push(pivot);
                    ia.extend(ib);
                    trees.push((root, ia));
                }
                _ if trees.len() >= 2 => {
                    let (ra, mut ia) = trees.swap_remove(a);
                    let b = rng.random_range(0..trees.len());
                    let (rb, ib) = trees.swap_remove(b);
                    let root = f.concatenate(ra, rb);
                    ia.extend(ib);
                    trees.push((root, ia));
                }
                _ => {}
            }
            let (root, ids) = trees.last().unwrap();
            f.validate(*root).unwrap();
            assert_eq!(f.iter(*root).collect::<Vec<_>>(), *ids);
            let max = ids.iter().map(|&x| *f.key(x)).max();
            assert_eq!(f.agg(*root), max);
        }
        for (root, ids) in &trees {
            f.validate(*root).unwrap();
            assert_eq!(f.size(*root), ids.len());
            if let Some(&first) = ids.first() {
                assert_eq!(f.root(first), *root);
            }
        }
    }

    #[test]
    fn insert_by_orders_keys_and_rejects_duplicates() {
        let mut rng = StdRng::seed_from_u64(0x5EED_2026);
        let mut f = RbForest::new(Plain::<i64>::new());
        let mut root = NIL;
        let mut naive: Vec<i64> = Vec::new();
        for _ in 0..2_000 {
            let v = rng.random_range(0..500);
            let x = f.alloc(v);
            let (r, inserted) = f.insert_by(root, x, false, |a, b| a.cmp(b));
            root = r;
            if inserted {
                let pos = naive.partition_point(|&y| y < v);
                naive.insert(pos, v);
            } else {
                assert!(naive.binary_search(&v).is_ok());
                f.release(x);
            }
        }
        f.validate(root).unwrap();
        f.validate_order(root, |a, b| a.cmp(b)).unwrap();
        assert_eq!(keys_of(&f, root), naive);

        let dup = f.alloc(naive[0]);
        let (root, inserted) = f.insert_by(root, dup, true, |a, b| a.cmp(b));
        assert!(inserted);
        assert_eq!(f.size(root), naive.len() + 1);
        assert_eq!(f.rank(dup), 1);
    }

    #[test]
    fn update_stops_when_aggregate_is_unchanged() {
        let mut f = RbForest::new(Max);
        let ids: Vec<Id> = (0..63).map(|v| f.alloc(v)).collect();
        let root = f.build(&ids);
        *f.key_mut(ids[0]) = -5;
        f.update(ids[0]);
        assert_eq!(f.agg(root), Some(62));
        *f.key_mut(ids[10]) = 1_000;
        f.update(ids[10]);
        assert_eq!(f.agg(root), Some(1_000));
        f.validate(root).unwrap();
    }

    #[test]
    fn lca_and_order_on_separate_trees() {
        let mut f = RbForest::new(Sum);
        let a: Vec<Id> = (0..7).map(|v| f.alloc(v)).collect();
        let b: Vec<Id> = (0..7).map(|v| f.alloc(v)).collect();
        let ra = f.build(&a);
        f.build(&b);
        assert_eq!(f.lca(a[0], a[6]), Some(ra));
        assert_eq!(f.lca(a[0], b[0]), None);
        assert_eq!(f.lca(a[2], a[2]), Some(a[2]));
        assert_eq!(f.compare_order(a[3], a[1]), Ordering::Greater);
        assert_eq!(f.compare_order(a[4], a[5]), Ordering::Less);
    }

    #[test]
    fn release_tree_recycles_slots() {
        let mut f = RbForest::new(Sum);
        let ids: Vec<Id> = (0..10).map(|v| f.alloc(v)).collect();
        let root = f.build(&ids);
        f.release_tree(root);
        assert!(f.is_empty());
        let x = f.alloc(3);
        assert!(ids.contains(&x));
        f.clear();
        assert!(f.is_empty());
    }

    #[test]
    fn split_at_root_leaves_black_roots() {
        let mut f = RbForest::new(Sum);
        let mut root = NIL;
        for (i, v) in [1, 2, 3].into_iter().enumerate() {
            let x = f.alloc(v);
            root = f.insert_at(root, i, x);
        }
        assert!(f.is_red(f.left(root)));
        let (l, r) = f.split(root);
        assert!(!f.is_red(l));
        assert!(!f.is_red(r));
        f.validate(l).unwrap();
        f.validate(r).unwrap();
        assert_eq!(keys_of(&f, l), vec![1]);
        assert_eq!(keys_of(&f, r), vec![2, 3]);
    }

    #[test]
    fn validate_reports_corruption() {
        let mut f = RbForest::new(Sum);
        let ids: Vec<Id> = (0..15).map(|v| f.alloc(v)).collect();
        let root = f.build(&ids);
        f.validate(root).unwrap();

        f.node_mut(root).red = true;
        assert_eq!(f.validate(root), Err(InvariantViolation::RedRoot(root)));
        f.node_mut(root).red = false;

        f.node_mut(ids[0]).key = 100;
        assert_eq!(f.validate(root), Err(InvariantViolation::Augmentation(ids[0])));
        f.update(ids[0]);
        f.validate(root).unwrap();
        assert_eq!(
            f.validate_order(root, |a, b| a.cmp(b)),
            Err(InvariantViolation::Order(ids[0], ids[1]))
        );
    }
}
