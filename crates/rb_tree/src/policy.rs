use std::marker::PhantomData;

/// Derived value maintained for every subtree.
///
/// `agg_merge` must be a pure function of its arguments: the tree stops
/// propagating a change upward as soon as a node's recomputed aggregate
/// compares equal to the stored one.
pub trait Augment {
    type Key: Default;
    type Agg: Clone + PartialEq;

    fn agg_unit(&self) -> Self::Agg;
    fn agg_merge(&self, left: &Self::Agg, key: &Self::Key, right: &Self::Agg) -> Self::Agg;
}

/// Order-statistic tree with no aggregate beyond subtree size.
pub struct Plain<K>(PhantomData<K>);

impl<K> Plain<K> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K> Default for Plain<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Default> Augment for Plain<K> {
    type Key = K;
    type Agg = ();

    fn agg_unit(&self) -> Self::Agg {}

    fn agg_merge(&self, _left: &Self::Agg, _key: &Self::Key, _right: &Self::Agg) -> Self::Agg {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

impl Augment for Sum {
    type Key = i64;
    type Agg = i64;

    fn agg_unit(&self) -> Self::Agg {
        0
    }

    fn agg_merge(&self, left: &Self::Agg, key: &Self::Key, right: &Self::Agg) -> Self::Agg {
        left.wrapping_add(*key).wrapping_add(*right)
    }
}

/// Subtree maximum, `None` for the empty tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct Max;

impl Augment for Max {
    type Key = i64;
    type Agg = Option<i64>;

    fn agg_unit(&self) -> Self::Agg {
        None
    }

    fn agg_merge(&self, left: &Self::Agg, key: &Self::Key, right: &Self::Agg) -> Self::Agg {
        let mut best = *key;
        if let Some(l) = *left {
            best = best.max(l);
        }
        if let Some(r) = *right {
            best = best.max(r);
        }
        Some(best)
    }
}
