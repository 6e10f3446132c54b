use std::hint::black_box;
use std::time::{Duration, Instant};

use bench::{RuntimeProfile, apply_runtime_profile, rng_for};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use rb_tree::{Id, NIL, RbForest, Sum};

mod common;

fn bench_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("rb_tree/sequence");

    for &size in &common::SIZES {
        apply_runtime_profile(&mut group, RuntimeProfile::for_size(size));
        let mut rng = rng_for(0, size);
        let values = common::generate_values(&mut rng, size);
        let ops = common::generate_ops(&mut rng, size);

        group.bench_function(BenchmarkId::new("split_join_remove", size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let mut forest = RbForest::with_capacity(Sum, size * 2);
                    let mut ids: Vec<Id> = values.iter().map(|&v| forest.alloc(v)).collect();
                    let mut root = forest.build(&ids);
                    let start = Instant::now();
                    for op in &ops {
                        match *op {
                            common::SeqOp::Insert { index, value } => {
                                let x = forest.alloc(value);
                                root = forest.insert_at(root, index, x);
                                ids.insert(index, x);
                            }
                            common::SeqOp::Remove { index } => {
                                let x = ids.remove(index);
                                root = forest.remove(x);
                                forest.release(x);
                            }
                            common::SeqOp::SplitJoin { index } => {
                                let (l, r) = forest.split(ids[index]);
                                black_box(forest.agg(l));
                                root = forest.concatenate(l, r);
                            }
                            common::SeqOp::Compare { a, b } => {
                                black_box(forest.compare_order(ids[a], ids[b]));
                            }
                        }
                    }
                    black_box(root != NIL);
                    total += start.elapsed();
                }
                total
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sequence);
criterion_main!(benches);
