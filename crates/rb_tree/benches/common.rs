use rand::Rng;
use rand::rngs::StdRng;

pub const SIZES: [usize; 4] = [1_000, 10_000, 100_000, 400_000];
pub const OPS_PER_SIZE: usize = 2_000;
pub const VALUE_RANGE: std::ops::RangeInclusive<i64> = -1_000_000_000..=1_000_000_000;

#[derive(Clone, Copy, Debug)]
pub enum SeqOp {
    Insert { index: usize, value: i64 },
    Remove { index: usize },
    SplitJoin { index: usize },
    Compare { a: usize, b: usize },
}

pub fn generate_values(rng: &mut StdRng, n: usize) -> Vec<i64> {
    (0..n).map(|_| rng.random_range(VALUE_RANGE)).collect()
}

/// Keeps the simulated length between `n / 2` and `2 * n` so indices stay valid.
pub fn generate_ops(rng: &mut StdRng, n: usize) -> Vec<SeqOp> {
    let mut len = n;
    let mut ops = Vec::with_capacity(OPS_PER_SIZE);
    for _ in 0..OPS_PER_SIZE {
        let op = match rng.random_range(0..4) {
            0 if len < 2 * n => {
                let index = rng.random_range(0..=len);
                len += 1;
                SeqOp::Insert {
                    index,
                    value: rng.random_range(VALUE_RANGE),
                }
            }
            1 if len > n / 2 => {
                let index = rng.random_range(0..len);
                len -= 1;
                SeqOp::Remove { index }
            }
            2 => SeqOp::SplitJoin {
                index: rng.random_range(0..len),
            },
            _ => SeqOp::Compare {
                a: rng.random_range(0..len),
                b: rng.random_range(0..len),
            },
        };
        ops.push(op);
    }
    ops
}
