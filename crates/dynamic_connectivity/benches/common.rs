use rand::Rng;
use rand::rngs::StdRng;

pub const SIZES: [usize; 4] = [1_024, 4_096, 16_384, 65_536];
pub const OPS_PER_SIZE: usize = 5_000;

#[derive(Clone, Copy, Debug)]
pub enum ConnOp {
    Add { u: u32, v: u32 },
    Remove { u: u32, v: u32 },
    Connected { u: u32, v: u32 },
}

pub struct ConnectivityCase {
    pub edges: Vec<(u32, u32)>,
    pub ops: Vec<ConnOp>,
}

fn random_pair(rng: &mut StdRng, n: usize) -> (u32, u32) {
    let u = rng.random_range(0..n as u32);
    let mut v = rng.random_range(0..n as u32 - 1);
    if v >= u {
        v += 1;
    }
    (u, v)
}

/// A sparse random graph (about `n` edges) plus an update/query mix that
/// removes only edges known to be present.
pub fn generate_connectivity_case(rng: &mut StdRng, n: usize) -> ConnectivityCase {
    let edges: Vec<(u32, u32)> = (0..n).map(|_| random_pair(rng, n)).collect();
    let mut live = edges.clone();
    let mut ops = Vec::with_capacity(OPS_PER_SIZE);
    for _ in 0..OPS_PER_SIZE {
        let op = match rng.random_range(0..10) {
            0..=2 => {
                let (u, v) = random_pair(rng, n);
                live.push((u, v));
                ConnOp::Add { u, v }
            }
            3..=5 if !live.is_empty() => {
                let i = rng.random_range(0..live.len());
                let (u, v) = live.swap_remove(i);
                ConnOp::Remove { u, v }
            }
            _ => {
                let (u, v) = random_pair(rng, n);
                ConnOp::Connected { u, v }
            }
        };
        ops.push(op);
    }
    ConnectivityCase { edges, ops }
}
