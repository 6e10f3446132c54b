//! Shared criterion settings and reproducible inputs for the workspace
//! benchmarks.

use std::time::Duration;

use criterion::BenchmarkGroup;
use criterion::measurement::Measurement;
use rand::SeedableRng;
use rand::rngs::StdRng;

const RNG_SEED: u64 = 0x5EED_2026;
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// How long criterion should spend on one benchmark function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeProfile {
    Small,
    Medium,
    Large,
}

impl RuntimeProfile {
    /// Profile for a workload over `size` elements.
    pub fn for_size(size: usize) -> Self {
        match size {
            0..=4_096 => Self::Small,
            4_097..=65_536 => Self::Medium,
            _ => Self::Large,
        }
    }

    fn sample_size(self) -> usize {
        match self {
            Self::Small | Self::Medium => 15,
            Self::Large => 10,
        }
    }

    fn warm_up(self) -> Duration {
        Duration::from_millis(match self {
            Self::Small => 100,
            Self::Medium => 500,
            Self::Large => 800,
        })
    }

    fn measurement(self) -> Duration {
        Duration::from_millis(match self {
            Self::Small => 200,
            Self::Medium => 1_000,
            Self::Large => 1_500,
        })
    }
}

pub fn apply_runtime_profile<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, profile: RuntimeProfile) {
    group.sample_size(profile.sample_size());
    group.warm_up_time(profile.warm_up());
    group.measurement_time(profile.measurement());
}

fn mix_seed(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generator seeded from the workload kind and size, so each input set is
/// independent of the order the benchmarks run in.
pub fn rng_for(kind: u64, size: usize) -> StdRng {
    let seed = RNG_SEED
        ^ kind.wrapping_mul(SEED_MIX)
        ^ (size as u64).wrapping_mul(SEED_MIX.rotate_left(17));
    StdRng::seed_from_u64(mix_seed(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn profiles_grow_with_size() {
        assert_eq!(RuntimeProfile::for_size(1_000), RuntimeProfile::Small);
        assert_eq!(RuntimeProfile::for_size(16_384), RuntimeProfile::Medium);
        assert_eq!(RuntimeProfile::for_size(400_000), RuntimeProfile::Large);
    }

    #[test]
    fn seeds_depend_on_kind_and_size() {
        let draw = |kind, size| rng_for(kind, size).random::<u64>();
        assert_eq!(draw(1, 10), draw(1, 10));
        assert_ne!(draw(1, 10), draw(2, 10));
        assert_ne!(draw(1, 10), draw(1, 11));
    }
}
