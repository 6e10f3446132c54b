/// Hard cap on the number of vertices a graph can track.
pub const MAX_VERTEX_COUNT: usize = 1 << 30;

const MAX_REBUILD_CHANGE: u32 = 16;

/// Tuning knobs for [`crate::DynamicConnectivity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    rebuild_change: u32,
    max_vertex_count: usize,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            rebuild_change: 2,
            max_vertex_count: MAX_VERTEX_COUNT,
        }
    }

    /// Levels are rebuilt once the vertex count drops to `2^-change` of the
    /// level capacity. Clamped to `1..=16`.
    pub fn with_rebuild_change(mut self, change: u32) -> Self {
        self.rebuild_change = change.clamp(1, MAX_REBUILD_CHANGE);
        self
    }

    /// Clamped to `1..=MAX_VERTEX_COUNT`.
    pub fn with_max_vertex_count(mut self, count: usize) -> Self {
        self.max_vertex_count = count.clamp(1, MAX_VERTEX_COUNT);
        self
    }

    pub fn rebuild_change(&self) -> u32 {
        self.rebuild_change
    }

    pub fn max_vertex_count(&self) -> usize {
        self.max_vertex_count
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp() {
        let config = Config::new()
            .with_rebuild_change(0)
            .with_max_vertex_count(usize::MAX);
        assert_eq!(config.rebuild_change(), 1);
        assert_eq!(config.max_vertex_count(), MAX_VERTEX_COUNT);
        assert_eq!(Config::default().rebuild_change(), 2);
        assert_eq!(Config::new().with_rebuild_change(40).rebuild_change(), 16);
    }
}
