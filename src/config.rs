//! Per-instance tuning knobs.
//!
//! Fields of each dict rather than process-wide globals, so independent
//! instances can run different policies and tests stay deterministic.

/// Bucket count installed by the first insertion, and the floor for
/// `shrink_to_fit`.
pub const INITIAL_CAPACITY: usize = 4;

/// Load factor (`used / size`) past which growth happens even while
/// automatic resizing is disabled, so insertions are never refused and
/// chains stay bounded.
pub const FORCE_RESIZE_RATIO: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of the first allocated table. Rounded up to a power of
    /// two on use.
    pub initial_capacity: usize,
    /// `used / size` threshold that overrides a disabled resize flag.
    pub force_resize_ratio: usize,
    /// Whether load-factor growth runs at `used >= size`. Hosts disable
    /// this around copy-on-write forks; see [`FORCE_RESIZE_RATIO`] for
    /// the escape hatch that still applies.
    pub resize_enabled: bool,
    /// Seed for the sampling RNG. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            initial_capacity: INITIAL_CAPACITY,
            force_resize_ratio: FORCE_RESIZE_RATIO,
            resize_enabled: true,
            seed: None,
        }
    }
}
