/// Tunables for a [`Session`](crate::Session).
///
/// Constructed once via `Default` (or a caller-customized value) and passed
/// to `Session::new`; immutable for the session's lifetime. There is no
/// file format or CLI surface for these values — callers set fields
/// directly.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Reduction work-group count on non-CPU devices.
    pub n_groups_gpu: usize,
    /// Reduction local work-group size on non-CPU devices.
    pub n_local_gpu: usize,
    /// Reduction work-group count on CPU-class devices.
    pub n_groups_cpu: usize,
    /// Reduction local work-group size on CPU-class devices.
    pub n_local_cpu: usize,
    /// Size in bytes of each buffer drawn from the dust pool.
    pub dust_size: usize,
    /// Number of buffers held by the dust pool.
    pub dust_count: usize,
    /// Maximum host-mapped window size used by `ChunkIter`.
    pub map_window: usize,
    /// Maximum number of compiled programs the program cache will note as
    /// "over capacity" (see `DESIGN.md` for why this isn't enforced by
    /// eviction).
    pub program_cache_capacity: usize,
    /// Target byte size of each chunk produced by `stream`.
    pub group_size: usize,
    /// Compiler options passed to every program build.
    pub build_options: &'static str,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            n_groups_gpu: 8192,
            n_local_gpu: 128,
            n_groups_cpu: 1,
            n_local_cpu: 1,
            dust_size: 64 * 1024,
            dust_count: 32,
            map_window: 64 * 1024 * 1024,
            program_cache_capacity: 100,
            group_size: 256 * 1024 * 1024,
            build_options: "-cl-unsafe-math-optimizations",
        }
    }
}
