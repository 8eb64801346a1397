/// Default per-source demand batch used by merge and zip (items requested
/// from each source before any was consumed)
pub const DEFAULT_PREFETCH: u64 = 16;
/// Smallest accepted prefetch; zero would never request anything
pub const MIN_PREFETCH: u64 = 1;
