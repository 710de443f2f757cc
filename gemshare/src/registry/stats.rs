use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing registry activity since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Successful transport imports (cache misses).
    pub imports: u64,
    /// Failed transport imports.
    pub import_failures: u64,
    /// Acquires served from an existing entry.
    pub cache_hits: u64,
    /// Transport closes that succeeded.
    pub closes: u64,
    /// Transport closes that returned an error (entry removed anyway).
    pub close_failures: u64,
    /// Releases that referenced nothing tracked by this registry.
    pub untracked_releases: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub imports: AtomicU64,
    pub import_failures: AtomicU64,
    pub cache_hits: AtomicU64,
    pub closes: AtomicU64,
    pub close_failures: AtomicU64,
    pub untracked_releases: AtomicU64,
}

impl StatsCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RegistryStats {
        RegistryStats {
            imports: self.imports.load(Ordering::Relaxed),
            import_failures: self.import_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            closes: self.closes.load(Ordering::Relaxed),
            close_failures: self.close_failures.load(Ordering::Relaxed),
            untracked_releases: self.untracked_releases.load(Ordering::Relaxed),
        }
    }
}
