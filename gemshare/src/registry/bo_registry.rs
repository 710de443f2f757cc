use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::buffer_object::{BufferObject, EntrySnapshot};
use super::stats::{RegistryStats, StatsCounters};
use crate::allocation::SharedAllocation;
use crate::config::ShareConfig;
use crate::error::{Result, ShareError};
use crate::transport::KernelTransport;
use crate::types::ExternalHandle;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

struct Entry {
    bo: Arc<BufferObject>,
    refs: usize,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<ExternalHandle, Entry>,
    next_generation: u64,
    closed: bool,
}

/// Reference-counted cache of buffer objects imported from external handles.
///
/// A single mutex guards the whole map, and its guard is held across the
/// transport `import` on a miss and the transport `close` on the last
/// release. This gives:
///
/// - at most one import per key, however many threads race on it;
/// - no import for any key while a close is in flight, so a kernel handle
///   number recycled by that close cannot be observed early;
/// - exactly one close per created buffer object.
///
/// Creation and destruction are rare next to steady-state use of the
/// returned allocations, which never touch the lock.
pub struct BoRegistry {
    id: u64,
    transport: Arc<dyn KernelTransport>,
    config: ShareConfig,
    state: Mutex<RegistryState>,
    stats: StatsCounters,
}

impl BoRegistry {
    pub fn new(transport: Arc<dyn KernelTransport>, config: ShareConfig) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            transport,
            config,
            state: Mutex::new(RegistryState::default()),
            stats: StatsCounters::default(),
        })
    }

    /// Resolve `key` to a live buffer object and return a facade for it.
    ///
    /// On a hit the entry's reference count is incremented and the transport
    /// is not called. On a miss the transport imports the handle; if that
    /// fails nothing is inserted and the error is returned unchanged.
    ///
    /// A non-zero `size_hint` becomes the allocation size (and the buffer
    /// size on a miss). A zero hint falls back to the transport's size query
    /// when `query_size_on_import` is set.
    pub fn acquire(
        self: &Arc<Self>,
        key: ExternalHandle,
        size_hint: u64,
    ) -> Result<SharedAllocation> {
        self.acquire_at(key, 0, size_hint)
    }

    /// Like [`acquire`](Self::acquire), for an allocation that starts
    /// `offset` bytes into the buffer object.
    ///
    /// With a zero `size_hint` the allocation runs to the end of the buffer.
    /// When the buffer size is known the range is bounds-checked; on
    /// `OutOfBounds` the reference taken here is given back before returning.
    pub fn acquire_at(
        self: &Arc<Self>,
        key: ExternalHandle,
        offset: u64,
        size_hint: u64,
    ) -> Result<SharedAllocation> {
        let buffer_hint = match size_hint {
            0 => 0,
            n => offset.checked_add(n).ok_or(ShareError::OutOfBounds {
                offset,
                size: n,
                capacity: u64::MAX,
            })?,
        };

        if !self.config.shared_import_enabled {
            return Err(ShareError::unsupported("shared handle import is disabled"));
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| ShareError::LockPoisoned("bo registry"))?;
        if state.closed {
            return Err(ShareError::RegistryClosed);
        }

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.refs += 1;
            StatsCounters::bump(&self.stats.cache_hits);
            tracing::debug!(
                "attached to {} (refs {})",
                entry.bo.kernel_handle(),
                entry.refs
            );
            let bo = Arc::clone(&entry.bo);
            drop(state);
            return self.facade(bo, offset, size_hint);
        }

        // Creating: the guard stays held across the import.
        let kernel_handle = match self.transport.import(key) {
            Ok(h) => h,
            Err(e) => {
                StatsCounters::bump(&self.stats.import_failures);
                tracing::debug!("import of {key} via {} failed: {e}", self.transport.name());
                return Err(e.into());
            }
        };
        let size = self.resolve_size(key, buffer_hint);

        state.next_generation += 1;
        let bo = Arc::new(BufferObject::new(
            key,
            kernel_handle,
            size,
            state.next_generation,
        ));
        state.entries.insert(
            key,
            Entry {
                bo: Arc::clone(&bo),
                refs: 1,
            },
        );
        StatsCounters::bump(&self.stats.imports);
        tracing::debug!("imported {bo}");
        drop(state);

        self.facade(bo, offset, size_hint)
    }

    /// Release an allocation obtained from this registry.
    ///
    /// Equivalent to dropping it. An allocation from a different registry is
    /// an untracked release here: it is logged and this registry is left
    /// untouched (the allocation still releases into its own registry).
    pub fn release(&self, allocation: SharedAllocation) {
        if allocation.registry_id() != self.id {
            StatsCounters::bump(&self.stats.untracked_releases);
            tracing::warn!(
                "untracked release of {} in registry {}: allocation belongs to registry {}",
                allocation.kernel_handle(),
                self.id,
                allocation.registry_id()
            );
        }
        drop(allocation);
    }

    /// Drop one reference to `bo`. Called exactly once per facade.
    pub(crate) fn release_ref(&self, bo: &BufferObject) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::error!(
                    "bo registry lock poisoned; leaking reference to {}",
                    bo.kernel_handle()
                );
                return;
            }
        };

        let Some(entry) = state.entries.get_mut(&bo.key()) else {
            self.untracked(bo, "key not present");
            return;
        };
        // Unreachable while facades hold their reference: an entry is only
        // replaced after its count reaches zero, and teardown forbids new ones.
        if entry.bo.generation() != bo.generation() {
            self.untracked(bo, "stale generation");
            return;
        }

        entry.refs -= 1;
        if entry.refs > 0 {
            tracing::debug!("released {} (refs {})", bo.kernel_handle(), entry.refs);
            return;
        }

        // Closing: remove and close under the same guard.
        if let Some(entry) = state.entries.remove(&bo.key()) {
            self.close_locked(&entry.bo);
        }
    }

    /// Close every remaining buffer object and refuse further acquires.
    ///
    /// Returns the number of entries that were still live. Allocations that
    /// outlive this call release as untracked no-ops. Idempotent.
    pub fn shutdown(&self) -> usize {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.teardown(&mut state)
    }

    fn teardown(&self, state: &mut RegistryState) -> usize {
        state.closed = true;
        let leaked = state.entries.len();
        for (_, entry) in state.entries.drain() {
            tracing::warn!(
                "closing {} at teardown with {} live reference(s)",
                entry.bo,
                entry.refs
            );
            self.close_locked(&entry.bo);
        }
        leaked
    }

    fn close_locked(&self, bo: &BufferObject) {
        match self.transport.close(bo.kernel_handle()) {
            Ok(()) => {
                StatsCounters::bump(&self.stats.closes);
                tracing::debug!("closed {bo}");
            }
            Err(e) => {
                StatsCounters::bump(&self.stats.close_failures);
                tracing::error!("close of {bo} via {} failed: {e}", self.transport.name());
            }
        }
    }

    fn untracked(&self, bo: &BufferObject, reason: &str) {
        StatsCounters::bump(&self.stats.untracked_releases);
        tracing::warn!(
            "untracked release of {} in registry {}: {reason}",
            bo.kernel_handle(),
            self.id
        );
    }

    fn resolve_size(&self, key: ExternalHandle, size_hint: u64) -> u64 {
        if size_hint != 0 || !self.config.query_size_on_import {
            return size_hint;
        }
        match self.transport.query_size(key) {
            Ok(size) => size,
            Err(e) => {
                tracing::debug!("size query for {key} failed, using 0: {e}");
                0
            }
        }
    }

    /// Build the facade outside the lock. Dropping it on a bounds error
    /// releases the reference it holds.
    fn facade(
        self: &Arc<Self>,
        bo: Arc<BufferObject>,
        offset: u64,
        size_hint: u64,
    ) -> Result<SharedAllocation> {
        let capacity = bo.size();
        let size = match size_hint {
            0 => capacity.saturating_sub(offset),
            n => n,
        };
        let allocation = SharedAllocation::new(bo, Arc::downgrade(self), self.id, offset, size);
        if capacity != 0 && offset.checked_add(size).is_none_or(|end| end > capacity) {
            return Err(ShareError::OutOfBounds {
                offset,
                size,
                capacity,
            });
        }
        Ok(allocation)
    }

    // ── Introspection ───────────────────────────────────────────────

    /// Unique id of this registry instance.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.with_state(|s| s.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: ExternalHandle) -> bool {
        self.with_state(|s| s.entries.contains_key(&key))
    }

    /// Current reference count for `key`, or `None` if absent.
    pub fn reference_count(&self, key: ExternalHandle) -> Option<usize> {
        self.with_state(|s| s.entries.get(&key).map(|e| e.refs))
    }

    pub fn is_shut_down(&self) -> bool {
        self.with_state(|s| s.closed)
    }

    /// All live entries, ordered by key.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        let mut out = self.with_state(|s| {
            s.entries
                .values()
                .map(|e| EntrySnapshot {
                    key: e.bo.key(),
                    kernel_handle: e.bo.kernel_handle(),
                    size: e.bo.size(),
                    generation: e.bo.generation(),
                    refs: e.refs,
                })
                .collect::<Vec<_>>()
        });
        out.sort_by_key(|e| e.key);
        out
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.snapshot()
    }

    fn with_state<R>(&self, f: impl FnOnce(&RegistryState) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&*state)
    }
}

impl Drop for BoRegistry {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !state.closed {
            let mut state = std::mem::take(state);
            self.teardown(&mut state);
        }
    }
}

impl std::fmt::Debug for BoRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoRegistry")
            .field("id", &self.id)
            .field("transport", &self.transport.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
