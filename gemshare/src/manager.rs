//! Owning context for the buffer-object registry.

use std::sync::Arc;

use crate::allocation::SharedAllocation;
use crate::config::ShareConfig;
use crate::error::Result;
use crate::registry::BoRegistry;
use crate::transport::KernelTransport;
use crate::types::ExternalHandle;

/// Memory manager that owns the shared-handle registry.
///
/// The registry lives exactly as long as the manager: it is created in
/// [`MemoryManager::new`] and torn down by [`MemoryManager::shutdown`] or on
/// drop, closing any buffer objects still alive at that point.
#[derive(Debug)]
pub struct MemoryManager {
    registry: Arc<BoRegistry>,
}

impl MemoryManager {
    pub fn new(transport: Arc<dyn KernelTransport>, config: ShareConfig) -> Self {
        tracing::info!(
            "memory manager using {} (shared import {}, size query {})",
            transport.name(),
            if config.shared_import_enabled { "on" } else { "off" },
            if config.query_size_on_import { "on" } else { "off" },
        );
        Self {
            registry: BoRegistry::new(transport, config),
        }
    }

    /// Build a manager with configuration taken from the environment.
    pub fn from_env(transport: Arc<dyn KernelTransport>) -> Self {
        Self::new(transport, ShareConfig::from_env())
    }

    /// Import (or attach to) the buffer object for `handle`.
    pub fn create_from_shared_handle(
        &self,
        handle: ExternalHandle,
        size_hint: u64,
    ) -> Result<SharedAllocation> {
        self.registry.acquire(handle, size_hint)
    }

    /// As [`create_from_shared_handle`](Self::create_from_shared_handle), for
    /// a sub-allocation starting `offset` bytes into the shared buffer.
    pub fn create_from_shared_handle_at(
        &self,
        handle: ExternalHandle,
        offset: u64,
        size: u64,
    ) -> Result<SharedAllocation> {
        self.registry.acquire_at(handle, offset, size)
    }

    /// Give back an allocation created by this manager.
    pub fn free_graphics_memory(&self, allocation: SharedAllocation) {
        self.registry.release(allocation);
    }

    pub fn registry(&self) -> &Arc<BoRegistry> {
        &self.registry
    }

    pub fn is_shared_import_enabled(&self) -> bool {
        self.registry.config().shared_import_enabled
    }

    /// Tear down the registry. Returns how many buffer objects were still
    /// live and had to be closed.
    pub fn shutdown(&self) -> usize {
        if self.registry.is_shut_down() {
            return 0;
        }
        let leaked = self.registry.shutdown();
        tracing::info!("memory manager shut down ({leaked} live buffer object(s) closed)");
        leaked
    }
}

impl Drop for MemoryManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
