use crate::types::{ExternalHandle, KernelHandle};

/// One live kernel-level memory resource.
///
/// Owned by its registry entry and shared read-only with every
/// [`SharedAllocation`](crate::allocation::SharedAllocation) that references
/// it. The `generation` is unique per creation within a registry, so a buffer
/// re-imported under the same key (and possibly the same recycled kernel
/// handle) never compares equal to a destroyed one.
#[derive(Debug, PartialEq, Eq)]
pub struct BufferObject {
    key: ExternalHandle,
    kernel_handle: KernelHandle,
    size: u64,
    generation: u64,
}

impl BufferObject {
    pub(crate) fn new(
        key: ExternalHandle,
        kernel_handle: KernelHandle,
        size: u64,
        generation: u64,
    ) -> Self {
        Self {
            key,
            kernel_handle,
            size,
            generation,
        }
    }

    pub fn key(&self) -> ExternalHandle {
        self.key
    }

    pub fn kernel_handle(&self) -> KernelHandle {
        self.kernel_handle
    }

    /// Size in bytes (0 when neither a hint nor a transport query supplied it).
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Display for BufferObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BufferObject({} -> {}, {}B, gen {})",
            self.key, self.kernel_handle, self.size, self.generation
        )
    }
}

/// Point-in-time view of one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub key: ExternalHandle,
    pub kernel_handle: KernelHandle,
    pub size: u64,
    pub generation: u64,
    pub refs: usize,
}
