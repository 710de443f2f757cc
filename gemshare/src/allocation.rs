//! Runtime-visible allocation handles for imported buffer objects.

use std::sync::{Arc, Weak};

use crate::error::{Result, ShareError};
use crate::registry::{BoRegistry, BufferObject};
use crate::types::{ExternalHandle, KernelHandle};

/// An allocation backed by a shared buffer object.
///
/// Created only by [`BoRegistry::acquire`] and [`BoRegistry::acquire_at`].
/// Holds one reference on the registry entry and gives it back exactly once
/// when dropped (or when passed to [`BoRegistry::release`]). The link to the registry is weak: if the
/// registry is torn down first, the release is logged and ignored.
#[derive(Debug)]
pub struct SharedAllocation {
    bo: Arc<BufferObject>,
    registry: Weak<BoRegistry>,
    registry_id: u64,
    offset: u64,
    size: u64,
}

impl SharedAllocation {
    pub(crate) fn new(
        bo: Arc<BufferObject>,
        registry: Weak<BoRegistry>,
        registry_id: u64,
        offset: u64,
        size: u64,
    ) -> Self {
        Self {
            bo,
            registry,
            registry_id,
            offset,
            size,
        }
    }

    pub fn key(&self) -> ExternalHandle {
        self.bo.key()
    }

    pub fn kernel_handle(&self) -> KernelHandle {
        self.bo.kernel_handle()
    }

    /// The shared buffer object. Read-only; the registry owns its lifetime.
    pub fn buffer_object(&self) -> &BufferObject {
        &self.bo
    }

    pub fn generation(&self) -> u64 {
        self.bo.generation()
    }

    /// Byte offset of this allocation within the buffer object.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Logical size of this allocation in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Id of the registry this allocation was acquired from.
    pub fn registry_id(&self) -> u64 {
        self.registry_id
    }

    /// True if both allocations reference the same live buffer object.
    pub fn shares_buffer_with(&self, other: &SharedAllocation) -> bool {
        Arc::ptr_eq(&self.bo, &other.bo)
    }

    /// Borrow a bounds-checked sub-range of this allocation. `offset` is
    /// relative to the start of the allocation.
    pub fn view(&self, offset: u64, size: u64) -> Result<AllocationView<'_>> {
        match offset.checked_add(size) {
            Some(end) if end <= self.size => Ok(AllocationView {
                allocation: self,
                offset,
                size,
            }),
            _ => Err(ShareError::OutOfBounds {
                offset,
                size,
                capacity: self.size,
            }),
        }
    }
}

impl Drop for SharedAllocation {
    fn drop(&mut self) {
        match self.registry.upgrade() {
            Some(registry) => registry.release_ref(&self.bo),
            None => tracing::warn!(
                "untracked release of {}: registry {} no longer exists",
                self.bo.kernel_handle(),
                self.registry_id
            ),
        }
    }
}

impl std::fmt::Display for SharedAllocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SharedAllocation({}, +{}, {}B)",
            self.bo.kernel_handle(),
            self.offset,
            self.size
        )
    }
}

/// A sub-range of a [`SharedAllocation`], valid while the allocation lives.
#[derive(Debug, Clone, Copy)]
pub struct AllocationView<'a> {
    allocation: &'a SharedAllocation,
    offset: u64,
    size: u64,
}

impl AllocationView<'_> {
    pub fn kernel_handle(&self) -> KernelHandle {
        self.allocation.kernel_handle()
    }

    /// Offset from the start of the buffer object.
    pub fn offset(&self) -> u64 {
        self.allocation.offset() + self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
