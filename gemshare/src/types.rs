/// Raw OS handle type for externally shared memory (a dma-buf fd on Linux).
pub type RawHandle = i32;

/// Identifier of a memory region shared across a process or API boundary.
///
/// This is the registry key: two imports with equal `ExternalHandle`s resolve
/// to the same buffer object while it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ExternalHandle(RawHandle);

impl ExternalHandle {
    pub const fn new(raw: RawHandle) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> RawHandle {
        self.0
    }
}

impl From<RawHandle> for ExternalHandle {
    fn from(raw: RawHandle) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for ExternalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ext:{}", self.0)
    }
}

/// Kernel-level buffer handle returned by an import (a GEM handle on DRM).
///
/// The kernel recycles small handle values as soon as they are closed, so a
/// `KernelHandle` alone does not identify a buffer object over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct KernelHandle(u32);

impl KernelHandle {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for KernelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bo:{}", self.0)
    }
}
