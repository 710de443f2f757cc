//! Shared buffer-object registry for GPU drivers.
//!
//! Imports externally shared memory (dma-buf fds and similar handles) into
//! kernel buffer objects through a [`KernelTransport`], deduplicates
//! concurrent imports of the same handle, reference-counts the result, and
//! serializes kernel import against kernel close so a recycled kernel handle
//! is never observed while its previous owner is still being destroyed.
//!
//! ```ignore
//! use gemshare::{ExternalHandle, MemoryManager, ShareConfig};
//!
//! let mm = MemoryManager::new(transport, ShareConfig::from_env());
//! let a = mm.create_from_shared_handle(ExternalHandle::new(dmabuf_fd), 0)?;
//! let b = mm.create_from_shared_handle(ExternalHandle::new(dmabuf_fd), 0)?;
//! assert!(a.shares_buffer_with(&b));
//! drop(a);
//! drop(b); // last reference: the kernel handle is closed here
//! ```

pub mod allocation;
pub mod config;
pub mod error;
pub mod manager;
pub mod nonblocking;
pub mod registry;
pub mod transport;
pub mod types;

pub use allocation::{AllocationView, SharedAllocation};
pub use config::ShareConfig;
pub use error::{Result, ShareError};
pub use manager::MemoryManager;
pub use registry::{BoRegistry, BufferObject, EntrySnapshot, RegistryStats};
pub use transport::{KernelTransport, TransportError, TransportErrorKind};
pub use types::{ExternalHandle, KernelHandle, RawHandle};
