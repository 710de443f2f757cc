//! Linux DRM kernel transport for gemshare.
//!
//! Imports dma-buf file descriptors into GEM handles on a DRM render node
//! with `DRM_IOCTL_PRIME_FD_TO_HANDLE` and releases them with
//! `DRM_IOCTL_GEM_CLOSE`.
//!
//! # Usage
//!
//! ```ignore
//! use gemshare::{MemoryManager, ShareConfig};
//! use gemshare_drm::DrmTransport;
//! use std::sync::Arc;
//!
//! let config = ShareConfig::from_env();
//! let transport = Arc::new(DrmTransport::from_config(&config)?);
//! let mm = MemoryManager::new(transport, config);
//! ```

mod ioctl;
mod transport;

pub use ioctl::{DRM_IOCTL_GEM_CLOSE, DRM_IOCTL_PRIME_FD_TO_HANDLE};
pub use transport::DrmTransport;
