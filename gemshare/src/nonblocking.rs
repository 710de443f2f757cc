//! Async wrappers that keep the blocking registry calls off runtime workers.
//!
//! `acquire` and `release` may block for the duration of a kernel import or
//! close while holding the registry lock. From async code, run them on the
//! blocking pool instead of stalling a worker thread.

use std::sync::Arc;

use crate::allocation::SharedAllocation;
use crate::error::{Result, ShareError};
use crate::registry::BoRegistry;
use crate::types::ExternalHandle;

/// [`BoRegistry::acquire`] on `tokio::task::spawn_blocking`.
pub async fn acquire_async(
    registry: &Arc<BoRegistry>,
    key: ExternalHandle,
    size_hint: u64,
) -> Result<SharedAllocation> {
    let registry = Arc::clone(registry);
    tokio::task::spawn_blocking(move || registry.acquire(key, size_hint))
        .await
        .map_err(|e| ShareError::TaskJoin(e.to_string()))?
}

/// [`BoRegistry::release`] on `tokio::task::spawn_blocking`.
pub async fn release_async(
    registry: &Arc<BoRegistry>,
    allocation: SharedAllocation,
) -> Result<()> {
    let registry = Arc::clone(registry);
    tokio::task::spawn_blocking(move || registry.release(allocation))
        .await
        .map_err(|e| ShareError::TaskJoin(e.to_string()))
}
