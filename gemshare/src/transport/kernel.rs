use super::TransportError;
use crate::types::{ExternalHandle, KernelHandle};

/// The narrow kernel interface that materializes and releases buffer objects.
///
/// Both primitives are blocking and non-cancellable. Implementations are not
/// required to be reentrant: the kernel recycles handle values on close, so an
/// `import` racing a `close` can observe a stale handle. Callers that share a
/// transport across threads must serialize the two (the
/// [`BoRegistry`](crate::registry::BoRegistry) does this).
///
/// - `DrmTransport` (in `gemshare-drm`): PRIME fd-to-handle and GEM close
///   ioctls on a render node.
/// - Test transports: in-memory counters.
pub trait KernelTransport: Send + Sync {
    /// Materialize a kernel-level buffer for an external handle.
    fn import(&self, handle: ExternalHandle) -> Result<KernelHandle, TransportError>;

    /// Release a kernel-level buffer previously returned by `import`.
    fn close(&self, handle: KernelHandle) -> Result<(), TransportError>;

    /// Size in bytes of the memory behind an external handle.
    ///
    /// Default: unsupported. Transports that can query the size (dma-buf
    /// seek-to-end) should override.
    fn query_size(&self, _handle: ExternalHandle) -> Result<u64, TransportError> {
        Err(TransportError::unsupported("size query not provided"))
    }

    /// Short name used in logs.
    fn name(&self) -> &str {
        "kernel-transport"
    }
}
