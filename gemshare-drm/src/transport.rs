use gemshare::{ExternalHandle, KernelHandle, KernelTransport, ShareConfig, TransportError};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::ioctl::{
    DRM_IOCTL_GEM_CLOSE, DRM_IOCTL_PRIME_FD_TO_HANDLE, DrmGemClose, DrmPrimeHandle, classify,
    drm_ioctl, last_errno,
};

/// Kernel transport over an open DRM device node.
///
/// The transport itself does no locking: concurrent PRIME imports and GEM
/// closes on the same device can race on recycled handle numbers. Wrap it in
/// a `gemshare::BoRegistry` (or `MemoryManager`) to serialize them.
#[derive(Debug)]
pub struct DrmTransport {
    fd: OwnedFd,
    path: Option<PathBuf>,
}

impl DrmTransport {
    /// Open a DRM device node read-write with close-on-exec.
    pub fn open(path: impl AsRef<Path>) -> gemshare::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(path)?;
        tracing::debug!("opened DRM device {}", path.display());
        Ok(Self {
            fd: file.into(),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open the device named by `config.drm_device_path`.
    pub fn from_config(config: &ShareConfig) -> gemshare::Result<Self> {
        Self::open(&config.drm_device_path)
    }

    /// Wrap an already-open DRM device fd.
    pub fn from_fd(fd: OwnedFd) -> Self {
        Self { fd, path: None }
    }

    pub fn device_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn os_error(op: &str, errno: i32) -> TransportError {
        TransportError::new(classify(errno), op).with_errno(errno)
    }
}

impl KernelTransport for DrmTransport {
    fn import(&self, handle: ExternalHandle) -> Result<KernelHandle, TransportError> {
        let mut args = DrmPrimeHandle {
            fd: handle.raw(),
            ..DrmPrimeHandle::default()
        };
        // SAFETY: PRIME_FD_TO_HANDLE takes a `drm_prime_handle`; `args` is one.
        unsafe { drm_ioctl(self.fd.as_raw_fd(), DRM_IOCTL_PRIME_FD_TO_HANDLE, &mut args) }
            .map_err(|errno| Self::os_error("PRIME_FD_TO_HANDLE", errno))?;
        Ok(KernelHandle::new(args.handle))
    }

    fn close(&self, handle: KernelHandle) -> Result<(), TransportError> {
        let mut args = DrmGemClose {
            handle: handle.raw(),
            pad: 0,
        };
        // SAFETY: GEM_CLOSE takes a `drm_gem_close`; `args` is one.
        unsafe { drm_ioctl(self.fd.as_raw_fd(), DRM_IOCTL_GEM_CLOSE, &mut args) }
            .map_err(|errno| Self::os_error("GEM_CLOSE", errno))
    }

    /// dma-buf size via seek-to-end. dma-buf only accepts `SEEK_END` and
    /// `SEEK_SET` with a zero offset, so the fd is left rewound to 0.
    fn query_size(&self, handle: ExternalHandle) -> Result<u64, TransportError> {
        let fd = handle.raw();
        // SAFETY: lseek on a caller-supplied fd; an invalid fd yields EBADF.
        let end = unsafe { libc::lseek(fd, 0, libc::SEEK_END) };
        if end < 0 {
            return Err(Self::os_error("lseek(SEEK_END)", last_errno()));
        }
        // SAFETY: as above.
        if unsafe { libc::lseek(fd, 0, libc::SEEK_SET) } < 0 {
            return Err(Self::os_error("lseek(SEEK_SET)", last_errno()));
        }
        Ok(end as u64)
    }

    fn name(&self) -> &str {
        "drm"
    }
}
