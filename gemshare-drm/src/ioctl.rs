//! Raw DRM ioctl plumbing.
//!
//! Request numbers follow the Linux `_IOC` encoding:
//! `dir << 30 | size << 16 | type << 8 | nr`.

use gemshare::TransportErrorKind;
use std::os::fd::RawFd;

const IOC_WRITE: libc::c_ulong = 1;
const IOC_READ: libc::c_ulong = 2;

/// DRM ioctl type byte.
const DRM_IOCTL_BASE: libc::c_ulong = b'd' as libc::c_ulong;

const fn ioc(dir: libc::c_ulong, nr: libc::c_ulong, size: usize) -> libc::c_ulong {
    (dir << 30) | ((size as libc::c_ulong) << 16) | (DRM_IOCTL_BASE << 8) | nr
}

/// `struct drm_prime_handle` from `drm.h`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DrmPrimeHandle {
    /// OUTPUT: GEM handle.
    pub handle: u32,
    /// Flags (DRM_CLOEXEC, DRM_RDWR); unused for fd-to-handle.
    pub flags: u32,
    /// INPUT: dma-buf fd.
    pub fd: i32,
}

/// `struct drm_gem_close` from `drm.h`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DrmGemClose {
    pub handle: u32,
    pub pad: u32,
}

/// `_IOWR('d', 0x2e, struct drm_prime_handle)`
pub const DRM_IOCTL_PRIME_FD_TO_HANDLE: libc::c_ulong = ioc(
    IOC_READ | IOC_WRITE,
    0x2e,
    std::mem::size_of::<DrmPrimeHandle>(),
);

/// `_IOW('d', 0x09, struct drm_gem_close)`
pub const DRM_IOCTL_GEM_CLOSE: libc::c_ulong =
    ioc(IOC_WRITE, 0x09, std::mem::size_of::<DrmGemClose>());

/// Issue a DRM ioctl, restarting on `EINTR`/`EAGAIN` like libdrm's `drmIoctl`.
/// Returns the errno on failure.
///
/// # Safety
///
/// `arg` must be the argument struct that `request` expects.
pub(crate) unsafe fn drm_ioctl<T>(
    fd: RawFd,
    request: libc::c_ulong,
    arg: &mut T,
) -> Result<(), i32> {
    loop {
        let ret = unsafe { libc::ioctl(fd, request as _, arg as *mut T) };
        if ret != -1 {
            return Ok(());
        }
        let errno = last_errno();
        if errno != libc::EINTR && errno != libc::EAGAIN {
            return Err(errno);
        }
    }
}

pub(crate) fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Map an errno from a DRM call onto the transport error taxonomy.
pub(crate) fn classify(errno: i32) -> TransportErrorKind {
    match errno {
        libc::ENOTTY | libc::EOPNOTSUPP | libc::ENODEV => TransportErrorKind::Unsupported,
        libc::EBADF
        | libc::EINVAL
        | libc::ENOENT
        | libc::EPERM
        | libc::EACCES
        | libc::ENOMEM
        | libc::ENOSPC => TransportErrorKind::Unavailable,
        _ => TransportErrorKind::Unknown,
    }
}
