/// Classification of a kernel transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The resource is not currently importable (bad handle, out of memory).
    Unavailable,
    /// The kernel driver does not provide the requested sharing mechanism.
    Unsupported,
    /// Unclassified transport failure.
    Unknown,
}

impl TransportErrorKind {
    pub const fn name(self) -> &'static str {
        match self {
            TransportErrorKind::Unavailable => "unavailable",
            TransportErrorKind::Unsupported => "unsupported",
            TransportErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned by a [`KernelTransport`](super::KernelTransport) primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}{}", errno_suffix(.errno))]
pub struct TransportError {
    kind: TransportErrorKind,
    errno: Option<i32>,
    message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            errno: None,
            message: message.into(),
        }
    }

    /// Create an `Unavailable` error with just a message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unavailable, message)
    }

    /// Create an `Unsupported` error with just a message.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unsupported, message)
    }

    /// Create an `Unknown` error with just a message.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unknown, message)
    }

    /// Attach the OS error number that caused the failure.
    pub fn with_errno(mut self, errno: i32) -> Self {
        self.errno = Some(errno);
        self
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn errno(&self) -> Option<i32> {
        self.errno
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn errno_suffix(errno: &Option<i32>) -> String {
    match errno {
        Some(e) => format!(" (errno {e})"),
        None => String::new(),
    }
}
