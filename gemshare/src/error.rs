use crate::transport::{TransportError, TransportErrorKind};

pub type Result<T> = std::result::Result<T, ShareError>;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("kernel transport error: {source}")]
    Transport {
        #[source]
        source: TransportError,
    },

    #[error("shared import unsupported: {reason}")]
    Unsupported { reason: String },

    #[error("view out of bounds: offset {offset} + size {size} exceeds {capacity} bytes")]
    OutOfBounds {
        offset: u64,
        size: u64,
        capacity: u64,
    },

    #[error("buffer object registry has been shut down")]
    RegistryClosed,

    #[error("internal lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("blocking task failed: {0}")]
    TaskJoin(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShareError {
    /// Create an `Unsupported` error with a reason.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }

    /// True for errors that come from the import path (`Transport` or
    /// `Unsupported`). Callers treat both the same way.
    pub fn is_import_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Unsupported { .. })
    }

    /// The transport error behind a `Transport` failure, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport { source } => Some(source),
            _ => None,
        }
    }
}

impl From<TransportError> for ShareError {
    fn from(err: TransportError) -> Self {
        match err.kind() {
            TransportErrorKind::Unsupported => Self::Unsupported {
                reason: err.to_string(),
            },
            _ => Self::Transport { source: err },
        }
    }
}
