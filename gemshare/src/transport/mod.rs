mod error;
mod kernel;

pub use error::{TransportError, TransportErrorKind};
pub use kernel::KernelTransport;
