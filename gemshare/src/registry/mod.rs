//! Shared buffer-object registry.
//!
//! Maps an [`ExternalHandle`](crate::types::ExternalHandle) to the single live
//! kernel buffer imported for it and counts the facades referencing it.
//!
//! ```text
//!   Absent ──acquire──▶ Creating ──import ok──▶ Live(1) ◀─acquire/release─▶ Live(n)
//!     ▲                    │                                                 │
//!     │                import err                                     last release
//!     │                    ▼                                                 ▼
//!     └──────────────── Absent ◀────────────close done──────────────── Closing
//! ```
//!
//! Creating and Closing both run with the registry lock held, so for any key
//! the transport sees a strict import/close/import/... order.

mod bo_registry;
mod buffer_object;
mod stats;

pub use bo_registry::BoRegistry;
pub use buffer_object::{BufferObject, EntrySnapshot};
pub use stats::RegistryStats;
