//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod category;
mod changes;
mod port;
mod runtime;

// Re-export all domain types
pub use category::{
    categorize, group_by_runtime, CategorizedPorts, CategoryBucket, Categorizer,
    DEFAULT_EPHEMERAL_THRESHOLD,
};
pub use changes::{detect_changes, port_set, ChangeOutcome, ChangeSet, Notification};
pub use port::{PortFilter, PortRecord, SYSTEM_PORT_LIMIT};
pub use runtime::{classify, RuntimeTag};
