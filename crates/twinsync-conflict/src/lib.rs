//! twinsync Conflict - Conflict partitioning and resolution
//!
//! Provides:
//! - Splitting detected conflicts into auto-resolvable and needs-input
//! - Executing a chosen action (copy, delete, ignore) against both nodes
//! - Keeping the checksum ledger in step with every resolution
//! - Batch resolution with per-conflict error reporting

pub mod error;
pub mod resolver;
pub mod use_cases;

pub use error::ConflictError;
pub use resolver::{nodes_for, BatchResult, ConflictResolver};
pub use use_cases::{partition_auto_resolvable, resolve_auto};
