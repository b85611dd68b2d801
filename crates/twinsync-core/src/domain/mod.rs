//! Domain entities and business logic
//!
//! This module contains the core domain types for twinsync:
//! - Newtypes for entity paths and identifiers
//! - The rolling checksum
//! - The checksum ledger
//! - Conflict and resolution types
//! - Domain-specific error types

pub mod checksum;
pub mod conflict;
pub mod errors;
pub mod ledger;
pub mod newtypes;

// Re-export commonly used types
pub use checksum::{RollingChecksum, StreamComparison};
pub use conflict::{Conflict, Presence, Resolved, SyncAction, Verdict};
pub use errors::{DomainError, NodeError};
pub use ledger::ChecksumLedger;
pub use newtypes::*;
