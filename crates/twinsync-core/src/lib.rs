//! twinsync Core - Domain logic for two-way folder synchronization
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `EntityPath`, `RollingChecksum`, `ChecksumLedger`, `Conflict`, `Resolved`
//! - **Syncable nodes** - the `SyncableNode` file/folder sum type
//! - **Port definitions** - `ILocalFileSystem` and `ProgressObserver`
//! - **Sync context** - the explicit context threaded through sync and resolve calls
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Syncable nodes reach storage only through the ports carried by a
//! [`SyncContext`](context::SyncContext).

pub mod config;
pub mod context;
pub mod domain;
pub mod ports;
pub mod syncable;

pub use context::SyncContext;
pub use syncable::SyncableNode;
