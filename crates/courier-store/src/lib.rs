//! # courier-store
//!
//! Durable bookkeeping for locally created attachment files.
//!
//! The central piece is the orphan registry: a write-ahead log mapping a
//! unique identifier to every file the validation pipeline creates under the
//! managed storage root.  Registration happens before the enclosing logical
//! operation commits, so files stranded by a crash or an aborted send remain
//! reclaimable by the external garbage-collection sweep.

pub mod database;
pub mod ledger;
pub mod migrations;
pub mod models;
pub mod orphans;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use ledger::OrphanLedger;
pub use models::OrphanedAttachment;
