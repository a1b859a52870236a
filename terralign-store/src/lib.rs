//! Terralign Store: Repository Backends for Flight-Log Tables
//!
//! Two implementations of
//! [`LogRepository`](terralign_core::repository::LogRepository):
//!
//! - [`CsvRepository`] — one directory per survey, one CSV file per
//!   table. Saves are atomic (write to a temp file, rename into place),
//!   so a crashed run never leaves a half-written table behind.
//! - [`MemoryRepository`] — a map-backed repository for tests and
//!   embedding; the whole pipeline runs against it without touching the
//!   filesystem.
//!
//! Both speak the same [`Table`](terralign_core::series::Table) shape and
//! the same error contract, so callers are written once against the
//! trait.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod csv_store;
mod memory;

pub use csv_store::CsvRepository;
pub use memory::MemoryRepository;
