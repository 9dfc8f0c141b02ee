//! Indexed in-memory table store backing the roster reconciliation engine.
//!
//! A [`TableStore`] is a named collection of [`IndexedTable`]s built from a
//! static [`StoreSchema`]. Tables hold positionally identified string-field
//! records with optional secondary-key indexes, and the whole store persists
//! to a single JSON document. Uniqueness rules are deliberately not enforced
//! here; they belong to the reconciliation layer that owns the store.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
mod record;
mod store;
mod table;

pub use error::{StoreError, StoreResult};
pub use record::{Fields, Record, RecordKey};
pub use store::{StoreSchema, TableSpec, TableStore};
pub use table::IndexedTable;
