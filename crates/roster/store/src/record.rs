use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field map of a record: field name to string value.
pub type Fields = BTreeMap<String, String>;

/// One row of an [`IndexedTable`].
///
/// The `id` is the record's dense positional identifier within its owning
/// table: it always equals the record's current index and is renumbered when
/// earlier records are removed. The `rid` is a transient per-table identity
/// token used by secondary indexes and by [`RecordKey`] removal; it is never
/// serialized and is re-derived when a table is rebuilt after a load.
///
/// [`IndexedTable`]: crate::IndexedTable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: usize,

    #[serde(skip)]
    pub(crate) rid: u64,

    #[serde(flatten)]
    pub(crate) fields: Fields,
}

impl Record {
    pub(crate) fn new(id: usize, rid: u64, fields: Fields) -> Self {
        Self { id, rid, fields }
    }

    /// Value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Value of a field, or the empty string if absent.
    pub fn get_or_empty(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    /// All fields of the record.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Consume the record, yielding its fields.
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Identity token for exact-instance removal.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            id: self.id,
            rid: self.rid,
        }
    }
}

/// Identity of a stored record: its current position plus its transient
/// identity token. A key becomes stale once the record it named is removed
/// or the table is rebuilt; using a stale key fails with
/// [`StoreError::OutOfRange`].
///
/// [`StoreError::OutOfRange`]: crate::StoreError::OutOfRange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordKey {
    pub id: usize,
    pub(crate) rid: u64,
}
