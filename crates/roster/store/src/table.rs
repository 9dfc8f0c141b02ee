use crate::error::{StoreError, StoreResult};
use crate::record::{Fields, Record, RecordKey};
use std::collections::{BTreeMap, HashMap};

/// An ordered collection of records with dense positional identifiers and
/// zero or more secondary-key indexes.
///
/// Index buckets reference records by their transient identity token, not by
/// position, so removing a record renumbers trailing records without
/// rewriting any index. Records missing an indexed column are indexed under
/// the empty-string value. Mutating the table while iterating is not
/// supported; callers that delete while scanning must collect keys first.
#[derive(Debug)]
pub struct IndexedTable {
    name: String,
    next_rid: u64,
    records: Vec<Record>,
    /// column -> value -> record identities, in insertion order.
    indexes: BTreeMap<String, BTreeMap<String, Vec<u64>>>,
    /// record identity -> current position.
    positions: HashMap<u64, usize>,
}

impl IndexedTable {
    /// Create an empty table with the given secondary-index columns.
    pub fn new(name: impl Into<String>, index_columns: &[String]) -> Self {
        Self {
            name: name.into(),
            next_rid: 0,
            records: Vec::new(),
            indexes: index_columns
                .iter()
                .map(|c| (c.clone(), BTreeMap::new()))
                .collect(),
            positions: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Columns this table maintains indexes for.
    pub fn index_columns(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    /// Append a record, assigning the next positional identifier and
    /// inserting it into every configured index.
    ///
    /// The table itself enforces no uniqueness; a table may legitimately
    /// hold several records sharing an indexed value.
    pub fn add(&mut self, fields: Fields) -> RecordKey {
        let rid = self.next_rid;
        self.next_rid += 1;
        let id = self.records.len();
        let record = Record::new(id, rid, fields);
        self.index_insert(&record);
        self.positions.insert(rid, id);
        self.records.push(record);
        RecordKey { id, rid }
    }

    /// Remove the exact record named by `key` and renumber trailing records.
    ///
    /// Fails with [`StoreError::OutOfRange`] if the position is out of
    /// bounds or the record stored there is not the instance the key names.
    pub fn remove(&mut self, key: RecordKey) -> StoreResult<Record> {
        let size = self.records.len();
        if key.id >= size || self.records[key.id].rid != key.rid {
            return Err(StoreError::OutOfRange {
                table: self.name.clone(),
                id: key.id,
                size,
            });
        }
        let record = self.records.remove(key.id);
        self.index_remove(&record);
        self.positions.remove(&record.rid);
        for pos in key.id..self.records.len() {
            self.records[pos].id = pos;
            self.positions.insert(self.records[pos].rid, pos);
        }
        Ok(record)
    }

    /// Bounds-checked positional lookup.
    pub fn get(&self, id: usize) -> StoreResult<&Record> {
        self.records.get(id).ok_or_else(|| StoreError::OutOfRange {
            table: self.name.clone(),
            id,
            size: self.records.len(),
        })
    }

    /// Records whose indexed `column` currently holds `value`, in insertion
    /// order. Empty if no record matches; [`StoreError::UnknownIndex`] if
    /// `column` was not configured for this table.
    pub fn index_lookup(&self, column: &str, value: &str) -> StoreResult<Vec<&Record>> {
        let buckets = self
            .indexes
            .get(column)
            .ok_or_else(|| StoreError::UnknownIndex {
                table: self.name.clone(),
                column: column.to_string(),
            })?;
        let Some(rids) = buckets.get(value) else {
            return Ok(Vec::new());
        };
        Ok(rids
            .iter()
            .map(|rid| &self.records[self.positions[rid]])
            .collect())
    }

    /// Keys of the matching records, for callers that intend to remove while
    /// scanning.
    pub fn index_lookup_keys(&self, column: &str, value: &str) -> StoreResult<Vec<RecordKey>> {
        Ok(self
            .index_lookup(column, value)?
            .into_iter()
            .map(Record::key)
            .collect())
    }

    /// Clear and repopulate every index from the current record sequence,
    /// re-deriving positional identifiers and identity tokens. Used after a
    /// whole-table replacement.
    pub fn rebuild_index(&mut self) {
        for buckets in self.indexes.values_mut() {
            buckets.clear();
        }
        self.positions.clear();
        self.next_rid = 0;
        let mut rebuilt = std::mem::take(&mut self.records);
        for (pos, record) in rebuilt.iter_mut().enumerate() {
            record.id = pos;
            record.rid = self.next_rid;
            self.next_rid += 1;
            self.positions.insert(record.rid, pos);
        }
        for record in &rebuilt {
            self.index_insert(record);
        }
        self.records = rebuilt;
    }

    /// Replace the whole record sequence and rebuild all indexes.
    pub fn replace(&mut self, records: Vec<Record>) {
        self.records = records;
        self.rebuild_index();
    }

    /// Remove every record and empty every index without changing the
    /// configured schema.
    pub fn clear(&mut self) {
        self.records.clear();
        self.positions.clear();
        self.next_rid = 0;
        for buckets in self.indexes.values_mut() {
            buckets.clear();
        }
    }

    /// Iterate current records in positional order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub(crate) fn records(&self) -> &[Record] {
        &self.records
    }

    fn index_insert(&mut self, record: &Record) {
        for (column, buckets) in &mut self.indexes {
            let value = record.get(column).unwrap_or("").to_string();
            buckets.entry(value).or_default().push(record.rid);
        }
    }

    fn index_remove(&mut self, record: &Record) {
        for (column, buckets) in &mut self.indexes {
            let value = record.get(column).unwrap_or("");
            if let Some(rids) = buckets.get_mut(value) {
                rids.retain(|rid| *rid != record.rid);
                if rids.is_empty() {
                    buckets.remove(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn table_with_uuid_index() -> IndexedTable {
        IndexedTable::new("valid", &["uuid".to_string()])
    }

    #[test]
    fn add_assigns_dense_ids() {
        let mut table = table_with_uuid_index();
        let a = table.add(row(&[("uuid", "u1"), ("name", "Steve")]));
        let b = table.add(row(&[("uuid", "u2"), ("name", "Alex")]));
        assert_eq!(a.id, 0);
        assert_eq!(b.id, 1);
        assert_eq!(table.get(0).unwrap().get("name"), Some("Steve"));
        assert_eq!(table.get(1).unwrap().get("uuid"), Some("u2"));
    }

    #[test]
    fn remove_renumbers_and_updates_index() {
        let mut table = table_with_uuid_index();
        let a = table.add(row(&[("uuid", "u1")]));
        table.add(row(&[("uuid", "u2")]));
        table.add(row(&[("uuid", "u3")]));

        let removed = table.remove(a).unwrap();
        assert_eq!(removed.get("uuid"), Some("u1"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().get("uuid"), Some("u2"));
        assert_eq!(table.get(1).unwrap().get("uuid"), Some("u3"));

        assert!(table.index_lookup("uuid", "u1").unwrap().is_empty());
        let hits = table.index_lookup("uuid", "u3").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn remove_with_stale_key_is_out_of_range() {
        let mut table = table_with_uuid_index();
        let a = table.add(row(&[("uuid", "u1")]));
        table.add(row(&[("uuid", "u2")]));
        table.remove(a).unwrap();

        // The position still exists but holds a different record now.
        let stale = RecordKey { id: 0, rid: a.rid };
        assert!(matches!(
            table.remove(stale),
            Err(StoreError::OutOfRange { .. })
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn get_out_of_bounds() {
        let table = table_with_uuid_index();
        assert!(matches!(table.get(0), Err(StoreError::OutOfRange { .. })));
    }

    #[test]
    fn unknown_index_column() {
        let table = table_with_uuid_index();
        assert!(matches!(
            table.index_lookup("name", "Steve"),
            Err(StoreError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn duplicate_index_values_share_a_bucket_in_insertion_order() {
        let mut table = table_with_uuid_index();
        table.add(row(&[("uuid", "u1"), ("name", "first")]));
        table.add(row(&[("uuid", "u2")]));
        table.add(row(&[("uuid", "u1"), ("name", "second")]));

        let hits = table.index_lookup("uuid", "u1").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].get("name"), Some("first"));
        assert_eq!(hits[1].get("name"), Some("second"));
    }

    #[test]
    fn missing_indexed_column_lands_in_empty_bucket() {
        let mut table = table_with_uuid_index();
        table.add(row(&[("name", "no-uuid")]));
        let hits = table.index_lookup("uuid", "").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get("name"), Some("no-uuid"));
    }

    #[test]
    fn rebuild_index_restores_consistency_after_replace() {
        let mut table = table_with_uuid_index();
        table.add(row(&[("uuid", "u1")]));
        let snapshot: Vec<Record> = table.iter().cloned().collect();

        let mut fresh = table_with_uuid_index();
        fresh.replace(snapshot);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh.index_lookup("uuid", "u1").unwrap().len(), 1);
        assert_eq!(fresh.get(0).unwrap().id, 0);
    }

    // Every record's id equals its position and every bucket holds exactly
    // the records whose indexed column carries that value, under arbitrary
    // interleavings of adds and removes.
    proptest! {
        #[test]
        fn ids_stay_dense_and_indexes_stay_exact(ops in proptest::collection::vec((any::<bool>(), 0u8..8), 1..64)) {
            let mut table = table_with_uuid_index();
            for (is_add, n) in ops {
                if is_add || table.is_empty() {
                    table.add(row(&[("uuid", &format!("u{}", n % 4))]));
                } else {
                    let pick = (n as usize) % table.len();
                    let key = table.get(pick).unwrap().key();
                    table.remove(key).unwrap();
                }

                for (pos, record) in table.iter().enumerate() {
                    prop_assert_eq!(record.id, pos);
                }
                for value in ["u0", "u1", "u2", "u3"] {
                    let hits = table.index_lookup("uuid", value).unwrap();
                    let expected: Vec<usize> = table
                        .iter()
                        .filter(|r| r.get("uuid") == Some(value))
                        .map(|r| r.id)
                        .collect();
                    let got: Vec<usize> = hits.iter().map(|r| r.id).collect();
                    prop_assert_eq!(got, expected);
                }
            }
        }
    }
}
