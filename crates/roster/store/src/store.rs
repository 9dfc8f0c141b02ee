use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::table::IndexedTable;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Static description of one table: its name plus the columns to index.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub indexes: Vec<String>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>, indexes: &[&str]) -> Self {
        Self {
            name: name.into(),
            indexes: indexes.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Static schema a [`TableStore`] is constructed from: store name, optional
/// on-disk path (path-less stores are never persisted), and table specs.
#[derive(Debug, Clone)]
pub struct StoreSchema {
    pub name: String,
    pub path: Option<PathBuf>,
    pub tables: Vec<TableSpec>,
}

impl StoreSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            tables: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_table(mut self, spec: TableSpec) -> Self {
        self.tables.push(spec);
        self
    }
}

/// A named collection of [`IndexedTable`]s with whole-store persistence to a
/// single JSON document.
///
/// The persisted form maps table name to an array of record objects (field
/// names plus the implicit `id` position, which is re-derived on load and is
/// not required to round-trip). A corrupt document is treated as "reset to
/// empty" and immediately re-saved, never as fatal.
#[derive(Debug)]
pub struct TableStore {
    name: String,
    path: Option<PathBuf>,
    tables: BTreeMap<String, IndexedTable>,
}

impl TableStore {
    /// Create an empty store from a static schema.
    pub fn new(schema: StoreSchema) -> Self {
        Self {
            name: schema.name,
            path: schema.path,
            tables: schema
                .tables
                .into_iter()
                .map(|spec| (spec.name.clone(), IndexedTable::new(spec.name, &spec.indexes)))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table(&self, name: &str) -> StoreResult<&IndexedTable> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> StoreResult<&mut IndexedTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    /// Iterate tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &IndexedTable> {
        self.tables.values()
    }

    /// Empty every table and every index without changing the schema.
    pub fn clear(&mut self) {
        for table in self.tables.values_mut() {
            table.clear();
        }
    }

    /// Serialize current table contents to the store path, overwriting it
    /// atomically from the caller's perspective. A no-op for path-less
    /// stores.
    pub fn save(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let document: BTreeMap<&str, &[Record]> = self
            .tables
            .iter()
            .map(|(name, table)| (name.as_str(), table.records()))
            .collect();
        let payload = serde_json::to_vec(&document)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Read the JSON document at the store path, replacing all table
    /// contents and rebuilding indexes.
    ///
    /// An absent file initializes an empty document; a corrupt one resets
    /// the store to empty and re-saves it. Tables present in the document
    /// but absent from the schema are dropped; schema tables absent from
    /// the document load empty.
    pub fn load(&mut self) -> StoreResult<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if !path.exists() {
            self.clear();
            return self.save();
        }
        let raw = fs::read_to_string(&path)?;
        let mut document: BTreeMap<String, Vec<Record>> = match serde_json::from_str(&raw) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(
                    store = %self.name,
                    path = %path.display(),
                    error = %err,
                    "failed to load store document, resetting to empty"
                );
                self.clear();
                return self.save();
            }
        };
        for (name, table) in &mut self.tables {
            table.replace(document.remove(name).unwrap_or_default());
        }
        for dropped in document.keys() {
            tracing::warn!(store = %self.name, table = %dropped, "dropping unknown table from store document");
        }
        Ok(())
    }
}
