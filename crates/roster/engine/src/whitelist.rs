use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::stores::{fields, tables, ProfileStores};
use async_trait::async_trait;
use roster_store::IndexedTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// One allow-list entry: canonical identity plus display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub uuid: String,
    pub name: String,
}

/// Failure of the opaque publish step.
#[derive(Debug, Error)]
#[error("whitelist publish failed: {0}")]
pub struct PublishError(pub String);

/// Delivery of the projected allow-list to remote game servers. The
/// transport (SFTP, HTTP, local file) is an external concern.
#[async_trait]
pub trait WhitelistPublisher: Send + Sync {
    async fn publish(&self, entries: &[WhitelistEntry]) -> Result<(), PublishError>;
}

/// Derive the authoritative allow-list from current table contents.
///
/// Precedence is first writer wins: valid dynamic profiles, then deprecated
/// ones when configuration permits, then pinned root entries, each in table
/// order. Later encounters of an identity already emitted are dropped
/// silently, as are records without an identity.
pub fn project(stores: &ProfileStores, config: &EngineConfig) -> EngineResult<Vec<WhitelistEntry>> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    collect(stores.dynamic.table(tables::VALID)?, &mut seen, &mut entries);
    if config.whitelist_deprecated {
        collect(
            stores.dynamic.table(tables::DEPRECATED)?,
            &mut seen,
            &mut entries,
        );
    }
    collect(stores.persist.table(tables::ROOT)?, &mut seen, &mut entries);

    Ok(entries)
}

fn collect(table: &IndexedTable, seen: &mut HashSet<String>, entries: &mut Vec<WhitelistEntry>) {
    for record in table.iter() {
        let uuid = record.get_or_empty(fields::UUID);
        if uuid.is_empty() || !seen.insert(uuid.to_string()) {
            continue;
        }
        entries.push(WhitelistEntry {
            uuid: uuid.to_string(),
            name: record.get_or_empty(fields::NAME).to_string(),
        });
    }
}
