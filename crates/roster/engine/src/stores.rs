use roster_store::{StoreResult, StoreSchema, TableSpec, TableStore};
use std::path::PathBuf;

/// Table names used by the engine.
pub mod tables {
    /// Complete profiles of current community members.
    pub const VALID: &str = "valid";
    /// Rejected, duplicate and superseded submissions, with an error reason.
    pub const INVALID: &str = "invalid";
    /// Complete profiles whose submitter is no longer a member.
    pub const DEPRECATED: &str = "deprecated";
    /// Manually pinned allow-list entries.
    pub const ROOT: &str = "root";
}

/// Field names shared across tables.
pub mod fields {
    /// Canonical player identifier (32 hex digits).
    pub const UUID: &str = "uuid";
    /// Canonical display name from the resolver.
    pub const NAME: &str = "name";
    /// Player handle as submitted.
    pub const IGN: &str = "ign";
    /// Identity of the originating submission message.
    pub const MESSAGE: &str = "message";
    /// Identity of the submitting user.
    pub const AUTHOR: &str = "author";
    /// Display name of the submitting user.
    pub const AUTHOR_NAME: &str = "author_name";
    /// Human-readable rejection reason, `invalid` table only.
    pub const ERROR: &str = "error";
}

/// The three table stores backing reconciliation.
///
/// `dynamic` is derived state, rebuilt from the submission history, and is
/// never persisted. `persist` (pinned root entries) and `ranks` survive
/// restarts and are saved on every mutating operation.
#[derive(Debug)]
pub struct ProfileStores {
    pub dynamic: TableStore,
    pub persist: TableStore,
    pub ranks: TableStore,
}

impl ProfileStores {
    pub fn new(
        persist_path: Option<PathBuf>,
        ranks_path: Option<PathBuf>,
        rank_tables: &[String],
    ) -> Self {
        let dynamic = StoreSchema::new("dynamic")
            .with_table(TableSpec::new(
                tables::VALID,
                &[fields::UUID, fields::MESSAGE, fields::AUTHOR],
            ))
            .with_table(TableSpec::new(
                tables::INVALID,
                &[fields::MESSAGE, fields::AUTHOR],
            ))
            .with_table(TableSpec::new(
                tables::DEPRECATED,
                &[fields::UUID, fields::MESSAGE, fields::AUTHOR],
            ));

        let mut persist = StoreSchema::new("persist")
            .with_table(TableSpec::new(tables::ROOT, &[fields::UUID]));
        persist.path = persist_path;

        let mut ranks = StoreSchema::new("ranks");
        ranks.path = ranks_path;
        for rank in rank_tables {
            ranks = ranks.with_table(TableSpec::new(rank.clone(), &[fields::UUID]));
        }

        Self {
            dynamic: TableStore::new(dynamic),
            persist: TableStore::new(persist),
            ranks: TableStore::new(ranks),
        }
    }

    /// Load the persistent stores. The dynamic store starts empty and is
    /// repopulated by a full reload.
    pub fn load(&mut self) -> StoreResult<()> {
        self.persist.load()?;
        self.ranks.load()
    }

    /// Save the persistent stores.
    pub fn save(&self) -> StoreResult<()> {
        self.persist.save()?;
        self.ranks.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_store_has_the_three_profile_tables() {
        let stores = ProfileStores::new(None, None, &[]);
        assert!(stores.dynamic.contains(tables::VALID));
        assert!(stores.dynamic.contains(tables::INVALID));
        assert!(stores.dynamic.contains(tables::DEPRECATED));
        assert!(stores.persist.contains(tables::ROOT));
    }

    #[test]
    fn rank_tables_follow_configuration() {
        let stores = ProfileStores::new(None, None, &["mod".to_string(), "vip".to_string()]);
        assert!(stores.ranks.contains("mod"));
        assert!(stores.ranks.contains("vip"));
        assert!(!stores.ranks.contains("admin"));
    }
}
