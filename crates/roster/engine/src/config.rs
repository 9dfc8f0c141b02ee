use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reconciliation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Required submission fields.
    pub required_fields: Vec<String>,
    /// Parsed fields discarded before storage.
    pub filter_fields: Vec<String>,
    /// Include deprecated profiles in the projected whitelist.
    pub whitelist_deprecated: bool,
    /// Reclassify profiles of departed submitters under `deprecated`
    /// instead of deleting them outright.
    pub retain_departed: bool,
    /// Let a member's update match an existing deprecated profile, not only
    /// a valid one.
    pub update_deprecated: bool,
    /// Delete conflicting duplicate submissions from the channel instead of
    /// retaining them under `invalid`.
    pub delete_duplicates: bool,
    /// Notify the author of a conflicting duplicate submission.
    pub notify_duplicates: bool,
    /// Delete a superseded submission after a profile update from the same
    /// author instead of retaining it under `invalid`.
    pub delete_superseded: bool,
    /// Rank table names in the ranks store.
    pub rank_tables: Vec<String>,
    /// Where the projected allow-list document is written on every sync.
    pub whitelist_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            required_fields: vec!["ign".to_string(), "age".to_string()],
            filter_fields: Vec::new(),
            whitelist_deprecated: false,
            retain_departed: true,
            update_deprecated: true,
            delete_duplicates: false,
            notify_duplicates: true,
            delete_superseded: false,
            rank_tables: Vec::new(),
            whitelist_path: None,
        }
    }
}
