use crate::error::ServiceResult;
use roster_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Whole-service configuration, loaded from a JSON file at startup.
///
/// An absent file yields the defaults; a corrupt file is a startup error,
/// unlike store documents, which recover by resetting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Display name of the service account.
    pub bot_name: String,
    /// Prefix of control commands in the operator channel.
    pub control_prefix: String,
    /// Role names granting the administrative capability.
    pub admin_roles: Vec<String>,
    /// Persisted store paths.
    pub persist_path: Option<PathBuf>,
    pub ranks_path: Option<PathBuf>,
    /// Reconciliation engine settings.
    pub engine: EngineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bot_name: "roster".to_string(),
            control_prefix: "!".to_string(),
            admin_roles: vec!["operator".to_string()],
            persist_path: None,
            ranks_path: None,
            engine: EngineConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `path`, or defaults if the file is absent.
    pub fn load(path: &Path) -> ServiceResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
