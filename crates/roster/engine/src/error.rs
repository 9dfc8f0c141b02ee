use roster_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-layer errors.
///
/// Expected classification outcomes (missing fields, invalid identity,
/// duplicate ign) are terminal states of the reconciliation state machine,
/// not errors; they never appear here. `Fault` marks a state the
/// classification logic considers impossible: it aborts the current event at
/// the processing boundary but leaves committed table mutations intact and
/// keeps the engine live.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("reconciliation fault: {0}")]
    Fault(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("whitelist i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("whitelist serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
