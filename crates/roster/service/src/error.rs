use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-layer errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("hook already registered for {0}")]
    DuplicateHook(String),

    #[error("no hook registered for {0}")]
    UnknownHook(String),

    #[error("hook failed: {0}")]
    Hook(String),

    #[error("configuration i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
