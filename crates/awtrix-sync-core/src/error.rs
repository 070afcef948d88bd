use thiserror::Error;

/// Failure reported by a single [`Producer`](crate::producer::Producer) invocation.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("producer timed out after {0} seconds")]
    Timeout(u64),

    #[error("invalid unit name '{0}': must be 1-64 characters of [A-Za-z0-9_.-]")]
    InvalidUnitName(String),

    #[error("malformed widget definition {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure while enumerating producers for a cycle.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("apps directory does not exist: {0}")]
    MissingDir(String),

    #[error("every registry failed: {0}")]
    AllFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("discovery failed: {0}")]
    Discovery(#[from] RegistryError),

    #[error("producer failed for '{unit}': {source}")]
    ProducerInvocation {
        unit: String,
        #[source]
        source: ProducerError,
    },

    #[error("replay to '{unit}' failed: {reason}")]
    Replay { unit: String, reason: String },

    #[error("publish to '{unit}' failed: {reason}")]
    Publish { unit: String, reason: String },

    #[error("delete of '{unit}' failed: {reason}")]
    Delete { unit: String, reason: String },

    #[error("storage error at {path}: {reason}")]
    Storage { path: String, reason: String },

    #[error("invalid slide: {0}")]
    InvalidSlide(String),

    #[error("invalid color '{0}': expected six hex digits like #FFAA00")]
    InvalidColor(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
