use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("receiver pool needs at least {required} receivers, got {available}")]
    PoolTooSmall { required: usize, available: usize },
    #[error("receiver pool holds {name} more than once (slots {first} and {second})")]
    DuplicateReceiver {
        name: String,
        first: usize,
        second: usize,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = BenchError> = std::result::Result<T, E>;
