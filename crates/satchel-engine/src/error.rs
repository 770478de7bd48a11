use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cache error: {0}")]
    Cache(#[from] satchel_cache::CacheError),

    #[error("store error: {0}")]
    Store(#[from] satchel_store::StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
