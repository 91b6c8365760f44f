/// Erros da superfície de cache.
///
/// `NotFound` e `WrongType` são os dois erros sentinela que todo backend
/// expõe; os demais cobrem ciclo de vida e repasse de erros de backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("chave não encontrada")]
    NotFound,
    #[error("operação contra chave com tipo errado")]
    WrongType,
    #[error("cache fechado")]
    Closed,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend: {0}")]
    Backend(String),
}

/// Result type alias.
pub type CacheResult<T> = Result<T, CacheError>;
