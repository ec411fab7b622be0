#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("initialization error: {0}")]
    Initialization(String),

    #[error(transparent)]
    Fetch(#[from] webstash::FetchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}
