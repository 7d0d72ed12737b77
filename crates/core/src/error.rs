use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("empty candidate set for field {0}")]
    EmptySet(&'static str),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("vector dimension mismatch: query has {query} dimensions, corpus entry {index} has {corpus}")]
    DimensionMismatch {
        query: usize,
        corpus: usize,
        index: usize,
    },
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
