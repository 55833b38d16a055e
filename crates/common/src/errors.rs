pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("dataset error: {0}")]
    Dataset(#[source] anyhow::Error),
    #[error("dataset is missing required columns: {}", columns.join(", "))]
    MissingColumn { columns: Vec<String> },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn dataset(err: impl Into<anyhow::Error>) -> Self {
        Self::Dataset(err.into())
    }
}
