use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to resolve required path: {0}")]
    Path(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("failed to fetch {resource}: HTTP {status}")]
    Fetch { resource: String, status: u16 },
    #[error(transparent)]
    Timestamp(#[from] chrono::ParseError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Config(String),
}

impl AppError {
    /// True when the error describes bad user input rather than a system fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}
