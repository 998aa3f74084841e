use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("API request failed: {0} (check your network and API key, then try again)")]
    Api(String),

    #[error("command timed out after {0} seconds")]
    ExecutionTimeout(u64),

    #[error("dangerous command blocked by safe mode: {0}")]
    DangerousCommandBlocked(String),

    #[error("API key error: {0}")]
    Key(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Api(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
