use thiserror::Error;

use crate::types::RowId;

#[derive(Error, Debug)]
pub enum ChantagError {
    #[error("not signed in: sign in before contacting the spreadsheet")]
    AuthRequired,

    #[error("failed to load {0}")]
    RemoteRead(String),

    #[error("failed to update {0}")]
    RemoteWrite(String),

    #[error("rate limited by the spreadsheet API, retry after {0} seconds")]
    RateLimited(u64),

    #[error("row {0} not found")]
    RowNotFound(RowId),

    #[error("invalid tag '{0}': tags must be non-empty and contain no commas")]
    InvalidTag(String),

    #[error("invalid sort field '{0}', expected one of: name, type")]
    InvalidSortField(String),

    #[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
    InvalidSortDirection(String),

    #[error("invalid cell reference '{0}'")]
    InvalidCellRef(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// An error that has already been surfaced through the notifier.
    #[error("{0}")]
    Reported(Box<ChantagError>),

    #[error("{0}")]
    Other(String),
}

impl ChantagError {
    pub fn invalid_sort_field(s: String) -> Self {
        ChantagError::InvalidSortField(s)
    }

    pub fn invalid_sort_direction(s: String) -> Self {
        ChantagError::InvalidSortDirection(s)
    }

    /// Mark this error as already shown to the user.
    pub fn reported(self) -> Self {
        match self {
            ChantagError::Reported(_) => self,
            other => ChantagError::Reported(Box::new(other)),
        }
    }

    pub fn is_reported(&self) -> bool {
        matches!(self, ChantagError::Reported(_))
    }

    /// The innermost error, looking through `Reported`.
    pub fn root(&self) -> &ChantagError {
        match self {
            ChantagError::Reported(inner) => inner.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChantagError>;
