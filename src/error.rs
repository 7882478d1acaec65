use thiserror::Error;

/// The `Result` type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The folder page carried no usable embedded listing.
    #[error(
        "cannot retrieve the folder information from the link: you may need to change the \
         sharing permission to 'Anyone with the link', or the folder has been accessed too many \
         times recently"
    )]
    FolderUnavailable,
    /// The page did not follow the expected markup contract.
    #[error("malformed page: {0}")]
    MalformedPage(String),
    /// The remote service refused to hand out a download link.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// No folder named like the predictors folder exists in the hierarchy.
    #[error("could not find the predictors folder")]
    PredictorsNotFound,
    /// The walk discovered more nodes than allowed.
    #[error("folder walk exceeded the limit of {0} nodes")]
    NodeLimit(usize),
    /// Requested dataset key is not part of the catalog.
    #[error("dataset is not available: {0}")]
    DatasetUnavailable(String),
    /// Requested release year is not part of the release table.
    #[error("unknown data release: {0}")]
    UnknownRelease(u16),
    /// Non-success HTTP status.
    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    /// Reqwest error.
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    /// I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// URL parse error.
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
    /// JSON error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// Archive error.
    #[error("zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),
    /// Configuration rejected by validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether retrying the whole operation may succeed.
    ///
    /// Transport failures qualify, and so do the statuses a busy server answers with: 408, 429
    /// and 5xx. Other statuses, structural parse failures and access errors will not go away by
    /// asking again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpStatus { status, .. } => {
                matches!(status, 408 | 429) || (500..=599).contains(status)
            }
            Self::ReqwestError(_) | Self::IoError(_) => true,
            _ => false,
        }
    }

    /// Whether the remote refused access, either with a status or with a message page.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied(_) | Self::HttpStatus { status: 401 | 403, .. }
        )
    }

    /// Whether the remote markup did not match the expected contract.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::FolderUnavailable
                | Self::MalformedPage(_)
                | Self::PredictorsNotFound
                | Self::NodeLimit(_)
        )
    }
}
