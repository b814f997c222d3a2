use std::path::PathBuf;

use thiserror::Error;

/// The primary error type that can be produced by the shelter dashboard core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("invalid category \"{0}\"")]
    InvalidCategory(String),
    #[error("record store unavailable: {0}")]
    BackendUnavailable(String),
    #[error("malformed record at row {0}: {1}")]
    MalformedRecord(usize, String),
    #[error("invalid collection name \"{0}\" - only ASCII letters, digits and underscores are allowed")]
    InvalidCollectionName(String),
    #[error("object property names must be strings")]
    ObjectKeysMustBeStrings,
    #[error("records must be objects, but got a value of type {0}")]
    RecordMustBeObject(&'static str),
    #[error("I/O error {0}: {1}")]
    Io(String, std::io::Error),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("cannot determine file type of file: {0}")]
    CannotDetermineFileType(PathBuf),
    #[error("failed to load configuration from {0}")]
    FailedToLoadConfig(PathBuf),
    #[error("failed to load records from {0}")]
    FailedToLoadRecords(PathBuf),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
    #[error("source files iteration failed: {0}")]
    SourceIter(#[from] glob::GlobError),
    #[error("failed to parse source file pattern \"{0}\": {1}")]
    SourceFilePattern(String, glob::PatternError),
}

impl Error {
    /// Whether the record store client may absorb this error by yielding an
    /// empty result set instead of surfacing it to the rendering layer.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidQuery(_) | Self::BackendUnavailable(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::OperationInterrupted) => {
                Self::BackendUnavailable("query timed out".to_string())
            }
            _ => Self::BackendUnavailable(e.to_string()),
        }
    }
}
