use std::fmt::{Debug, Display};
use std::path::PathBuf;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One pending http-01 challenge, keyed by `domain`.
///
/// Fields missing from a JSON body decode as empty strings, so a
/// `{"domain": "..."}` delete request parses into the same type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeRecord {
    pub domain: String,
    pub token: String,
    pub validation: String,
}

impl ChallengeRecord {
    pub fn new(
        domain: impl Into<String>,
        token: impl Into<String>,
        validation: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            token: token.into(),
            validation: validation.into(),
        }
    }

    /// All three fields are required before a record may be stored.
    pub fn is_complete(&self) -> bool {
        !self.domain.is_empty() && !self.token.is_empty() && !self.validation.is_empty()
    }
}

/// Result of [ChallengeStore::set].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SetOutcome {
    /// Written below capacity, or overwrote an existing domain.
    Stored,
    /// Written, but the store was already full before the write.
    StoredOverCapacity,
    /// Not written because the store is full.
    Rejected,
}

impl SetOutcome {
    pub fn is_stored(self) -> bool {
        !matches!(self, SetOutcome::Rejected)
    }
}

pub trait Store: ChallengeStore + UploadStore + Display {}

impl<T> Store for T where T: ChallengeStore + UploadStore + Display {}

#[async_trait]
pub trait ChallengeStore: Send + Sync + Display {
    type EC: Debug + Display + Send;
    async fn set(&self, record: ChallengeRecord) -> Result<SetOutcome, Self::EC>;
    async fn get(&self, domain: &str) -> Result<Option<ChallengeRecord>, Self::EC>;
    async fn delete(&self, domain: &str) -> Result<(), Self::EC>;
}

#[async_trait]
pub trait UploadStore: Send + Sync + Display {
    /// Writes `content` as `file_name` into the directory owned by `domain`,
    /// replacing any existing file, and returns the path written.
    async fn store_file(
        &self,
        domain: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<PathBuf, UploadError>;
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("invalid domain: {0:?}")]
    InvalidDomain(String),
    #[error("invalid upload path: {0:?}")]
    InvalidPath(PathBuf),
    #[error("size of {name} is larger than {max}")]
    TooLarge { name: String, max: usize },
    #[error("malformed upload form: {0}")]
    Form(String),
    #[error("unable to create {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error writing {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl UploadError {
    /// Status code reported to the uploader.
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::InvalidDomain(_)
            | UploadError::InvalidPath(_)
            | UploadError::TooLarge { .. }
            | UploadError::Form(_) => StatusCode::BAD_REQUEST,
            UploadError::CreateDir { .. } | UploadError::Write { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
