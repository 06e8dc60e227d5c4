use async_trait::async_trait;
use thiserror::Error;

use crate::ErrorKind;

mod youtube;
pub use youtube::*;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Video search is not configured")]
    NotConfigured,

    #[error("Query is invalid: {0}")]
    Invalid(String),

    #[error("Video was not found")]
    NotFound,

    #[error("Video search is unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to fetch videos: {0}")]
    FetchError(String),

    #[error("Failed to parse videos: {0}")]
    ParseError(String),
}

/// A video someone can attach to their suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCandidate {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: Option<String>,
}

/// Finds videos for a search query or a video url
#[async_trait]
pub trait VideoLookup: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>, LookupError>;
}

/// A lookup that never finds anything, for when search is not wanted
pub struct NoVideoLookup;

#[async_trait]
impl VideoLookup for NoVideoLookup {
    async fn search(&self, _query: &str) -> Result<Vec<VideoCandidate>, LookupError> {
        Err(LookupError::NotConfigured)
    }
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::Validation,
            Self::NotFound => ErrorKind::NotFound,
            Self::NotConfigured
            | Self::Unavailable(_)
            | Self::FetchError(_)
            | Self::ParseError(_) => ErrorKind::Storage,
        }
    }
}
