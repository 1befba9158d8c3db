use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Private,
    Public,
    Unlisted,
}

/// Read snapshot of a video as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub privacy: PrivacyStatus,
    /// Absent while the video is still a draft.
    pub publish_at: Option<DateTime<Utc>>,
}

/// Search hit: only what the listing returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct VideoPage {
    pub entries: Vec<PageEntry>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpdate {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub publish_at: DateTime<FixedOffset>,
    /// Stays private; the platform flips it at `publish_at`.
    pub privacy: PrivacyStatus,
}

/// Remote operations the scheduler relies on.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// One page of the account's videos, continuing from `page_token`.
    async fn list_page(
        &self,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<VideoPage, PlatformError>;

    /// Status details for up to [`crate::DETAILS_BATCH_SIZE`] ids.
    async fn fetch_details(&self, ids: &[String]) -> Result<Vec<VideoItem>, PlatformError>;

    async fn update_video(&self, update: &VideoUpdate) -> Result<(), PlatformError>;

    async fn insert_into_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), PlatformError>;

    /// Category name to id.
    async fn list_categories(
        &self,
        region_code: &str,
    ) -> Result<HashMap<String, String>, PlatformError>;
}
