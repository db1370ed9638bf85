//! Comment retrieval from YouTube videos

pub mod scraper;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

pub use scraper::YoutubeCommentScraper;

/// Ordering requested from the comment section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommentSort {
    /// "Top comments"
    Popular,
    /// "Newest first"
    Recent,
}

impl CommentSort {
    /// Index of this ordering in YouTube's sort sub-menu
    pub fn menu_index(self) -> usize {
        match self {
            CommentSort::Popular => 0,
            CommentSort::Recent => 1,
        }
    }
}

/// Source of comment texts for a video
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch at most `limit` comment texts, in the order the source yields them
    async fn fetch_comments(&self, video_url: &str, limit: usize) -> Result<Vec<String>, ScrapeError>;
}
