use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadState {
    Queued,
    Downloading,
    Finished,
    Error,
}

impl DownloadState {
    pub fn parse(state: &str) -> Self {
        match state {
            "DOWNLOADING" => Self::Downloading,
            "FINISHED" => Self::Finished,
            "ERROR" => Self::Error,
            _ => Self::Queued,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloaderState {
    Started,
    Stopped,
}

impl DownloaderState {
    pub fn parse(state: &str) -> Self {
        match state {
            "STOPPED" => Self::Stopped,
            _ => Self::Started,
        }
    }
}

impl Default for DownloaderState {
    fn default() -> Self {
        Self::Started
    }
}

/// A chapter waiting in, or being processed by, the downloader
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQueueItem {
    pub chapter_id: i64,
    pub chapter_name: String,
    pub manga_id: i64,
    pub manga_title: String,
    pub progress: f64,
    pub state: DownloadState,
    pub tries: i64,
}
