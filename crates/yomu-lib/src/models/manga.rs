use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MangaStatus {
    Unknown,
    Ongoing,
    Completed,
    Licensed,
    PublishingFinished,
    Cancelled,
    OnHiatus,
}

impl MangaStatus {
    pub const ALL: [MangaStatus; 7] = [
        MangaStatus::Unknown,
        MangaStatus::Ongoing,
        MangaStatus::Completed,
        MangaStatus::Licensed,
        MangaStatus::PublishingFinished,
        MangaStatus::Cancelled,
        MangaStatus::OnHiatus,
    ];

    pub fn parse(status: &str) -> Self {
        match status {
            "ONGOING" => Self::Ongoing,
            "COMPLETED" => Self::Completed,
            "LICENSED" => Self::Licensed,
            "PUBLISHING_FINISHED" => Self::PublishingFinished,
            "CANCELLED" => Self::Cancelled,
            "ON_HIATUS" => Self::OnHiatus,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
            Self::Licensed => "Licensed",
            Self::PublishingFinished => "Publishing finished",
            Self::Cancelled => "Cancelled",
            Self::OnHiatus => "On hiatus",
        }
    }
}

/// Manga as shown in grids and lists
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaSummary {
    pub id: i64,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub in_library: bool,
}

/// Manga with the counters the detail screen needs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub genre: Vec<String>,
    pub status: MangaStatus,
    pub thumbnail_url: Option<String>,
    pub in_library: bool,
    pub source_id: String,
    pub unread_count: i64,
    pub download_count: i64,
    pub chapter_count: i64,
}

impl Manga {
    pub fn is_fully_read(&self) -> bool {
        self.unread_count == 0
    }

    pub fn is_fully_downloaded(&self) -> bool {
        self.download_count == self.chapter_count
    }
}
