use serde::{Deserialize, Serialize};

/// A type represent chapter of a manga
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: i64,
    pub manga_id: i64,
    pub name: String,
    pub chapter_number: f64,
    pub source_order: i64,
    pub scanlator: Option<String>,
    pub upload_date: i64,
    pub fetched_at: i64,
    pub last_read_at: i64,
    pub last_page_read: i64,
    pub page_count: i64,
    pub is_read: bool,
    pub is_downloaded: bool,
    pub is_bookmarked: bool,
}
