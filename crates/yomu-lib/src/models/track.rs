use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    pub id: i64,
    pub tracker_id: i64,
    pub title: String,
    pub status: i64,
    pub last_chapter_read: f64,
    pub total_chapters: i64,
    pub display_score: String,
    pub remote_url: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialize_track_record() {
        let record: TrackRecord = serde_json::from_str(
            r#"{"id":3,"trackerId":1,"title":"Berserk","status":1,"lastChapterRead":42.5,"totalChapters":0,"displayScore":"8","remoteUrl":"https://example.org/3"}"#,
        )
        .unwrap();
        assert_eq!(record.tracker_id, 1);
        assert_eq!(record.last_chapter_read, 42.5);
    }
}
