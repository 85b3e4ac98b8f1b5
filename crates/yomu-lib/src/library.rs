use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chapters::matches_filter;
use crate::models::{Manga, MangaStatus};

pub const KEY: &str = "settings:library";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum LibrarySortBy {
    #[default]
    Alphabetical,
    UnreadChapters,
    DownloadedChapters,
}

impl LibrarySortBy {
    pub const ALL: [LibrarySortBy; 3] = [
        LibrarySortBy::Alphabetical,
        LibrarySortBy::UnreadChapters,
        LibrarySortBy::DownloadedChapters,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LibrarySortBy::Alphabetical => "Alphabetical",
            LibrarySortBy::UnreadChapters => "Unread chapters",
            LibrarySortBy::DownloadedChapters => "Downloaded chapters",
        }
    }
}

/// Filters and sorting of the library grid. Every filter is tri-state,
/// `None` meaning it's not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LibraryOptions {
    pub has_downloaded_chapters: Option<bool>,
    pub has_unread_chapters: Option<bool>,
    pub has_read_chapters: Option<bool>,
    pub has_bookmarked_chapters: Option<bool>,
    pub has_duplicate_chapters: Option<bool>,
    pub has_status: BTreeMap<MangaStatus, Option<bool>>,
    /// Keyed by tracker id
    pub has_tracker_binding: BTreeMap<i64, Option<bool>>,
    pub sort_by: LibrarySortBy,
    pub sort_desc: bool,
}

impl LibraryOptions {
    /// Highlights the toolbar filter button
    pub fn is_filter_active(&self) -> bool {
        self.has_downloaded_chapters.is_some()
            || self.has_unread_chapters.is_some()
            || self.has_read_chapters.is_some()
            || self.has_bookmarked_chapters.is_some()
            || self.has_duplicate_chapters.is_some()
            || self.has_status.values().any(Option::is_some)
            || self.has_tracker_binding.values().any(Option::is_some)
    }

    /// Bookmark, duplicate and tracker filters need data the grid doesn't load
    /// and are left to the server
    pub fn matches(&self, manga: &Manga) -> bool {
        let status_matches = match self.has_status.get(&manga.status) {
            Some(filter) => matches_filter(*filter, true),
            None => !self.has_status.values().any(|filter| *filter == Some(true)),
        };

        matches_filter(self.has_downloaded_chapters, manga.download_count > 0)
            && matches_filter(self.has_unread_chapters, manga.unread_count > 0)
            && matches_filter(self.has_read_chapters, manga.unread_count < manga.chapter_count)
            && status_matches
    }

    pub fn apply(&self, mangas: &[Manga]) -> Vec<Manga> {
        let mut visible: Vec<Manga> = mangas.iter().filter(|manga| self.matches(manga)).cloned().collect();

        visible.sort_by(|a, b| {
            let ordering = match self.sort_by {
                LibrarySortBy::Alphabetical => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                LibrarySortBy::UnreadChapters => a.unread_count.cmp(&b.unread_count),
                LibrarySortBy::DownloadedChapters => a.download_count.cmp(&b.download_count),
            };
            if self.sort_desc {
                ordering.reverse()
            } else {
                ordering
            }
        });

        visible
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn manga(id: i64, title: &str, unread: i64, downloaded: i64, status: MangaStatus) -> Manga {
        Manga {
            id,
            title: title.to_string(),
            author: None,
            artist: None,
            description: None,
            genre: vec![],
            status,
            thumbnail_url: None,
            in_library: true,
            source_id: "1".to_string(),
            unread_count: unread,
            download_count: downloaded,
            chapter_count: 10,
        }
    }

    #[test]
    fn test_filter_active() {
        let mut options = LibraryOptions::default();
        assert!(!options.is_filter_active());

        options.has_status.insert(MangaStatus::Ongoing, None);
        assert!(!options.is_filter_active());

        options.has_tracker_binding.insert(2, Some(false));
        assert!(options.is_filter_active());

        let options = LibraryOptions {
            has_duplicate_chapters: Some(true),
            ..Default::default()
        };
        assert!(options.is_filter_active());
    }

    #[test]
    fn test_apply() {
        let mangas = vec![
            manga(1, "beta", 3, 0, MangaStatus::Ongoing),
            manga(2, "Alpha", 0, 10, MangaStatus::Completed),
            manga(3, "gamma", 1, 2, MangaStatus::Ongoing),
        ];

        let titles: Vec<String> = LibraryOptions::default()
            .apply(&mangas)
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "beta", "gamma"]);

        let options = LibraryOptions {
            has_unread_chapters: Some(true),
            has_downloaded_chapters: Some(false),
            ..Default::default()
        };
        let ids: Vec<i64> = options.apply(&mangas).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1]);

        let mut options = LibraryOptions::default();
        options.has_status.insert(MangaStatus::Completed, Some(true));
        let ids: Vec<i64> = options.apply(&mangas).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2]);

        let mut options = LibraryOptions::default();
        options.has_status.insert(MangaStatus::Completed, Some(false));
        let ids: Vec<i64> = options.apply(&mangas).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
