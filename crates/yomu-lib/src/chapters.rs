use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::Chapter;

pub const KEY: &str = "settings:chapter";

pub fn storage_key(manga_id: i64) -> String {
    format!("{}:{}", KEY, manga_id)
}

/// `None` ignores the attribute, `Some(x)` keeps items whose attribute is `x`
pub fn matches_filter(filter: Option<bool>, value: bool) -> bool {
    filter.map(|expected| expected == value).unwrap_or(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum SortBy {
    #[default]
    Source,
    ChapterNumber,
    UploadDate,
    FetchedAt,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [
        SortBy::Source,
        SortBy::ChapterNumber,
        SortBy::UploadDate,
        SortBy::FetchedAt,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Source => "By source",
            SortBy::ChapterNumber => "By chapter number",
            SortBy::UploadDate => "By upload date",
            SortBy::FetchedAt => "By fetch date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChapterOptions {
    pub unread: Option<bool>,
    pub downloaded: Option<bool>,
    pub bookmarked: Option<bool>,
    pub sort_by: SortBy,
    /// Newest first when set
    pub reverse: bool,
    pub show_chapter_number: bool,
}

impl Default for ChapterOptions {
    fn default() -> Self {
        Self {
            unread: None,
            downloaded: None,
            bookmarked: None,
            sort_by: SortBy::Source,
            reverse: true,
            show_chapter_number: false,
        }
    }
}

impl ChapterOptions {
    pub fn is_filter_active(&self) -> bool {
        self.unread.is_some() || self.downloaded.is_some() || self.bookmarked.is_some()
    }

    fn compare(&self, a: &Chapter, b: &Chapter) -> Ordering {
        match self.sort_by {
            SortBy::Source => a.source_order.cmp(&b.source_order),
            SortBy::ChapterNumber => a
                .chapter_number
                .partial_cmp(&b.chapter_number)
                .unwrap_or(Ordering::Equal),
            SortBy::UploadDate => a.upload_date.cmp(&b.upload_date),
            SortBy::FetchedAt => a.fetched_at.cmp(&b.fetched_at),
        }
    }
}

pub fn filter_and_sort(chapters: &[Chapter], options: &ChapterOptions) -> Vec<Chapter> {
    let mut visible: Vec<Chapter> = chapters
        .iter()
        .filter(|chapter| {
            matches_filter(options.unread, !chapter.is_read)
                && matches_filter(options.downloaded, chapter.is_downloaded)
                && matches_filter(options.bookmarked, chapter.is_bookmarked)
        })
        .cloned()
        .collect();

    visible.sort_by(|a, b| {
        let ordering = options.compare(a, b);
        if options.reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });

    visible
}

/// Chapters a "mark all as read" touches
pub fn non_read(chapters: &[Chapter]) -> Vec<i64> {
    chapters
        .iter()
        .filter(|chapter| !chapter.is_read)
        .map(|chapter| chapter.id)
        .collect()
}

/// Chapter to resume reading, the earliest unread one in source order
pub fn first_unread(chapters: &[Chapter]) -> Option<&Chapter> {
    chapters
        .iter()
        .filter(|chapter| !chapter.is_read)
        .min_by_key(|chapter| chapter.source_order)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Loaded,
    NoChaptersFound,
    NoMatches,
}

impl ListState {
    pub fn of(total: usize, visible: usize) -> Self {
        if total == 0 {
            ListState::NoChaptersFound
        } else if visible == 0 {
            ListState::NoMatches
        } else {
            ListState::Loaded
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            ListState::Loaded => None,
            ListState::NoChaptersFound => Some("No chapters found"),
            ListState::NoMatches => Some("No matching chapters"),
        }
    }
}

/// Selected item ids of a list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<i64>,
    anchor: Option<i64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.selected.iter().copied().collect()
    }

    pub fn are_all_selected(&self, ids: &[i64]) -> bool {
        !ids.is_empty() && ids.iter().all(|id| self.selected.contains(id))
    }

    /// With `range`, everything between the last toggled item and `id` in
    /// `order` gets the same state
    pub fn toggle(&mut self, id: i64, selected: bool, range: bool, order: &[i64]) {
        let range_ids = match (range, self.anchor) {
            (true, Some(anchor)) => {
                let from = order.iter().position(|item| *item == anchor);
                let to = order.iter().position(|item| *item == id);
                match (from, to) {
                    (Some(from), Some(to)) => order[from.min(to)..=from.max(to)].to_vec(),
                    _ => vec![id],
                }
            }
            _ => vec![id],
        };

        for id in range_ids {
            if selected {
                self.selected.insert(id);
            } else {
                self.selected.remove(&id);
            }
        }
        self.anchor = Some(id);
    }

    pub fn select_all(&mut self, selected: bool, ids: &[i64]) {
        if selected {
            self.selected.extend(ids.iter().copied());
        } else {
            self.selected.clear();
        }
        self.anchor = None;
    }

    pub fn clear(&mut self) {
        self.select_all(false, &[]);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn chapter(id: i64, order: i64, read: bool, downloaded: bool) -> Chapter {
        Chapter {
            id,
            manga_id: 1,
            name: format!("Chapter {}", order),
            chapter_number: order as f64,
            source_order: order,
            is_read: read,
            is_downloaded: downloaded,
            ..Default::default()
        }
    }

    fn fixture() -> Vec<Chapter> {
        vec![
            chapter(10, 1, true, true),
            chapter(11, 2, false, true),
            chapter(12, 3, false, false),
        ]
    }

    #[test]
    fn test_default_is_newest_first() {
        let ids: Vec<i64> = filter_and_sort(&fixture(), &ChapterOptions::default())
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![12, 11, 10]);
    }

    #[test]
    fn test_filters() {
        let options = ChapterOptions {
            unread: Some(true),
            downloaded: Some(true),
            reverse: false,
            ..Default::default()
        };
        let ids: Vec<i64> = filter_and_sort(&fixture(), &options).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![11]);
        assert!(options.is_filter_active());
        assert!(!ChapterOptions::default().is_filter_active());
    }

    #[test]
    fn test_non_read_and_first_unread() {
        assert_eq!(non_read(&fixture()), vec![11, 12]);
        assert_eq!(first_unread(&fixture()).map(|c| c.id), Some(11));
        assert_eq!(first_unread(&[chapter(1, 1, true, false)]), None);
    }

    #[test]
    fn test_list_state() {
        assert_eq!(ListState::of(0, 0), ListState::NoChaptersFound);
        assert_eq!(ListState::of(3, 0), ListState::NoMatches);
        assert_eq!(ListState::of(3, 1).message(), None);
    }

    #[test]
    fn test_range_selection() {
        let order = vec![12, 11, 10, 9];
        let mut selection = Selection::new();
        selection.toggle(11, true, false, &order);
        selection.toggle(9, true, true, &order);
        assert_eq!(selection.ids(), vec![9, 10, 11]);

        selection.toggle(10, false, false, &order);
        assert_eq!(selection.ids(), vec![9, 11]);
        assert!(!selection.are_all_selected(&order));

        selection.select_all(true, &order);
        assert!(selection.are_all_selected(&order));
        selection.clear();
        assert!(selection.is_empty());
    }
}
