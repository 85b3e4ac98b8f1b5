//! Browsing a single source: popular, latest and search listings.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{MangaSummary, LOCAL_SOURCE_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum SourceContentType {
    #[default]
    Popular,
    Latest,
    Search,
}

impl SourceContentType {
    pub fn label(&self) -> &'static str {
        match self {
            SourceContentType::Popular => "Popular",
            SourceContentType::Latest => "Latest",
            SourceContentType::Search => "Filter",
        }
    }

    /// Shown when a listing came back empty
    pub fn empty_message(&self) -> &'static str {
        match self {
            SourceContentType::Popular | SourceContentType::Latest => "No manga found",
            SourceContentType::Search => "No matches",
        }
    }

    /// Type sent along with `fetchSourceManga`
    pub fn fetch_type(&self) -> &'static str {
        match self {
            SourceContentType::Popular => "POPULAR",
            SourceContentType::Latest => "LATEST",
            SourceContentType::Search => "SEARCH",
        }
    }
}

/// Hint shown below the empty message of the local source
pub fn empty_message_extra(source_id: &str) -> Option<&'static str> {
    (source_id == LOCAL_SOURCE_ID).then_some("Check out the local source guide to add manga")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriState {
    #[default]
    Ignore,
    Include,
    Exclude,
}

impl TriState {
    pub fn cycle(&self) -> Self {
        match self {
            TriState::Ignore => TriState::Include,
            TriState::Include => TriState::Exclude,
            TriState::Exclude => TriState::Ignore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SortState {
    pub index: i32,
    pub ascending: bool,
}

/// Value of one source filter as entered in the filter dialog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", content = "state", rename_all = "camelCase")]
pub enum FilterValue {
    CheckBoxState(bool),
    TriState(TriState),
    TextState(String),
    SelectState(i32),
    SortState(SortState),
}

/// A changed filter, `group` is set for filters nested in a group filter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PositionedFilter {
    pub position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<i32>,
    #[serde(flatten)]
    pub value: FilterValue,
}

/// Shape of the filter input the server expects
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChange {
    pub position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_box_state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tri_state: Option<TriState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_state: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_state: Option<SortState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_change: Option<Box<FilterChange>>,
}

impl FilterChange {
    fn with_value(position: i32, value: &FilterValue) -> Self {
        let mut change = FilterChange {
            position,
            ..Default::default()
        };
        match value {
            FilterValue::CheckBoxState(state) => change.check_box_state = Some(*state),
            FilterValue::TriState(state) => change.tri_state = Some(*state),
            FilterValue::TextState(state) => change.text_state = Some(state.clone()),
            FilterValue::SelectState(state) => change.select_state = Some(*state),
            FilterValue::SortState(state) => change.sort_state = Some(*state),
        }
        change
    }
}

impl From<&PositionedFilter> for FilterChange {
    /// Grouped filters are addressed through their group's position
    fn from(filter: &PositionedFilter) -> Self {
        match filter.group {
            Some(group) => FilterChange {
                position: group,
                group_change: Some(Box::new(FilterChange::with_value(filter.position, &filter.value))),
                ..Default::default()
            },
            None => FilterChange::with_value(filter.position, &filter.value),
        }
    }
}

pub fn filter_changes(filters: &[PositionedFilter]) -> Vec<FilterChange> {
    filters.iter().map(FilterChange::from).collect()
}

/// A filter a source offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDef {
    Header(String),
    Separator,
    CheckBox { name: String, default: bool },
    TriState { name: String, default: TriState },
    Text { name: String, default: String },
    Select { name: String, values: Vec<String>, default: i32 },
    Sort { name: String, values: Vec<String>, default: Option<SortState> },
    Group { name: String, filters: Vec<FilterDef> },
}

impl FilterDef {
    pub fn name(&self) -> &str {
        match self {
            FilterDef::Header(name) => name.as_str(),
            FilterDef::Separator => "",
            FilterDef::CheckBox { name, .. }
            | FilterDef::TriState { name, .. }
            | FilterDef::Text { name, .. }
            | FilterDef::Select { name, .. }
            | FilterDef::Sort { name, .. }
            | FilterDef::Group { name, .. } => name.as_str(),
        }
    }

    /// `None` for filters without a value of their own
    pub fn default_value(&self) -> Option<FilterValue> {
        match self {
            FilterDef::Header(_) | FilterDef::Separator | FilterDef::Group { .. } => None,
            FilterDef::CheckBox { default, .. } => Some(FilterValue::CheckBoxState(*default)),
            FilterDef::TriState { default, .. } => Some(FilterValue::TriState(*default)),
            FilterDef::Text { default, .. } => Some(FilterValue::TextState(default.clone())),
            FilterDef::Select { default, .. } => Some(FilterValue::SelectState(*default)),
            FilterDef::Sort { default, .. } => Some(FilterValue::SortState(default.unwrap_or(SortState {
                index: 0,
                ascending: false,
            }))),
        }
    }
}

fn find_def(defs: &[FilterDef], position: i32, group: Option<i32>) -> Option<&FilterDef> {
    match group {
        Some(group) => match defs.get(group as usize) {
            Some(FilterDef::Group { filters, .. }) => filters.get(position as usize),
            _ => None,
        },
        None => defs.get(position as usize),
    }
}

/// Value currently entered for a filter, its default when untouched
pub fn current_value(
    filters: &[PositionedFilter],
    defs: &[FilterDef],
    position: i32,
    group: Option<i32>,
) -> Option<FilterValue> {
    filters
        .iter()
        .find(|filter| filter.position == position && filter.group == group)
        .map(|filter| filter.value.clone())
        .or_else(|| find_def(defs, position, group).and_then(FilterDef::default_value))
}

/// Records a filter value, values equal to the filter's default are dropped
pub fn set_filter_value(
    filters: &mut Vec<PositionedFilter>,
    defs: &[FilterDef],
    position: i32,
    group: Option<i32>,
    value: FilterValue,
) {
    filters.retain(|filter| !(filter.position == position && filter.group == group));

    let is_default = find_def(defs, position, group)
        .and_then(FilterDef::default_value)
        .map(|default| default == value)
        .unwrap_or(false);
    if !is_default {
        filters.push(PositionedFilter { position, group, value });
    }
}

/// One page of a paginated listing, `mangas` is `None` while not loaded
/// or when loading failed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPage {
    pub mangas: Option<Vec<MangaSummary>>,
    pub has_next_page: bool,
    pub is_loading: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedPages {
    pub mangas: Vec<MangaSummary>,
    pub has_next_page: bool,
    /// The newest page only held library entries that got hidden, the
    /// screen should load the following page right away
    pub filtered_out_all_items_of_fetched_page: bool,
}

/// Concatenates pages, dropping duplicates and optionally library entries.
///
/// Pages after the last successfully loaded one mean a later load failed,
/// so no further page is offered.
pub fn merge_pages(pages: &[FetchedPage], hide_library_entries: bool) -> MergedPages {
    let is_page_loading = pages.last().map(|page| page.is_loading).unwrap_or(false);

    let mut seen = HashSet::new();
    let mut mangas = vec![];
    let mut filtered_out_all_items_of_fetched_page = !is_page_loading;

    for (index, page) in pages.iter().enumerate() {
        let page_items = page.mangas.as_deref().unwrap_or_default();
        let visible: Vec<&MangaSummary> = page_items
            .iter()
            .filter(|manga| !hide_library_entries || !manga.in_library)
            .collect();

        let is_last_page = !is_page_loading && pages.len() == index + 1;
        filtered_out_all_items_of_fetched_page = is_last_page && visible.is_empty() && !page_items.is_empty();

        for manga in visible {
            if seen.insert(manga.id) {
                mangas.push(manga.clone());
            }
        }
    }

    let last_loaded = pages.iter().rposition(|page| page.mangas.is_some());
    let has_next_page = match last_loaded {
        Some(index) if index + 1 == pages.len() => pages[index].has_next_page,
        _ => false,
    };

    MergedPages {
        mangas,
        has_next_page,
        filtered_out_all_items_of_fetched_page,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SavedSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: Vec<PositionedFilter>,
}

/// Saved searches of a source, stored as source meta
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SavedSearches(BTreeMap<String, SavedSearch>);

impl SavedSearches {
    pub const META_KEY: &'static str = "savedSearches";

    pub fn from_meta(value: Option<&str>) -> Result<Self> {
        match value {
            Some(value) => Ok(serde_json::from_str(value)?),
            None => Ok(Self::default()),
        }
    }

    pub fn to_meta(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&SavedSearch> {
        self.0.get(name)
    }

    /// Replaces an existing search with the same name
    pub fn create(&mut self, name: &str, query: Option<String>, filters: Vec<PositionedFilter>) {
        self.0.insert(name.to_string(), SavedSearch { query, filters });
    }

    pub fn delete(&mut self, name: &str) -> Option<SavedSearch> {
        self.0.remove(name)
    }
}

/// What the screen has to do after the search parameters changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchUpdate {
    Unchanged,
    /// Abort the in-flight fetch, scroll to top and load the first page
    Reset { generation: u64 },
}

/// Parameters of the listing currently shown for a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSession {
    content_type: SourceContentType,
    query: Option<String>,
    filters: Vec<PositionedFilter>,
    generation: u64,
}

impl SearchSession {
    /// A query in the url always opens the search listing
    pub fn new(content_type: SourceContentType, query: Option<String>) -> Self {
        let query = query.filter(|query| !query.is_empty());
        Self {
            content_type: if query.is_some() {
                SourceContentType::Search
            } else {
                content_type
            },
            query,
            filters: vec![],
            generation: 0,
        }
    }

    pub fn content_type(&self) -> SourceContentType {
        self.content_type
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn filters(&self) -> &[PositionedFilter] {
        &self.filters
    }

    /// Bumped on every reset, responses of older generations are stale
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn reset(&mut self) -> SearchUpdate {
        self.generation += 1;
        SearchUpdate::Reset {
            generation: self.generation,
        }
    }

    pub fn update_query(&mut self, query: Option<String>) -> SearchUpdate {
        let query = query.filter(|query| !query.is_empty());
        if query == self.query {
            return SearchUpdate::Unchanged;
        }

        self.query = query;
        if self.query.is_some() {
            self.content_type = SourceContentType::Search;
        }

        if self.content_type == SourceContentType::Search {
            debug!("search changed to {:?}", self.query);
            self.reset()
        } else {
            SearchUpdate::Unchanged
        }
    }

    pub fn set_content_type(&mut self, content_type: SourceContentType) -> SearchUpdate {
        if content_type == self.content_type {
            return SearchUpdate::Unchanged;
        }

        self.content_type = content_type;
        // leaving search drops the query from the url
        if content_type != SourceContentType::Search {
            self.query = None;
        }
        self.reset()
    }

    pub fn set_filters(&mut self, filters: Vec<PositionedFilter>) -> SearchUpdate {
        self.filters = filters;
        if self.content_type == SourceContentType::Search {
            self.reset()
        } else {
            SearchUpdate::Unchanged
        }
    }

    /// Applies filters and query of a saved search
    pub fn select_saved_search(&mut self, saved: &SavedSearch) -> SearchUpdate {
        self.content_type = SourceContentType::Search;
        if let Some(query) = saved.query.clone().filter(|query| !query.is_empty()) {
            self.query = Some(query);
        }
        self.filters = saved.filters.clone();
        self.reset()
    }
}

/// Search field in the app bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppbarSearch {
    closable: bool,
    open: bool,
    search_string: String,
}

impl AppbarSearch {
    pub fn new(closable: bool, query: Option<&str>) -> Self {
        let query = query.unwrap_or_default();
        Self {
            closable,
            open: !closable || !query.is_empty(),
            search_string: query.to_string(),
        }
    }

    pub fn is_open(&self, query: Option<&str>) -> bool {
        self.open || query.map(|query| !query.is_empty()).unwrap_or(false)
    }

    pub fn search_string(&self) -> &str {
        &self.search_string
    }

    pub fn input(&mut self, value: &str) {
        self.search_string = value.to_string();
    }

    fn set_open(&mut self, open: bool) {
        if self.closable {
            self.open = open;
        }
    }

    pub fn open(&mut self) {
        self.set_open(true);
    }

    /// New query to put in the url, empty submits are ignored
    pub fn submit(&mut self) -> Option<String> {
        if self.search_string.is_empty() {
            return None;
        }

        self.set_open(false);
        Some(self.search_string.clone())
    }

    pub fn cancel(&mut self) {
        self.search_string.clear();
        self.set_open(false);
    }

    pub fn blur(&mut self) {
        if self.search_string.is_empty() {
            self.set_open(false);
        }
    }

    /// F3 and ctrl+f open the field, returns whether the key was handled
    pub fn handle_key(&mut self, key: &str, ctrl: bool) -> bool {
        if key == "F3" || (ctrl && key == "f") {
            self.open();
            return true;
        }
        false
    }

    /// Navigating resets the field to the query of the new location
    pub fn reset_to(&mut self, query: Option<&str>) {
        *self = Self::new(self.closable, query);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn manga(id: i64, in_library: bool) -> MangaSummary {
        MangaSummary {
            id,
            title: format!("manga {}", id),
            thumbnail_url: None,
            in_library,
        }
    }

    fn page(ids: &[(i64, bool)], has_next_page: bool) -> FetchedPage {
        FetchedPage {
            mangas: Some(ids.iter().map(|(id, lib)| manga(*id, *lib)).collect()),
            has_next_page,
            is_loading: false,
        }
    }

    #[test]
    fn test_grouped_filter_change() {
        let filters = vec![
            PositionedFilter {
                position: 0,
                group: None,
                value: FilterValue::TextState("abc".to_string()),
            },
            PositionedFilter {
                position: 3,
                group: Some(5),
                value: FilterValue::TriState(TriState::Include),
            },
        ];

        let json = serde_json::to_value(filter_changes(&filters)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"position": 0, "textState": "abc"},
                {"position": 5, "groupChange": {"position": 3, "triState": "INCLUDE"}}
            ])
        );
    }

    #[test]
    fn test_set_filter_value() {
        let defs = vec![
            FilterDef::CheckBox {
                name: "Completed".to_string(),
                default: false,
            },
            FilterDef::Group {
                name: "Genres".to_string(),
                filters: vec![FilterDef::TriState {
                    name: "Action".to_string(),
                    default: TriState::Ignore,
                }],
            },
        ];

        let mut filters = vec![];
        set_filter_value(&mut filters, &defs, 0, Some(1), FilterValue::TriState(TriState::Exclude));
        set_filter_value(&mut filters, &defs, 0, None, FilterValue::CheckBoxState(true));
        assert_eq!(filters.len(), 2);
        assert_eq!(
            current_value(&filters, &defs, 0, Some(1)),
            Some(FilterValue::TriState(TriState::Exclude))
        );

        // back to default
        set_filter_value(&mut filters, &defs, 0, None, FilterValue::CheckBoxState(false));
        assert_eq!(filters.len(), 1);
        assert_eq!(
            current_value(&filters, &defs, 0, None),
            Some(FilterValue::CheckBoxState(false))
        );
        assert_eq!(current_value(&filters, &defs, 1, None), None);
    }

    #[test]
    fn test_merge_pages_deduplicates() {
        let merged = merge_pages(&[page(&[(1, false), (2, false)], true), page(&[(2, false), (3, false)], true)], false);
        let ids: Vec<i64> = merged.mangas.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(merged.has_next_page);
        assert!(!merged.filtered_out_all_items_of_fetched_page);
    }

    #[test]
    fn test_merge_pages_hides_library_entries() {
        let merged = merge_pages(&[page(&[(1, false)], true), page(&[(2, true), (3, true)], true)], true);
        assert_eq!(merged.mangas.len(), 1);
        assert!(merged.filtered_out_all_items_of_fetched_page);
    }

    #[test]
    fn test_merge_pages_failed_page_stops_pagination() {
        let failed = FetchedPage::default();
        let merged = merge_pages(&[page(&[(1, false)], true), failed], false);
        assert_eq!(merged.mangas.len(), 1);
        assert!(!merged.has_next_page);
        assert!(!merged.filtered_out_all_items_of_fetched_page);

        let loading = FetchedPage {
            is_loading: true,
            ..Default::default()
        };
        assert!(!merge_pages(&[loading], false).has_next_page);
    }

    #[test]
    fn test_saved_searches() {
        let mut searches = SavedSearches::from_meta(None).unwrap();
        searches.create("mine", Some("one piece".to_string()), vec![]);
        searches.create("other", None, vec![]);
        assert_eq!(searches.names(), vec!["mine", "other"]);

        let meta = searches.to_meta().unwrap();
        let mut restored = SavedSearches::from_meta(Some(&meta)).unwrap();
        assert_eq!(restored, searches);

        assert!(restored.delete("mine").is_some());
        assert!(restored.get("mine").is_none());
        assert!(SavedSearches::from_meta(Some("[")).is_err());
    }

    #[test]
    fn test_query_change_resets_search() {
        let mut session = SearchSession::new(SourceContentType::Search, Some("a".to_string()));
        let generation = session.generation();

        assert_eq!(session.update_query(Some("a".to_string())), SearchUpdate::Unchanged);
        let update = session.update_query(Some("b".to_string()));
        assert_eq!(update, SearchUpdate::Reset { generation: generation + 1 });
        assert!(!session.is_current(generation));
        assert_eq!(session.query(), Some("b"));
    }

    #[test]
    fn test_query_switches_to_search() {
        let mut session = SearchSession::new(SourceContentType::Popular, None);
        assert_eq!(session.content_type(), SourceContentType::Popular);

        assert!(matches!(session.update_query(Some("x".to_string())), SearchUpdate::Reset { .. }));
        assert_eq!(session.content_type(), SourceContentType::Search);

        assert!(matches!(session.set_content_type(SourceContentType::Latest), SearchUpdate::Reset { .. }));
        assert_eq!(session.query(), None);
        assert_eq!(session.update_query(None), SearchUpdate::Unchanged);
    }

    #[test]
    fn test_select_saved_search() {
        let mut session = SearchSession::new(SourceContentType::Popular, None);
        let saved = SavedSearch {
            query: Some("berserk".to_string()),
            filters: vec![PositionedFilter {
                position: 1,
                group: None,
                value: FilterValue::CheckBoxState(true),
            }],
        };
        session.select_saved_search(&saved);
        assert_eq!(session.content_type(), SourceContentType::Search);
        assert_eq!(session.query(), Some("berserk"));
        assert_eq!(session.filters().len(), 1);
    }

    #[test]
    fn test_appbar_search() {
        let mut search = AppbarSearch::new(true, None);
        assert!(!search.is_open(None));

        assert!(search.handle_key("F3", false));
        assert!(search.is_open(None));
        assert_eq!(search.submit(), None);

        search.blur();
        assert!(!search.is_open(None));

        assert!(search.handle_key("f", true));
        search.input("naruto");
        search.blur();
        assert!(search.is_open(None));
        assert_eq!(search.submit().as_deref(), Some("naruto"));
        assert!(!search.is_open(None));
        assert!(search.is_open(Some("naruto")));

        search.cancel();
        assert_eq!(search.search_string(), "");
        assert!(!search.handle_key("g", true));
    }

    #[test]
    fn test_empty_messages() {
        assert_eq!(SourceContentType::Latest.empty_message(), "No manga found");
        assert_eq!(SourceContentType::Search.empty_message(), "No matches");
        assert!(empty_message_extra("0").is_some());
        assert!(empty_message_extra("12").is_none());
    }
}
