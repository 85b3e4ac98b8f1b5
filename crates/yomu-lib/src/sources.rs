use std::collections::{BTreeMap, BTreeSet};

use crate::entitlement::{filter_entitled, AllowList, EntitlementPolicy, Subject};
use crate::models::Source;

/// Language the server reports for the local source
pub const LOCAL_SOURCE_LANG: &str = "localsourcelang";
/// Language code of multi-language sources
pub const ALL_LANG: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    pub show_nsfw: bool,
    pub languages: Vec<String>,
    pub keep_local_source: bool,
    pub enabled: bool,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self {
            show_nsfw: true,
            languages: vec![],
            keep_local_source: true,
            enabled: true,
        }
    }
}

/// Applies the NSFW and language display settings.
///
/// An empty language list shows every language.
pub fn filter_sources(sources: &[Source], filter: &SourceFilter) -> Vec<Source> {
    if !filter.enabled {
        return sources.to_vec();
    }

    sources
        .iter()
        .filter(|source| {
            if filter.keep_local_source && source.is_local() {
                return true;
            }

            if !filter.show_nsfw && source.is_nsfw {
                return false;
            }

            filter.languages.is_empty() || filter.languages.iter().any(|lang| *lang == source.lang)
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupKey {
    LastUsed,
    Language(String),
}

impl GroupKey {
    pub fn label(&self) -> String {
        match self {
            GroupKey::LastUsed => "Last used".to_string(),
            GroupKey::Language(lang) if lang == LOCAL_SOURCE_LANG => "Local".to_string(),
            GroupKey::Language(lang) if lang == ALL_LANG => "All".to_string(),
            GroupKey::Language(lang) => lang.to_uppercase(),
        }
    }

    /// The "last used" group mixes languages, so cards show their own
    pub fn shows_language(&self) -> bool {
        matches!(self, GroupKey::LastUsed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub key: GroupKey,
    pub sources: Vec<Source>,
}

pub fn group_by_language(sources: &[Source]) -> Vec<SourceGroup> {
    let mut groups: BTreeMap<String, Vec<Source>> = BTreeMap::new();
    for source in sources {
        groups
            .entry(source.lang.clone())
            .or_default()
            .push(source.clone());
    }

    // local source first, then multi-language sources, then the rest alphabetically
    let mut ordered = vec![];
    for pinned in [LOCAL_SOURCE_LANG, ALL_LANG] {
        if let Some(sources) = groups.remove(pinned) {
            ordered.push(SourceGroup {
                key: GroupKey::Language(pinned.to_string()),
                sources,
            });
        }
    }
    ordered.extend(groups.into_iter().map(|(lang, sources)| SourceGroup {
        key: GroupKey::Language(lang),
        sources,
    }));

    ordered
}

pub fn languages(sources: &[Source]) -> Vec<String> {
    sources
        .iter()
        .map(|source| source.lang.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn last_used_source<'a>(last_used_source_id: Option<&str>, sources: &'a [Source]) -> Option<&'a Source> {
    let id = last_used_source_id?;
    sources.iter().find(|source| source.id == id)
}

pub fn are_from_multiple_repos(sources: &[Source]) -> bool {
    sources
        .iter()
        .filter_map(|source| source.repo())
        .collect::<BTreeSet<_>>()
        .len()
        > 1
}

/// Everything the source list screen renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceListView {
    pub groups: Vec<SourceGroup>,
    pub show_source_repo: bool,
}

impl SourceListView {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|group| group.sources.is_empty())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.sources.len()).sum()
    }
}

/// Entitlement first, then the display settings, then grouping
pub fn visible_sources(
    subject: &Subject,
    allow_list: &AllowList,
    sources: &[Source],
    filter: &SourceFilter,
    last_used_source_id: Option<&str>,
) -> SourceListView {
    let policy = EntitlementPolicy::new(allow_list.clone());
    let entitled = filter_entitled(subject, &policy, sources);
    let filtered = filter_sources(&entitled, filter);

    let mut groups = vec![];
    if let Some(last_used) = last_used_source(last_used_source_id, &filtered) {
        groups.push(SourceGroup {
            key: GroupKey::LastUsed,
            sources: vec![last_used.clone()],
        });
    }
    groups.extend(group_by_language(&filtered));

    SourceListView {
        show_source_repo: are_from_multiple_repos(&filtered),
        groups,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entitlement::Role;
    use crate::models::ExtensionRef;

    fn source(id: &str, lang: &str, pkg_name: Option<&str>, nsfw: bool) -> Source {
        Source {
            id: id.to_string(),
            name: format!("source {}", id),
            display_name: format!("source {} ({})", id, lang),
            lang: lang.to_string(),
            is_nsfw: nsfw,
            extension: pkg_name.map(|pkg| ExtensionRef {
                pkg_name: Some(pkg.to_string()),
                repo: Some(format!("repo-{}", pkg)),
            }),
            ..Default::default()
        }
    }

    fn fixture() -> Vec<Source> {
        vec![
            source("0", LOCAL_SOURCE_LANG, None, false),
            source("1", "en", Some("a.en"), false),
            source("2", "ja", Some("a.ja"), true),
            source("3", "all", Some("a.all"), false),
            source("4", "en", Some("b.en"), false),
        ]
    }

    #[test]
    fn test_filter_nsfw_and_languages() {
        let filter = SourceFilter {
            show_nsfw: false,
            languages: vec!["en".to_string(), "ja".to_string()],
            ..Default::default()
        };
        let ids: Vec<String> = filter_sources(&fixture(), &filter)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["0", "1", "4"]);
    }

    #[test]
    fn test_group_order() {
        let keys: Vec<GroupKey> = group_by_language(&fixture())
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Language(LOCAL_SOURCE_LANG.to_string()),
                GroupKey::Language(ALL_LANG.to_string()),
                GroupKey::Language("en".to_string()),
                GroupKey::Language("ja".to_string()),
            ]
        );
    }

    #[test]
    fn test_admin_view_is_display_filtered_only() {
        let filter = SourceFilter {
            show_nsfw: false,
            ..Default::default()
        };
        let view = visible_sources(
            &Subject::new(Role::Admin),
            &AllowList::pending(),
            &fixture(),
            &filter,
            None,
        );
        assert_eq!(view.len(), filter_sources(&fixture(), &filter).len());
        assert!(view.show_source_repo);
    }

    #[test]
    fn test_member_view_before_config_is_empty() {
        let view = visible_sources(
            &Subject::new(Role::Member),
            &AllowList::pending(),
            &fixture(),
            &SourceFilter::default(),
            Some("1"),
        );
        assert!(view.is_empty());
        assert!(view.groups.is_empty());
    }

    #[test]
    fn test_member_view_with_last_used() {
        let view = visible_sources(
            &Subject::new(Role::Member),
            &AllowList::loaded(["a.en", "a.all"]),
            &fixture(),
            &SourceFilter::default(),
            Some("1"),
        );
        assert_eq!(view.groups[0].key, GroupKey::LastUsed);
        assert_eq!(view.groups[0].sources[0].id, "1");
        // last used source is listed in its language group as well
        assert_eq!(view.len(), 3);
        assert!(view.groups.iter().all(|g| g.sources.iter().all(|s| !s.is_local())));
    }

    #[test]
    fn test_last_used_must_be_visible() {
        let view = visible_sources(
            &Subject::new(Role::Member),
            &AllowList::loaded(["a.en"]),
            &fixture(),
            &SourceFilter::default(),
            Some("4"),
        );
        assert!(view.groups.iter().all(|g| g.key != GroupKey::LastUsed));
    }

    #[test]
    fn test_languages() {
        assert_eq!(languages(&fixture()), vec!["all", "en", "ja", LOCAL_SOURCE_LANG]);
    }
}
